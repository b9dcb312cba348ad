use crate::areas::repository::Repository;

impl Repository {
    /// Render every reference under `refs/` as `<id> <name>` lines,
    /// sorted by name.
    pub fn show_ref(&self) -> anyhow::Result<String> {
        let refs = self.refs();

        let mut lines = Vec::new();
        for name in refs.list_refs()? {
            if let Some(oid) = refs.resolve_ref(&name)? {
                lines.push(format!("{oid} {name}"));
            }
        }

        Ok(lines.join("\n"))
    }
}
