use crate::areas::repository::Repository;

impl Repository {
    /// First-parent history of the current HEAD, newest first, one
    /// `<short-id> <message-subject>` line per commit.
    pub fn log(&self) -> anyhow::Result<String> {
        let mut lines = Vec::new();
        let mut current = self.refs().read_head()?;

        while let Some(oid) = current {
            let commit = self
                .database()
                .load(&oid)?
                .into_commit()
                .ok_or_else(|| anyhow::anyhow!("object {oid} is not a commit"))?;

            lines.push(format!("{} {}", oid.to_short_oid(), commit.short_message()));
            current = commit.parent().cloned();
        }

        Ok(lines.join("\n"))
    }
}
