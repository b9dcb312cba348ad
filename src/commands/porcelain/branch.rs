use crate::areas::repository::Repository;
use anyhow::Context;

impl Repository {
    /// Create a branch pointing at the current HEAD commit.
    pub fn create_branch(&self, name: &str) -> anyhow::Result<()> {
        let head = self
            .refs()
            .read_head()?
            .context("no current HEAD to branch from")?;

        self.refs().create_branch(name, &head)
    }

    /// Point HEAD at an existing branch.
    pub fn switch_branch(&self, name: &str) -> anyhow::Result<()> {
        let branch_ref = format!("refs/heads/{name}");
        if self.refs().resolve_ref(&branch_ref)?.is_none() {
            anyhow::bail!("branch {name} does not exist");
        }

        self.refs().set_head_to_branch(name)
    }

    /// List local branches, marking the one HEAD points at.
    pub fn list_branches(&self) -> anyhow::Result<String> {
        let refs = self.refs();
        let current = refs.current_branch()?;

        let mut lines = Vec::new();
        for name in refs.list_refs()? {
            let Some(branch) = name.strip_prefix("refs/heads/") else {
                continue;
            };

            let marker = if current.as_deref() == Some(branch) {
                "*"
            } else {
                " "
            };
            match refs.resolve_ref(&name)? {
                Some(oid) => lines.push(format!("{marker} {branch} {}", oid.to_short_oid())),
                None => lines.push(format!("{marker} {branch}")),
            }
        }

        Ok(lines.join("\n"))
    }
}
