use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::write_index_tree;

impl Repository {
    /// Commit the staged index: persist the tree hierarchy, wrap the
    /// root in a commit whose parent is the current HEAD, and advance
    /// HEAD's branch.
    pub fn commit(&self, message: &str) -> anyhow::Result<ObjectId> {
        let mut index = self.index();
        index.rehydrate()?;

        let root_oid = write_index_tree(self.database(), &index)?
            .ok_or_else(|| anyhow::anyhow!("nothing staged, nothing to commit"))?;

        let parents = self.refs().read_head()?.into_iter().collect::<Vec<_>>();
        let author = Author::load_from_env()?;

        let message = if message.ends_with('\n') {
            message.to_string()
        } else {
            format!("{message}\n")
        };

        let commit = Commit::new(parents, root_oid, author, message);
        let commit_id = self.database().store(&commit)?;

        self.refs().update_head(&commit_id)?;
        tracing::info!(oid = %commit_id, "created commit");

        Ok(commit_id)
    }
}
