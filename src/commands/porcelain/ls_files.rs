use crate::areas::repository::Repository;
use std::path::PathBuf;

impl Repository {
    /// Staged paths in index order.
    pub fn ls_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut index = self.index();
        index.rehydrate()?;

        Ok(index.entries().map(|entry| entry.name.clone()).collect())
    }
}
