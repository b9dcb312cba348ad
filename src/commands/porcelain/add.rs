use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use std::path::PathBuf;

impl Repository {
    /// Stage the given paths: store their content as blobs and record
    /// them in the index. Directories are expanded to the files below
    /// them.
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut index = self.index();
        index.rehydrate()?;

        let paths = paths
            .iter()
            .map(|path| self.workspace().list_files(Some(path.clone())))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten();

        for path in paths {
            let blob = self.workspace().parse_blob(&path)?;
            let stat = self.workspace().stat_file(&path)?;

            let blob_id = self.database().store(&blob)?;
            index.add(IndexEntry::new(path, blob_id, stat));
        }

        index.write_updates()?;

        Ok(())
    }
}
