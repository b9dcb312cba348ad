use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::Path;

impl Repository {
    /// Hash a workspace file as a blob, optionally persisting it.
    pub fn hash_object(&self, object_path: &Path, write: bool) -> anyhow::Result<ObjectId> {
        let object_data = self.workspace().read_file(object_path)?;
        let object = Blob::new(object_data);

        let object_id = object.object_id()?;

        if write {
            self.database().store(&object)?;
        }

        Ok(object_id)
    }
}
