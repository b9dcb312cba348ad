use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::tree_to_map;
use crate::artifacts::resolve::find_object;
use crate::error::Error;
use std::path::Path;

impl Repository {
    /// List the tree `name` resolves to, following through commits and
    /// tags. With `recursive` the whole hierarchy is flattened to
    /// `full/path -> id` lines.
    pub fn ls_tree(&self, name: &str, recursive: bool) -> anyhow::Result<String> {
        if recursive {
            let map = tree_to_map(self, name, Path::new(""))?;
            return Ok(map
                .iter()
                .map(|(path, oid)| format!("{oid}\t{}", path.display()))
                .collect::<Vec<_>>()
                .join("\n"));
        }

        let oid = find_object(self, name, Some(ObjectType::Tree), true)?
            .ok_or_else(|| Error::ObjectNotFound(name.to_string()))?;
        let tree = self.database().load(&oid)?;

        Ok(tree.display())
    }
}
