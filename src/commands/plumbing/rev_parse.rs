use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;

impl Repository {
    /// Resolve a name (HEAD, hash prefix, tag or branch) to a full
    /// identifier, optionally constrained to an object type.
    pub fn rev_parse(
        &self,
        name: &str,
        expected: Option<ObjectType>,
    ) -> anyhow::Result<Option<ObjectId>> {
        find_object(self, name, expected, true)
    }
}
