use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use crate::error::Error;

impl Repository {
    /// Render the object `name` resolves to, following indirections.
    pub fn cat_file(&self, name: &str) -> anyhow::Result<String> {
        let oid = find_object(self, name, None, true)?
            .ok_or_else(|| Error::ObjectNotFound(name.to_string()))?;

        let object = self.database().load(&oid)?;

        Ok(object.display())
    }

    /// Report the stored type of the object `name` resolves to, without
    /// parsing its payload.
    pub fn object_type_of(&self, name: &str) -> anyhow::Result<ObjectType> {
        let oid = find_object(self, name, None, true)?
            .ok_or_else(|| Error::ObjectNotFound(name.to_string()))?;

        self.database().load_type(&oid)
    }
}
