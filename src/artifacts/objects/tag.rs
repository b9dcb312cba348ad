//! Annotated tag object
//!
//! Same key-value-list-with-message payload as commits, with
//! `object`/`type`/`tag`/`tagger` keys. The `object` field is the tagged
//! target, which the resolver dereferences when following indirections.

use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::Error;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    object: ObjectId,
    target_type: ObjectType,
    name: String,
    tagger: Option<Author>,
    message: String,
}

impl Tag {
    pub fn new(
        object: ObjectId,
        target_type: ObjectType,
        name: String,
        tagger: Option<Author>,
        message: String,
    ) -> Self {
        Tag {
            object,
            target_type,
            name,
            tagger,
            message,
        }
    }

    /// The tagged object's identifier.
    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn to_kvlm(&self) -> Kvlm {
        let mut kvlm = Kvlm::new();
        kvlm.push("object", self.object.as_ref());
        kvlm.push("type", self.target_type.as_str());
        kvlm.push("tag", self.name.clone());
        if let Some(tagger) = &self.tagger {
            kvlm.push("tagger", tagger.display());
        }
        kvlm.set_message(self.message.clone());
        kvlm
    }
}

impl Packable for Tag {
    fn payload(&self) -> anyhow::Result<Bytes> {
        self.to_kvlm().serialize()
    }
}

impl Unpackable for Tag {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let kvlm = Kvlm::parse(&payload)?;

        let object = kvlm
            .first("object")
            .ok_or_else(|| Error::Format("tag without object field".into()))?;
        let object = ObjectId::try_parse(object.to_string())?;

        let target_type = kvlm
            .first("type")
            .ok_or_else(|| Error::Format("tag without type field".into()))?;
        let target_type = ObjectType::try_from(target_type)?;

        let name = kvlm
            .first("tag")
            .ok_or_else(|| Error::Format("tag without tag field".into()))?
            .to_string();

        let tagger = kvlm.first("tagger").map(Author::try_from).transpose()?;

        Ok(Tag {
            object,
            target_type,
            name,
            tagger,
            message: kvlm.message().to_string(),
        })
    }
}

impl Object for Tag {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tag
    }

    fn display(&self) -> String {
        self.to_kvlm()
            .serialize()
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn serialize_then_deserialize_is_identity() {
        let target =
            ObjectId::try_parse("45b983be36b73c0788dc9cbcb76cbb80fc7bb057".to_string()).unwrap();
        let tagger = Author::try_from("Ada L <ada@example.com> 815464800 +0100").unwrap();
        let tag = Tag::new(
            target,
            ObjectType::Commit,
            "v1.0".to_string(),
            Some(tagger),
            "first release\n".to_string(),
        );

        let parsed = Tag::deserialize(tag.payload().unwrap()).unwrap();
        pretty_assertions::assert_eq!(parsed, tag);
        pretty_assertions::assert_eq!(parsed.name(), "v1.0");
        pretty_assertions::assert_eq!(parsed.message(), "first release\n");
    }

    #[rstest]
    fn missing_object_field_is_a_format_error() {
        let payload = Bytes::from_static(b"type commit\ntag v1\n\nm");
        let err = Tag::deserialize(payload).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Format(_))
        ));
    }
}
