use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;

/// Opaque byte payload, file content stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    pub fn new(data: Bytes) -> Self {
        Blob { data }
    }
}

impl Packable for Blob {
    fn payload(&self) -> anyhow::Result<Bytes> {
        Ok(self.data.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        Ok(Blob { data: payload })
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }
}
