//! Object traits and the closed object union.
//!
//! Every object is content-addressed by the SHA-1 of its canonical framed
//! form `<type> <decimal payload length>\0<payload>`. The framing lives
//! here, in one place, so that identifiers stay a pure function of the
//! serialized bytes for all four variants.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::io::Write;
use std::path::PathBuf;

pub trait Packable {
    /// Canonical payload bytes, without the type/length framing.
    fn payload(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    /// Rebuild the value from its canonical payload bytes.
    fn deserialize(payload: Bytes) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// Human-oriented rendering, used by `cat-file`-style callers.
    fn display(&self) -> String;

    /// Framed canonical form: `<type> <len>\0<payload>`.
    fn serialize(&self) -> Result<Bytes> {
        let payload = self.payload()?;

        let mut framed = Vec::with_capacity(payload.len() + 16);
        let header = format!("{} {}\0", self.object_type().as_str(), payload.len());
        framed.write_all(header.as_bytes())?;
        framed.write_all(&payload)?;

        Ok(Bytes::from(framed))
    }

    /// SHA-1 of the framed form; identical payloads share an identifier.
    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        let mut hasher = Sha1::new();
        hasher.update(&content);

        let oid = hasher.finalize();
        ObjectId::try_parse(format!("{oid:x}"))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Closed tagged union over the stored object variants.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl ObjectKind {
    pub fn into_blob(self) -> Option<Blob> {
        match self {
            ObjectKind::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            ObjectKind::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn into_commit(self) -> Option<Commit> {
        match self {
            ObjectKind::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    pub fn into_tag(self) -> Option<Tag> {
        match self {
            ObjectKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

impl Packable for ObjectKind {
    fn payload(&self) -> Result<Bytes> {
        match self {
            ObjectKind::Blob(blob) => blob.payload(),
            ObjectKind::Tree(tree) => tree.payload(),
            ObjectKind::Commit(commit) => commit.payload(),
            ObjectKind::Tag(tag) => tag.payload(),
        }
    }
}

impl Object for ObjectKind {
    fn object_type(&self) -> ObjectType {
        match self {
            ObjectKind::Blob(blob) => blob.object_type(),
            ObjectKind::Tree(tree) => tree.object_type(),
            ObjectKind::Commit(commit) => commit.object_type(),
            ObjectKind::Tag(tag) => tag.object_type(),
        }
    }

    fn display(&self) -> String {
        match self {
            ObjectKind::Blob(blob) => blob.display(),
            ObjectKind::Tree(tree) => tree.display(),
            ObjectKind::Commit(commit) => commit.display(),
            ObjectKind::Tag(tag) => tag.display(),
        }
    }
}
