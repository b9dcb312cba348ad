//! Content-addressable object database
//!
//! Objects are stored zlib-compressed under `objects/<first-2>/<last-38>`
//! of their hex identifier. Writes go through a temp file followed by a
//! rename, and an already-present object is never rewritten, so storing
//! the same content twice is a no-op.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectKind, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use crate::error::Error;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

// TODO: implement packfiles for better storage efficiency
impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store an object, returning its identifier.
    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        let object_id = object.object_id()?;
        let object_path = self.path.join(object.object_path()?);

        if !object_path.exists() {
            std::fs::create_dir_all(
                object_path
                    .parent()
                    .with_context(|| format!("invalid object path {}", object_path.display()))?,
            )
            .with_context(|| {
                format!(
                    "unable to create object directory for {}",
                    object_path.display()
                )
            })?;

            self.write_object(object_path, object.serialize()?)?;
        }

        tracing::debug!(oid = %object_id, "stored object");
        Ok(object_id)
    }

    /// Load and parse an object by identifier.
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<ObjectKind> {
        let (object_type, declared_size, mut reader) = self.load_as_bytes(object_id)?;

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        if payload.len() != declared_size {
            return Err(Error::Format(format!(
                "object {object_id} declares {declared_size} payload bytes but has {}",
                payload.len()
            ))
            .into());
        }
        let payload = Bytes::from(payload);

        let object = match object_type {
            ObjectType::Blob => ObjectKind::Blob(Blob::deserialize(payload)?),
            ObjectType::Tree => ObjectKind::Tree(Tree::deserialize(payload)?),
            ObjectType::Commit => ObjectKind::Commit(Commit::deserialize(payload)?),
            ObjectType::Tag => ObjectKind::Tag(Tag::deserialize(payload)?),
        };

        Ok(object)
    }

    /// Read the stored type of an object without parsing its payload.
    pub fn load_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _, _) = self.load_as_bytes(object_id)?;
        Ok(object_type)
    }

    fn load_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, usize, impl BufRead)> {
        let object_path = self.path.join(object_id.to_path());

        if !object_path.exists() {
            return Err(Error::ObjectNotFound(object_id.as_ref().to_string()).into());
        }

        let object_content = self.read_object(object_path)?;
        let mut object_reader = Cursor::new(object_content);

        let (object_type, declared_size) = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, declared_size, object_reader))
    }

    fn read_object(&self, object_path: PathBuf) -> anyhow::Result<Bytes> {
        let object_content = std::fs::read(&object_path).with_context(|| {
            format!("unable to read object file {}", object_path.display())
        })?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("invalid object path {}", object_path.display()))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .with_context(|| {
                format!(
                    "unable to open object file {}",
                    temp_object_path.display()
                )
            })?;

        file.write_all(&object_content).with_context(|| {
            format!(
                "unable to write object file {}",
                temp_object_path.display()
            )
        })?;

        // rename the temp file onto the final path to make the write atomic
        std::fs::rename(&temp_object_path, &object_path).with_context(|| {
            format!("unable to rename object file to {}", object_path.display())
        })?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed| compressed.into())
            .context("unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("unable to decompress object content")?;

        Ok(decompressed.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }

    /// Find every stored object whose hex identifier starts with `prefix`.
    ///
    /// Prefixes shorter than the two-character bucket name would require a
    /// full scan and are rejected by the caller's pattern, so only the one
    /// bucket directory is read. A missing bucket means no matches, not an
    /// error.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let mut matches = Vec::new();

        let (dir_name, file_prefix) = prefix.split_at(2.min(prefix.len()));
        let dir_path = self.path.join(dir_name);

        if dir_path.is_dir() {
            for entry in std::fs::read_dir(&dir_path)? {
                let entry = entry?;
                let file_name = entry.file_name();
                let file_name = file_name.to_string_lossy();

                if file_name.starts_with(file_prefix) {
                    let full_oid = format!("{dir_name}{file_name}");
                    if let Ok(oid) = ObjectId::try_parse(full_oid) {
                        matches.push(oid);
                    }
                }
            }
        }

        Ok(matches)
    }
}
