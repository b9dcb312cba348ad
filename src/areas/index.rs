//! Staging index
//!
//! The index file records the set of paths staged for the next commit
//! together with filesystem metadata and blob identifiers. On disk it is
//! a 12-byte header (signature, version, entry count, all big-endian)
//! followed by the padded entry records sorted by path.

use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::error::Error;
use anyhow::Context;
use byteorder::{NetworkEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::Read;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};

/// In-memory staging index, kept sorted by path.
#[derive(Debug, Clone)]
pub struct Index {
    path: Box<Path>,
    version: u32,
    entries: BTreeMap<PathBuf, IndexEntry>,
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            version: VERSION,
            entries: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stage an entry, replacing any previous entry at the same path.
    pub fn add(&mut self, entry: IndexEntry) {
        self.entries.insert(entry.name.clone(), entry);
        self.changed = true;
    }

    /// Unstage the entry at `path`; absent paths are a no-op.
    pub fn remove(&mut self, path: &Path) {
        if self.entries.remove(path).is_some() {
            self.changed = true;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.version = VERSION;
        self.changed = false;
    }

    /// Load the index from disk, replacing any in-memory state.
    ///
    /// A missing or empty index file hydrates to an empty index. Holds a
    /// shared advisory lock on the file while reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        if !self.path.exists() {
            self.clear();
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new().read(true).open(&self.path)?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        self.clear();

        let mut raw = Vec::new();
        lock.deref_mut()
            .read_to_end(&mut raw)
            .with_context(|| format!("unable to read index file {}", self.path.display()))?;

        if raw.is_empty() {
            return Ok(());
        }

        self.load_bytes(&Bytes::from(raw))
    }

    /// Parse a serialized index into this instance, replacing any
    /// previously held entries.
    pub fn load_bytes(&mut self, raw: &Bytes) -> anyhow::Result<()> {
        self.clear();

        if raw.len() < HEADER_SIZE {
            return Err(Error::Format("index file shorter than its header".to_string()).into());
        }

        let mut header = std::io::Cursor::new(&raw[..HEADER_SIZE]);
        let mut signature = [0u8; 4];
        header.read_exact(&mut signature)?;
        if &signature != SIGNATURE {
            return Err(Error::Format(format!(
                "bad index signature {:?}",
                signature
            ))
            .into());
        }

        let version = header.read_u32::<NetworkEndian>()?;
        if version != VERSION {
            return Err(Error::Version(version).into());
        }
        self.version = version;

        let count = header.read_u32::<NetworkEndian>()?;

        // entry offsets and padding are relative to the start of the
        // entries section, not the file
        let entries_section = &raw[HEADER_SIZE..];
        let mut pos = 0usize;
        for _ in 0..count {
            let (entry, next) = IndexEntry::parse_at(entries_section, pos)?;
            self.entries.insert(entry.name.clone(), entry);
            pos = next;
        }

        Ok(())
    }

    /// Serialize the header and sorted entries.
    pub fn to_bytes(&self) -> anyhow::Result<Bytes> {
        let mut out = Vec::new();
        out.extend_from_slice(SIGNATURE);
        out.write_u32::<NetworkEndian>(self.version)?;
        out.write_u32::<NetworkEndian>(self.entries.len() as u32)?;

        let mut entries_section = Vec::new();
        for entry in self.entries.values() {
            entry.write_to(&mut entries_section)?;
        }
        out.extend_from_slice(&entries_section);

        Ok(out.into())
    }

    /// Write the index back to disk under an exclusive advisory lock.
    /// A no-op unless entries were added or removed since the last
    /// load or write.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        if !self.changed {
            return Ok(());
        }

        let raw = self.to_bytes()?;

        let mut index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("unable to open index file {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Exclusive, 0, 1)?;

        std::io::Write::write_all(lock.deref_mut(), &raw)
            .with_context(|| format!("unable to write index file {}", self.path.display()))?;

        self.changed = false;
        tracing::debug!(entries = self.entries.len(), "wrote index");

        Ok(())
    }
}
