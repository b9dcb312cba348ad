//! References: branches, tags and HEAD
//!
//! A reference file holds either a 40-character hex identifier or the
//! text `ref: <path>` naming another reference. Resolution follows the
//! symbolic chain until a direct identifier is found; a missing file
//! along the way resolves to nothing rather than an error.

use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

/// Regex pattern for symbolic reference contents.
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference.
pub const HEAD_REF_NAME: &str = "HEAD";

/// Reference manager rooted at the git directory.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the git directory (typically `.git`)
    path: Box<Path>,
}

/// Contents of a reference file.
#[derive(Debug, Clone)]
enum SymRefOrOid {
    SymRef(String),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {}", path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)
            .with_context(|| format!("invalid symref regex: {SYMREF_REGEX}"))?
            .captures(content);
        match symref_match {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef(symref_match[1].to_string()))),
            None => Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?))),
        }
    }
}

impl Refs {
    /// Resolve a reference name (e.g. `refs/heads/main`) to an object
    /// identifier, following symbolic indirection.
    pub fn resolve_ref(&self, name: &str) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(self.path.join(name).as_path())
    }

    fn read_symref(&self, path: &Path) -> anyhow::Result<Option<ObjectId>> {
        match SymRefOrOid::read(path)? {
            Some(SymRefOrOid::SymRef(target)) => {
                self.read_symref(self.path.join(target).as_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        self.read_symref(&self.head_path())
    }

    /// Name of the branch HEAD points at, if HEAD is symbolic.
    pub fn current_branch(&self) -> anyhow::Result<Option<String>> {
        match SymRefOrOid::read(&self.head_path())? {
            Some(SymRefOrOid::SymRef(target)) => Ok(target
                .strip_prefix("refs/heads/")
                .map(str::to_string)
                .or(Some(target))),
            Some(SymRefOrOid::Oid(_)) | None => Ok(None),
        }
    }

    /// Move the reference HEAD ultimately points at to a new commit.
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.update_symref(self.head_path().as_ref(), oid)
    }

    fn update_symref(&self, path: &Path, oid: &ObjectId) -> anyhow::Result<()> {
        match SymRefOrOid::read(path)? {
            Some(SymRefOrOid::SymRef(target)) => {
                let target_path = self.path.join(target);
                self.update_symref(target_path.as_path(), oid)
            }
            Some(SymRefOrOid::Oid(_)) | None => {
                self.update_ref_file(path, format!("{oid}\n"))
            }
        }
    }

    pub fn create_branch(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let branch_path = self.heads_path().join(name);

        if branch_path.exists() {
            anyhow::bail!("branch {name} already exists");
        }

        self.update_ref_file(&branch_path, format!("{oid}\n"))
    }

    pub fn create_tag(&self, name: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let tag_path = self.tags_path().join(name);

        if tag_path.exists() {
            anyhow::bail!("tag {name} already exists");
        }

        self.update_ref_file(&tag_path, format!("{oid}\n"))
    }

    /// Point HEAD at a branch symbolically.
    pub fn set_head_to_branch(&self, name: &str) -> anyhow::Result<()> {
        self.update_ref_file(&self.head_path(), format!("ref: refs/heads/{name}\n"))
    }

    /// Overwrite a reference file under an exclusive advisory lock.
    pub fn update_ref_file(&self, path: &Path, raw_ref: String) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {}",
                path.display()
            )
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {}", path.display()))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(raw_ref.as_bytes())?;

        Ok(())
    }

    /// List reference names under `refs/`, relative to the git directory.
    pub fn list_refs(&self) -> anyhow::Result<Vec<String>> {
        Ok(WalkDir::new(self.refs_path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                Some(relative.to_string_lossy().to_string())
            })
            .collect::<Vec<_>>())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_REF_NAME).into_boxed_path()
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }

    pub fn heads_path(&self) -> Box<Path> {
        self.refs_path().join("heads").into_boxed_path()
    }

    pub fn tags_path(&self) -> Box<Path> {
        self.refs_path().join("tags").into_boxed_path()
    }
}
