//! Tree object and the index<->tree conversions.
//!
//! A tree is the directory-equivalent object: an ordered list of leaves
//! `<mode> <path-segment>\0<20-byte-sha>`, where `mode` is a 6-character
//! octal string (2-digit type, 4-digit permissions; `040000` for
//! subtrees). Leaf order is canonical and applied at serialization time,
//! never at construction time, so any permutation of insertions yields
//! the same bytes and therefore the same identifier.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::resolve::find_object;
use crate::error::Error;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Mode string prefix of subtree leaves.
const SUBTREE_MODE_PREFIX: &str = "04";
/// Mode string prefix of regular file leaves.
const FILE_MODE_PREFIX: &str = "10";
/// Full mode string of a synthesized subtree leaf: directory type, zero
/// permission field.
const SUBTREE_MODE: &str = "040000";

/// One child reference inside a tree: mode, single path segment, object id.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeLeaf {
    pub mode: String,
    pub path: String,
    pub oid: ObjectId,
}

impl TreeLeaf {
    pub fn subtree(path: String, oid: ObjectId) -> Self {
        TreeLeaf::new(SUBTREE_MODE.to_string(), path, oid)
    }

    pub fn is_subtree(&self) -> bool {
        self.mode.starts_with(SUBTREE_MODE_PREFIX)
    }

    /// Canonical ordering class: file leaves sort before subtree leaves.
    fn sorts_as_file(&self) -> bool {
        self.mode.starts_with(FILE_MODE_PREFIX)
    }

    pub fn object_type(&self) -> ObjectType {
        if self.is_subtree() {
            ObjectType::Tree
        } else {
            ObjectType::Blob
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    leaves: Vec<TreeLeaf>,
}

impl Tree {
    pub fn new(leaves: Vec<TreeLeaf>) -> Self {
        Tree { leaves }
    }

    pub fn push(&mut self, leaf: TreeLeaf) {
        self.leaves.push(leaf);
    }

    pub fn leaves(&self) -> &[TreeLeaf] {
        &self.leaves
    }

    /// Leaves in canonical serialization order.
    fn sorted_leaves(&self) -> Vec<&TreeLeaf> {
        let mut sorted: Vec<&TreeLeaf> = self.leaves.iter().collect();
        sorted.sort_by(|a, b| {
            b.sorts_as_file()
                .cmp(&a.sorts_as_file())
                .then_with(|| a.path.cmp(&b.path))
        });
        sorted
    }
}

impl Packable for Tree {
    fn payload(&self) -> anyhow::Result<Bytes> {
        let mut out = Vec::new();

        for leaf in self.sorted_leaves() {
            out.write_all(leaf.mode.as_bytes())?;
            out.push(b' ');
            out.write_all(leaf.path.as_bytes())?;
            out.push(0);
            leaf.oid.write_raw_to(&mut out)?;
        }

        Ok(Bytes::from(out))
    }
}

impl Unpackable for Tree {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let raw = payload.as_ref();
        let mut leaves = Vec::new();
        let mut pos = 0;

        while pos < raw.len() {
            let (leaf, next) = parse_leaf_at(raw, pos)?;
            leaves.push(leaf);
            pos = next;
        }

        Ok(Tree { leaves })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.sorted_leaves()
            .iter()
            .map(|leaf| {
                format!(
                    "{} {} {}\t{}",
                    leaf.mode,
                    leaf.object_type().as_str(),
                    leaf.oid,
                    leaf.path
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse one leaf starting at `pos`, returning it with the next offset.
fn parse_leaf_at(raw: &[u8], pos: usize) -> anyhow::Result<(TreeLeaf, usize)> {
    let space = raw[pos..]
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| Error::Format("tree leaf without mode separator".into()))?;
    if space != 6 {
        return Err(Error::Format(format!("corrupt tree leaf spacing at offset {pos}")).into());
    }
    let mode = std::str::from_utf8(&raw[pos..pos + 6])?.to_string();

    let path_start = pos + 7;
    let nul = raw[path_start..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| path_start + i)
        .ok_or_else(|| Error::Format("tree leaf without path terminator".into()))?;
    let path = std::str::from_utf8(&raw[path_start..nul])?.to_string();

    let sha_start = nul + 1;
    let sha_end = sha_start + 20;
    if raw.len() < sha_end {
        return Err(Error::Format("truncated object id in tree leaf".into()).into());
    }
    let oid = ObjectId::from_raw(&raw[sha_start..sha_end])?;

    Ok((TreeLeaf::new(mode, path, oid), sha_end))
}

/// Containing directory of a staged path; empty path for root-level names.
fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Convert the flat staged-file list into a hierarchy of persisted tree
/// objects and return the root tree's identifier.
///
/// Entries are grouped by containing directory, with (possibly empty)
/// groups for every ancestor up to the root. Groups are processed deepest
/// first, so every subdirectory's tree id exists before its parent is
/// serialized; the parent then receives a synthesized `040000` leaf.
///
/// An empty index produces no tree at all and returns `None`.
pub fn write_index_tree(database: &Database, index: &Index) -> anyhow::Result<Option<ObjectId>> {
    let mut groups: BTreeMap<PathBuf, Vec<TreeLeaf>> = BTreeMap::new();

    for entry in index.entries() {
        let dir = parent_dir(&entry.name);

        let mut ancestor = dir.clone();
        loop {
            groups.entry(ancestor.clone()).or_default();
            if ancestor.as_os_str().is_empty() {
                break;
            }
            ancestor = parent_dir(&ancestor);
        }

        let leaf = TreeLeaf::new(
            entry.metadata.mode.tree_mode(),
            entry.basename()?.to_string(),
            entry.oid.clone(),
        );
        groups
            .get_mut(&dir)
            .context("directory group missing for staged entry")?
            .push(leaf);
    }

    // Deepest directories first, so children are materialized before
    // their parents; the root (empty path) necessarily comes last.
    let mut dirs: Vec<PathBuf> = groups.keys().cloned().collect();
    dirs.sort_by(|a, b| {
        let depth_a = a.components().count();
        let depth_b = b.components().count();
        depth_b.cmp(&depth_a).then_with(|| a.cmp(b))
    });

    let mut root_oid = None;
    for dir in dirs {
        let leaves = groups
            .remove(&dir)
            .context("directory group vanished during tree build")?;
        let oid = database.store(&Tree::new(leaves))?;

        if dir.as_os_str().is_empty() {
            root_oid = Some(oid);
        } else {
            let segment = dir
                .file_name()
                .and_then(|name| name.to_str())
                .context("invalid directory name in index")?
                .to_string();
            groups
                .get_mut(&parent_dir(&dir))
                .context("parent group missing during tree build")?
                .push(TreeLeaf::subtree(segment, oid));
        }
    }

    Ok(root_oid)
}

/// Flatten the tree reachable from `name` into a `full path -> object id`
/// map, the inverse of [`write_index_tree`].
///
/// Follows through commits when `name` resolves to one. A name that does
/// not resolve yields an empty map; callers that care about the
/// difference between "empty repository" and "bad name" must check first.
pub fn tree_to_map(
    repository: &Repository,
    name: &str,
    prefix: &Path,
) -> anyhow::Result<BTreeMap<PathBuf, ObjectId>> {
    let mut map = BTreeMap::new();

    let Some(oid) = find_object(repository, name, Some(ObjectType::Tree), true)? else {
        return Ok(map);
    };
    collect_leaves(repository.database(), &oid, prefix, &mut map)?;

    Ok(map)
}

fn collect_leaves(
    database: &Database,
    oid: &ObjectId,
    prefix: &Path,
    map: &mut BTreeMap<PathBuf, ObjectId>,
) -> anyhow::Result<()> {
    let tree = database
        .load(oid)?
        .into_tree()
        .with_context(|| format!("object {oid} is not a tree"))?;

    for leaf in tree.leaves() {
        let full_path = prefix.join(&leaf.path);
        if leaf.is_subtree() {
            collect_leaves(database, &leaf.oid, &full_path, map)?;
        } else {
            map.insert(full_path, leaf.oid.clone());
        }
    }

    Ok(())
}
