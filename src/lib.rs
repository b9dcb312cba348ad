//! Git-compatible storage core: a content-addressable object database,
//! the binary staging index, index-to-tree conversion and reference
//! resolution.
//!
//! The crate is split into storage `areas` (repository, database, index
//! file, refs, workspace) and the `artifacts` they exchange (objects,
//! index entries, name resolution). `commands` composes the two into
//! git-shaped operations.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod error;
