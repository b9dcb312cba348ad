//! Error taxonomy for the storage core.
//!
//! Every unrecoverable condition maps to one of these variants so that
//! callers (and tests) can tell a corrupt file from a missing object or an
//! ambiguous name. Errors propagate through `anyhow::Result` and can be
//! recovered with `downcast_ref::<Error>()`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed bytes: bad object header, bad index header/entry,
    /// corrupt tree leaf spacing.
    #[error("format error: {0}")]
    Format(String),

    /// Unsupported index or repository format version.
    #[error("unsupported version {0}")]
    Version(u32),

    /// No object file exists for the given identifier.
    #[error("object {0} not found")]
    ObjectNotFound(String),

    /// Unrecognized object type tag in an object header.
    #[error("unknown object format {0:?}")]
    UnknownFormat(String),

    /// Name resolution produced more than one distinct candidate.
    #[error("short name {name:?} is ambiguous, candidates are: {}", candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    /// The metadata directory is absent or malformed during a
    /// non-creating open.
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),
}
