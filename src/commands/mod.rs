//! Command implementations, split the way git splits them:
//!
//! - `plumbing`: low-level object manipulation (hash-object, cat-file,
//!   ls-tree, rev-parse)
//! - `porcelain`: user-facing workflows (add, commit, ls-files)
//!
//! Each command is an `impl Repository` block returning its output, so
//! the binary decides how to print and tests can assert on values.

pub mod plumbing;
pub mod porcelain;
