//! Name resolution: turn a human-supplied name into an object identifier.
//!
//! A name may be the literal `HEAD`, a (possibly short) hex hash, a tag
//! name or a branch name. All rules that match contribute candidates to a
//! single pool; more than one distinct candidate is an ambiguity error
//! that enumerates every match, while zero candidates is an ordinary
//! empty result.

use crate::areas::refs::HEAD_REF_NAME;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object::ObjectKind;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::Error;
use anyhow::Context;
use std::collections::BTreeSet;

/// Hex prefixes between 4 and 40 characters are hash candidates.
const HASH_PATTERN: &str = r"^[0-9a-fA-F]{4,40}$";

/// Resolve `name` to an object identifier, optionally dereferencing
/// through tag/commit indirection until an object of `expected` type is
/// reached.
///
/// With `expected` set and `follow` false, a type mismatch yields `None`
/// rather than an error. An unresolvable name always yields `None`;
/// ambiguity is an [`Error::Ambiguous`].
pub fn find_object(
    repository: &Repository,
    name: &str,
    expected: Option<ObjectType>,
    follow: bool,
) -> anyhow::Result<Option<ObjectId>> {
    let Some(oid) = resolve_name(repository, name)? else {
        return Ok(None);
    };

    let Some(expected) = expected else {
        return Ok(Some(oid));
    };

    // Follow tag -> target and commit -> tree indirections until the
    // expected type is reached or no further redirection is possible.
    let mut current = oid;
    loop {
        let object = repository.database().load(&current)?;

        match object {
            _ if object_matches(&object, expected) => return Ok(Some(current)),
            _ if !follow => return Ok(None),
            ObjectKind::Tag(tag) => current = tag.object().clone(),
            ObjectKind::Commit(commit) if expected == ObjectType::Tree => {
                current = commit.tree_oid().clone();
            }
            _ => return Ok(None),
        }
    }
}

fn object_matches(object: &ObjectKind, expected: ObjectType) -> bool {
    use crate::artifacts::objects::object::Object;
    object.object_type() == expected
}

/// Collect every candidate the name could denote and insist on exactly
/// one distinct winner.
fn resolve_name(repository: &Repository, name: &str) -> anyhow::Result<Option<ObjectId>> {
    let mut candidates = BTreeSet::new();
    let refs = repository.refs();

    if name == HEAD_REF_NAME {
        candidates.extend(refs.read_head()?);
    }

    let hash_like = regex::Regex::new(HASH_PATTERN)
        .with_context(|| format!("invalid hash regex: {HASH_PATTERN}"))?
        .is_match(name);
    if hash_like {
        candidates.extend(
            repository
                .database()
                .find_objects_by_prefix(&name.to_ascii_lowercase())?,
        );
    }

    candidates.extend(refs.resolve_ref(&format!("refs/tags/{name}"))?);
    candidates.extend(refs.resolve_ref(&format!("refs/heads/{name}"))?);

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.into_iter().next()),
        _ => Err(Error::Ambiguous {
            name: name.to_string(),
            candidates: candidates
                .into_iter()
                .map(|oid| oid.as_ref().to_string())
                .collect(),
        }
        .into()),
    }
}
