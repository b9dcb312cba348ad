//! Commit object
//!
//! A commit snapshots a tree, names its parent lineage and carries
//! authorship plus a free-text message. The payload is a key-value list
//! with message (see [`crate::artifacts::objects::kvlm`]):
//!
//! ```text
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::kvlm::Kvlm;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::error::Error;
use anyhow::Context;
use bytes::Bytes;

/// Author or committer identity with timestamp.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    /// `Name <email> <unix-seconds> <tz>` as written into commit payloads.
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Author identity from `GIT_AUTHOR_NAME` / `GIT_AUTHOR_EMAIL`.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("GIT_AUTHOR_NAME").context("GIT_AUTHOR_NAME not set")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL").context("GIT_AUTHOR_EMAIL not set")?;

        Ok(Author::new(name, email))
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // "name <email> timestamp timezone", split from the right
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(Error::Format(format!("invalid author line {value:?}")).into());
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| Error::Format(format!("invalid author timestamp {:?}", parts[1])))?;
        let name_email = parts[2];

        let email_start = name_email
            .find('<')
            .ok_or_else(|| Error::Format(format!("invalid author line {value:?}")))?;
        let email_end = name_email
            .find('>')
            .ok_or_else(|| Error::Format(format!("invalid author line {value:?}")))?;

        let name = name_email[..email_start].trim().to_string();
        let email = name_email[email_start + 1..email_end].to_string();

        let datetime =
            chrono::DateTime::parse_from_str(&format!("{timestamp} {timezone}"), "%s %z")
                .map_err(|_| Error::Format(format!("invalid author timezone {timezone:?}")))?;

        Ok(Author {
            name,
            email,
            timestamp: datetime,
        })
    }
}

/// Commit object: tree snapshot, parent lineage, authorship and message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    tree_oid: ObjectId,
    parents: Vec<ObjectId>,
    author: Author,
    committer: Author,
    gpgsig: Option<String>,
    message: String,
}

impl Commit {
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            tree_oid,
            parents,
            author: author.clone(),
            committer: author,
            gpgsig: None,
            message,
        }
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    fn to_kvlm(&self) -> Kvlm {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", self.tree_oid.as_ref());
        for parent in &self.parents {
            kvlm.push("parent", parent.as_ref());
        }
        kvlm.push("author", self.author.display());
        kvlm.push("committer", self.committer.display());
        if let Some(gpgsig) = &self.gpgsig {
            kvlm.push("gpgsig", gpgsig.clone());
        }
        kvlm.set_message(self.message.clone());
        kvlm
    }
}

impl Packable for Commit {
    fn payload(&self) -> anyhow::Result<Bytes> {
        self.to_kvlm().serialize()
    }
}

impl Unpackable for Commit {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let kvlm = Kvlm::parse(&payload)?;

        let tree_oid = kvlm
            .first("tree")
            .ok_or_else(|| Error::Format("commit without tree field".into()))?;
        let tree_oid = ObjectId::try_parse(tree_oid.to_string())?;

        let parents = kvlm
            .all("parent")
            .map(|parent| ObjectId::try_parse(parent.to_string()))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let author = kvlm
            .first("author")
            .ok_or_else(|| Error::Format("commit without author field".into()))?;
        let author = Author::try_from(author)?;

        let committer = kvlm
            .first("committer")
            .ok_or_else(|| Error::Format("commit without committer field".into()))?;
        let committer = Author::try_from(committer)?;

        let gpgsig = kvlm.first("gpgsig").map(str::to_string);

        Ok(Commit {
            tree_oid,
            parents,
            author,
            committer,
            gpgsig,
            message: kvlm.message().to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.to_kvlm()
            .serialize()
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default()
    }
}
