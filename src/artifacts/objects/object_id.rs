//! Object identifier (SHA-1 hash)
//!
//! Object ids are 40-character hexadecimal strings naming objects in the
//! database. On disk inside tree objects and the index they appear as 20
//! raw bytes; `objects/<first-2>/<remaining-38>` is the storage path.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use std::io;
use std::path::PathBuf;

/// A validated 40-hex-character object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an id from a string.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("invalid object id length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("invalid object id characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an id from its 20-byte binary form.
    pub fn from_raw(raw: &[u8]) -> anyhow::Result<Self> {
        Self::try_parse(hex::encode(raw))
    }

    /// Write the 20-byte binary form, as embedded in trees and the index.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let raw = hex::decode(&self.0)?;
        writer.write_all(&raw)?;
        Ok(())
    }

    /// Read an id from its 20-byte binary form.
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut raw)?;
        Self::from_raw(&raw)
    }

    /// Storage path under the objects directory: `ab/c123...`.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Abbreviated 7-character form for display.
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl Default for ObjectId {
    /// The all-zero null identifier.
    fn default() -> Self {
        ObjectId("0".repeat(OBJECT_ID_LENGTH))
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd80709")]
    #[case("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709")]
    fn parses_valid_ids(#[case] id: &str) {
        let oid = ObjectId::try_parse(id.to_string()).unwrap();
        pretty_assertions::assert_eq!(
            oid.as_ref(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[rstest]
    #[case("da39a3ee")]
    #[case("zz39a3ee5e6b4b0d3255bfef95601890afd80709")]
    #[case("")]
    fn rejects_invalid_ids(#[case] id: &str) {
        assert!(ObjectId::try_parse(id.to_string()).is_err());
    }

    #[test]
    fn raw_round_trip() {
        let oid =
            ObjectId::try_parse("da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string()).unwrap();
        let mut raw = Vec::new();
        oid.write_raw_to(&mut raw).unwrap();
        assert_eq!(raw.len(), 20);

        let back = ObjectId::read_raw_from(&mut std::io::Cursor::new(raw)).unwrap();
        pretty_assertions::assert_eq!(back, oid);
    }

    #[test]
    fn storage_path_splits_after_two_chars() {
        let oid =
            ObjectId::try_parse("da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string()).unwrap();
        pretty_assertions::assert_eq!(
            oid.to_path(),
            PathBuf::from("da").join("39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }
}
