//! Binary codec for one staged file.
//!
//! Each entry occupies a 62-byte fixed region (big-endian integers, raw
//! 20-byte SHA-1), followed by the path bytes, a NUL terminator and zero
//! padding to the next 8-byte boundary relative to the start of the
//! entries section. The 2-byte flags field packs the assume-valid bit, a
//! reserved extended bit, the 2-bit merge stage and a 12-bit path length
//! capped at 0xFFF; at the cap the decoder scans forward for the NUL
//! instead of trusting the length field.
//!
//! Parsing is cursor-based over an immutable buffer: each step takes an
//! offset and returns the value together with the next offset.

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use crate::error::Error;
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::os::unix::prelude::MetadataExt;
use std::path::{Path, PathBuf};

/// Size of the fixed region preceding the path bytes.
pub const ENTRY_FIXED_SIZE: usize = 62;

/// Largest path length representable in the 12-bit flags field.
pub const NAME_LENGTH_CAP: usize = 0xFFF;

const ASSUME_VALID_BIT: u16 = 0x8000;
const STAGE_SHIFT: u16 = 12;
const STAGE_MASK: u16 = 0b11;

/// One staged file: path, content id, stat metadata and flag bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path relative to the worktree root.
    pub name: PathBuf,
    /// SHA-1 of the staged content.
    pub oid: ObjectId,
    pub metadata: EntryMetadata,
    pub assume_valid: bool,
    /// 2-bit merge stage.
    pub stage: u8,
}

/// Stat metadata enabling change detection without re-reading content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub ctime: i64,
    pub ctime_nsec: i64,
    pub mtime: i64,
    pub mtime_nsec: i64,
    pub dev: u64,
    pub ino: u64,
    pub mode: EntryMode,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
}

impl IndexEntry {
    pub fn new(name: PathBuf, oid: ObjectId, metadata: EntryMetadata) -> Self {
        IndexEntry {
            name,
            oid,
            metadata,
            assume_valid: false,
            stage: 0,
        }
    }

    pub fn basename(&self) -> anyhow::Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("invalid entry name {:?}", self.name))
    }

    /// Parse one entry starting at `pos`, which must be relative to the
    /// start of the entries section. Returns the entry and the offset of
    /// the next entry (past the padding).
    pub fn parse_at(buf: &[u8], pos: usize) -> anyhow::Result<(Self, usize)> {
        if buf.len() < pos + ENTRY_FIXED_SIZE {
            return Err(Error::Format("truncated index entry".into()).into());
        }
        let fixed = &buf[pos..pos + ENTRY_FIXED_SIZE];

        let ctime = NetworkEndian::read_u32(&fixed[0..4]) as i64;
        let ctime_nsec = NetworkEndian::read_u32(&fixed[4..8]) as i64;
        let mtime = NetworkEndian::read_u32(&fixed[8..12]) as i64;
        let mtime_nsec = NetworkEndian::read_u32(&fixed[12..16]) as i64;
        let dev = NetworkEndian::read_u32(&fixed[16..20]) as u64;
        let ino = NetworkEndian::read_u32(&fixed[20..24]) as u64;
        // fixed[24..26] is unused
        let mode = EntryMode::from_packed(NetworkEndian::read_u16(&fixed[26..28]))?;
        let uid = NetworkEndian::read_u32(&fixed[28..32]);
        let gid = NetworkEndian::read_u32(&fixed[32..36]);
        let size = NetworkEndian::read_u32(&fixed[36..40]) as u64;
        let oid = ObjectId::from_raw(&fixed[40..60])?;

        let flags = NetworkEndian::read_u16(&fixed[60..62]);
        let assume_valid = flags & ASSUME_VALID_BIT != 0;
        let stage = ((flags >> STAGE_SHIFT) & STAGE_MASK) as u8;
        let name_len = (flags & NAME_LENGTH_CAP as u16) as usize;

        let name_start = pos + ENTRY_FIXED_SIZE;
        let (name_bytes, after_nul) = if name_len < NAME_LENGTH_CAP {
            let boundary = name_start + name_len;
            if boundary >= buf.len() {
                return Err(Error::Format("truncated index entry name".into()).into());
            }
            if buf[boundary] != 0 {
                return Err(
                    Error::Format("missing NUL at declared entry name boundary".into()).into(),
                );
            }
            (&buf[name_start..boundary], boundary + 1)
        } else {
            // Overflow escape: the field is saturated, keep scanning past
            // the cap for the real terminator.
            let scan_from = name_start + NAME_LENGTH_CAP;
            if scan_from > buf.len() {
                return Err(Error::Format("truncated index entry name".into()).into());
            }
            let nul = buf[scan_from..]
                .iter()
                .position(|&b| b == 0)
                .map(|i| scan_from + i)
                .ok_or_else(|| Error::Format("unterminated index entry name".into()))?;
            (&buf[name_start..nul], nul + 1)
        };

        let name = PathBuf::from(
            std::str::from_utf8(name_bytes)
                .map_err(|_| Error::Format("invalid UTF-8 in entry name".into()))?,
        );

        // Skip padding so the next entry starts on an 8-byte boundary.
        let next = after_nul.div_ceil(8) * 8;
        if next > buf.len() {
            return Err(Error::Format("truncated index entry padding".into()).into());
        }

        let entry = IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
            },
            assume_valid,
            stage,
        };

        Ok((entry, next))
    }

    /// Append the encoded entry to `out`, which must hold the entries
    /// section only, so that `out.len()` is the section-relative offset.
    pub fn write_to(&self, out: &mut Vec<u8>) -> anyhow::Result<()> {
        let name = self
            .name
            .to_str()
            .ok_or_else(|| Error::Format(format!("invalid entry name {:?}", self.name)))?;

        out.write_u32::<NetworkEndian>(self.metadata.ctime as u32)?;
        out.write_u32::<NetworkEndian>(self.metadata.ctime_nsec as u32)?;
        out.write_u32::<NetworkEndian>(self.metadata.mtime as u32)?;
        out.write_u32::<NetworkEndian>(self.metadata.mtime_nsec as u32)?;
        out.write_u32::<NetworkEndian>(self.metadata.dev as u32)?;
        out.write_u32::<NetworkEndian>(self.metadata.ino as u32)?;
        out.write_u16::<NetworkEndian>(0)?; // unused
        out.write_u16::<NetworkEndian>(self.metadata.mode.packed())?;
        out.write_u32::<NetworkEndian>(self.metadata.uid)?;
        out.write_u32::<NetworkEndian>(self.metadata.gid)?;
        out.write_u32::<NetworkEndian>(self.metadata.size as u32)?;
        self.oid.write_raw_to(out)?;

        let mut flags = name.len().min(NAME_LENGTH_CAP) as u16;
        flags |= (self.stage as u16 & STAGE_MASK) << STAGE_SHIFT;
        if self.assume_valid {
            flags |= ASSUME_VALID_BIT;
        }
        out.write_u16::<NetworkEndian>(flags)?;

        out.extend_from_slice(name.as_bytes());
        out.push(0);
        while out.len() % 8 != 0 {
            out.push(0);
        }

        Ok(())
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        let mode = if metadata.file_type().is_symlink() {
            EntryMode::SYMLINK
        } else if file_path.is_executable() {
            EntryMode::EXECUTABLE
        } else {
            EntryMode::REGULAR
        };

        Ok(Self {
            ctime: metadata.ctime(),
            ctime_nsec: metadata.ctime_nsec(),
            mtime: metadata.mtime(),
            mtime_nsec: metadata.mtime_nsec(),
            dev: metadata.dev(),
            ino: metadata.ino(),
            mode,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::EntryMode;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    fn sample_oid() -> ObjectId {
        ObjectId::try_parse("45b983be36b73c0788dc9cbcb76cbb80fc7bb057".to_string()).unwrap()
    }

    #[fixture]
    fn entry() -> IndexEntry {
        IndexEntry {
            name: PathBuf::from("src/lib.rs"),
            oid: sample_oid(),
            metadata: EntryMetadata {
                ctime: 1_700_000_000,
                ctime_nsec: 12,
                mtime: 1_700_000_100,
                mtime_nsec: 34,
                dev: 66309,
                ino: 8_675_309,
                mode: EntryMode::REGULAR,
                uid: 1000,
                gid: 1000,
                size: 137,
            },
            assume_valid: false,
            stage: 0,
        }
    }

    #[rstest]
    fn encode_then_parse_is_identity(entry: IndexEntry) {
        let mut buf = Vec::new();
        entry.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() % 8, 0);

        let (parsed, next) = IndexEntry::parse_at(&buf, 0).unwrap();
        pretty_assertions::assert_eq!(parsed, entry);
        assert_eq!(next, buf.len());
    }

    #[rstest]
    fn flag_bits_survive_the_round_trip(mut entry: IndexEntry) {
        entry.assume_valid = true;
        entry.stage = 2;

        let mut buf = Vec::new();
        entry.write_to(&mut buf).unwrap();
        let (parsed, _) = IndexEntry::parse_at(&buf, 0).unwrap();

        assert!(parsed.assume_valid);
        assert_eq!(parsed.stage, 2);
    }

    #[rstest]
    #[case(NAME_LENGTH_CAP)]
    #[case(NAME_LENGTH_CAP + 40)]
    fn saturated_name_length_uses_the_overflow_escape(#[case] len: usize, entry: IndexEntry) {
        let mut long = entry;
        long.name = PathBuf::from("a".repeat(len));

        let mut buf = Vec::new();
        long.write_to(&mut buf).unwrap();

        let (parsed, next) = IndexEntry::parse_at(&buf, 0).unwrap();
        pretty_assertions::assert_eq!(parsed.name, long.name);
        assert_eq!(next, buf.len());
    }

    #[rstest]
    fn missing_nul_at_name_boundary_is_a_format_error(entry: IndexEntry) {
        let mut buf = Vec::new();
        entry.write_to(&mut buf).unwrap();

        // Corrupt the byte at the declared boundary.
        let boundary = ENTRY_FIXED_SIZE + entry.name.as_os_str().len();
        buf[boundary] = b'x';

        let err = IndexEntry::parse_at(&buf, 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Format(message)) if message.contains("NUL")
        ));
    }

    prop_compose! {
        fn arb_metadata()(
            ctime in 0u32..=u32::MAX,
            ctime_nsec in 0u32..1_000_000_000,
            mtime in 0u32..=u32::MAX,
            mtime_nsec in 0u32..1_000_000_000,
            dev in 0u32..=u32::MAX,
            ino in 0u32..=u32::MAX,
            uid in 0u32..=u32::MAX,
            gid in 0u32..=u32::MAX,
            size in 0u32..=u32::MAX,
            mode in prop_oneof![
                Just(EntryMode::REGULAR),
                Just(EntryMode::EXECUTABLE),
                Just(EntryMode::SYMLINK),
            ],
        ) -> EntryMetadata {
            EntryMetadata {
                ctime: ctime as i64,
                ctime_nsec: ctime_nsec as i64,
                mtime: mtime as i64,
                mtime_nsec: mtime_nsec as i64,
                dev: dev as u64,
                ino: ino as u64,
                mode,
                uid,
                gid,
                size: size as u64,
            }
        }
    }

    prop_compose! {
        fn arb_entry()(
            metadata in arb_metadata(),
            name in "[a-z][a-z0-9_/]{0,40}[a-z]",
            assume_valid in any::<bool>(),
            stage in 0u8..4,
        ) -> IndexEntry {
            IndexEntry {
                name: PathBuf::from(name),
                oid: sample_oid(),
                metadata,
                assume_valid,
                stage,
            }
        }
    }

    proptest! {
        #[test]
        fn any_entry_round_trips(entry in arb_entry()) {
            let mut buf = Vec::new();
            entry.write_to(&mut buf).unwrap();

            let (parsed, next) = IndexEntry::parse_at(&buf, 0).unwrap();
            prop_assert_eq!(parsed, entry);
            prop_assert_eq!(next, buf.len());
        }

        #[test]
        fn entries_at_the_length_cap_round_trip(extra in 0usize..80) {
            let mut entry = IndexEntry::new(
                PathBuf::from("b".repeat(NAME_LENGTH_CAP - 2 + extra)),
                sample_oid(),
                EntryMetadata::default(),
            );
            entry.metadata.mode = EntryMode::REGULAR;

            let mut buf = Vec::new();
            entry.write_to(&mut buf).unwrap();

            let (parsed, next) = IndexEntry::parse_at(&buf, 0).unwrap();
            prop_assert_eq!(parsed.name, entry.name);
            prop_assert_eq!(next, buf.len());
        }
    }
}
