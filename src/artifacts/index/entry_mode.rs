//! Index entry mode: a 4-bit object type packed with 12 permission bits.
//!
//! Only the low 9 permission bits are meaningful; bits 9-11 must be zero
//! in a well-formed index. The same mode renders as the 6-character octal
//! string used by tree leaves (`"100644"`, `"120000"`, ...).

use crate::error::Error;

/// 4-bit type code of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryKind {
    #[default]
    Regular,
    Symlink,
    Gitlink,
}

impl EntryKind {
    pub fn type_bits(self) -> u16 {
        match self {
            EntryKind::Regular => 0b1000,
            EntryKind::Symlink => 0b1010,
            EntryKind::Gitlink => 0b1110,
        }
    }

    pub fn from_type_bits(bits: u16) -> anyhow::Result<Self> {
        match bits {
            0b1000 => Ok(EntryKind::Regular),
            0b1010 => Ok(EntryKind::Symlink),
            0b1110 => Ok(EntryKind::Gitlink),
            _ => Err(Error::Format(format!("invalid entry type bits {bits:#06b}")).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMode {
    pub kind: EntryKind,
    /// 9-bit permission field.
    pub perms: u16,
}

impl EntryMode {
    pub const REGULAR: EntryMode = EntryMode {
        kind: EntryKind::Regular,
        perms: 0o644,
    };

    pub const EXECUTABLE: EntryMode = EntryMode {
        kind: EntryKind::Regular,
        perms: 0o755,
    };

    pub const SYMLINK: EntryMode = EntryMode {
        kind: EntryKind::Symlink,
        perms: 0,
    };

    /// Unpack from the 16-bit on-disk form: `type << 12 | permissions`.
    pub fn from_packed(packed: u16) -> anyhow::Result<Self> {
        let kind = EntryKind::from_type_bits(packed >> 12)?;
        let low = packed & 0x0FFF;
        if low & !0o777 != 0 {
            return Err(Error::Format(format!(
                "non-zero bits above permissions in mode {packed:#06o}"
            ))
            .into());
        }

        Ok(EntryMode {
            kind,
            perms: low & 0o777,
        })
    }

    pub fn packed(&self) -> u16 {
        self.kind.type_bits() << 12 | (self.perms & 0o777)
    }

    /// Tree-leaf rendering: 2-digit octal type followed by 4-digit octal
    /// permissions, e.g. `100644`.
    pub fn tree_mode(&self) -> String {
        format!("{:02o}{:04o}", self.kind.type_bits(), self.perms & 0o777)
    }
}
