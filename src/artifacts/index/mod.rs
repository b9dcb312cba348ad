pub mod entry_mode;
pub mod index_entry;

/// Magic signature at the start of the index file.
pub const SIGNATURE: &[u8; 4] = b"DIRC";

/// The only supported index format version.
pub const VERSION: u32 = 2;

/// Size of the index header: signature, version, entry count.
pub const HEADER_SIZE: usize = 12;
