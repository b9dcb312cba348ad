pub mod blob;
pub mod commit;
pub mod kvlm;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tag;
pub mod tree;

/// Length of a hex-encoded object identifier.
pub const OBJECT_ID_LENGTH: usize = 40;
