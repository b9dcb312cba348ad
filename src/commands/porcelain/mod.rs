pub mod add;
pub mod branch;
pub mod commit;
pub mod log;
pub mod ls_files;
