pub mod mount;
pub mod status;
