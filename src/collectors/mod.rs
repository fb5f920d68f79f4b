pub mod disk_usage;
pub mod mounts;
