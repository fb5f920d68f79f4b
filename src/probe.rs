use crate::collectors::disk_usage::{self, UsageError};
use crate::collectors::mounts;
use crate::models::mount::{DiskUsage, MountPoint};
use std::path::Path;

/// The storage queries a resolution pass depends on.
pub trait StorageProbe: Send + Sync {
    /// Owning mount of `path`, or `None` when it cannot be determined.
    fn mount_point_for(&self, path: &Path) -> Option<MountPoint>;

    fn is_read_only(&self, mp: &MountPoint) -> bool {
        mp.is_read_only()
    }

    fn disk_usage(&self, mp: &MountPoint) -> Result<DiskUsage, UsageError>;
}

/// Reads `/proc/mounts` fresh on every lookup and asks `statvfs` for usage.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxProbe;

impl StorageProbe for LinuxProbe {
    fn mount_point_for(&self, path: &Path) -> Option<MountPoint> {
        let table = match mounts::read_mounts() {
            Ok(t)  => t,
            Err(e) => {
                tracing::warn!("cannot read mount table: {:#}", e);
                return None;
            }
        };
        mounts::mount_for_path(&table, &mounts::normalize(path)).cloned()
    }

    fn disk_usage(&self, mp: &MountPoint) -> Result<DiskUsage, UsageError> {
        disk_usage::statvfs_usage(mp)
    }
}
