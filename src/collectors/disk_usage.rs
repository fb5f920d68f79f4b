use crate::models::mount::{DiskUsage, MountPoint};
use nix::errno::Errno;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("I/O error querying {mount}: {source}")]
    Io {
        mount:  String,
        #[source]
        source: io::Error,
    },

    #[error("usage query not supported on {mount} ({fs_type})")]
    Unsupported { mount: String, fs_type: String },
}

/// Query `statvfs(3)` for the mount. Used space counts blocks reserved for
/// root, matching what `df` shows as used.
pub fn statvfs_usage(mp: &MountPoint) -> Result<DiskUsage, UsageError> {
    use nix::sys::statvfs::statvfs;
    let stat = match statvfs(mp.mount.as_str()) {
        Ok(s) => s,
        Err(Errno::ENOSYS) | Err(Errno::EOPNOTSUPP) => {
            return Err(UsageError::Unsupported {
                mount:   mp.mount.clone(),
                fs_type: mp.fs_type.clone(),
            });
        }
        Err(e) => {
            return Err(UsageError::Io {
                mount:  mp.mount.clone(),
                source: io::Error::from(e),
            });
        }
    };

    let frsize      = stat.fragment_size() as u64;
    let total_bytes = (stat.blocks() as u64).saturating_mul(frsize);
    let free_bytes  = (stat.blocks_free() as u64).saturating_mul(frsize);
    let used_bytes  = total_bytes.saturating_sub(free_bytes);

    Ok(DiskUsage::new(&mp.mount, used_bytes, total_bytes))
}
