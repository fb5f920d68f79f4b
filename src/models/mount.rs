use serde::Serialize;
use std::path::Path;

/// One entry of the mount table. Re-read on every resolution, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub device:  String,
    pub mount:   String,
    pub fs_type: String,
    pub options: Vec<String>,
}

impl MountPoint {
    pub fn new(device: &str, mount: &str, fs_type: &str, options: &str) -> Self {
        Self {
            device:  device.to_string(),
            mount:   mount.to_string(),
            fs_type: fs_type.to_string(),
            options: options.split(',').filter(|o| !o.is_empty()).map(str::to_string).collect(),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.options.iter().any(|o| o == "ro")
    }

    pub fn is_root(&self) -> bool {
        Path::new(&self.mount) == Path::new("/")
    }

    /// Returns the short device name ("sda1" from "/dev/sda1").
    pub fn short_device(&self) -> &str {
        self.device.trim_start_matches("/dev/").trim_start_matches("mapper/")
    }
}

/// Capacity snapshot of a mount. `free` is always `total - used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub mount:       String,
    pub used_bytes:  u64,
    pub total_bytes: u64,
    pub free_bytes:  u64,
}

impl DiskUsage {
    pub fn new(mount: &str, used_bytes: u64, total_bytes: u64) -> Self {
        let used_bytes = used_bytes.min(total_bytes);
        Self {
            mount: mount.to_string(),
            used_bytes,
            total_bytes,
            free_bytes: total_bytes - used_bytes,
        }
    }

    /// Placeholder substituted when the usage query fails.
    pub fn zeroed(mount: &str) -> Self {
        Self::new(mount, 0, 0)
    }
}

/// Usage percentage as shown by the indicator.
///
/// A missing snapshot reads as 0%. A snapshot with zero capacity reads as
/// 100% so an unknown or failed mount is flagged rather than hidden.
pub fn usage_percent(usage: Option<&DiskUsage>) -> u32 {
    match usage {
        None => 0,
        Some(u) if u.total_bytes == 0 => 100,
        Some(u) => {
            let pct = u.used_bytes as u128 * 100 / u.total_bytes as u128;
            pct.min(u32::MAX as u128) as u32
        }
    }
}
