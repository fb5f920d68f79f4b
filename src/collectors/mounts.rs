use crate::models::mount::MountPoint;
use anyhow::Result;
use std::path::{Path, PathBuf};

const MOUNTS_FILE: &str = "/proc/mounts";

pub fn read_mounts() -> Result<Vec<MountPoint>> {
    let content = std::fs::read_to_string(MOUNTS_FILE)?;
    Ok(parse_mounts(&content))
}

/// Parse `/proc/mounts` text: `device mount fstype options dump pass`.
/// Lines with fewer than four fields are skipped.
pub fn parse_mounts(content: &str) -> Vec<MountPoint> {
    let mut v = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 { continue; }
        v.push(MountPoint::new(
            &unescape(fields[0]),
            &unescape(fields[1]),
            fields[2],
            fields[3],
        ));
    }
    v
}

/// The kernel writes space, tab, newline and backslash as `\ooo`.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b)) {
            if let Ok(n) = u8::from_str_radix(&value[i + 1..i + 4], 8) {
                out.push(n);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Find the mount owning `path`: the entry whose mount path is the longest
/// component-wise prefix. Later entries shadow earlier ones at the same path.
pub fn mount_for_path<'a>(mounts: &'a [MountPoint], path: &Path) -> Option<&'a MountPoint> {
    if !path.is_absolute() { return None; }
    let mut best: Option<&MountPoint> = None;
    for mp in mounts {
        let mount = Path::new(&mp.mount);
        if !path.starts_with(mount) { continue; }
        let deeper = match best {
            Some(b) => mount.components().count() >= Path::new(&b.mount).components().count(),
            None    => true,
        };
        if deeper { best = Some(mp); }
    }
    best
}

/// Resolve symlinks when the path exists; otherwise use it as given.
pub fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
