use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A path the platform is known to report under the root mount by mistake,
/// and the path to resolve in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountQuirk {
    pub path:     PathBuf,
    pub redirect: PathBuf,
}

/// Ordered path overrides applied when a lookup lands on `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuirkTable {
    entries: Vec<MountQuirk>,
}

impl QuirkTable {
    pub fn new(entries: Vec<MountQuirk>) -> Self {
        Self { entries }
    }

    /// Emulated storage on some Android builds reports `/` instead of the
    /// data partition that actually backs it.
    pub fn defaults() -> Vec<MountQuirk> {
        vec![MountQuirk {
            path:     PathBuf::from("/storage/emulated/0"),
            redirect: PathBuf::from("/data/media"),
        }]
    }

    /// Matched against the caller's path as given, before symlinks are resolved.
    pub fn redirect_for(&self, path: &Path) -> Option<&Path> {
        self.entries.iter()
            .find(|q| q.path == path)
            .map(|q| q.redirect.as_path())
    }

    pub fn entries(&self) -> &[MountQuirk] {
        &self.entries
    }
}

impl Default for QuirkTable {
    fn default() -> Self {
        Self::new(Self::defaults())
    }
}
