use crate::bus::StatusSink;
use crate::cancel::CancelToken;
use crate::models::mount::{usage_percent, DiskUsage, MountPoint};
use crate::models::status::{StatusEvent, Treatment, UsageReport};
use crate::probe::StorageProbe;
use crate::quirks::QuirkTable;
use std::path::Path;

/// How a pass ended. Informational only; every failure has already been
/// translated into a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(Treatment),
    /// No mount was found and `Warning` was published.
    Unmounted,
    Cancelled,
}

/// Resolves a directory to its mount, lock state and usage, one pass at a time.
pub struct Resolver<'a> {
    probe:  &'a dyn StorageProbe,
    quirks: &'a QuirkTable,
}

impl<'a> Resolver<'a> {
    pub fn new(probe: &'a dyn StorageProbe, quirks: &'a QuirkTable) -> Self {
        Self { probe, quirks }
    }

    /// Run one pass for `dir`, publishing to `sink`.
    ///
    /// The token is polled before the lookup, before the mount check,
    /// before the lock event and before the usage event. Once it is set
    /// nothing further is published.
    pub fn resolve(&self, dir: &Path, warn_pct: u32, cancel: &CancelToken, sink: &dyn StatusSink) -> Outcome {
        if cancel.is_cancelled() { return cancelled(dir, "lookup"); }
        let mount = self.lookup(dir);

        if cancel.is_cancelled() { return cancelled(dir, "mount check"); }
        let Some(mp) = mount else {
            tracing::debug!("no mount for {}", dir.display());
            sink.publish(StatusEvent::Warning);
            return Outcome::Unmounted;
        };

        if cancel.is_cancelled() { return cancelled(dir, "lock state"); }
        let lock_event = if self.probe.is_read_only(&mp) {
            StatusEvent::Locked(mp.clone())
        } else {
            StatusEvent::Unlocked(mp.clone())
        };
        // A superseded pass must not publish over its successor
        if cancel.is_cancelled() { return cancelled(dir, "lock event"); }
        sink.publish(lock_event);

        let usage = self.usage(&mp);

        if cancel.is_cancelled() { return cancelled(dir, "usage"); }
        let percent   = usage_percent(Some(&usage));
        let treatment = Treatment::classify(percent, warn_pct);
        sink.publish(StatusEvent::Usage(UsageReport { usage, percent, treatment }));
        Outcome::Completed(treatment)
    }

    /// Lookup with the quirk table applied at most once.
    fn lookup(&self, dir: &Path) -> Option<MountPoint> {
        let found = self.probe.mount_point_for(dir);
        match (&found, self.quirks.redirect_for(dir)) {
            (Some(mp), Some(redirect)) if mp.is_root() => {
                tracing::debug!("{} reported on /, resolving {} instead", dir.display(), redirect.display());
                self.probe.mount_point_for(redirect)
            }
            _ => found,
        }
    }

    fn usage(&self, mp: &MountPoint) -> DiskUsage {
        match self.probe.disk_usage(mp) {
            Ok(u)  => u,
            Err(e) => {
                tracing::warn!("disk usage unavailable, reporting zero: {}", e);
                DiskUsage::zeroed(&mp.mount)
            }
        }
    }
}

fn cancelled(dir: &Path, step: &str) -> Outcome {
    tracing::debug!("pass for {} cancelled before {}", dir.display(), step);
    Outcome::Cancelled
}
