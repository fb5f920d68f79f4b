use crate::models::mount::MountPoint;
use crate::models::status::{StatusEvent, StatusNotice, Treatment, UsageReport};
use crate::ui::theme::Theme;
use crate::util::human::{fmt_bytes, fmt_pct};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

/// What one indicator target currently shows, folded from its events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorState {
    pub path:       String,
    pub refreshing: bool,
    /// A pass has published its final event.
    pub finished:   bool,
    /// The pass did not finish before the deadline.
    pub stalled:    bool,
    pub unmounted:  bool,
    pub locked:     Option<bool>,
    pub mount:      Option<MountPoint>,
    pub usage:      Option<UsageReport>,
}

impl IndicatorState {
    pub fn new(path: &str) -> Self {
        Self { path: path.to_string(), ..Default::default() }
    }

    pub fn apply(&mut self, event: &StatusEvent) {
        match event {
            StatusEvent::Refreshing => {
                self.refreshing = true;
                self.finished   = false;
                self.stalled    = false;
            }
            StatusEvent::StopRefreshing => {
                self.refreshing = false;
                self.finished   = true;
            }
            StatusEvent::Warning => {
                self.unmounted = true;
                self.locked    = None;
                self.mount     = None;
                self.usage     = None;
            }
            StatusEvent::Locked(mp) | StatusEvent::Unlocked(mp) => {
                self.unmounted = false;
                self.locked    = Some(matches!(event, StatusEvent::Locked(_)));
                self.mount     = Some(mp.clone());
            }
            StatusEvent::Usage(report) => {
                self.usage = Some(report.clone());
            }
        }
    }

    pub fn mark_stalled(&mut self) {
        self.refreshing = false;
        self.stalled    = true;
    }

    /// Healthy means mounted, finished and under the warning threshold.
    pub fn needs_attention(&self) -> bool {
        if self.stalled || self.unmounted || !self.finished { return true; }
        matches!(&self.usage, Some(u) if u.treatment == Treatment::Warning)
    }

    pub fn render(&self, theme: &Theme) -> String {
        if self.stalled {
            return format!("{} {}", theme.warning.apply("[ STALLED ]"), theme.text.apply(&self.path));
        }
        if self.unmounted {
            return format!("{} {}", theme.warning.apply("[ NO MOUNT ]"), theme.text.apply(&self.path));
        }
        let Some(mp) = &self.mount else {
            return format!("{} {}", theme.text_dim.apply("[ ... ]"), theme.text.apply(&self.path));
        };

        let lock = match self.locked {
            Some(true) => theme.locked.apply("[ RO ]"),
            _          => theme.unlocked.apply("[ RW ]"),
        };
        let mut line = format!(
            "{} {}  {}",
            lock,
            theme.text.apply(&self.path),
            theme.text_dim.apply(format!("on {} ({}, {})", mp.mount, mp.fs_type, mp.short_device())),
        );
        if self.refreshing {
            line.push_str(&format!(" {}", theme.text_dim.apply("…")));
        }
        if let Some(u) = &self.usage {
            let style = match u.treatment {
                Treatment::Warning => theme.warning,
                Treatment::Normal  => theme.normal,
            };
            line.push_str(&format!(
                " {} {}",
                style.apply(format!("{:>4}", fmt_pct(u.percent))),
                theme.text_dim.apply(format!("{} / {}", fmt_bytes(u.usage.used_bytes), fmt_bytes(u.usage.total_bytes))),
            ));
        }
        line
    }

    pub fn to_json(&self) -> Value {
        let status = if self.stalled { "stalled" }
            else if self.unmounted { "no_mount" }
            else if self.locked == Some(true) { "locked" }
            else if self.locked == Some(false) { "unlocked" }
            else { "unknown" };
        json!({
            "path":      self.path,
            "status":    status,
            "mount":     self.mount,
            "usage":     self.usage.as_ref().map(|u| &u.usage),
            "use_pct":   self.usage.as_ref().map(|u| u.percent),
            "treatment": self.usage.as_ref().map(|u| u.treatment),
        })
    }
}

/// Apply notices to `states` until every target has finished or `deadline`
/// passes. Targets still unfinished at the deadline are marked stalled.
/// Returns true when every target finished in time.
pub fn fold_until(
    rx: &Receiver<StatusNotice>,
    states: &mut BTreeMap<String, IndicatorState>,
    deadline: Instant,
) -> bool {
    while !states.values().all(|st| st.finished) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(notice) => {
                if let Some(st) = states.get_mut(&notice.target) {
                    st.apply(&notice.event);
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                for st in states.values_mut().filter(|st| !st.finished) {
                    st.mark_stalled();
                }
                return false;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    states.values().all(|st| st.finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, StatusSink};
    use crate::models::mount::DiskUsage;
    use std::time::Duration;

    fn report(pct: u32, treatment: Treatment) -> UsageReport {
        UsageReport { usage: DiskUsage::new("/data", pct as u64, 100), percent: pct, treatment }
    }

    #[test]
    fn folds_a_full_pass() {
        let mp = MountPoint::new("/dev/sdb1", "/data", "ext4", "ro");
        let mut s = IndicatorState::new("/data/x");
        s.apply(&StatusEvent::Refreshing);
        assert!(s.refreshing);
        s.apply(&StatusEvent::Locked(mp.clone()));
        s.apply(&StatusEvent::Usage(report(40, Treatment::Normal)));
        s.apply(&StatusEvent::StopRefreshing);

        assert!(s.finished && !s.refreshing);
        assert_eq!(s.locked, Some(true));
        assert_eq!(s.mount, Some(mp));
        assert!(!s.needs_attention());
    }

    #[test]
    fn warning_clears_previous_mount_info() {
        let mut s = IndicatorState::new("/gone");
        s.apply(&StatusEvent::Unlocked(MountPoint::new("/dev/sdb1", "/gone", "ext4", "rw")));
        s.apply(&StatusEvent::Warning);
        s.apply(&StatusEvent::StopRefreshing);
        assert!(s.unmounted);
        assert!(s.mount.is_none());
        assert!(s.needs_attention());
        assert_eq!(s.to_json()["status"], "no_mount");
    }

    #[test]
    fn warning_treatment_needs_attention() {
        let mut s = IndicatorState::new("/data");
        s.apply(&StatusEvent::Unlocked(MountPoint::new("/dev/sdb1", "/data", "ext4", "rw")));
        s.apply(&StatusEvent::Usage(report(95, Treatment::Warning)));
        s.apply(&StatusEvent::StopRefreshing);
        assert!(s.needs_attention());
        assert_eq!(s.to_json()["treatment"], "warning");
        assert_eq!(s.to_json()["use_pct"], 95);
    }

    #[test]
    fn plain_render_shows_mount_and_usage() {
        let mut s = IndicatorState::new("/data/x");
        s.apply(&StatusEvent::Unlocked(MountPoint::new("/dev/sdb1", "/data", "ext4", "rw")));
        s.apply(&StatusEvent::Usage(report(42, Treatment::Normal)));
        s.apply(&StatusEvent::StopRefreshing);
        assert_eq!(s.render(&Theme::plain()), "[ RW ] /data/x  on /data (ext4, sdb1)  42% 42 B / 100 B");
    }

    #[test]
    fn render_without_usage_has_no_trailing_space() {
        let mut s = IndicatorState::new("/data/x");
        s.apply(&StatusEvent::Unlocked(MountPoint::new("/dev/sdb1", "/data", "ext4", "rw")));
        s.apply(&StatusEvent::StopRefreshing);
        assert_eq!(s.render(&Theme::plain()), "[ RW ] /data/x  on /data (ext4, sdb1)");
    }

    #[test]
    fn refreshing_render_marks_the_pass_in_progress() {
        let mut s = IndicatorState::new("/data/x");
        s.apply(&StatusEvent::Refreshing);
        s.apply(&StatusEvent::Locked(MountPoint::new("/dev/sdb1", "/data", "ext4", "ro")));
        assert_eq!(s.render(&Theme::plain()), "[ RO ] /data/x  on /data (ext4, sdb1) …");
    }

    #[test]
    fn stalled_render() {
        let mut s = IndicatorState::new("/nfs");
        s.apply(&StatusEvent::Refreshing);
        s.mark_stalled();
        assert_eq!(s.render(&Theme::plain()), "[ STALLED ] /nfs");
        assert!(s.needs_attention());
    }

    fn targets(names: &[&str]) -> BTreeMap<String, IndicatorState> {
        names.iter().map(|n| (n.to_string(), IndicatorState::new(n))).collect()
    }

    #[test]
    fn fold_until_collects_every_finished_target() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        for target in ["/a", "/b"] {
            let sink = bus.sink_for(target);
            sink.publish(StatusEvent::Refreshing);
            sink.publish(StatusEvent::Unlocked(MountPoint::new("/dev/sda1", "/", "ext4", "rw")));
            sink.publish(StatusEvent::Usage(report(10, Treatment::Normal)));
            sink.publish(StatusEvent::StopRefreshing);
        }
        bus.publish(StatusNotice { target: "/elsewhere".into(), event: StatusEvent::Warning });

        let mut states = targets(&["/a", "/b"]);
        assert!(fold_until(&rx, &mut states, Instant::now() + Duration::from_secs(5)));
        assert!(states.values().all(|st| !st.needs_attention()));
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn fold_until_marks_unfinished_targets_stalled() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let done = bus.sink_for("/done");
        done.publish(StatusEvent::Refreshing);
        done.publish(StatusEvent::Unlocked(MountPoint::new("/dev/sda1", "/", "ext4", "rw")));
        done.publish(StatusEvent::Usage(report(10, Treatment::Normal)));
        done.publish(StatusEvent::StopRefreshing);
        bus.sink_for("/hung").publish(StatusEvent::Refreshing);

        let mut states = targets(&["/done", "/hung"]);
        assert!(!fold_until(&rx, &mut states, Instant::now() + Duration::from_millis(50)));
        assert!(!states["/done"].needs_attention());
        assert!(states["/hung"].stalled);
        assert!(states["/hung"].needs_attention());
        assert_eq!(states["/hung"].render(&Theme::plain()), "[ STALLED ] /hung");
    }
}
