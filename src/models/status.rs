use crate::models::mount::{DiskUsage, MountPoint};
use serde::Serialize;

/// Visual treatment the indicator applies to a usage value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Treatment {
    Normal,
    Warning,
}

impl Treatment {
    /// `usage == threshold` already counts as warning.
    pub fn classify(usage_pct: u32, warn_pct: u32) -> Self {
        if usage_pct >= warn_pct { Treatment::Warning } else { Treatment::Normal }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub usage:     DiskUsage,
    pub percent:   u32,
    pub treatment: Treatment,
}

/// One step of a resolution pass as seen by the indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum StatusEvent {
    Refreshing,
    StopRefreshing,
    /// No mount could be resolved; carries no mount info.
    Warning,
    Locked(MountPoint),
    Unlocked(MountPoint),
    Usage(UsageReport),
}

impl StatusEvent {
    pub fn label(&self) -> &'static str {
        match self {
            StatusEvent::Refreshing     => "REFRESHING",
            StatusEvent::StopRefreshing => "STOP_REFRESHING",
            StatusEvent::Warning        => "WARNING",
            StatusEvent::Locked(_)      => "LOCKED",
            StatusEvent::Unlocked(_)    => "UNLOCKED",
            StatusEvent::Usage(_)       => "USAGE",
        }
    }

    #[allow(dead_code)]
    pub fn mount(&self) -> Option<&MountPoint> {
        match self {
            StatusEvent::Locked(mp) | StatusEvent::Unlocked(mp) => Some(mp),
            _ => None,
        }
    }
}

/// A status event tagged with the indicator target it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusNotice {
    pub target: String,
    #[serde(flatten)]
    pub event:  StatusEvent,
}
