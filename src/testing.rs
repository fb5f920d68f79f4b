//! In-memory collaborators for unit tests.

use crate::bus::StatusSink;
use crate::collectors::disk_usage::UsageError;
use crate::collectors::mounts;
use crate::models::mount::{DiskUsage, MountPoint};
use crate::models::status::StatusEvent;
use crate::probe::StorageProbe;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};

type Hook = Box<dyn Fn() + Send + Sync>;
type ErrorFactory = Box<dyn Fn() -> UsageError + Send + Sync>;

/// A mount table and usage map held in memory. Mounts without a configured
/// usage answer with an I/O error.
pub struct FakeProbe {
    mounts:        Vec<MountPoint>,
    usage:         HashMap<String, (u64, u64)>,
    usage_errors:  HashMap<String, ErrorFactory>,
    lookup_filter: Option<Box<dyn Fn(&Path) -> bool + Send + Sync>>,
    on_lookup:     Option<Hook>,
    on_usage:      Option<Hook>,
    on_read_only:  Option<Hook>,
    gate:          Option<Mutex<mpsc::Receiver<()>>>,
    lookups:       Mutex<Vec<String>>,
    usage_calls:   AtomicUsize,
}

impl FakeProbe {
    pub fn new(table: &[(&str, &str, &str, &str)]) -> Self {
        Self {
            mounts: table.iter().map(|(d, m, t, o)| MountPoint::new(d, m, t, o)).collect(),
            usage:         HashMap::new(),
            usage_errors:  HashMap::new(),
            lookup_filter: None,
            on_lookup:     None,
            on_usage:      None,
            on_read_only:  None,
            gate:          None,
            lookups:       Mutex::new(Vec::new()),
            usage_calls:   AtomicUsize::new(0),
        }
    }

    pub fn with_usage(mut self, mount: &str, used: u64, total: u64) -> Self {
        self.usage.insert(mount.to_string(), (used, total));
        self
    }

    pub fn with_usage_error(mut self, mount: &str, f: impl Fn() -> UsageError + Send + Sync + 'static) -> Self {
        self.usage_errors.insert(mount.to_string(), Box::new(f));
        self
    }

    /// Paths for which `f` returns false resolve to nothing.
    pub fn with_lookup_filter(mut self, f: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.lookup_filter = Some(Box::new(f));
        self
    }

    pub fn on_lookup(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_lookup = Some(Box::new(f));
        self
    }

    pub fn on_usage(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_usage = Some(Box::new(f));
        self
    }

    pub fn on_read_only(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_read_only = Some(Box::new(f));
        self
    }

    /// Every lookup blocks until a `()` arrives on the returned sender.
    pub fn gated(mut self) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        self.gate = Some(Mutex::new(rx));
        (self, tx)
    }

    pub fn mount(&self, path: &str) -> MountPoint {
        self.mounts.iter().rev().find(|m| m.mount == path).cloned()
            .unwrap_or_else(|| panic!("no fake mount at {}", path))
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn usage_queries(&self) -> usize {
        self.usage_calls.load(Ordering::SeqCst)
    }
}

impl StorageProbe for FakeProbe {
    fn mount_point_for(&self, path: &Path) -> Option<MountPoint> {
        self.lookups.lock().unwrap().push(path.display().to_string());
        if let Some(gate) = &self.gate {
            let _ = gate.lock().unwrap().recv();
        }
        if let Some(hook) = &self.on_lookup { hook(); }
        if let Some(filter) = &self.lookup_filter {
            if !filter(path) { return None; }
        }
        mounts::mount_for_path(&self.mounts, path).cloned()
    }

    fn is_read_only(&self, mp: &MountPoint) -> bool {
        if let Some(hook) = &self.on_read_only { hook(); }
        mp.is_read_only()
    }

    fn disk_usage(&self, mp: &MountPoint) -> Result<DiskUsage, UsageError> {
        self.usage_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_usage { hook(); }
        if let Some(err) = self.usage_errors.get(&mp.mount) {
            return Err(err());
        }
        match self.usage.get(&mp.mount) {
            Some(&(used, total)) => Ok(DiskUsage::new(&mp.mount, used, total)),
            None => Err(UsageError::Io {
                mount:  mp.mount.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no fake usage"),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, event: StatusEvent) {
        self.events.lock().unwrap().push(event);
    }
}
