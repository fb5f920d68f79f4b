use crate::bus::{EventBus, StatusSink};
use crate::cancel::CancelToken;
use crate::models::status::StatusEvent;
use crate::probe::StorageProbe;
use crate::quirks::QuirkTable;
use crate::resolver::{Outcome, Resolver};
use std::collections::HashMap;
use std::path::PathBuf;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

#[derive(Debug)]
struct Pending {
    generation: u64,
    token:      CancelToken,
}

#[derive(Debug, Default)]
struct Registry {
    next_generation: u64,
    pending:         HashMap<String, Pending>,
    /// Worker threads per target that have not returned, superseded ones included.
    live:            HashMap<String, usize>,
}

type SharedRegistry = Arc<Mutex<Registry>>;

fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counts a worker as live until it is dropped, even if the pass panics.
struct LiveGuard {
    registry: SharedRegistry,
    target:   String,
}

impl LiveGuard {
    fn new(registry: &SharedRegistry, target: &str) -> Self {
        *lock(registry).live.entry(target.to_string()).or_insert(0) += 1;
        Self { registry: Arc::clone(registry), target: target.to_string() }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        let mut reg = lock(&self.registry);
        if let Some(n) = reg.live.get_mut(&self.target) {
            *n -= 1;
            if *n == 0 { reg.live.remove(&self.target); }
        }
    }
}

/// Runs resolution passes on background threads, one live pass per target.
pub struct StatusMonitor {
    probe:    Arc<dyn StorageProbe>,
    quirks:   Arc<QuirkTable>,
    bus:      EventBus,
    registry: SharedRegistry,
}

impl StatusMonitor {
    pub fn new(probe: Arc<dyn StorageProbe>, quirks: QuirkTable, bus: EventBus) -> Self {
        Self {
            probe,
            quirks: Arc::new(quirks),
            bus,
            registry: SharedRegistry::default(),
        }
    }

    /// Start a pass for `target`, cancelling the one already running for it.
    ///
    /// If no thread can be spawned the target gets `Warning` and
    /// `StopRefreshing` so its indicator does not wait forever.
    pub fn request(&self, target: &str, path: impl Into<PathBuf>, warn_pct: u32) -> io::Result<JoinHandle<Outcome>> {
        let path  = path.into();
        let token = CancelToken::new();
        let generation = {
            let mut reg = lock(&self.registry);
            reg.next_generation += 1;
            let generation = reg.next_generation;
            let previous = reg.pending.insert(target.to_string(), Pending { generation, token: token.clone() });
            if let Some(prev) = previous {
                tracing::debug!("superseding pass {} for {}", prev.generation, target);
                prev.token.cancel();
            }
            generation
        };

        let probe    = Arc::clone(&self.probe);
        let quirks   = Arc::clone(&self.quirks);
        let registry = Arc::clone(&self.registry);
        let guard    = LiveGuard::new(&self.registry, target);
        let sink     = self.bus.sink_for(target);
        let worker_sink = sink.clone();
        let owned    = target.to_string();

        let spawned = std::thread::Builder::new()
            .name(format!("mstat:{}", target))
            .spawn(move || {
                let _guard = guard;
                let sink = worker_sink;
                if !token.is_cancelled() {
                    sink.publish(StatusEvent::Refreshing);
                }
                let outcome = Resolver::new(probe.as_ref(), &quirks).resolve(&path, warn_pct, &token, &sink);
                if outcome != Outcome::Cancelled {
                    sink.publish(StatusEvent::StopRefreshing);
                }
                forget_pending(&registry, &owned, generation);
                outcome
            });

        if let Err(e) = &spawned {
            tracing::warn!("cannot start pass for {}: {}", target, e);
            forget_pending(&self.registry, target, generation);
            sink.publish(StatusEvent::Warning);
            sink.publish(StatusEvent::StopRefreshing);
        }
        spawned
    }

    /// Like `request`, but leaves the target alone while any earlier worker
    /// for it is still running. A pass stuck on a hung mount cannot be
    /// interrupted, so re-requesting would only pile up blocked threads.
    pub fn refresh(&self, target: &str, path: impl Into<PathBuf>, warn_pct: u32) -> Option<io::Result<JoinHandle<Outcome>>> {
        let live = self.live_workers(target);
        if live > 0 {
            tracing::debug!("{} still has {} worker(s) running, skipping refresh", target, live);
            return None;
        }
        Some(self.request(target, path, warn_pct))
    }

    /// Worker threads for `target` that have not returned yet.
    pub fn live_workers(&self, target: &str) -> usize {
        lock(&self.registry).live.get(target).copied().unwrap_or(0)
    }

    #[allow(dead_code)]
    pub fn cancel(&self, target: &str) {
        if let Some(p) = lock(&self.registry).pending.remove(target) {
            p.token.cancel();
        }
    }

    pub fn cancel_all(&self) {
        for (_, p) in lock(&self.registry).pending.drain() {
            p.token.cancel();
        }
    }

    /// Passes started and neither finished nor cancelled.
    pub fn in_flight(&self) -> usize {
        lock(&self.registry).pending.len()
    }
}

fn forget_pending(registry: &SharedRegistry, target: &str, generation: u64) {
    let mut reg = lock(registry);
    if reg.pending.get(target).is_some_and(|p| p.generation == generation) {
        reg.pending.remove(target);
    }
}

impl Drop for StatusMonitor {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
