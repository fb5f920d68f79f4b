use crate::models::status::{StatusEvent, StatusNotice};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};

/// Where a resolution pass publishes its events.
pub trait StatusSink: Send + Sync {
    fn publish(&self, event: StatusEvent);
}

#[derive(Debug, Default)]
struct Inner {
    subscribers: Vec<mpsc::Sender<StatusNotice>>,
    closed:      bool,
}

/// Fan-out channel from background passes to the thread that renders them.
///
/// Built once at start-up and shut down explicitly at exit. Each subscriber
/// gets its own `Receiver`; events from one publisher arrive in the order
/// they were published.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A receiver subscribed after `shutdown` is already disconnected.
    pub fn subscribe(&self) -> mpsc::Receiver<StatusNotice> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        if !inner.closed {
            inner.subscribers.push(tx);
        }
        rx
    }

    pub fn publish(&self, notice: StatusNotice) {
        let mut inner = self.lock();
        if inner.closed { return; }
        // Drop subscribers whose receiver is gone
        inner.subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
    }

    #[allow(dead_code)]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.subscribers.clear();
        tracing::debug!("event bus shut down");
    }

    #[allow(dead_code)]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// A sink that tags every event with `target` before publishing.
    pub fn sink_for(&self, target: &str) -> TargetSink {
        TargetSink { bus: self.clone(), target: target.to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct TargetSink {
    bus:    EventBus,
    target: String,
}

impl StatusSink for TargetSink {
    fn publish(&self, event: StatusEvent) {
        tracing::trace!("{}: {}", self.target, event.label());
        self.bus.publish(StatusNotice { target: self.target.clone(), event });
    }
}
