//! Lifecycle notifications
//!
//! The manager broadcasts every enable, resize and disable to any number of
//! subscribers. A renderer can implement [`LifecycleListener`] directly or
//! take a bounded channel from [`ChannelListener::bounded`].

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// Buffer sized and accepting reads/writes
    Enabled { channels: usize, capacity: usize },
    /// Geometry changed while enabled; previous history was discarded
    Resized { channels: usize, capacity: usize },
    /// Buffer no longer valid
    Disabled,
}

/// A state change emitted by the lifecycle manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(flatten)]
    pub kind: LifecycleEventKind,
    /// Buffer generation after the change
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleEventKind, generation: u64) -> Self {
        Self {
            kind,
            generation,
            timestamp: Utc::now(),
        }
    }
}

/// Receives lifecycle events
///
/// Called synchronously on the configuration path, so implementations
/// must return quickly.
pub trait LifecycleListener: Send + Sync {
    fn on_lifecycle_event(&self, event: &LifecycleEvent);
}

impl<F> LifecycleListener for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_lifecycle_event(&self, event: &LifecycleEvent) {
        self(event)
    }
}

/// Forwards events into a bounded crossbeam channel
///
/// Events are dropped rather than blocking when the receiver falls behind.
pub struct ChannelListener {
    tx: Sender<LifecycleEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiver it feeds
    pub fn bounded(capacity: usize) -> (Self, Receiver<LifecycleEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }
}

impl LifecycleListener for ChannelListener {
    fn on_lifecycle_event(&self, event: &LifecycleEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(
                    generation = event.generation,
                    "Lifecycle event queue full, dropping event"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Lifecycle event receiver dropped");
            }
        }
    }
}

/// Registered listeners, notified in subscription order
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Box<dyn LifecycleListener>>,
}

impl ListenerSet {
    pub(crate) fn push(&mut self, listener: Box<dyn LifecycleListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn notify(&self, event: &LifecycleEvent) {
        for listener in &self.listeners {
            listener.on_lifecycle_event(event);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
