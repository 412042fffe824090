use std::sync::Arc;

use tokio::sync::broadcast;

use freeweek_types::events::ScheduleEvent;

/// Fans change events out to every observer. Observers treat events
/// as invalidation signals and re-fetch the full snapshot, so a lossy
/// channel is acceptable: a dropped event is recovered by the next
/// poll cycle.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<ScheduleEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to change events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all observers. A send with no observers
    /// is not an error.
    pub fn broadcast(&self, event: ScheduleEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
