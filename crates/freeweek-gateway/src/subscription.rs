use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use freeweek_types::events::ScheduleEvent;

use crate::dispatcher::Dispatcher;

/// Which slice of group state a subscription observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Blocks,
    Members,
}

impl WatchKind {
    fn matches(self, event: &ScheduleEvent) -> bool {
        match self {
            Self::Blocks => event.touches_blocks(),
            Self::Members => !event.touches_blocks(),
        }
    }
}

/// Handle for an active subscription. `cancel` (or dropping the
/// guard) aborts both the push task and the poll task; no further
/// callback invocations happen after that beyond one that may already
/// be in flight.
pub struct SubscriptionGuard {
    push: JoinHandle<()>,
    poll: JoinHandle<()>,
}

impl SubscriptionGuard {
    pub fn cancel(self) {
        // Drop does the aborting
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.push.abort();
        self.poll.abort();
    }
}

/// Watches one group's state and invokes `callback` with a freshly
/// fetched full snapshot whenever it may have changed.
///
/// Delivery runs on two independent paths: a push path that reacts to
/// dispatcher events for the group, and a poll path that re-fetches on
/// a fixed interval even when no event arrives (the poll fires
/// immediately on subscribe, so observers get an initial snapshot).
/// Both paths deliver the same full-state snapshots, so double or
/// out-of-order delivery is harmless — the consumer replaces its prior
/// state with whatever arrives last.
///
/// `fetch` runs on the blocking pool; it may hit the database.
pub fn watch<T, F, C>(
    dispatcher: &Dispatcher,
    group_code: &str,
    kind: WatchKind,
    poll_interval: Duration,
    fetch: F,
    callback: C,
) -> SubscriptionGuard
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
    C: Fn(T) + Send + Sync + 'static,
{
    let fetch = Arc::new(fetch);
    let callback = Arc::new(callback);

    let mut events = dispatcher.subscribe();
    let push = tokio::spawn({
        let group = group_code.to_string();
        let fetch = Arc::clone(&fetch);
        let callback = Arc::clone(&callback);
        async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.group_code() == group && kind.matches(&event) {
                            debug!("change event for group {}, re-fetching", group);
                            deliver(&fetch, &callback).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Skipped events are recovered by re-fetching the
                        // full snapshot once
                        warn!("subscription for {} lagged by {} events", group, skipped);
                        deliver(&fetch, &callback).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });

    let poll = tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            deliver(&fetch, &callback).await;
        }
    });

    SubscriptionGuard { push, poll }
}

async fn deliver<T, F, C>(fetch: &Arc<F>, callback: &Arc<C>)
where
    T: Send + 'static,
    F: Fn() -> T + Send + Sync + 'static,
    C: Fn(T) + Send + Sync + 'static,
{
    let fetch = Arc::clone(fetch);
    match tokio::task::spawn_blocking(move || (*fetch)()).await {
        Ok(snapshot) => (**callback)(snapshot),
        Err(e) => warn!("snapshot fetch task failed: {}", e),
    }
}
