use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use freeweek_gateway::dispatcher::Dispatcher;
use freeweek_gateway::subscription::{WatchKind, watch};
use freeweek_types::events::ScheduleEvent;
use freeweek_types::models::{BusyBlock, TimeInterval};

fn sample_block(group: &str) -> BusyBlock {
    BusyBlock {
        id: "b1".to_string(),
        user_id: "u1".to_string(),
        user_name: "Alice".to_string(),
        group_code: group.to_string(),
        interval: TimeInterval {
            day: 0,
            start_hour: 9,
            start_minute: 0,
            end_hour: 10,
            end_minute: 0,
        },
        label: "Busy".to_string(),
        recurring: false,
    }
}

/// Watches "ABCD" blocks with the given poll interval; snapshots are
/// fetch-counter values pushed into the returned channel.
fn watch_counter(
    dispatcher: &Dispatcher,
    poll_interval: Duration,
) -> (
    freeweek_gateway::subscription::SubscriptionGuard,
    mpsc::UnboundedReceiver<usize>,
    Arc<AtomicUsize>,
) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::unbounded_channel();

    let counter = Arc::clone(&fetches);
    let guard = watch(
        dispatcher,
        "ABCD",
        WatchKind::Blocks,
        poll_interval,
        move || counter.fetch_add(1, Ordering::SeqCst) + 1,
        move |snapshot| {
            let _ = tx.send(snapshot);
        },
    );

    (guard, rx, fetches)
}

#[tokio::test]
async fn poll_path_delivers_without_any_events() {
    let dispatcher = Dispatcher::new();
    let (_guard, mut rx, _) = watch_counter(&dispatcher, Duration::from_millis(20));

    // First tick fires immediately, then on the interval
    let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(first, Some(1));
    assert_eq!(second, Some(2));
}

#[tokio::test]
async fn push_path_delivers_on_matching_event() {
    let dispatcher = Dispatcher::new();
    // Poll far enough out that only the initial tick lands
    let (_guard, mut rx, _) = watch_counter(&dispatcher, Duration::from_secs(300));

    // Initial poll snapshot
    let initial = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(initial, Some(1));

    dispatcher.broadcast(ScheduleEvent::BlockCreated {
        group_code: "ABCD".to_string(),
        block: sample_block("ABCD"),
    });

    let pushed = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
    assert_eq!(pushed, Some(2));
}

#[tokio::test]
async fn events_for_other_groups_are_ignored() {
    let dispatcher = Dispatcher::new();
    let (_guard, mut rx, _) = watch_counter(&dispatcher, Duration::from_secs(300));

    assert_eq!(rx.recv().await, Some(1)); // initial poll

    dispatcher.broadcast(ScheduleEvent::BlockCreated {
        group_code: "WXYZ".to_string(),
        block: sample_block("WXYZ"),
    });

    let result = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(result.is_err(), "snapshot delivered for a foreign group");
}

#[tokio::test]
async fn member_events_do_not_wake_a_blocks_watcher() {
    let dispatcher = Dispatcher::new();
    let (_guard, mut rx, _) = watch_counter(&dispatcher, Duration::from_secs(300));

    assert_eq!(rx.recv().await, Some(1)); // initial poll

    dispatcher.broadcast(ScheduleEvent::MemberRenamed {
        group_code: "ABCD".to_string(),
        user_id: "u1".to_string(),
        user_name: "Alicia".to_string(),
    });

    let result = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(result.is_err(), "blocks watcher woke on a member event");
}

#[tokio::test]
async fn cancel_stops_both_delivery_paths() {
    let dispatcher = Dispatcher::new();
    let (guard, mut rx, fetches) = watch_counter(&dispatcher, Duration::from_millis(20));

    // Let at least one delivery through, then cancel
    assert_eq!(rx.recv().await, Some(1));
    guard.cancel();

    // Drain anything already in flight, then confirm silence
    tokio::time::sleep(Duration::from_millis(50)).await;
    while rx.try_recv().is_ok() {}
    let settled = fetches.load(Ordering::SeqCst);

    dispatcher.broadcast(ScheduleEvent::BlockCreated {
        group_code: "ABCD".to_string(),
        block: sample_block("ABCD"),
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(fetches.load(Ordering::SeqCst), settled);
    assert!(rx.try_recv().is_err());
}
