use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;

use crate::error::Result;
use crate::logging::{json_kv, LogEvent, LogLevel, Logger};
use crate::metrics::DeliverySnapshot;

use super::core::{Event, EventFilter};

type Sink = Box<dyn FnMut(&Event) -> Result<()> + Send>;

const LOG_TARGET: &str = "deck::events";

/// One event en route to one subscriber. `remaining` is shared by every
/// delivery of the same input event; the last sink to finish advances
/// the processed counter.
struct Delivery {
    event: Event,
    remaining: Arc<AtomicUsize>,
}

struct SubscriberEntry {
    id: u64,
    filter: EventFilter,
    sender: Sender<Delivery>,
}

struct Shared {
    subscribers: Mutex<Vec<SubscriberEntry>>,
    next_id: AtomicU64,
    submitted: AtomicU64,
    processed: AtomicU64,
    failures: AtomicU64,
    signal_lock: Mutex<()>,
    signal: Condvar,
    logger: Option<Logger>,
}

/// Fan-out bus for terminal events.
///
/// Each subscriber owns an unbounded queue drained by a dedicated worker
/// thread, so per-subscriber delivery is serial and a blocking sink only
/// delays its own queue. [`EventDistributor::event`] never blocks the
/// submitter. Handles are cheap clones of the same bus.
#[derive(Clone)]
pub struct EventDistributor {
    shared: Arc<Shared>,
}

impl Default for EventDistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDistributor {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self::build(Some(logger))
    }

    fn build(logger: Option<Logger>) -> Self {
        Self {
            shared: Arc::new(Shared {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                submitted: AtomicU64::new(0),
                processed: AtomicU64::new(0),
                failures: AtomicU64::new(0),
                signal_lock: Mutex::new(()),
                signal: Condvar::new(),
                logger,
            }),
        }
    }

    /// Register a sink for the event kinds selected by `filter`.
    /// Subscription order is delivery registration order.
    pub fn subscribe<F>(&self, filter: EventFilter, sink: F) -> SubscriberHandle
    where
        F: FnMut(&Event) -> Result<()> + Send + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();
        self.shared
            .subscribers
            .lock()
            .expect("subscriber table mutex poisoned")
            .push(SubscriberEntry { id, filter, sender });

        if let Some(logger) = &self.shared.logger {
            let _ = logger.log_event(LogEvent::with_fields(
                LogLevel::Debug,
                LOG_TARGET,
                "subscriber_registered",
                [json_kv("subscriber", json!(id))],
            ));
        }

        // Workers hold the bus weakly; once every distributor handle is
        // gone the senders drop, the channels disconnect and the workers
        // exit on their own.
        let shared = Arc::downgrade(&self.shared);
        let sink: Sink = Box::new(sink);
        thread::Builder::new()
            .name(format!("deck-subscriber-{id}"))
            .spawn(move || run_subscriber(shared, id, receiver, sink))
            .expect("failed to spawn subscriber worker");

        SubscriberHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Submit an event for delivery. Returns once the event is enqueued
    /// for every matching subscriber; an event nobody wants is processed
    /// immediately.
    pub fn event(&self, event: Event) {
        distribute(&self.shared, event);
    }

    /// Monotonic count of fully delivered events. Meaningful only for
    /// synchronization within one process lifetime.
    pub fn processed(&self) -> u64 {
        self.shared.processed.load(Ordering::SeqCst)
    }

    /// Total events submitted, including internally surfaced errors.
    pub fn submitted(&self) -> u64 {
        self.shared.submitted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            submitted: self.submitted(),
            processed: self.processed(),
            failures: self.shared.failures.load(Ordering::SeqCst),
            subscribers: self
                .shared
                .subscribers
                .lock()
                .expect("subscriber table mutex poisoned")
                .len(),
        }
    }

    /// A weak handle for submitting events from inside sinks.
    pub fn reporter(&self) -> EventReporter {
        EventReporter {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Block until at least `target` events are processed.
    pub fn wait_until_processed(&self, target: u64, timeout: Duration) -> bool {
        self.wait(timeout, |shared| {
            shared.processed.load(Ordering::SeqCst) >= target
        })
    }

    /// Block until everything submitted so far has been processed. The
    /// cooperative shutdown point: stop submitting, then drain.
    pub fn drain(&self, timeout: Duration) -> bool {
        self.wait(timeout, |shared| {
            shared.processed.load(Ordering::SeqCst) >= shared.submitted.load(Ordering::SeqCst)
        })
    }

    fn wait(&self, timeout: Duration, done: impl Fn(&Shared) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self
            .shared
            .signal_lock
            .lock()
            .expect("signal mutex poisoned");
        loop {
            if done(&self.shared) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return done(&self.shared);
            }
            let (next, _) = self
                .shared
                .signal
                .wait_timeout(guard, deadline - now)
                .expect("signal mutex poisoned");
            guard = next;
        }
    }
}

/// Weak submission handle for use inside subscriber sinks. It never
/// keeps the bus alive; submitting after the bus is gone is a no-op.
#[derive(Clone)]
pub struct EventReporter {
    shared: Weak<Shared>,
}

impl EventReporter {
    pub fn event(&self, event: Event) {
        if let Some(shared) = self.shared.upgrade() {
            distribute(&shared, event);
        }
    }
}

/// Registration receipt; dropping it leaves the subscription in place.
pub struct SubscriberHandle {
    id: u64,
    shared: Weak<Shared>,
}

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the subscription. The worker drains already queued events
    /// before exiting, so in-flight processed counts still resolve.
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            remove_subscriber(&shared, self.id);
        }
    }
}

fn distribute(shared: &Arc<Shared>, event: Event) {
    shared.submitted.fetch_add(1, Ordering::SeqCst);

    let senders: Vec<Sender<Delivery>> = {
        let table = shared
            .subscribers
            .lock()
            .expect("subscriber table mutex poisoned");
        table
            .iter()
            .filter(|entry| entry.filter.matches(&event))
            .map(|entry| entry.sender.clone())
            .collect()
    };

    if senders.is_empty() {
        mark_processed(shared);
        return;
    }

    let remaining = Arc::new(AtomicUsize::new(senders.len()));
    for sender in senders {
        let delivery = Delivery {
            event: event.clone(),
            remaining: Arc::clone(&remaining),
        };
        if sender.send(delivery).is_err() {
            complete_one(shared, &remaining);
        }
    }
}

fn run_subscriber(shared: Weak<Shared>, id: u64, receiver: Receiver<Delivery>, mut sink: Sink) {
    let mut alive = true;
    while let Ok(delivery) = receiver.recv() {
        if alive {
            match catch_unwind(AssertUnwindSafe(|| sink(&delivery.event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    alive = false;
                    if let Some(shared) = shared.upgrade() {
                        fail_subscriber(&shared, id, err.to_string());
                    }
                }
                Err(panic) => {
                    alive = false;
                    if let Some(shared) = shared.upgrade() {
                        fail_subscriber(&shared, id, panic_message(panic.as_ref()));
                    }
                }
            }
        }
        if let Some(shared) = shared.upgrade() {
            complete_one(&shared, &delivery.remaining);
        }
    }
}

fn complete_one(shared: &Arc<Shared>, remaining: &AtomicUsize) {
    if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
        mark_processed(shared);
    }
}

fn mark_processed(shared: &Arc<Shared>) {
    shared.processed.fetch_add(1, Ordering::SeqCst);
    let _guard = shared.signal_lock.lock().expect("signal mutex poisoned");
    shared.signal.notify_all();
}

fn remove_subscriber(shared: &Arc<Shared>, id: u64) -> bool {
    let mut table = shared
        .subscribers
        .lock()
        .expect("subscriber table mutex poisoned");
    let before = table.len();
    table.retain(|entry| entry.id != id);
    before != table.len()
}

/// Isolate a failed sink: drop its subscription, count the failure and
/// surface the reason to error-filter subscribers.
fn fail_subscriber(shared: &Arc<Shared>, id: u64, reason: String) {
    remove_subscriber(shared, id);
    shared.failures.fetch_add(1, Ordering::SeqCst);

    if let Some(logger) = &shared.logger {
        let _ = logger.log_event(LogEvent::with_fields(
            LogLevel::Warn,
            LOG_TARGET,
            "subscriber_failed",
            [
                json_kv("subscriber", json!(id)),
                json_kv("reason", json!(reason.clone())),
            ],
        ));
    }

    distribute(shared, Event::Error(reason));
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "subscriber panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeckError;
    use crate::events::core::{EventKind, MouseButton, MouseEvent};
    use crate::geometry::{Point, Size};
    use crossterm::event::KeyCode;

    const WAIT: Duration = Duration::from_secs(5);

    fn key(ch: char) -> Event {
        Event::Key(KeyCode::Char(ch))
    }

    #[test]
    fn event_without_subscribers_is_processed_immediately() {
        let eds = EventDistributor::new();
        eds.event(key('a'));
        assert!(eds.wait_until_processed(1, WAIT));
        assert_eq!(eds.processed(), 1);
        assert_eq!(eds.submitted(), 1);
    }

    #[test]
    fn per_subscriber_order_matches_submission_order() {
        let eds = EventDistributor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        eds.subscribe(EventFilter::keys(), move |event| {
            sink_seen.lock().unwrap().push(event.clone());
            Ok(())
        });

        for ch in ['a', 'b', 'c', 'd'] {
            eds.event(key(ch));
        }
        assert!(eds.drain(WAIT));
        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![key('a'), key('b'), key('c'), key('d')]);
    }

    #[test]
    fn filter_selects_event_kinds() {
        let eds = EventDistributor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        eds.subscribe(EventFilter::mouse(), move |event| {
            sink_seen.lock().unwrap().push(event.kind());
            Ok(())
        });

        eds.event(key('a'));
        eds.event(Event::Mouse(MouseEvent::new(
            Point::new(0, 0),
            MouseButton::Left,
        )));
        eds.event(Event::Resize(Size::new(5, 5)));
        assert!(eds.drain(WAIT));
        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Mouse]);
    }

    #[test]
    fn processed_advances_only_after_every_sink_returns() {
        let eds = EventDistributor::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(Mutex::new(release_rx));

        eds.subscribe(EventFilter::keys(), move |_| {
            release_rx.lock().unwrap().recv().expect("release signal");
            Ok(())
        });
        let fast_hits = Arc::new(AtomicU64::new(0));
        let sink_hits = Arc::clone(&fast_hits);
        eds.subscribe(EventFilter::keys(), move |_| {
            sink_hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        eds.event(key('a'));
        // The fast sink finishes on its own; the blocked sink holds the
        // event open so the counter must not advance yet.
        assert!(!eds.wait_until_processed(1, Duration::from_millis(100)));
        assert_eq!(fast_hits.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        assert!(eds.wait_until_processed(1, WAIT));
        assert_eq!(eds.processed(), 1);
    }

    #[test]
    fn blocking_sink_does_not_starve_other_subscribers() {
        let eds = EventDistributor::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(Mutex::new(release_rx));
        eds.subscribe(EventFilter::keys(), move |_| {
            release_rx.lock().unwrap().recv().expect("release signal");
            Ok(())
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let (fast_tx, fast_rx) = mpsc::channel::<()>();
        eds.subscribe(EventFilter::keys(), move |event| {
            sink_seen.lock().unwrap().push(event.clone());
            fast_tx.send(()).unwrap();
            Ok(())
        });

        for ch in ['a', 'b', 'c'] {
            eds.event(key(ch));
        }
        for _ in 0..3 {
            fast_rx.recv_timeout(WAIT).expect("fast subscriber delivery");
        }
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert_eq!(eds.processed(), 0);

        for _ in 0..3 {
            release_tx.send(()).unwrap();
        }
        assert!(eds.drain(WAIT));
        assert_eq!(eds.processed(), 3);
    }

    #[test]
    fn panicking_sink_is_unsubscribed_and_surfaced() {
        let eds = EventDistributor::new();
        eds.subscribe(EventFilter::keys(), |_| -> Result<()> {
            panic!("sink exploded");
        });
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink_errors = Arc::clone(&errors);
        eds.subscribe(EventFilter::errors(), move |event| {
            if let Event::Error(message) = event {
                sink_errors.lock().unwrap().push(message.clone());
            }
            Ok(())
        });

        eds.event(key('a'));
        // The key event plus the surfaced error event.
        assert!(eds.wait_until_processed(2, WAIT));
        assert!(eds.drain(WAIT));

        let snapshot = eds.snapshot();
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.subscribers, 1);
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("sink exploded"));

        // The dead subscriber no longer receives anything.
        eds.event(key('b'));
        assert!(eds.drain(WAIT));
        assert_eq!(eds.snapshot().failures, 1);
    }

    #[test]
    fn erroring_sink_is_unsubscribed_and_queue_still_drains() {
        let eds = EventDistributor::new();
        let hits = Arc::new(AtomicU64::new(0));
        let sink_hits = Arc::clone(&hits);
        eds.subscribe(EventFilter::keys(), move |_| {
            sink_hits.fetch_add(1, Ordering::SeqCst);
            Err(DeckError::Subscriber("refused".into()))
        });

        for ch in ['a', 'b', 'c'] {
            eds.event(key(ch));
        }
        assert!(eds.drain(WAIT));
        // Only the first event reached the sink; the rest drained without
        // delivery but still count as processed.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(eds.snapshot().failures, 1);
        assert_eq!(eds.processed(), eds.submitted());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let eds = EventDistributor::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let handle = eds.subscribe(EventFilter::keys(), move |event| {
            sink_seen.lock().unwrap().push(event.clone());
            Ok(())
        });

        eds.event(key('a'));
        assert!(eds.drain(WAIT));
        handle.unsubscribe();
        eds.event(key('b'));
        assert!(eds.drain(WAIT));

        assert_eq!(*seen.lock().unwrap(), vec![key('a')]);
        assert_eq!(eds.processed(), 2);
    }

    #[test]
    fn snapshot_tracks_counters() {
        let eds = EventDistributor::new();
        eds.subscribe(EventFilter::keys(), |_| Ok(()));
        eds.event(key('a'));
        eds.event(key('b'));
        assert!(eds.drain(WAIT));
        let snapshot = eds.snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.processed, 2);
        assert_eq!(snapshot.subscribers, 1);
        assert_eq!(snapshot.failures, 0);
    }
}
