use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracker_core::{RecordFields, Status, UserId};
use tracker_engine::{
    ChangeCallback, ChangeFeed, ChangeNotifier, ChangeSignal, FailureKind, MemoryStore,
    StoreError, Subscription,
};

fn init_logging() {
    tracker_logging::initialize_for_tests();
}

fn counting_signal() -> (Arc<AtomicUsize>, ChangeSignal) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    let signal = ChangeSignal::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (hits, signal)
}

/// Feed that keeps callbacks after unsubscribe, like a transport that
/// delivers one last in-flight message.
#[derive(Default)]
struct LeakyFeed {
    callbacks: Mutex<Vec<(UserId, ChangeCallback)>>,
    unsubscribed: Arc<AtomicUsize>,
}

struct LeakySubscription {
    unsubscribed: Arc<AtomicUsize>,
}

impl Subscription for LeakySubscription {
    fn unsubscribe(self: Box<Self>) {
        self.unsubscribed.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChangeFeed for LeakyFeed {
    fn subscribe(
        &self,
        user: &UserId,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        self.callbacks
            .lock()
            .unwrap()
            .push((user.clone(), on_change));
        Ok(Box::new(LeakySubscription {
            unsubscribed: self.unsubscribed.clone(),
        }))
    }
}

impl LeakyFeed {
    fn fire(&self, user: &str) {
        let callbacks: Vec<_> = self
            .callbacks
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| owner.as_str() == user)
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

#[test]
fn signals_are_coalesced_until_acknowledged() {
    init_logging();
    let (hits, signal) = counting_signal();
    assert!(signal.raise());
    assert!(!signal.raise());
    assert!(!signal.raise());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(signal.is_pending());

    signal.acknowledge();
    assert!(signal.raise());
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn no_delivery_after_teardown() {
    init_logging();
    let feed = Arc::new(LeakyFeed::default());
    let (hits, signal) = counting_signal();
    let mut notifier =
        ChangeNotifier::new(Some(feed.clone() as Arc<dyn ChangeFeed>), signal.clone());

    notifier.subscribe(&UserId::new("alice")).unwrap();
    feed.fire("alice");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    signal.acknowledge();

    notifier.unsubscribe();
    assert_eq!(feed.unsubscribed.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.active_user(), None);
    feed.fire("alice");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_waits_for_delivery_in_progress() {
    init_logging();
    let feed = Arc::new(LeakyFeed::default());
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let delivered = Arc::new(AtomicBool::new(false));
    let finished = delivered.clone();
    let signal = ChangeSignal::new(move || {
        let _ = entered_tx.send(());
        let _ = release_rx.lock().unwrap().recv();
        finished.store(true, Ordering::SeqCst);
    });
    let mut notifier = ChangeNotifier::new(Some(feed.clone() as Arc<dyn ChangeFeed>), signal);
    notifier.subscribe(&UserId::new("alice")).unwrap();

    let firing = {
        let feed = feed.clone();
        thread::spawn(move || feed.fire("alice"))
    };
    entered_rx.recv().unwrap();
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();
    });

    notifier.unsubscribe();
    assert!(delivered.load(Ordering::SeqCst));
    firing.join().unwrap();
    releaser.join().unwrap();
}

#[test]
fn switching_user_tears_down_previous_subscription() {
    init_logging();
    let feed = Arc::new(LeakyFeed::default());
    let (hits, signal) = counting_signal();
    let mut notifier =
        ChangeNotifier::new(Some(feed.clone() as Arc<dyn ChangeFeed>), signal.clone());

    notifier.subscribe(&UserId::new("alice")).unwrap();
    notifier.subscribe(&UserId::new("bob")).unwrap();
    assert_eq!(feed.unsubscribed.load(Ordering::SeqCst), 1);
    assert_eq!(notifier.active_user(), Some(&UserId::new("bob")));

    feed.fire("alice");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    feed.fire("bob");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_notifier_unsubscribes() {
    init_logging();
    let store = MemoryStore::new();
    let (_hits, signal) = counting_signal();
    {
        let feed: Arc<dyn ChangeFeed> = Arc::new(store.clone());
        let mut notifier = ChangeNotifier::new(Some(feed), signal);
        notifier.subscribe(&UserId::new("u")).unwrap();
        assert_eq!(store.listener_count(), 1);
    }
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn memory_feed_drives_signal() {
    init_logging();
    let store = MemoryStore::new();
    let (hits, signal) = counting_signal();
    let feed: Arc<dyn ChangeFeed> = Arc::new(store.clone());
    let mut notifier = ChangeNotifier::new(Some(feed), signal);
    notifier.subscribe(&UserId::new("u")).unwrap();

    store.insert(&UserId::new("u"), RecordFields::new("A", "Acme", Status::Saved));
    store.insert(&UserId::new("u"), RecordFields::new("B", "Acme", Status::Saved));
    // Second change coalesces with the unacknowledged first one.
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_feed_is_reported_not_fatal() {
    init_logging();
    let (_hits, signal) = counting_signal();
    let mut notifier = ChangeNotifier::new(None, signal);
    let err = notifier.subscribe(&UserId::new("u")).unwrap_err();
    assert_eq!(err.kind, FailureKind::Unavailable);
    assert_eq!(notifier.active_user(), None);
}
