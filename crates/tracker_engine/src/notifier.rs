use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracker_core::UserId;
use tracker_logging::{tracker_debug, tracker_info};

use crate::{ChangeCallback, ChangeFeed, FailureKind, StoreError, Subscription};

/// "Something changed" signal with at most one undelivered notification.
///
/// `raise` forwards to the sink only when no earlier signal is waiting;
/// the consumer calls `acknowledge` once it has taken the signal.
#[derive(Clone)]
pub struct ChangeSignal {
    pending: Arc<AtomicBool>,
    sink: Arc<dyn Fn() + Send + Sync>,
}

impl ChangeSignal {
    pub fn new(sink: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            sink: Arc::new(sink),
        }
    }

    /// Returns true if the signal was forwarded, false if coalesced.
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        (self.sink)();
        true
    }

    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

struct ActiveSubscription {
    user: UserId,
    alive: Arc<Mutex<bool>>,
    handle: Box<dyn Subscription>,
}

/// Owns the change subscription for the signed-in user. Only one
/// subscription exists at a time. A callback raises the signal while holding
/// the liveness lock, so once `unsubscribe` returns no raise is in progress
/// and none can start.
pub struct ChangeNotifier {
    feed: Option<Arc<dyn ChangeFeed>>,
    signal: ChangeSignal,
    active: Option<ActiveSubscription>,
}

impl ChangeNotifier {
    pub fn new(feed: Option<Arc<dyn ChangeFeed>>, signal: ChangeSignal) -> Self {
        Self {
            feed,
            signal,
            active: None,
        }
    }

    pub fn active_user(&self) -> Option<&UserId> {
        self.active.as_ref().map(|active| &active.user)
    }

    /// Replaces any existing subscription with one for `user`.
    pub fn subscribe(&mut self, user: &UserId) -> Result<(), StoreError> {
        self.unsubscribe();

        let feed = self.feed.as_ref().ok_or_else(|| {
            StoreError::new(FailureKind::Unavailable, "no change feed configured")
        })?;

        let alive = Arc::new(Mutex::new(true));
        let guard = alive.clone();
        let signal = self.signal.clone();
        let callback: ChangeCallback = Arc::new(move || {
            let alive = guard.lock().unwrap_or_else(PoisonError::into_inner);
            if *alive {
                signal.raise();
            } else {
                tracker_debug!("Dropped change notification after teardown");
            }
        });

        let handle = feed.subscribe(user, callback)?;
        tracker_info!("Subscribed to changes for user {}", user);
        self.active = Some(ActiveSubscription {
            user: user.clone(),
            alive,
            handle,
        });
        Ok(())
    }

    pub fn unsubscribe(&mut self) {
        if let Some(active) = self.active.take() {
            *active.alive.lock().unwrap_or_else(PoisonError::into_inner) = false;
            active.handle.unsubscribe();
            tracker_info!("Unsubscribed from changes for user {}", active.user);
        }
    }
}

impl Drop for ChangeNotifier {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
