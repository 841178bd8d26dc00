use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicU64, Ordering};

pub type SubscriberId = u64;

type Callback<E> = Box<dyn Fn(&E) + Send + Sync>;

/// A minimal observer-pattern hub: subscribers register a callback and every
/// published event is delivered to all of them, in subscription order.
///
/// The data service publishes [`DataEvent`]s through one of these and the
/// algorithm manager publishes [`AlgorithmEvent`]s; GUIs and tests are the
/// subscribers.
pub struct NotificationHub<E> {
    subscribers: Mutex<Vec<(SubscriberId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> Default for NotificationHub<E> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E> NotificationHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber; returns false when the id was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn publish(&self, event: &E) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, callback) in subscribers.iter() {
            callback(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<E> std::fmt::Debug for NotificationHub<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Changes to the data service's name → workspace mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataEvent {
    Added { name: String },
    Replaced { name: String },
    Removed { name: String },
    Cleared,
}

/// Lifecycle of managed algorithm executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmEvent {
    Starting {
        name: String,
        version: i32,
    },
    Finished {
        name: String,
        version: i32,
        success: bool,
    },
}
