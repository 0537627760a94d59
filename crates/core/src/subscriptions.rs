//! Snapshot change feeds.
//!
//! A [`ChangeFeed`] fans a full, ordered collection snapshot out to every
//! registered callback each time the collection changes. It is not a delta
//! stream: consumers rebuild their whole view from the latest snapshot and
//! must tolerate duplicate or out-of-order deliveries.
//!
//! Releasing a listener is explicit. Dropping a [`Subscription`] handle does
//! NOT unregister the callback; call [`Subscription::unsubscribe`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use log::debug;

/// Callback receiving the full ordered snapshot.
pub type SnapshotCallback<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

struct FeedInner<T> {
    name: &'static str,
    next_id: AtomicU64,
    listeners: DashMap<u64, SnapshotCallback<T>>,
}

/// Registry of snapshot listeners for one collection.
pub struct ChangeFeed<T> {
    inner: Arc<FeedInner<T>>,
}

impl<T> Clone for ChangeFeed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> ChangeFeed<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                name,
                next_id: AtomicU64::new(1),
                listeners: DashMap::new(),
            }),
        }
    }

    /// Registers a callback and returns the handle that releases it.
    pub fn subscribe(&self, callback: SnapshotCallback<T>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.insert(id, callback);
        debug!("{} feed: listener {} registered", self.inner.name, id);

        let weak: Weak<FeedInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            id,
            release: Box::new(move |id| {
                weak.upgrade()
                    .map(|feed| feed.listeners.remove(&id).is_some())
                    .unwrap_or(false)
            }),
        }
    }

    /// Delivers `snapshot` to every live listener.
    ///
    /// Listeners are cloned out of the map first so a callback may
    /// unsubscribe itself (or others) without deadlocking a shard.
    pub fn publish(&self, snapshot: &[T]) {
        let listeners: Vec<SnapshotCallback<T>> = self
            .inner
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }
}

/// Handle to a registered snapshot listener.
pub struct Subscription {
    id: u64,
    release: Box<dyn Fn(u64) -> bool + Send + Sync>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unregisters the listener. Returns false if it was already gone
    /// (feed dropped).
    pub fn unsubscribe(self) -> bool {
        (self.release)(self.id)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<Vec<u32>>>>, SnapshotCallback<u32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb: SnapshotCallback<u32> = Arc::new(move |snap: &[u32]| {
            sink.lock().unwrap().push(snap.to_vec());
        });
        (seen, cb)
    }

    #[test]
    fn test_every_publish_replays_full_snapshot() {
        let feed = ChangeFeed::<u32>::new("test");
        let (seen, cb) = recorder();
        let _sub = feed.subscribe(cb);

        feed.publish(&[1]);
        feed.publish(&[2, 1]);

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![vec![1], vec![2, 1]]);
    }

    #[test]
    fn test_drop_does_not_release_but_unsubscribe_does() {
        let feed = ChangeFeed::<u32>::new("test");
        let (_, cb) = recorder();
        let sub = feed.subscribe(cb.clone());
        drop(feed.subscribe(cb));
        assert_eq!(feed.listener_count(), 2);

        assert!(sub.unsubscribe());
        assert_eq!(feed.listener_count(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_while_notified() {
        let feed = ChangeFeed::<u32>::new("test");
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicU64::new(0));

        let own = Arc::clone(&slot);
        let counter = Arc::clone(&calls);
        let sub = feed.subscribe(Arc::new(move |_snap: &[u32]| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = own.lock().unwrap().take() {
                assert!(sub.unsubscribe());
            }
        }));
        *slot.lock().unwrap() = Some(sub);

        feed.publish(&[1]);
        feed.publish(&[2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!feed.has_listeners());
    }

    #[test]
    fn test_unsubscribe_after_feed_dropped() {
        let feed = ChangeFeed::<u32>::new("test");
        let (_, cb) = recorder();
        let sub = feed.subscribe(cb);
        drop(feed);
        assert!(!sub.unsubscribe());
    }
}
