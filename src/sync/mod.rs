// ============================================================================
// galactic-state - Thread-Safe Observer
// Arc + parking_lot variant of Observer for cells shared across threads
// ============================================================================
//
// Writers are serialized: a dispatch holds the writer lock until its update
// has been applied and every subscriber has seen it, so concurrent updates
// queue up instead of interleaving. A dispatch made from inside a subscriber
// (same thread, lock already held) is queued and applied after the current
// fan-out, exactly like the single-threaded Observer. `with` also takes the
// writer lock, so a dispatch from inside its closure waits in the queue
// until the read ends instead of blocking on the value lock.
// ============================================================================

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::trace;

use crate::core::types::SubscriptionId;

// =============================================================================
// TYPES
// =============================================================================

/// A subscriber callback callable from any thread.
pub type SyncSubscriberFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Thread-safe counterpart of [`Update`](crate::Update).
pub enum SyncUpdate<T> {
    /// Replace the current value.
    Value(T),
    /// Compute the next value from the current one.
    Updater(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> SyncUpdate<T> {
    /// Wrap a closure as a `SyncUpdate::Updater`.
    pub fn updater(f: impl FnOnce(&T) -> T + Send + 'static) -> Self {
        SyncUpdate::Updater(Box::new(f))
    }

    fn apply(self, current: &T) -> T {
        match self {
            SyncUpdate::Value(value) => value,
            SyncUpdate::Updater(f) => f(current),
        }
    }
}

impl<T> From<T> for SyncUpdate<T> {
    fn from(value: T) -> Self {
        SyncUpdate::Value(value)
    }
}

// =============================================================================
// SYNC OBSERVER INNER
// =============================================================================

struct WriterState<T> {
    pending: VecDeque<SyncUpdate<T>>,
    draining: bool,
    /// Depth of `with` calls on the thread holding the writer lock
    reading: usize,
}

struct SyncObserverInner<T> {
    value: RwLock<T>,
    version: AtomicU64,
    subscribers: Mutex<BTreeMap<SubscriptionId, SyncSubscriberFn<T>>>,
    next_id: AtomicU64,
    writer: ReentrantMutex<RefCell<WriterState<T>>>,
}

/// Resets the drain state, including when a subscriber panics.
struct DrainGuard<'a, T> {
    state: &'a RefCell<WriterState<T>>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.draining = false;
        state.pending.clear();
    }
}

/// Tracks a `with` call. A panicking reader drops the updates it queued.
struct ReadGuard<'a, T> {
    state: &'a RefCell<WriterState<T>>,
}

impl<'a, T> ReadGuard<'a, T> {
    fn new(state: &'a RefCell<WriterState<T>>) -> Self {
        state.borrow_mut().reading += 1;
        Self { state }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.reading -= 1;
        if state.reading == 0 && !state.draining && std::thread::panicking() {
            state.pending.clear();
        }
    }
}

// =============================================================================
// SYNC OBSERVER
// =============================================================================

/// A shared cell that can be read, updated and subscribed to from any thread.
///
/// # Example
///
/// ```
/// use galactic_state::sync::SyncObserver;
/// use std::thread;
///
/// let hits = SyncObserver::new(0u64);
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let hits = hits.clone();
///         thread::spawn(move || {
///             for _ in 0..100 {
///                 hits.update(|n| n + 1);
///             }
///         })
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// assert_eq!(hits.get(), 400);
/// ```
pub struct SyncObserver<T> {
    inner: Arc<SyncObserverInner<T>>,
}

impl<T> Clone for SyncObserver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> SyncObserver<T> {
    /// Create an observer holding `value`, with no subscribers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SyncObserverInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                subscribers: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                writer: ReentrantMutex::new(RefCell::new(WriterState {
                    pending: VecDeque::new(),
                    draining: false,
                    reading: 0,
                })),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        // Recursive read: subscribers may call this during a fan-out
        self.inner.value.read_recursive().clone()
    }

    /// Access the current value by reference.
    ///
    /// Holds the writer lock while `f` runs: other threads' updates wait,
    /// and updates dispatched from inside `f` are applied once the
    /// outermost `with` returns. Use [`get`](Self::get) for reads that
    /// should not block writers.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let writer = self.inner.writer.lock();

        let result = {
            let _read = ReadGuard::new(&writer);
            f(&*self.inner.value.read_recursive())
        };

        let flush = {
            let state = writer.borrow();
            state.reading == 0 && !state.draining && !state.pending.is_empty()
        };
        if flush {
            self.drain(&writer);
        }
        result
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Register a callback invoked with the new value after every update.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe_arc(Arc::new(f))
    }

    /// Register a shared callback; the same `Arc` is only subscribed once.
    pub fn subscribe_arc(&self, f: SyncSubscriberFn<T>) -> SubscriptionId {
        let mut subscribers = self.inner.subscribers.lock();

        if let Some((id, _)) = subscribers
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &f))
        {
            return *id;
        }

        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        subscribers.insert(id, f);
        trace!(%id, total = subscribers.len(), "subscribed (sync)");
        id
    }

    /// Remove a subscriber; `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.subscribers.lock().remove(&id).is_some();
        trace!(%id, removed, "unsubscribed (sync)");
        removed
    }

    /// Apply an update and notify every subscriber.
    ///
    /// Blocks while another thread's update is being applied. When this
    /// returns, the update has been applied and fanned out, unless it was
    /// dispatched from a subscriber, an updater or a `with` closure on this
    /// thread; then it is applied when that outer call finishes.
    pub fn dispatch(&self, update: impl Into<SyncUpdate<T>>) {
        let writer = self.inner.writer.lock();

        {
            let mut state = writer.borrow_mut();
            state.pending.push_back(update.into());
            if state.draining {
                trace!("update queued behind running fan-out (sync)");
                return;
            }
            if state.reading > 0 {
                trace!("update deferred until read finishes (sync)");
                return;
            }
        }

        self.drain(&writer);
    }

    fn drain(&self, state: &RefCell<WriterState<T>>) {
        state.borrow_mut().draining = true;
        let _guard = DrainGuard { state };
        loop {
            let next = state.borrow_mut().pending.pop_front();
            match next {
                Some(update) => self.apply(update),
                None => break,
            }
        }
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.dispatch(SyncUpdate::Value(value));
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T + Send + 'static) {
        self.dispatch(SyncUpdate::updater(f));
    }

    fn apply(&self, update: SyncUpdate<T>) {
        let next = {
            let current = self.inner.value.read_recursive();
            update.apply(&current)
        };
        *self.inner.value.write() = next;

        let version = self.inner.version.fetch_add(1, Ordering::AcqRel) + 1;

        let subscribers: Vec<SyncSubscriberFn<T>> =
            self.inner.subscribers.lock().values().cloned().collect();
        trace!(version, subscribers = subscribers.len(), "broadcasting update (sync)");

        let value = self.inner.value.read_recursive();
        for subscriber in &subscribers {
            subscriber(&*value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SyncObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncObserver")
            .field("value", &*self.inner.value.read_recursive())
            .field("version", &self.inner.version.load(Ordering::Acquire))
            .field("subscriber_count", &self.inner.subscribers.lock().len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
