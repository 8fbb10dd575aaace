// ============================================================================
// galactic-state - Observer
// A single mutable value plus the set of callbacks interested in it
// ============================================================================
//
// The observer is the whole publish-subscribe core:
// - subscribe(f) registers a callback and hands back a token
// - unsubscribe(token) removes it (absent tokens are a no-op)
// - dispatch(update) replaces the value, then calls every subscriber
//   synchronously with the new value before returning
//
// Updates dispatched while a fan-out is in progress (from inside a
// subscriber or an updater) are queued and applied in FIFO order once the
// current fan-out finishes, each with its own full fan-out. Updates
// dispatched from inside `with` wait until the outermost read returns.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::types::{SubscriberFn, SubscriptionId, Update};

// =============================================================================
// OBSERVER INNER
// =============================================================================

struct ObserverInner<T> {
    /// Current value
    value: RefCell<T>,

    /// Incremented once per applied update
    version: Cell<u64>,

    /// Subscribers keyed by token; ids increase so BTreeMap order is
    /// registration order
    subscribers: RefCell<BTreeMap<SubscriptionId, SubscriberFn<T>>>,

    /// Next subscription id to hand out
    next_id: Cell<u64>,

    /// Updates waiting for the current fan-out to finish
    pending: RefCell<VecDeque<Update<T>>>,

    /// Whether a dispatch loop is running
    notifying: Cell<bool>,

    /// Depth of `with` calls currently borrowing the value
    readers: Cell<usize>,
}

/// Resets the dispatch loop state, including when a subscriber panics.
struct NotifyGuard<'a, T> {
    inner: &'a ObserverInner<T>,
}

impl<T> Drop for NotifyGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.notifying.set(false);
        self.inner.pending.borrow_mut().clear();
    }
}

/// Tracks a `with` borrow. A panicking reader drops the updates it queued.
struct ReadGuard<'a, T> {
    inner: &'a ObserverInner<T>,
}

impl<'a, T> ReadGuard<'a, T> {
    fn new(inner: &'a ObserverInner<T>) -> Self {
        inner.readers.set(inner.readers.get() + 1);
        Self { inner }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let readers = self.inner.readers.get() - 1;
        self.inner.readers.set(readers);
        if readers == 0 && !self.inner.notifying.get() && std::thread::panicking() {
            self.inner.pending.borrow_mut().clear();
        }
    }
}

// =============================================================================
// OBSERVER<T> - The public handle
// =============================================================================

/// Single source of truth for one value, with fan-out notification.
///
/// Cloning an `Observer` gives another handle to the **same** cell: both
/// handles see the same value and share subscribers.
///
/// # Example
///
/// ```
/// use galactic_state::Observer;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let counter = Observer::new(0);
/// let seen = Rc::new(Cell::new(0));
///
/// let seen_clone = seen.clone();
/// let id = counter.subscribe(move |n| seen_clone.set(*n));
///
/// counter.set(5);
/// assert_eq!(seen.get(), 5);
///
/// counter.update(|n| n + 1);
/// assert_eq!(seen.get(), 6);
///
/// counter.unsubscribe(id);
/// counter.set(100);
/// assert_eq!(seen.get(), 6);
/// ```
pub struct Observer<T> {
    inner: Rc<ObserverInner<T>>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Observer<T> {
    /// Create an observer holding `value`, with no subscribers.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObserverInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(1),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
                readers: Cell::new(0),
            }),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Get a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference.
    ///
    /// Updates dispatched from inside `f` are applied, and fanned out, once
    /// the outermost `with` returns.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let result = {
            let _read = ReadGuard::new(&self.inner);
            f(&*self.inner.value.borrow())
        };

        let idle = self.inner.readers.get() == 0 && !self.inner.notifying.get();
        if idle && !self.inner.pending.borrow().is_empty() {
            self.drain();
        }
        result
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether `id` is still subscribed.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.borrow().contains_key(&id)
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Register a callback invoked with the new value after every update.
    ///
    /// The callback does not receive the current value; read it with
    /// [`get`](Self::get) when initialising.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubscriptionId {
        self.subscribe_rc(Rc::new(f))
    }

    /// Register a shared callback.
    ///
    /// Subscribing the same `Rc` twice returns the existing token; the
    /// callback is still notified once per update.
    pub fn subscribe_rc(&self, f: SubscriberFn<T>) -> SubscriptionId {
        let mut subscribers = self.inner.subscribers.borrow_mut();

        if let Some((id, _)) = subscribers
            .iter()
            .find(|(_, existing)| Rc::ptr_eq(existing, &f))
        {
            trace!(%id, "callback already subscribed");
            return *id;
        }

        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        subscribers.insert(id, f);
        trace!(%id, total = subscribers.len(), "subscribed");
        id
    }

    /// Register a callback that is unsubscribed when the returned guard drops.
    pub fn subscribe_scoped(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let id = self.subscribe(f);
        let weak: Weak<ObserverInner<T>> = Rc::downgrade(&self.inner);

        Subscription {
            id,
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Observer { inner }.unsubscribe(id);
                }
            })),
        }
    }

    /// Remove a subscriber.
    ///
    /// Returns `false` if `id` was not subscribed; removing twice is harmless.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.subscribers.borrow_mut().remove(&id).is_some();
        trace!(%id, removed, "unsubscribed");
        removed
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    /// Apply an update and notify every subscriber with the new value.
    ///
    /// Accepts either an [`Update`] or a plain value. All subscribers have
    /// been called by the time this returns, unless the call is made from a
    /// subscriber, an updater or a [`with`](Self::with) closure; then the
    /// update is queued and applied when that outer call finishes.
    pub fn dispatch(&self, update: impl Into<Update<T>>) {
        self.inner.pending.borrow_mut().push_back(update.into());

        if self.inner.notifying.get() {
            trace!("update queued behind running fan-out");
            return;
        }
        if self.inner.readers.get() > 0 {
            trace!("update deferred until read finishes");
            return;
        }

        self.drain();
    }

    fn drain(&self) {
        self.inner.notifying.set(true);
        let _guard = NotifyGuard { inner: &self.inner };

        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            match next {
                Some(update) => self.apply(update),
                None => break,
            }
        }
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.dispatch(Update::Value(value));
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.dispatch(Update::updater(f));
    }

    fn apply(&self, update: Update<T>) {
        let next = {
            let current = self.inner.value.borrow();
            update.apply(&current)
        };
        *self.inner.value.borrow_mut() = next;

        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);

        // Snapshot so callbacks may subscribe/unsubscribe while we iterate
        let subscribers: Vec<SubscriberFn<T>> =
            self.inner.subscribers.borrow().values().cloned().collect();
        trace!(version, subscribers = subscribers.len(), "broadcasting update");

        let value = self.inner.value.borrow();
        for subscriber in &subscribers {
            subscriber(&*value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscriber_count", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

// =============================================================================
// SUBSCRIPTION GUARD
// =============================================================================

/// RAII guard returned by [`Observer::subscribe_scoped`].
///
/// Dropping it removes the callback. It holds the observer weakly, so it
/// does not keep the cell alive.
pub struct Subscription {
    id: SubscriptionId,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Token of the underlying subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the callback now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.release.is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
