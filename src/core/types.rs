// ============================================================================
// galactic-state - Type Definitions
// Shared callback types, subscription tokens and the tagged update argument
// ============================================================================

use std::fmt;
use std::rc::Rc;

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A subscriber callback, invoked with the new value after every update.
///
/// Stored behind `Rc` so the same callback can be recognised (by pointer) when
/// it is subscribed twice.
pub type SubscriberFn<T> = Rc<dyn Fn(&T)>;

/// An updater function: computes the next value from the current one.
pub type UpdaterFn<T> = Box<dyn FnOnce(&T) -> T>;

/// Cleanup function registered on a component, run once on unmount.
pub type CleanupFn = Box<dyn FnOnce()>;

/// Validator run against the initial value of a shared cell.
pub type ValidatorFn<T> = Box<dyn Fn(&T) -> Result<(), String>>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Token returned by `subscribe`, passed back to `unsubscribe`.
///
/// Ids are allocated per observer in increasing order, so iterating
/// subscribers by id visits them in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// The raw numeric value of this token.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Process-unique identifier of a mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub(crate) u64);

impl ComponentId {
    /// The raw numeric value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component#{}", self.0)
    }
}

// =============================================================================
// UPDATE<T> - literal value or updater
// =============================================================================

/// The argument of a state update: either a literal new value or a function
/// of the current value.
///
/// The variant is chosen by the caller, never inferred from the value, so a
/// cell may hold function-typed state: `Update::Value(f)` stores `f` itself.
///
/// # Example
///
/// ```
/// use galactic_state::{Observer, Update};
///
/// let cell = Observer::new(1);
/// cell.dispatch(Update::Value(10));
/// cell.dispatch(Update::updater(|n: &i32| n * 2));
/// cell.dispatch(5); // plain values convert into `Update::Value`
/// assert_eq!(cell.get(), 5);
/// ```
pub enum Update<T> {
    /// Replace the current value.
    Value(T),
    /// Compute the next value from the current one.
    Updater(UpdaterFn<T>),
}

impl<T> Update<T> {
    /// Wrap a closure as an `Update::Updater`.
    pub fn updater(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Update::Updater(Box::new(f))
    }

    /// Produce the next value given the current one.
    pub fn apply(self, current: &T) -> T {
        match self {
            Update::Value(value) => value,
            Update::Updater(f) => f(current),
        }
    }

    /// Whether this update is an updater function.
    pub fn is_updater(&self) -> bool {
        matches!(self, Update::Updater(_))
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Update::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
