// ============================================================================
// galactic-state - Shared State Factory
//
// create_shared_state(initial) -> one observer + the hook bound to it
// ============================================================================
//
// Each factory call owns exactly one Observer. The returned SharedState is
// the explicit owner of that cell: clone it into whichever parts of the
// application need the shared value, call `use_state()` inside components,
// and use the setter (or the observer, if requested) from anywhere else.
//
// Validation and debug subscribers only run in development builds.
// ============================================================================

use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::core::error::{Result, StateError};
use crate::core::types::{SubscriberFn, Update, ValidatorFn};
use crate::primitives::hook::{use_shared, HookPair, Setter};
use crate::primitives::observer::Observer;

// =============================================================================
// BUILD MODE
// =============================================================================

/// Whether development-only checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Validators and debug subscribers are installed
    Development,
    /// Validators and debug subscribers are skipped
    Production,
}

impl BuildMode {
    /// `Development` when compiled with debug assertions, else `Production`.
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }

    /// Whether this is `Production`
    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }
}

impl Default for BuildMode {
    fn default() -> Self {
        Self::current()
    }
}

// =============================================================================
// OPTIONS
// =============================================================================

/// Configuration for [`create_shared_state_with`].
pub struct SharedStateOptions<T> {
    /// Whether [`SharedState::observer`] hands out the observer
    pub include_observer: bool,

    /// Subscribers installed at creation in development builds, for inspection
    pub debug_subscribers: Vec<SubscriberFn<T>>,

    /// Check run against the initial value in development builds
    pub validator: Option<ValidatorFn<T>>,

    /// Build mode deciding whether the two fields above take effect
    pub build_mode: BuildMode,
}

impl<T> Default for SharedStateOptions<T> {
    fn default() -> Self {
        Self {
            include_observer: false,
            debug_subscribers: Vec::new(),
            validator: None,
            build_mode: BuildMode::current(),
        }
    }
}

impl<T> fmt::Debug for SharedStateOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStateOptions")
            .field("include_observer", &self.include_observer)
            .field("debug_subscribers", &self.debug_subscribers.len())
            .field("validator", &self.validator.is_some())
            .field("build_mode", &self.build_mode)
            .finish()
    }
}

/// Builder returned by [`SharedState::builder`].
pub struct SharedStateBuilder<T> {
    initial: T,
    options: SharedStateOptions<T>,
}

impl<T: Clone + 'static> SharedStateBuilder<T> {
    /// Let [`SharedState::observer`] return the observer.
    pub fn include_observer(mut self, include: bool) -> Self {
        self.options.include_observer = include;
        self
    }

    /// Call `f` with every new value (development builds only).
    pub fn debug_subscriber(mut self, f: impl Fn(&T) + 'static) -> Self {
        self.options.debug_subscribers.push(Rc::new(f));
        self
    }

    /// Log every new value at debug level under `label` (development builds only).
    pub fn debug_label(mut self, label: impl Into<String>) -> Self
    where
        T: fmt::Debug,
    {
        let label = label.into();
        self.options
            .debug_subscribers
            .push(Rc::new(move |value: &T| {
                debug!(cell = %label, ?value, "shared state updated");
            }));
        self
    }

    /// Reject initial values for which `f` returns an error (development builds only).
    pub fn validator(mut self, f: impl Fn(&T) -> std::result::Result<(), String> + 'static) -> Self {
        self.options.validator = Some(Box::new(f));
        self
    }

    /// Override the build mode detected at compile time.
    pub fn build_mode(mut self, mode: BuildMode) -> Self {
        self.options.build_mode = mode;
        self
    }

    /// Create the cell.
    pub fn build(self) -> Result<SharedState<T>> {
        create_shared_state_with(self.initial, self.options)
    }
}

// =============================================================================
// SHARED STATE
// =============================================================================

/// Owner of one shared cell: the hook, the setter and (optionally) the observer.
///
/// Clones refer to the same cell.
///
/// # Example
///
/// ```
/// use galactic_state::{create_shared_state, Component};
///
/// let counter = create_shared_state(0);
/// let a = Component::new();
/// let b = Component::new();
///
/// let (_, set_count) = a.render(|| counter.use_state()).unwrap().unwrap();
/// b.render(|| counter.use_state()).unwrap().unwrap();
///
/// set_count.set(1);
/// set_count.update(|n| n + 1);
///
/// let (from_a, _) = a.render(|| counter.use_state()).unwrap().unwrap();
/// let (from_b, _) = b.render(|| counter.use_state()).unwrap().unwrap();
/// assert_eq!((from_a, from_b), (2, 2));
/// ```
pub struct SharedState<T> {
    observer: Observer<T>,
    include_observer: bool,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            observer: self.observer.clone(),
            include_observer: self.include_observer,
        }
    }
}

impl<T: Clone + 'static> SharedState<T> {
    /// Start configuring a cell holding `initial`.
    pub fn builder(initial: T) -> SharedStateBuilder<T> {
        SharedStateBuilder {
            initial,
            options: SharedStateOptions::default(),
        }
    }

    /// The hook: bind the rendering component to this cell.
    ///
    /// See [`use_shared`].
    pub fn use_state(&self) -> Result<HookPair<T>> {
        use_shared(&self.observer)
    }

    /// A setter usable outside components.
    pub fn setter(&self) -> Setter<T> {
        Setter::new(self.observer.clone())
    }

    /// The observer, if the cell was created with `include_observer`.
    pub fn observer(&self) -> Option<Observer<T>> {
        self.include_observer.then(|| self.observer.clone())
    }

    /// Current value
    pub fn get(&self) -> T {
        self.observer.get()
    }

    /// Replace the value
    pub fn set(&self, value: T) {
        self.observer.set(value);
    }

    /// Replace the value with `f(current)`
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.observer.update(f);
    }

    /// Forward a literal value or an updater
    pub fn dispatch(&self, update: impl Into<Update<T>>) {
        self.observer.dispatch(update);
    }

    /// Number of subscribers, mounted components included
    pub fn subscriber_count(&self) -> usize {
        self.observer.subscriber_count()
    }

    /// Number of updates applied so far
    pub fn version(&self) -> u64 {
        self.observer.version()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("observer", &self.observer)
            .field("include_observer", &self.include_observer)
            .finish()
    }
}

// =============================================================================
// FACTORY FUNCTIONS
// =============================================================================

/// Create a shared cell with no validator or debug subscribers.
///
/// Without a validator creation cannot fail. The observer is not exposed;
/// use [`SharedState::builder`] with `include_observer(true)` for that.
///
/// # Example
///
/// ```
/// use galactic_state::create_shared_state;
///
/// let name = create_shared_state(String::from("anon"));
/// name.set(String::from("ada"));
/// assert_eq!(name.get(), "ada");
/// assert!(name.observer().is_none());
/// ```
pub fn create_shared_state<T: Clone + 'static>(initial: T) -> SharedState<T> {
    trace!(include_observer = false, "shared state created");
    SharedState {
        observer: Observer::new(initial),
        include_observer: false,
    }
}

/// Create a shared cell with explicit options.
///
/// In development builds the validator runs first and its error is returned
/// before any observer exists; debug subscribers are then installed. In
/// production builds both are skipped.
pub fn create_shared_state_with<T: Clone + 'static>(
    initial: T,
    options: SharedStateOptions<T>,
) -> Result<SharedState<T>> {
    let SharedStateOptions {
        include_observer,
        debug_subscribers,
        validator,
        build_mode,
    } = options;

    if !build_mode.is_production() {
        if let Some(validate) = &validator {
            validate(&initial).map_err(|reason| StateError::InvalidInitialValue { reason })?;
        }
    }

    let observer = Observer::new(initial);

    if !build_mode.is_production() {
        for subscriber in debug_subscribers {
            observer.subscribe_rc(subscriber);
        }
    }

    trace!(?build_mode, include_observer, "shared state created");

    Ok(SharedState {
        observer,
        include_observer,
    })
}

// =============================================================================
// TESTS
// =============================================================================
