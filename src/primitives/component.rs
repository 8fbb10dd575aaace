// ============================================================================
// galactic-state - Component
//
// A mounted component instance: hook slots, unmount cleanups, dirty flag.
// ============================================================================
//
// This is the minimal lifecycle a host needs to drive hooks:
// - render(f) - run f with this component active, so hooks can find it
// - unmount() - run cleanups (in reverse order) and release hook state
// - invalidate() - mark dirty and ask the scheduler for a re-render
//
// Hooks claim slots by call order. The first render creates the slots;
// later renders get the same slots back in the same order.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::core::constants::*;
use crate::core::context::with_context;
use crate::core::error::{Result, StateError};
use crate::core::types::{CleanupFn, ComponentId};
use crate::reactivity::scheduling::Scheduler;

// =============================================================================
// COMPONENT INNER
// =============================================================================

/// Internal component implementation
pub struct ComponentInner {
    /// Id, unique per thread
    id: ComponentId,

    /// Status flags (MOUNTED, DIRTY, RENDERING, UNMOUNTED)
    flags: Cell<u32>,

    /// Hook state, indexed by call order
    hooks: RefCell<Vec<Rc<dyn Any>>>,

    /// Index of the next hook slot during a render
    cursor: Cell<usize>,

    /// Cleanup functions to run on unmount
    cleanups: RefCell<Vec<CleanupFn>>,

    /// Where re-render requests go
    scheduler: Option<Box<dyn Scheduler>>,

    /// Completed renders
    render_count: Cell<u64>,
}

impl ComponentInner {
    fn new(scheduler: Option<Box<dyn Scheduler>>) -> Rc<Self> {
        let id = ComponentId(with_context(|ctx| ctx.allocate_component_id()));
        trace!(%id, "component mounted");

        Rc::new(Self {
            id,
            flags: Cell::new(MOUNTED),
            hooks: RefCell::new(Vec::new()),
            cursor: Cell::new(0),
            cleanups: RefCell::new(Vec::new()),
            scheduler,
            render_count: Cell::new(0),
        })
    }

    /// Component id
    pub fn id(&self) -> ComponentId {
        self.id
    }

    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flag(&self, flag: u32) {
        self.flags.set(self.flags.get() | flag);
    }

    fn clear_flag(&self, flag: u32) {
        self.flags.set(self.flags.get() & !flag);
    }

    /// Whether the component is still mounted
    pub fn is_mounted(&self) -> bool {
        self.flags() & MOUNTED != 0
    }

    /// Whether `render` is running for this component
    pub fn is_rendering(&self) -> bool {
        self.flags() & RENDERING != 0
    }

    /// Whether a re-render has been requested since the last render started
    pub fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    /// Mark dirty and forward a re-render request to the scheduler.
    pub fn invalidate(&self) {
        if !self.is_mounted() {
            return;
        }

        self.set_flag(DIRTY);
        if let Some(scheduler) = &self.scheduler {
            scheduler.schedule_render(self.id);
        }
    }

    /// Register a cleanup to run on unmount
    pub fn add_cleanup(&self, cleanup: CleanupFn) {
        if !self.is_mounted() {
            // Already torn down: run it now so nothing leaks
            cleanup();
            return;
        }
        self.cleanups.borrow_mut().push(cleanup);
    }

    /// Claim the next hook slot, creating it with `init` on first use.
    ///
    /// Fails with `HookOrderMismatch` when the slot holds another hook's state.
    pub(crate) fn hook_slot<S: 'static>(
        self: &Rc<Self>,
        init: impl FnOnce(&Rc<Self>) -> Rc<S>,
    ) -> Result<Rc<S>> {
        let index = self.cursor.get();
        self.cursor.set(index + 1);

        let existing = self.hooks.borrow().get(index).cloned();
        match existing {
            Some(slot) => slot
                .downcast::<S>()
                .map_err(|_| StateError::HookOrderMismatch { index }),
            None => {
                // `init` may register cleanups, so no borrow is held here
                let slot = init(self);
                self.hooks.borrow_mut().push(slot.clone() as Rc<dyn Any>);
                trace!(id = %self.id, index, "hook slot created");
                Ok(slot)
            }
        }
    }

    /// Index of the slot claimed by the most recent hook call
    pub(crate) fn last_hook_index(&self) -> usize {
        self.cursor.get().saturating_sub(1)
    }

    /// Number of hook slots
    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }

    /// Tear the component down: run cleanups and drop hook state.
    pub fn unmount(&self) {
        if !self.is_mounted() {
            return;
        }

        self.flags.set((self.flags() & !LIFECYCLE_MASK & !DIRTY) | UNMOUNTED);

        // Cleanups run in reverse order for proper nesting
        let cleanups: Vec<_> = self.cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups.into_iter().rev() {
            if catch_unwind(AssertUnwindSafe(cleanup)).is_err() {
                warn!(id = %self.id, "cleanup panicked during unmount");
            }
        }

        self.hooks.borrow_mut().clear();
        trace!(id = %self.id, "component unmounted");
    }
}

impl Drop for ComponentInner {
    fn drop(&mut self) {
        // Ensures subscriptions are released even without an explicit unmount
        if self.is_mounted() {
            self.unmount();
        }
    }
}

/// Pops the render context even if the render function panics.
struct RenderGuard<'a> {
    inner: &'a ComponentInner,
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        with_context(|ctx| ctx.pop_component());
        self.inner.clear_flag(RENDERING);
    }
}

// =============================================================================
// COMPONENT (Public wrapper)
// =============================================================================

/// A mounted component instance that hooks attach to.
///
/// The component is mounted from creation until [`unmount`](Self::unmount)
/// is called or the last handle is dropped.
///
/// # Example
///
/// ```
/// use galactic_state::{create_shared_state, Component};
///
/// let counter = create_shared_state(0);
/// let view = Component::new();
///
/// let (value, set_value) = view.render(|| counter.use_state()).unwrap().unwrap();
/// assert_eq!(value, 0);
///
/// set_value.update(|n| n + 1);
/// assert!(view.is_dirty());
///
/// let (value, _) = view.render(|| counter.use_state()).unwrap().unwrap();
/// assert_eq!(value, 1);
///
/// view.unmount();
/// assert_eq!(counter.subscriber_count(), 0);
/// ```
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Create a component without a scheduler.
    ///
    /// Updates still mark it dirty; the host polls [`is_dirty`](Self::is_dirty).
    pub fn new() -> Self {
        Self {
            inner: ComponentInner::new(None),
        }
    }

    /// Create a component that sends re-render requests to `scheduler`.
    pub fn with_scheduler(scheduler: impl Scheduler + 'static) -> Self {
        Self {
            inner: ComponentInner::new(Some(Box::new(scheduler))),
        }
    }

    fn from_inner(inner: Rc<ComponentInner>) -> Self {
        Self { inner }
    }

    /// Component id
    pub fn id(&self) -> ComponentId {
        self.inner.id()
    }

    /// Whether the component is still mounted
    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Whether a re-render has been requested since the last render started
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    /// Whether this component is inside [`render`](Self::render)
    pub fn is_rendering(&self) -> bool {
        self.inner.is_rendering()
    }

    /// Number of completed renders
    pub fn render_count(&self) -> u64 {
        self.inner.render_count.get()
    }

    /// Number of hook slots claimed so far
    pub fn hook_count(&self) -> usize {
        self.inner.hook_count()
    }

    /// Render: run `f` with this component active.
    ///
    /// Hooks called inside `f` bind to this component. Returns
    /// `StateError::Unmounted` once the component has been torn down, and
    /// `StateError::AlreadyRendering` when called from inside this
    /// component's own render; the component is then left dirty for the
    /// host to render again afterwards.
    pub fn render<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        let inner = &self.inner;
        if !inner.is_mounted() {
            return Err(StateError::Unmounted { id: inner.id });
        }
        if inner.is_rendering() {
            trace!(id = %inner.id, "nested render rejected");
            return Err(StateError::AlreadyRendering { id: inner.id });
        }

        inner.cursor.set(0);
        // Updates that land during the render leave the component dirty
        inner.clear_flag(DIRTY);
        inner.set_flag(RENDERING);

        with_context(|ctx| ctx.push_component(inner.clone()));
        let guard = RenderGuard { inner };
        let result = f();
        drop(guard);

        let count = inner.render_count.get() + 1;
        inner.render_count.set(count);
        trace!(id = %inner.id, count, "component rendered");

        Ok(result)
    }

    /// Mark dirty and ask the scheduler for a re-render.
    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    /// Register a cleanup to run on unmount.
    ///
    /// On an already unmounted component the cleanup runs immediately.
    pub fn on_unmount(&self, f: impl FnOnce() + 'static) {
        self.inner.add_cleanup(Box::new(f));
    }

    /// Tear down: run cleanups in reverse order and release hook state.
    ///
    /// Calling it again is a no-op.
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    pub(crate) fn inner(&self) -> &Rc<ComponentInner> {
        &self.inner
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.inner.id)
            .field("mounted", &self.inner.is_mounted())
            .field("dirty", &self.inner.is_dirty())
            .field("hooks", &self.inner.hook_count())
            .finish()
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// The component currently rendering on this thread, if any.
pub fn current_component() -> Option<Component> {
    with_context(|ctx| ctx.active_component()).map(Component::from_inner)
}

// =============================================================================
// TESTS
// =============================================================================
