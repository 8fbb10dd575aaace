// ============================================================================
// galactic-state - Render Context
// Thread-local state for tracking which component is currently rendering
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::primitives::component::ComponentInner;

// =============================================================================
// RENDER CONTEXT
// =============================================================================

/// Thread-local render context.
///
/// Components render inside one another when a host renders children during
/// a parent's render, so the active component is a stack.
pub struct RenderContext {
    /// Components currently inside `render()`, innermost last
    component_stack: RefCell<Vec<Rc<ComponentInner>>>,

    /// Next component id to hand out
    next_component_id: Cell<u64>,
}

impl RenderContext {
    /// Create an empty render context
    pub fn new() -> Self {
        Self {
            component_stack: RefCell::new(Vec::new()),
            next_component_id: Cell::new(1),
        }
    }

    // =========================================================================
    // ACTIVE COMPONENT
    // =========================================================================

    /// Push a component that is starting to render
    pub(crate) fn push_component(&self, component: Rc<ComponentInner>) {
        self.component_stack.borrow_mut().push(component);
    }

    /// Pop the innermost rendering component
    pub(crate) fn pop_component(&self) -> Option<Rc<ComponentInner>> {
        self.component_stack.borrow_mut().pop()
    }

    /// The innermost rendering component, if any
    pub fn active_component(&self) -> Option<Rc<ComponentInner>> {
        self.component_stack.borrow().last().cloned()
    }

    /// Number of components currently rendering
    pub fn render_depth(&self) -> usize {
        self.component_stack.borrow().len()
    }

    // =========================================================================
    // IDS
    // =========================================================================

    /// Allocate the next component id
    pub fn allocate_component_id(&self) -> u64 {
        let id = self.next_component_id.get();
        self.next_component_id.set(id + 1);
        id
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The thread-local render context
    static CONTEXT: RenderContext = RenderContext::new();
}

/// Access the thread-local render context.
///
/// Outside the crate the context is read-only; only `Component::render`
/// pushes and pops the component stack:
///
/// ```compile_fail
/// galactic_state::with_context(|ctx| ctx.pop_component());
/// ```
pub fn with_context<R>(f: impl FnOnce(&RenderContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Check if a component is currently rendering on this thread
pub fn is_rendering() -> bool {
    with_context(|ctx| ctx.render_depth() > 0)
}

// =============================================================================
// TESTS
// =============================================================================
