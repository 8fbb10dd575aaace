// ============================================================================
// galactic-state - Render Scheduling
// How a component asks its host to render it again
// ============================================================================
//
// Shared-state updates never render anything themselves. When a cell changes,
// each subscribed component marks itself dirty and hands its id to a
// Scheduler. The host decides when (and how often) to actually re-render.
// RenderQueue is a ready-made scheduler that collects ids for the host to
// drain, coalescing repeated requests for the same component.
// ============================================================================

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::core::types::ComponentId;

// =============================================================================
// SCHEDULER TRAIT
// =============================================================================

/// Receives re-render requests for components.
pub trait Scheduler {
    /// Request that component `id` be rendered again.
    fn schedule_render(&self, id: ComponentId);
}

impl<F: Fn(ComponentId)> Scheduler for F {
    fn schedule_render(&self, id: ComponentId) {
        self(id)
    }
}

// =============================================================================
// RENDER QUEUE
// =============================================================================

#[derive(Default)]
struct RenderQueueInner {
    order: VecDeque<ComponentId>,
    queued: HashSet<ComponentId>,
}

/// A FIFO of components waiting to re-render, without duplicates.
///
/// Clones share the same queue.
///
/// # Example
///
/// ```
/// use galactic_state::{create_shared_state, Component, RenderQueue};
///
/// let queue = RenderQueue::new();
/// let counter = create_shared_state(0);
///
/// let view = Component::with_scheduler(queue.clone());
/// view.render(|| counter.use_state()).unwrap().unwrap();
///
/// counter.set(1);
/// counter.set(2);
///
/// // Two updates, one pending render
/// assert_eq!(queue.drain(), vec![view.id()]);
/// ```
#[derive(Clone, Default)]
pub struct RenderQueue {
    inner: Rc<RefCell<RenderQueueInner>>,
}

impl RenderQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of components waiting
    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().order.is_empty()
    }

    /// Whether `id` is waiting
    pub fn contains(&self, id: ComponentId) -> bool {
        self.inner.borrow().queued.contains(&id)
    }

    /// Snapshot of waiting components, oldest first
    pub fn pending(&self) -> Vec<ComponentId> {
        self.inner.borrow().order.iter().copied().collect()
    }

    /// Take every waiting component, oldest first
    pub fn drain(&self) -> Vec<ComponentId> {
        let mut inner = self.inner.borrow_mut();
        inner.queued.clear();
        inner.order.drain(..).collect()
    }
}

impl Scheduler for RenderQueue {
    fn schedule_render(&self, id: ComponentId) {
        let mut inner = self.inner.borrow_mut();
        if inner.queued.insert(id) {
            inner.order.push_back(id);
            trace!(%id, pending = inner.order.len(), "render scheduled");
        }
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
