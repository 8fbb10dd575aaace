// ============================================================================
// galactic-state - Shared State Cells for Component Trees
// ============================================================================
//
// One cell, many components. A shared cell is an Observer (value + subscriber
// set) plus a hook that binds rendering components to it. Any component, or
// code outside the tree, can update the cell; every bound component picks up
// the new value and is scheduled to re-render.
// ============================================================================

//! Shared, cross-component state cells.
//!
//! [`create_shared_state`] returns a [`SharedState`]: call
//! [`use_state`](SharedState::use_state) inside [`Component::render`] to get
//! the current value and a [`Setter`]; call [`set`](SharedState::set) or
//! [`update`](SharedState::update) from anywhere. The underlying
//! [`Observer`] is a plain publish-subscribe cell usable on its own.
//!
//! ```
//! use galactic_state::{create_shared_state, Component, RenderQueue};
//!
//! let counter = create_shared_state(0);
//! let queue = RenderQueue::new();
//! let a = Component::with_scheduler(queue.clone());
//! let b = Component::with_scheduler(queue.clone());
//!
//! let (_, set_counter) = a.render(|| counter.use_state()).unwrap().unwrap();
//! b.render(|| counter.use_state()).unwrap().unwrap();
//!
//! set_counter.update(|n| n + 1);
//! assert_eq!(queue.drain(), vec![a.id(), b.id()]);
//!
//! let (value, _) = b.render(|| counter.use_state()).unwrap().unwrap();
//! assert_eq!(value, 1);
//! ```

#[macro_use]
mod macros;

pub mod core;
pub mod primitives;
pub mod reactivity;

#[cfg(feature = "sync")]
pub mod sync;

// Re-export core items at crate root for ergonomic access
pub use self::core::constants;
pub use self::core::context::{is_rendering, with_context, RenderContext};
pub use self::core::error::{Result, StateError};
pub use self::core::types::{
    CleanupFn, ComponentId, SubscriberFn, SubscriptionId, Update, UpdaterFn, ValidatorFn,
};

// Re-export primitives at crate root
pub use primitives::component::{current_component, Component};
pub use primitives::hook::{use_shared, HookPair, Setter};
pub use primitives::observer::{Observer, Subscription};
pub use primitives::shared::{
    create_shared_state, create_shared_state_with, BuildMode, SharedState, SharedStateBuilder,
    SharedStateOptions,
};

// Re-export scheduling
pub use reactivity::scheduling::{RenderQueue, Scheduler};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn scenario_two_components_follow_setter() {
        let counter = create_shared_state(0);
        let a = Component::new();
        let b = Component::new();

        let (va, set) = a.render(|| counter.use_state()).unwrap().unwrap();
        let (vb, _) = b.render(|| counter.use_state()).unwrap().unwrap();
        assert_eq!((va, vb), (0, 0));

        set.set(1);
        let (va, _) = a.render(|| counter.use_state()).unwrap().unwrap();
        let (vb, _) = b.render(|| counter.use_state()).unwrap().unwrap();
        assert_eq!((va, vb), (1, 1));

        set.update(|old| old + 1);
        let (va, _) = a.render(|| counter.use_state()).unwrap().unwrap();
        let (vb, _) = b.render(|| counter.use_state()).unwrap().unwrap();
        assert_eq!((va, vb), (2, 2));
    }

    #[test]
    fn scenario_external_spy_on_observer() {
        let counter = SharedState::builder(0).include_observer(true).build().unwrap();
        let observer = counter.observer().unwrap();

        let a = Component::new();
        let b = Component::new();
        a.render(|| counter.use_state()).unwrap().unwrap();
        b.render(|| counter.use_state()).unwrap().unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        let spy = cloned!(calls => move |n: &i32| calls.borrow_mut().push(*n));
        observer.subscribe(spy);

        a.render(|| {
            let (_, set) = counter.use_state()?;
            set.set(55);
            Ok::<_, StateError>(())
        })
        .unwrap()
        .unwrap();

        assert_eq!(*calls.borrow(), vec![55]);
        let (va, _) = a.render(|| counter.use_state()).unwrap().unwrap();
        let (vb, _) = b.render(|| counter.use_state()).unwrap().unwrap();
        assert_eq!((va, vb), (55, 55));
    }

    #[test]
    fn reexports_are_usable_from_root() {
        let observer: Observer<u8> = Observer::new(1);
        let setter = Setter::new(observer.clone());
        setter.dispatch(Update::Value(2));
        assert_eq!(observer.get(), 2);
        assert!(!is_rendering());
        assert_eq!(constants::MOUNTED & constants::UNMOUNTED, 0);
    }
}
