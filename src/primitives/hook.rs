// ============================================================================
// galactic-state - Shared State Hook
//
// Binds the rendering component to an observer's value and lifecycle.
// ============================================================================
//
// First call in a component:
//   - local state starts from the observer's current value
//   - a subscription copies every new value into local state and
//     invalidates the component
//   - an unmount cleanup removes that subscription
// Every call returns (local value, setter); the setter goes straight to the
// observer, so all components bound to the cell see the same sequence of
// values.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::core::context::with_context;
use crate::core::error::{Result, StateError};
use crate::core::types::Update;
use crate::primitives::observer::Observer;

// =============================================================================
// SETTER
// =============================================================================

/// Write handle for a shared cell; every call forwards to the observer.
///
/// # Example
///
/// ```
/// use galactic_state::{Observer, Setter};
///
/// let cell = Observer::new(1);
/// let set = Setter::new(cell.clone());
///
/// set.set(2);
/// set.update(|n| n * 10);
/// assert_eq!(cell.get(), 20);
/// ```
///
/// A setter only writes. It never hands out the observer, so a cell built
/// without `include_observer` cannot be subscribed to through it:
///
/// ```compile_fail
/// use galactic_state::create_shared_state;
///
/// let state = create_shared_state(0);
/// let _observer = state.setter().observer();
/// ```
pub struct Setter<T> {
    observer: Observer<T>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            observer: self.observer.clone(),
        }
    }
}

impl<T: 'static> Setter<T> {
    /// Create a setter writing to `observer`
    pub fn new(observer: Observer<T>) -> Self {
        Self { observer }
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
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").finish_non_exhaustive()
    }
}

/// What a shared-state hook returns: the value for this render and a setter.
pub type HookPair<T> = (T, Setter<T>);

// =============================================================================
// HOOK SLOT
// =============================================================================

/// Per-component state behind one `use_shared` call.
struct SharedSlot<T> {
    /// Value this component renders with
    value: RefCell<T>,

    /// Cell the slot is bound to
    observer: Observer<T>,
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Bind the rendering component to `observer`.
///
/// Must run inside [`Component::render`](crate::Component::render);
/// returns `StateError::OutsideRender` otherwise. Hooks must be called in
/// the same order on every render; a slot previously bound to a different
/// observer yields `StateError::HookOrderMismatch`.
///
/// # Example
///
/// ```
/// use galactic_state::{use_shared, Component, Observer};
///
/// let theme = Observer::new("dark");
/// let header = Component::new();
///
/// let (value, _) = header.render(|| use_shared(&theme)).unwrap().unwrap();
/// assert_eq!(value, "dark");
///
/// theme.set("light");
/// let (value, _) = header.render(|| use_shared(&theme)).unwrap().unwrap();
/// assert_eq!(value, "light");
/// ```
pub fn use_shared<T: Clone + 'static>(observer: &Observer<T>) -> Result<HookPair<T>> {
    let component = with_context(|ctx| ctx.active_component()).ok_or(StateError::OutsideRender)?;

    let slot: Rc<SharedSlot<T>> = component.hook_slot(|component| {
        let slot = Rc::new(SharedSlot {
            value: RefCell::new(observer.get()),
            observer: observer.clone(),
        });

        let weak_slot = Rc::downgrade(&slot);
        let weak_component = Rc::downgrade(component);
        let id = observer.subscribe(move |value: &T| {
            if let Some(slot) = weak_slot.upgrade() {
                *slot.value.borrow_mut() = value.clone();
            }
            if let Some(component) = weak_component.upgrade() {
                component.invalidate();
            }
        });
        trace!(component = %component.id(), subscription = %id, "shared state bound");

        let observer = observer.clone();
        component.add_cleanup(Box::new(move || {
            observer.unsubscribe(id);
        }));

        slot
    })?;

    if !slot.observer.ptr_eq(observer) {
        return Err(StateError::HookOrderMismatch {
            index: component.last_hook_index(),
        });
    }

    let value = slot.value.borrow().clone();
    Ok((value, Setter::new(observer.clone())))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::component::Component;

    #[test]
    fn outside_render_is_an_error() {
        let obs = Observer::new(0);
        assert_eq!(use_shared(&obs).err(), Some(StateError::OutsideRender));
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn first_call_reads_current_value() {
        let obs = Observer::new(0);
        obs.set(3);
        obs.set(4);

        let component = Component::new();
        let (value, _) = component.render(|| use_shared(&obs)).unwrap().unwrap();
        assert_eq!(value, 4);
    }

    #[test]
    fn subscribes_once_per_component() {
        let obs = Observer::new(0);
        let component = Component::new();

        for _ in 0..3 {
            component.render(|| use_shared(&obs)).unwrap().unwrap();
        }

        assert_eq!(obs.subscriber_count(), 1);
        assert_eq!(component.hook_count(), 1);
    }

    #[test]
    fn update_marks_component_dirty_and_refreshes_value() {
        let obs = Observer::new(0);
        let component = Component::new();

        let (_, set) = component.render(|| use_shared(&obs)).unwrap().unwrap();
        assert!(!component.is_dirty());

        set.set(8);
        assert!(component.is_dirty());

        let (value, _) = component.render(|| use_shared(&obs)).unwrap().unwrap();
        assert_eq!(value, 8);
        assert!(!component.is_dirty());
    }

    #[test]
    fn unmount_releases_subscription() {
        let obs = Observer::new(0);
        let component = Component::new();
        component.render(|| use_shared(&obs)).unwrap().unwrap();
        assert_eq!(obs.subscriber_count(), 1);

        component.unmount();
        assert_eq!(obs.subscriber_count(), 0);

        // Updates after unmount touch nothing
        obs.set(1);
        assert!(!component.is_dirty());
    }

    #[test]
    fn two_cells_in_one_component() {
        let count = Observer::new(1);
        let label = Observer::new(String::from("a"));
        let component = Component::new();

        let render = || {
            let (n, _) = use_shared(&count)?;
            let (s, _) = use_shared(&label)?;
            Ok::<_, StateError>((n, s))
        };

        assert_eq!(component.render(render).unwrap().unwrap(), (1, "a".to_string()));

        count.set(2);
        label.set(String::from("b"));
        assert_eq!(component.render(render).unwrap().unwrap(), (2, "b".to_string()));
        assert_eq!(component.hook_count(), 2);
    }

    #[test]
    fn swapping_observers_between_renders_is_rejected() {
        let first = Observer::new(0);
        let second = Observer::new(0);
        let component = Component::new();

        component.render(|| use_shared(&first)).unwrap().unwrap();
        let result = component.render(|| use_shared(&second)).unwrap();

        assert_eq!(
            result.err(),
            Some(StateError::HookOrderMismatch { index: 0 })
        );
    }

    #[test]
    fn setter_during_render_leaves_component_dirty() {
        let obs = Observer::new(0);
        let component = Component::new();

        let value = component
            .render(|| {
                let (value, set) = use_shared(&obs)?;
                if value == 0 {
                    set.set(1);
                }
                Ok::<_, StateError>(value)
            })
            .unwrap()
            .unwrap();

        assert_eq!(value, 0);
        assert!(component.is_dirty());
        let (value, _) = component.render(|| use_shared(&obs)).unwrap().unwrap();
        assert_eq!(value, 1);
    }
}
