// ============================================================================
// galactic-state - Ergonomic Macros
// ============================================================================

/// Clone handles into a `move` closure.
///
/// Shared cells, setters and components are cheap `Rc` handles; subscribers
/// and render closures usually want their own copy.
///
/// # Usage
///
/// ```rust
/// use galactic_state::{cloned, Observer};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let source = Observer::new(1);
/// let mirror = Observer::new(0);
/// let calls = Rc::new(Cell::new(0));
///
/// source.subscribe(cloned!(mirror, calls => move |n: &i32| {
///     mirror.set(*n);
///     calls.set(calls.get() + 1);
/// }));
///
/// source.set(7);
/// assert_eq!(mirror.get(), 7);
/// assert_eq!(calls.get(), 1);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}
