// Cross-component behaviour of shared state cells.

use galactic_state::{
    cloned, create_shared_state, Component, RenderQueue, SharedState, StateError, Update,
};
use std::cell::RefCell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn read<T: Clone + 'static>(component: &Component, state: &SharedState<T>) -> T {
    component.render(|| state.use_state()).unwrap().unwrap().0
}

#[test]
fn test_setter_from_one_component_reaches_the_other() {
    init_tracing();
    let counter = create_shared_state(0);
    let first = Component::new();
    let second = Component::new();

    let (_, set_counter) = first.render(|| counter.use_state()).unwrap().unwrap();
    assert_eq!(read(&second, &counter), 0);

    set_counter.set(1);
    assert_eq!(read(&first, &counter), 1);
    assert_eq!(read(&second, &counter), 1);
}

#[test]
fn test_updater_receives_previous_value() {
    init_tracing();
    let counter = create_shared_state(1);
    let first = Component::new();
    let second = Component::new();

    let (_, set_counter) = first.render(|| counter.use_state()).unwrap().unwrap();
    read(&second, &counter);

    set_counter.update(|n| n + 1);
    set_counter.update(|n| n * 10);

    assert_eq!(read(&first, &counter), 20);
    assert_eq!(read(&second, &counter), 20);
}

#[test]
fn test_external_observer_sees_component_updates() {
    init_tracing();
    let counter = SharedState::builder(0)
        .include_observer(true)
        .build()
        .unwrap();
    let observer = counter.observer().unwrap();

    let calls = Rc::new(RefCell::new(Vec::new()));
    observer.subscribe(cloned!(calls => move |n: &i32| calls.borrow_mut().push(*n)));

    let first = Component::new();
    let second = Component::new();
    read(&second, &counter);

    first
        .render(|| {
            let (_, set_counter) = counter.use_state()?;
            set_counter.set(55);
            Ok::<_, StateError>(())
        })
        .unwrap()
        .unwrap();

    assert_eq!(*calls.borrow(), vec![55]);
    assert_eq!(read(&first, &counter), 55);
    assert_eq!(read(&second, &counter), 55);
}

#[test]
fn test_external_writes_schedule_every_bound_component() {
    init_tracing();
    let name = create_shared_state(String::from("anon"));
    let queue = RenderQueue::new();
    let header = Component::with_scheduler(queue.clone());
    let footer = Component::with_scheduler(queue.clone());
    let unrelated = Component::with_scheduler(queue.clone());

    read(&header, &name);
    read(&footer, &name);
    unrelated.render(|| ()).unwrap();

    name.set(String::from("ada"));
    assert_eq!(queue.drain(), vec![header.id(), footer.id()]);
    assert!(header.is_dirty());
    assert!(!unrelated.is_dirty());

    assert_eq!(read(&header, &name), "ada");
    assert!(!header.is_dirty());
}

#[test]
fn test_one_component_can_bind_several_cells() {
    init_tracing();
    let width = create_shared_state(10u32);
    let height = create_shared_state(5u32);
    let panel = Component::new();

    let area = |c: &Component| {
        c.render(|| -> Result<u32, StateError> {
            let (w, _) = width.use_state()?;
            let (h, _) = height.use_state()?;
            Ok(w * h)
        })
        .unwrap()
        .unwrap()
    };

    assert_eq!(area(&panel), 50);
    height.set(7);
    assert_eq!(area(&panel), 70);
    assert_eq!(panel.hook_count(), 2);
}

#[test]
fn test_function_values_are_stored_not_called() {
    init_tracing();
    fn double(n: i32) -> i32 {
        n * 2
    }
    fn triple(n: i32) -> i32 {
        n * 3
    }

    let op = create_shared_state(double as fn(i32) -> i32);
    let view = Component::new();

    let (current, set_op) = view.render(|| op.use_state()).unwrap().unwrap();
    assert_eq!(current(4), 8);

    set_op.dispatch(Update::Value(triple as fn(i32) -> i32));
    let current = read(&view, &op);
    assert_eq!(current(4), 12);
}

#[test]
fn test_hook_outside_render_is_an_error() {
    init_tracing();
    let counter = create_shared_state(0);
    assert_eq!(counter.use_state().err(), Some(StateError::OutsideRender));
}

#[test]
fn test_hook_order_mismatch_is_reported() {
    init_tracing();
    let a = create_shared_state(0);
    let b = create_shared_state(0);
    let view = Component::new();

    read(&view, &a);
    let swapped = view.render(|| b.use_state()).unwrap();
    assert_eq!(swapped.err(), Some(StateError::HookOrderMismatch { index: 0 }));
}
