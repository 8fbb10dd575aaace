use galactic_state::{
    create_shared_state, Component, Observer, RenderQueue, SharedState, StateError,
};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_unmount_releases_subscription() {
    let counter = create_shared_state(0);
    let view = Component::new();

    view.render(|| counter.use_state()).unwrap().unwrap();
    assert_eq!(counter.subscriber_count(), 1);

    view.unmount();
    assert_eq!(counter.subscriber_count(), 0);
    assert!(!view.is_mounted());

    // Writes after unmount reach nobody and do not fail
    counter.set(3);
    assert_eq!(counter.get(), 3);
}

#[test]
fn test_dropping_last_handle_unmounts() {
    let counter = create_shared_state(0);
    let cleaned = Rc::new(Cell::new(false));

    {
        let view = Component::new();
        view.render(|| counter.use_state()).unwrap().unwrap();
        let cleaned_clone = cleaned.clone();
        view.on_unmount(move || cleaned_clone.set(true));
        assert_eq!(counter.subscriber_count(), 1);
        // view drops here
    }

    assert!(cleaned.get(), "Dropping the component should run its cleanups");
    assert_eq!(counter.subscriber_count(), 0);
}

#[test]
fn test_clone_keeps_component_alive() {
    let counter = create_shared_state(0);
    let view = Component::new();
    let handle = view.clone();

    view.render(|| counter.use_state()).unwrap().unwrap();
    drop(view);

    assert!(handle.is_mounted());
    assert_eq!(counter.subscriber_count(), 1);
}

#[test]
fn test_render_after_unmount_fails() {
    let view = Component::new();
    view.unmount();
    view.unmount();

    let result = view.render(|| ());
    assert_eq!(result.err(), Some(StateError::Unmounted { id: view.id() }));
}

#[test]
fn test_unmounted_component_is_not_scheduled() {
    let counter = create_shared_state(0);
    let queue = RenderQueue::new();
    let kept = Component::with_scheduler(queue.clone());
    let gone = Component::with_scheduler(queue.clone());

    kept.render(|| counter.use_state()).unwrap().unwrap();
    gone.render(|| counter.use_state()).unwrap().unwrap();
    gone.unmount();

    counter.set(1);
    assert_eq!(queue.drain(), vec![kept.id()]);
}

#[test]
fn test_cleanups_run_in_reverse_order() {
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));
    let view = Component::new();

    for label in ["first", "second", "third"] {
        let order = order.clone();
        view.on_unmount(move || order.borrow_mut().push(label));
    }

    view.unmount();
    assert_eq!(*order.borrow(), vec!["third", "second", "first"]);
}

#[test]
fn test_scoped_subscription_drop_unsubscribes() {
    let observer = Observer::new(0);
    let hits = Rc::new(Cell::new(0));

    {
        let hits_clone = hits.clone();
        let _guard = observer.subscribe_scoped(move |_| hits_clone.set(hits_clone.get() + 1));
        observer.set(1);
        assert_eq!(hits.get(), 1);
    }

    observer.set(2);
    assert_eq!(hits.get(), 1, "Subscription guard should unsubscribe on drop");
    assert_eq!(observer.subscriber_count(), 0);
}

#[test]
fn test_scoped_subscription_outliving_observer() {
    let guard = {
        let observer = Observer::new(0);
        observer.subscribe_scoped(|_| {})
    };
    // Observer already gone; releasing must be harmless
    guard.unsubscribe();
}

#[test]
fn test_cell_outlives_components_and_factory_scope() {
    let (observer, setter) = {
        let counter = SharedState::builder(1)
            .include_observer(true)
            .build()
            .unwrap();
        let view = Component::new();
        let (_, set) = view.render(|| counter.use_state()).unwrap().unwrap();
        (counter.observer().unwrap(), set)
    };

    setter.update(|n| n + 1);
    assert_eq!(observer.get(), 2);
    assert_eq!(observer.subscriber_count(), 0);
}
