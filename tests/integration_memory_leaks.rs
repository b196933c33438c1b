//! Memory management integration tests
//!
//! Registered values are plain `Arc`s: they are dropped when the last of
//! the container entry and the resolved handles goes away. Neither parent
//! nor children links keep a container alive.

use weave_di::{DiContainer, Resolver, ScopeContext, ScopeKind};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Tracked {
    drops: Arc<AtomicU32>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(drops: &Arc<AtomicU32>) -> Tracked {
    Tracked { drops: drops.clone() }
}

#[test]
fn test_release_drops_instance_once_unshared() {
    let drops = Arc::new(AtomicU32::new(0));
    let container = DiContainer::new();
    container.register_instance(tracked(&drops));

    let held = container.resolve::<Tracked>().unwrap();
    container.release::<Tracked>();
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(held);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_replacing_registration_drops_old_value() {
    let drops = Arc::new(AtomicU32::new(0));
    let container = DiContainer::new();
    container.register_instance(tracked(&drops));
    container.register_instance(tracked(&drops));
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    container.remove_all();
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}

#[test]
fn test_transient_values_are_not_retained() {
    let drops = Arc::new(AtomicU32::new(0));
    let container = DiContainer::new();
    let d = drops.clone();
    container.register_factory(move |_| tracked(&d));

    for _ in 0..10 {
        container.resolve::<Tracked>().unwrap();
    }
    assert_eq!(drops.load(Ordering::SeqCst), 10);
}

#[test]
fn test_end_scope_drops_scoped_values() {
    let drops = Arc::new(AtomicU32::new(0));
    let scopes = Arc::new(ScopeContext::new());
    let container = DiContainer::with_scope_context(scopes.clone());
    let d = drops.clone();
    container.register_scoped_factory(ScopeKind::Request, move |_| tracked(&d));

    scopes.set_current(ScopeKind::Request, "r");
    container.resolve::<Tracked>().unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    container.end_scope(ScopeKind::Request);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dropping_a_child_frees_it_while_root_lives() {
    let drops = Arc::new(AtomicU32::new(0));
    let root = DiContainer::new();
    root.register_instance(tracked(&drops));
    {
        let child = root.create_child();
        child.register_instance(tracked(&drops));
        let grandchild = child.create_child();
        grandchild.register_singleton_factory({
            let d = drops.clone();
            move |_| tracked(&d)
        });
        grandchild.resolve::<Tracked>().unwrap();
    }
    // Child and grandchild went with their last handles
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert_eq!(root.child_count(), 0);

    drop(root);
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

#[test]
fn test_per_request_children_do_not_accumulate() {
    let drops = Arc::new(AtomicU32::new(0));
    let root = DiContainer::new();

    for _ in 0..1000 {
        let child = root.create_child();
        child.register_instance(tracked(&drops));
        drop(child);
    }

    assert_eq!(drops.load(Ordering::SeqCst), 1000);
    assert_eq!(root.child_count(), 0);
}

#[test]
fn test_cleared_scopes_release_instances() {
    let drops = Arc::new(AtomicU32::new(0));
    let scopes = Arc::new(ScopeContext::new());
    let container = DiContainer::with_scope_context(scopes.clone());
    let d = drops.clone();
    container.register_scoped_factory(ScopeKind::Request, move |_| tracked(&d));

    for i in 0..100 {
        scopes.set_current(ScopeKind::Request, format!("req-{}", i));
        container.resolve::<Tracked>().unwrap();
        scopes.clear(ScopeKind::Request);
    }

    assert_eq!(drops.load(Ordering::SeqCst), 100);
}

#[test]
fn test_singleton_factory_value_is_dropped_with_container() {
    let drops = Arc::new(AtomicU32::new(0));
    let container = DiContainer::new();
    let d = drops.clone();
    container.register_singleton_factory(move |_| tracked(&d));

    let a = container.resolve::<Tracked>().unwrap();
    drop(container);
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(a);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
