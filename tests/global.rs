//! Tests touching the process-wide default container.
//!
//! Every test here is `#[serial]` and resets the default on entry.

use weave_di::{Container, DiContainer, DiError, Inject, Module, Resolver};
use serial_test::serial;
use std::sync::Arc;

struct AppName(&'static str);

#[test]
#[serial]
fn shared_before_bootstrap_is_an_error() {
    DiContainer::reset_shared();
    assert!(!DiContainer::is_bootstrapped());
    assert!(matches!(DiContainer::shared_bootstrapped(), Err(DiError::NotBootstrapped)));

    // The plain accessor still hands out the empty default
    assert!(DiContainer::shared().is_empty());
}

#[test]
#[serial]
fn bootstrap_installs_and_flags_default() {
    DiContainer::reset_shared();
    let installed = DiContainer::bootstrap(|c| {
        c.register_instance(AppName("weave"));
    });

    let shared = DiContainer::shared_bootstrapped().unwrap();
    assert!(shared.ptr_eq(&installed));
    assert_eq!(shared.resolve::<AppName>().unwrap().0, "weave");

    DiContainer::reset_shared();
    assert!(DiContainer::shared_bootstrapped().is_err());
    assert!(DiContainer::shared().resolve_with::<AppName>(false).is_none());
}

#[test]
#[serial]
fn set_shared_returns_previous() {
    DiContainer::reset_shared();
    let first = DiContainer::new();
    let second = DiContainer::new();

    DiContainer::set_shared(first.clone());
    let previous = DiContainer::set_shared(second.clone());
    assert!(previous.ptr_eq(&first));
    assert!(DiContainer::shared().ptr_eq(&second));
    DiContainer::reset_shared();
}

#[test]
#[serial]
fn builder_without_target_uses_shared_at_build_time() {
    DiContainer::reset_shared();
    let mut builder = Container::new();
    builder.register(Module::new(|_| AppName("late bound")));

    // Swapped after the builder was created
    let target = DiContainer::new();
    DiContainer::set_shared(target.clone());

    builder.build().into_result().unwrap();
    assert_eq!(target.resolve::<AppName>().unwrap().0, "late bound");
    DiContainer::reset_shared();
}

#[test]
#[serial]
fn inject_reads_from_shared_default() {
    DiContainer::reset_shared();
    let field: Inject<AppName> = Inject::new();
    assert!(field.get().is_none());

    DiContainer::bootstrap(|c| {
        c.register_instance(AppName("injected"));
    });
    let first = field.get().unwrap();
    assert_eq!(first.0, "injected");

    // Kept even after the default is replaced
    DiContainer::reset_shared();
    assert!(Arc::ptr_eq(&field.get().unwrap(), &first));
}

#[test]
#[serial]
fn concurrent_readers_see_whole_containers() {
    DiContainer::reset_shared();
    let a = DiContainer::new();
    a.register_instance(1u8);
    let b = DiContainer::new();
    b.register_instance(2u8);

    crossbeam_utils::thread::scope(|s| {
        s.spawn(|_| {
            for i in 0..200 {
                DiContainer::set_shared(if i % 2 == 0 { a.clone() } else { b.clone() });
            }
        });
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..200 {
                    let value = DiContainer::shared().resolve_with::<u8>(false);
                    if let Some(v) = value {
                        assert!(*v == 1 || *v == 2);
                    }
                }
            });
        }
    })
    .unwrap();
    DiContainer::reset_shared();
}
