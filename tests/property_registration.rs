//! Property-based tests for service registration
//!
//! These tests use proptest to generate random inputs and verify invariants
//! that should hold for all valid service registrations.

use weave_di::{Container, DiContainer, Module, Resolver};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct TestService {
    id: u32,
}

const NAMES: [&str; 6] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

// Property: any sequence of registrations for one key leaves exactly the last one
proptest! {
    #[test]
    fn last_registration_wins(ids in prop::collection::vec(0u32..1000, 1..10), factory_last in any::<bool>()) {
        let container = DiContainer::new();
        let (last, rest) = ids.split_last().unwrap();
        for id in rest {
            container.register_instance(TestService { id: *id });
        }
        let last = *last;
        if factory_last {
            container.register_factory(move |_| TestService { id: last });
        } else {
            container.register_instance(TestService { id: last });
        }

        prop_assert_eq!(container.len(), 1);
        prop_assert_eq!(container.resolve::<TestService>().unwrap().id, last);
    }
}

// Property: named registrations never interfere with each other or the unnamed one
proptest! {
    #[test]
    fn named_registrations_are_independent(values in prop::collection::vec(any::<i64>(), NAMES.len())) {
        let container = DiContainer::new();
        container.register_instance(-1i64);
        for (&name, value) in NAMES.iter().zip(&values) {
            container.register_named_instance(name, *value);
        }

        prop_assert_eq!(*container.resolve::<i64>().unwrap(), -1);
        for (&name, value) in NAMES.iter().zip(&values) {
            prop_assert_eq!(*container.resolve_named::<i64>(name).unwrap(), *value);
        }
        prop_assert_eq!(container.len(), NAMES.len() + 1);
    }
}

// Property: releasing a subset removes exactly that subset
proptest! {
    #[test]
    fn release_removes_exactly_released(mask in prop::collection::vec(any::<bool>(), NAMES.len())) {
        let container = DiContainer::new();
        for (i, &name) in NAMES.iter().enumerate() {
            container.register_named_instance(name, i);
        }

        for (&name, release) in NAMES.iter().zip(&mask) {
            if *release {
                prop_assert!(container.release_named::<usize>(name));
            }
        }

        for (&name, released) in NAMES.iter().zip(&mask) {
            prop_assert_eq!(container.resolve_named::<usize>(name).is_none(), *released);
        }
    }
}

// Property: a build reports every module, and the successful ones are resolvable
proptest! {
    #[test]
    fn build_accounts_for_every_module(outcomes in prop::collection::vec(any::<bool>(), 0..NAMES.len())) {
        let target = DiContainer::new();
        let mut builder = Container::for_container(target.clone());
        for (i, ok) in outcomes.iter().copied().enumerate() {
            builder.register(Module::named(NAMES[i], move |_| {
                if !ok {
                    panic!("module {} refused", i);
                }
                i
            }));
        }

        let report = builder.build();
        let expected_ok = outcomes.iter().filter(|ok| **ok).count();
        prop_assert_eq!(report.submitted, outcomes.len());
        prop_assert_eq!(report.registered, expected_ok);
        prop_assert_eq!(report.failures.len(), outcomes.len() - expected_ok);

        for (i, ok) in outcomes.iter().enumerate() {
            prop_assert_eq!(target.resolve_named::<usize>(NAMES[i]).is_some(), *ok);
        }
    }
}
