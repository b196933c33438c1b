use weave_di::{Container, DiContainer, DiError, Module, Resolver, ServiceModule};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// Distinct type per slot so every module registers its own key
struct Slot<const N: usize>(usize);

macro_rules! slot_modules {
    ($builder:expr; $($n:literal)*) => {
        $( $builder.register(Module::new(|_| Slot::<$n>($n))); )*
    };
}

macro_rules! assert_slots {
    ($target:expr; $($n:literal)*) => {
        $( assert_eq!($target.resolve::<Slot<$n>>().expect("slot registered").0, $n); )*
    };
}

#[test]
fn build_registers_one_hundred_distinct_modules() {
    let target = DiContainer::new();
    let mut builder = Container::for_container(target.clone());
    slot_modules!(builder;
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19
        20 21 22 23 24 25 26 27 28 29 30 31 32 33 34 35 36 37 38 39
        40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
        60 61 62 63 64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79
        80 81 82 83 84 85 86 87 88 89 90 91 92 93 94 95 96 97 98 99);
    assert_eq!(builder.len(), 100);

    let report = builder.build();
    assert_eq!(report.submitted, 100);
    assert_eq!(report.registered, 100);
    assert!(report.is_success());
    assert!(builder.is_empty());
    assert_eq!(target.len(), 100);

    assert_slots!(target;
        0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19
        20 21 22 23 24 25 26 27 28 29 30 31 32 33 34 35 36 37 38 39
        40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59
        60 61 62 63 64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79
        80 81 82 83 84 85 86 87 88 89 90 91 92 93 94 95 96 97 98 99);
}

#[test]
fn build_with_many_named_modules() {
    const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

    let target = DiContainer::new();
    let mut builder = Container::for_container(target.clone());
    for (i, &name) in NAMES.iter().enumerate() {
        builder.register(Module::named(name, move |_| i));
    }

    builder.build().into_result().unwrap();
    for (i, &name) in NAMES.iter().enumerate() {
        assert_eq!(*target.resolve_named::<usize>(name).unwrap(), i);
    }
}

#[test]
fn each_producer_runs_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let target = DiContainer::new();
    let mut builder = Container::for_container(target.clone());

    let c = calls.clone();
    builder.register(Module::new(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        String::from("built")
    }));
    builder.build();

    for _ in 0..5 {
        assert_eq!(target.resolve::<String>().unwrap().as_str(), "built");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn producers_can_use_prerequisites_already_in_target() {
    struct Config {
        url: String,
    }
    struct Client {
        url: String,
    }

    let target = DiContainer::new();
    target.register_instance(Config { url: "http://api".into() });

    let mut builder = Container::for_container(target.clone());
    builder.register(Module::new(|ctx| Client {
        url: ctx.resolve::<Config>().unwrap().url.clone(),
    }));
    builder.build();

    assert_eq!(target.resolve::<Client>().unwrap().url, "http://api");
}

#[test]
fn failures_do_not_stop_other_modules() {
    let target = DiContainer::new();
    let mut builder = Container::for_container(target.clone());
    builder
        .register(Module::new(|_| 1u8))
        .register(Module::try_new::<u16, _>(|_| Err(DiError::Configuration("missing key".into()))))
        .register(Module::from_arc(Arc::new(3u32)));

    let report = builder.build();
    assert_eq!(report.registered, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        DiError::RegistrationFailed { service: "u16", reason } if reason.contains("missing key")
    ));

    assert!(target.resolve::<u8>().is_some());
    assert!(target.resolve::<u32>().is_some());
    assert!(target.resolve_with::<u16>(false).is_none());
}

#[test]
fn groups_and_trait_objects() {
    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }
    struct Fixed(u64);
    impl Clock for Fixed {
        fn now(&self) -> u64 {
            self.0
        }
    }

    struct TimeModule;
    impl ServiceModule for TimeModule {
        fn modules(self) -> Vec<Module> {
            vec![
                Module::from_arc::<dyn Clock>(Arc::new(Fixed(1_700_000_000))),
                Module::named("tz", |_| "UTC".to_string()),
            ]
        }
    }

    let target = DiContainer::new();
    let mut builder = Container::for_container(target.clone());
    builder.add_group(TimeModule).add_group(vec![Module::new(|_| 5i64)]);
    assert_eq!(builder.len(), 3);

    builder.build().into_result().unwrap();
    assert_eq!(target.resolve::<dyn Clock>().unwrap().now(), 1_700_000_000);
    assert_eq!(target.resolve_named::<String>("tz").unwrap().as_str(), "UTC");
    assert_eq!(*target.resolve::<i64>().unwrap(), 5);
}

#[test]
fn module_exposes_its_key() {
    let module = Module::named("port", |_| 8080u16);
    assert_eq!(module.key(), &weave_di::Key::named::<u16>("port"));
    assert!(format!("{:?}", module).contains("u16"));
}
