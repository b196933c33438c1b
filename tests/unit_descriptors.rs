//! Unit tests for ServiceDescriptor methods

use weave_di::{DiContainer, Key, Lifetime, ScopeKind, ServiceDescriptor};

#[test]
fn test_service_descriptor_service_name_unnamed() {
    let descriptor = ServiceDescriptor {
        key: Key::of::<String>(),
        lifetime: Lifetime::Singleton,
    };

    assert_eq!(descriptor.service_name(), None);
    assert!(!descriptor.is_named());
    assert_eq!(descriptor.type_name(), "alloc::string::String");
}

#[test]
fn test_service_descriptor_service_name_named() {
    let descriptor = ServiceDescriptor {
        key: Key::named::<u32>("database_port"),
        lifetime: Lifetime::Transient,
    };

    assert_eq!(descriptor.service_name(), Some("database_port"));
    assert!(descriptor.is_named());
    assert_eq!(descriptor.type_name(), "u32");
}

#[test]
fn test_descriptors_reflect_local_registrations_only() {
    let root = DiContainer::new();
    root.register_instance(1u8);
    let child = root.create_child();
    child.register_scoped_factory(ScopeKind::Session, |_| 2u16);
    child.register_singleton_factory(|_| 3u32);

    let mut descriptors = child.descriptors();
    descriptors.sort_by_key(|d| d.type_name());
    assert_eq!(
        descriptors,
        vec![
            ServiceDescriptor { key: Key::of::<u16>(), lifetime: Lifetime::Scoped(ScopeKind::Session) },
            ServiceDescriptor { key: Key::of::<u32>(), lifetime: Lifetime::Singleton },
        ]
    );
    assert!(Lifetime::Singleton.is_cached());
    assert!(!Lifetime::Transient.is_cached());
}
