//! Service identity keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Key for service storage and lookup.
///
/// A key identifies one logical service contract: the `TypeId` of the
/// requested shape (a concrete type or an unsized `dyn Trait`), plus an
/// optional registration name for keeping several registrations of the
/// same type apart.
///
/// Equality and hashing only look at the `TypeId` and the name. The type
/// name travels along for diagnostics and error messages.
///
/// # Examples
///
/// ```rust
/// use weave_di::Key;
///
/// trait Logger: Send + Sync {}
///
/// assert_eq!(Key::of::<String>(), Key::of::<String>());
/// assert_ne!(Key::of::<String>(), Key::of::<u32>());
/// assert_ne!(Key::of::<u32>(), Key::named::<u32>("port"));
///
/// let logger = Key::of::<dyn Logger>();
/// assert!(logger.display_name().contains("Logger"));
/// assert_eq!(Key::named::<u32>("port").service_name(), Some("port"));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl Key {
    /// Key for the unnamed registration of `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Key {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for the registration of `T` under `name`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Key {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: Some(name),
        }
    }

    /// The `TypeId` of the service shape.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        self.type_name
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.name
    }

    /// True when this key describes the shape `T`, whatever its name.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "Key({} #{})", self.type_name, name),
            None => write!(f, "Key({})", self.type_name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} ({})", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

// Helper function for creating type keys
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
