//! Dynamic equality and hashing
//!
//! Trait objects have no `PartialEq` or `Hash` of their own. Traits which need them as
//! part of their contract extend [Object], which is implemented for every
//! `Eq + Hash` type. A [LazyProxy](crate::LazyProxy) compares and hashes by identity,
//! so through [Object] a proxy never equals its delegate nor any other proxy,
//! and comparing it never forces the delegate.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Equality and hashing usable through a trait object
pub trait Object: Any + Send + Sync {
    /// Compare with a value of any type, values of different types are never equal.
    ///
    /// Pass `other.as_any()` rather than `&other` to compare through a trait object.
    /// `Arc<T>` is itself an [Object] when `T` is `Eq + Hash`: call `as_any` on the
    /// pointee (`(*handle).as_any()`, or an `Arc<dyn Trait>` coercion) so that a handle
    /// compares as the value it points to.
    fn equals(&self, other: &dyn Any) -> bool;

    fn hash_code(&self) -> u64;

    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + Eq + Hash + Any + Send + Sync> Object for T {
    fn equals(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>() == Some(self)
    }

    fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
