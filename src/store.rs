//! Heterogeneous map of kinded values
//!
//! A [KindedMap] associates keys of any hashable type `A` with values of type
//! [`Kind<F, A>`](crate::Kind): the type of the key selects the type of the value.
//! Values are stored type-erased and recovered with a checked downcast,
//! a missing key and a mismatching value both read as `None`.
//!
//! Each key slot is updated atomically, there is no transaction across keys.

use std::any::{Any, TypeId};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

use dashmap::DashMap;

use crate::kind::{Family, Kind, Witness};

/// Object-safe view of a hashable key
trait DynKey: Send + Sync {
    fn key_type(&self) -> TypeId;
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<K: Hash + Eq + Send + Sync + 'static> DynKey for K {
    fn key_type(&self) -> TypeId {
        TypeId::of::<K>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other.as_any().downcast_ref::<K>() == Some(self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }
}

impl PartialEq for dyn DynKey {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl Eq for dyn DynKey {}

impl Hash for dyn DynKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_type().hash(state);
        self.dyn_hash(state);
    }
}

fn erased<A: Hash + Eq + Send + Sync + 'static>(key: &A) -> &(dyn DynKey + 'static) {
    key
}

/// Owned type-erased key
struct ErasedKey(Box<dyn DynKey>);

impl PartialEq for ErasedKey {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for ErasedKey {}

impl Hash for ErasedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Borrow<dyn DynKey> for ErasedKey {
    fn borrow(&self) -> &(dyn DynKey + 'static) {
        &*self.0
    }
}

/// Concurrent map from keys of any type to values of [`Kind<F, A>`](crate::Kind)
///
/// # Examples
///
/// ```
/// use lazy_proxy::{kinded_lazy, KindedMap, LazyFamily};
///
/// let map = KindedMap::<LazyFamily>::new();
/// map.set(1).to(Some(kinded_lazy(|| 2)));
/// map.set("foo").to(Some(kinded_lazy(|| "bar")));
///
/// assert_eq!(map.get(&1).map(|v| *v.force()), Some(2));
/// assert_eq!(map.get(&"foo").map(|v| *v.force()), Some("bar"));
/// assert!(map.get(&3).is_none());
///
/// map.set("foo").to(None);
/// assert!(map.get(&"foo").is_none());
/// ```
pub struct KindedMap<F: Family> {
    data: DashMap<ErasedKey, Box<dyn Any + Send + Sync>>,
    _family: Witness<F, ()>,
}

impl<F: Family> KindedMap<F> {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            _family: Witness::new(),
        }
    }

    /// Retrieve a clone of the value associated to a key
    ///
    /// Returns `None` if the key is absent or holds a value of another type.
    pub fn get<A>(&self, key: &A) -> Option<Kind<F, A>>
    where
        A: Hash + Eq + Send + Sync + 'static,
        Kind<F, A>: Clone,
    {
        self.with(key, Clone::clone)
    }

    /// Run a closure on the value associated to a key, without cloning it
    pub fn with<A, R>(&self, key: &A, f: impl FnOnce(&Kind<F, A>) -> R) -> Option<R>
    where
        A: Hash + Eq + Send + Sync + 'static,
    {
        let entry = self.data.get(erased(key))?;
        let value = entry.value().downcast_ref::<Kind<F, A>>()?;
        Some(f(value))
    }

    /// Obtain the setter for a key.
    ///
    /// The setter only accepts values of `Kind<F, A>` where `A` is the type of the key.
    pub fn set<A>(&self, key: A) -> ValueSetter<'_, F, A>
    where
        A: Hash + Eq + Send + Sync + 'static,
    {
        ValueSetter {
            map: self,
            key,
            _kind: Witness::new(),
        }
    }

    /// Remove a key, returns true if a value was present
    pub fn remove<A>(&self, key: &A) -> bool
    where
        A: Hash + Eq + Send + Sync + 'static,
    {
        self.data.remove(erased(key)).is_some()
    }

    pub fn contains_key<A>(&self, key: &A) -> bool
    where
        A: Hash + Eq + Send + Sync + 'static,
    {
        self.data.contains_key(erased(key))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&self) {
        self.data.clear();
    }
}

impl<F: Family> Default for KindedMap<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> fmt::Debug for KindedMap<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindedMap")
            .field("family", &std::any::type_name::<F>())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Pending assignment of a single key of a [KindedMap]
///
/// The element type is fixed by the key, so `map.set(1).to(Some(kinded_lazy(|| "a")))`
/// does not compile.
#[must_use = "a setter does nothing until `to` is called"]
pub struct ValueSetter<'a, F: Family, A> {
    map: &'a KindedMap<F>,
    key: A,
    _kind: Witness<F, A>,
}

impl<'a, F, A> ValueSetter<'a, F, A>
where
    F: Family,
    A: Hash + Eq + Send + Sync + 'static,
{
    /// Associate the key to a value, or remove it with `None`
    pub fn to(self, value: Option<Kind<F, A>>) {
        match value {
            Some(value) => {
                self.map.data.insert(ErasedKey(Box::new(self.key)), Box::new(value));
            }
            None => {
                self.map.data.remove(erased(&self.key));
            }
        }
    }
}
