//! Lazily materialized proxies
//!
//! A [LazyProxy] is handed out immediately and computes its delegate on first use.
//! This allows building object graphs where two objects need each other at
//! construction time: each side receives a proxy of the other one.
//!
//! Proxies are built in two phases. The [Materializer] validates the target shape and
//! caches one [ProxyDescriptor] per target type. The descriptor then allocates a
//! [Shell], which holds no delegate at all, and the shell is bound to a [LazyValue]
//! to produce the proxy. A shell can't be called into, and the proxy itself holds no
//! state of the target type: all behavior comes from the delegate.
//!
//! Equality and hashing of a proxy use its identity and never force the delegate.
//! Everything else goes through [LazyProxy::force], either via `Deref` or via the
//! delegating trait impls generated by [proxy_interface](crate::proxy_interface).

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MaterializerConfig;
use crate::lazy::LazyValue;
use crate::shape::{
    first_no_arg_constructor, refuse_instantiation, require_all_open, ConstructorTemplate,
    InstantiationRefusal, OpenCheckExemption, ShapeViolation, TypeShape,
};

/// A type which declares its shape and can be proxied
///
/// Implemented by [proxy_interface](crate::proxy_interface) for trait objects.
pub trait Proxyable: Send + Sync + 'static {
    fn shape() -> TypeShape;
}

/// Errors preventing the creation of a proxy
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ProxyError {
    #[error(transparent)]
    Shape(#[from] ShapeViolation),
    #[error(transparent)]
    Refused(#[from] InstantiationRefusal),
}

/// Identity of a proxy instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

impl ProxyId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ProxyId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Delegate<T> = LazyValue<Arc<T>>;

/// Validated proxy layout for one target type, shared by all its proxies
pub struct ProxyDescriptor<T: ?Sized + 'static> {
    shape: TypeShape,
    template: ConstructorTemplate,
    instances: DashMap<ProxyId, Weak<Delegate<T>>>,
}

impl<T: ?Sized + 'static> ProxyDescriptor<T> {
    fn new(shape: TypeShape) -> Self {
        Self {
            template: first_no_arg_constructor(&shape),
            shape,
            instances: DashMap::new(),
        }
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Constructor the proxy layout was modelled on
    pub fn template(&self) -> ConstructorTemplate {
        self.template
    }

    /// Number of proxies of this type which are still alive
    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Number of live proxies of this type whose delegate was computed
    pub fn computed_instances(&self) -> usize {
        // Upgraded delegates are released after the shard guards, their drop may remove entries
        let delegates: Vec<_> = self
            .instances
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect();
        delegates.iter().filter(|delegate| delegate.is_computed()).count()
    }

    /// Check if the delegate of a live proxy was computed
    pub fn is_computed(&self, id: ProxyId) -> Option<bool> {
        let delegate = self.instances.get(&id)?.value().upgrade()?;
        Some(delegate.is_computed())
    }

    /// Allocate an unbound proxy: first phase of the construction
    pub fn allocate(self: &Arc<Self>) -> Shell<T> {
        Shell {
            id: ProxyId::next(),
            descriptor: Arc::clone(self),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for ProxyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDescriptor")
            .field("target", &self.shape.name())
            .field("template", &self.template)
            .field("live_instances", &self.instances.len())
            .finish()
    }
}

/// Allocated proxy which is not yet bound to its delegate
#[must_use = "a shell is useless until bound"]
pub struct Shell<T: ?Sized + 'static> {
    id: ProxyId,
    descriptor: Arc<ProxyDescriptor<T>>,
}

impl<T: ?Sized + 'static> Shell<T> {
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Bind the deferred delegate: second phase of the construction
    pub fn bind(self, delegate: LazyValue<Arc<T>>) -> Arc<LazyProxy<T>> {
        let delegate = Arc::new(delegate);
        self.descriptor
            .instances
            .insert(self.id, Arc::downgrade(&delegate));
        trace!(proxy = %self.id, target_type = self.descriptor.shape.name(), "bound lazy proxy");
        Arc::new(LazyProxy {
            id: self.id,
            delegate,
            descriptor: self.descriptor,
        })
    }
}

/// Handle standing for a value of type `T` which is computed on first use
///
/// Functions are associated rather than methods, as in `LazyProxy::force(&proxy)`,
/// so that they don't shadow the methods of the target reached through `Deref`.
pub struct LazyProxy<T: ?Sized + 'static> {
    id: ProxyId,
    delegate: Arc<Delegate<T>>,
    descriptor: Arc<ProxyDescriptor<T>>,
}

impl<T: ?Sized + 'static> LazyProxy<T> {
    pub fn id(this: &Self) -> ProxyId {
        this.id
    }

    /// Obtain the delegate, computing it on first use
    pub fn force(this: &Self) -> &Arc<T> {
        this.delegate.force()
    }

    /// Check if the delegate was computed, without forcing it
    pub fn is_computed(this: &Self) -> bool {
        this.delegate.is_computed()
    }

    pub fn descriptor(this: &Self) -> &Arc<ProxyDescriptor<T>> {
        &this.descriptor
    }
}

impl<T: ?Sized + 'static> Deref for LazyProxy<T> {
    type Target = T;

    fn deref(&self) -> &T {
        LazyProxy::force(self)
    }
}

impl<T: ?Sized + 'static> PartialEq for LazyProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: ?Sized + 'static> Eq for LazyProxy<T> {}

impl<T: ?Sized + 'static> Hash for LazyProxy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: ?Sized + 'static> Drop for LazyProxy<T> {
    fn drop(&mut self) {
        self.descriptor.instances.remove(&self.id);
    }
}

impl<T: ?Sized + 'static> fmt::Debug for LazyProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProxy")
            .field("id", &self.id)
            .field("target", &self.descriptor.shape.name())
            .field("computed", &self.delegate.is_computed())
            .finish()
    }
}

/// Progress of a target type towards proxy instances
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterializationState {
    /// No descriptor was built for the type yet
    Unmaterialized,
    /// The descriptor is cached, proxies can be bound
    DescriptorReady,
}

/// Factory of lazy proxies, caching one descriptor per target type
pub struct Materializer {
    exemption: Box<dyn OpenCheckExemption>,
    descriptors: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

static GLOBAL: Lazy<Materializer> = Lazy::new(Materializer::default);

impl Materializer {
    pub fn new(exemption: impl OpenCheckExemption + 'static) -> Self {
        Self {
            exemption: Box::new(exemption),
            descriptors: DashMap::new(),
        }
    }

    /// Process-wide materializer, using the default configuration
    pub fn global() -> &'static Materializer {
        &GLOBAL
    }

    pub fn state<T: ?Sized + 'static>(&self) -> MaterializationState {
        if self.descriptors.contains_key(&TypeId::of::<T>()) {
            MaterializationState::DescriptorReady
        } else {
            MaterializationState::Unmaterialized
        }
    }

    pub fn cached_descriptors(&self) -> usize {
        self.descriptors.len()
    }

    /// Obtain the descriptor of a target type, validating its shape on first request.
    ///
    /// Rejected types are not cached: no descriptor and no proxy exist for them.
    pub fn descriptor<T: ?Sized + Proxyable>(&self) -> Result<Arc<ProxyDescriptor<T>>, ProxyError> {
        let type_id = TypeId::of::<T>();
        if let Some(cached) = self.descriptors.get(&type_id) {
            return Ok(downcast_descriptor(Arc::clone(cached.value())));
        }

        let shape = T::shape();
        if let Err(err) = self.check(&shape) {
            debug!(target_type = shape.name(), %err, "rejected proxy target");
            return Err(err);
        }

        let entry = self.descriptors.entry(type_id).or_insert_with(|| {
            debug!(target_type = shape.name(), "synthesized proxy descriptor");
            let descriptor: Arc<dyn Any + Send + Sync> = Arc::new(ProxyDescriptor::<T>::new(shape));
            descriptor
        });
        Ok(downcast_descriptor(Arc::clone(entry.value())))
    }

    fn check(&self, shape: &TypeShape) -> Result<(), ProxyError> {
        refuse_instantiation(shape)?;
        require_all_open(shape, &*self.exemption)?;
        Ok(())
    }

    /// Create a proxy whose delegate is built by `constructor` on first use.
    ///
    /// The constructor runs at most once per proxy. If it panics, the panic reaches the
    /// caller which forced the proxy and the next use runs the constructor again.
    pub fn lazy_proxy<T, F>(&self, constructor: F) -> Result<Arc<LazyProxy<T>>, ProxyError>
    where
        T: ?Sized + Proxyable,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let descriptor = self.descriptor::<T>()?;
        Ok(descriptor.allocate().bind(LazyValue::new(constructor)))
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(MaterializerConfig::default())
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("cached_descriptors", &self.descriptors.len())
            .finish()
    }
}

fn downcast_descriptor<T: ?Sized + Proxyable>(
    entry: Arc<dyn Any + Send + Sync>,
) -> Arc<ProxyDescriptor<T>> {
    match entry.downcast::<ProxyDescriptor<T>>() {
        Ok(descriptor) => descriptor,
        Err(_) => unreachable!("proxy descriptor cached under a foreign TypeId"),
    }
}

/// Create a proxy with the process-wide [Materializer]
///
/// ```
/// use std::sync::Arc;
/// use lazy_proxy::{lazy_proxy, proxy_interface, LazyProxy, ProxyError};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self, name: &str) -> String {
///         format!("Hello, {}!", name)
///     }
/// }
///
/// proxy_interface! {
///     dyn Greeter {
///         fn greet(&self, name: &str) -> String;
///     }
/// }
///
/// # fn main() -> Result<(), ProxyError> {
/// let proxy = lazy_proxy::<dyn Greeter, _>(|| Arc::new(English))?;
/// assert!(!LazyProxy::is_computed(&proxy));
///
/// let greeter: Arc<dyn Greeter> = proxy.clone();
/// assert_eq!(greeter.greet("World"), "Hello, World!");
/// assert!(LazyProxy::is_computed(&proxy));
/// # Ok(())
/// # }
/// ```
pub fn lazy_proxy<T, F>(constructor: F) -> Result<Arc<LazyProxy<T>>, ProxyError>
where
    T: ?Sized + Proxyable,
    F: Fn() -> Arc<T> + Send + Sync + 'static,
{
    Materializer::global().lazy_proxy(constructor)
}

static_assertions::assert_impl_all!(LazyProxy<dyn Any + Send + Sync>: Send, Sync);
static_assertions::assert_impl_all!(ProxyDescriptor<dyn Any + Send + Sync>: Send, Sync);
static_assertions::assert_impl_all!(Materializer: Send, Sync);
