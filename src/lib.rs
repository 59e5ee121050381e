//! Lazily materialized proxies and kinded heterogeneous maps, for object graphs whose
//! construction order can't be fixed statically.
//!
//! # Mutually dependent objects
//!
//! ```
//! # use std::sync::Arc;
//! # use once_cell::sync::OnceCell;
//! # use lazy_proxy::*;
//! // Define traits and implementors which need each other
//! trait Parent: Send + Sync {
//!     fn child(&self) -> Arc<dyn Child>;
//! }
//!
//! trait Child: Send + Sync {
//!     fn parent(&self) -> Arc<dyn Parent>;
//! }
//!
//! struct ParentImpl(Arc<dyn Child>);
//! impl Parent for ParentImpl {
//!     fn child(&self) -> Arc<dyn Child> {
//!         self.0.clone()
//!     }
//! }
//!
//! struct ChildImpl(Arc<dyn Parent>);
//! impl Child for ChildImpl {
//!     fn parent(&self) -> Arc<dyn Parent> {
//!         self.0.clone()
//!     }
//! }
//!
//! // Generate the delegating implementations
//! proxy_interface! {
//!     dyn Parent {
//!         fn child(&self) -> Arc<dyn Child>;
//!     }
//!     dyn Child {
//!         fn parent(&self) -> Arc<dyn Parent>;
//!     }
//! }
//!
//! # fn main() -> Result<(), ProxyError> {
//! // The parent is handed out before the child exists
//! let child_slot: Arc<OnceCell<Arc<dyn Child>>> = Arc::default();
//! let slot = child_slot.clone();
//! let parent: Arc<dyn Parent> = lazy_proxy::<dyn Parent, _>(move || {
//!     Arc::new(ParentImpl(slot.get().cloned().expect("child is bound")))
//! })?;
//!
//! let p = parent.clone();
//! let child: Arc<dyn Child> = lazy_proxy::<dyn Child, _>(move || Arc::new(ChildImpl(p.clone())))?;
//! child_slot.set(child.clone()).ok();
//!
//! // Resolving one side never requires the other to be complete
//! assert!(Arc::ptr_eq(&parent.child().parent().child(), &child));
//! # Ok(())
//! # }
//! ```
//!
//! Once both delegates are computed they hold each other through `Arc`, so such a
//! graph is never freed. Wire cycles this way for objects which live as long as the
//! program.
//!
//! # Mechanism
//!
//! Rust has no runtime subclassing, so the proxied type is declared up front.
//!
//! * The [Proxyable] trait declares the [TypeShape] of a target type: its kind,
//!   its members and its ancestors. The [proxy_interface] macro implements it for trait
//!   objects, together with a delegating implementation of the trait itself.
//! * The [Materializer] checks the shape on first request (see [require_all_open] and
//!   [refuse_instantiation]) and caches one [ProxyDescriptor] per target type.
//! * Each proxy is a [LazyProxy] wrapping a [LazyValue]. Calls force the value at most once
//!   and are forwarded to it; equality and hashing use the proxy identity instead.
//!
//! The [KindedMap] stores values of a [Family], such as [KindedLazy], under keys of any type.
//! The type of each key selects the element type of its value.

mod config;
mod helpers;
mod identity;
mod kind;
mod lazy;
mod proxy;
mod shape;
mod store;

pub use config::MaterializerConfig;
pub use identity::Object;
pub use kind::{Family, Kind, Witness};
pub use lazy::{kinded_lazy, KindedLazy, LazyFamily, LazyValue};
pub use proxy::{
    lazy_proxy, LazyProxy, MaterializationState, Materializer, ProxyDescriptor, ProxyError,
    ProxyId, Proxyable, Shell,
};
pub use shape::{
    first_no_arg_constructor, refuse_instantiation, require_all_open, validate_shape,
    ConstructorTemplate, DeclaredMember, InstantiationRefusal, MarkerExemption, Member,
    MemberKind, MemberRef, OpenCheckExemption, ShapeViolation, TypeKind, TypeShape, Visibility,
};
pub use store::{KindedMap, ValueSetter};
