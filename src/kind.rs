//! Phantom "kind" markers
//!
//! A [Family] names a generic container shape without fixing its element type.
//! `Kind<F, A>` is the container of family `F` applied to `A`, which lets a single
//! collection hold `Kind<F, i32>` next to `Kind<F, String>` while every access still
//! names the exact element type.

use std::marker::PhantomData;

/// A generic container shape, indexed by its element type
pub trait Family: 'static {
    type Of<A: Send + Sync + 'static>: Send + Sync + 'static;
}

/// The container of family `F` holding elements of type `A`
pub type Kind<F, A> = <F as Family>::Of<A>;

/// Zero-sized witness tying a family to one element type.
///
/// It carries no data and only pins type parameters,
/// e.g. for [ValueSetter](crate::ValueSetter) which must not let `A` be re-inferred.
pub struct Witness<F: ?Sized, A: ?Sized>(PhantomData<fn(&F) -> &A>);

impl<F: ?Sized, A: ?Sized> Witness<F, A> {
    pub const fn new() -> Self {
        Witness(PhantomData)
    }
}

impl<F: ?Sized, A: ?Sized> Default for Witness<F, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized, A: ?Sized> Clone for Witness<F, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: ?Sized, A: ?Sized> Copy for Witness<F, A> {}

impl<F: ?Sized, A: ?Sized> std::fmt::Debug for Witness<F, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Witness<{}, {}>",
            std::any::type_name::<F>(),
            std::any::type_name::<A>()
        )
    }
}

static_assertions::assert_eq_size!(Witness<crate::LazyFamily, String>, ());
static_assertions::assert_impl_all!(Witness<crate::LazyFamily, String>: Send, Sync, Copy);
