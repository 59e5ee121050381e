//! Memoized deferred computations
//!
//! A [LazyValue] wraps a computation which runs on first use and is then cached.
//! Concurrent callers racing on the first [LazyValue::force] wait for the winner
//! instead of running the computation again.
//!
//! Failures are never cached: an error returned by [LazyValue::try_force] (or a panic
//! unwinding out of [LazyValue::force]) leaves the value unforced, and the next call
//! runs the computation again.

use std::convert::Infallible;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::kind::{Family, Kind};

type Thunk<A, E> = Arc<dyn Fn() -> Result<A, E> + Send + Sync>;

/// A value computed at most once, on first access
pub struct LazyValue<A, E = Infallible> {
    cell: OnceCell<A>,
    // Released once the cell is filled, dropping whatever the computation captured
    thunk: Mutex<Option<Thunk<A, E>>>,
}

impl<A> LazyValue<A> {
    /// Defer an infallible computation
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        Self::fallible(move || Ok(f()))
    }

    /// Obtain the value, computing it if needed.
    ///
    /// If the computation panics, the panic reaches the caller and the value stays unforced.
    pub fn force(&self) -> &A {
        match self.try_force() {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

impl<A, E> LazyValue<A, E> {
    /// Defer a computation which may fail
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn() -> Result<A, E> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            thunk: Mutex::new(Some(Arc::new(f))),
        }
    }

    /// Wrap a value which is already available
    pub fn computed(value: A) -> Self {
        Self {
            cell: OnceCell::with_value(value),
            thunk: Mutex::new(None),
        }
    }

    /// Obtain the value, computing it if needed.
    ///
    /// The error of a failed computation is returned to the caller which triggered it,
    /// and the next call retries.
    ///
    /// Forcing a value from within its own computation deadlocks.
    pub fn try_force(&self) -> Result<&A, E> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        let value = self.cell.get_or_try_init(|| {
            // The thunk is only released after the cell is filled,
            // and this closure only runs while it is still empty.
            let thunk = self.thunk.lock().clone();
            let Some(thunk) = thunk else {
                unreachable!("lazy value computed without its thunk");
            };
            trace!("computing lazy value");
            let result = thunk();
            if result.is_err() {
                debug!("lazy computation failed, value left unforced");
            }
            result
        })?;

        self.thunk.lock().take();
        Ok(value)
    }

    /// Check if the value was already computed, without forcing it
    pub fn is_computed(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Peek at the value, without forcing it
    pub fn get(&self) -> Option<&A> {
        self.cell.get()
    }
}

impl<A: fmt::Debug, E> fmt::Debug for LazyValue<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("LazyValue").field(value).finish(),
            None => f.write_str("LazyValue(<unforced>)"),
        }
    }
}

/// Shared [LazyValue] belonging to the [LazyFamily]
///
/// Clones share the same computation and result.
pub struct KindedLazy<A>(Arc<LazyValue<A>>);

impl<A> KindedLazy<A> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> A + Send + Sync + 'static,
    {
        KindedLazy(Arc::new(LazyValue::new(f)))
    }

    /// Check if two handles share the same computation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<A> Clone for KindedLazy<A> {
    fn clone(&self) -> Self {
        KindedLazy(Arc::clone(&self.0))
    }
}

impl<A> Deref for KindedLazy<A> {
    type Target = LazyValue<A>;

    fn deref(&self) -> &LazyValue<A> {
        &self.0
    }
}

impl<A: fmt::Debug> fmt::Debug for KindedLazy<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Family of shared lazy values
pub enum LazyFamily {}

impl Family for LazyFamily {
    type Of<A: Send + Sync + 'static> = KindedLazy<A>;
}

/// Defer a computation as a member of the [LazyFamily]
pub fn kinded_lazy<A, F>(f: F) -> Kind<LazyFamily, A>
where
    A: Send + Sync + 'static,
    F: Fn() -> A + Send + Sync + 'static,
{
    KindedLazy::new(f)
}

static_assertions::assert_impl_all!(LazyValue<String>: Send, Sync);
static_assertions::assert_impl_all!(KindedLazy<String>: Send, Sync, Clone);
