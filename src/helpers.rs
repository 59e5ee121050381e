/// Make a trait object proxyable.
///
/// For each listed trait, this macro generates:
///
/// * an implementation of the trait for ```LazyProxy<dyn $Trait>``` which forces the delegate and
///   forwards every call, with the same arguments, to it;
/// * an implementation of ```Proxyable``` for ```dyn $Trait```, declaring an interface shape with
///   one overridable function per listed method.
///
/// Every method of the trait must be listed, with a ```&self``` receiver.
/// Methods of supertraits are not forwarded: in particular, the [Object](crate::Object)
/// methods of a proxy keep their identity semantics.
///
/// ```
/// # use std::sync::Arc;
/// # use lazy_proxy::*;
/// trait Counter: Send + Sync {
///     fn get(&self) -> usize;
///     fn add(&self, a: usize, b: usize) -> usize;
///     fn reset(&self);
/// }
///
/// proxy_interface! {
///     dyn Counter {
///         fn get(&self) -> usize;
///         fn add(&self, a: usize, b: usize) -> usize;
///         fn reset(&self);
///     }
/// }
///
/// let shape = <dyn Counter as Proxyable>::shape();
/// assert_eq!(shape.kind(), TypeKind::Interface);
/// assert_eq!(shape.declared_members().len(), 3);
/// ```
#[macro_export]
macro_rules! proxy_interface {
    ($(dyn $Trait:path { $(fn $method:ident(&self $(, $arg:ident : $Arg:ty)*) $(-> $Ret:ty)?;)* })+) => {
        $(
        impl $Trait for $crate::LazyProxy<dyn $Trait> {
            $(
            fn $method(&self $(, $arg: $Arg)*) $(-> $Ret)? {
                <dyn $Trait as $Trait>::$method(&**$crate::LazyProxy::force(self) $(, $arg)*)
            }
            )*
        }

        impl $crate::Proxyable for dyn $Trait {
            fn shape() -> $crate::TypeShape {
                $crate::TypeShape::new(stringify!($Trait), $crate::TypeKind::Interface)
                    $(.open_function(stringify!($method)))*
            }
        }
        )+
    };
}
