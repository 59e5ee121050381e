//! Declared shapes of proxy targets and their validation
//!
//! Rust has no runtime reflection, so a proxy target declares its shape explicitly:
//! its kind, its members and the chain of ancestors it inherits members from.
//!
//! A shape is accepted for proxying only if every call on it can be redirected to the
//! delegate: the type must be extensible, and unless it is a pure interface, each
//! non-private member (inherited ones included) must be overridable.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Category of a proxy target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Pure interface: all members are abstract
    Interface,
    Abstract,
    Open,
    /// Closed to extension
    Final,
    /// Closed family of variants
    Sealed,
    /// Enumerated values
    Enum,
    /// Type with a fixed singleton instance
    Singleton,
    /// Uninhabited type
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Function,
    Property,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Function => f.write_str("functions"),
            MemberKind::Property => f.write_str("properties"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A member function or property of a shape
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
    pub visibility: Visibility,
    pub overridable: bool,
}

impl Member {
    /// Check if calls to this member escape interception
    pub fn is_closed(&self) -> bool {
        self.visibility != Visibility::Private && !self.overridable
    }
}

/// Explicit description of a proxy target type
///
/// # Examples
///
/// ```
/// use lazy_proxy::{validate_shape, TypeKind, TypeShape};
///
/// let base = TypeShape::new("Base", TypeKind::Open).final_function("locked");
/// let derived = TypeShape::new("Derived", TypeKind::Open)
///     .open_function("run")
///     .extends(base);
///
/// let err = validate_shape(&derived).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "there are non-overridable functions which can't be intercepted in Derived: [locked (Base)]"
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeShape {
    name: &'static str,
    kind: TypeKind,
    members: Vec<Member>,
    parent: Option<Box<TypeShape>>,
    no_arg_constructor: bool,
    all_open: bool,
}

impl TypeShape {
    pub fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            members: Vec::new(),
            parent: None,
            no_arg_constructor: false,
            all_open: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&TypeShape> {
        self.parent.as_deref()
    }

    /// Members declared by this type itself
    pub fn declared_members(&self) -> &[Member] {
        &self.members
    }

    pub fn has_no_arg_constructor(&self) -> bool {
        self.no_arg_constructor
    }

    /// Check the "all open" marker
    pub fn is_all_open(&self) -> bool {
        self.all_open
    }

    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn open_function(self, name: &'static str) -> Self {
        self.member(Member {
            name,
            kind: MemberKind::Function,
            visibility: Visibility::Public,
            overridable: true,
        })
    }

    pub fn final_function(self, name: &'static str) -> Self {
        self.member(Member {
            name,
            kind: MemberKind::Function,
            visibility: Visibility::Public,
            overridable: false,
        })
    }

    pub fn private_function(self, name: &'static str) -> Self {
        self.member(Member {
            name,
            kind: MemberKind::Function,
            visibility: Visibility::Private,
            overridable: false,
        })
    }

    pub fn open_property(self, name: &'static str) -> Self {
        self.member(Member {
            name,
            kind: MemberKind::Property,
            visibility: Visibility::Public,
            overridable: true,
        })
    }

    pub fn final_property(self, name: &'static str) -> Self {
        self.member(Member {
            name,
            kind: MemberKind::Property,
            visibility: Visibility::Public,
            overridable: false,
        })
    }

    /// Declare the ancestor this type inherits from
    pub fn extends(mut self, parent: TypeShape) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Declare a zero-argument constructor on this type
    pub fn with_no_arg_constructor(mut self) -> Self {
        self.no_arg_constructor = true;
        self
    }

    /// Set the "all open" marker: the type and the members it declares are treated as open
    pub fn all_open(mut self) -> Self {
        self.all_open = true;
        self
    }

    /// This type followed by its ancestors, most derived first
    pub fn ancestry(&self) -> impl Iterator<Item = &TypeShape> {
        std::iter::successors(Some(self), |shape| shape.parent())
    }

    /// All members visible on this type, inherited ones included.
    ///
    /// A member declared closer to this type hides an ancestor member with the same name and kind,
    /// unless the ancestor member is closed: a redeclaration can't reopen it, so both are listed.
    pub fn members(&self) -> Vec<DeclaredMember<'_>> {
        let mut seen = HashSet::new();
        self.ancestry()
            .flat_map(|owner| owner.members.iter().map(move |member| (owner, member)))
            .filter(|(_, member)| seen.insert((member.name, member.kind)) || member.is_closed())
            .map(|(owner, member)| DeclaredMember { owner, member })
            .collect()
    }
}

/// A member together with the type declaring it
#[derive(Clone, Copy, Debug)]
pub struct DeclaredMember<'a> {
    pub owner: &'a TypeShape,
    pub member: &'a Member,
}

/// Decide if a type is exempt from the default extensibility requirement
pub trait OpenCheckExemption: Send + Sync {
    fn is_exempt_from_open_check(&self, shape: &TypeShape) -> bool;
}

/// Exemption driven by the "all open" marker of each shape
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerExemption;

impl OpenCheckExemption for MarkerExemption {
    fn is_exempt_from_open_check(&self, shape: &TypeShape) -> bool {
        shape.is_all_open()
    }
}

/// Name of an offending member and of the type declaring it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRef {
    pub name: &'static str,
    pub declared_in: &'static str,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.declared_in)
    }
}

struct MemberList<'a>(&'a [MemberRef]);

impl fmt::Display for MemberList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, member) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str("]")
    }
}

/// A shape which can't be safely proxied
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ShapeViolation {
    #[error("{type_name} is final thus can't be extended")]
    Final { type_name: &'static str },
    #[error("there are non-overridable {kind} which can't be intercepted in {type_name}: {}", MemberList(.members))]
    NonOverridable {
        type_name: &'static str,
        kind: MemberKind,
        members: Vec<MemberRef>,
    },
}

/// A target that proxy allocation refuses to instantiate
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum InstantiationRefusal {
    #[error("shouldn't instantiate enums: {type_name}")]
    Enum { type_name: &'static str },
    #[error("shouldn't instantiate sealed types: {type_name}")]
    Sealed { type_name: &'static str },
    #[error("shouldn't instantiate singletons: {type_name}")]
    Singleton { type_name: &'static str },
    #[error("shouldn't instantiate the bottom type: {type_name}")]
    Bottom { type_name: &'static str },
}

/// Check that every intercepted member of a shape can be redirected.
///
/// Functions are checked before properties, and only the first failing group is reported.
pub fn require_all_open(
    shape: &TypeShape,
    exemption: &dyn OpenCheckExemption,
) -> Result<(), ShapeViolation> {
    let exempt = exemption.is_exempt_from_open_check(shape);
    if shape.kind == TypeKind::Final && !exempt {
        return Err(ShapeViolation::Final {
            type_name: shape.name,
        });
    }
    if shape.kind == TypeKind::Interface {
        return Ok(());
    }

    let members = shape.members();
    for kind in [MemberKind::Function, MemberKind::Property] {
        let closed: Vec<MemberRef> = members
            .iter()
            .filter(|m| m.member.kind == kind)
            .filter(|m| m.member.is_closed())
            .filter(|m| !exemption.is_exempt_from_open_check(m.owner))
            .map(|m| MemberRef {
                name: m.member.name,
                declared_in: m.owner.name,
            })
            .collect();
        if !closed.is_empty() {
            return Err(ShapeViolation::NonOverridable {
                type_name: shape.name,
                kind,
                members: closed,
            });
        }
    }
    Ok(())
}

/// Validate a shape, honouring only the "all open" marker
pub fn validate_shape(shape: &TypeShape) -> Result<(), ShapeViolation> {
    require_all_open(shape, &MarkerExemption)
}

/// Refuse categories which must never be instantiated behind a proxy
pub fn refuse_instantiation(shape: &TypeShape) -> Result<(), InstantiationRefusal> {
    let type_name = shape.name;
    match shape.kind {
        TypeKind::Enum => Err(InstantiationRefusal::Enum { type_name }),
        TypeKind::Sealed => Err(InstantiationRefusal::Sealed { type_name }),
        TypeKind::Singleton => Err(InstantiationRefusal::Singleton { type_name }),
        TypeKind::Bottom => Err(InstantiationRefusal::Bottom { type_name }),
        TypeKind::Interface | TypeKind::Abstract | TypeKind::Open | TypeKind::Final => Ok(()),
    }
}

/// Constructor used as the allocation template of a proxy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstructorTemplate {
    /// Zero-argument constructor declared by the named type
    Declared(&'static str),
    /// Universal top-level constructor
    Root,
}

/// Find the first zero-argument constructor, searching from the most derived type upward
pub fn first_no_arg_constructor(shape: &TypeShape) -> ConstructorTemplate {
    shape
        .ancestry()
        .find(|s| s.no_arg_constructor)
        .map_or(ConstructorTemplate::Root, |s| ConstructorTemplate::Declared(s.name))
}
