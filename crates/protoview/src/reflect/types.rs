//! Generic type expressions
//!
//! Method signatures describe their parameters and results with [`Type`], a
//! small model of generic types: scalars, classes, raw and parameterized
//! containers, wildcards, type variables and arrays.
//!
//! Class and type-variable references inside an expression are weak, so a
//! class may mention itself (or a class that mentions it back) in its own
//! signatures without forming a reference cycle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use super::class::{ClassHandle, ClassRef};
use crate::{AdapterError, AdapterResult};

/// Scalar types. Values of these types are never adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `boolean`
    Boolean,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// 64-bit float
    Double,
    /// String
    String,
}

impl ScalarKind {
    /// Name used in signatures and error messages
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Double => "double",
            ScalarKind::String => "String",
        }
    }
}

/// Built-in container kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Any iterable
    Iterable,
    /// Any collection
    Collection,
    /// Ordered list
    List,
    /// Insertion ordered set
    Set,
    /// Insertion ordered map
    Map,
    /// Immutable set of domain objects
    DomainObjectSet,
}

impl ContainerKind {
    /// Name used in signatures and error messages
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Iterable => "Iterable",
            ContainerKind::Collection => "Collection",
            ContainerKind::List => "List",
            ContainerKind::Set => "Set",
            ContainerKind::Map => "Map",
            ContainerKind::DomainObjectSet => "DomainObjectSet",
        }
    }

    /// Whether the container holds a flat sequence of elements
    pub fn is_iterable(self) -> bool {
        !matches!(self, ContainerKind::Map)
    }
}

/// Raw type of a parameterized type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericRaw {
    /// A built-in container
    Container(ContainerKind),
    /// A user-defined generic class or interface
    Class(ClassHandle),
}

/// A type variable declared by a generic class or method.
///
/// Bounds may be set after creation, which is how recursive bounds such as
/// `T extends Comparable<T>` are expressed.
pub struct TypeVariable {
    id: u64,
    name: Arc<str>,
    bounds: OnceCell<Vec<Type>>,
}

impl TypeVariable {
    /// Create an unbounded type variable
    pub fn new(name: impl Into<Arc<str>>) -> Arc<Self> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            bounds: OnceCell::new(),
        })
    }

    /// Create a type variable with the given bounds
    pub fn bounded(name: impl Into<Arc<str>>, bounds: Vec<Type>) -> Arc<Self> {
        let var = Self::new(name);
        let _ = var.bounds.set(bounds);
        var
    }

    /// Set the bounds. Bounds can be set only once.
    pub fn set_bounds(&self, bounds: Vec<Type>) -> AdapterResult<()> {
        self.bounds.set(bounds).map_err(|_| {
            AdapterError::InvalidArgument(format!(
                "Bounds of type variable {} are already set",
                self.name
            ))
        })
    }

    /// Unique id of this variable
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared bounds (empty when unbounded)
    pub fn bounds(&self) -> &[Type] {
        self.bounds.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Debug for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bounds are not printed, they may refer back to this variable.
        f.debug_struct("TypeVariable")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Weak reference to a [`TypeVariable`]
#[derive(Clone)]
pub struct TypeVariableHandle {
    id: u64,
    name: Arc<str>,
    var: Weak<TypeVariable>,
}

impl TypeVariableHandle {
    /// Id of the referenced variable
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Name of the referenced variable
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upgrade to the variable, if it is still alive
    pub fn upgrade(&self) -> Option<Arc<TypeVariable>> {
        self.var.upgrade()
    }
}

impl PartialEq for TypeVariableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeVariableHandle {}

impl Hash for TypeVariableHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeVariableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A generic type expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// No value
    Void,
    /// A scalar
    Scalar(ScalarKind),
    /// The top type
    Object,
    /// A class, interface or enum
    Class(ClassHandle),
    /// A raw container
    Container(ContainerKind),
    /// A parameterized container or class
    Parameterized {
        /// Raw type
        raw: GenericRaw,
        /// Type arguments
        args: Vec<Type>,
    },
    /// A wildcard argument such as `? extends T`
    Wildcard {
        /// Upper bounds
        upper: Vec<Type>,
        /// Lower bounds
        lower: Vec<Type>,
    },
    /// A reference to a type variable
    Variable(TypeVariableHandle),
    /// An array of the element type
    Array(Box<Type>),
}

impl Type {
    /// The given class
    pub fn of(class: &ClassRef) -> Self {
        Type::Class(class.handle())
    }

    /// `boolean`
    pub fn boolean() -> Self {
        Type::Scalar(ScalarKind::Boolean)
    }

    /// `int`
    pub fn int() -> Self {
        Type::Scalar(ScalarKind::Int)
    }

    /// `long`
    pub fn long() -> Self {
        Type::Scalar(ScalarKind::Long)
    }

    /// `double`
    pub fn double() -> Self {
        Type::Scalar(ScalarKind::Double)
    }

    /// `String`
    pub fn string() -> Self {
        Type::Scalar(ScalarKind::String)
    }

    /// `Iterable<element>`
    pub fn iterable_of(element: Type) -> Self {
        Self::container(ContainerKind::Iterable, vec![element])
    }

    /// `Collection<element>`
    pub fn collection_of(element: Type) -> Self {
        Self::container(ContainerKind::Collection, vec![element])
    }

    /// `List<element>`
    pub fn list_of(element: Type) -> Self {
        Self::container(ContainerKind::List, vec![element])
    }

    /// `Set<element>`
    pub fn set_of(element: Type) -> Self {
        Self::container(ContainerKind::Set, vec![element])
    }

    /// `DomainObjectSet<element>`
    pub fn domain_object_set_of(element: Type) -> Self {
        Self::container(ContainerKind::DomainObjectSet, vec![element])
    }

    /// `Map<key, value>`
    pub fn map_of(key: Type, value: Type) -> Self {
        Self::container(ContainerKind::Map, vec![key, value])
    }

    /// A generic class applied to type arguments
    pub fn parameterized(class: &ClassRef, args: Vec<Type>) -> Self {
        Type::Parameterized {
            raw: GenericRaw::Class(class.handle()),
            args,
        }
    }

    /// The unbounded wildcard `?`
    pub fn wildcard() -> Self {
        Type::Wildcard {
            upper: vec![Type::Object],
            lower: Vec::new(),
        }
    }

    /// `? extends bound`
    pub fn extends(bound: Type) -> Self {
        Type::Wildcard {
            upper: vec![bound],
            lower: Vec::new(),
        }
    }

    /// `? super bound`
    pub fn super_of(bound: Type) -> Self {
        Type::Wildcard {
            upper: vec![Type::Object],
            lower: vec![bound],
        }
    }

    /// A reference to the given type variable
    pub fn variable(var: &Arc<TypeVariable>) -> Self {
        Type::Variable(TypeVariableHandle {
            id: var.id,
            name: var.name.clone(),
            var: Arc::downgrade(var),
        })
    }

    /// `element[]`
    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    fn container(kind: ContainerKind, args: Vec<Type>) -> Self {
        Type::Parameterized {
            raw: GenericRaw::Container(kind),
            args,
        }
    }

    /// Type erasure
    pub fn erasure(&self) -> RawType {
        match self {
            Type::Void => RawType::Void,
            Type::Scalar(kind) => RawType::Scalar(*kind),
            Type::Object => RawType::Object,
            Type::Class(handle) => RawType::Class(handle.clone()),
            Type::Container(kind) => RawType::Container(*kind),
            Type::Parameterized { raw, .. } => match raw {
                GenericRaw::Container(kind) => RawType::Container(*kind),
                GenericRaw::Class(handle) => RawType::Class(handle.clone()),
            },
            Type::Wildcard { upper, .. } => upper.first().map_or(RawType::Object, Type::erasure),
            Type::Variable(handle) => handle
                .upgrade()
                .and_then(|var| var.bounds().first().map(Type::erasure))
                .unwrap_or(RawType::Object),
            Type::Array(element) => RawType::Array(Box::new(element.erasure())),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Scalar(kind) => write!(f, "{}", kind.name()),
            Type::Object => write!(f, "Object"),
            Type::Class(handle) => write!(f, "{}", handle.name()),
            Type::Container(kind) => write!(f, "{}", kind.name()),
            Type::Parameterized { raw, args } => {
                match raw {
                    GenericRaw::Container(kind) => write!(f, "{}", kind.name())?,
                    GenericRaw::Class(handle) => write!(f, "{}", handle.name())?,
                }
                write!(f, "<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
            Type::Wildcard { upper, lower } => {
                if let Some(bound) = lower.first() {
                    write!(f, "? super {}", bound)
                } else {
                    match upper.first() {
                        Some(Type::Object) | None => write!(f, "?"),
                        Some(bound) => write!(f, "? extends {}", bound),
                    }
                }
            }
            Type::Variable(handle) => write!(f, "{}", handle.name()),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// An erased (raw) type, as used to match method signatures
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawType {
    /// No value
    Void,
    /// A scalar
    Scalar(ScalarKind),
    /// The top type
    Object,
    /// A class, interface or enum
    Class(ClassHandle),
    /// A container
    Container(ContainerKind),
    /// An array
    Array(Box<RawType>),
}

impl RawType {
    /// Whether every class this raw type refers to is still alive
    pub fn is_live(&self) -> bool {
        match self {
            RawType::Class(handle) => handle.is_live(),
            RawType::Array(element) => element.is_live(),
            _ => true,
        }
    }
}
