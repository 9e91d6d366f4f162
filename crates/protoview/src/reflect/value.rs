//! Dynamic values
//!
//! [`Value`] is what flows through method calls: scalars, strings, enum
//! constants, containers, objects, and lazily supplied values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::class::ClassRef;
use super::object::ObjectRef;
use crate::{AdapterError, AdapterResult};

/// Produces a value on demand
pub type Supplier = Arc<dyn Fn() -> AdapterResult<Value> + Send + Sync>;

/// A constant of an enum class
#[derive(Clone)]
pub struct EnumConstant {
    class: ClassRef,
    name: Arc<str>,
}

impl EnumConstant {
    /// The constant `name` of `class`
    pub fn of(class: &ClassRef, name: &str) -> AdapterResult<Self> {
        match class.enum_constant(name) {
            Some(name) => Ok(Self {
                class: class.clone(),
                name: name.clone(),
            }),
            None => Err(AdapterError::InvalidArgument(format!(
                "{} has no constant {}",
                class.name(),
                name
            ))),
        }
    }

    /// Enum class
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Constant name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for EnumConstant {
    fn eq(&self, other: &Self) -> bool {
        self.class.id() == other.class.id() && self.name == other.name
    }
}

impl Eq for EnumConstant {}

impl Hash for EnumConstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.id().hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for EnumConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.simple_name(), self.name)
    }
}

/// A dynamic value
#[derive(Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// String
    Str(Arc<str>),
    /// Enum constant
    Enum(EnumConstant),
    /// Ordered list
    List(Vec<Value>),
    /// Insertion ordered set of unique elements. Build with [`Value::set`].
    Set(Vec<Value>),
    /// Insertion ordered map with unique keys. Build with [`Value::map`].
    Map(Vec<(Value, Value)>),
    /// Immutable set of domain objects
    DomainObjectSet(Arc<[Value]>),
    /// Object reference
    Object(ObjectRef),
    /// Value produced on demand
    Lazy(Supplier),
}

impl Value {
    /// Build a set, dropping duplicate elements
    pub fn set<I: IntoIterator<Item = Value>>(elements: I) -> Self {
        let mut seen = FxHashSet::default();
        let mut unique = Vec::new();
        for element in elements {
            if seen.insert(element.clone()) {
                unique.push(element);
            }
        }
        Value::Set(unique)
    }

    /// Build a map. A repeated key keeps its first position and its last value.
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        let mut positions: FxHashMap<Value, usize> = FxHashMap::default();
        let mut unique: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match positions.get(&key) {
                Some(&index) => unique[index].1 = value,
                None => {
                    positions.insert(key.clone(), unique.len());
                    unique.push((key, value));
                }
            }
        }
        Value::Map(unique)
    }

    /// Build an immutable domain object set, dropping duplicates
    pub fn domain_object_set<I: IntoIterator<Item = Value>>(elements: I) -> Self {
        match Value::set(elements) {
            Value::Set(unique) => Value::DomainObjectSet(unique.into()),
            _ => Value::DomainObjectSet(Arc::from(Vec::new())),
        }
    }

    /// Wrap a supplier
    pub fn lazy<F>(supplier: F) -> Self
    where
        F: Fn() -> AdapterResult<Value> + Send + Sync + 'static,
    {
        Value::Lazy(Arc::new(supplier))
    }

    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer content
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Long content, widening integers
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Float content
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// String content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Enum constant content
    pub fn as_enum(&self) -> Option<&EnumConstant> {
        match self {
            Value::Enum(constant) => Some(constant),
            _ => None,
        }
    }

    /// Object content
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Elements of a list, set or domain object set
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(elements) | Value::Set(elements) => Some(elements.as_slice()),
            Value::DomainObjectSet(elements) => Some(&elements[..]),
            _ => None,
        }
    }

    /// Entries of a map
    pub fn entries(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    /// Name of the runtime type, for messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Enum(constant) => constant.class().name().to_string(),
            Value::List(_) => "List".to_string(),
            Value::Set(_) => "Set".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::DomainObjectSet(_) => "DomainObjectSet".to_string(),
            Value::Object(object) => object.class().name().to_string(),
            Value::Lazy(_) => "Supplier".to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|element| b.contains(element))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|entry| b.contains(entry))
            }
            (Value::DomainObjectSet(a), Value::DomainObjectSet(b)) => {
                a.len() == b.len() && a.iter().all(|element| b.contains(element))
            }
            (Value::Object(a), Value::Object(b)) => a.equals(b),
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Long(l) => l.hash(state),
            Value::Double(d) => d.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Enum(constant) => constant.hash(state),
            Value::List(elements) => elements.hash(state),
            // Unordered containers hash their size only, so that equal
            // values with different orders agree.
            Value::Set(elements) => elements.len().hash(state),
            Value::Map(entries) => entries.len().hash(state),
            Value::DomainObjectSet(elements) => elements.len().hash(state),
            Value::Object(object) => state.write_u64(object.hash_code()),
            Value::Lazy(supplier) => {
                (Arc::as_ptr(supplier) as *const () as usize).hash(state)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            Value::Double(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Enum(constant) => write!(f, "{}", constant.name()),
            Value::List(elements) | Value::Set(elements) => {
                write!(f, "[")?;
                join(f, elements)?;
                write!(f, "]")
            }
            Value::DomainObjectSet(elements) => {
                write!(f, "[")?;
                join(f, elements)?;
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Object(object) => write!(f, "{}", object),
            Value::Lazy(_) => write!(f, "<supplier>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Enum(constant) => write!(f, "{:?}", constant),
            Value::List(elements) => f.debug_list().entries(elements).finish(),
            Value::Set(elements) => f.debug_set().entries(elements).finish(),
            Value::DomainObjectSet(elements) => f.debug_set().entries(elements.iter()).finish(),
            Value::Map(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Value::Object(object) => write!(f, "{:?}", object),
            other => write!(f, "{}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<EnumConstant> for Value {
    fn from(value: EnumConstant) -> Self {
        Value::Enum(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
