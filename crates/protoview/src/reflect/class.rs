//! Classes, interfaces and enums
//!
//! A [`Class`] is built in two phases. [`ClassBuilder`] creates the immutable
//! header (name, kind, supertypes, enum constants) and [`Class::define`] links
//! the member table once. Splitting the two lets classes refer to each other,
//! and to themselves, in their method signatures.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use rustc_hash::{FxHashSet, FxHasher};

use super::method::{Method, MethodBody};
use super::object::{Object, ObjectRef};
use super::types::{RawType, Type, TypeVariable};
use super::value::Value;
use crate::{AdapterError, AdapterResult};

/// Shared reference to a class
pub type ClassRef = Arc<Class>;

/// Constructor of instances of a class
pub type Constructor = Arc<dyn Fn(&ClassRef, &[Value]) -> AdapterResult<ObjectRef> + Send + Sync>;

/// Process-unique class identity. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        ClassId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// What kind of type a class is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Concrete class
    Class,
    /// Interface
    Interface,
    /// Enumeration
    Enum,
    /// Synthesized proxy class implementing a set of interfaces
    Proxy,
}

/// Weak reference to a class, used inside type expressions
#[derive(Clone)]
pub struct ClassHandle {
    id: ClassId,
    name: Arc<str>,
    class: Weak<Class>,
}

impl ClassHandle {
    /// Id of the referenced class
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Name of the referenced class. Available after the class was dropped.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upgrade to the class, if it is still alive
    pub fn upgrade(&self) -> Option<ClassRef> {
        self.class.upgrade()
    }

    /// Whether the class is still alive
    pub fn is_live(&self) -> bool {
        self.class.strong_count() > 0
    }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassHandle {}

impl Hash for ClassHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

type EqualsHook = Arc<dyn Fn(&Object, &Object) -> bool + Send + Sync>;
type HashHook = Arc<dyn Fn(&Object) -> u64 + Send + Sync>;

/// Value-based equality for instances of a class
#[derive(Clone)]
pub(crate) struct IdentityHooks {
    pub(crate) equals: EqualsHook,
    pub(crate) hash: HashHook,
}

/// Member table of a class
#[derive(Default)]
pub struct Members {
    type_parameters: Vec<Arc<TypeVariable>>,
    methods: Vec<Method>,
    constructor: Option<Constructor>,
    identity: Option<IdentityHooks>,
}

impl Members {
    /// Create an empty member table
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class type parameter
    pub fn type_parameter(mut self, var: Arc<TypeVariable>) -> Self {
        self.type_parameters.push(var);
        self
    }

    /// Declare an abstract method
    pub fn abstract_method(
        mut self,
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        self.methods
            .push(Method::new(name.into(), parameter_types, return_type, Vec::new(), None));
        self
    }

    /// Declare an abstract generic method with its own type parameters
    pub fn generic_method(
        mut self,
        name: impl Into<String>,
        type_parameters: Vec<Arc<TypeVariable>>,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        self.methods.push(Method::new(
            name.into(),
            parameter_types,
            return_type,
            type_parameters,
            None,
        ));
        self
    }

    /// Declare a method with a native body
    pub fn method<F>(
        mut self,
        name: impl Into<String>,
        parameter_types: Vec<Type>,
        return_type: Type,
        body: F,
    ) -> Self
    where
        F: Fn(&ObjectRef, &[Value]) -> AdapterResult<Value> + Send + Sync + 'static,
    {
        let body: MethodBody = Arc::new(body);
        self.methods.push(Method::new(
            name.into(),
            parameter_types,
            return_type,
            Vec::new(),
            Some(body),
        ));
        self
    }

    /// Set the constructor used by [`Class::new_instance`]
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&ClassRef, &[Value]) -> AdapterResult<ObjectRef> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Compare and hash instances by their state of type `T` instead of by
    /// reference.
    pub fn value_identity<T>(mut self) -> Self
    where
        T: PartialEq + Hash + Send + Sync + 'static,
    {
        self.identity = Some(IdentityHooks {
            equals: Arc::new(|a: &Object, b: &Object| match (a.state::<T>(), b.state::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }),
            hash: Arc::new(|object: &Object| {
                object.state::<T>().map_or(0, |state| {
                    let mut hasher = FxHasher::default();
                    state.hash(&mut hasher);
                    hasher.finish()
                })
            }),
        });
        self
    }
}

struct LinkedMembers {
    type_parameters: Vec<Arc<TypeVariable>>,
    methods: Vec<Arc<Method>>,
    constructor: Option<Constructor>,
    identity: Option<IdentityHooks>,
}

/// A class, interface, enum or proxy class
pub struct Class {
    id: ClassId,
    name: Arc<str>,
    kind: ClassKind,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    enum_constants: Vec<Arc<str>>,
    members: OnceCell<LinkedMembers>,
}

impl Class {
    /// Create a proxy class implementing the given interfaces, in order
    pub fn proxy(interfaces: Vec<ClassRef>) -> ClassRef {
        let names: Vec<&str> = interfaces.iter().map(|i| i.name()).collect();
        let class = Class {
            id: ClassId::next(),
            name: format!("$Proxy[{}]", names.join(", ")).into(),
            kind: ClassKind::Proxy,
            superclass: None,
            interfaces,
            enum_constants: Vec::new(),
            members: OnceCell::new(),
        };
        let class = Arc::new(class);
        class.link(Members::new());
        class
    }

    /// Link the member table of a class created with [`ClassBuilder::declare`]
    pub fn define(&self, members: Members) -> AdapterResult<()> {
        if self.link(members) {
            Ok(())
        } else {
            Err(AdapterError::InvalidArgument(format!(
                "Class {} is already defined",
                self.name
            )))
        }
    }

    fn link(&self, members: Members) -> bool {
        let methods = members
            .methods
            .into_iter()
            .map(|mut method| {
                method.set_declaring_class(self.name.clone());
                Arc::new(method)
            })
            .collect();
        self.members
            .set(LinkedMembers {
                type_parameters: members.type_parameters,
                methods,
                constructor: members.constructor,
                identity: members.identity,
            })
            .is_ok()
    }

    /// Whether the member table has been linked
    pub fn is_defined(&self) -> bool {
        self.members.get().is_some()
    }

    /// Unique id
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Fully qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its package prefix
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Kind of class
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Whether this is an enum
    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    /// Whether this is a synthesized proxy class
    pub fn is_proxy(&self) -> bool {
        self.kind == ClassKind::Proxy
    }

    /// Direct superclass
    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    /// Directly implemented (or, for interfaces, extended) interfaces
    pub fn interfaces(&self) -> &[ClassRef] {
        &self.interfaces
    }

    /// Names of the enum constants, in declaration order
    pub fn enum_constants(&self) -> impl Iterator<Item = &str> + '_ {
        self.enum_constants.iter().map(|c| &**c)
    }

    pub(crate) fn enum_constant(&self, name: &str) -> Option<&Arc<str>> {
        self.enum_constants.iter().find(|c| &***c == name)
    }

    /// Weak handle to this class
    pub fn handle(self: &Arc<Self>) -> ClassHandle {
        ClassHandle {
            id: self.id,
            name: self.name.clone(),
            class: Arc::downgrade(self),
        }
    }

    /// Class type parameters
    pub fn type_parameters(&self) -> &[Arc<TypeVariable>] {
        self.members
            .get()
            .map(|m| m.type_parameters.as_slice())
            .unwrap_or(&[])
    }

    /// Methods declared directly by this class
    pub fn declared_methods(&self) -> &[Arc<Method>] {
        self.members
            .get()
            .map(|m| m.methods.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn identity(&self) -> Option<&IdentityHooks> {
        self.members.get().and_then(|m| m.identity.as_ref())
    }

    /// Whether an instance of `other` is an instance of this class
    pub fn is_assignable_from(&self, other: &Class) -> bool {
        if self.id == other.id {
            return true;
        }
        if let Some(superclass) = &other.superclass {
            if self.is_assignable_from(superclass) {
                return true;
            }
        }
        other.interfaces.iter().any(|i| self.is_assignable_from(i))
    }

    /// Whether the value is an instance of this class
    pub fn is_instance(&self, value: &Value) -> bool {
        match value {
            Value::Object(object) => self.is_assignable_from(object.class()),
            Value::Enum(constant) => constant.class().id == self.id,
            _ => false,
        }
    }

    /// Every interface this class implements, directly or not, breadth-first
    pub fn interface_closure(&self) -> Vec<ClassRef> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        let mut queue: VecDeque<&Class> = VecDeque::new();
        queue.push_back(self);
        while let Some(class) = queue.pop_front() {
            if let Some(superclass) = &class.superclass {
                queue.push_back(superclass);
            }
            for interface in &class.interfaces {
                if seen.insert(interface.id) {
                    result.push(interface.clone());
                    queue.push_back(interface);
                }
            }
        }
        result
    }

    /// Find the method to run for a call with the given erased parameter
    /// types on an instance of this class.
    ///
    /// The superclass chain is searched first, then every implemented
    /// interface for a default method. Proxy classes also match abstract
    /// interface declarations, their instances dispatch them dynamically.
    pub fn find_method(&self, name: &str, parameter_types: &[RawType]) -> Option<Arc<Method>> {
        self.find(|method| {
            method.name() == name && method.has_erased_parameters(parameter_types)
        })
    }

    /// Find the method to run for a call by name and argument count
    pub fn find_method_by_arity(&self, name: &str, arity: usize) -> Option<Arc<Method>> {
        self.find(|method| method.name() == name && method.parameter_types().len() == arity)
    }

    fn find(&self, matches: impl Fn(&Method) -> bool) -> Option<Arc<Method>> {
        let mut current = Some(self);
        while let Some(class) = current {
            let found = class
                .declared_methods()
                .iter()
                .find(|m| !m.is_abstract() && matches(m));
            if found.is_some() {
                return found.cloned();
            }
            current = class.superclass.as_deref();
        }

        let interfaces = self.interface_closure();
        let concrete = interfaces.iter().find_map(|interface| {
            interface
                .declared_methods()
                .iter()
                .find(|m| !m.is_abstract() && matches(m))
                .cloned()
        });
        if concrete.is_some() || !self.is_proxy() {
            return concrete;
        }

        interfaces.iter().find_map(|interface| {
            interface
                .declared_methods()
                .iter()
                .find(|m| matches(m))
                .cloned()
        })
    }

    /// Create an instance through the class constructor
    pub fn new_instance(self: &Arc<Self>, args: &[Value]) -> AdapterResult<ObjectRef> {
        let constructor = self
            .members
            .get()
            .and_then(|m| m.constructor.clone())
            .ok_or_else(|| {
                AdapterError::InvalidArgument(format!("Class {} has no constructor", self.name))
            })?;
        constructor(self, args)
    }
}

pub(crate) fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builder for class headers
pub struct ClassBuilder {
    name: Arc<str>,
    kind: ClassKind,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    enum_constants: Vec<Arc<str>>,
}

impl ClassBuilder {
    fn new(name: impl Into<Arc<str>>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            enum_constants: Vec::new(),
        }
    }

    /// Start a concrete class
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ClassKind::Class)
    }

    /// Start an interface
    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ClassKind::Interface)
    }

    /// Start an enum with the given constants
    pub fn enumeration<I, S>(name: impl Into<Arc<str>>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let mut builder = Self::new(name, ClassKind::Enum);
        builder.enum_constants = constants.into_iter().map(Into::into).collect();
        builder
    }

    /// Extend a superclass, or for interfaces a superinterface
    pub fn extends(mut self, parent: &ClassRef) -> Self {
        if self.kind == ClassKind::Interface {
            self.interfaces.push(parent.clone());
        } else {
            self.superclass = Some(parent.clone());
        }
        self
    }

    /// Implement an interface
    pub fn implements(mut self, interface: &ClassRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Create the class header. Members are linked later with [`Class::define`].
    pub fn declare(self) -> ClassRef {
        Arc::new(Class {
            id: ClassId::next(),
            name: self.name,
            kind: self.kind,
            superclass: self.superclass,
            interfaces: self.interfaces,
            enum_constants: self.enum_constants,
            members: OnceCell::new(),
        })
    }

    /// Create the class and link its members
    pub fn build(self, members: Members) -> ClassRef {
        let class = self.declare();
        class.link(members);
        class
    }
}
