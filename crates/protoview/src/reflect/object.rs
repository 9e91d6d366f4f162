//! Objects and dynamic proxies
//!
//! An [`Object`] is an instance of a [`Class`](super::Class) carrying either native state
//! (any `Send + Sync` Rust value) or, for instances of proxy classes, an
//! [`InvocationHandler`] that receives every call made on the object.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use super::class::ClassRef;
use super::method::Method;
use super::value::Value;
use crate::{AdapterError, AdapterResult};

/// Shared reference to an object
pub type ObjectRef = Arc<Object>;

/// Weak reference to an object
pub type WeakObjectRef = Weak<Object>;

/// Receives the calls made on a proxy object
pub trait InvocationHandler: Any + Send + Sync {
    /// Handle a call of `method` on `proxy`
    fn invoke(&self, proxy: &ObjectRef, method: &Method, args: &[Value]) -> AdapterResult<Value>;

    /// Equality of two proxies, decided by their handlers
    fn equals(&self, other: &dyn InvocationHandler) -> bool;

    /// Hash of the proxy
    fn hash_code(&self) -> u64;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

enum ObjectState {
    Native(Box<dyn Any + Send + Sync>),
    Proxy(Box<dyn InvocationHandler>),
}

/// An instance of a class
pub struct Object {
    class: ClassRef,
    state: ObjectState,
}

impl Object {
    /// Create an instance of `class` with native state
    pub fn new<T: Any + Send + Sync>(class: &ClassRef, state: T) -> ObjectRef {
        Arc::new(Self {
            class: class.clone(),
            state: ObjectState::Native(Box::new(state)),
        })
    }

    /// Create an instance of a proxy class dispatching every call to `handler`
    pub fn new_proxy<H: InvocationHandler>(class: ClassRef, handler: H) -> AdapterResult<ObjectRef> {
        if !class.is_proxy() {
            return Err(AdapterError::InvalidArgument(format!(
                "{} is not a proxy class",
                class.name()
            )));
        }
        Ok(Arc::new(Self {
            class,
            state: ObjectState::Proxy(Box::new(handler)),
        }))
    }

    /// Runtime class
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Native state, if it is of type `T`
    pub fn state<T: Any>(&self) -> Option<&T> {
        match &self.state {
            ObjectState::Native(state) => state.downcast_ref(),
            ObjectState::Proxy(_) => None,
        }
    }

    /// Native state of type `T`, or an error naming the class
    pub fn expect_state<T: Any>(&self) -> AdapterResult<&T> {
        self.state().ok_or_else(|| {
            AdapterError::InvalidArgument(format!(
                "Unexpected state type for instance of {}",
                self.class.name()
            ))
        })
    }

    /// Whether this object is a proxy
    pub fn is_proxy(&self) -> bool {
        matches!(self.state, ObjectState::Proxy(_))
    }

    /// The invocation handler of a proxy
    pub fn proxy_handler(&self) -> Option<&dyn InvocationHandler> {
        match &self.state {
            ObjectState::Proxy(handler) => Some(handler.as_ref()),
            ObjectState::Native(_) => None,
        }
    }

    /// Object equality. Proxies ask their handlers, classes with value
    /// identity compare state, everything else compares references.
    pub fn equals(&self, other: &Object) -> bool {
        match (&self.state, &other.state) {
            (ObjectState::Proxy(a), ObjectState::Proxy(b)) => a.equals(b.as_ref()),
            (ObjectState::Proxy(_), _) | (_, ObjectState::Proxy(_)) => false,
            _ => match self.class.identity() {
                Some(hooks) => (hooks.equals)(self, other),
                None => std::ptr::eq(self, other),
            },
        }
    }

    /// Hash consistent with [`Object::equals`]
    pub fn hash_code(&self) -> u64 {
        match &self.state {
            ObjectState::Proxy(handler) => handler.hash_code(),
            ObjectState::Native(_) => match self.class.identity() {
                Some(hooks) => (hooks.hash)(self),
                None => self as *const Object as usize as u64,
            },
        }
    }

    /// Call a method by name.
    ///
    /// Proxies answer `equals`, `hashCode` and `toString` themselves and send
    /// every other call to their handler. Native objects run the first
    /// method of their class with this name and argument count.
    pub fn invoke(self: &Arc<Self>, name: &str, args: &[Value]) -> AdapterResult<Value> {
        if self.is_proxy() {
            if let Some(value) = self.invoke_builtin(name, args) {
                return Ok(value);
            }
        }
        match self.class.find_method_by_arity(name, args.len()) {
            Some(method) => self.invoke_method(&method, args),
            None => self.invoke_builtin(name, args).ok_or_else(|| AdapterError::NoSuchMethod {
                class: self.class.name().to_string(),
                method: name.to_string(),
            }),
        }
    }

    /// Call the given method on this object
    pub fn invoke_method(self: &Arc<Self>, method: &Method, args: &[Value]) -> AdapterResult<Value> {
        if args.len() != method.parameter_types().len() {
            return Err(AdapterError::InvalidArgument(format!(
                "{} expects {} argument(s), got {}",
                method,
                method.parameter_types().len(),
                args.len()
            )));
        }
        match &self.state {
            ObjectState::Proxy(handler) => handler.invoke(self, method, args),
            ObjectState::Native(_) => match method.body() {
                Some(body) => body(self, args),
                None => Err(AdapterError::InvalidArgument(format!(
                    "Cannot invoke abstract method {}",
                    method
                ))),
            },
        }
    }

    fn invoke_builtin(&self, name: &str, args: &[Value]) -> Option<Value> {
        match (name, args) {
            ("equals", [other]) => Some(Value::Bool(match other {
                Value::Object(other) => self.equals(other),
                _ => false,
            })),
            ("hashCode", []) => Some(Value::Long(self.hash_code() as i64)),
            ("toString", []) => Some(Value::from(self.to_string())),
            _ => None,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class.name(), self.hash_code())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class.name())
            .field("proxy", &self.is_proxy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{Class, ClassBuilder, Members, Type};

    #[derive(PartialEq, Hash)]
    struct Point(i32, i32);

    #[test]
    fn test_reference_identity_by_default() {
        let class = ClassBuilder::class("Thing").build(Members::new());
        let a = Object::new(&class, 1u8);
        let b = Object::new(&class, 1u8);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_value_identity() {
        let class = ClassBuilder::class("Point").build(Members::new().value_identity::<Point>());
        let a = Object::new(&class, Point(1, 2));
        let b = Object::new(&class, Point(1, 2));
        let c = Object::new(&class, Point(2, 1));
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, c);
    }

    #[test]
    fn test_invoke_native_method() {
        let class = ClassBuilder::class("Adder").build(Members::new().method(
            "add",
            vec![Type::int(), Type::int()],
            Type::int(),
            |this, args| {
                let base = *this.expect_state::<i32>()?;
                Ok(Value::Int(base + args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0)))
            },
        ));
        let adder = Object::new(&class, 10i32);
        let sum = adder.invoke("add", &[Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(sum, Value::Int(13));

        assert!(matches!(
            adder.invoke("subtract", &[]),
            Err(AdapterError::NoSuchMethod { .. })
        ));
        assert_eq!(
            adder.invoke("equals", &[Value::Object(adder.clone())]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_proxy_requires_proxy_class() {
        struct Nothing;
        impl InvocationHandler for Nothing {
            fn invoke(&self, _: &ObjectRef, _: &Method, _: &[Value]) -> AdapterResult<Value> {
                Ok(Value::Null)
            }
            fn equals(&self, _: &dyn InvocationHandler) -> bool {
                false
            }
            fn hash_code(&self) -> u64 {
                7
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let class = ClassBuilder::class("Plain").build(Members::new());
        assert!(Object::new_proxy(class, Nothing).is_err());

        let named = ClassBuilder::interface("Named").build(
            Members::new().abstract_method("getName", vec![], Type::string()),
        );
        let proxy = Object::new_proxy(Class::proxy(vec![named]), Nothing).unwrap();
        assert!(proxy.is_proxy());
        assert_eq!(proxy.invoke("getName", &[]).unwrap(), Value::Null);
        assert_eq!(proxy.invoke("hashCode", &[]).unwrap(), Value::Long(7));
    }
}
