//! Reflective object model
//!
//! Classes with generic method signatures, objects carrying native state,
//! dynamic proxies and the values passed between them. The adapter only
//! ever sees objects through this model.

mod class;
mod method;
mod object;
mod types;
mod value;

pub use class::{Class, ClassBuilder, ClassHandle, ClassId, ClassKind, ClassRef, Constructor, Members};
pub use method::{Method, MethodBody};
pub use object::{InvocationHandler, Object, ObjectRef, WeakObjectRef};
pub use types::{
    ContainerKind, GenericRaw, RawType, ScalarKind, Type, TypeVariable, TypeVariableHandle,
};
pub use value::{EnumConstant, Supplier, Value};

pub(crate) use class::simple_name;
