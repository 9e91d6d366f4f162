//! Methods

use std::fmt;
use std::sync::Arc;

use super::object::ObjectRef;
use super::types::{RawType, Type, TypeVariable};
use super::value::Value;
use crate::AdapterResult;

/// Native method body. Receives the receiver and the arguments.
pub type MethodBody = Arc<dyn Fn(&ObjectRef, &[Value]) -> AdapterResult<Value> + Send + Sync>;

/// A method declared by a class or interface
pub struct Method {
    name: String,
    declaring_class: Arc<str>,
    parameter_types: Vec<Type>,
    return_type: Type,
    type_parameters: Vec<Arc<TypeVariable>>,
    body: Option<MethodBody>,
}

impl Method {
    pub(crate) fn new(
        name: String,
        parameter_types: Vec<Type>,
        return_type: Type,
        type_parameters: Vec<Arc<TypeVariable>>,
        body: Option<MethodBody>,
    ) -> Self {
        Self {
            name,
            declaring_class: Arc::from(""),
            parameter_types,
            return_type,
            type_parameters,
            body,
        }
    }

    pub(crate) fn set_declaring_class(&mut self, name: Arc<str>) {
        self.declaring_class = name;
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the class or interface declaring this method
    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    /// Declared generic return type
    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    /// Method type parameters
    pub fn type_parameters(&self) -> &[Arc<TypeVariable>] {
        &self.type_parameters
    }

    /// Whether the method has no body
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }

    pub(crate) fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    /// Whether the erased parameter types are exactly `parameter_types`
    pub fn has_erased_parameters(&self, parameter_types: &[RawType]) -> bool {
        self.parameter_types.len() == parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(parameter_types)
                .all(|(declared, wanted)| declared.erasure() == *wanted)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}(", self.return_type, self.declaring_class, self.name)?;
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}
