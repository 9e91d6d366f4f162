//! Protoview: dynamic protocol-to-model adapter
//!
//! Lets a consumer of a public object model talk to arbitrary provider-side
//! objects, possibly from an older or newer version of the provider, through
//! stable interfaces. Neither side depends on the other's concrete classes.
//!
//! This crate provides:
//! - A reflective object model (classes, generic types, objects, proxies)
//! - View synthesis with structural (name and signature) method matching
//! - A layered, cached method dispatch pipeline with fallbacks
//! - Identity preserving, weakly keyed view caching per object graph
//! - Recursive conversion of collections, maps and enums
//! - Mix-ins that add behavior to views
//!
//! ```ignore
//! let adapter = ProtocolToModelAdapter::new();
//! let view = adapter.adapt(&person_interface, Value::Object(source))?;
//! let name = view.as_object().unwrap().invoke("getName", &[])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod adapter;
pub mod defaults;
pub mod reflect;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub use adapter::{
    to_words, AdapterOptions, CacheStats, GraphAdapter, ModelContractRegistry,
    ObjectGraphAdapter, ProtocolToModelAdapter, TargetTypeProvider, ViewBuilder,
};
pub use reflect::{
    Class, ClassBuilder, ClassRef, EnumConstant, Members, Object, ObjectRef, Type, TypeVariable,
    Value, WeakObjectRef,
};

/// Adapter errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    /// No dispatch stage resolved a call made on a view
    #[error(
        "Unsupported method: {0}.\n\
         The version of the provider you are connected to does not support that method.\n\
         To resolve the problem you can change/upgrade the target version of the provider you connect to.\n\
         Alternatively, you can ignore this error and read other information from the model."
    )]
    UnsupportedMethod(String),

    /// A value does not name a constant of the target enum
    #[error(
        "Cannot convert string value '{literal}' to an enum value of type '{enum_type}' (valid case insensitive values: {valid})"
    )]
    InvalidEnumLiteral {
        /// The literal that was matched
        literal: String,
        /// Name of the enum
        enum_type: String,
        /// Every constant, comma separated
        valid: String,
    },

    /// The object passed to unpack is not a view
    #[error("The given object is not a view object")]
    NotAView,

    /// A value cannot be converted to the requested type
    #[error("Cannot convert object of {source_type} to {target_type}.")]
    UnsupportedConversion {
        /// Runtime type of the value
        source_type: String,
        /// Requested type
        target_type: String,
    },

    /// A direct call named a method the class does not have
    #[error("No method {method} on {class}")]
    NoSuchMethod {
        /// Class searched
        class: String,
        /// Method name
        method: String,
    },

    /// Misuse of the reflective model
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Domain error raised by a method body
    #[error(transparent)]
    Raised(RaisedError),
}

impl AdapterError {
    /// Wrap a domain error raised by a method body
    pub fn raised<E: Error + Send + Sync + 'static>(error: E) -> Self {
        AdapterError::Raised(RaisedError(Arc::new(error)))
    }
}

/// Adapter result
pub type AdapterResult<T> = Result<T, AdapterError>;

/// A domain error raised by a method body
#[derive(Clone)]
pub struct RaisedError(Arc<dyn Error + Send + Sync>);

impl RaisedError {
    /// Downcast to the concrete error type
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for RaisedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}
