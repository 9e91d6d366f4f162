//! Method invocation context

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::reflect::{ClassRef, ObjectRef, Type, Value};

static GETTER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:get|is)\p{Lu}").expect("getter pattern is valid"));

/// A call made on a view, on its way through the dispatch pipeline.
///
/// Starts unresolved. A stage that resolves the call stores the result,
/// which may be [`Value::Null`].
pub struct MethodInvocation<'a> {
    name: Cow<'a, str>,
    return_type: &'a Type,
    parameter_types: Cow<'a, [Type]>,
    parameters: Cow<'a, [Value]>,
    view: &'a ObjectRef,
    view_type: &'a ClassRef,
    delegate: &'a ObjectRef,
    result: Option<Value>,
}

impl<'a> MethodInvocation<'a> {
    /// Create an unresolved invocation
    pub fn new(
        name: &'a str,
        return_type: &'a Type,
        parameter_types: &'a [Type],
        parameters: &'a [Value],
        view: &'a ObjectRef,
        view_type: &'a ClassRef,
        delegate: &'a ObjectRef,
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            return_type,
            parameter_types: Cow::Borrowed(parameter_types),
            parameters: Cow::Borrowed(parameters),
            view,
            view_type,
            delegate,
            result: None,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared generic return type
    pub fn return_type(&self) -> &'a Type {
        self.return_type
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    /// Argument values
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// The view the call was made on
    pub fn view(&self) -> &'a ObjectRef {
        self.view
    }

    /// Type the view was created for
    pub fn view_type(&self) -> &'a ClassRef {
        self.view_type
    }

    /// Object the call is delegated to
    pub fn delegate(&self) -> &'a ObjectRef {
        self.delegate
    }

    /// Whether a stage resolved the call
    pub fn found(&self) -> bool {
        self.result.is_some()
    }

    /// Result, if resolved
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Resolve the call
    pub fn set_result(&mut self, value: Value) {
        self.result = Some(value);
    }

    /// Take the result out, leaving the call unresolved
    pub fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }

    /// Consume the invocation, returning its result
    pub fn into_result(self) -> Option<Value> {
        self.result
    }

    /// `get`/`is` followed by an uppercase letter
    pub fn is_is_or_get(&self) -> bool {
        GETTER_NAME.is_match(&self.name)
    }

    /// A getter: no parameters and a getter name
    pub fn is_getter(&self) -> bool {
        self.parameter_types.is_empty() && self.is_is_or_get()
    }

    /// Same call, sent to another delegate
    pub fn redirect<'b>(&'b self, delegate: &'b ObjectRef) -> MethodInvocation<'b> {
        MethodInvocation {
            name: Cow::Borrowed(&*self.name),
            return_type: self.return_type,
            parameter_types: Cow::Borrowed(&*self.parameter_types),
            parameters: Cow::Borrowed(&*self.parameters),
            view: self.view,
            view_type: self.view_type,
            delegate,
            result: None,
        }
    }

    /// A call of the no-argument method `name` on the same delegate
    pub fn getter<'b>(&'b self, name: Cow<'b, str>) -> MethodInvocation<'b> {
        MethodInvocation {
            name,
            return_type: self.return_type,
            parameter_types: Cow::Borrowed(&[]),
            parameters: Cow::Borrowed(&[]),
            view: self.view,
            view_type: self.view_type,
            delegate: self.delegate,
            result: None,
        }
    }

    /// Same method on another delegate, passing the view as the only argument
    pub fn with_view_argument<'b>(&'b self, delegate: &'b ObjectRef) -> MethodInvocation<'b> {
        MethodInvocation {
            name: Cow::Borrowed(&*self.name),
            return_type: self.return_type,
            parameter_types: Cow::Owned(vec![Type::of(self.view_type)]),
            parameters: Cow::Owned(vec![Value::Object(self.view.clone())]),
            view: self.view,
            view_type: self.view_type,
            delegate,
            result: None,
        }
    }
}
