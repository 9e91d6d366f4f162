//! Dispatch stages wrapped around the terminal invoker of every view

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::convert::convert;
use super::decoration::ViewDecoration;
use super::invocation::MethodInvocation;
use super::invoker::{InvocationStage, Next};
use super::view::ViewGraph;
use crate::reflect::Value;
use crate::AdapterResult;

/// Converts resolved results to the declared return type, producing views
/// in the same graph and with the same decoration as the calling view
pub struct AdaptingStage {
    decoration: ViewDecoration,
    graph: Arc<ViewGraph>,
}

impl AdaptingStage {
    pub(crate) fn new(decoration: ViewDecoration, graph: Arc<ViewGraph>) -> Self {
        Self { decoration, graph }
    }
}

impl InvocationStage for AdaptingStage {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()> {
        next.run(invocation)?;
        if let Some(result) = invocation.take_result() {
            let converted = if result.is_null() {
                result
            } else {
                convert(invocation.return_type(), result, &self.decoration, &self.graph)?
            };
            invocation.set_result(converted);
        }
        Ok(())
    }
}

/// Answers an unresolved `is<X>Supported()` with whether `get<X>()` resolves
pub struct SupportedPropertyStage;

impl InvocationStage for SupportedPropertyStage {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()> {
        next.run(invocation)?;
        if invocation.found() {
            return Ok(());
        }
        let name = invocation.name();
        if name.len() <= 11 || !name.starts_with("is") || !name.ends_with("Supported") {
            return Ok(());
        }
        let getter_name = format!("get{}", &name[2..name.len() - 9]);
        let found = {
            let mut probe = invocation.getter(Cow::Owned(getter_name));
            next.run(&mut probe)?;
            probe.found()
        };
        invocation.set_result(Value::Bool(found));
        Ok(())
    }
}

#[derive(Default)]
struct PropertyCache {
    properties: FxHashMap<String, Value>,
    unknown: FxHashSet<String>,
}

/// Remembers, per view, the value of each getter or the fact it is
/// unsupported
#[derive(Default)]
pub struct PropertyCachingStage {
    cache: Mutex<PropertyCache>,
}

impl PropertyCachingStage {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvocationStage for PropertyCachingStage {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()> {
        if !invocation.is_getter() {
            return next.run(invocation);
        }

        {
            let cache = self.cache.lock();
            if let Some(value) = cache.properties.get(invocation.name()) {
                invocation.set_result(value.clone());
                return Ok(());
            }
            if cache.unknown.contains(invocation.name()) {
                return Ok(());
            }
        }

        next.run(invocation)?;

        let mut cache = self.cache.lock();
        let name = invocation.name().to_string();
        match invocation.result() {
            Some(value) => {
                cache.properties.insert(name, value.clone());
            }
            None => {
                cache.unknown.insert(name);
            }
        }
        Ok(())
    }
}

/// Falls back from an unresolved `getX(default)` to `getX()`, answering the
/// default when the getter is missing or returns null
pub struct SafeMethodStage;

impl InvocationStage for SafeMethodStage {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()> {
        next.run(invocation)?;
        if invocation.found()
            || invocation.parameter_types().len() != 1
            || !invocation.is_is_or_get()
        {
            return Ok(());
        }
        let value = {
            let mut getter = invocation.getter(Cow::Borrowed(invocation.name()));
            next.run(&mut getter)?;
            getter.into_result()
        };
        match value {
            Some(value) if !value.is_null() => invocation.set_result(value),
            _ => {
                let default = invocation.parameters()[0].clone();
                invocation.set_result(default);
            }
        }
        Ok(())
    }
}
