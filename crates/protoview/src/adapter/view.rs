//! Views and view graphs
//!
//! A view is a proxy object implementing the requested interface whose calls
//! are resolved against a source object by a dispatch pipeline. Views are
//! cached per graph, keyed by the identity of their source, the view type and
//! the decoration, and held weakly so that a graph never keeps a source or
//! one of its views alive.

use std::any::Any;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::contract::model_contract_interfaces;
use super::decoration::ViewDecoration;
use super::enums::adapt_to_enum;
use super::invocation::MethodInvocation;
use super::invoker::{ChainedMethodInvoker, InvocationStage, MethodInvoker, Pipeline};
use super::stages::{AdaptingStage, PropertyCachingStage, SafeMethodStage, SupportedPropertyStage};
use super::weak_map::WeakIdentityHashMap;
use super::AdapterContext;
use crate::reflect::{simple_name, ClassRef, InvocationHandler, Method, Object, ObjectRef, Value, WeakObjectRef};
use crate::{AdapterError, AdapterResult};

/// Cache key of a view within the views of one source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ViewKey {
    view_type: ClassRef,
    decoration: ViewDecoration,
}

type SourceViews = Arc<Mutex<FxHashMap<ViewKey, WeakObjectRef>>>;

/// Views created in one scope
pub(crate) struct ViewGraph {
    views: WeakIdentityHashMap<Object, SourceViews>,
    context: Arc<AdapterContext>,
}

impl ViewGraph {
    pub(crate) fn new(context: Arc<AdapterContext>) -> Arc<Self> {
        Arc::new(Self {
            views: WeakIdentityHashMap::new(),
            context,
        })
    }

    pub(crate) fn context(&self) -> &Arc<AdapterContext> {
        &self.context
    }

    /// Number of sources with cached views
    pub(crate) fn cached_sources(&self) -> usize {
        self.views.size()
    }
}

/// Adapt `source` to `target` within `graph`
pub(crate) fn create_view(
    target: &ClassRef,
    source: Value,
    decoration: &ViewDecoration,
    graph: &Arc<ViewGraph>,
) -> AdapterResult<Value> {
    let source = match source {
        Value::Null => return Ok(Value::Null),
        Value::Lazy(supplier) => return create_view(target, supplier()?, decoration, graph),
        other => other,
    };

    let context = &graph.context;
    let view_type = context.type_provider.target_type(target, &source);
    if view_type.is_instance(&source) {
        return Ok(source);
    }
    if target.is_enum() {
        return adapt_to_enum(target, &source);
    }
    let source_object = match &source {
        Value::Object(object) if view_type.is_interface() => object.clone(),
        _ => {
            return Err(AdapterError::UnsupportedConversion {
                source_type: source.type_name(),
                target_type: view_type.name().to_string(),
            })
        }
    };

    let decoration = if decoration.is_no_op() {
        ViewDecoration::NoOp
    } else {
        decoration.restrict_to(&context.type_inspector.reachable_types(target))
    };
    let key = ViewKey {
        view_type: view_type.clone(),
        decoration,
    };

    let source_views = graph
        .views
        .compute_if_absent(&source_object, SourceViews::default);
    let mut views = source_views.lock();
    if let Some(view) = views.get(&key).and_then(Weak::upgrade) {
        trace!(view_type = view_type.name(), "reusing view");
        return Ok(Value::Object(view));
    }

    let interfaces = model_contract_interfaces(&context.contracts, target, &source_object, &view_type);
    let proxy_class = context.proxy_class(interfaces);
    let handler = ViewHandler::new(target.clone(), source_object, key.decoration.clone(), graph.clone());
    let view = Object::new_proxy(proxy_class, handler)?;

    views.retain(|_, view| view.strong_count() > 0);
    views.insert(key, Arc::downgrade(&view));
    debug!(
        view_type = view_type.name(),
        class = view.class().name(),
        "created view"
    );
    Ok(Value::Object(view))
}

/// Source of a view, or [`AdapterError::NotAView`]
pub(crate) fn unpack(view: &Value) -> AdapterResult<ObjectRef> {
    view.as_object()
        .and_then(|object| object.proxy_handler())
        .and_then(|handler| handler.as_any().downcast_ref::<ViewHandler>())
        .map(|handler| handler.source.clone())
        .ok_or(AdapterError::NotAView)
}

/// Invocation handler of a view
pub(crate) struct ViewHandler {
    target_type: ClassRef,
    source: ObjectRef,
    pipeline: Pipeline,
}

impl ViewHandler {
    fn new(
        target_type: ClassRef,
        source: ObjectRef,
        decoration: ViewDecoration,
        graph: Arc<ViewGraph>,
    ) -> Self {
        let reflection = &graph.context.reflection;
        let mut invokers: Vec<Box<dyn MethodInvoker>> = Vec::new();
        decoration.collect_invokers(&target_type, reflection, &mut invokers);
        let terminal: Box<dyn MethodInvoker> = if invokers.is_empty() {
            Box::new(reflection.clone())
        } else {
            invokers.push(Box::new(reflection.clone()));
            Box::new(ChainedMethodInvoker::new(invokers))
        };

        let stages: Vec<Box<dyn InvocationStage>> = vec![
            Box::new(AdaptingStage::new(decoration, graph)),
            Box::new(SupportedPropertyStage),
            Box::new(PropertyCachingStage::new()),
            Box::new(SafeMethodStage),
        ];
        Self {
            target_type,
            source,
            pipeline: Pipeline::new(stages, terminal),
        }
    }
}

impl InvocationHandler for ViewHandler {
    fn invoke(&self, proxy: &ObjectRef, method: &Method, args: &[Value]) -> AdapterResult<Value> {
        let mut invocation = MethodInvocation::new(
            method.name(),
            method.return_type(),
            method.parameter_types(),
            args,
            proxy,
            &self.target_type,
            &self.source,
        );
        self.pipeline.invoke(&mut invocation)?;
        invocation.into_result().ok_or_else(|| {
            let name = format!("{}.{}()", simple_name(method.declaring_class()), method.name());
            debug!(method = %name, source = %self.source, "unsupported method");
            AdapterError::UnsupportedMethod(name)
        })
    }

    fn equals(&self, other: &dyn InvocationHandler) -> bool {
        other
            .as_any()
            .downcast_ref::<ViewHandler>()
            .map_or(false, |other| self.source.equals(&other.source))
    }

    fn hash_code(&self) -> u64 {
        self.source.hash_code()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
