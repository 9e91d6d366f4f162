//! Protocol to model adapter
//!
//! Adapts provider-side source objects to consumer-side interfaces. The view
//! of a source is a proxy implementing the requested interface; each call on
//! it is resolved structurally against the source (same method name, same
//! erased parameter types), with a few fallbacks:
//!
//! - mix-ins attached to the view take precedence over the source
//! - `getX(default)` answers the default when `getX()` is missing or null
//! - `isXSupported()` answers whether `getX()` exists
//! - getter results are cached per view
//!
//! Results are converted to the declared return type, so a method declared
//! to return `List<Task>` returns views of the source's tasks.
//!
//! Views created by one top-level `adapt` call, or by one [`GraphAdapter`],
//! share a graph: the same source adapted to the same type twice within a
//! graph gives the same view, as long as the first one is still alive.

mod builder;
mod contract;
mod convert;
mod decoration;
mod enums;
mod invocation;
mod invoker;
mod method_cache;
mod mixin;
mod options;
mod proxy_classes;
mod stages;
mod target_type;
mod type_inspector;
mod view;
mod weak_map;

use std::sync::Arc;

pub use builder::ViewBuilder;
pub use contract::ModelContractRegistry;
pub use decoration::ViewDecoration;
pub use enums::to_words;
pub use invocation::MethodInvocation;
pub use invoker::{
    ChainedMethodInvoker, InvocationStage, MethodInvoker, Next, Pipeline, ReflectionMethodInvoker,
};
pub use method_cache::{CacheStats, MethodInvocationCache};
pub use mixin::{BeanMixInMethodInvoker, ClassMixInMethodInvoker};
pub use options::AdapterOptions;
pub use stages::{AdaptingStage, PropertyCachingStage, SafeMethodStage, SupportedPropertyStage};
pub use target_type::{identity_type_provider, TargetTypeProvider};
pub use type_inspector::TypeInspector;
pub use weak_map::WeakIdentityHashMap;

use crate::reflect::{ClassRef, ObjectRef, Value};
use crate::AdapterResult;
use proxy_classes::ProxyClassCache;
use view::{create_view, ViewGraph};

/// State shared by an adapter, its graphs and their views
pub(crate) struct AdapterContext {
    reflection: Arc<ReflectionMethodInvoker>,
    type_inspector: TypeInspector,
    type_provider: Arc<dyn TargetTypeProvider>,
    contracts: Arc<ModelContractRegistry>,
    proxy_classes: ProxyClassCache,
}

impl AdapterContext {
    fn new(options: AdapterOptions) -> Self {
        Self {
            reflection: Arc::new(ReflectionMethodInvoker::new(
                options.lookup_cleanup_interval,
                options.lookup_cleanup_miss_stride,
            )),
            type_inspector: TypeInspector::new(),
            type_provider: options.type_provider,
            contracts: options.contracts,
            proxy_classes: ProxyClassCache::new(),
        }
    }

    /// The proxy class implementing exactly `interfaces`, in order
    fn proxy_class(&self, interfaces: Vec<ClassRef>) -> ClassRef {
        self.proxy_classes.get_or_create(interfaces)
    }
}

/// Adapts source objects to views
pub trait ObjectGraphAdapter {
    /// View of `source` implementing `target_type`.
    ///
    /// Null gives null. A source that already is an instance of the type is
    /// returned unchanged, and enum types are matched by constant name.
    fn adapt(&self, target_type: &ClassRef, source: Value) -> AdapterResult<Value>;

    /// Builder for decorated views of `view_type`
    fn builder(&self, view_type: &ClassRef) -> ViewBuilder;
}

/// Adapts source objects to views. Each call to
/// [`adapt`](ObjectGraphAdapter::adapt) starts a new graph.
#[derive(Clone)]
pub struct ProtocolToModelAdapter {
    context: Arc<AdapterContext>,
}

impl Default for ProtocolToModelAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolToModelAdapter {
    /// Create an adapter with default options
    pub fn new() -> Self {
        Self::with_options(AdapterOptions::default())
    }

    /// Create an adapter with the given options
    pub fn with_options(options: AdapterOptions) -> Self {
        Self {
            context: Arc::new(AdapterContext::new(options)),
        }
    }

    /// Adapter whose adaptations all share one graph
    pub fn new_graph(&self) -> GraphAdapter {
        GraphAdapter {
            graph: ViewGraph::new(self.context.clone()),
        }
    }

    /// Source object of a view
    pub fn unpack(&self, view: &Value) -> AdapterResult<ObjectRef> {
        view::unpack(view)
    }

    /// Model contract declarations
    pub fn contracts(&self) -> &ModelContractRegistry {
        &self.context.contracts
    }

    /// Method lookup cache counters
    pub fn lookup_cache_stats(&self) -> CacheStats {
        self.context.reflection.stats()
    }

    /// Number of proxy classes currently in use by live views
    pub fn cached_proxy_classes(&self) -> usize {
        self.context.proxy_classes.len()
    }
}

impl ObjectGraphAdapter for ProtocolToModelAdapter {
    fn adapt(&self, target_type: &ClassRef, source: Value) -> AdapterResult<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        let graph = ViewGraph::new(self.context.clone());
        create_view(target_type, source, &ViewDecoration::NoOp, &graph)
    }

    fn builder(&self, view_type: &ClassRef) -> ViewBuilder {
        ViewBuilder::new(view_type.clone(), self.context.clone(), None)
    }
}

/// Adapter sharing one view graph across all its adaptations
#[derive(Clone)]
pub struct GraphAdapter {
    graph: Arc<ViewGraph>,
}

impl GraphAdapter {
    /// Number of source objects the graph currently caches views for
    pub fn cached_sources(&self) -> usize {
        self.graph.cached_sources()
    }
}

impl ObjectGraphAdapter for GraphAdapter {
    fn adapt(&self, target_type: &ClassRef, source: Value) -> AdapterResult<Value> {
        create_view(target_type, source, &ViewDecoration::NoOp, &self.graph)
    }

    fn builder(&self, view_type: &ClassRef) -> ViewBuilder {
        ViewBuilder::new(
            view_type.clone(),
            self.graph.context().clone(),
            Some(self.graph.clone()),
        )
    }
}
