//! View builder

use std::sync::Arc;

use super::decoration::ViewDecoration;
use super::view::{create_view, ViewGraph};
use super::AdapterContext;
use crate::reflect::{ClassRef, ObjectRef, Value};
use crate::AdapterResult;

/// Creates decorated views of one type.
///
/// Obtained from [`ObjectGraphAdapter::builder`](super::ObjectGraphAdapter::builder).
/// A builder can be reused for several sources.
pub struct ViewBuilder {
    view_type: ClassRef,
    context: Arc<AdapterContext>,
    graph: Option<Arc<ViewGraph>>,
    decorations: Vec<ViewDecoration>,
}

impl ViewBuilder {
    pub(crate) fn new(
        view_type: ClassRef,
        context: Arc<AdapterContext>,
        graph: Option<Arc<ViewGraph>>,
    ) -> Self {
        Self {
            view_type,
            context,
            graph,
            decorations: Vec::new(),
        }
    }

    /// Make the methods of `mix_in` available on every view of `target`
    /// created from this builder, including views reached through it
    pub fn mix_in_to(mut self, target: &ClassRef, mix_in: ObjectRef) -> Self {
        self.decorations.push(ViewDecoration::BeanMixIn {
            target: target.clone(),
            instance: mix_in,
        });
        self
    }

    /// Make the methods of `mix_in_class` available on every view of
    /// `target`. One instance is created per view, with the view as the only
    /// constructor argument.
    pub fn mix_in_class(mut self, target: &ClassRef, mix_in_class: &ClassRef) -> Self {
        self.decorations.push(ViewDecoration::ClassMixIn {
            target: target.clone(),
            mix_in: mix_in_class.clone(),
        });
        self
    }

    /// Create the view of `source`
    pub fn build(&self, source: Value) -> AdapterResult<Value> {
        if source.is_null() {
            return Ok(Value::Null);
        }
        let decoration = ViewDecoration::chain(self.decorations.clone());
        let graph = match &self.graph {
            Some(graph) => graph.clone(),
            None => ViewGraph::new(self.context.clone()),
        };
        create_view(&self.view_type, source, &decoration, &graph)
    }
}
