//! Target type resolution

use std::sync::Arc;

use crate::reflect::{ClassRef, Value};

/// Chooses the type of the view created for a source object.
///
/// Lets a consumer refine the requested type based on the source, for
/// example to pick a more specific interface the consumer knows about.
/// Closures `Fn(&ClassRef, &Value) -> ClassRef` implement this trait.
pub trait TargetTypeProvider: Send + Sync {
    /// Type of the view of `source` requested as `initial_target_type`
    fn target_type(&self, initial_target_type: &ClassRef, source: &Value) -> ClassRef;
}

impl<F> TargetTypeProvider for F
where
    F: Fn(&ClassRef, &Value) -> ClassRef + Send + Sync,
{
    fn target_type(&self, initial_target_type: &ClassRef, source: &Value) -> ClassRef {
        self(initial_target_type, source)
    }
}

/// Provider that keeps the requested type
pub fn identity_type_provider() -> Arc<dyn TargetTypeProvider> {
    Arc::new(|target: &ClassRef, _source: &Value| target.clone())
}
