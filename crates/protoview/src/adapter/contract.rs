//! Model contracts
//!
//! A model contract declares the sub-interfaces a model interface may be
//! refined into. A view of a source whose class implements one of those
//! sub-interfaces (matched by interface name, since provider and consumer
//! have their own copies of the interfaces) implements it too, so consumers
//! can test for and use the refinement.

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::reflect::{ClassId, ClassRef, ObjectRef};

/// Declared sub-interfaces of model interfaces
#[derive(Debug, Default)]
pub struct ModelContractRegistry {
    sub_types: RwLock<FxHashMap<ClassId, Vec<ClassRef>>>,
}

impl ModelContractRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `sub_types` as refinements of `base`
    pub fn declare<I>(&self, base: &ClassRef, sub_types: I)
    where
        I: IntoIterator<Item = ClassRef>,
    {
        let mut registered = self.sub_types.write();
        let entry = registered.entry(base.id()).or_default();
        for sub_type in sub_types {
            if !entry.contains(&sub_type) {
                entry.push(sub_type);
            }
        }
    }

    /// Declared refinements of `base`
    pub fn sub_types_of(&self, base: &ClassRef) -> Vec<ClassRef> {
        self.sub_types
            .read()
            .get(&base.id())
            .cloned()
            .unwrap_or_default()
    }

    /// Every declared refinement reachable from `base`, by name
    fn potential_sub_interfaces(&self, base: &ClassRef) -> FxHashMap<String, ClassRef> {
        let registered = self.sub_types.read();
        let mut result = FxHashMap::default();
        let mut visited = FxHashSet::default();
        let mut pending = vec![base.clone()];
        while let Some(class) = pending.pop() {
            if !visited.insert(class.id()) {
                continue;
            }
            for sub_type in registered.get(&class.id()).into_iter().flatten() {
                result.insert(sub_type.name().to_string(), sub_type.clone());
                pending.push(sub_type.clone());
            }
        }
        result
    }
}

/// Interfaces a view of `source` implements: the view type first, then the
/// contract refinements of `target` that the source's class implements
pub(crate) fn model_contract_interfaces(
    registry: &ModelContractRegistry,
    target: &ClassRef,
    source: &ObjectRef,
    view_type: &ClassRef,
) -> Vec<ClassRef> {
    let mut interfaces = vec![view_type.clone()];
    let potential = registry.potential_sub_interfaces(target);
    if potential.is_empty() {
        return interfaces;
    }
    for implemented in source.class().interface_closure() {
        if let Some(sub_type) = potential.get(implemented.name()) {
            if !interfaces.contains(sub_type) {
                interfaces.push(sub_type.clone());
            }
        }
    }
    interfaces
}
