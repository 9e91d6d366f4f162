//! Reachable interface types
//!
//! A decoration only matters for a view if its target type can be reached
//! from the view type: the view type itself, its superinterfaces, and every
//! interface mentioned in a return type or a method type-parameter bound,
//! transitively. The reachable set is computed once per type.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::reflect::{Class, ClassHandle, ClassId, ClassRef, GenericRaw, Type, TypeVariable};

/// Computes and memoizes the interfaces reachable from a type
#[derive(Debug, Default)]
pub struct TypeInspector {
    inspected: RwLock<FxHashMap<ClassId, Arc<FxHashSet<ClassId>>>>,
}

impl TypeInspector {
    /// Create an empty inspector
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every interface reachable from `class`, including itself when
    /// it is an interface
    pub fn reachable_types(&self, class: &ClassRef) -> Arc<FxHashSet<ClassId>> {
        if let Some(types) = self.inspected.read().get(&class.id()) {
            return types.clone();
        }

        let mut walk = Walk::default();
        walk.visit_class(class);
        let types = Arc::new(walk.types);
        self.inspected
            .write()
            .entry(class.id())
            .or_insert(types)
            .clone()
    }
}

#[derive(Default)]
struct Walk {
    types: FxHashSet<ClassId>,
    visiting: FxHashSet<u64>,
}

impl Walk {
    fn visit_class(&mut self, class: &Class) {
        if !class.is_interface() || !self.types.insert(class.id()) {
            return;
        }
        for superinterface in class.interfaces() {
            self.visit_class(superinterface);
        }
        for method in class.declared_methods() {
            self.visit_type(method.return_type());
            for type_parameter in method.type_parameters() {
                self.visit_variable(type_parameter);
            }
        }
    }

    fn visit_handle(&mut self, handle: &ClassHandle) {
        if let Some(class) = handle.upgrade() {
            self.visit_class(&class);
        }
    }

    fn visit_type(&mut self, ty: &Type) {
        match ty {
            Type::Class(handle) => self.visit_handle(handle),
            Type::Parameterized { raw, args } => {
                if let GenericRaw::Class(handle) = raw {
                    self.visit_handle(handle);
                }
                for arg in args {
                    self.visit_type(arg);
                }
            }
            Type::Wildcard { upper, lower } => {
                for bound in upper.iter().chain(lower) {
                    self.visit_type(bound);
                }
            }
            Type::Variable(handle) => {
                if let Some(var) = handle.upgrade() {
                    self.visit_variable(&var);
                }
            }
            Type::Array(element) => self.visit_type(element),
            Type::Void | Type::Scalar(_) | Type::Object | Type::Container(_) => {}
        }
    }

    fn visit_variable(&mut self, var: &TypeVariable) {
        if !self.visiting.insert(var.id()) {
            return;
        }
        for bound in var.bounds() {
            self.visit_type(bound);
        }
        self.visiting.remove(&var.id());
    }
}
