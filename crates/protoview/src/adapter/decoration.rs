//! View decorations
//!
//! A decoration adds behavior to the views of a graph: a mix-in object or a
//! mix-in class providing methods for views of a particular target type.
//! Decorations are immutable values compared structurally; two views of the
//! same source with equal decorations are the same view.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::invoker::{MethodInvoker, ReflectionMethodInvoker};
use super::mixin::{BeanMixInMethodInvoker, ClassMixInMethodInvoker};
use crate::reflect::{ClassId, ClassRef, ObjectRef};

/// Behavior added to views
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewDecoration {
    /// No added behavior
    NoOp,
    /// Methods of `instance` are available on views of `target`
    BeanMixIn {
        /// Type whose views are decorated
        target: ClassRef,
        /// Object providing the methods
        instance: ObjectRef,
    },
    /// Methods of an instance of `mix_in`, created per view, are available on
    /// views of `target`
    ClassMixIn {
        /// Type whose views are decorated
        target: ClassRef,
        /// Class instantiated with the view as the only argument
        mix_in: ClassRef,
    },
    /// Several decorations, earlier ones taking precedence.
    ///
    /// Never empty, never a single member, never nested, never holding NoOp.
    Chain(Arc<[ViewDecoration]>),
}

impl Default for ViewDecoration {
    fn default() -> Self {
        ViewDecoration::NoOp
    }
}

impl ViewDecoration {
    /// Combine decorations, flattening nested chains and dropping no-ops
    pub fn chain(decorations: Vec<ViewDecoration>) -> Self {
        let mut members = Vec::with_capacity(decorations.len());
        for decoration in decorations {
            match decoration {
                ViewDecoration::NoOp => {}
                ViewDecoration::Chain(nested) => members.extend(nested.iter().cloned()),
                other => members.push(other),
            }
        }
        Self::from_members(members)
    }

    fn from_members(mut members: Vec<ViewDecoration>) -> Self {
        match members.len() {
            0 => ViewDecoration::NoOp,
            1 => members.remove(0),
            _ => ViewDecoration::Chain(members.into()),
        }
    }

    /// Whether this decoration adds nothing
    pub fn is_no_op(&self) -> bool {
        matches!(self, ViewDecoration::NoOp)
    }

    /// The part of this decoration relevant to views whose reachable types
    /// are `types`
    pub fn restrict_to(&self, types: &FxHashSet<ClassId>) -> Self {
        match self {
            ViewDecoration::NoOp => ViewDecoration::NoOp,
            ViewDecoration::BeanMixIn { target, .. } | ViewDecoration::ClassMixIn { target, .. } => {
                if types.contains(&target.id()) {
                    self.clone()
                } else {
                    ViewDecoration::NoOp
                }
            }
            ViewDecoration::Chain(members) => {
                let filtered: Vec<ViewDecoration> = members
                    .iter()
                    .map(|member| member.restrict_to(types))
                    .filter(|member| !member.is_no_op())
                    .collect();
                if filtered.len() == members.len() {
                    self.clone()
                } else {
                    Self::from_members(filtered)
                }
            }
        }
    }

    /// Add the invokers contributed for views of `view_type`
    pub(crate) fn collect_invokers(
        &self,
        view_type: &ClassRef,
        reflection: &Arc<ReflectionMethodInvoker>,
        invokers: &mut Vec<Box<dyn MethodInvoker>>,
    ) {
        match self {
            ViewDecoration::NoOp => {}
            ViewDecoration::BeanMixIn { target, instance } => {
                if target.is_assignable_from(view_type) {
                    invokers.push(Box::new(BeanMixInMethodInvoker::new(
                        instance.clone(),
                        reflection.clone(),
                    )));
                }
            }
            ViewDecoration::ClassMixIn { target, mix_in } => {
                if target.is_assignable_from(view_type) {
                    invokers.push(Box::new(ClassMixInMethodInvoker::new(
                        mix_in.clone(),
                        reflection.clone(),
                    )));
                }
            }
            ViewDecoration::Chain(members) => {
                for member in members.iter() {
                    member.collect_invokers(view_type, reflection, invokers);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ClassBuilder, Members, Object};

    fn interface(name: &str) -> ClassRef {
        ClassBuilder::interface(name).build(Members::new())
    }

    #[test]
    fn test_chain_normalization() {
        let a = interface("A");
        let b = interface("B");
        let bean = ViewDecoration::BeanMixIn {
            target: a.clone(),
            instance: Object::new(&a, ()),
        };
        let class = ViewDecoration::ClassMixIn {
            target: b.clone(),
            mix_in: b.clone(),
        };

        assert_eq!(ViewDecoration::chain(vec![]), ViewDecoration::NoOp);
        assert_eq!(
            ViewDecoration::chain(vec![ViewDecoration::NoOp, bean.clone()]),
            bean
        );

        let inner = ViewDecoration::chain(vec![bean.clone(), class.clone()]);
        let outer = ViewDecoration::chain(vec![inner.clone(), ViewDecoration::NoOp, bean.clone()]);
        match &outer {
            ViewDecoration::Chain(members) => {
                assert_eq!(members.len(), 3);
                assert!(members.iter().all(|m| !matches!(m, ViewDecoration::Chain(_))));
            }
            other => panic!("expected a chain, got {:?}", other),
        }
        assert_eq!(inner, ViewDecoration::chain(vec![bean, class]));
    }

    #[test]
    fn test_restrict_to() {
        let a = interface("A");
        let b = interface("B");
        let for_a = ViewDecoration::ClassMixIn {
            target: a.clone(),
            mix_in: a.clone(),
        };
        let for_b = ViewDecoration::ClassMixIn {
            target: b.clone(),
            mix_in: b.clone(),
        };
        let both = ViewDecoration::chain(vec![for_a.clone(), for_b.clone()]);

        let mut only_a = FxHashSet::default();
        only_a.insert(a.id());
        assert_eq!(both.restrict_to(&only_a), for_a);
        assert_eq!(both.restrict_to(&FxHashSet::default()), ViewDecoration::NoOp);

        only_a.insert(b.id());
        assert_eq!(both.restrict_to(&only_a), both);
        assert_eq!(ViewDecoration::NoOp.restrict_to(&only_a), ViewDecoration::NoOp);
    }

    #[test]
    fn test_collect_invokers_requires_assignable_target() {
        let base = interface("Base");
        let derived = ClassBuilder::interface("Derived").extends(&base).build(Members::new());
        let other = interface("Other");
        let decoration = ViewDecoration::chain(vec![
            ViewDecoration::ClassMixIn { target: base.clone(), mix_in: base.clone() },
            ViewDecoration::BeanMixIn { target: other.clone(), instance: Object::new(&other, ()) },
        ]);
        let reflection = Arc::new(ReflectionMethodInvoker::default());

        let mut invokers = Vec::new();
        decoration.collect_invokers(&derived, &reflection, &mut invokers);
        assert_eq!(invokers.len(), 1);

        let mut invokers = Vec::new();
        decoration.collect_invokers(&other, &reflection, &mut invokers);
        assert_eq!(invokers.len(), 1);
    }
}
