//! Mix-in invokers
//!
//! A bean mix-in sends calls to a fixed object. A class mix-in creates one
//! instance of its class per view, on first use, passing the view to the
//! constructor.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;

use super::invocation::MethodInvocation;
use super::invoker::{MethodInvoker, ReflectionMethodInvoker};
use crate::reflect::{ClassRef, ObjectRef, Value};
use crate::AdapterResult;

/// Sends calls to a mix-in object
pub struct BeanMixInMethodInvoker {
    instance: ObjectRef,
    next: Arc<ReflectionMethodInvoker>,
}

impl BeanMixInMethodInvoker {
    /// Create an invoker calling methods of `instance`
    pub fn new(instance: ObjectRef, next: Arc<ReflectionMethodInvoker>) -> Self {
        Self { instance, next }
    }
}

impl MethodInvoker for BeanMixInMethodInvoker {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        let result = {
            let mut redirected = invocation.redirect(&self.instance);
            self.next.invoke(&mut redirected)?;
            redirected.into_result()
        };
        if let Some(value) = result {
            invocation.set_result(value);
            return Ok(());
        }
        if !invocation.is_getter() {
            return Ok(());
        }

        // A getter may be provided as `getX(view)`.
        let result = {
            let mut with_view = invocation.with_view_argument(&self.instance);
            self.next.invoke(&mut with_view)?;
            with_view.into_result()
        };
        if let Some(value) = result {
            invocation.set_result(value);
        }
        Ok(())
    }
}

thread_local! {
    static ACTIVE_MIX_INS: RefCell<FxHashSet<u64>> = RefCell::new(FxHashSet::default());
}

/// Marks a class mix-in invoker active on the current thread
struct ReentrancyGuard(u64);

impl ReentrancyGuard {
    fn enter(id: u64) -> Option<Self> {
        let entered = ACTIVE_MIX_INS.with(|active| active.borrow_mut().insert(id));
        entered.then(|| ReentrancyGuard(id))
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        ACTIVE_MIX_INS.with(|active| {
            active.borrow_mut().remove(&self.0);
        });
    }
}

/// Sends calls to a lazily created instance of a mix-in class
pub struct ClassMixInMethodInvoker {
    id: u64,
    mix_in_class: ClassRef,
    instance: OnceCell<ObjectRef>,
    next: Arc<ReflectionMethodInvoker>,
}

impl ClassMixInMethodInvoker {
    /// Create an invoker instantiating `mix_in_class` on first use
    pub fn new(mix_in_class: ClassRef, next: Arc<ReflectionMethodInvoker>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            mix_in_class,
            instance: OnceCell::new(),
            next,
        }
    }
}

impl MethodInvoker for ClassMixInMethodInvoker {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        // Calls made on the view by the mix-in itself, or by its constructor,
        // skip this mix-in.
        let Some(_guard) = ReentrancyGuard::enter(self.id) else {
            return Ok(());
        };
        let instance = self.instance.get_or_try_init(|| {
            self.mix_in_class
                .new_instance(&[Value::Object(invocation.view().clone())])
        })?;
        let result = {
            let mut redirected = invocation.redirect(instance);
            self.next.invoke(&mut redirected)?;
            redirected.into_result()
        };
        if let Some(value) = result {
            invocation.set_result(value);
        }
        Ok(())
    }
}
