//! Method dispatch pipeline
//!
//! A call on a view runs through an ordered list of [`InvocationStage`]s and
//! ends at a terminal [`MethodInvoker`]. Each stage decides whether and how to
//! continue with the rest of the pipeline through its [`Next`] handle, and may
//! do so more than once (to probe a derived call, for example).
//!
//! An invoker that cannot resolve a call leaves it unresolved. Errors are
//! reserved for failures raised by the methods themselves.

use std::sync::Arc;
use std::time::Duration;

use super::invocation::MethodInvocation;
use super::method_cache::{CacheStats, MethodInvocationCache};
use crate::AdapterResult;

/// Resolves calls
pub trait MethodInvoker: Send + Sync {
    /// Try to resolve `invocation`, storing the result on success
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()>;
}

impl<T: MethodInvoker + ?Sized> MethodInvoker for Arc<T> {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        (**self).invoke(invocation)
    }
}

/// One layer of the dispatch pipeline
pub trait InvocationStage: Send + Sync {
    /// Handle `invocation`, using `next` to run the layers below
    fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()>;
}

/// The part of a pipeline below a stage
#[derive(Clone, Copy)]
pub struct Next<'p> {
    stages: &'p [Box<dyn InvocationStage>],
    terminal: &'p dyn MethodInvoker,
}

impl<'p> Next<'p> {
    /// Run the remaining stages and the terminal invoker
    pub fn run(self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.invoke(
                invocation,
                Next {
                    stages: rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.invoke(invocation),
        }
    }
}

/// Stages, outermost first, ending at a terminal invoker
pub struct Pipeline {
    stages: Vec<Box<dyn InvocationStage>>,
    terminal: Box<dyn MethodInvoker>,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(stages: Vec<Box<dyn InvocationStage>>, terminal: Box<dyn MethodInvoker>) -> Self {
        Self { stages, terminal }
    }
}

impl MethodInvoker for Pipeline {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        Next {
            stages: &self.stages,
            terminal: self.terminal.as_ref(),
        }
        .run(invocation)
    }
}

/// Tries invokers in order until one resolves the call
pub struct ChainedMethodInvoker {
    invokers: Vec<Box<dyn MethodInvoker>>,
}

impl ChainedMethodInvoker {
    /// Create a chain
    pub fn new(invokers: Vec<Box<dyn MethodInvoker>>) -> Self {
        Self { invokers }
    }
}

impl MethodInvoker for ChainedMethodInvoker {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        for invoker in &self.invokers {
            invoker.invoke(invocation)?;
            if invocation.found() {
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Calls the delegate's own method with the same name and erased signature
pub struct ReflectionMethodInvoker {
    lookup_cache: MethodInvocationCache,
}

impl Default for ReflectionMethodInvoker {
    fn default() -> Self {
        Self {
            lookup_cache: MethodInvocationCache::default(),
        }
    }
}

impl ReflectionMethodInvoker {
    /// Create an invoker whose lookup cache sweeps with the given settings
    pub fn new(cleanup_interval: Duration, cleanup_miss_stride: usize) -> Self {
        Self {
            lookup_cache: MethodInvocationCache::new(cleanup_interval, cleanup_miss_stride),
        }
    }

    /// Lookup cache counters
    pub fn stats(&self) -> CacheStats {
        self.lookup_cache.stats()
    }
}

impl MethodInvoker for ReflectionMethodInvoker {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
        let delegate = invocation.delegate();
        let Some(method) = self.lookup_cache.get(
            delegate.class(),
            invocation.name(),
            invocation.parameter_types(),
        ) else {
            return Ok(());
        };
        let value = delegate.invoke_method(&method, invocation.parameters())?;
        invocation.set_result(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{ClassBuilder, ClassRef, Members, Object, ObjectRef, Type, Value};
    use crate::AdapterError;
    use parking_lot::Mutex;

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl InvocationStage for Recording {
        fn invoke(&self, invocation: &mut MethodInvocation<'_>, next: Next<'_>) -> AdapterResult<()> {
            self.log.lock().push(self.label);
            next.run(invocation)
        }
    }

    struct Fixed(Option<i32>);

    impl MethodInvoker for Fixed {
        fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> AdapterResult<()> {
            if let Some(value) = self.0 {
                invocation.set_result(Value::Int(value));
            }
            Ok(())
        }
    }

    fn fixture() -> (ClassRef, ObjectRef) {
        let class = ClassBuilder::class("Source").build(
            Members::new()
                .method("getName", vec![], Type::string(), |_, _| Ok(Value::from("source")))
                .method("fail", vec![], Type::Void, |_, _| {
                    Err(AdapterError::InvalidArgument("boom".into()))
                }),
        );
        let object = Object::new(&class, ());
        (class, object)
    }

    fn run(invoker: &dyn MethodInvoker, name: &str) -> AdapterResult<Option<Value>> {
        let (class, object) = fixture();
        let return_type = Type::string();
        let mut invocation =
            MethodInvocation::new(name, &return_type, &[], &[], &object, &class, &object);
        invoker.invoke(&mut invocation)?;
        Ok(invocation.into_result())
    }

    #[test]
    fn test_stages_run_outermost_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            vec![
                Box::new(Recording { label: "outer", log: log.clone() }),
                Box::new(Recording { label: "inner", log: log.clone() }),
            ],
            Box::new(Fixed(Some(3))),
        );
        assert_eq!(run(&pipeline, "anything").unwrap(), Some(Value::Int(3)));
        assert_eq!(*log.lock(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_chain_stops_at_first_resolution() {
        let chain = ChainedMethodInvoker::new(vec![
            Box::new(Fixed(None)),
            Box::new(Fixed(Some(1))),
            Box::new(Fixed(Some(2))),
        ]);
        assert_eq!(run(&chain, "anything").unwrap(), Some(Value::Int(1)));
    }

    #[test]
    fn test_reflection_invoker() {
        let invoker = ReflectionMethodInvoker::default();
        assert_eq!(run(&invoker, "getName").unwrap(), Some(Value::from("source")));
        assert_eq!(run(&invoker, "getMissing").unwrap(), None);
        assert!(matches!(
            run(&invoker, "fail"),
            Err(AdapterError::InvalidArgument(message)) if message == "boom"
        ));
    }
}
