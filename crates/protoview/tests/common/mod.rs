//! Shared fixture: a small consumer-side model and a provider-side
//! implementation of it that shares no classes with the model.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use protoview::{AdapterResult, ClassBuilder, ClassRef, Members, Object, ObjectRef, Type, Value};

/// Consumer-side interfaces
pub struct Model {
    pub mode: ClassRef,
    pub task: ClassRef,
    pub project: ClassRef,
}

/// Provider-side classes
pub struct Provider {
    pub task: ClassRef,
    pub project: ClassRef,
}

pub struct TaskState {
    pub name: String,
    pub description: Option<String>,
}

pub struct ProjectState {
    pub name: String,
    pub parent: Option<ObjectRef>,
    pub tasks: Vec<ObjectRef>,
    pub mode: String,
    pub name_calls: AtomicUsize,
}

pub fn model() -> Model {
    let mode = ClassBuilder::enumeration("model.Mode", ["OFFLINE", "ONLINE", "BUILD_CACHE"])
        .build(Members::new());
    let task = ClassBuilder::interface("model.Task").build(
        Members::new()
            .abstract_method("getName", vec![], Type::string())
            .abstract_method("getDescription", vec![Type::string()], Type::string())
            .abstract_method("isDescriptionSupported", vec![], Type::boolean())
            .abstract_method("getGroup", vec![], Type::string())
            .abstract_method("isGroupSupported", vec![], Type::boolean()),
    );
    let project = ClassBuilder::interface("model.Project").declare();
    project
        .define(
            Members::new()
                .abstract_method("getName", vec![], Type::string())
                .abstract_method("getParent", vec![], Type::of(&project))
                .abstract_method("getTasks", vec![], Type::list_of(Type::of(&task)))
                .abstract_method("getTaskSet", vec![], Type::set_of(Type::extends(Type::of(&task))))
                .abstract_method(
                    "getTasksByName",
                    vec![],
                    Type::map_of(Type::string(), Type::of(&task)),
                )
                .abstract_method("getMode", vec![], Type::of(&mode))
                .abstract_method("getVersion", vec![], Type::string())
                .abstract_method("getVersion", vec![Type::string()], Type::string())
                .abstract_method("getLabel", vec![], Type::string()),
        )
        .expect("project is defined once");
    Model { mode, task, project }
}

pub fn provider() -> Provider {
    let task = ClassBuilder::class("provider.DefaultTask").build(
        Members::new()
            .method("getName", vec![], Type::string(), |this, _| {
                Ok(Value::from(this.expect_state::<TaskState>()?.name.clone()))
            })
            .method("getDescription", vec![], Type::string(), |this, _| {
                Ok(Value::from(this.expect_state::<TaskState>()?.description.clone()))
            }),
    );
    let project = ClassBuilder::class("provider.DefaultProject").build(
        Members::new()
            .method("getName", vec![], Type::string(), |this, _| {
                let state = this.expect_state::<ProjectState>()?;
                state.name_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Value::from(state.name.clone()))
            })
            .method("getParent", vec![], Type::Object, |this, _| {
                Ok(Value::from(this.expect_state::<ProjectState>()?.parent.clone()))
            })
            .method("getTasks", vec![], Type::Object, |this, _| {
                Ok(tasks_of(this)?.collect::<Vec<_>>().into())
            })
            .method("getTaskSet", vec![], Type::Object, |this, _| {
                Ok(Value::set(tasks_of(this)?))
            })
            .method("getTasksByName", vec![], Type::Object, |this, _| {
                let entries = this
                    .expect_state::<ProjectState>()?
                    .tasks
                    .iter()
                    .map(|task| {
                        let name = task.invoke("getName", &[])?;
                        Ok((name, Value::Object(task.clone())))
                    })
                    .collect::<AdapterResult<Vec<_>>>()?;
                Ok(Value::map(entries))
            })
            .method("getMode", vec![], Type::string(), |this, _| {
                Ok(Value::from(this.expect_state::<ProjectState>()?.mode.clone()))
            }),
    );
    Provider { task, project }
}

fn tasks_of(project: &ObjectRef) -> AdapterResult<impl Iterator<Item = Value> + '_> {
    Ok(project
        .expect_state::<ProjectState>()?
        .tasks
        .iter()
        .map(|task| Value::Object(task.clone())))
}

pub fn task(provider: &Provider, name: &str, description: Option<&str>) -> ObjectRef {
    Object::new(
        &provider.task,
        TaskState {
            name: name.to_string(),
            description: description.map(str::to_string),
        },
    )
}

pub fn project(
    provider: &Provider,
    name: &str,
    parent: Option<ObjectRef>,
    tasks: Vec<ObjectRef>,
    mode: &str,
) -> ObjectRef {
    Object::new(
        &provider.project,
        ProjectState {
            name: name.to_string(),
            parent,
            tasks,
            mode: mode.to_string(),
            name_calls: AtomicUsize::new(0),
        },
    )
}

/// Call a method on a view
pub fn call(view: &Value, name: &str, args: &[Value]) -> AdapterResult<Value> {
    view.as_object().expect("view is an object").invoke(name, args)
}

pub fn name_calls(project: &ObjectRef) -> usize {
    project
        .state::<ProjectState>()
        .map_or(0, |state| state.name_calls.load(Ordering::SeqCst))
}

pub fn same_object(a: &Value, b: &Value) -> bool {
    match (a.as_object(), b.as_object()) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

/// Route adapter logs to the test output, honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
