//! Integration tests for mix-ins
//!
//! Tests cover:
//! - Bean mix-ins taking precedence over the source
//! - Getters provided as `getX(view)`
//! - Mix-ins reaching views created through a decorated view
//! - Decorations irrelevant to a view type leaving view identity alone
//! - Class mix-ins created once per view, re-entrant calls skipping them

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{call, model, name_calls, project, provider, same_object, task};
use protoview::{
    AdapterError, ClassBuilder, Members, Object, ObjectGraphAdapter, ProtocolToModelAdapter, Type,
    Value, WeakObjectRef,
};

#[test]
fn test_bean_mix_in_takes_precedence() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let defaults = ClassBuilder::class("consumer.ProjectDefaults").build(
        Members::new()
            .method("getName", vec![], Type::string(), |_, _| Ok(Value::from("mixed")))
            .method("getVersion", vec![], Type::string(), |_, _| Ok(Value::from("2.0"))),
    );
    let source = project(&provider, "core", None, vec![], "online");

    let view = adapter
        .builder(&model.project)
        .mix_in_to(&model.project, Object::new(&defaults, ()))
        .build(Value::Object(source.clone()))
        .unwrap();

    assert_eq!(call(&view, "getName", &[]).unwrap(), Value::from("mixed"));
    assert_eq!(name_calls(&source), 0);
    assert_eq!(call(&view, "getVersion", &[]).unwrap(), Value::from("2.0"));
    assert_eq!(
        call(&view, "getVersion", &[Value::from("1.0")]).unwrap(),
        Value::from("2.0")
    );
    // Methods the mix-in lacks still reach the source
    assert!(call(&view, "getParent", &[]).unwrap().is_null());
}

#[test]
fn test_bean_mix_in_getter_receives_view() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let labels = ClassBuilder::class("consumer.Labels").build(Members::new().method(
        "getLabel",
        vec![Type::of(&model.project)],
        Type::string(),
        |_, args| {
            let name = call(&args[0], "getName", &[])?;
            Ok(Value::from(format!("project {}", name)))
        },
    ));

    let view = adapter
        .builder(&model.project)
        .mix_in_to(&model.project, Object::new(&labels, ()))
        .build(Value::Object(project(&provider, "core", None, vec![], "online")))
        .unwrap();
    assert_eq!(call(&view, "getLabel", &[]).unwrap(), Value::from("project core"));
}

#[test]
fn test_mix_in_applies_to_reachable_views() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let grouping = ClassBuilder::class("consumer.Grouping").build(Members::new().method(
        "getGroup",
        vec![],
        Type::string(),
        |_, _| Ok(Value::from("verification")),
    ));
    let source = project(&provider, "core", None, vec![task(&provider, "test", None)], "online");

    let view = adapter
        .builder(&model.project)
        .mix_in_to(&model.task, Object::new(&grouping, ()))
        .build(Value::Object(source))
        .unwrap();

    let tasks = call(&view, "getTasks", &[]).unwrap();
    let test_task = &tasks.elements().unwrap()[0];
    assert_eq!(call(test_task, "getGroup", &[]).unwrap(), Value::from("verification"));
    assert_eq!(call(test_task, "isGroupSupported", &[]).unwrap(), Value::Bool(true));
    assert_eq!(call(test_task, "getName", &[]).unwrap(), Value::from("test"));

    // The project itself is not decorated
    assert!(matches!(
        call(&view, "getVersion", &[]),
        Err(AdapterError::UnsupportedMethod(_))
    ));
}

#[test]
fn test_unrelated_mix_in_keeps_view_identity() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let helper_class = ClassBuilder::class("consumer.Helper").build(Members::new());
    let source = Value::Object(task(&provider, "build", None));

    let graph = adapter.new_graph();
    let plain = graph.adapt(&model.task, source.clone()).unwrap();
    let unrelated = graph
        .builder(&model.task)
        .mix_in_to(&model.project, Object::new(&helper_class, ()))
        .build(source.clone())
        .unwrap();
    assert!(same_object(&plain, &unrelated));

    let decorated = graph
        .builder(&model.task)
        .mix_in_to(&model.task, Object::new(&helper_class, ()))
        .build(source)
        .unwrap();
    assert!(!same_object(&plain, &decorated));
    assert_eq!(plain, decorated);
}

struct Extras {
    view: WeakObjectRef,
}

fn extras_class(constructed: Arc<AtomicUsize>) -> protoview::ClassRef {
    fn view_of(this: &protoview::ObjectRef) -> protoview::AdapterResult<protoview::ObjectRef> {
        this.expect_state::<Extras>()?
            .view
            .upgrade()
            .ok_or_else(|| AdapterError::InvalidArgument("view dropped".to_string()))
    }

    ClassBuilder::class("consumer.ProjectExtras").build(
        Members::new()
            .constructor(move |class, args| {
                constructed.fetch_add(1, Ordering::SeqCst);
                let view = args[0]
                    .as_object()
                    .ok_or_else(|| AdapterError::InvalidArgument("expected a view".to_string()))?;
                Ok(Object::new(class, Extras { view: Arc::downgrade(view) }))
            })
            .method("getName", vec![], Type::string(), |this, _| {
                let name = view_of(this)?.invoke("getName", &[])?;
                Ok(Value::from(format!("[{}]", name)))
            })
            .method("getLabel", vec![], Type::string(), |this, _| {
                let name = view_of(this)?.invoke("getName", &[])?;
                Ok(Value::from(format!("<{}>", name)))
            }),
    )
}

#[test]
fn test_class_mix_in_wraps_source_method() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let constructed = Arc::new(AtomicUsize::new(0));
    let extras = extras_class(constructed.clone());
    let source = project(&provider, "core", None, vec![], "online");

    let builder = adapter.builder(&model.project).mix_in_class(&model.project, &extras);
    let view = builder.build(Value::Object(source.clone())).unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 0);

    // The mix-in's call back into the view skips the mix-in
    assert_eq!(call(&view, "getName", &[]).unwrap(), Value::from("[core]"));
    assert_eq!(call(&view, "getLabel", &[]).unwrap(), Value::from("<[core]>"));
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(name_calls(&source), 1);

    let other = builder.build(Value::Object(source)).unwrap();
    assert_eq!(call(&other, "getLabel", &[]).unwrap(), Value::from("<core>"));
    assert_eq!(constructed.load(Ordering::SeqCst), 2);
}
