//! Integration tests for concurrent use of views and graphs

mod common;

use std::thread;

use common::{call, model, name_calls, project, provider, same_object, task};
use protoview::{ObjectGraphAdapter, ProtocolToModelAdapter, Value};

const THREADS: usize = 8;

#[test]
fn test_concurrent_adapt_in_graph_yields_one_view() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let graph = adapter.new_graph();
    let source = project(&provider, "core", None, vec![task(&provider, "build", None)], "online");

    let views: Vec<Value> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let graph = graph.clone();
                let source = source.clone();
                let project_type = &model.project;
                s.spawn(move || graph.adapt(project_type, Value::Object(source)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(views.iter().all(|view| same_object(view, &views[0])));
    assert_eq!(graph.cached_sources(), 1);
}

#[test]
fn test_concurrent_calls_on_one_view() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let source = project(&provider, "core", None, vec![task(&provider, "build", None)], "online");
    let view = adapter.adapt(&model.project, Value::Object(source.clone())).unwrap();

    let results: Vec<(Value, Value)> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let view = &view;
                s.spawn(move || {
                    let name = call(view, "getName", &[]).unwrap();
                    let tasks = call(view, "getTasks", &[]).unwrap();
                    (name, tasks.elements().unwrap()[0].clone())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (name, task_view) in &results {
        assert_eq!(name, &Value::from("core"));
        assert!(same_object(task_view, &results[0].1));
    }
    // Concurrent first calls may each reach the source, later ones never do
    let calls = name_calls(&source);
    assert!(calls >= 1 && calls <= THREADS);
    call(&view, "getName", &[]).unwrap();
    assert_eq!(name_calls(&source), calls);
}

#[test]
fn test_separate_adaptations_across_threads_are_equal() {
    let model = model();
    let provider = provider();
    let adapter = ProtocolToModelAdapter::new();
    let source = task(&provider, "build", None);

    let views: Vec<Value> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let adapter = adapter.clone();
                let source = source.clone();
                let task_type = &model.task;
                s.spawn(move || adapter.adapt(task_type, Value::Object(source)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(views.iter().all(|view| view == &views[0]));
    let stats = adapter.lookup_cache_stats();
    assert_eq!(stats.hits + stats.misses, 0);
}
