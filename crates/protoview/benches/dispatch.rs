use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use protoview::{
    ClassBuilder, ClassRef, Members, Object, ObjectGraphAdapter, ProtocolToModelAdapter, Type,
    Value,
};

struct Fixture {
    task: ClassRef,
    project: ClassRef,
    source: Value,
}

fn fixture(task_count: usize) -> Fixture {
    let task = ClassBuilder::interface("model.Task").build(
        Members::new()
            .abstract_method("getName", vec![], Type::string())
            .abstract_method("getDescription", vec![Type::string()], Type::string()),
    );
    let project = ClassBuilder::interface("model.Project").build(
        Members::new()
            .abstract_method("getName", vec![], Type::string())
            .abstract_method("getTasks", vec![], Type::list_of(Type::of(&task))),
    );

    let task_impl = ClassBuilder::class("provider.DefaultTask").build(Members::new().method(
        "getName",
        vec![],
        Type::string(),
        |this, _| Ok(Value::from(this.state::<String>().cloned().unwrap_or_default())),
    ));
    let project_impl = ClassBuilder::class("provider.DefaultProject").build(
        Members::new()
            .method("getName", vec![], Type::string(), |_, _| Ok(Value::from("core")))
            .method("getTasks", vec![], Type::Object, |this, _| {
                Ok(this.state::<Vec<Value>>().cloned().unwrap_or_default().into())
            }),
    );
    let tasks: Vec<Value> = (0..task_count)
        .map(|i| Value::Object(Object::new(&task_impl, format!("task{}", i))))
        .collect();

    Fixture {
        task,
        project,
        source: Value::Object(Object::new(&project_impl, tasks)),
    }
}

fn bench_adapt(c: &mut Criterion) {
    let fixture = fixture(0);
    let adapter = ProtocolToModelAdapter::new();

    c.bench_function("adapt_new_graph", |b| {
        b.iter(|| adapter.adapt(black_box(&fixture.project), fixture.source.clone()).unwrap());
    });

    let graph = adapter.new_graph();
    let _live = graph.adapt(&fixture.project, fixture.source.clone()).unwrap();
    c.bench_function("adapt_cached_in_graph", |b| {
        b.iter(|| graph.adapt(black_box(&fixture.project), fixture.source.clone()).unwrap());
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let fixture = fixture(0);
    let adapter = ProtocolToModelAdapter::new();
    let view = adapter.adapt(&fixture.project, fixture.source.clone()).unwrap();
    let view = view.as_object().unwrap().clone();

    c.bench_function("cached_getter", |b| {
        b.iter(|| view.invoke(black_box("getName"), &[]).unwrap());
    });

    let task_source = Value::Object(Object::new(
        &ClassBuilder::class("provider.Undocumented").build(Members::new()),
        (),
    ));
    let task_view = adapter.adapt(&fixture.task, task_source).unwrap();
    let task_view = task_view.as_object().unwrap().clone();
    let default = [Value::from("none")];
    c.bench_function("getter_with_default", |b| {
        b.iter(|| task_view.invoke(black_box("getDescription"), &default).unwrap());
    });
}

fn bench_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("collections");
    let adapter = ProtocolToModelAdapter::new();

    for count in [10, 100, 1000] {
        let fixture = fixture(count);
        group.bench_with_input(BenchmarkId::new("get_tasks", count), &fixture, |b, fixture| {
            b.iter(|| {
                // Fresh view each time so the property cache does not answer
                let view = adapter.adapt(&fixture.project, fixture.source.clone()).unwrap();
                view.as_object().unwrap().invoke("getTasks", &[]).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_adapt, bench_dispatch, bench_collections);
criterion_main!(benches);
