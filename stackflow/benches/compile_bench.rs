//! Benchmarks for stack resolution and template compilation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use stackflow::definition::resolve;
use stackflow::template::{compile_stack, CompileContext};

fn raw_stacks() -> serde_json::Map<String, serde_json::Value> {
    let mut raw = serde_json::Map::new();
    for i in 0..20 {
        raw.insert(
            format!("stack{i}"),
            json!([
                {"Description": "Base", "Resources": {"Topic": {"Type": "AWS::SNS::Topic"}}},
                {"Tags": {"Owner": "ops@example.org"}},
                {"Resources": {"Queue": {"Type": "AWS::SQS::Queue"}}, "Deploy": "After"}
            ]),
        );
    }
    raw
}

fn compile_benchmark(c: &mut Criterion) {
    let raw = raw_stacks();
    c.bench_function("resolve_20_fragmented", |b| {
        b.iter(|| resolve(black_box(&raw)))
    });

    let Ok(stacks) = resolve(&raw) else {
        return;
    };
    let ctx = CompileContext::new("dev", "svc-dev");
    c.bench_function("compile_20", |b| {
        b.iter(|| {
            for (name, definition) in stacks.iter() {
                let compiled = compile_stack(name, definition, &ctx);
                black_box(compiled.template.to_body().ok());
            }
        })
    });
}

criterion_group!(benches, compile_benchmark);
criterion_main!(benches);
