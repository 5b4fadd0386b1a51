//! Policy compilation and evaluation benchmarks.
//!
//! Compares cold parsing against cached compilation, and measures the tree
//! walk on its own for the standard policies.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use medgate_abac::{
    AttributeContext, PolicyEngine, Principal, ResourceAttributes, Role, StandardPolicies, parse,
};

fn request() -> AttributeContext {
    let doctor = Principal::new(11, Role::Doctor)
        .with_department("Cardiology")
        .with_clearance(4);
    let record = ResourceAttributes::new("medical_record")
        .with_department("Cardiology")
        .with_owner(11);
    AttributeContext::for_request(&doctor, Some(&record)).unwrap_or_default()
}

// ============================================================================
// Compilation Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for policy in StandardPolicies::all() {
        group.throughput(Throughput::Bytes(policy.text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(policy.name), &policy.text, |b, text| {
            b.iter(|| black_box(parse(black_box(text))));
        });
    }

    group.finish();
}

fn bench_cached_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_compile");
    let engine = PolicyEngine::new().without_audit();

    group.bench_function("sensitive_record", |b| {
        b.iter(|| black_box(engine.compile(black_box(StandardPolicies::SENSITIVE_RECORD))));
    });

    group.finish();
}

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_evaluate_compiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_compiled");
    let ctx = request();

    for policy in StandardPolicies::all() {
        let Ok(compiled) = parse(policy.text) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(policy.name), &compiled, |b, p| {
            b.iter(|| black_box(p.evaluate(black_box(&ctx))));
        });
    }

    group.finish();
}

fn bench_engine_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_evaluate");
    let engine = PolicyEngine::new().without_audit();
    let ctx = request();

    group.bench_function("sensitive_record", |b| {
        b.iter(|| {
            black_box(engine.evaluate(black_box(StandardPolicies::SENSITIVE_RECORD), &ctx))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_cached_compile,
    bench_evaluate_compiled,
    bench_engine_evaluate
);
criterion_main!(benches);
