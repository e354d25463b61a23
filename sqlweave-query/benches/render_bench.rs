//! Benchmarks for template substitution and interpolation.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sqlweave_query::{
    Arg, Dialect, OutputPool, param, render, write_template,
    interpolate::interpolate,
    predicate::{and, eq, in_list},
};

// ============================================================================
// Template Substitution Benchmarks
// ============================================================================

fn bench_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitution");

    group.bench_function("no_placeholders", |b| {
        b.iter(|| black_box(render(Dialect::Postgres, "SELECT * FROM users", &[])))
    });

    let values: Vec<Arg> = vec![1.into(), "alice".into(), true.into()];
    for dialect in Dialect::ALL {
        group.bench_with_input(
            BenchmarkId::new("anonymous", format!("{:?}", dialect)),
            &dialect,
            |b, &dialect| {
                b.iter(|| {
                    black_box(render(
                        dialect,
                        "SELECT * FROM users WHERE id = {} AND name = {} AND active = {}",
                        &values,
                    ))
                })
            },
        );
    }

    let named = [param("name", "alice"), 30.into()];
    group.bench_function("named_reuse", |b| {
        b.iter(|| {
            black_box(render(
                Dialect::Sqlite,
                "SELECT * FROM users WHERE name = {name} OR nick = {name} OR age > {2}",
                &named,
            ))
        })
    });

    group.finish();
}

// ============================================================================
// Sequence Expansion Benchmarks
// ============================================================================

fn bench_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("expansion");

    for size in [10, 100, 1000] {
        let ids: Vec<i64> = (0..size).collect();
        let filter: Arg = and([eq("active", true).into(), in_list("id", ids).into()]).into();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("in_list", size), &filter, |b, filter| {
            b.iter(|| {
                black_box(render(
                    Dialect::Postgres,
                    "SELECT * FROM users WHERE {}",
                    std::slice::from_ref(filter),
                ))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pooling Benchmarks
// ============================================================================

fn bench_pooled_output(c: &mut Criterion) {
    let pool = OutputPool::new();
    let values: Vec<Arg> = vec![1.into(), 2.into()];

    c.bench_function("pooled_write_template", |b| {
        b.iter(|| {
            let mut out = pool.get();
            let _ = write_template(Dialect::MySql, &mut out, "SELECT {} + {}", &values);
            black_box(out.sql.len())
        })
    });
}

// ============================================================================
// Interpolation Benchmarks
// ============================================================================

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");

    let values: Vec<Arg> = vec![42.into(), "it's\nmultiline".into(), vec![1u8, 2, 3].into()];
    for dialect in Dialect::ALL {
        let query = match render(dialect, "SELECT 'a?b', {}, {}, {} FROM t", &values) {
            Ok(query) => query,
            Err(e) => panic!("render failed: {}", e),
        };
        group.bench_with_input(
            BenchmarkId::new("literals", format!("{:?}", dialect)),
            &query,
            |b, query| b.iter(|| black_box(interpolate(query.dialect, &query.sql, &query.args))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_substitution,
    bench_expansion,
    bench_pooled_output,
    bench_interpolation,
);
criterion_main!(benches);
