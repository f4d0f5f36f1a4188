use std::hint::black_box;

use bencher::{LITERAL, MIXED, NAMED};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::Method;

fn benchmark_router_resolve(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("router_resolve");

    for case in [LITERAL, NAMED, MIXED] {
        let router = case.router();
        group.throughput(Throughput::Elements(case.paths().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                for path in case.paths() {
                    black_box(router.resolve(&Method::GET, black_box(path)).map(|found| found.index()));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_router_build(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("router_build");

    for case in [LITERAL, NAMED, MIXED] {
        group.throughput(Throughput::Elements(case.routes().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| black_box(case.router()));
        });
    }

    group.finish();
}

criterion_group!(router, benchmark_router_resolve, benchmark_router_build);
criterion_main!(router);
