use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use matforge_core::compute::{CancellationToken, JobSystem};
use matforge_core::diagnostics::DiagnosticBuffer;

// ---------------------------------------------------------------------------
// Job system
// ---------------------------------------------------------------------------

fn busy_work(seed: u64) -> u64 {
    let mut x = seed;
    for _ in 0..256 {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    }
    x
}

fn bench_job_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("job_scope_64_jobs");
    for threads in [1usize, 2, 4, 8] {
        let jobs = JobSystem::new(threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &jobs, |b, jobs| {
            b.iter(|| {
                let sum = AtomicU64::new(0);
                jobs.scope(|s| {
                    for i in 0..64u64 {
                        let sum = &sum;
                        s.spawn(move || {
                            sum.fetch_add(busy_work(black_box(i)), Ordering::Relaxed);
                        });
                    }
                });
                sum.into_inner()
            });
        });
    }
    group.finish();
}

fn bench_cancellation_check(c: &mut Criterion) {
    let token = CancellationToken::new();
    c.bench_function("cancellation_check", |b| {
        b.iter(|| black_box(token.check().is_ok()));
    });
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

fn bench_diagnostic_push(c: &mut Criterion) {
    let buffer = DiagnosticBuffer::new(256);
    c.bench_function("diagnostic_push_wrapping", |b| {
        b.iter(|| buffer.report(log::Level::Trace, "bench", black_box("message")));
    });
}

criterion_group!(
    benches,
    bench_job_scope,
    bench_cancellation_check,
    bench_diagnostic_push,
);
criterion_main!(benches);
