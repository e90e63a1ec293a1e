use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::config::{DegradationThresholds, HealthConfig, MonitorConfig};
use relay_core::constants::{ErrorCategory, TaskType};
use relay_core::health::{compute_global_level, ConnectivityMonitor, HealthManager, ServiceHealthRecord};
use relay_core::monitor::{FixedResourceSampler, PerformanceMetric, PerformanceMonitor};
use relay_core::registry::ExecutorRegistry;
use std::sync::Arc;

fn monitor() -> PerformanceMonitor {
    let health = Arc::new(HealthManager::new(
        HealthConfig::default(),
        ConnectivityMonitor::default(),
    ));
    PerformanceMonitor::new(
        MonitorConfig::default(),
        health,
        Arc::new(ExecutorRegistry::new()),
    )
    .with_resource_sampler(Arc::new(FixedResourceSampler::default()))
}

fn metric(i: usize) -> PerformanceMetric {
    let task_type = TaskType::ALL[i % TaskType::ALL.len()];
    let executor = ["general", "fast", "offline"][i % 3];
    if i % 10 == 0 {
        PerformanceMetric::failure(executor, task_type, 2000, ErrorCategory::Timeout)
    } else {
        PerformanceMetric::success(executor, task_type, 100 + (i % 400) as u64)
    }
}

fn benchmark_metric_ingestion(c: &mut Criterion) {
    let monitor = monitor();
    let mut i = 0usize;
    c.bench_function("record_metrics", |b| {
        b.iter(|| {
            i += 1;
            monitor.record_metrics(black_box(metric(i)));
        })
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("take_snapshot");
    for buffered in [100usize, 1000] {
        let monitor = monitor();
        for i in 0..buffered {
            monitor.record_metrics(metric(i));
        }
        group.bench_with_input(BenchmarkId::from_parameter(buffered), &monitor, |b, monitor| {
            b.iter(|| monitor.take_snapshot_at(black_box(Utc::now())))
        });
    }
    group.finish();
}

fn benchmark_global_level(c: &mut Criterion) {
    let thresholds = DegradationThresholds::default();
    let records: Vec<ServiceHealthRecord> = (0..8)
        .map(|i| {
            let mut record = ServiceHealthRecord::new(format!("executor-{i}"));
            record.error_rate = i as f64 / 10.0;
            record
        })
        .collect();

    c.bench_function("compute_global_level", |b| {
        b.iter(|| compute_global_level(black_box(records.iter()), &thresholds))
    });
}

criterion_group!(
    benches,
    benchmark_metric_ingestion,
    benchmark_snapshot,
    benchmark_global_level
);
criterion_main!(benches);
