//! Benchmark for batch validation throughput
//!
//! Validation is pure and runs once over the whole batch before any network
//! work; it should stay negligible next to the gateway round-trips.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use powerstore_provisioner::{
    validate, HostInfo, InventorySnapshot, PoolInfo, ResourceInfo, ResourceKind, ResourceRequest,
};

fn synthetic_snapshot() -> InventorySnapshot {
    let pools = (0..10)
        .map(|i| PoolInfo {
            id: format!("pool-{}", i),
            name: format!("pool-{:02}", i),
            kind: ResourceKind::Block,
            total_bytes: Some(1 << 44),
            free_bytes: Some(1 << 43),
            appliance_id: Some("A1".into()),
            address: None,
        })
        .collect();

    let hosts = (0..100)
        .map(|i| HostInfo {
            id: format!("h-{}", i),
            name: format!("esx-{:03}", i),
        })
        .collect();

    let resources = (0..500)
        .map(|i| ResourceInfo {
            id: format!("v-{}", i),
            name: format!("vol-existing-{:04}", i),
            kind: ResourceKind::Block,
            size_bytes: 1 << 34,
            wwn: None,
        })
        .collect();

    InventorySnapshot::from_parts(pools, hosts, resources)
}

fn synthetic_batch(n: usize) -> Vec<ResourceRequest> {
    (0..n)
        .map(|i| {
            let mut req = ResourceRequest::new(
                format!("vol-new-{:04}", i),
                "100Gi",
                format!("pool-{:02}", i % 10),
            );
            req.consumers.insert(format!("esx-{:03}", i % 100));
            req.consumers.insert(format!("esx-{:03}", (i + 1) % 100));
            req
        })
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    let snapshot = synthetic_snapshot();
    let batch = synthetic_batch(1000);

    let mut group = c.benchmark_group("validator");
    group.throughput(Throughput::Elements(batch.len() as u64));

    group.bench_function("validate_1k_requests", |b| {
        b.iter(|| {
            let verdicts = validate(black_box(&batch), black_box(&snapshot));
            black_box(verdicts)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
