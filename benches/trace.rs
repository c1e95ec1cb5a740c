//! Benchmarks for the topology tracers.
//!
//! Runs against in-memory fixtures so the numbers measure tracer overhead
//! (frontier bookkeeping, classification, cable memoization) rather than
//! NetBox latency.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use netbox_mcp::inventory::{EndpointRef, InMemoryInventory};
use netbox_mcp::topology::{PathTracer, TreeTracer};
use std::hint::black_box;
use std::time::Duration;

/// A chain of `len` switches where every link runs through its own patch panel.
fn patched_chain(len: usize) -> InMemoryInventory {
    let inventory = InMemoryInventory::new();
    for i in 0..len {
        inventory.add_device(&format!("sw{i}"), "switch");
    }
    let mut cable_id = 0;
    for i in 0..len.saturating_sub(1) {
        let panel = format!("pp{i}");
        inventory.add_device(&panel, "patch-panel");
        inventory.add_front_port(&panel, "front1", "rear1");

        cable_id += 1;
        inventory.connect(
            cable_id,
            &[EndpointRef::interface(format!("sw{i}"), "east")],
            &[EndpointRef::front(panel.clone(), "front1")],
        );
        cable_id += 1;
        inventory.connect(
            cable_id,
            &[EndpointRef::rear(panel, "rear1")],
            &[EndpointRef::interface(format!("sw{}", i + 1), "west")],
        );
    }
    inventory
}

fn bench_path_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_trace");
    group.measurement_time(Duration::from_secs(3));

    for len in [2, 8, 16] {
        let inventory = patched_chain(len);
        let target = format!("sw{}", len - 1);
        group.bench_with_input(BenchmarkId::new("patched_chain", len), &target, |b, target| {
            b.iter(|| {
                let outcome = PathTracer::new(&inventory)
                    .trace(black_box("sw0"), black_box(target), 50)
                    .unwrap();
                black_box(outcome)
            });
        });
    }

    group.finish();
}

fn bench_tree_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_trace");
    group.measurement_time(Duration::from_secs(3));

    for len in [2, 8, 16] {
        let inventory = patched_chain(len);
        group.bench_with_input(BenchmarkId::new("patched_chain", len), &len, |b, _| {
            b.iter(|| {
                let outcome = TreeTracer::new(&inventory)
                    .trace(black_box("sw0"), black_box("east"), 64)
                    .unwrap();
                black_box(outcome)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_path_trace, bench_tree_trace);
criterion_main!(benches);
