//! Performance benchmarks for routing derivation and worker selection.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench routing_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use qanat::routing::{DelayModel, RoutingTables};
use qanat::select::select_workers;
use qanat::topology::{Graph, Role, TopologySpec};

// ============================================================================
// Topology builders
// ============================================================================

/// A linear network of `workers` workers with relays between neighbours and
/// classical links from the coordinator to every worker.
fn line_topology(workers: usize) -> TopologySpec {
    let mut topo = TopologySpec::new().with_node("ctl", Role::Coordinator);
    for i in 0..workers {
        topo = topo.with_node(format!("w{i}"), Role::Worker);
    }
    for i in 0..workers - 1 {
        let relay = format!("bsm.{}.{}", i, i + 1);
        topo = topo
            .with_node(relay.clone(), Role::Relay)
            .with_quantum_link(format!("w{i}"), relay.clone(), 1_000.0)
            .with_quantum_link(format!("w{}", i + 1), relay, 1_000.0);
    }
    for i in 0..workers {
        topo = topo.with_classical_connection("ctl", format!("w{i}"), 2_000.0);
    }
    topo
}

/// A `side` x `side` grid of workers with unit-kilometre edges.
fn grid_graph(side: usize) -> Graph {
    let mut graph = Graph::new();
    let name = |r: usize, c: usize| format!("w{r:02}x{c:02}");
    for r in 0..side {
        for c in 0..side {
            let here = name(r, c);
            graph.entry(here.clone()).or_default();
            if r + 1 < side {
                let down = name(r + 1, c);
                graph
                    .entry(here.clone())
                    .or_default()
                    .insert(down.clone(), 1_000.0);
                graph.entry(down).or_default().insert(here.clone(), 1_000.0);
            }
            if c + 1 < side {
                let right = name(r, c + 1);
                graph
                    .entry(here.clone())
                    .or_default()
                    .insert(right.clone(), 1_000.0);
                graph.entry(right).or_default().insert(here, 1_000.0);
            }
        }
    }
    graph
}

// ============================================================================
// Routing table derivation
// ============================================================================

fn bench_routing_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing_tables");

    for workers in [4, 16, 64].iter() {
        group.throughput(Throughput::Elements(*workers as u64));
        group.bench_with_input(
            BenchmarkId::new("line", workers),
            workers,
            |b, &workers| {
                let topo = line_topology(workers);
                let model = DelayModel::default();
                b.iter(|| black_box(RoutingTables::build(&topo, &model).unwrap()));
            },
        );
    }

    group.finish();
}

// ============================================================================
// Worker selection
// ============================================================================

fn bench_worker_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_selection");

    for side in [4, 8, 16].iter() {
        let nodes = side * side;
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_with_input(BenchmarkId::new("grid", nodes), side, |b, &side| {
            let graph = grid_graph(side);
            let count = (side * side) / 4;
            b.iter(|| black_box(select_workers(&graph, count).unwrap()));
        });
    }

    group.finish();
}

#[cfg(feature = "parallel")]
fn bench_parallel_vs_sequential(c: &mut Criterion) {
    use qanat::select::select_workers_parallel;

    let mut group = c.benchmark_group("selection_comparison");
    let graph = grid_graph(16);
    let count = 64;

    group.bench_function("sequential", |b| {
        b.iter(|| black_box(select_workers(&graph, count).unwrap()));
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(select_workers_parallel(&graph, count).unwrap()));
    });

    group.finish();
}

#[cfg(not(feature = "parallel"))]
fn bench_parallel_vs_sequential(_c: &mut Criterion) {}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_routing_tables,
    bench_worker_selection,
    bench_parallel_vs_sequential,
);

criterion_main!(benches);
