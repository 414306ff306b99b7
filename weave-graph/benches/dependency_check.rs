use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weave_graph::DependencyGraph;

/// Build `layers` layers of `width` resources, each depending on the whole
/// layer below it.
fn layered_graph(layers: usize, width: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for layer in 0..layers {
        for i in 0..width {
            let name = format!("l{}_{}", layer, i);
            if layer == 0 {
                graph.add_resource(name);
            } else {
                graph.add_dependencies(&name, (0..width).map(|j| format!("l{}_{}", layer - 1, j)));
            }
        }
    }
    graph.add_dependencies("root", (0..width).map(|j| format!("l{}_{}", layers - 1, j)));
    graph
}

fn bench_dependency_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_check");
    for &(layers, width) in &[(4, 4), (8, 16), (16, 32)] {
        let mut graph = layered_graph(layers, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", layers, width)),
            &(layers, width),
            |b, _| {
                b.iter(|| {
                    let order = graph.run_dependency_check(black_box("root")).unwrap();
                    black_box(order.len());
                    graph.reset_dependency_check();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_dependency_check);
criterion_main!(benches);
