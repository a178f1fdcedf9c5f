// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polyframe_csg::{Argument, BatchConverter, ConverterConfig, CsgConverter, Expr, Node, NodeKind};

fn cube(size: f64) -> Node {
    Node::invocation("cube", vec![Argument::positional(size)], vec![])
}

/// `translate([i, 0, 0]) cube(i)` for every i, under one union
fn wide_union(width: usize) -> Node {
    let children = (0..width)
        .map(|i| {
            Node::new(NodeKind::Translate {
                v: Some(Expr::vec3(i as f64, 0.0, 0.0)),
                children: vec![cube(1.0 + i as f64)],
            })
        })
        .collect();
    Node::new(NodeKind::Union { children })
}

/// A chain of `depth` nested rotations around one sphere
fn deep_chain(depth: usize) -> Node {
    let mut node = Node::invocation("sphere", vec![Argument::named("r", 5.0)], vec![]);
    for i in 0..depth {
        node = Node::new(NodeKind::Rotate {
            a: Some(Expr::Number(i as f64)),
            v: None,
            children: vec![node],
        });
    }
    node
}

fn uncached() -> ConverterConfig {
    ConverterConfig {
        cache: false,
        ..Default::default()
    }
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    let dedicated = Node::new(NodeKind::Cube {
        size: Some(Expr::Number(10.0)),
        center: Some(Expr::Bool(true)),
    });
    group.bench_function("cube_dedicated", |b| {
        let mut converter = CsgConverter::new(uncached());
        b.iter(|| converter.convert(black_box(&dedicated)).unwrap());
    });

    let invocation = Node::invocation(
        "cylinder",
        vec![
            Argument::positional(20.0),
            Argument::named("r1", 5.0),
            Argument::named("r2", 2.0),
            Argument::named("$fn", 64.0),
        ],
        vec![],
    );
    group.bench_function("cylinder_invocation", |b| {
        let mut converter = CsgConverter::new(uncached());
        b.iter(|| converter.convert(black_box(&invocation)).unwrap());
    });

    group.finish();
}

fn bench_trees(c: &mut Criterion) {
    let mut group = c.benchmark_group("trees");

    for width in [10, 100, 1000] {
        let tree = wide_union(width);
        group.bench_with_input(BenchmarkId::new("wide_union", width), &tree, |b, tree| {
            let mut converter = CsgConverter::new(uncached());
            b.iter(|| converter.convert(black_box(tree)).unwrap());
        });
    }

    for depth in [10, 100] {
        let tree = deep_chain(depth);
        group.bench_with_input(BenchmarkId::new("deep_chain", depth), &tree, |b, tree| {
            let mut converter = CsgConverter::new(uncached());
            b.iter(|| converter.convert(black_box(tree)).unwrap());
        });
    }

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let tree = wide_union(500);

    group.bench_function("cold", |b| {
        let mut converter = CsgConverter::new(uncached());
        b.iter(|| converter.convert(black_box(&tree)).unwrap());
    });

    group.bench_function("warm", |b| {
        let mut converter = CsgConverter::new(ConverterConfig::default());
        converter.convert(&tree).unwrap();
        b.iter(|| converter.convert(black_box(&tree)).unwrap());
    });

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let roots: Vec<Node> = (0..64).map(|_| wide_union(50)).collect();

    group.bench_function("sequential_64", |b| {
        b.iter(|| {
            roots
                .iter()
                .map(|root| CsgConverter::new(uncached()).convert(root))
                .collect::<Vec<_>>()
        });
    });

    group.bench_function("parallel_64", |b| {
        let batch = BatchConverter::new(uncached());
        b.iter(|| batch.convert_all(black_box(&roots)));
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_trees, bench_cache, bench_batch);
criterion_main!(benches);
