//! Benchmark suite for hex-tree lookups and palette reduction.
//!
//! These are the two hot paths every format writer's palette-building code runs once per
//! incoming voxel: [`HexTree::closest`] to find a near-duplicate color during incremental
//! accumulation, and [`Palette::reduce`] to collapse an oversized palette down to a format's
//! hard color-count ceiling (VOX's 255, QB's 8-bit index, VOBJ's chosen index width) at
//! `finalize()` time.
//!
//! Run with: `cargo bench --manifest-path benches/Cargo.toml`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use voxelio_benches::{generate_clustered_colors, generate_random_colors, sizes};
use voxelio_core::prelude::{HexTree, Palette};
use std::hint::black_box;

fn bench_hextree_insert(c: &mut Criterion) {
	let mut group = c.benchmark_group("hextree_insert");

	for &size in &[sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let colors = generate_random_colors(size, 1);
		group.throughput(Throughput::Elements(size as u64));
		group.bench_with_input(BenchmarkId::new("random", size), &colors, |b, colors| {
			b.iter(|| {
				let mut tree = HexTree::new();
				for (i, &color) in colors.iter().enumerate() {
					tree.insert(black_box(color), i);
				}
				black_box(tree.len())
			});
		});
	}

	group.finish();
}

fn bench_hextree_closest(c: &mut Criterion) {
	let mut group = c.benchmark_group("hextree_closest");

	for &size in &[sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let colors = generate_clustered_colors(size, 32, 2);
		let mut tree = HexTree::new();
		for (i, &color) in colors.iter().enumerate() {
			tree.insert(color, i);
		}
		let queries = generate_clustered_colors(256, 32, 3);

		group.throughput(Throughput::Elements(queries.len() as u64));
		group.bench_with_input(BenchmarkId::new("clustered", size), &queries, |b, queries| {
			b.iter(|| {
				for &q in queries {
					black_box(tree.closest(black_box(q)));
				}
			});
		});
	}

	group.finish();
}

fn bench_palette_reduce(c: &mut Criterion) {
	let mut group = c.benchmark_group("palette_reduce");

	for &size in &[sizes::SMALL, sizes::MEDIUM, sizes::LARGE] {
		let colors = generate_clustered_colors(size, 64, 4);
		let palette = Palette::from_colors(colors);

		group.throughput(Throughput::Elements(size as u64));
		group.bench_with_input(BenchmarkId::new("to_255", size), &palette, |b, palette| {
			b.iter(|| black_box(palette.reduce(255, 7)));
		});
	}

	group.finish();
}

criterion_group!(benches, bench_hextree_insert, bench_hextree_closest, bench_palette_reduce);
criterion_main!(benches);
