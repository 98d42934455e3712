//! Benchmark helper utilities for `voxelio`.
//!
//! This module provides synthetic color generators shared by the benchmark suite, so each
//! `benches/*.rs` file stays focused on what it measures rather than how its input data is
//! built.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxelio_core::prelude::Color32;

/// Generates `count` pseudo-random opaque colors from a fixed seed, so repeated benchmark
/// runs see the same input distribution.
pub fn generate_random_colors(count: usize, seed: u64) -> Vec<Color32> {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	(0..count)
		.map(|_| Color32::new(255, rng.random(), rng.random(), rng.random()))
		.collect()
}

/// Generates `count` colors clustered around `cluster_count` well-separated centers, closer
/// to the distribution a real voxel palette sees than uniform noise.
pub fn generate_clustered_colors(count: usize, cluster_count: usize, seed: u64) -> Vec<Color32> {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	let centers: Vec<(u8, u8, u8)> = (0..cluster_count.max(1))
		.map(|_| (rng.random(), rng.random(), rng.random()))
		.collect();

	(0..count)
		.map(|i| {
			let (cr, cg, cb) = centers[i % centers.len()];
			let jitter = |c: u8| -> u8 {
				let delta: i16 = rng.random_range(-8..=8);
				(i16::from(c) + delta).clamp(0, 255) as u8
			};
			Color32::new(255, jitter(cr), jitter(cg), jitter(cb))
		})
		.collect()
}

/// Common benchmark sizes, matching the range of palettes a VOX tile writer or QB matrix
/// actually accumulates before reduction.
pub mod sizes {
	/// A single small model's worth of colors.
	pub const SMALL: usize = 256;
	/// A mid-size scene with several tiles.
	pub const MEDIUM: usize = 4_096;
	/// A large multi-tile scene.
	pub const LARGE: usize = 65_536;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generate_random_colors_is_deterministic_for_a_seed() {
		let a = generate_random_colors(64, 7);
		let b = generate_random_colors(64, 7);
		assert_eq!(a, b);
	}

	#[test]
	fn generate_clustered_colors_respects_requested_count() {
		let colors = generate_clustered_colors(sizes::SMALL, 8, 42);
		assert_eq!(colors.len(), sizes::SMALL);
	}
}
