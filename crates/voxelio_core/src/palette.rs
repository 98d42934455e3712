//! An insertion-ordered color table, with a k-means++ reduction pass for formats whose
//! palette is capped (Binvox has none; QB and VOX cap at 256 entries).
//!
//! Grounded on `dvine_types::file::item`'s entry-table idiom (a `Vec<T>` plus a lookup by
//! key, insertion order preserved) generalized from item entries to [`Color32`] entries, with
//! the k-means++ seeding/reduction itself grounded on the pack's `rand_chacha`-seeded
//! deterministic RNG usage pattern (palette reduction must be reproducible across runs given
//! the same input, so seeding is explicit rather than from OS entropy).

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::primitive::Color32;

/// An ordered, deduplicated table of colors.
///
/// Index `0` is conventionally reserved as "empty/no voxel" by every format that uses a
/// palette-indexed voxel representation (QB, VOX); [`Palette::new`] does not itself reserve
/// it, leaving that convention to the format codec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
	colors: Vec<Color32>,
}

impl Palette {
	/// Creates an empty palette.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a palette from a known sequence of colors, preserving order and duplicates.
	pub fn from_colors(colors: Vec<Color32>) -> Self {
		Self {
			colors,
		}
	}

	/// The number of entries.
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// Whether the palette has no entries.
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// Borrows the color at `index`, if present.
	pub fn get(&self, index: usize) -> Option<Color32> {
		self.colors.get(index).copied()
	}

	/// Appends `color`, returning its index. Does not deduplicate; use
	/// [`find_or_insert`](Self::find_or_insert) when duplicates should be merged.
	pub fn push(&mut self, color: Color32) -> usize {
		self.colors.push(color);
		self.colors.len() - 1
	}

	/// Returns the index of `color` if it is already present, otherwise appends it.
	pub fn find_or_insert(&mut self, color: Color32) -> usize {
		if let Some(index) = self.colors.iter().position(|&c| c == color) {
			return index;
		}
		self.push(color)
	}

	/// Iterates the palette in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = Color32> + '_ {
		self.colors.iter().copied()
	}

	/// Borrows the underlying color slice.
	pub fn as_slice(&self) -> &[Color32] {
		&self.colors
	}

	/// Finds the entry closest to `color` by squared Euclidean distance over `(r, g, b)`,
	/// ignoring alpha. Used by writers that must fit an arbitrary color into a fixed-size
	/// reduced palette.
	pub fn nearest(&self, color: Color32) -> Option<usize> {
		self.colors
			.iter()
			.enumerate()
			.min_by_key(|(_, c)| color_distance_sqr(color, **c))
			.map(|(i, _)| i)
	}

	/// Reduces this palette to at most `target_len` entries via k-means++ clustering over
	/// `(r, g, b)`, returning the new, smaller palette and a per-original-index mapping into
	/// it. `seed` makes the run reproducible; the same palette and seed always reduce
	/// identically.
	///
	/// If `self.len() <= target_len`, returns a clone of `self` with the identity mapping.
	pub fn reduce(&self, target_len: usize, seed: u64) -> (Palette, Vec<usize>) {
		assert!(target_len > 0, "target_len must be at least 1");
		if self.colors.len() <= target_len {
			return (self.clone(), (0..self.colors.len()).collect());
		}

		let mut rng = ChaCha8Rng::seed_from_u64(seed);
		let mut centroids = kmeans_plus_plus_seed(&self.colors, target_len, &mut rng);

		const MAX_ITERATIONS: usize = 16;
		let mut assignment = vec![0usize; self.colors.len()];
		for _ in 0..MAX_ITERATIONS {
			let mut changed = false;
			for (i, &color) in self.colors.iter().enumerate() {
				let nearest = nearest_centroid(color, &centroids);
				if assignment[i] != nearest {
					assignment[i] = nearest;
					changed = true;
				}
			}

			let mut sums = vec![[0i64; 4]; centroids.len()];
			let mut counts = vec![0u64; centroids.len()];
			for (&color, &cluster) in self.colors.iter().zip(assignment.iter()) {
				let [a, r, g, b] = color.channels();
				sums[cluster][0] += a as i64;
				sums[cluster][1] += r as i64;
				sums[cluster][2] += g as i64;
				sums[cluster][3] += b as i64;
				counts[cluster] += 1;
			}
			for (cluster, centroid) in centroids.iter_mut().enumerate() {
				if counts[cluster] == 0 {
					continue;
				}
				let n = counts[cluster] as i64;
				*centroid = Color32::from_channels([
					(sums[cluster][0] / n) as u8,
					(sums[cluster][1] / n) as u8,
					(sums[cluster][2] / n) as u8,
					(sums[cluster][3] / n) as u8,
				]);
			}

			if !changed {
				break;
			}
		}

		(Palette::from_colors(centroids), assignment)
	}
}

fn color_distance_sqr(a: Color32, b: Color32) -> i64 {
	let [_, ar, ag, ab] = a.channels();
	let [_, br, bg, bb] = b.channels();
	let dr = ar as i64 - br as i64;
	let dg = ag as i64 - bg as i64;
	let db = ab as i64 - bb as i64;
	dr * dr + dg * dg + db * db
}

fn nearest_centroid(color: Color32, centroids: &[Color32]) -> usize {
	centroids
		.iter()
		.enumerate()
		.min_by_key(|(_, c)| color_distance_sqr(color, **c))
		.map(|(i, _)| i)
		.unwrap_or(0)
}

/// k-means++ seeding: the first centroid is picked uniformly at random, then each subsequent
/// centroid is picked with probability proportional to its squared distance from the nearest
/// already-chosen centroid, so seeds spread out across the color space instead of clumping.
fn kmeans_plus_plus_seed(colors: &[Color32], k: usize, rng: &mut ChaCha8Rng) -> Vec<Color32> {
	let mut centroids = Vec::with_capacity(k);
	centroids.push(colors[rng.random_range(0..colors.len())]);

	while centroids.len() < k {
		let weights: Vec<f64> = colors
			.iter()
			.map(|&c| {
				centroids
					.iter()
					.map(|&centroid| color_distance_sqr(c, centroid) as f64)
					.fold(f64::INFINITY, f64::min)
			})
			.collect();
		let total: f64 = weights.iter().sum();
		if total <= 0.0 {
			centroids.push(colors[rng.random_range(0..colors.len())]);
			continue;
		}
		let mut threshold = rng.random_range(0.0..total);
		let mut chosen = colors.len() - 1;
		for (i, &w) in weights.iter().enumerate() {
			if threshold < w {
				chosen = i;
				break;
			}
			threshold -= w;
		}
		centroids.push(colors[chosen]);
	}

	centroids
}

#[cfg(test)]
mod tests {
	use super::*;

	fn c(r: u8, g: u8, b: u8) -> Color32 {
		Color32::new(255, r, g, b)
	}

	#[test]
	fn find_or_insert_deduplicates() {
		let mut palette = Palette::new();
		let a = palette.find_or_insert(c(10, 20, 30));
		let b = palette.find_or_insert(c(40, 50, 60));
		let a_again = palette.find_or_insert(c(10, 20, 30));
		assert_eq!(a, a_again);
		assert_ne!(a, b);
		assert_eq!(palette.len(), 2);
	}

	#[test]
	fn reduce_is_noop_when_already_small() {
		let palette = Palette::from_colors(vec![c(1, 1, 1), c(2, 2, 2)]);
		let (reduced, mapping) = palette.reduce(8, 0);
		assert_eq!(reduced.len(), 2);
		assert_eq!(mapping, vec![0, 1]);
	}

	#[test]
	fn reduce_clusters_near_colors_together() {
		let mut colors = Vec::new();
		for _ in 0..50 {
			colors.push(c(250, 5, 5));
		}
		for _ in 0..50 {
			colors.push(c(5, 5, 250));
		}
		let palette = Palette::from_colors(colors);
		let (reduced, mapping) = palette.reduce(2, 42);
		assert_eq!(reduced.len(), 2);
		assert_eq!(mapping[0], mapping[49]);
		assert_eq!(mapping[50], mapping[99]);
		assert_ne!(mapping[0], mapping[50]);
	}

	#[test]
	fn reduce_is_deterministic_for_a_given_seed() {
		let colors: Vec<Color32> = (0..40).map(|i| c(i as u8 * 6, (i * 3) as u8, (i * 9) as u8)).collect();
		let palette = Palette::from_colors(colors);
		let (first, first_map) = palette.reduce(5, 7);
		let (second, second_map) = palette.reduce(5, 7);
		assert_eq!(first, second);
		assert_eq!(first_map, second_map);
	}

	#[test]
	fn nearest_finds_closest_entry() {
		let palette = Palette::from_colors(vec![c(0, 0, 0), c(255, 255, 255)]);
		assert_eq!(palette.nearest(c(10, 10, 10)), Some(0));
		assert_eq!(palette.nearest(c(250, 250, 250)), Some(1));
	}
}
