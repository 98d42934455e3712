//! A 16-ary spatial index over [`Color32`] keys, used by palette-building writers to find the
//! nearest existing entry to a new color in roughly `O(log n)` time instead of a linear scan.
//!
//! Grounded on `dvine_types::file::item::ItemFile`'s arena-of-entries layout (`Vec<T>` plus
//! `u32` indices rather than `Rc<RefCell<_>>`), here applied to a tree rather than a flat
//! list: every node is a slot in one `Vec<HexNode>`, and child links are `Option<u32>` indices
//! into that arena. Each node branches 16 ways, one nibble of the color's interleaved key per
//! level (see [`crate::bits::ileave_bytes`]).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bits::ileave_bytes;
use crate::primitive::Color32;

type NodeIndex = u32;

const CHILD_COUNT: usize = 16;
// 4 interleaved color channels = 32 key bits = 8 nibbles.
const MAX_DEPTH: u32 = 8;

struct HexNode {
	children: [Option<NodeIndex>; CHILD_COUNT],
	/// Bit `i` set iff `children[i]` is occupied; lets [`HexTree::closest`] skip empty slots
	/// without touching `children` itself.
	child_mask: u16,
	leaf: Option<(Color32, usize)>,
}

impl HexNode {
	fn empty() -> Self {
		Self {
			children: [None; CHILD_COUNT],
			child_mask: 0,
			leaf: None,
		}
	}
}

/// Maps [`Color32`] keys to arbitrary payload indices, supporting insertion, exact lookup, and
/// nearest-neighbor search by Morton-interleaved key distance.
pub struct HexTree {
	nodes: Vec<HexNode>,
}

impl Default for HexTree {
	fn default() -> Self {
		Self::new()
	}
}

impl HexTree {
	/// Creates an empty tree with a single root node.
	pub fn new() -> Self {
		Self {
			nodes: vec![HexNode::empty()],
		}
	}

	/// The number of entries currently stored.
	pub fn len(&self) -> usize {
		self.nodes.iter().filter(|n| n.leaf.is_some()).count()
	}

	/// Whether the tree holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Inserts `color` mapped to `payload`, returning the previous payload if `color` was
	/// already present.
	pub fn insert(&mut self, color: Color32, payload: usize) -> Option<usize> {
		let key = hex_key(color);
		let mut node_index: NodeIndex = 0;
		for depth in 0..MAX_DEPTH {
			let nibble = nibble_at(key, depth);
			let existing_child = self.nodes[node_index as usize].children[nibble as usize];
			node_index = match existing_child {
				Some(child) => child,
				None => {
					self.nodes.push(HexNode::empty());
					let new_index = (self.nodes.len() - 1) as NodeIndex;
					self.nodes[node_index as usize].children[nibble as usize] = Some(new_index);
					self.nodes[node_index as usize].child_mask |= 1 << nibble;
					new_index
				}
			};
		}
		let previous = self.nodes[node_index as usize].leaf.replace((color, payload));
		previous.map(|(_, p)| p)
	}

	/// Looks up the payload stored for `color`, if an exact entry exists.
	pub fn find(&self, color: Color32) -> Option<usize> {
		let key = hex_key(color);
		let mut node_index: NodeIndex = 0;
		for depth in 0..MAX_DEPTH {
			let nibble = nibble_at(key, depth);
			node_index = self.nodes[node_index as usize].children[nibble as usize]?;
		}
		self.nodes[node_index as usize].leaf.map(|(_, p)| p)
	}

	/// Finds the stored entry whose color is nearest to `color` by squared channel distance,
	/// via best-first search: each heap entry is a subtree plus the lower bound on distance any
	/// leaf under it could achieve, so a subtree is only descended into once no already-found
	/// leaf beats that bound. Each tree level fixes one more low bit of every channel (depth 0
	/// fixes bit 0, depth 1 bit 1, ...), so the bound only tightens as bits accumulate; this is
	/// exact at depth [`MAX_DEPTH`] and loose near the root, same caveat as a full scan.
	pub fn closest(&self, color: Color32) -> Option<(Color32, usize)> {
		let query = color.channels();
		let mut heap: BinaryHeap<Reverse<(i64, NodeIndex, u32, [u8; 4])>> = BinaryHeap::new();
		heap.push(Reverse((0, 0, 0, [0u8; 4])));

		let mut best: Option<(Color32, usize)> = None;
		let mut best_dist = i64::MAX;

		while let Some(Reverse((bound, node_index, depth, fixed))) = heap.pop() {
			if bound >= best_dist {
				break;
			}
			let node = &self.nodes[node_index as usize];
			if let Some((stored, payload)) = node.leaf {
				let dist = distance_sqr(color, stored);
				if dist < best_dist {
					best_dist = dist;
					best = Some((stored, payload));
				}
			}
			if depth >= MAX_DEPTH {
				continue;
			}
			for nibble in 0..CHILD_COUNT {
				if node.child_mask & (1 << nibble) == 0 {
					continue;
				}
				let Some(child) = node.children[nibble] else {
					continue;
				};
				let mut child_fixed = fixed;
				for (c, slot) in child_fixed.iter_mut().enumerate() {
					let bit = ((nibble >> c) & 1) as u8;
					*slot |= bit << depth;
				}
				let child_bound = subtree_lower_bound(query, child_fixed, depth + 1);
				if child_bound < best_dist {
					heap.push(Reverse((child_bound, child, depth + 1, child_fixed)));
				}
			}
		}

		best
	}

	/// Squared channel distance between `a` and `b`, the metric [`closest`](Self::closest)
	/// minimizes.
	pub fn distance_sqr(a: Color32, b: Color32) -> i64 {
		distance_sqr(a, b)
	}

	/// Visits every stored `(color, payload)` pair in tree order.
	pub fn for_each(&self, mut visit: impl FnMut(Color32, usize)) {
		for node in &self.nodes {
			if let Some((color, payload)) = node.leaf {
				visit(color, payload);
			}
		}
	}
}

fn hex_key(color: Color32) -> u64 {
	ileave_bytes(&color.channels(), 4)
}

fn nibble_at(key: u64, depth: u32) -> u8 {
	((key >> (depth * 4)) & 0xF) as u8
}

/// The least squared distance any leaf consistent with `fixed`'s low `depth` bits per channel
/// could have from `query`: for each channel, the closest point of the arithmetic progression
/// `fixed[c], fixed[c] + 2^depth, fixed[c] + 2*2^depth, ...` to `query[c]`.
fn subtree_lower_bound(query: [u8; 4], fixed: [u8; 4], depth: u32) -> i64 {
	(0..4).map(|c| channel_lower_bound(query[c], fixed[c], depth)).sum()
}

fn channel_lower_bound(query: u8, fixed: u8, depth: u32) -> i64 {
	if depth >= MAX_DEPTH {
		let diff = query as i64 - fixed as i64;
		return diff * diff;
	}
	let step: i64 = 1 << depth;
	let f = fixed as i64;
	let q = query as i64;
	let max_k = (255 - f) / step;
	let k = ((q - f) / step).clamp(0, max_k);

	let mut best = i64::MAX;
	for cand_k in [k, k + 1] {
		if cand_k < 0 || cand_k > max_k {
			continue;
		}
		let diff = q - (f + cand_k * step);
		best = best.min(diff * diff);
	}
	best
}

fn distance_sqr(a: Color32, b: Color32) -> i64 {
	let [aa, ar, ag, ab] = a.channels();
	let [ba, br, bg, bb] = b.channels();
	let da = aa as i64 - ba as i64;
	let dr = ar as i64 - br as i64;
	let dg = ag as i64 - bg as i64;
	let db = ab as i64 - bb as i64;
	da * da + dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_and_find_roundtrip() {
		let mut tree = HexTree::new();
		tree.insert(Color32::new(255, 10, 20, 30), 1);
		tree.insert(Color32::new(255, 200, 100, 50), 2);
		assert_eq!(tree.find(Color32::new(255, 10, 20, 30)), Some(1));
		assert_eq!(tree.find(Color32::new(255, 200, 100, 50)), Some(2));
		assert_eq!(tree.find(Color32::new(0, 0, 0, 0)), None);
	}

	#[test]
	fn insert_overwrites_and_reports_previous() {
		let mut tree = HexTree::new();
		assert_eq!(tree.insert(Color32::WHITE, 1), None);
		assert_eq!(tree.insert(Color32::WHITE, 2), Some(1));
		assert_eq!(tree.find(Color32::WHITE), Some(2));
		assert_eq!(tree.len(), 1);
	}

	#[test]
	fn closest_finds_nearest_by_channel_distance() {
		let mut tree = HexTree::new();
		tree.insert(Color32::new(255, 0, 0, 0), 1);
		tree.insert(Color32::new(255, 255, 255, 255), 2);
		let (_, payload) = tree.closest(Color32::new(255, 10, 10, 10)).unwrap();
		assert_eq!(payload, 1);
	}

	#[test]
	fn closest_matches_brute_force_over_random_entries() {
		use rand::{Rng, SeedableRng};
		use rand_chacha::ChaCha8Rng;

		let mut rng = ChaCha8Rng::seed_from_u64(99);
		let mut tree = HexTree::new();
		let mut stored = Vec::new();
		for i in 0..200usize {
			let color = Color32::new(255, rng.random(), rng.random(), rng.random());
			tree.insert(color, i);
			stored.push(color);
		}

		for _ in 0..50 {
			let query = Color32::new(255, rng.random(), rng.random(), rng.random());
			let (_, got) = tree.closest(query).unwrap();
			let want_dist = stored.iter().map(|&c| distance_sqr(query, c)).min().unwrap();
			let got_dist = distance_sqr(query, stored[got]);
			assert_eq!(got_dist, want_dist);
		}
	}

	#[test]
	fn for_each_visits_every_entry() {
		let mut tree = HexTree::new();
		for i in 0..20u8 {
			tree.insert(Color32::new(255, i, i.wrapping_mul(7), i.wrapping_mul(13)), i as usize);
		}
		let mut seen = Vec::new();
		tree.for_each(|_, payload| seen.push(payload));
		seen.sort_unstable();
		assert_eq!(seen, (0..20).collect::<Vec<_>>());
	}
}
