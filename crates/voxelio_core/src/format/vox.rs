//! MagicaVoxel `.vox`: a chunk tree culminating in a scene graph of transform/group/shape
//! nodes layered over a flat list of `(SIZE, XYZI)` models.
//!
//! This is the one codec in the corpus whose structure (parent/child references resolved into
//! a DAG) has no direct teacher analogue; grounded instead on the pack's `jgraef-vox-format`
//! reference file (under `other_examples/`) for the chunk-id/child-size wire shape,
//! reimplemented in this crate's own error-handling and header-parsing idiom rather than
//! copied, and on `dvine_types::file::efc::builder::FileBuilder`'s "accumulate then finalize"
//! two-phase pattern for the writer's backpatched `MAIN.self_size`.

use std::collections::HashMap;

use crate::palette::Palette;
use crate::primitive::Color32;
use crate::result::{ReadResult, ResultCode, VoxelIoError};
use crate::stream::{InputStream, OutputStream};
use crate::voxel::{Voxel32, VoxelListWriter, VoxelReader};

const VOX_MAGIC: &[u8; 4] = b"VOX ";
const DEFAULT_WRITER_CHUNK_SIZE: u32 = 126;

/// A row-major 3x3 integer rotation plus an integer translation, as concatenated along the
/// `nTRN` parent chain from a shape up to the scene root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
	/// Row-major 3x3 rotation/reflection matrix; each row has exactly one nonzero entry, `±1`.
	pub matrix: [[i32; 3]; 3],
	/// Translation applied after rotation.
	pub t: [i32; 3],
}

impl Transform {
	/// The identity transform.
	pub const IDENTITY: Transform = Transform {
		matrix: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
		t: [0, 0, 0],
	};

	/// Concatenates `self` (outer, applied second) with `inner` (applied first):
	/// `(self . inner).matrix[r][c] = dot(self.row[r], inner.col[c])`,
	/// `(self . inner).t = self.t + self.matrix . inner.t`.
	pub fn concat(self, inner: Transform) -> Transform {
		let mut matrix = [[0i32; 3]; 3];
		for r in 0..3 {
			for c in 0..3 {
				matrix[r][c] = (0..3).map(|k| self.matrix[r][k] * inner.matrix[k][c]).sum();
			}
		}
		let mut t = [0i32; 3];
		for r in 0..3 {
			t[r] = self.t[r] + (0..3).map(|k| self.matrix[r][k] * inner.t[k]).sum::<i32>();
		}
		Transform {
			matrix,
			t,
		}
	}
}

/// Decodes an `nTRN` `"_r"` rotation byte into a [`Transform`]'s matrix (translation left at
/// zero). Row 2's nonzero column is looked up via the table the format's spec fixes; two rows
/// claiming the same column is a corrupt file.
pub fn decode_rotation_byte(r: u8) -> Result<[[i32; 3]; 3], &'static str> {
	const ROW2_LOOKUP: [i8; 8] = [-1, -1, -1, 2, -1, 1, 0, -1];
	let row0_col = (r & 0b11) as usize;
	let row1_col = ((r >> 2) & 0b11) as usize;
	if row0_col > 2 || row1_col > 2 || row0_col == row1_col {
		return Err("row0/row1 column indices must be distinct and < 3");
	}
	let key = (1usize << row0_col) | (1usize << row1_col);
	let row2_col = ROW2_LOOKUP[key];
	if row2_col < 0 {
		return Err("ambiguous row2 column");
	}
	let row2_col = row2_col as usize;

	let sign = |bit: u8| -> i32 {
		if (r >> bit) & 1 == 1 {
			-1
		} else {
			1
		}
	};

	let mut matrix = [[0i32; 3]; 3];
	matrix[0][row0_col] = sign(4);
	matrix[1][row1_col] = sign(5);
	matrix[2][row2_col] = sign(6);
	Ok(matrix)
}

#[derive(Debug, Clone)]
struct RawModel {
	dim: [u32; 3],
	voxels: Vec<(u8, u8, u8, u8)>,
}

#[derive(Debug, Clone)]
enum VoxNode {
	Transform {
		child: u32,
		rotation: [[i32; 3]; 3],
		translation: [i32; 3],
	},
	Group {
		children: Vec<u32>,
	},
	Shape {
		model_index: usize,
	},
}

struct ChunkCursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> ChunkCursor<'a> {
	fn new(bytes: &'a [u8]) -> Self {
		Self {
			bytes,
			pos: 0,
		}
	}

	fn remaining(&self) -> usize {
		self.bytes.len() - self.pos
	}

	fn take(&mut self, n: usize) -> Result<&'a [u8], VoxelIoError> {
		if self.remaining() < n {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorUnexpectedEof,
				self.pos as u64,
				"chunk body truncated",
			));
		}
		let slice = &self.bytes[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	fn u32le(&mut self) -> Result<u32, VoxelIoError> {
		Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
	}

	fn i32le(&mut self) -> Result<i32, VoxelIoError> {
		Ok(self.u32le()? as i32)
	}

	fn string(&mut self) -> Result<String, VoxelIoError> {
		let len = self.u32le()? as usize;
		Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
	}

	fn dict(&mut self) -> Result<HashMap<String, String>, VoxelIoError> {
		let count = self.u32le()?;
		let mut map = HashMap::new();
		for _ in 0..count {
			let key = self.string()?;
			let value = self.string()?;
			map.insert(key, value);
		}
		Ok(map)
	}
}

struct Chunk<'a> {
	id: [u8; 4],
	self_bytes: &'a [u8],
	children_bytes: &'a [u8],
}

fn read_chunk<'a>(cursor: &mut ChunkCursor<'a>) -> Result<Chunk<'a>, VoxelIoError> {
	let id: [u8; 4] = cursor.take(4)?.try_into().unwrap();
	let self_size = cursor.u32le()? as usize;
	let children_size = cursor.u32le()? as usize;
	let self_bytes = cursor.take(self_size)?;
	let children_bytes = cursor.take(children_size)?;
	Ok(Chunk {
		id,
		self_bytes,
		children_bytes,
	})
}

/// All scene data extracted from a parse, ready for the second (voxel-emission) pass.
struct VoxScene {
	models: Vec<RawModel>,
	palette: [Color32; 256],
	nodes: HashMap<u32, VoxNode>,
	/// Child id to every parent id that references it. A plain one-to-one map would silently
	/// drop all but the last placement when `nGRP`/`nTRN` nodes reuse the same child in more
	/// than one place (model instancing).
	parent_of: HashMap<u32, Vec<u32>>,
}

fn default_palette() -> [Color32; 256] {
	// MagicaVoxel's built-in default palette ramps through a fixed gradient; since every real
	// file ships its own RGBA chunk, an all-white fallback keeps unpaletted fixtures visible
	// rather than invisible without claiming to reproduce the exact stock ramp.
	[Color32::WHITE; 256]
}

fn parse_scene(data: &[u8]) -> Result<VoxScene, VoxelIoError> {
	if data.len() < 8 || &data[0..4] != VOX_MAGIC {
		return Err(VoxelIoError::read(
			ResultCode::ReadErrorUnexpectedMagic,
			0,
			"missing `VOX ` magic",
		));
	}
	let mut cursor = ChunkCursor::new(&data[8..]);
	let main = read_chunk(&mut cursor)?;
	if &main.id != b"MAIN" {
		return Err(VoxelIoError::read(
			ResultCode::ReadErrorUnexpectedMagic,
			8,
			"expected MAIN chunk",
		));
	}

	let mut models = Vec::new();
	let mut pending_dim: Option<[u32; 3]> = None;
	let mut palette = default_palette();
	let mut nodes = HashMap::new();
	let mut parent_of = HashMap::new();

	let mut child_cursor = ChunkCursor::new(main.children_bytes);
	while child_cursor.remaining() > 0 {
		let chunk = read_chunk(&mut child_cursor)?;
		let mut body = ChunkCursor::new(chunk.self_bytes);
		match &chunk.id {
			b"PACK" => {
				return Err(VoxelIoError::read(
					ResultCode::ReadErrorUnsupportedFeature,
					0,
					"PACK chunk is not supported",
				));
			}
			b"SIZE" => {
				let x = body.u32le()?;
				let y = body.u32le()?;
				let z = body.u32le()?;
				pending_dim = Some([x, y, z]);
			}
			b"XYZI" => {
				let Some(dim) = pending_dim.take() else {
					return Err(VoxelIoError::read(
						ResultCode::ReadErrorMissingData,
						0,
						"XYZI without a preceding SIZE",
					));
				};
				let num_voxels = body.u32le()?;
				let mut voxels = Vec::with_capacity(num_voxels as usize);
				for _ in 0..num_voxels {
					let bytes = body.take(4)?;
					voxels.push((bytes[0], bytes[1], bytes[2], bytes[3]));
				}
				models.push(RawModel {
					dim,
					voxels,
				});
			}
			b"RGBA" => {
				let mut entries = [Color32::WHITE; 256];
				for slot in entries.iter_mut() {
					let bytes = body.take(4)?;
					*slot = Color32::new(bytes[3], bytes[0], bytes[1], bytes[2]);
				}
				// palette index i maps to RGBA entry i-1 (mod 256); index 0 is reserved.
				for i in 1..256 {
					palette[i] = entries[i - 1];
				}
				palette[0] = entries[255];
			}
			b"MATT" | b"MATL" | b"IMAP" | b"rOBJ" | b"LAYR" => {
				// ignored/informational: bodies already consumed by read_chunk
			}
			b"nTRN" => {
				let id = body.u32le()?;
				let _attrs = body.dict()?;
				let child = body.u32le()?;
				let reserved = body.i32le()?;
				if reserved != -1 {
					return Err(VoxelIoError::read(
						ResultCode::ReadErrorInvalidConstant,
						0,
						"nTRN reservedId must be -1",
					));
				}
				let _layer_id = body.u32le()?;
				let num_frames = body.u32le()?;
				if num_frames != 1 {
					return Err(VoxelIoError::read(
						ResultCode::ReadErrorUnsupportedFeature,
						0,
						"nTRN with numFrames != 1 is not supported",
					));
				}
				let frame_dict = body.dict()?;
				let rotation = match frame_dict.get("_r") {
					Some(value) => {
						let byte: u8 = value.parse().map_err(|_| {
							VoxelIoError::read(
								ResultCode::ReadErrorTextParseFail,
								0,
								"invalid `_r` rotation field",
							)
						})?;
						decode_rotation_byte(byte).map_err(|msg| {
							VoxelIoError::read(ResultCode::ReadErrorUnexpectedSymbol, 0, msg)
						})?
					}
					None => Transform::IDENTITY.matrix,
				};
				let translation = match frame_dict.get("_t") {
					Some(value) => {
						let mut parts = value.split_whitespace();
						let mut t = [0i32; 3];
						for slot in &mut t {
							*slot = parts.next().and_then(|s| s.parse().ok()).ok_or_else(|| {
								VoxelIoError::read(
									ResultCode::ReadErrorTextParseFail,
									0,
									"invalid `_t` translation field",
								)
							})?;
						}
						t
					}
					None => [0, 0, 0],
				};
				nodes.insert(
					id,
					VoxNode::Transform {
						child,
						rotation,
						translation,
					},
				);
				parent_of.entry(child).or_insert_with(Vec::new).push(id);
			}
			b"nGRP" => {
				let id = body.u32le()?;
				let _attrs = body.dict()?;
				let child_count = body.u32le()?;
				let mut children = Vec::with_capacity(child_count as usize);
				for _ in 0..child_count {
					let child_id = body.u32le()?;
					children.push(child_id);
					parent_of.entry(child_id).or_insert_with(Vec::new).push(id);
				}
				nodes.insert(id, VoxNode::Group {
					children,
				});
			}
			b"nSHP" => {
				let id = body.u32le()?;
				let _attrs = body.dict()?;
				let model_count = body.u32le()?;
				if model_count != 1 {
					return Err(VoxelIoError::read(
						ResultCode::ReadErrorUnsupportedFeature,
						0,
						"nSHP with modelCount != 1 is not supported",
					));
				}
				let model_id = body.u32le()?;
				let _reserved = body.dict()?;
				nodes.insert(
					id,
					VoxNode::Shape {
						model_index: model_id as usize,
					},
				);
			}
			other => {
				return Err(VoxelIoError::read(
					ResultCode::ReadErrorCorruptedEnum,
					0,
					format!("unrecognized chunk id {:?}", String::from_utf8_lossy(other)),
				));
			}
		}
	}

	Ok(VoxScene {
		models,
		palette,
		nodes,
		parent_of,
	})
}

impl VoxScene {
	/// Every transform that reaches `node_id` by walking up `parent_of`, one per distinct
	/// root-to-node path. A node referenced by more than one `nGRP`/`nTRN` parent is instanced:
	/// it contributes one entry per parent here, not one total.
	fn ancestor_transforms(&self, node_id: u32) -> Vec<Transform> {
		match self.parent_of.get(&node_id) {
			None => vec![Transform::IDENTITY],
			Some(parents) => {
				let mut out = Vec::new();
				for &parent in parents {
					let own = match self.nodes.get(&parent) {
						Some(VoxNode::Transform {
							rotation,
							translation,
							..
						}) => Transform {
							matrix: *rotation,
							t: *translation,
						},
						_ => Transform::IDENTITY,
					};
					// `own` is the closer transform (applied first); everything above `parent`
					// is farther and must wrap around it as the outer operand.
					for above in self.ancestor_transforms(parent) {
						out.push(above.concat(own));
					}
				}
				out
			}
		}
	}

	/// One entry per shape placement: a shape instanced under two different parent chains
	/// yields two entries here, each with its own composed transform.
	fn placements(&self) -> Vec<(u32, usize, Transform)> {
		let mut shape_ids: Vec<u32> = self
			.nodes
			.iter()
			.filter_map(|(&id, node)| matches!(node, VoxNode::Shape { .. }).then_some(id))
			.collect();
		shape_ids.sort_unstable();

		let mut out = Vec::new();
		for id in shape_ids {
			let Some(VoxNode::Shape { model_index }) = self.nodes.get(&id) else {
				continue;
			};
			for transform in self.ancestor_transforms(id) {
				out.push((id, *model_index, transform));
			}
		}
		out
	}
}

/// Reads an entire VOX file's scene graph up front (the format's two-pass assembly requires
/// whole-file chunk data before any voxel can be emitted) and then streams voxels out of it
/// resumably, one shape's model at a time.
pub struct VoxReader<R> {
	source: R,
	scene: Option<VoxScene>,
	shape_index: usize,
	voxel_index: usize,
	fix_gravity: bool,
	announced_object_end: bool,
}

impl<R: InputStream> VoxReader<R> {
	/// Wraps `source`. `fix_gravity` applies the Y/Z swap-and-negate MagicaVoxel's Z-up
	/// convention needs for a Y-up consumer.
	pub fn new(source: R, fix_gravity: bool) -> Self {
		Self {
			source,
			scene: None,
			shape_index: 0,
			voxel_index: 0,
			fix_gravity,
			announced_object_end: false,
		}
	}

	fn read_all(&mut self) -> Vec<u8> {
		let mut data = Vec::new();
		let mut chunk = [0u8; 8192];
		loop {
			let n = self.source.read(&mut chunk);
			if n == 0 {
				break;
			}
			data.extend_from_slice(&chunk[..n]);
		}
		data
	}
}

impl<R: InputStream> VoxelReader<Voxel32> for VoxReader<R> {
	fn init(&mut self) -> ReadResult {
		if self.scene.is_some() {
			return ReadResult::ok(ResultCode::WarningDoubleInit);
		}
		let data = self.read_all();
		match parse_scene(&data) {
			Ok(scene) => {
				self.scene = Some(scene);
				ReadResult::ok(ResultCode::OkInitialized)
			}
			Err(e) => e.into(),
		}
	}

	fn read(&mut self, buf: &mut [Voxel32]) -> ReadResult {
		if self.scene.is_none() {
			return self.init();
		}
		let scene = self.scene.as_ref().expect("checked above");
		let placements = scene.placements();
		let mut written = 0;

		while written < buf.len() {
			if self.shape_index >= placements.len() {
				return ReadResult::read(written as u64, ResultCode::ReadEnd);
			}
			let (_shape_id, model_index, transform) = placements[self.shape_index];
			let Some(model) = scene.models.get(model_index) else {
				return VoxelIoError::read(
					ResultCode::ReadErrorMissingData,
					0,
					"nSHP references a model index with no XYZI data",
				)
				.into();
			};

			if self.voxel_index >= model.voxels.len() {
				self.voxel_index = 0;
				self.shape_index += 1;
				if !self.announced_object_end {
					self.announced_object_end = true;
					return ReadResult::read(written as u64, ResultCode::ReadObjectEnd);
				}
				self.announced_object_end = false;
				continue;
			}

			// Doubling keeps the pivot exact for even-sized models, whose true center falls on
			// a half-integer; `apply_point_halved` divides back down after rotating.
			let pivot = [
				model.dim[0] as i32 - 1,
				model.dim[1] as i32 - 1,
				model.dim[2] as i32 - 1,
			];

			let (x, y, z, palette_index) = model.voxels[self.voxel_index];
			let doubled = [2 * x as i32 - pivot[0], 2 * y as i32 - pivot[1], 2 * z as i32 - pivot[2]];
			let rotated = transform.apply_point_halved(doubled);
			let mut pos = rotated;
			if self.fix_gravity {
				pos = [pos[0], -pos[2], pos[1]];
			}
			let color = scene.palette[palette_index as usize];
			buf[written] = Voxel32 {
				pos,
				argb: color.to_argb32(),
			};
			written += 1;
			self.voxel_index += 1;
		}

		ReadResult::read(written as u64, ResultCode::ReadBufferFull)
	}

	fn progress(&self) -> f32 {
		let Some(scene) = &self.scene else {
			return 0.0;
		};
		let total = scene.placements().len().max(1);
		(self.shape_index as f32 / total as f32).clamp(0.0, 1.0)
	}
}

impl Transform {
	/// Applies the transform to an already-doubled point, then halves with floor division,
	/// per the format's "double-pivot" integer trick for centering odd-sized models.
	fn apply_point_halved(&self, doubled: [i32; 3]) -> [i32; 3] {
		let mut out = [0i32; 3];
		for r in 0..3 {
			let dotted = (0..3).map(|k| self.matrix[r][k] * doubled[k]).sum::<i32>();
			out[r] = dotted.div_euclid(2) + self.t[r];
		}
		out
	}
}

/// Tile-major writer: splits incoming voxels into fixed-size cubic chunks, reduces the
/// palette to ≤255 colors, and assembles the whole `MAIN` chunk body in memory so its
/// `childrenSize` field is known before anything is written, at [`finalize`](Self::finalize).
pub struct VoxWriter<W> {
	sink: W,
	chunk_size: u32,
	tiles: HashMap<[i32; 3], Vec<Voxel32>>,
	palette: Palette,
	initialized: bool,
}

impl<W: OutputStream> VoxWriter<W> {
	/// Creates a writer with the default 126-voxel tile size.
	pub fn new(sink: W) -> Self {
		Self::with_chunk_size(sink, DEFAULT_WRITER_CHUNK_SIZE)
	}

	/// Creates a writer tiling the scene into `chunk_size`-voxel cubes.
	pub fn with_chunk_size(sink: W, chunk_size: u32) -> Self {
		Self {
			sink,
			chunk_size,
			tiles: HashMap::new(),
			palette: Palette::new(),
			initialized: false,
		}
	}

	fn tile_key(&self, pos: [i32; 3]) -> [i32; 3] {
		let size = self.chunk_size as i32;
		[pos[0].div_euclid(size), pos[1].div_euclid(size), pos[2].div_euclid(size)]
	}

	/// Consumes the writer, returning the underlying sink (e.g. to recover the written bytes
	/// from a [`crate::stream::ByteArrayStream`] after [`finalize`](VoxelListWriter::finalize)).
	pub fn into_sink(self) -> W {
		self.sink
	}
}

impl<W: OutputStream> VoxelListWriter<Voxel32> for VoxWriter<W> {
	fn init(&mut self) -> ResultCode {
		if self.initialized {
			return ResultCode::WarningDoubleInit;
		}
		if self.palette.is_empty() {
			return ResultCode::UserErrorMissingPalette;
		}
		self.initialized = true;
		ResultCode::OkInitialized
	}

	fn write(&mut self, buf: &[Voxel32]) -> ResultCode {
		if !self.initialized {
			let code = self.init();
			if code.is_error() {
				return code;
			}
		}
		for &v in buf {
			let key = self.tile_key(v.pos);
			self.tiles.entry(key).or_default().push(v);
		}
		ResultCode::WriteOk
	}

	fn palette_mut(&mut self) -> &mut Palette {
		&mut self.palette
	}

	fn set_canvas_dimensions(&mut self, _dims: [u32; 3]) -> bool {
		// VOX has no fixed overall canvas; tiles are sized by chunk_size, not a declared bound.
		!self.initialized
	}

	fn finalize(&mut self) -> ResultCode {
		let (reduced, mapping) = self.palette.reduce(255, 0);
		let size = self.chunk_size as i32;

		let mut main_body = Vec::new();
		let mut node_id: u32 = 1;
		let group_id = node_id;
		node_id += 1;
		let mut child_ids = Vec::new();

		for (key, voxels) in &self.tiles {
			let model_index = child_ids.len() as u32;
			let mut xyzi_body = Vec::new();
			xyzi_body.extend((voxels.len() as u32).to_le_bytes());
			for v in voxels {
				let local = [
					(v.pos[0] - key[0] * size) as u8,
					(v.pos[1] - key[1] * size) as u8,
					(v.pos[2] - key[2] * size) as u8,
				];
				let original_index = self.palette.as_slice().iter().position(|&c| c.to_argb32() == v.argb);
				let palette_index = match original_index {
					Some(i) => (mapping[i] + 1) % 256,
					None => 1,
				};
				xyzi_body.push(local[0]);
				xyzi_body.push(local[1]);
				xyzi_body.push(local[2]);
				xyzi_body.push(palette_index as u8);
			}
			write_chunk(&mut main_body, b"SIZE", &{
				let mut body = Vec::new();
				body.extend((self.chunk_size).to_le_bytes());
				body.extend((self.chunk_size).to_le_bytes());
				body.extend((self.chunk_size).to_le_bytes());
				body
			});
			write_chunk(&mut main_body, b"XYZI", &xyzi_body);

			let trn_id = node_id;
			node_id += 1;
			let shp_id = node_id;
			node_id += 1;
			let mut trn_body = Vec::new();
			trn_body.extend(trn_id.to_le_bytes());
			write_dict(&mut trn_body, &[]);
			trn_body.extend(shp_id.to_le_bytes());
			trn_body.extend((-1i32).to_le_bytes());
			trn_body.extend(0u32.to_le_bytes());
			trn_body.extend(1u32.to_le_bytes());
			// The reader centers every model on its own pivot (local 0 decodes to
			// `-((size - 1)).div_euclid(2)` before translation), so the tile's nTRN
			// translation has to absorb that offset for a tile-local `0` to land back on the
			// tile's origin corner rather than its center.
			let center_correction = -((-(size - 1)).div_euclid(2));
			let t = [
				key[0] * size + center_correction,
				key[1] * size + center_correction,
				key[2] * size + center_correction,
			];
			write_dict(&mut trn_body, &[("_t".to_string(), format!("{} {} {}", t[0], t[1], t[2]))]);
			write_chunk(&mut main_body, b"nTRN", &trn_body);

			let mut shp_body = Vec::new();
			shp_body.extend(shp_id.to_le_bytes());
			write_dict(&mut shp_body, &[]);
			shp_body.extend(1u32.to_le_bytes());
			shp_body.extend(model_index.to_le_bytes());
			write_dict(&mut shp_body, &[]);
			write_chunk(&mut main_body, b"nSHP", &shp_body);

			child_ids.push(trn_id);
		}

		let mut grp_body = Vec::new();
		grp_body.extend(group_id.to_le_bytes());
		write_dict(&mut grp_body, &[]);
		grp_body.extend((child_ids.len() as u32).to_le_bytes());
		for id in &child_ids {
			grp_body.extend(id.to_le_bytes());
		}
		write_chunk(&mut main_body, b"nGRP", &grp_body);

		let mut rgba_body = Vec::new();
		for i in 0..255usize {
			let color = reduced.get(i).unwrap_or(Color32::new(0, 0, 0, 0));
			rgba_body.push(color.r);
			rgba_body.push(color.g);
			rgba_body.push(color.b);
			rgba_body.push(color.a);
		}
		rgba_body.extend([0, 0, 0, 0]);
		write_chunk(&mut main_body, b"RGBA", &rgba_body);

		self.sink.write(VOX_MAGIC);
		self.sink.write_little_u32(150);
		self.sink.write(b"MAIN");
		self.sink.write_little_u32(0);
		self.sink.write_little_u32(main_body.len() as u32);
		self.sink.write(&main_body);
		let _ = self.sink.flush();
		ResultCode::WriteEnd
	}
}

fn write_chunk(out: &mut Vec<u8>, id: &[u8; 4], body: &[u8]) {
	out.extend(id);
	out.extend((body.len() as u32).to_le_bytes());
	out.extend(0u32.to_le_bytes());
	out.extend(body);
}

fn write_dict(out: &mut Vec<u8>, entries: &[(String, String)]) {
	out.extend((entries.len() as u32).to_le_bytes());
	for (k, v) in entries {
		out.extend((k.len() as u32).to_le_bytes());
		out.extend(k.as_bytes());
		out.extend((v.len() as u32).to_le_bytes());
		out.extend(v.as_bytes());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::ByteArrayStream;

	#[test]
	fn identity_rotation_decodes_to_identity_matrix() {
		// r0 -> col0 (+), r1 -> col1 (+), signs all positive: byte = 0b0000_0100 = 0x04
		let matrix = decode_rotation_byte(0b0000_0100).unwrap();
		assert_eq!(matrix, Transform::IDENTITY.matrix);
	}

	#[test]
	fn rejects_duplicate_row_columns() {
		assert!(decode_rotation_byte(0b0000_0000).is_err());
	}

	#[test]
	fn transform_concat_composes_translations() {
		let a = Transform {
			matrix: Transform::IDENTITY.matrix,
			t: [1, 0, 0],
		};
		let b = Transform {
			matrix: Transform::IDENTITY.matrix,
			t: [0, 2, 0],
		};
		let composed = a.concat(b);
		assert_eq!(composed.t, [1, 2, 0]);
	}

	fn minimal_vox_bytes(dim: [u32; 3], voxels: &[(u8, u8, u8, u8)]) -> Vec<u8> {
		let mut main_body = Vec::new();
		let mut size_body = Vec::new();
		size_body.extend(dim[0].to_le_bytes());
		size_body.extend(dim[1].to_le_bytes());
		size_body.extend(dim[2].to_le_bytes());
		write_chunk(&mut main_body, b"SIZE", &size_body);

		let mut xyzi_body = Vec::new();
		xyzi_body.extend((voxels.len() as u32).to_le_bytes());
		for &(x, y, z, i) in voxels {
			xyzi_body.extend([x, y, z, i]);
		}
		write_chunk(&mut main_body, b"XYZI", &xyzi_body);

		let mut rgba_body = vec![0u8; 256 * 4];
		rgba_body[0] = 10;
		rgba_body[1] = 20;
		rgba_body[2] = 30;
		rgba_body[3] = 255;
		write_chunk(&mut main_body, b"RGBA", &rgba_body);

		let mut trn_body = Vec::new();
		trn_body.extend(0u32.to_le_bytes());
		write_dict(&mut trn_body, &[]);
		trn_body.extend(1u32.to_le_bytes());
		trn_body.extend((-1i32).to_le_bytes());
		trn_body.extend(0u32.to_le_bytes());
		trn_body.extend(1u32.to_le_bytes());
		write_dict(&mut trn_body, &[]);
		write_chunk(&mut main_body, b"nTRN", &trn_body);

		let mut shp_body = Vec::new();
		shp_body.extend(1u32.to_le_bytes());
		write_dict(&mut shp_body, &[]);
		shp_body.extend(1u32.to_le_bytes());
		shp_body.extend(0u32.to_le_bytes());
		write_dict(&mut shp_body, &[]);
		write_chunk(&mut main_body, b"nSHP", &shp_body);

		let mut bytes = Vec::new();
		bytes.extend(VOX_MAGIC);
		bytes.extend(150u32.to_le_bytes());
		write_chunk(&mut bytes, b"MAIN", &main_body);
		bytes
	}

	#[test]
	fn reads_single_shape_through_scene_graph() {
		let data = minimal_vox_bytes([2, 2, 2], &[(0, 0, 0, 1)]);
		let mut reader = VoxReader::new(ByteArrayStream::from_bytes(data), false);
		assert_eq!(reader.init().code, ResultCode::OkInitialized);

		let mut buf = [Voxel32::default(); 4];
		let result = reader.read(&mut buf);
		assert!(result.voxels_read >= 1);
		assert_eq!(buf[0].argb, Color32::new(255, 10, 20, 30).to_argb32());
	}

	#[test]
	fn rejects_pack_chunk() {
		let mut main_body = Vec::new();
		write_chunk(&mut main_body, b"PACK", &[]);
		let mut bytes = Vec::new();
		bytes.extend(VOX_MAGIC);
		bytes.extend(150u32.to_le_bytes());
		write_chunk(&mut bytes, b"MAIN", &main_body);

		let mut reader = VoxReader::new(ByteArrayStream::from_bytes(bytes), false);
		let result = reader.init();
		assert_eq!(result.code, ResultCode::ReadErrorUnsupportedFeature);
	}

	#[test]
	fn shape_placed_under_two_parents_is_emitted_twice() {
		// Scene graph: nGRP(10) -> nTRN(0) -> nSHP(1), and a second nGRP(11) also pointing
		// straight at nSHP(1). Same shape, two placements, two distinct transforms.
		let mut nodes = HashMap::new();
		nodes.insert(
			0,
			VoxNode::Transform {
				child: 1,
				rotation: Transform::IDENTITY.matrix,
				translation: [5, 0, 0],
			},
		);
		nodes.insert(1, VoxNode::Shape { model_index: 0 });
		nodes.insert(10, VoxNode::Group { children: vec![0] });
		nodes.insert(11, VoxNode::Group { children: vec![1] });

		let mut parent_of: HashMap<u32, Vec<u32>> = HashMap::new();
		parent_of.entry(1).or_default().push(0);
		parent_of.entry(0).or_default().push(10);
		parent_of.entry(1).or_default().push(11);

		let scene = VoxScene {
			models: vec![RawModel {
				dim: [1, 1, 1],
				voxels: vec![(0, 0, 0, 1)],
			}],
			palette: default_palette(),
			nodes,
			parent_of,
		};

		let placements = scene.placements();
		assert_eq!(placements.len(), 2);
		let translations: Vec<[i32; 3]> = placements.iter().map(|&(_, _, t)| t.t).collect();
		assert!(translations.contains(&[5, 0, 0]));
		assert!(translations.contains(&[0, 0, 0]));
	}

	#[test]
	fn writer_roundtrips_tile_origin_through_reader() {
		let sink = ByteArrayStream::from_bytes(Vec::new());
		let mut writer = VoxWriter::new(sink);
		writer.palette_mut().push(Color32::new(255, 1, 2, 3));
		assert_eq!(writer.init(), ResultCode::OkInitialized);
		writer.write(&[Voxel32 {
			pos: [0, 0, 0],
			argb: Color32::new(255, 1, 2, 3).to_argb32(),
		}]);
		assert_eq!(writer.finalize(), ResultCode::WriteEnd);

		let mut reader = VoxReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()), false);
		assert_eq!(reader.init().code, ResultCode::OkInitialized);
		let mut buf = [Voxel32::default(); 4];
		let result = reader.read(&mut buf);
		assert_eq!(result.voxels_read, 1);
		assert_eq!(buf[0].pos, [0, 0, 0]);
		assert_eq!(buf[0].argb, Color32::new(255, 1, 2, 3).to_argb32());
	}
}
