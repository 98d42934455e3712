//! VOBJ: an extensible container combining a palette, an optional group hierarchy (encoded as
//! a flat pop/push stack rather than a nested tree), and sparse or dense voxel arrays.
//!
//! Grounded on `dvine_types::file::item::mod.rs`'s "typed binary container, header then table
//! of variable-length records" shape (shared with [`crate::format::qb`]), generalized here to a
//! recursive record shape with an explicit ancestor stack instead of a flat matrix table, since
//! VOBJ's groups nest structurally but are serialized as a pop-count-prefixed sequence.

use std::collections::HashSet;

use crate::palette::Palette;
use crate::primitive::Color32;
use crate::result::{ReadResult, ResultCode, VoxelIoError};
use crate::stream::{InputStream, OutputStream};
use crate::voxel::{Voxel64, VoxelListWriter, VoxelReader};

const MAGIC: &[u8] = b"model/x-vobj";

/// `colorFormat` header byte: low six bits give the bit width of one color/index on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
	/// 24-bit RGB, no alpha (assumed opaque).
	Rgb24,
	/// 32-bit ARGB.
	Argb32,
	/// 8-bit grayscale.
	V8,
	/// 16-bit alpha + grayscale.
	Av16,
}

impl ColorFormat {
	fn from_byte(b: u8) -> Result<Self, VoxelIoError> {
		match b {
			0x18 => Ok(ColorFormat::Rgb24),
			0x20 => Ok(ColorFormat::Argb32),
			0x48 => Ok(ColorFormat::V8),
			0x50 => Ok(ColorFormat::Av16),
			other => Err(VoxelIoError::read(
				ResultCode::ReadErrorCorruptedEnum,
				0,
				format!("unrecognized colorFormat byte 0x{other:02X}"),
			)),
		}
	}

	fn to_byte(self) -> u8 {
		match self {
			ColorFormat::Rgb24 => 0x18,
			ColorFormat::Argb32 => 0x20,
			ColorFormat::V8 => 0x48,
			ColorFormat::Av16 => 0x50,
		}
	}

	fn byte_width(self) -> usize {
		match self {
			ColorFormat::Rgb24 => 3,
			ColorFormat::Argb32 => 4,
			ColorFormat::V8 => 1,
			ColorFormat::Av16 => 2,
		}
	}

	fn decode(self, bytes: &[u8]) -> Color32 {
		match self {
			ColorFormat::Rgb24 => Color32::new(0xFF, bytes[0], bytes[1], bytes[2]),
			ColorFormat::Argb32 => Color32::new(bytes[0], bytes[1], bytes[2], bytes[3]),
			ColorFormat::V8 => Color32::new(0xFF, bytes[0], bytes[0], bytes[0]),
			ColorFormat::Av16 => Color32::new(bytes[0], bytes[1], bytes[1], bytes[1]),
		}
	}

	fn encode(self, color: Color32) -> Vec<u8> {
		match self {
			ColorFormat::Rgb24 => vec![color.r, color.g, color.b],
			ColorFormat::Argb32 => vec![color.a, color.r, color.g, color.b],
			ColorFormat::V8 => vec![color.r],
			ColorFormat::Av16 => vec![color.a, color.r],
		}
	}
}

/// Index width for a `bits`-keyed palette, or `0` for inline colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexWidth {
	Inline,
	Bits8,
	Bits16,
	Bits32,
}

impl IndexWidth {
	fn from_bits(bits: u8) -> Result<Self, VoxelIoError> {
		match bits {
			0 => Ok(IndexWidth::Inline),
			8 => Ok(IndexWidth::Bits8),
			16 => Ok(IndexWidth::Bits16),
			32 => Ok(IndexWidth::Bits32),
			other => Err(VoxelIoError::read(
				ResultCode::ReadErrorCorruptedEnum,
				0,
				format!("palette bits must be 0/8/16/32, got {other}"),
			)),
		}
	}

	fn bits(self) -> u32 {
		match self {
			IndexWidth::Inline => 0,
			IndexWidth::Bits8 => 8,
			IndexWidth::Bits16 => 16,
			IndexWidth::Bits32 => 32,
		}
	}
}

/// Dimension field width, selected by the mutually-exclusive `arr16`/`arr32` extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayWidth {
	U8,
	U16,
	U32,
}

impl ArrayWidth {
	fn bits(self) -> u32 {
		match self {
			ArrayWidth::U8 => 8,
			ArrayWidth::U16 => 16,
			ArrayWidth::U32 => 32,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Extensions {
	group: bool,
	ex_arr: bool,
	array_width: Option<ArrayWidth>,
}

struct VobjPalette {
	width: IndexWidth,
	colors: Vec<Color32>,
}

impl VobjPalette {
	fn color_for(&self, index: u32) -> Result<Color32, VoxelIoError> {
		self.colors.get(index as usize).copied().ok_or_else(|| {
			VoxelIoError::read(
				ResultCode::ReadErrorValueOutOfBounds,
				0,
				format!("palette index {index} out of range (size {})", self.colors.len()),
			)
		})
	}
}

/// Forward-only byte cursor over an in-memory copy of the whole stream, used the same way
/// [`crate::format::vox`] uses its chunk cursor: VOBJ's group-stack bookkeeping is a single
/// forward pass, so buffering the stream once up front is simpler than threading resumable
/// state through every recursive data-format branch.
struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	fn take(&mut self, n: usize) -> Result<&'a [u8], VoxelIoError> {
		if self.bytes.len() - self.pos < n {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorUnexpectedEof,
				self.pos as u64,
				"VOBJ stream truncated",
			));
		}
		let slice = &self.bytes[self.pos..self.pos + n];
		self.pos += n;
		Ok(slice)
	}

	fn u8(&mut self) -> Result<u8, VoxelIoError> {
		Ok(self.take(1)?[0])
	}

	fn u16le(&mut self) -> Result<u16, VoxelIoError> {
		Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
	}

	fn u32le(&mut self) -> Result<u32, VoxelIoError> {
		Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
	}

	fn i32le(&mut self) -> Result<i32, VoxelIoError> {
		Ok(self.u32le()? as i32)
	}

	fn i64le(&mut self) -> Result<i64, VoxelIoError> {
		Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()) as i64)
	}

	fn string(&mut self) -> Result<String, VoxelIoError> {
		let len = self.u32le()? as usize;
		Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
	}

	/// Reads one dimension-width field, `0` mapping to `2^width` per spec.
	fn dim(&mut self, width: ArrayWidth) -> Result<u64, VoxelIoError> {
		let raw: u64 = match width {
			ArrayWidth::U8 => self.u8()? as u64,
			ArrayWidth::U16 => self.u16le()? as u64,
			ArrayWidth::U32 => self.u32le()? as u64,
		};
		Ok(if raw == 0 { 1u64 << width.bits() } else { raw })
	}

	fn color_or_index(&mut self, format: ColorFormat, palette: &VobjPalette) -> Result<Color32, VoxelIoError> {
		match palette.width {
			IndexWidth::Inline => Ok(format.decode(self.take(format.byte_width())?)),
			IndexWidth::Bits8 => palette.color_for(self.u8()? as u32),
			IndexWidth::Bits16 => palette.color_for(self.u16le()? as u32),
			IndexWidth::Bits32 => palette.color_for(self.u32le()?),
		}
	}
}

struct VobjRecord {
	pos: [i64; 3],
	argb: u32,
}

fn parse_extensions(cursor: &mut Cursor) -> Result<Extensions, VoxelIoError> {
	let count = cursor.u32le()?;
	let mut ext = Extensions::default();
	let mut saw_arr16 = false;
	let mut saw_arr32 = false;
	for _ in 0..count {
		match cursor.string()?.as_str() {
			"debug" => {} // informational only; no decode-time effect
			"group" => ext.group = true,
			"exArr" => ext.ex_arr = true,
			"arr16" => {
				saw_arr16 = true;
				ext.array_width = Some(ArrayWidth::U16);
			}
			"arr32" => {
				saw_arr32 = true;
				ext.array_width = Some(ArrayWidth::U32);
			}
			_ => {} // forward-compatible: unrecognized extensions are ignored
		}
	}
	if saw_arr16 && saw_arr32 {
		return Err(VoxelIoError::read(
			ResultCode::ReadErrorInvalidConstant,
			0,
			"`arr16` and `arr32` extensions are mutually exclusive",
		));
	}
	Ok(ext)
}

fn parse_palette(cursor: &mut Cursor, color_format: ColorFormat) -> Result<VobjPalette, VoxelIoError> {
	let bits = cursor.u8()?;
	let width = IndexWidth::from_bits(bits)?;
	let size = cursor.u32le()?;
	if width == IndexWidth::Inline {
		return Ok(VobjPalette {
			width,
			colors: Vec::new(),
		});
	}
	let actual_size = if size == 0 { 1usize << width.bits() } else { size as usize };
	let mut colors = Vec::with_capacity(actual_size);
	for _ in 0..actual_size {
		colors.push(color_format.decode(cursor.take(color_format.byte_width())?));
	}
	Ok(VobjPalette {
		width,
		colors,
	})
}

fn parse_list(cursor: &mut Cursor, format: ColorFormat, palette: &VobjPalette, offset: [i64; 3], out: &mut Vec<VobjRecord>) -> Result<(), VoxelIoError> {
	let count = cursor.u32le()?;
	for _ in 0..count {
		let x = cursor.i32le()? as i64 + offset[0];
		let y = cursor.i32le()? as i64 + offset[1];
		let z = cursor.i32le()? as i64 + offset[2];
		let color = cursor.color_or_index(format, palette)?;
		out.push(VobjRecord {
			pos: [x, y, z],
			argb: color.to_argb32(),
		});
	}
	Ok(())
}

fn parse_array(
	cursor: &mut Cursor,
	format: ColorFormat,
	palette: &VobjPalette,
	offset: [i64; 3],
	dim_width: ArrayWidth,
	ex_arr: bool,
	tiled: bool,
	out: &mut Vec<VobjRecord>,
) -> Result<(), VoxelIoError> {
	let array_count = cursor.u32le()?;
	for _ in 0..array_count {
		let pos = [cursor.i64le()?, cursor.i64le()?, cursor.i64le()?];
		let dims = [cursor.dim(dim_width)?, cursor.dim(dim_width)?, cursor.dim(dim_width)?];
		let origin = if tiled {
			[pos[0] * dims[0] as i64, pos[1] * dims[1] as i64, pos[2] * dims[2] as i64]
		} else {
			pos
		};
		let volume = dims[0] * dims[1] * dims[2];

		let present: Vec<bool> = if ex_arr {
			let bitmap_len = (volume as usize).div_ceil(8);
			let bitmap = cursor.take(bitmap_len)?;
			let mut flags = Vec::with_capacity(volume as usize);
			for i in 0..volume as usize {
				flags.push((bitmap[i / 8] >> (i % 8)) & 1 == 1);
			}
			let _present_count = cursor.u32le()?;
			flags
		} else {
			vec![true; volume as usize]
		};

		let mut index = 0usize;
		for z in 0..dims[2] {
			for y in 0..dims[1] {
				for x in 0..dims[0] {
					if present[index] {
						let color = cursor.color_or_index(format, palette)?;
						out.push(VobjRecord {
							pos: [
								origin[0] + offset[0] + x as i64,
								origin[1] + offset[1] + y as i64,
								origin[2] + offset[2] + z as i64,
							],
							argb: color.to_argb32(),
						});
					}
					index += 1;
				}
			}
		}
	}
	Ok(())
}

fn parse_data_format(
	cursor: &mut Cursor,
	format: ColorFormat,
	palette: &VobjPalette,
	ext: &Extensions,
	offset: [i64; 3],
	out: &mut Vec<VobjRecord>,
) -> Result<(), VoxelIoError> {
	let tag = cursor.u8()?;
	let dim_width = ext.array_width.unwrap_or(ArrayWidth::U8);
	match tag {
		0x10 => Ok(()), // EMPTY
		0x20 => parse_list(cursor, format, palette, offset, out),
		0x30 => parse_array(cursor, format, palette, offset, dim_width, ext.ex_arr, false, out),
		0x31 => parse_array(cursor, format, palette, offset, dim_width, ext.ex_arr, true, out),
		other => Err(VoxelIoError::read(
			ResultCode::ReadErrorCorruptedEnum,
			cursor.pos as u64,
			format!("unrecognized dataFormat tag 0x{other:02X}"),
		)),
	}
}

/// A single frame of the group ancestor stack: a running translation offset and the set of
/// sibling names already claimed under this frame, enforcing per-level name uniqueness.
struct GroupFrame {
	offset: [i64; 3],
	child_names: HashSet<String>,
}

fn parse_groups(
	cursor: &mut Cursor,
	format: ColorFormat,
	palette: &VobjPalette,
	ext: &Extensions,
	out: &mut Vec<VobjRecord>,
) -> Result<(), VoxelIoError> {
	let group_count = cursor.u32le()?;
	let mut stack: Vec<GroupFrame> = vec![GroupFrame {
		offset: [0, 0, 0],
		child_names: HashSet::new(),
	}];

	for _ in 0..group_count {
		let pop_count = cursor.u16le()? as usize;
		if pop_count > stack.len() - 1 {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorIllegalDataLength,
				cursor.pos as u64,
				"group popCount exceeds the current stack depth",
			));
		}
		stack.truncate(stack.len() - pop_count);

		let name = cursor.string()?;
		let pos = [cursor.i32le()? as i64, cursor.i32le()? as i64, cursor.i32le()? as i64];

		let parent = stack.last_mut().expect("root frame is never popped");
		if !parent.child_names.insert(name) {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorDuplicateData,
				cursor.pos as u64,
				"sibling group names must be unique",
			));
		}
		let parent_offset = parent.offset;
		let offset = [parent_offset[0] + pos[0], parent_offset[1] + pos[1], parent_offset[2] + pos[2]];

		parse_data_format(cursor, format, palette, ext, offset, out)?;

		stack.push(GroupFrame {
			offset,
			child_names: HashSet::new(),
		});
	}
	Ok(())
}

struct VobjScene {
	records: Vec<VobjRecord>,
}

fn parse_scene(data: &[u8]) -> Result<VobjScene, VoxelIoError> {
	let mut cursor = Cursor {
		bytes: data,
		pos: 0,
	};
	let magic = cursor.take(MAGIC.len())?;
	if magic != MAGIC {
		return Err(VoxelIoError::read(ResultCode::ReadErrorUnexpectedMagic, 0, "missing VOBJ magic"));
	}
	let _url = cursor.string()?;
	let extensions = parse_extensions(&mut cursor)?;
	let color_format = ColorFormat::from_byte(cursor.u8()?)?;
	let palette = parse_palette(&mut cursor, color_format)?;
	let metadata_len = cursor.u32le()? as usize;
	cursor.take(metadata_len)?;

	let mut records = Vec::new();
	if extensions.group {
		parse_groups(&mut cursor, color_format, &palette, &extensions, &mut records)?;
	} else {
		parse_data_format(&mut cursor, color_format, &palette, &extensions, [0, 0, 0], &mut records)?;
	}

	Ok(VobjScene {
		records,
	})
}

/// Reads an entire VOBJ stream's group hierarchy and voxel data up front (per [`parse_scene`]),
/// then streams the flattened voxel list out resumably.
pub struct VobjReader<R> {
	source: R,
	scene: Option<VobjScene>,
	cursor: usize,
}

impl<R: InputStream> VobjReader<R> {
	/// Wraps `source`.
	pub fn new(source: R) -> Self {
		Self {
			source,
			scene: None,
			cursor: 0,
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

impl<R: InputStream> VoxelReader<Voxel64> for VobjReader<R> {
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

	fn read(&mut self, buf: &mut [Voxel64]) -> ReadResult {
		if self.scene.is_none() {
			return self.init();
		}
		let scene = self.scene.as_ref().expect("checked above");
		let mut written = 0;
		while written < buf.len() && self.cursor < scene.records.len() {
			let record = &scene.records[self.cursor];
			buf[written] = Voxel64 {
				pos: record.pos,
				argb: record.argb,
			};
			written += 1;
			self.cursor += 1;
		}
		let code = if self.cursor >= scene.records.len() {
			ResultCode::ReadEnd
		} else {
			ResultCode::ReadBufferFull
		};
		ReadResult::read(written as u64, code)
	}

	fn progress(&self) -> f32 {
		let Some(scene) = &self.scene else {
			return 0.0;
		};
		if scene.records.is_empty() {
			return 1.0;
		}
		(self.cursor as f32 / scene.records.len() as f32).clamp(0.0, 1.0)
	}
}

/// Writes a single flat `LIST` body with no group hierarchy and no array tiling; the simplest
/// legal VOBJ stream a reader built against the full recursive grammar still accepts.
pub struct VobjWriter<W> {
	sink: W,
	color_format: ColorFormat,
	palette: Palette,
	buffered: Vec<Voxel64>,
	initialized: bool,
}

impl<W: OutputStream> VobjWriter<W> {
	/// Creates a writer emitting inline `ARGB32` colors with no palette.
	pub fn new(sink: W) -> Self {
		Self {
			sink,
			color_format: ColorFormat::Argb32,
			palette: Palette::new(),
			buffered: Vec::new(),
			initialized: false,
		}
	}

	/// Consumes the writer, returning the underlying sink (e.g. to recover the written bytes
	/// from a [`crate::stream::ByteArrayStream`] after [`finalize`](VoxelListWriter::finalize)).
	pub fn into_sink(self) -> W {
		self.sink
	}
}

impl<W: OutputStream> VoxelListWriter<Voxel64> for VobjWriter<W> {
	fn init(&mut self) -> ResultCode {
		if self.initialized {
			return ResultCode::WarningDoubleInit;
		}
		self.initialized = true;
		ResultCode::OkInitialized
	}

	fn write(&mut self, buf: &[Voxel64]) -> ResultCode {
		if !self.initialized {
			let code = self.init();
			if code.is_error() {
				return code;
			}
		}
		self.buffered.extend_from_slice(buf);
		ResultCode::WriteOk
	}

	fn palette_mut(&mut self) -> &mut Palette {
		&mut self.palette
	}

	fn set_canvas_dimensions(&mut self, _dims: [u32; 3]) -> bool {
		// VOBJ's LIST body carries no declared canvas; positions are stored per-voxel.
		false
	}

	fn finalize(&mut self) -> ResultCode {
		self.sink.write(MAGIC);
		self.sink.write_little_u32(0); // empty url

		self.sink.write_little_u32(0); // no extensions

		self.sink.write(&[self.color_format.to_byte()]);

		let use_palette = !self.palette.is_empty();
		let bits: u8 = if !use_palette {
			0
		} else if self.palette.len() <= 256 {
			8
		} else if self.palette.len() <= 65536 {
			16
		} else {
			32
		};
		self.sink.write(&[bits]);
		self.sink.write_little_u32(if use_palette { self.palette.len() as u32 } else { 0 });
		if use_palette {
			for color in self.palette.iter() {
				self.sink.write(&self.color_format.encode(color));
			}
		}

		self.sink.write_little_u32(0); // empty metadata blob

		self.sink.write(&[0x20]); // dataFormat::LIST
		self.sink.write_little_u32(self.buffered.len() as u32);
		for v in &self.buffered {
			let (Ok(x), Ok(y), Ok(z)) = (i32::try_from(v.pos[0]), i32::try_from(v.pos[1]), i32::try_from(v.pos[2])) else {
				return ResultCode::WriteErrorOutOfBounds;
			};
			self.sink.write_little_u32(x as u32);
			self.sink.write_little_u32(y as u32);
			self.sink.write_little_u32(z as u32);
			if use_palette {
				let index = self.palette.nearest(Color32::from_argb32(v.argb)).unwrap_or(0);
				match bits {
					8 => {
						self.sink.write(&[index as u8]);
					}
					16 => {
						self.sink.write_little_u16(index as u16);
					}
					_ => {
						self.sink.write_little_u32(index as u32);
					}
				}
			} else {
				self.sink.write(&self.color_format.encode(Color32::from_argb32(v.argb)));
			}
		}

		let _ = self.sink.flush();
		ResultCode::WriteEnd
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stream::ByteArrayStream;

	fn write_string(out: &mut Vec<u8>, s: &str) {
		out.extend((s.len() as u32).to_le_bytes());
		out.extend(s.as_bytes());
	}

	fn minimal_vobj_bytes(points: &[([i32; 3], Color32)]) -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend(MAGIC);
		write_string(&mut bytes, "");
		bytes.extend(0u32.to_le_bytes()); // no extensions
		bytes.push(0x20); // ARGB32
		bytes.push(0); // palette bits = inline
		bytes.extend(0u32.to_le_bytes()); // palette size unused
		bytes.extend(0u32.to_le_bytes()); // metadata blob empty
		bytes.push(0x20); // LIST
		bytes.extend((points.len() as u32).to_le_bytes());
		for (pos, color) in points {
			bytes.extend(pos[0].to_le_bytes());
			bytes.extend(pos[1].to_le_bytes());
			bytes.extend(pos[2].to_le_bytes());
			bytes.push(color.a);
			bytes.push(color.r);
			bytes.push(color.g);
			bytes.push(color.b);
		}
		bytes
	}

	#[test]
	fn reads_flat_list_with_inline_colors() {
		let data = minimal_vobj_bytes(&[([1, 2, 3], Color32::new(255, 10, 20, 30))]);
		let mut reader = VobjReader::new(ByteArrayStream::from_bytes(data));
		assert_eq!(reader.init().code, ResultCode::OkInitialized);

		let mut buf = [Voxel64::default(); 4];
		let result = reader.read(&mut buf);
		assert_eq!(result.voxels_read, 1);
		assert_eq!(result.code, ResultCode::ReadEnd);
		assert_eq!(buf[0].pos, [1, 2, 3]);
		assert_eq!(buf[0].argb, Color32::new(255, 10, 20, 30).to_argb32());
	}

	#[test]
	fn rejects_bad_magic() {
		let mut reader = VobjReader::new(ByteArrayStream::from_bytes(b"not-vobj-at-all".to_vec()));
		assert_eq!(reader.init().code, ResultCode::ReadErrorUnexpectedMagic);
	}

	#[test]
	fn color_format_byte_roundtrips() {
		for format in [ColorFormat::Rgb24, ColorFormat::Argb32, ColorFormat::V8, ColorFormat::Av16] {
			assert_eq!(ColorFormat::from_byte(format.to_byte()).unwrap(), format);
		}
	}

	#[test]
	fn writer_emits_a_stream_the_reader_accepts() {
		let sink = ByteArrayStream::from_bytes(Vec::new());
		let mut writer = VobjWriter::new(sink);
		assert_eq!(writer.init(), ResultCode::OkInitialized);
		writer.write(&[Voxel64 {
			pos: [5, -5, 0],
			argb: Color32::new(255, 1, 2, 3).to_argb32(),
		}]);
		assert_eq!(writer.finalize(), ResultCode::WriteEnd);

		let mut reader = VobjReader::new(ByteArrayStream::from_bytes(writer.into_sink().into_bytes()));
		assert_eq!(reader.init().code, ResultCode::OkInitialized);
		let mut buf = [Voxel64::default(); 2];
		let result = reader.read(&mut buf);
		assert_eq!(result.voxels_read, 1);
		assert_eq!(buf[0].pos, [5, -5, 0]);
	}

	#[test]
	fn group_stack_rejects_duplicate_sibling_names() {
		let mut bytes = Vec::new();
		bytes.extend(MAGIC);
		write_string(&mut bytes, "");
		bytes.extend(1u32.to_le_bytes());
		write_string(&mut bytes, "group");
		bytes.push(0x20); // ARGB32
		bytes.push(0);
		bytes.extend(0u32.to_le_bytes());
		bytes.extend(0u32.to_le_bytes());

		bytes.extend(2u32.to_le_bytes()); // group_count
		// first group "a", popCount 0, EMPTY data
		bytes.extend(0u16.to_le_bytes());
		write_string(&mut bytes, "a");
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0i32.to_le_bytes());
		bytes.push(0x10); // EMPTY
		// second group "a" again at the same depth (pop the first, same parent)
		bytes.extend(1u16.to_le_bytes());
		write_string(&mut bytes, "a");
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0i32.to_le_bytes());
		bytes.push(0x10);

		let mut reader = VobjReader::new(ByteArrayStream::from_bytes(bytes));
		assert_eq!(reader.init().code, ResultCode::ReadErrorDuplicateData);
	}
}
