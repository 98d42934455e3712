//! The Qubicle Binary (QB) format: a matrix table of big-endian color cubes, optionally
//! run-length compressed per Z-slice.
//!
//! Grounded on `dvine_types::file::item::mod.rs` (a "typed binary container with a header, a
//! table of per-entry records, and per-record variable bodies" file) for the matrix-table
//! shape, and on `efc`'s fixed-size index table convention for the header-table layout.

use crate::primitive::Color32;
use crate::result::{ReadResult, ResultCode, VoxelIoError};
use crate::stream::{InputStream, OutputStream};
use crate::voxel::{Voxel32, VoxelListWriter, VoxelReader};
use crate::palette::Palette;

const SUPPORTED_VERSION: u32 = 0x0101_0000;
const NEXT_SLICE_FLAG: u32 = 0x0000_0006;
const CODE_FLAG: u32 = 0x0000_0002;

/// `colorFormat` header field: channel order of the 32-bit color words on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
	/// Red, green, blue, alpha.
	Rgba,
	/// Blue, green, red, alpha.
	Bgra,
}

/// `zAxisOrientation` header field: traversal direction along Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZAxis {
	/// Slices traversed front-to-back.
	Left,
	/// Slices traversed back-to-front.
	Right,
}

/// The fixed-size QB file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QbHeader {
	/// Format version; must equal `0x01010000`.
	pub version: u32,
	/// Channel order of color words.
	pub color_format: ColorFormat,
	/// Z traversal direction.
	pub z_axis: ZAxis,
	/// Whether matrix bodies are RLE-token compressed.
	pub compressed: bool,
	/// Whether alpha is derived from a visibility mask rather than stored directly.
	pub visibility_mask_encoded: bool,
	/// Number of matrices in the file.
	pub num_matrices: u32,
}

/// A single matrix's header: name, size, and placement offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QbMatrixHeader {
	/// Matrix name.
	pub name: String,
	/// Matrix dimensions, `[x, y, z]`.
	pub size: [u32; 3],
	/// Placement offset in the overall model.
	pub pos: [i32; 3],
}

fn decode_color(word: u32, header: &QbHeader) -> Option<Color32> {
	let bytes = word.to_be_bytes();
	let channels = match header.color_format {
		ColorFormat::Rgba => [bytes[3], bytes[0], bytes[1], bytes[2]],
		ColorFormat::Bgra => [bytes[3], bytes[2], bytes[1], bytes[0]],
	};
	let mut color = Color32::from_channels(channels);
	if header.visibility_mask_encoded {
		if color.a == 0 {
			return None;
		}
		color.a = 0xFF;
	} else if color.a == 0 {
		return None;
	}
	Some(color)
}

enum ResumeState {
	None,
	Compressed {
		remaining: u32,
		color: Color32,
	},
}

/// A resumable reader over a QB stream.
pub struct QbReader<R> {
	source: R,
	header: Option<QbHeader>,
	matrices: Vec<QbMatrixHeader>,
	matrix_index: usize,
	x: u32,
	y: u32,
	slice: u32,
	resume: ResumeState,
	announced_object_end: bool,
}

impl<R: InputStream> QbReader<R> {
	/// Wraps `source` for reading.
	pub fn new(source: R) -> Self {
		Self {
			source,
			header: None,
			matrices: Vec::new(),
			matrix_index: 0,
			x: 0,
			y: 0,
			slice: 0,
			resume: ResumeState::None,
			announced_object_end: false,
		}
	}

	/// The matrix table, once parsing has started.
	pub fn matrices(&self) -> &[QbMatrixHeader] {
		&self.matrices
	}

	fn read_name(&mut self) -> Result<String, VoxelIoError> {
		let len = self.source.read_u8();
		let mut buf = vec![0u8; len as usize];
		self.source.read(&mut buf);
		Ok(String::from_utf8_lossy(&buf).into_owned())
	}

	fn read_matrix_header(&mut self) -> Result<QbMatrixHeader, VoxelIoError> {
		let name = self.read_name()?;
		let size = [
			self.source.read_little_u32(),
			self.source.read_little_u32(),
			self.source.read_little_u32(),
		];
		let pos = [
			self.source.read_little_i32(),
			self.source.read_little_i32(),
			self.source.read_little_i32(),
		];
		if self.source.is_eof() {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorUnexpectedEof,
				self.source.position(),
				"truncated matrix header",
			));
		}
		Ok(QbMatrixHeader {
			name,
			size,
			pos,
		})
	}
}

impl<R: InputStream> VoxelReader<Voxel32> for QbReader<R> {
	fn init(&mut self) -> ReadResult {
		if self.header.is_some() {
			return ReadResult::ok(ResultCode::WarningDoubleInit);
		}
		let version = self.source.read_big_u32();
		if version != SUPPORTED_VERSION {
			return VoxelIoError::read(
				ResultCode::ReadErrorUnknownVersion,
				self.source.position(),
				format!("unsupported QB version {version:#010x}"),
			)
			.into();
		}
		let color_format = match self.source.read_little_u32() {
			0 => ColorFormat::Rgba,
			1 => ColorFormat::Bgra,
			other => {
				return VoxelIoError::read(
					ResultCode::ReadErrorCorruptedEnum,
					self.source.position(),
					format!("invalid colorFormat {other}"),
				)
				.into();
			}
		};
		let z_axis = match self.source.read_little_u32() {
			0 => ZAxis::Left,
			1 => ZAxis::Right,
			other => {
				return VoxelIoError::read(
					ResultCode::ReadErrorCorruptedEnum,
					self.source.position(),
					format!("invalid zAxisOrientation {other}"),
				)
				.into();
			}
		};
		let compressed = match self.source.read_little_u32() {
			0 => false,
			1 => true,
			other => {
				return VoxelIoError::read(
					ResultCode::ReadErrorCorruptedBool,
					self.source.position(),
					format!("invalid compressed flag {other}"),
				)
				.into();
			}
		};
		let visibility_mask_encoded = match self.source.read_little_u32() {
			0 => false,
			1 => true,
			other => {
				return VoxelIoError::read(
					ResultCode::ReadErrorCorruptedBool,
					self.source.position(),
					format!("invalid visibilityMaskEncoded flag {other}"),
				)
				.into();
			}
		};
		let num_matrices = self.source.read_little_u32();

		self.header = Some(QbHeader {
			version,
			color_format,
			z_axis,
			compressed,
			visibility_mask_encoded,
			num_matrices,
		});

		if num_matrices == 0 {
			return ReadResult::ok(ResultCode::ReadEnd);
		}
		match self.read_matrix_header() {
			Ok(m) => self.matrices.push(m),
			Err(e) => return e.into(),
		}
		ReadResult::ok(ResultCode::OkInitialized)
	}

	fn read(&mut self, buf: &mut [Voxel32]) -> ReadResult {
		let Some(header) = self.header else {
			return self.init();
		};
		if self.matrix_index >= header.num_matrices as usize {
			return ReadResult::ok(ResultCode::ReadEnd);
		}

		let mut written = 0usize;

		while written < buf.len() {
			if self.matrix_index >= header.num_matrices as usize {
				return ReadResult::read(written as u64, ResultCode::ReadEnd);
			}
			let current_matrix = self.matrices[self.matrix_index].clone();
			let size = current_matrix.size;

			if self.slice >= size[2] {
				if !self.announced_object_end {
					self.announced_object_end = true;
					return ReadResult::read(written as u64, ResultCode::ReadObjectEnd);
				}
				self.announced_object_end = false;
				self.matrix_index += 1;
				self.x = 0;
				self.y = 0;
				self.slice = 0;
				self.resume = ResumeState::None;
				if self.matrix_index >= header.num_matrices as usize {
					return ReadResult::read(written as u64, ResultCode::ReadEnd);
				}
				match self.read_matrix_header() {
					Ok(m) => self.matrices.push(m),
					Err(e) => return e.into(),
				}
				continue;
			}

			if let ResumeState::Compressed {
				remaining,
				color,
			} = self.resume
			{
				let mut remaining = remaining;
				while remaining > 0 && written < buf.len() {
					self.emit_if_room(&mut written, buf, color, &header, size, &current_matrix);
					remaining -= 1;
				}
				if remaining > 0 {
					self.resume = ResumeState::Compressed {
						remaining,
						color,
					};
					return ReadResult::read(written as u64, ResultCode::ReadBufferFull);
				}
				self.resume = ResumeState::None;
				continue;
			}

			if header.compressed {
				let token = self.source.read_little_u32();
				if self.source.is_eof() {
					return VoxelIoError::read(
						ResultCode::ReadErrorUnexpectedEof,
						self.source.position(),
						"compressed body truncated",
					)
					.into();
				}
				match token {
					NEXT_SLICE_FLAG => {
						self.slice += 1;
						self.x = 0;
						self.y = 0;
						continue;
					}
					CODE_FLAG => {
						let count = self.source.read_little_u32();
						let color_word = self.source.read_big_u32();
						let Some(color) = decode_color(color_word, &header) else {
							for _ in 0..count {
								self.advance_cursor(size);
							}
							continue;
						};
						let mut remaining = count;
						while remaining > 0 && written < buf.len() {
							self.emit_if_room(&mut written, buf, color, &header, size, &current_matrix);
							remaining -= 1;
						}
						if remaining > 0 {
							self.resume = ResumeState::Compressed {
								remaining,
								color,
							};
							return ReadResult::read(written as u64, ResultCode::ReadBufferFull);
						}
					}
					word => {
						// `word` was read little-endian (it wasn't a flag), but `decode_color`
						// expects the byte order a big-endian read would have produced.
						let color = decode_color(word.swap_bytes(), &header);
						if self.x < size[0] && self.y < size[1] {
							if let Some(color) = color {
								let z = Self::oriented_z(header.z_axis, self.slice, size[2]);
								if written < buf.len() {
									buf[written] = Voxel32 {
										pos: [
											current_matrix.pos[0] + self.x as i32,
											current_matrix.pos[1] + self.y as i32,
											current_matrix.pos[2] + z as i32,
										],
										argb: color.to_argb32(),
									};
									written += 1;
								}
							}
							self.advance_cursor(size);
						}
					}
				}
			} else {
				let word = self.source.read_big_u32();
				if self.source.is_eof() {
					return VoxelIoError::read(
						ResultCode::ReadErrorUnexpectedEof,
						self.source.position(),
						"uncompressed body truncated",
					)
					.into();
				}
				if let Some(color) = decode_color(word, &header) {
					let z = Self::oriented_z(header.z_axis, self.slice, size[2]);
					buf[written] = Voxel32 {
						pos: [
							current_matrix.pos[0] + self.x as i32,
							current_matrix.pos[1] + self.y as i32,
							current_matrix.pos[2] + z as i32,
						],
						argb: color.to_argb32(),
					};
					written += 1;
				}
				self.advance_cursor(size);
			}
		}

		ReadResult::read(written as u64, ResultCode::ReadBufferFull)
	}

	fn progress(&self) -> f32 {
		let Some(header) = self.header else {
			return 0.0;
		};
		if header.num_matrices == 0 {
			return 1.0;
		}
		(self.matrix_index as f32 / header.num_matrices as f32).clamp(0.0, 1.0)
	}
}

impl<R: InputStream> QbReader<R> {
	fn oriented_z(z_axis: ZAxis, slice: u32, depth: u32) -> u32 {
		match z_axis {
			ZAxis::Left => slice,
			ZAxis::Right => depth.saturating_sub(1).saturating_sub(slice),
		}
	}

	fn advance_cursor(&mut self, size: [u32; 3]) {
		self.x += 1;
		if self.x >= size[0] {
			self.x = 0;
			self.y += 1;
			if self.y >= size[1] {
				self.y = 0;
				self.slice += 1;
			}
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn emit_if_room(
		&mut self,
		written: &mut usize,
		buf: &mut [Voxel32],
		color: Color32,
		header: &QbHeader,
		size: [u32; 3],
		matrix: &QbMatrixHeader,
	) {
		if self.x < size[0] && self.y < size[1] {
			let z = Self::oriented_z(header.z_axis, self.slice, size[2]);
			if *written < buf.len() {
				buf[*written] = Voxel32 {
					pos: [
						matrix.pos[0] + self.x as i32,
						matrix.pos[1] + self.y as i32,
						matrix.pos[2] + z as i32,
					],
					argb: color.to_argb32(),
				};
				*written += 1;
			}
		}
		self.advance_cursor(size);
	}
}

/// A single-matrix writer: header uses `RGBA`/`LEFT`/uncompressed/not-visibility-masked
/// defaults.
pub struct QbWriter<W> {
	sink: W,
	size: [u32; 3],
	pos: [i32; 3],
	name: String,
	grid: Vec<u32>,
	initialized: bool,
}

impl<W: OutputStream> QbWriter<W> {
	/// Creates a writer for a single matrix of `size` voxels at `pos`.
	pub fn new(sink: W, name: impl Into<String>, size: [u32; 3], pos: [i32; 3]) -> Self {
		let volume = size[0] as usize * size[1] as usize * size[2] as usize;
		Self {
			sink,
			size,
			pos,
			name: name.into(),
			grid: vec![0u32; volume],
			initialized: false,
		}
	}

	fn index(&self, x: u32, y: u32, z: u32) -> usize {
		(z as usize * self.size[1] as usize + y as usize) * self.size[0] as usize + x as usize
	}

	/// Consumes the writer, returning the underlying sink (e.g. to recover the written bytes
	/// from a [`crate::stream::ByteArrayStream`] after [`finalize`](VoxelListWriter::finalize)).
	pub fn into_sink(self) -> W {
		self.sink
	}
}

impl<W: OutputStream> VoxelListWriter<Voxel32> for QbWriter<W> {
	fn init(&mut self) -> ResultCode {
		if self.initialized {
			return ResultCode::WarningDoubleInit;
		}
		self.sink.write_big_u32(SUPPORTED_VERSION);
		self.sink.write_little_u32(0); // RGBA
		self.sink.write_little_u32(0); // LEFT
		self.sink.write_little_u32(0); // uncompressed
		self.sink.write_little_u32(0); // not visibility-masked
		self.sink.write_little_u32(1); // numMatrices
		self.sink.write(&[self.name.len() as u8]);
		self.sink.write(self.name.as_bytes());
		self.sink.write_little_u32(self.size[0]);
		self.sink.write_little_u32(self.size[1]);
		self.sink.write_little_u32(self.size[2]);
		self.sink.write_little_u32(self.pos[0] as u32);
		self.sink.write_little_u32(self.pos[1] as u32);
		self.sink.write_little_u32(self.pos[2] as u32);
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
		for v in buf {
			let lx = v.pos[0] - self.pos[0];
			let ly = v.pos[1] - self.pos[1];
			let lz = v.pos[2] - self.pos[2];
			if lx < 0 || ly < 0 || lz < 0 {
				continue;
			}
			let (x, y, z) = (lx as u32, ly as u32, lz as u32);
			if x >= self.size[0] || y >= self.size[1] || z >= self.size[2] {
				continue;
			}
			let i = self.index(x, y, z);
			self.grid[i] = v.argb;
		}
		ResultCode::WriteOk
	}

	fn palette_mut(&mut self) -> &mut Palette {
		unimplemented!("QB's default single-matrix writer stores colors inline, not via a palette")
	}

	fn set_canvas_dimensions(&mut self, dims: [u32; 3]) -> bool {
		if self.initialized {
			return false;
		}
		let volume = dims[0] as usize * dims[1] as usize * dims[2] as usize;
		self.size = dims;
		self.grid = vec![0u32; volume];
		true
	}

	fn finalize(&mut self) -> ResultCode {
		for z in 0..self.size[2] {
			for y in 0..self.size[1] {
				for x in 0..self.size[0] {
					let argb = self.grid[self.index(x, y, z)];
					self.sink.write_big_u32(argb);
				}
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

	fn build_uncompressed_single_voxel() -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend(SUPPORTED_VERSION.to_be_bytes());
		bytes.extend(0u32.to_le_bytes()); // RGBA
		bytes.extend(0u32.to_le_bytes()); // LEFT
		bytes.extend(0u32.to_le_bytes()); // uncompressed
		bytes.extend(0u32.to_le_bytes()); // not visibility-masked
		bytes.extend(1u32.to_le_bytes()); // numMatrices
		bytes.push(4); // nameLength
		bytes.extend(b"test");
		bytes.extend(1u32.to_le_bytes()); // size x
		bytes.extend(1u32.to_le_bytes()); // size y
		bytes.extend(1u32.to_le_bytes()); // size z
		bytes.extend(0i32.to_le_bytes()); // pos
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0i32.to_le_bytes());
		bytes.extend(0xFF11_2233u32.to_be_bytes()); // single voxel color word
		bytes
	}

	#[test]
	fn reads_single_uncompressed_voxel() {
		let data = build_uncompressed_single_voxel();
		let mut reader = QbReader::new(ByteArrayStream::from_bytes(data));
		let init = reader.init();
		assert_eq!(init.code, ResultCode::OkInitialized);

		let mut buf = [Voxel32::default(); 4];
		let result = reader.read(&mut buf);
		assert!(result.voxels_read >= 1);
		assert_eq!(buf[0].pos, [0, 0, 0]);
	}

	#[test]
	fn rejects_bad_version() {
		let mut reader = QbReader::new(ByteArrayStream::from_bytes(vec![0; 4]));
		let result = reader.init();
		assert_eq!(result.code, ResultCode::ReadErrorUnknownVersion);
	}

	#[test]
	fn writer_emits_readable_stream() {
		let sink = ByteArrayStream::from_bytes(Vec::new());
		let mut writer = QbWriter::new(sink, "m", [1, 1, 1], [0, 0, 0]);
		writer.init();
		writer.write(&[Voxel32 {
			pos: [0, 0, 0],
			argb: Color32::new(255, 10, 20, 30).to_argb32(),
		}]);
		writer.finalize();
		let bytes = writer.into_sink().into_bytes();

		let mut reader = QbReader::new(ByteArrayStream::from_bytes(bytes));
		reader.init();
		let mut buf = [Voxel32::default(); 4];
		let result = reader.read(&mut buf);
		assert_eq!(result.voxels_read, 1);
		assert_eq!(buf[0].argb, Color32::new(255, 10, 20, 30).to_argb32());
	}
}
