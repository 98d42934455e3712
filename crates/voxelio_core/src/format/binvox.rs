//! The binvox format: a text header followed by a run-length-encoded occupancy grid.
//!
//! Grounded on `dvine_types::file::kg`'s "small text/binary header then opcode-driven body"
//! shape and on `anm::parse_config`'s line-oriented keyword-header parsing idiom (`anm` parses
//! per-frame text config lines the same shape as binvox's `dim`/`translate`/`scale` lines).

use crate::result::{ReadResult, ResultCode, VoxelIoError};
use crate::stream::{BufferedInputStream, InputStream, OutputStream};
use crate::voxel::{Voxel32, VoxelListWriter, VoxelReader};
use crate::palette::Palette;

const MAGIC: &str = "#binvox";
const SUPPORTED_VERSION: u32 = 1;
const FILLED_ARGB: u32 = 0xFFFF_FFFF;

/// Parsed `dim`/`translate`/`scale` header fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinvoxHeader {
	/// Grid dimensions, `[x, y, z]`.
	pub dim: [u32; 3],
	/// Translation offset applied to the grid origin.
	pub translate: [f32; 3],
	/// Uniform scale factor.
	pub scale: f32,
}

impl Default for BinvoxHeader {
	fn default() -> Self {
		Self {
			dim: [0, 0, 0],
			translate: [0.0, 0.0, 0.0],
			scale: 1.0,
		}
	}
}

/// Maps a linear cursor `i` into `(x, y, z)` grid coordinates, per binvox's fixed
/// linearization (`x` is the slowest-varying axis, `y` the fastest).
pub fn linearize(i: u64, dim: [u32; 3]) -> (u32, u32, u32) {
	let (dy, dz) = (dim[1] as u64, dim[2] as u64);
	let x = i / (dy * dz);
	let y = i % dy;
	let z = (i / dy) % dz;
	(x as u32, y as u32, z as u32)
}

/// A resumable reader over a binvox stream.
pub struct BinvoxReader<R> {
	source: BufferedInputStream<R>,
	header: Option<BinvoxHeader>,
	cursor: u64,
	volume: u64,
	resume_count: u16,
	resume_value: u8,
}

impl<R: InputStream> BinvoxReader<R> {
	/// Wraps `source` for reading; call [`init`](VoxelReader::init) before the first
	/// [`read`](VoxelReader::read).
	pub fn new(source: R) -> Self {
		Self {
			source: BufferedInputStream::new(source),
			header: None,
			cursor: 0,
			volume: 0,
			resume_count: 0,
			resume_value: 0,
		}
	}

	/// The parsed header, once [`init`](VoxelReader::init) has succeeded.
	pub fn header(&self) -> Option<&BinvoxHeader> {
		self.header.as_ref()
	}

	fn read_line(&mut self) -> String {
		let mut line = String::new();
		self.source.read_line(&mut line);
		line
	}

	fn parse_header(&mut self) -> Result<BinvoxHeader, VoxelIoError> {
		let magic_line = self.read_line();
		let mut parts = magic_line.split_whitespace();
		let magic = parts.next().unwrap_or_default();
		if magic != MAGIC {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorUnexpectedMagic,
				self.source.position(),
				format!("expected magic `{MAGIC}`, found `{magic}`"),
			));
		}
		let version: u32 = parts
			.next()
			.and_then(|s| s.parse().ok())
			.ok_or_else(|| {
				VoxelIoError::read(
					ResultCode::ReadErrorParseFail,
					self.source.position(),
					"missing or non-numeric version",
				)
			})?;
		if version != SUPPORTED_VERSION {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorUnknownVersion,
				self.source.position(),
				format!("unsupported binvox version {version}"),
			));
		}

		let mut header = BinvoxHeader::default();
		let mut have_dim = false;
		loop {
			let line = self.read_line();
			if self.source.is_eof() && line.is_empty() {
				return Err(VoxelIoError::read(
					ResultCode::ReadErrorUnexpectedEof,
					self.source.position(),
					"stream ended before `data` terminator",
				));
			}
			let mut fields = line.split_whitespace();
			let keyword = fields.next().unwrap_or_default();
			match keyword {
				"data" => break,
				"dim" => {
					let dim = parse_three(&mut fields, self.source.position())?;
					header.dim = dim;
					have_dim = true;
				}
				"translate" => {
					header.translate = parse_three_f32(&mut fields, self.source.position())?;
				}
				"scale" => {
					header.scale = fields
						.next()
						.and_then(|s| s.parse().ok())
						.ok_or_else(|| {
							VoxelIoError::read(
								ResultCode::ReadErrorParseFail,
								self.source.position(),
								"invalid `scale` value",
							)
						})?;
				}
				"" => continue,
				other => {
					return Err(VoxelIoError::read(
						ResultCode::ReadErrorUnexpectedSymbol,
						self.source.position(),
						format!("unexpected header keyword `{other}`"),
					));
				}
			}
		}

		if !have_dim {
			return Err(VoxelIoError::read(
				ResultCode::ReadErrorMissingData,
				self.source.position(),
				"missing required `dim` field",
			));
		}
		Ok(header)
	}
}

fn parse_three(
	fields: &mut std::str::SplitWhitespace,
	location: u64,
) -> Result<[u32; 3], VoxelIoError> {
	let mut out = [0u32; 3];
	for slot in &mut out {
		*slot = fields.next().and_then(|s| s.parse().ok()).ok_or_else(|| {
			VoxelIoError::read(ResultCode::ReadErrorParseFail, location, "expected 3 integers")
		})?;
	}
	Ok(out)
}

fn parse_three_f32(
	fields: &mut std::str::SplitWhitespace,
	location: u64,
) -> Result<[f32; 3], VoxelIoError> {
	let mut out = [0f32; 3];
	for slot in &mut out {
		*slot = fields.next().and_then(|s| s.parse().ok()).ok_or_else(|| {
			VoxelIoError::read(ResultCode::ReadErrorParseFail, location, "expected 3 floats")
		})?;
	}
	Ok(out)
}

impl<R: InputStream> VoxelReader<Voxel32> for BinvoxReader<R> {
	fn init(&mut self) -> ReadResult {
		if self.header.is_some() {
			return ReadResult::ok(ResultCode::WarningDoubleInit);
		}
		let header = match self.parse_header() {
			Ok(h) => h,
			Err(e) => return e.into(),
		};
		self.volume = header.dim[0] as u64 * header.dim[1] as u64 * header.dim[2] as u64;
		self.header = Some(header);
		if self.volume == 0 {
			return ReadResult::ok(ResultCode::ReadEnd);
		}
		ReadResult::ok(ResultCode::OkInitialized)
	}

	fn read(&mut self, buf: &mut [Voxel32]) -> ReadResult {
		if self.header.is_none() {
			return self.init();
		}
		if self.cursor >= self.volume {
			return ReadResult::ok(ResultCode::ReadEnd);
		}

		let mut written = 0usize;

		if self.resume_count > 0 {
			let mut remaining = self.resume_count as u32;
			written += self.drain_run(buf, self.resume_value, &mut remaining);
			self.resume_count = remaining as u16;
		}

		while written < buf.len() && self.cursor < self.volume {
			let mut pair = [0u8; 2];
			let n = self.source.read(&mut pair);
			if n < 2 {
				if self.source.is_eof() {
					return VoxelIoError::read(
						ResultCode::ReadErrorUnexpectedEof,
						self.source.position(),
						"RLE stream truncated",
					)
					.into();
				}
				return VoxelIoError::read(
					ResultCode::ReadErrorIo,
					self.source.position(),
					"stream fault while reading RLE pair",
				)
				.into();
			}
			let (value, count) = (pair[0], pair[1]);
			if value > 1 {
				return VoxelIoError::read(
					ResultCode::ReadErrorUnexpectedSymbol,
					self.source.position(),
					format!("RLE value must be 0 or 1, found {value}"),
				)
				.into();
			}
			if self.cursor + count as u64 > self.volume {
				return VoxelIoError::read(
					ResultCode::ReadErrorParseFail,
					self.source.position(),
					"RLE run overruns declared volume",
				)
				.into();
			}

			let mut remaining = count as u32;
			written += self.drain_run(&mut buf[written..], value, &mut remaining);
			if remaining > 0 {
				self.resume_value = value;
				self.resume_count = remaining as u16;
				return ReadResult::read(written as u64, ResultCode::ReadBufferFull);
			}
		}

		if self.cursor >= self.volume {
			ReadResult::read(written as u64, ResultCode::ReadEnd)
		} else {
			ReadResult::read(written as u64, ResultCode::ReadBufferFull)
		}
	}

	fn progress(&self) -> f32 {
		if self.volume == 0 {
			1.0
		} else {
			(self.cursor as f32 / self.volume as f32).clamp(0.0, 1.0)
		}
	}
}

impl<R: InputStream> BinvoxReader<R> {
	/// Emits up to `buf.len()` voxels of `value` (0 = empty, skipped; 1 = filled), consuming
	/// from `*remaining` and advancing `self.cursor`. Returns the number of buffer slots
	/// filled (fewer than voxels consumed when `value == 0`, since empty runs advance the
	/// cursor without emitting anything).
	fn drain_run(&mut self, buf: &mut [Voxel32], value: u8, remaining: &mut u32) -> usize {
		let dim = self.header.unwrap().dim;
		let mut written = 0;
		while *remaining > 0 {
			if value == 1 {
				if written >= buf.len() {
					break;
				}
				let (x, y, z) = linearize(self.cursor, dim);
				buf[written] = Voxel32 {
					pos: [x as i32, y as i32, z as i32],
					argb: FILLED_ARGB,
				};
				written += 1;
			}
			self.cursor += 1;
			*remaining -= 1;
		}
		written
	}
}

/// A writer that buffers an entire dense grid and emits it as a single RLE body, matching
/// binvox's requirement that `dim` precede any voxel data.
pub struct BinvoxWriter<W> {
	sink: W,
	header: BinvoxHeader,
	grid: Vec<bool>,
	initialized: bool,
	finalized: bool,
}

impl<W: OutputStream> BinvoxWriter<W> {
	/// Creates a writer for a grid of `dim` voxels, all initially empty.
	pub fn new(sink: W, dim: [u32; 3]) -> Self {
		let volume = dim[0] as usize * dim[1] as usize * dim[2] as usize;
		Self {
			sink,
			header: BinvoxHeader {
				dim,
				..BinvoxHeader::default()
			},
			grid: vec![false; volume],
			initialized: false,
			finalized: false,
		}
	}

	/// Marks the voxel at `(x, y, z)` filled.
	pub fn set(&mut self, x: u32, y: u32, z: u32) {
		let dim = self.header.dim;
		let i = x as u64 * dim[1] as u64 * dim[2] as u64 + z as u64 * dim[1] as u64 + y as u64;
		if let Some(slot) = self.grid.get_mut(i as usize) {
			*slot = true;
		}
	}

	/// Consumes the writer, returning the underlying sink (e.g. to recover the written bytes
	/// from a [`crate::stream::ByteArrayStream`] after [`finalize`](VoxelListWriter::finalize)).
	pub fn into_sink(self) -> W {
		self.sink
	}
}

impl<W: OutputStream> VoxelListWriter<Voxel32> for BinvoxWriter<W> {
	fn init(&mut self) -> ResultCode {
		if self.initialized {
			return ResultCode::WarningDoubleInit;
		}
		self.sink.write(
			format!(
				"{MAGIC} {SUPPORTED_VERSION}\ndim {} {} {}\ntranslate {} {} {}\nscale {}\ndata\n",
				self.header.dim[0],
				self.header.dim[1],
				self.header.dim[2],
				self.header.translate[0],
				self.header.translate[1],
				self.header.translate[2],
				self.header.scale,
			)
			.as_bytes(),
		);
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
			self.set(v.pos[0] as u32, v.pos[1] as u32, v.pos[2] as u32);
		}
		ResultCode::WriteOk
	}

	fn palette_mut(&mut self) -> &mut Palette {
		unimplemented!("binvox carries no palette; every filled voxel is uniform white")
	}

	fn set_canvas_dimensions(&mut self, dims: [u32; 3]) -> bool {
		if self.initialized {
			return false;
		}
		let volume = dims[0] as usize * dims[1] as usize * dims[2] as usize;
		self.header.dim = dims;
		self.grid = vec![false; volume];
		true
	}

	fn finalize(&mut self) -> ResultCode {
		if self.finalized {
			return ResultCode::WriteEnd;
		}
		let mut current = self.grid.first().copied().unwrap_or(false);
		let mut count: u32 = 0;
		for &filled in &self.grid {
			if filled == current && count < 255 {
				count += 1;
			} else {
				self.sink.write(&[current as u8, count as u8]);
				current = filled;
				count = 1;
			}
		}
		if count > 0 {
			self.sink.write(&[current as u8, count as u8]);
		}
		self.finalized = true;
		let _ = self.sink.flush();
		ResultCode::WriteEnd
	}
}
