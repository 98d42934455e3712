//! Streaming deflate/inflate wrapped around any [`InputStream`]/[`OutputStream`].
//!
//! Grounded on the pack's `flate2` usage pattern for chunked, incremental (de)compression
//! against a caller-owned buffer rather than an all-at-once `Vec<u8>` call: [`Inflator`] and
//! [`Deflator`] each drive a `flate2::{Decompress, Compress}` state machine one chunk at a
//! time, so a VOX/QB reader can interleave decompression with parsing the decompressed bytes
//! without ever materializing the whole stream in memory.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::result::ResultCode;
use crate::stream::{InputStream, OutputStream};

/// flate2's raw `Compress`/`Decompress` drive the whole slice handed to them in one call;
/// this bounds how much of that slice is backed by our own working buffer at a time.
const WORKING_BUF_SIZE: usize = 256 * 1024;

/// Deflate strategy hint, mirroring zlib's `Z_*_STRATEGY` constants.
///
/// flate2's safe `Compress::new` only takes a [`Compression`] level and a zlib-header flag;
/// it has no knob for strategy. This is carried on [`DeflateSettings`] for parity with the
/// documented settings surface but isn't forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
	Default,
	Filtered,
	HuffmanOnly,
	Rle,
	Fixed,
}

/// Maps 1:1 onto `flate2::FlushCompress`, except `Block`, which flate2 has no distinct
/// variant for and which falls back to `Sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
	None,
	Partial,
	Sync,
	Full,
	Finish,
	Block,
}

impl FlushMode {
	fn to_flate2(self) -> FlushCompress {
		match self {
			FlushMode::None => FlushCompress::None,
			FlushMode::Partial => FlushCompress::Partial,
			FlushMode::Sync => FlushCompress::Sync,
			FlushMode::Full => FlushCompress::Full,
			FlushMode::Finish => FlushCompress::Finish,
			FlushMode::Block => FlushCompress::Sync,
		}
	}
}

/// Deflate tuning knobs. `level` and `zlib_header` reach `flate2::Compress::new` directly;
/// `window_bits`, `mem_level`, and `strategy` are stored for API parity but flate2's safe
/// raw API has no equivalent constructor argument for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateSettings {
	pub level: u32,
	pub window_bits: u32,
	pub mem_level: u32,
	pub strategy: Strategy,
	pub zlib_header: bool,
}

impl DeflateSettings {
	/// `level` at zlib defaults (`window_bits = 15`, `mem_level = 8`, `strategy = Default`).
	pub fn new(level: u32, zlib_header: bool) -> Self {
		Self {
			level,
			window_bits: 15,
			mem_level: 8,
			strategy: Strategy::Default,
			zlib_header,
		}
	}
}

/// Incrementally deflates bytes read from a caller buffer, forwarding compressed output
/// through an [`OutputStream`] as it becomes available.
///
/// None of the four voxel formats this crate speaks actually compress their payloads with
/// zlib, but QB's "compressed" flag and VOX's (unused, reserved) registry of chunk
/// compression flags both reserve the option; this type exists so a future or custom variant
/// can flip it on without inventing a new abstraction.
pub struct Deflator {
	compress: Compress,
	buf: Vec<u8>,
}

impl Deflator {
	/// Creates a deflator with the given settings.
	pub fn new(settings: DeflateSettings) -> Self {
		Self {
			compress: Compress::new(Compression::new(settings.level), settings.zlib_header),
			buf: vec![0u8; WORKING_BUF_SIZE],
		}
	}

	/// Compresses `input` under `flush`, forwarding each filled segment of the working buffer
	/// to `out` as it's produced. `flush == Finish` ends the stream; any out-stream short write
	/// aborts with [`ResultCode::WriteErrorIo`].
	pub fn deflate(&mut self, input: &[u8], flush: FlushMode, out: &mut dyn OutputStream) -> ResultCode {
		let mut pos = 0;
		loop {
			let before_in = self.compress.total_in();
			let before_out = self.compress.total_out();
			let status = match self.compress.compress(&input[pos..], &mut self.buf, flush.to_flate2()) {
				Ok(status) => status,
				Err(_) => return ResultCode::WriteErrorIo,
			};
			pos += (self.compress.total_in() - before_in) as usize;
			let produced = (self.compress.total_out() - before_out) as usize;
			if produced > 0 && out.write(&self.buf[..produced]) != produced {
				return ResultCode::WriteErrorIo;
			}
			if status == Status::StreamEnd {
				break;
			}
			if pos >= input.len() && produced == 0 {
				break;
			}
		}
		ResultCode::WriteOk
	}

	/// Forces any buffered output through `out` without ending the stream.
	pub fn flush(&mut self, out: &mut dyn OutputStream) -> ResultCode {
		self.deflate(&[], FlushMode::Sync, out)
	}

	/// Ends the deflate stream, flushing all remaining output through `out`.
	pub fn finish(&mut self, out: &mut dyn OutputStream) -> ResultCode {
		self.deflate(&[], FlushMode::Finish, out)
	}

	/// Discards accumulated compressor state, starting a fresh stream on the next `deflate`.
	pub fn reset(&mut self) {
		self.compress.reset();
	}

	/// Total uncompressed bytes consumed so far.
	pub fn total_read(&self) -> u64 {
		self.compress.total_in()
	}

	/// Total compressed bytes produced so far.
	pub fn total_written(&self) -> u64 {
		self.compress.total_out()
	}
}

/// Incrementally inflates a zlib/deflate stream read from an [`InputStream`].
pub struct Inflator {
	decompress: Decompress,
	input_buf: Vec<u8>,
	input_pos: usize,
	input_len: usize,
	stream_end: bool,
}

impl Inflator {
	/// `window_bits = Some(_)` selects raw (headerless) deflate; `None` expects a zlib header.
	/// The window size itself is negotiated from the stream's header (zlib) or fixed by the
	/// producer (raw), so only header-presence is actually threaded through to flate2.
	pub fn new(window_bits: Option<u32>) -> Self {
		Self {
			decompress: Decompress::new(window_bits.is_none()),
			input_buf: vec![0u8; WORKING_BUF_SIZE],
			input_pos: 0,
			input_len: 0,
			stream_end: false,
		}
	}

	/// Fills `out` with inflated bytes, pulling more compressed input from `input_stream` as
	/// needed. Returns the number of bytes written; a short count with the source at EOF or
	/// [`is_stream_end`](Self::is_stream_end) true means the stream is exhausted.
	pub fn inflate(&mut self, input_stream: &mut dyn InputStream, out: &mut [u8]) -> (ResultCode, usize) {
		let mut written = 0;
		while written < out.len() {
			if self.input_pos == self.input_len {
				self.input_len = input_stream.read(&mut self.input_buf);
				self.input_pos = 0;
				if self.input_len == 0 && input_stream.is_eof() {
					break;
				}
			}

			let before_out = self.decompress.total_out();
			let before_in = self.decompress.total_in();
			let status = match self.decompress.decompress(
				&self.input_buf[self.input_pos..self.input_len],
				&mut out[written..],
				FlushDecompress::None,
			) {
				Ok(status) => status,
				Err(_) => return (ResultCode::ReadErrorIo, written),
			};

			self.input_pos += (self.decompress.total_in() - before_in) as usize;
			written += (self.decompress.total_out() - before_out) as usize;

			if status == Status::StreamEnd {
				self.stream_end = true;
				break;
			}
		}
		(ResultCode::ReadOk, written)
	}

	/// Whether the last `inflate` call reached the end of the compressed stream.
	pub fn is_stream_end(&self) -> bool {
		self.stream_end
	}
}

/// Convenience wrapper that inflates an entire buffer into memory in one call, for formats
/// that only ever compress small, fully-buffered chunks (QB matrix voxel data) rather than
/// streaming arbitrarily large payloads.
pub fn inflate_all(data: &[u8], zlib_header: bool) -> Result<Vec<u8>, ResultCode> {
	use crate::stream::ByteArrayStream;

	let mut source = ByteArrayStream::from_bytes(data.to_vec());
	let mut inflator = Inflator::new(if zlib_header { None } else { Some(15) });
	let mut out = Vec::with_capacity(data.len() * 4);
	let mut chunk = [0u8; WORKING_BUF_SIZE];
	loop {
		let (code, written) = inflator.inflate(&mut source, &mut chunk);
		if code.is_error() {
			return Err(code);
		}
		out.extend_from_slice(&chunk[..written]);
		if written == 0 || inflator.is_stream_end() {
			break;
		}
	}
	Ok(out)
}

/// Convenience wrapper compressing an entire buffer at once.
pub fn deflate_all(data: &[u8], level: u32, zlib_header: bool) -> Vec<u8> {
	use crate::stream::ByteArrayStream;

	let mut out_stream = ByteArrayStream::from_bytes(Vec::new());
	let mut deflator = Deflator::new(DeflateSettings::new(level, zlib_header));
	deflator.deflate(data, FlushMode::None, &mut out_stream);
	deflator.finish(&mut out_stream);
	out_stream.into_bytes()
}
