//! A fixed-capacity read buffer wrapped around any [`InputStream`].
//!
//! This is the fast path for formats that mix text and binary reads in the same header
//! (binvox's `#binvox 1\ndim ...` lines followed by raw RLE bytes; VOX's chunk headers
//! followed by binary payloads).

use std::io;

use super::InputStream;

/// Default buffer capacity, matching the "small fixed buffer" idiom this crate's header
/// readers use elsewhere (e.g. a 20-byte header read in one shot).
pub const DEFAULT_CAPACITY: usize = 8192;

/// Wraps an [`InputStream`], buffering reads in a fixed-size window `[head, limit)`.
pub struct BufferedInputStream<S> {
	inner: S,
	buf: Vec<u8>,
	head: usize,
	limit: usize,
}

impl<S: InputStream> BufferedInputStream<S> {
	/// Wraps `inner` with the default buffer capacity.
	pub fn new(inner: S) -> Self {
		Self::with_capacity(inner, DEFAULT_CAPACITY)
	}

	/// Wraps `inner` with an explicit buffer capacity.
	pub fn with_capacity(inner: S, capacity: usize) -> Self {
		Self {
			inner,
			buf: vec![0u8; capacity],
			head: 0,
			limit: 0,
		}
	}

	/// Unwraps the stream, discarding any buffered-but-unread bytes.
	pub fn into_inner(self) -> S {
		self.inner
	}

	/// Borrows the underlying stream.
	pub fn get_ref(&self) -> &S {
		&self.inner
	}

	fn buffered_len(&self) -> usize {
		self.limit - self.head
	}

	/// Refills the buffer from `head = limit = 0`, reading as much as the underlying stream
	/// will give in one call.
	fn refill(&mut self) {
		self.head = 0;
		self.limit = self.inner.read(&mut self.buf);
	}

	/// Guarantees at least `n` bytes are buffered (or the stream is at EOF), moving any
	/// residual bytes to the start of the buffer before refilling the rest.
	///
	/// `n` must not exceed the buffer's capacity.
	pub fn ensure_buffered(&mut self, n: usize) {
		debug_assert!(n <= self.buf.len());
		if self.buffered_len() >= n {
			return;
		}
		self.buf.copy_within(self.head..self.limit, 0);
		self.limit -= self.head;
		self.head = 0;
		while self.buffered_len() < n {
			let read = self.inner.read(&mut self.buf[self.limit..]);
			if read == 0 {
				break;
			}
			self.limit += read;
		}
	}

	/// Reads a single byte from the buffer, refilling on underflow.
	pub fn read_byte(&mut self) -> Option<u8> {
		if self.buffered_len() == 0 {
			self.refill();
			if self.buffered_len() == 0 {
				return None;
			}
		}
		let byte = self.buf[self.head];
		self.head += 1;
		Some(byte)
	}

	/// Bulk read: copies what is already buffered, then issues large reads directly against
	/// the underlying stream for the remainder (bypassing the buffer for anything beyond one
	/// capacity's worth), and tops the buffer back up with any small remainder.
	pub fn read(&mut self, out: &mut [u8]) -> usize {
		let mut written = 0;
		let buffered = self.buffered_len().min(out.len());
		out[..buffered].copy_from_slice(&self.buf[self.head..self.head + buffered]);
		self.head += buffered;
		written += buffered;

		if written == out.len() {
			return written;
		}

		let remaining = out.len() - written;
		if remaining >= self.buf.len() {
			written += self.inner.read(&mut out[written..]);
			return written;
		}

		self.refill();
		let from_buf = self.buffered_len().min(remaining);
		out[written..written + from_buf].copy_from_slice(&self.buf[self.head..self.head + from_buf]);
		self.head += from_buf;
		written += from_buf;
		written
	}

	/// Scans the buffer for `delimiter`, writing up to `out.len()` bytes read before it (or
	/// before EOF) into `out`. The delimiter is consumed but not written. Returns the number
	/// of bytes written and whether the delimiter (rather than EOF or a full `out`) ended the
	/// scan.
	fn read_until_delim_parts(&mut self, out: &mut [u8], delimiter: u8) -> (usize, bool) {
		let mut n = 0;
		while n < out.len() {
			let Some(byte) = self.read_byte() else {
				return (n, false);
			};
			if byte == delimiter {
				return (n, true);
			}
			out[n] = byte;
			n += 1;
		}
		(n, false)
	}

	/// Scans the buffer for `delimiter`, writing up to `out.len()` bytes read before it (or
	/// before EOF) into `out`. The delimiter is consumed but not written. Returns the number
	/// of bytes written.
	pub fn read_until_delim(&mut self, out: &mut [u8], delimiter: u8) -> usize {
		self.read_until_delim_parts(out, delimiter).0
	}

	/// Growable-string variant of [`read_until_delim`](Self::read_until_delim): calls `grow`
	/// to extend `out`'s capacity by one chunk whenever the currently available room is
	/// exhausted, without the caller having to know the final length in advance. `grow` should
	/// `reserve`/extend `out`'s length by some chunk size; returning without growing `out`
	/// stops the scan (used as a size-limit guard by callers).
	pub fn read_until_delim_growing(
		&mut self,
		delimiter: u8,
		mut grow: impl FnMut(&mut Vec<u8>),
	) -> Vec<u8> {
		let mut out = Vec::new();
		loop {
			let before = out.len();
			grow(&mut out);
			if out.len() == before {
				break;
			}
			let (read, found_delimiter) = self.read_until_delim_parts(&mut out[before..], delimiter);
			out.truncate(before + read);
			if found_delimiter || self.is_eof() {
				break;
			}
		}
		out
	}

	/// Moves the read head, reconciling the buffer window with the underlying stream's seek
	/// only when the target lies outside the currently buffered window.
	pub fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
		let window_start = self.inner.position() - self.buffered_len() as u64;
		let window_end = self.inner.position();
		if pos >= window_start && pos <= window_end {
			self.head = (pos - window_start) as usize;
			return Ok(());
		}
		self.head = 0;
		self.limit = 0;
		self.inner.seek_absolute(pos)?;
		self.inner.clear_errors();
		Ok(())
	}

	/// Moves the read head by a relative offset.
	pub fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
		let current = self.position();
		self.seek_absolute((current as i64 + offset).max(0) as u64)
	}

	/// The logical read position (accounting for buffered-but-unread bytes).
	pub fn position(&self) -> u64 {
		self.inner.position() - self.buffered_len() as u64
	}

	/// Whether the underlying stream has hit EOF and the buffer is drained.
	pub fn is_eof(&self) -> bool {
		self.buffered_len() == 0 && self.inner.is_eof()
	}

	/// Whether the underlying stream has faulted.
	pub fn has_error(&self) -> bool {
		self.inner.has_error()
	}

	/// Appends everything up to (and including) the next `\n` to `out`, dropping a trailing
	/// `\r` the way [`InputStream::read_line`] does.
	pub fn read_line(&mut self, out: &mut String) {
		let mut bytes = Vec::new();
		loop {
			let Some(byte) = self.read_byte() else {
				break;
			};
			if byte == b'\n' {
				break;
			}
			bytes.push(byte);
		}
		if bytes.last() == Some(&b'\r') {
			bytes.pop();
		}
		out.push_str(&String::from_utf8_lossy(&bytes));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::ByteArrayStream;

	#[test]
	fn matches_unbuffered_reads_regardless_of_capacity() {
		let data: Vec<u8> = (0..=255u16).map(|i| (i % 256) as u8).collect();
		for capacity in [1usize, 2, 7, 64, 4096] {
			let mut buffered = BufferedInputStream::with_capacity(
				ByteArrayStream::from_bytes(data.clone()),
				capacity.max(1),
			);
			let mut out = vec![0u8; data.len()];
			let n = buffered.read(&mut out);
			assert_eq!(n, data.len(), "capacity {capacity}");
			assert_eq!(out, data, "capacity {capacity}");
		}
	}

	#[test]
	fn read_line_across_buffer_boundary() {
		let mut buffered = BufferedInputStream::with_capacity(
			ByteArrayStream::from_bytes(b"ab\r\ncd".to_vec()),
			2,
		);
		let mut line = String::new();
		buffered.read_line(&mut line);
		assert_eq!(line, "ab");
		let mut rest = String::new();
		buffered.read_line(&mut rest);
		assert_eq!(rest, "cd");
	}

	#[test]
	fn read_until_delim_consumes_delimiter() {
		let mut buffered =
			BufferedInputStream::new(ByteArrayStream::from_bytes(b"dim 4 4 4\ndata\n".to_vec()));
		let mut out = [0u8; 16];
		let n = buffered.read_until_delim(&mut out, b'\n');
		assert_eq!(&out[..n], b"dim 4 4 4");
	}

	#[test]
	fn ensure_buffered_preserves_residual_bytes() {
		let mut buffered =
			BufferedInputStream::with_capacity(ByteArrayStream::from_bytes(vec![1, 2, 3, 4, 5]), 3);
		assert_eq!(buffered.read_byte(), Some(1));
		buffered.ensure_buffered(3);
		assert_eq!(buffered.read_byte(), Some(2));
		assert_eq!(buffered.read_byte(), Some(3));
		assert_eq!(buffered.read_byte(), Some(4));
	}
}
