//! Byte-oriented stream abstraction shared by every format codec.
//!
//! [`InputStream`]/[`OutputStream`] are the trait-level seam codecs are written against
//! (`&mut dyn InputStream`), so a single reader/writer implementation works unmodified
//! whether it is backed by a file, an in-memory buffer, or a null sink. Every stream carries
//! sticky `{eof, err}` flags per spec: once set they stay set until [`InputStream::clear_errors`]
//! is called explicitly.

mod adapter;
mod buffered;
mod null;

pub use adapter::{ByteArrayStream, FileStream, StreamAdapter};
pub use buffered::BufferedInputStream;
pub use null::NullStream;

use std::io;

/// A byte source with sticky EOF/error flags and endian-aware integer reads.
pub trait InputStream {
	/// Reads a single byte. On EOF, sets the `eof` flag and returns `0`.
	fn read_u8(&mut self) -> u8 {
		let mut buf = [0u8; 1];
		if self.read(&mut buf) == 1 { buf[0] } else { 0 }
	}

	/// Reads up to `buf.len()` bytes, returning the number actually read.
	///
	/// A short read (fewer bytes than requested, but not due to an I/O fault) sets `eof`. An
	/// I/O fault sets `err` and returns `0`.
	fn read(&mut self, buf: &mut [u8]) -> usize;

	/// Reads bytes into `buf` up to `limit` or until `delimiter` is encountered, whichever is
	/// first. `delimiter` itself is consumed but not written to `buf`. Returns the number of
	/// bytes written.
	fn read_until(&mut self, buf: &mut [u8], delimiter: u8) -> usize {
		let mut n = 0;
		while n < buf.len() {
			let mut byte = [0u8; 1];
			if self.read(&mut byte) == 0 {
				break;
			}
			if byte[0] == delimiter {
				break;
			}
			buf[n] = byte[0];
			n += 1;
		}
		n
	}

	/// Moves the read head to an absolute byte offset.
	fn seek_absolute(&mut self, pos: u64) -> io::Result<()>;

	/// Moves the read head by a relative byte offset.
	fn seek_relative(&mut self, offset: i64) -> io::Result<()> {
		let current = self.position() as i64;
		self.seek_absolute((current + offset).max(0) as u64)
	}

	/// The current byte offset of the read head.
	fn position(&self) -> u64;

	/// Whether the stream has hit end-of-input since the last [`clear_errors`](Self::clear_errors).
	fn is_eof(&self) -> bool;

	/// Whether the stream has faulted since the last [`clear_errors`](Self::clear_errors).
	fn has_error(&self) -> bool;

	/// Whether the stream is neither at EOF nor in an error state.
	fn is_good(&self) -> bool {
		!self.is_eof() && !self.has_error()
	}

	/// Clears both the `eof` and `err` flags.
	fn clear_errors(&mut self);

	/// Appends everything up to (and including) the next `\n` to `out`, excluding the `\n`
	/// itself. If the character preceding `\n` is `\r`, it is also dropped. Reaching EOF
	/// mid-line is not an error; the caller inspects [`is_eof`](Self::is_eof) afterward.
	fn read_line(&mut self, out: &mut String) -> io::Result<()> {
		let mut bytes = Vec::new();
		loop {
			let mut byte = [0u8; 1];
			if self.read(&mut byte) == 0 {
				break;
			}
			if byte[0] == b'\n' {
				break;
			}
			bytes.push(byte[0]);
		}
		if bytes.last() == Some(&b'\r') {
			bytes.pop();
		}
		out.push_str(&String::from_utf8_lossy(&bytes));
		Ok(())
	}

	/// Reads exactly `n` bytes as a `String` (lossily decoded as UTF-8).
	fn read_string(&mut self, n: usize) -> String {
		let mut buf = vec![0u8; n];
		let read = self.read(&mut buf);
		buf.truncate(read);
		String::from_utf8_lossy(&buf).into_owned()
	}

	/// Reads bytes up to `delimiter` (consumed, not included) as a `String`.
	fn read_string_until(&mut self, delimiter: u8) -> String {
		let mut bytes = Vec::new();
		loop {
			let mut byte = [0u8; 1];
			if self.read(&mut byte) == 0 {
				break;
			}
			if byte[0] == delimiter {
				break;
			}
			bytes.push(byte[0]);
		}
		String::from_utf8_lossy(&bytes).into_owned()
	}

	/// Reads a big-endian `u16`.
	fn read_big_u16(&mut self) -> u16 {
		let mut buf = [0u8; 2];
		self.read(&mut buf);
		u16::from_be_bytes(buf)
	}

	/// Reads a little-endian `u16`.
	fn read_little_u16(&mut self) -> u16 {
		let mut buf = [0u8; 2];
		self.read(&mut buf);
		u16::from_le_bytes(buf)
	}

	/// Reads a big-endian `u32`.
	fn read_big_u32(&mut self) -> u32 {
		let mut buf = [0u8; 4];
		self.read(&mut buf);
		u32::from_be_bytes(buf)
	}

	/// Reads a little-endian `u32`.
	fn read_little_u32(&mut self) -> u32 {
		let mut buf = [0u8; 4];
		self.read(&mut buf);
		u32::from_le_bytes(buf)
	}

	/// Reads a little-endian `i32`.
	fn read_little_i32(&mut self) -> i32 {
		self.read_little_u32() as i32
	}

	/// Reads a big-endian `i32`.
	fn read_big_i32(&mut self) -> i32 {
		self.read_big_u32() as i32
	}
}

/// A byte sink, symmetric with [`InputStream`].
pub trait OutputStream {
	/// Writes `buf` in full. Returns the number of bytes actually written (short on fault).
	fn write(&mut self, buf: &[u8]) -> usize;

	/// Flushes any internal buffering to the underlying sink.
	fn flush(&mut self) -> io::Result<()>;

	/// Moves the write head to an absolute byte offset.
	fn seek_absolute(&mut self, pos: u64) -> io::Result<()>;

	/// The current byte offset of the write head.
	fn position(&self) -> u64;

	/// Writes a null-terminated string (the bytes of `s` followed by a `0x00` byte).
	fn write_cstring(&mut self, s: &str) -> usize {
		let mut n = self.write(s.as_bytes());
		n += self.write(&[0]);
		n
	}

	/// Writes a little-endian `u32`.
	fn write_little_u32(&mut self, value: u32) -> usize {
		self.write(&value.to_le_bytes())
	}

	/// Writes a big-endian `u32`.
	fn write_big_u32(&mut self, value: u32) -> usize {
		self.write(&value.to_be_bytes())
	}

	/// Writes a little-endian `u16`.
	fn write_little_u16(&mut self, value: u16) -> usize {
		self.write(&value.to_le_bytes())
	}

	/// Writes a big-endian `u16`.
	fn write_big_u16(&mut self, value: u16) -> usize {
		self.write(&value.to_be_bytes())
	}
}
