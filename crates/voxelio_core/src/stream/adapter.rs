//! Adapts any `std::io::{Read, Write, Seek}` type into an [`InputStream`]/[`OutputStream`]
//! with sticky error flags.
//!
//! Grounded on `dvine_types::file::efc::File<R>`, which wraps a generic `R: Read + Seek` and
//! layers its own bookkeeping (an index table) on top. Here the bookkeeping is the
//! `{eof, err}` flag pair the voxel codecs require but `std::io` does not track itself.

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::{InputStream, OutputStream};

/// Wraps a reader/writer/seeker, adding the sticky `eof`/`err` flags every codec in this
/// crate relies on. Used directly as `FileStream` (`StreamAdapter<std::fs::File>`) and
/// `ByteArrayStream` (`StreamAdapter<std::io::Cursor<Vec<u8>>>`); both are type aliases in
/// this module.
#[derive(Debug)]
pub struct StreamAdapter<S> {
	inner: S,
	position: u64,
	eof: bool,
	err: bool,
}

/// A stream backed by an open file.
pub type FileStream = StreamAdapter<std::fs::File>;

/// A stream backed by an in-memory byte buffer.
pub type ByteArrayStream = StreamAdapter<io::Cursor<Vec<u8>>>;

impl<S> StreamAdapter<S> {
	/// Wraps `inner`, assuming its read/write head starts at position `0`.
	pub fn new(inner: S) -> Self {
		Self {
			inner,
			position: 0,
			eof: false,
			err: false,
		}
	}

	/// Unwraps the adapter, discarding its sticky flags.
	pub fn into_inner(self) -> S {
		self.inner
	}

	/// Borrows the wrapped reader/writer.
	pub fn get_ref(&self) -> &S {
		&self.inner
	}
}

impl StreamAdapter<io::Cursor<Vec<u8>>> {
	/// Builds a byte-array stream over an owned buffer.
	pub fn from_bytes(bytes: Vec<u8>) -> Self {
		Self::new(io::Cursor::new(bytes))
	}

	/// Consumes the stream, returning the accumulated buffer (useful after writes).
	pub fn into_bytes(self) -> Vec<u8> {
		self.inner.into_inner()
	}
}

impl<S: Read + Seek> InputStream for StreamAdapter<S> {
	fn read(&mut self, buf: &mut [u8]) -> usize {
		if buf.is_empty() {
			return 0;
		}
		let mut total = 0;
		while total < buf.len() {
			match self.inner.read(&mut buf[total..]) {
				Ok(0) => {
					self.eof = true;
					break;
				}
				Ok(n) => total += n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(_) => {
					self.err = true;
					return total;
				}
			}
		}
		self.position += total as u64;
		total
	}

	fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
		match self.inner.seek(SeekFrom::Start(pos)) {
			Ok(actual) => {
				self.position = actual;
				Ok(())
			}
			Err(e) => {
				self.err = true;
				Err(e)
			}
		}
	}

	fn position(&self) -> u64 {
		self.position
	}

	fn is_eof(&self) -> bool {
		self.eof
	}

	fn has_error(&self) -> bool {
		self.err
	}

	fn clear_errors(&mut self) {
		self.eof = false;
		self.err = false;
	}
}

impl<S: Write + Seek> OutputStream for StreamAdapter<S> {
	fn write(&mut self, buf: &[u8]) -> usize {
		let mut total = 0;
		while total < buf.len() {
			match self.inner.write(&buf[total..]) {
				Ok(0) => {
					self.err = true;
					break;
				}
				Ok(n) => total += n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(_) => {
					self.err = true;
					break;
				}
			}
		}
		self.position += total as u64;
		total
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}

	fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
		match self.inner.seek(SeekFrom::Start(pos)) {
			Ok(actual) => {
				self.position = actual;
				Ok(())
			}
			Err(e) => {
				self.err = true;
				Err(e)
			}
		}
	}

	fn position(&self) -> u64 {
		self.position
	}
}
