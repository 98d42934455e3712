//! A stream that discards everything written to it and reports immediate EOF on every read.
//!
//! Useful for codecs that need to run their write path purely to measure output size (VOX's
//! writer backpatches `MAIN.selfSize`, which a null-stream dry run can size ahead of time).

use std::io;

use super::{InputStream, OutputStream};

/// The null device: reads always EOF, writes always succeed and vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStream {
	position: u64,
}

impl NullStream {
	/// Creates a fresh null stream at position `0`.
	pub fn new() -> Self {
		Self::default()
	}
}

impl InputStream for NullStream {
	fn read(&mut self, _buf: &mut [u8]) -> usize {
		0
	}

	fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
		self.position = pos;
		Ok(())
	}

	fn position(&self) -> u64 {
		self.position
	}

	fn is_eof(&self) -> bool {
		true
	}

	fn has_error(&self) -> bool {
		false
	}

	fn clear_errors(&mut self) {}
}

impl OutputStream for NullStream {
	fn write(&mut self, buf: &[u8]) -> usize {
		self.position += buf.len() as u64;
		buf.len()
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}

	fn seek_absolute(&mut self, pos: u64) -> io::Result<()> {
		self.position = pos;
		Ok(())
	}

	fn position(&self) -> u64 {
		self.position
	}
}
