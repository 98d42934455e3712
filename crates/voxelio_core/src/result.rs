//! The `ResultCode`/`ReadResult`/`VoxelIoError` family every codec reports through.
//!
//! Grounded on `dvine_types::file::error`'s shape (one `thiserror`-derived enum per concern,
//! `#[error(transparent)] IOError(#[from] std::io::Error)` for I/O faults), generalized from
//! "one enum per format" to "one enum per error family, shared by every format," so every
//! codec speaks the same `ResultCode` vocabulary.

use thiserror::Error;

/// The outcome of a single codec operation, classified by failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
	/// Operation completed with no special condition.
	Ok,
	/// `init()` was called a second time; harmless.
	OkInitialized,
	/// A `read()` completed normally.
	ReadOk,
	/// `read()` filled the caller's buffer before exhausting the source; call again to
	/// continue.
	ReadBufferFull,
	/// `read()` reached a logical boundary (end of one matrix/model); the next call
	/// continues with the next object.
	ReadObjectEnd,
	/// `read()` exhausted the source entirely.
	ReadEnd,
	/// A `write()` completed normally.
	WriteOk,
	/// The writer accepted fewer voxels than offered (internal buffering not yet full).
	WriteBufferUnderfull,
	/// The writer closed out one logical object.
	WriteObjectEnd,
	/// The writer is fully finalized.
	WriteEnd,
	/// An operation was a no-op (e.g. writing zero voxels).
	WarningNop,
	/// A read request produced no voxels but was not an error (e.g. an empty RLE run).
	WarningInputNop,
	/// `init()` was called on an already-initialized reader/writer.
	WarningDoubleInit,
	/// A required palette was missing.
	UserErrorMissingPalette,
	/// Required canvas dimensions were missing.
	UserErrorMissingCanvas,
	/// The requested format configuration is invalid.
	UserErrorInvalidFormat,
	/// The requested color format is invalid for this codec.
	UserErrorInvalidColorFormat,
	/// The underlying stream faulted.
	ReadErrorIo,
	/// A read ended before the expected amount of data was available.
	ReadErrorUnexpectedEof,
	/// A byte outside the format's legal alphabet appeared where a specific character was
	/// expected.
	ReadErrorIllegalChar,
	/// A value failed to parse (e.g. a non-numeric header field).
	ReadErrorParseFail,
	/// A magic number or signature did not match.
	ReadErrorUnexpectedMagic,
	/// A header keyword or opcode was neither expected nor recognized.
	ReadErrorUnexpectedSymbol,
	/// The file declares a version this codec does not implement.
	ReadErrorUnknownVersion,
	/// The file uses a feature this codec deliberately does not support (e.g. VOX `PACK`).
	ReadErrorUnsupportedFeature,
	/// An enumerated wire value had no corresponding variant.
	ReadErrorCorruptedEnum,
	/// A boolean wire value was neither `0` nor `1`.
	ReadErrorCorruptedBool,
	/// Expected data was absent (e.g. a chunk referenced but never emitted).
	ReadErrorMissingData,
	/// A list's declared length did not match its actual content.
	ReadErrorWrongListLength,
	/// The same keyed entity (e.g. a group name, a scene-graph id) appeared twice where
	/// uniqueness is required.
	ReadErrorDuplicateData,
	/// More than one root node was found where exactly one is required.
	ReadErrorMultipleRoots,
	/// A declared length was out of the legal range for its field.
	ReadErrorIllegalDataLength,
	/// A length-prefixed string was shorter than its own declared minimum.
	ReadErrorStringTooShort,
	/// A constant or checksum field did not match its expected value.
	ReadErrorInvalidConstant,
	/// A textual field failed to parse as the expected token/number.
	ReadErrorTextParseFail,
	/// A numeric field was outside the range the format allows.
	ReadErrorValueOutOfBounds,
	/// The underlying stream faulted during a write.
	WriteErrorIo,
	/// A write targeted a position or index outside the writer's bounds.
	WriteErrorOutOfBounds,
	/// The writer does not support the requested output configuration.
	WriteErrorUnsupportedFormat,
	/// An invariant internal to this crate was violated; always a bug.
	InternalError,
}

impl ResultCode {
	/// Whether this code belongs to the OK family (no warning or error).
	pub fn is_good(self) -> bool {
		matches!(
			self,
			ResultCode::Ok
				| ResultCode::OkInitialized
				| ResultCode::ReadOk
				| ResultCode::ReadBufferFull
				| ResultCode::ReadObjectEnd
				| ResultCode::ReadEnd
				| ResultCode::WriteOk
				| ResultCode::WriteBufferUnderfull
				| ResultCode::WriteObjectEnd
				| ResultCode::WriteEnd
		)
	}

	/// Whether this code is a non-fatal warning.
	pub fn is_warning(self) -> bool {
		matches!(
			self,
			ResultCode::WarningNop | ResultCode::WarningInputNop | ResultCode::WarningDoubleInit
		)
	}

	/// Whether this code is any error family.
	pub fn is_error(self) -> bool {
		self.is_read_error() || self.is_write_error() || self.is_internal_error() || self.is_user_error()
	}

	/// Whether this code is a user-input error (missing palette/canvas, bad format request).
	pub fn is_user_error(self) -> bool {
		matches!(
			self,
			ResultCode::UserErrorMissingPalette
				| ResultCode::UserErrorMissingCanvas
				| ResultCode::UserErrorInvalidFormat
				| ResultCode::UserErrorInvalidColorFormat
		)
	}

	/// Whether this code is a read-side error.
	pub fn is_read_error(self) -> bool {
		matches!(
			self,
			ResultCode::ReadErrorIo
				| ResultCode::ReadErrorUnexpectedEof
				| ResultCode::ReadErrorIllegalChar
				| ResultCode::ReadErrorParseFail
				| ResultCode::ReadErrorUnexpectedMagic
				| ResultCode::ReadErrorUnexpectedSymbol
				| ResultCode::ReadErrorUnknownVersion
				| ResultCode::ReadErrorUnsupportedFeature
				| ResultCode::ReadErrorCorruptedEnum
				| ResultCode::ReadErrorCorruptedBool
				| ResultCode::ReadErrorMissingData
				| ResultCode::ReadErrorWrongListLength
				| ResultCode::ReadErrorDuplicateData
				| ResultCode::ReadErrorMultipleRoots
				| ResultCode::ReadErrorIllegalDataLength
				| ResultCode::ReadErrorStringTooShort
				| ResultCode::ReadErrorInvalidConstant
				| ResultCode::ReadErrorTextParseFail
				| ResultCode::ReadErrorValueOutOfBounds
		)
	}

	/// Whether this code is a write-side error.
	pub fn is_write_error(self) -> bool {
		matches!(
			self,
			ResultCode::WriteErrorIo
				| ResultCode::WriteErrorOutOfBounds
				| ResultCode::WriteErrorUnsupportedFormat
		)
	}

	/// Whether this code denotes an internal bug rather than bad input.
	pub fn is_internal_error(self) -> bool {
		matches!(self, ResultCode::InternalError)
	}
}

/// The byte offset and message attached to an error-family [`ResultCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
	/// Stream position at the point of detection.
	pub location: u64,
	/// Human-readable diagnostic.
	pub message: String,
}

impl Error {
	/// Builds an error from a location and a message.
	pub fn new(location: u64, message: impl Into<String>) -> Self {
		Self {
			location,
			message: message.into(),
		}
	}
}

/// The result of a single `read()` call: how many voxels landed in the caller's buffer, the
/// classifying [`ResultCode`], and an optional [`Error`] body (populated iff the code is an
/// error).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
	/// Number of voxels written into the caller's buffer during this call.
	pub voxels_read: u64,
	/// The classifying result code.
	pub code: ResultCode,
	/// Present iff `code.is_error()`.
	pub error: Option<Error>,
}

impl ReadResult {
	/// A successful result with no voxels read (used by `init()` on success).
	pub fn ok(code: ResultCode) -> Self {
		debug_assert!(code.is_good() || code.is_warning());
		Self {
			voxels_read: 0,
			code,
			error: None,
		}
	}

	/// A successful result reporting `voxels_read` voxels.
	pub fn read(voxels_read: u64, code: ResultCode) -> Self {
		debug_assert!(code.is_good());
		Self {
			voxels_read,
			code,
			error: None,
		}
	}

	/// An error result at the given stream `location`.
	pub fn error(code: ResultCode, location: u64, message: impl Into<String>) -> Self {
		debug_assert!(code.is_error());
		Self {
			voxels_read: 0,
			code,
			error: Some(Error::new(location, message)),
		}
	}
}

/// The crate-wide error type every codec's fallible constructors and helpers return.
///
/// Rather than one `thiserror`-derived enum per format (`DskError`/`PftError`/... in
/// `dvine_types::file::error`), this is a single enum with a variant per failure family so any
/// codec's error converts to a [`ResultCode`] uniformly via [`VoxelIoError::code`].
#[derive(Debug, Error)]
pub enum VoxelIoError {
	/// Underlying stream I/O fault.
	#[error("I/O error at offset {location}: {source}")]
	Io {
		/// Byte offset at the point of failure.
		location: u64,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},
	/// A read-side format error, at a known byte offset.
	#[error("read error at offset {location}: {message}")]
	Read {
		/// The specific read-error [`ResultCode`].
		code: ResultCode,
		/// Byte offset at the point of detection.
		location: u64,
		/// Human-readable diagnostic.
		message: String,
	},
	/// A write-side format error.
	#[error("write error at offset {location}: {message}")]
	Write {
		/// The specific write-error [`ResultCode`].
		code: ResultCode,
		/// Byte offset at the point of detection.
		location: u64,
		/// Human-readable diagnostic.
		message: String,
	},
	/// Missing/invalid codec configuration supplied by the caller.
	#[error("invalid configuration: {message}")]
	User {
		/// The specific user-error [`ResultCode`].
		code: ResultCode,
		/// Human-readable diagnostic.
		message: String,
	},
	/// An invariant internal to this crate was violated.
	#[error("internal error: {message}")]
	Internal {
		/// Human-readable diagnostic.
		message: String,
	},
}

impl VoxelIoError {
	/// The [`ResultCode`] this error classifies as.
	pub fn code(&self) -> ResultCode {
		match self {
			VoxelIoError::Io {
				..
			} => ResultCode::ReadErrorIo,
			VoxelIoError::Read {
				code, ..
			}
			| VoxelIoError::Write {
				code, ..
			}
			| VoxelIoError::User {
				code, ..
			} => *code,
			VoxelIoError::Internal {
				..
			} => ResultCode::InternalError,
		}
	}

	/// The byte offset at which this error was detected, if known.
	pub fn location(&self) -> Option<u64> {
		match self {
			VoxelIoError::Io {
				location, ..
			}
			| VoxelIoError::Read {
				location, ..
			}
			| VoxelIoError::Write {
				location, ..
			} => Some(*location),
			VoxelIoError::User {
				..
			}
			| VoxelIoError::Internal {
				..
			} => None,
		}
	}

	/// Builds a [`VoxelIoError::Read`] and logs the error family, message, and byte offset at
	/// the detection site, in addition to returning the structured error.
	pub fn read(code: ResultCode, location: u64, message: impl Into<String>) -> Self {
		let message = message.into();
		log::warn!("read error at offset {location}: {message}");
		VoxelIoError::Read {
			code,
			location,
			message,
		}
	}

	/// Builds a [`VoxelIoError::Write`], logging as [`read`](Self::read) does.
	pub fn write(code: ResultCode, location: u64, message: impl Into<String>) -> Self {
		let message = message.into();
		log::warn!("write error at offset {location}: {message}");
		VoxelIoError::Write {
			code,
			location,
			message,
		}
	}
}

impl From<VoxelIoError> for ReadResult {
	fn from(err: VoxelIoError) -> Self {
		let location = err.location().unwrap_or(0);
		ReadResult::error(err.code(), location, err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn families_are_disjoint() {
		let all = [
			ResultCode::Ok,
			ResultCode::WarningNop,
			ResultCode::ReadErrorUnexpectedEof,
			ResultCode::WriteErrorIo,
			ResultCode::InternalError,
		];
		for code in all {
			let buckets = [code.is_good(), code.is_warning(), code.is_error()];
			assert_eq!(buckets.iter().filter(|b| **b).count(), 1, "{code:?}");
		}
	}

	#[test]
	fn error_never_reports_voxels_read() {
		let result = ReadResult::error(ResultCode::ReadErrorParseFail, 42, "bad header");
		assert_eq!(result.voxels_read, 0);
		assert!(result.code.is_error());
		assert_eq!(result.error.unwrap().location, 42);
	}
}
