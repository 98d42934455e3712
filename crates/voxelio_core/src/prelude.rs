//! Prelude module for `voxelio_core`.
//!
//! This module provides a convenient way to import the streaming types, shared subsystems,
//! and format codecs most callers need.
//!
//! # Examples
//!
//! ```
//! use voxelio_core::prelude::*;
//!
//! let source = ByteArrayStream::from_bytes(Vec::new());
//! let mut reader = BinvoxReader::new(source);
//! let _ = reader.init();
//! ```

// Primitive types
#[doc(inline)]
pub use crate::primitive::{Color32, Endian};

// Streaming I/O
#[doc(inline)]
pub use crate::stream::{BufferedInputStream, ByteArrayStream, FileStream, InputStream, NullStream, OutputStream, StreamAdapter};

// Deflate/inflate
#[doc(inline)]
pub use crate::compress::{DeflateSettings, Deflator, FlushMode, Inflator, Strategy, deflate_all, inflate_all};

// Palette reduction
#[doc(inline)]
pub use crate::palette::Palette;

// Spatial index
#[doc(inline)]
pub use crate::hextree::HexTree;

// Results and errors
#[doc(inline)]
pub use crate::result::{Error, ReadResult, ResultCode, VoxelIoError};

// Reader/writer abstraction
#[doc(inline)]
pub use crate::voxel::{Voxel32, Voxel64, VoxelListWriter, VoxelReader, WriteHelper};

// Format codecs
#[doc(inline)]
pub use crate::format::binvox::{BinvoxHeader, BinvoxReader, BinvoxWriter};

#[doc(inline)]
pub use crate::format::qb::{QbHeader, QbMatrixHeader, QbReader, QbWriter, ZAxis};

#[doc(inline)]
pub use crate::format::vox::{Transform, VoxReader, VoxWriter, decode_rotation_byte};

#[doc(inline)]
pub use crate::format::vobj::{VobjReader, VobjWriter};

// `qb` and `vobj` each define their own `ColorFormat`; re-export the modules so callers can
// name the one they need (`qb::ColorFormat` vs `vobj::ColorFormat`) instead of flattening a
// collision.
#[doc(inline)]
pub use crate::format::{binvox, qb, vobj, vox};
