//! This crate provides the core streaming types and file format codecs for the `voxelio` project.
//!
//! # File Formats
//!
//! - **Binvox**: a text header followed by a run-length-encoded occupancy grid
//! - **QB (Qubicle Binary)**: a table of named matrices, optionally RLE-token compressed
//! - **VOX (MagicaVoxel)**: a chunk tree carrying a scene graph of affine transforms over models
//! - **VOBJ**: an extensible container with a palette, group hierarchy, and sparse/dense arrays
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

pub mod bits;
pub mod compress;
pub mod format;
pub mod hextree;
pub mod palette;
pub mod primitive;
pub mod result;
pub mod stream;
pub mod voxel;

pub mod prelude;
