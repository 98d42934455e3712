//! Internal crate for `voxelio`.
//!
//! This crate is separated out to enable simple dynamic linking for the top-level `voxelio`
//! crate, and should not be used directly.
//!
//! # Examples
//!
//! ```
//! use voxelio_internal::prelude::*;
//!
//! let source = ByteArrayStream::from_bytes(Vec::new());
//! let mut reader = BinvoxReader::new(source);
//! let _ = reader.init();
//! ```

/// `use voxelio_internal::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export voxelio_core for convenience
pub use voxelio_core;
pub use voxelio_vfs;
