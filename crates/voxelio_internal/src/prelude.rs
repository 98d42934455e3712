//! Prelude module for `voxelio_internal`.
//!
//! This module provides a convenient way to import the streaming types and format codecs
//! most callers need.
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

// Re-export everything from voxelio_core::prelude
#[doc(inline)]
pub use voxelio_core::prelude::*;

// Re-export the entire voxelio_core module for advanced usage
#[doc(inline)]
pub use voxelio_core;
