//! Reserved crate for a future virtual-filesystem layer on top of `voxelio_core`.
//!
//! Nothing in the core codec/stream/format stack depends on this crate yet; it exists to
//! mirror the workspace shape of the project this one was split out of, where asset
//! containers (archives, patch layers) lived in their own crate separate from format
//! parsing. Kept empty intentionally.
