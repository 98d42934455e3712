#![allow(clippy::single_component_path_imports)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `voxelio` is a polymorphic, streaming I/O library for voxel scene formats: Binvox,
//! Qubicle (QB), MagicaVoxel (VOX), and VOBJ.
//!
//! Every format is exposed through the same pair of traits, [`VoxelReader`] and
//! [`VoxelListWriter`], so callers can swap formats without rewriting the code that walks the
//! voxel stream.
//!
//! [`VoxelReader`]: voxelio_core::voxel::VoxelReader
//! [`VoxelListWriter`]: voxelio_core::voxel::VoxelListWriter
pub use voxelio_internal::*;
