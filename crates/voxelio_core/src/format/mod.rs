//! One module per voxel file format, each exposing a `*Reader`/`*Writer` pair implementing
//! [`crate::voxel::VoxelReader`]/[`crate::voxel::VoxelListWriter`].

pub mod binvox;
pub mod qb;
pub mod vobj;
pub mod vox;
