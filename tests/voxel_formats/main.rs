//! Integration tests for `voxelio`'s format codecs.

mod binvox;
mod qb;
mod vobj;
mod vox;
