//! Brick grid data model
//!
//! The sparse voxel-cell store and its coordinate/key utilities:
//!
//! - **Key**: packed integer lattice coordinates ([`CellKey`])
//! - **Cell**: per-cell record with density, draw flag, parent assignment,
//!   brick type, materials and voxelizer provenance ([`BrickCell`])
//! - **Grid**: the associative store with neighbor, footprint and
//!   snapshot operations ([`BrickGrid`])

mod cell;
mod grid;
mod key;

pub use cell::{BrickCell, BrickFamily, BrickSize, BrickType, Parent};
pub use grid::{BrickGrid, GridSnapshot, VolumeBounds};
pub use key::{CellKey, KEY_COORD_MAX, KEY_COORD_MIN};
