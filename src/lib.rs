//! Voxel-to-brick conversion.
//!
//! Takes a voxelized model, represented as a sparse grid of unit cells, and
//! turns it into an arrangement of studded bricks: a merge engine fuses
//! cells into the largest legal bricks, a connectivity analyzer finds
//! disconnected pieces and structurally weak joints, a randomized
//! sturdiness search rebuilds the flawed regions, and post passes grow,
//! hollow, and shrink the result.
//!
//! The whole pipeline is driven through [`pipeline::build_bricks`]:
//!
//! ```no_run
//! use brickforge::{build_bricks, BrickworkConfig, BrickGrid, LegalSizeCatalog};
//!
//! # fn run(mut grid: BrickGrid) -> brickforge::BrickResult<()> {
//! let cfg = BrickworkConfig::default();
//! let catalog = LegalSizeCatalog::default();
//! let stats = build_bricks(&mut grid, &cfg, &catalog)?;
//! println!("{} bricks, {} components", stats.final_bricks, stats.components);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod exposure;
pub mod grid;
pub mod merge;
pub mod pipeline;
pub mod postprocess;
pub mod sturdiness;

pub use catalog::LegalSizeCatalog;
pub use config::{BrickworkConfig, MaterialMode};
pub use error::{BrickError, BrickResult};
pub use grid::{
    BrickCell, BrickFamily, BrickGrid, BrickSize, BrickType, CellKey, Parent, VolumeBounds,
};
pub use pipeline::{build_bricks, BrickStats};
pub use sturdiness::SturdinessReport;
