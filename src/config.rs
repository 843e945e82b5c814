//! Conversion configuration
//!
//! The configuration bundle the host hands in alongside a populated grid.
//! `validate()` checks the invariants up front so the algorithms can assume
//! a consistent bundle, in the same spirit as an engine validating its
//! startup config before running.

use crate::error::{BrickError, BrickResult};
use crate::grid::BrickFamily;
use serde::{Deserialize, Serialize};

/// How cell materials gate merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialMode {
    /// Respect per-cell materials from the voxelizer; merging across a
    /// material boundary follows the internal-merge flags.
    Source,
    /// One material for the whole model; material gating is disabled.
    Uniform,
    /// Materials are assigned randomly downstream; gating is disabled.
    Random,
}

/// Configuration for one voxel-to-brick conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrickworkConfig {
    /// Brick family the conversion produces
    pub family: BrickFamily,
    /// Vertical lattice granularity in plate units (1 or 3); must agree
    /// with the family
    pub z_step: i32,
    /// Restrict committed sizes to the legal-size catalog
    pub legal_bricks_only: bool,
    pub max_width: i32,
    pub max_depth: i32,
    /// Allow merging across an internal ("") material boundary horizontally
    pub merge_internals_horizontal: bool,
    /// Allow merging across an internal ("") material boundary vertically
    pub merge_internals_vertical: bool,
    /// Ignore material boundaries entirely (host override)
    pub material_inconsistency_override: bool,
    pub material_mode: MaterialMode,
    /// Undrawn interior cells still occlude exposure checks
    pub internal_occlusion: bool,
    /// Seed for random merge order; `None` keeps deterministic spatial order
    pub merge_seed: Option<u64>,
    /// Iteration bound for the sturdiness search; 0 disables it
    pub connect_thresh: usize,
    /// The sturdiness search partitions the z-range into
    /// `model_subdivisions + 1` bands
    pub model_subdivisions: usize,
    /// Consecutive identical (weak, component) results that end the search
    pub consistency_window: usize,
    pub post_merging: bool,
    pub post_hollowing: bool,
    pub post_shrinking: bool,
    /// Radius of the local connectivity subgraph the hollowing oracle checks
    pub hollow_subgraph_radius: i32,
    /// Density below which a freed interior cell is no longer drawn when
    /// the shrink pass re-runs the draw assignment
    pub interior_density_threshold: f32,
}

impl Default for BrickworkConfig {
    fn default() -> Self {
        BrickworkConfig {
            family: BrickFamily::BricksAndPlates,
            z_step: BrickFamily::BricksAndPlates.z_step(),
            legal_bricks_only: true,
            max_width: 8,
            max_depth: 16,
            merge_internals_horizontal: true,
            merge_internals_vertical: true,
            material_inconsistency_override: false,
            material_mode: MaterialMode::Source,
            internal_occlusion: true,
            merge_seed: None,
            connect_thresh: 20,
            model_subdivisions: 1,
            consistency_window: 4,
            post_merging: true,
            post_hollowing: true,
            post_shrinking: true,
            hollow_subgraph_radius: 10,
            interior_density_threshold: 0.0,
        }
    }
}

impl BrickworkConfig {
    /// Shorthand for a family with its natural vertical granularity
    pub fn for_family(family: BrickFamily) -> Self {
        BrickworkConfig {
            family,
            z_step: family.z_step(),
            ..BrickworkConfig::default()
        }
    }

    /// Whether per-cell material gating is active
    pub fn materials_gate_merging(&self) -> bool {
        self.material_mode == MaterialMode::Source && !self.material_inconsistency_override
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> BrickResult<()> {
        if self.z_step != 1 && self.z_step != 3 {
            return Err(BrickError::InvalidConfig {
                field: "z_step".into(),
                value: self.z_step.to_string(),
                reason: "must be 1 or 3".into(),
            });
        }

        if self.z_step != self.family.z_step() {
            return Err(BrickError::InvalidConfig {
                field: "z_step".into(),
                value: self.z_step.to_string(),
                reason: format!(
                    "family {:?} requires z_step {}",
                    self.family,
                    self.family.z_step()
                ),
            });
        }

        if self.max_width < 1 || self.max_depth < 1 {
            return Err(BrickError::InvalidConfig {
                field: "max_width/max_depth".into(),
                value: format!("{}/{}", self.max_width, self.max_depth),
                reason: "caps must be at least 1".into(),
            });
        }

        if self.consistency_window == 0 {
            return Err(BrickError::InvalidConfig {
                field: "consistency_window".into(),
                value: "0".into(),
                reason: "the convergence check needs at least one sample".into(),
            });
        }

        if !(0.0..=1.0).contains(&self.interior_density_threshold) {
            return Err(BrickError::InvalidConfig {
                field: "interior_density_threshold".into(),
                value: self.interior_density_threshold.to_string(),
                reason: "must lie in [0, 1]".into(),
            });
        }

        if self.hollow_subgraph_radius < 1 {
            return Err(BrickError::InvalidConfig {
                field: "hollow_subgraph_radius".into(),
                value: self.hollow_subgraph_radius.to_string(),
                reason: "the hollowing oracle needs a positive radius".into(),
            });
        }

        log::debug!(
            "[BrickworkConfig::validate] family={:?} z_step={} caps={}x{} legal_only={} seed={:?}",
            self.family,
            self.z_step,
            self.max_width,
            self.max_depth,
            self.legal_bricks_only,
            self.merge_seed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BrickworkConfig::default().validate().is_ok());
    }

    #[test]
    fn test_family_z_step_mismatch_rejected() {
        let cfg = BrickworkConfig {
            family: BrickFamily::Bricks,
            z_step: 1,
            ..BrickworkConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(BrickError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_caps_rejected() {
        let cfg = BrickworkConfig {
            max_width: 0,
            ..BrickworkConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_for_family_uses_natural_granularity() {
        let cfg = BrickworkConfig::for_family(BrickFamily::Bricks);
        assert_eq!(cfg.z_step, 3);
        assert!(cfg.validate().is_ok());
    }
}
