//! Per-cell data for the brick lattice
//!
//! One `BrickCell` exists per lattice point inside the voxelized volume. The
//! external voxelizer creates cells in bulk with `parent = Unassigned`; the
//! merge engine then assigns footprints by turning one cell of each brick
//! into an `Owner` and pointing every other covered cell at it. The
//! `Parent` enum replaces the original tri-state sentinel so the one-hop
//! parent invariant is enforced by the type system.

use super::key::CellKey;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Footprint of a brick in lattice units: width (x), depth (y), height (z,
/// in plate units).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrickSize {
    pub w: i32,
    pub d: i32,
    pub h: i32,
}

impl BrickSize {
    pub fn new(w: i32, d: i32, h: i32) -> Self {
        BrickSize { w, d, h }
    }

    /// The 1x1 footprint at the given height class
    pub fn unit(h: i32) -> Self {
        BrickSize { w: 1, d: 1, h }
    }

    pub fn volume(self) -> i32 {
        self.w * self.d * self.h
    }

    /// Footprint normalized so the shorter horizontal extent comes first
    pub fn normalized_footprint(self) -> (i32, i32) {
        (self.w.min(self.d), self.w.max(self.d))
    }
}

impl fmt::Debug for BrickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{}]", self.w, self.d, self.h)
    }
}

impl fmt::Display for BrickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.w, self.d, self.h)
    }
}

/// Brick family tag for one cell; determines the legal size set and the
/// downstream geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrickType {
    Brick,
    Plate,
    Slope,
    Tile,
    Round,
    Custom,
}

impl BrickType {
    /// Whether a brick of this type sitting on top of another hides that
    /// brick's top surface.
    pub fn hides_below(self) -> bool {
        match self {
            BrickType::Brick | BrickType::Plate | BrickType::Slope | BrickType::Tile => true,
            BrickType::Round | BrickType::Custom => false,
        }
    }

    /// Whether a brick of this type hides the bottom surface of the brick
    /// above it. Slopes have an angled top and never fully occlude upward.
    pub fn hides_above(self) -> bool {
        match self {
            BrickType::Brick | BrickType::Plate | BrickType::Tile => true,
            BrickType::Slope | BrickType::Round | BrickType::Custom => false,
        }
    }
}

impl fmt::Display for BrickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrickType::Brick => "BRICK",
            BrickType::Plate => "PLATE",
            BrickType::Slope => "SLOPE",
            BrickType::Tile => "TILE",
            BrickType::Round => "ROUND",
            BrickType::Custom => "CUSTOM",
        };
        write!(f, "{}", name)
    }
}

/// Family the whole conversion runs under. Controls the vertical granularity
/// (`z_step`), which committed heights the merge engine may probe, and the
/// per-cell `BrickType` applied at each height class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrickFamily {
    Bricks,
    Plates,
    BricksAndPlates,
    Slopes,
    Tiles,
    Rounds,
    Custom,
}

impl BrickFamily {
    /// Natural vertical lattice granularity for the family
    pub fn z_step(self) -> i32 {
        match self {
            BrickFamily::Bricks | BrickFamily::Slopes | BrickFamily::Custom => 3,
            BrickFamily::Plates
            | BrickFamily::BricksAndPlates
            | BrickFamily::Tiles
            | BrickFamily::Rounds => 1,
        }
    }

    /// Committed brick heights the merge engine probes, most preferred first
    pub fn heights(self) -> &'static [i32] {
        match self {
            BrickFamily::Bricks | BrickFamily::Slopes | BrickFamily::Custom => &[3],
            BrickFamily::BricksAndPlates => &[3, 1],
            BrickFamily::Plates | BrickFamily::Tiles | BrickFamily::Rounds => &[1],
        }
    }

    /// True when the family produces both 1-tall and 3-tall bricks
    pub fn mixed_heights(self) -> bool {
        matches!(self, BrickFamily::BricksAndPlates)
    }

    /// Cell type a committed brick of the given height carries
    pub fn brick_type_for_height(self, h: i32) -> BrickType {
        match self {
            BrickFamily::Bricks => BrickType::Brick,
            BrickFamily::Plates => BrickType::Plate,
            BrickFamily::BricksAndPlates => {
                if h >= 3 {
                    BrickType::Brick
                } else {
                    BrickType::Plate
                }
            }
            BrickFamily::Slopes => BrickType::Slope,
            BrickFamily::Tiles => BrickType::Tile,
            BrickFamily::Rounds => BrickType::Round,
            BrickFamily::Custom => BrickType::Custom,
        }
    }
}

/// Parent assignment of a cell. `Owner` carries the footprint size; a
/// `MemberOf` pointer must land on an `Owner` cell (one hop, never a chain).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Parent {
    Unassigned,
    Owner(BrickSize),
    MemberOf(CellKey),
}

impl Parent {
    pub fn is_owner(&self) -> bool {
        matches!(self, Parent::Owner(_))
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Parent::Unassigned)
    }

    pub fn size(&self) -> Option<BrickSize> {
        match self {
            Parent::Owner(s) => Some(*s),
            _ => None,
        }
    }
}

/// One lattice cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickCell {
    /// Lattice position (redundant with the map key, kept for convenience)
    pub loc: CellKey,
    /// Density in [0,1]: 0 = outside, 1 = on the shell, fractional = interior
    pub val: f32,
    /// Whether this cell currently participates in a visible brick
    pub draw: bool,
    pub parent: Parent,
    pub brick_type: BrickType,
    pub flipped: bool,
    pub rotated: bool,
    /// Material identifier; empty string means internal/unassigned
    pub mat_name: String,
    /// True when the material was manually overridden by the host
    pub custom_mat: bool,
    pub top_exposed: Option<bool>,
    pub bot_exposed: Option<bool>,
    /// Considered by the current merge pass
    pub attempted_merge: bool,
    /// Transient flag scoped to one merge invocation
    pub available_for_merge: bool,
    /// Source-surface face index from the voxelizer, when near the shell
    pub near_face: Option<usize>,
    pub near_intersection: Option<Vec3>,
    pub near_normal: Option<Vec3>,
    /// Originating cell when this cell was synthesized during a
    /// height-class change
    pub created_from: Option<CellKey>,
}

impl BrickCell {
    /// Fresh unassigned cell, as the external voxelizer would create it
    pub fn new(loc: CellKey, val: f32, draw: bool) -> Self {
        BrickCell {
            loc,
            val,
            draw,
            parent: Parent::Unassigned,
            brick_type: BrickType::Brick,
            flipped: false,
            rotated: false,
            mat_name: String::new(),
            custom_mat: false,
            top_exposed: None,
            bot_exposed: None,
            attempted_merge: false,
            available_for_merge: false,
            near_face: None,
            near_intersection: None,
            near_normal: None,
            created_from: None,
        }
    }

    pub fn with_material(mut self, mat: &str) -> Self {
        self.mat_name = mat.to_string();
        self
    }

    /// On the shell of the source volume
    pub fn on_shell(&self) -> bool {
        (self.val - 1.0).abs() < f32::EPSILON
    }

    /// Strictly interior: inside the volume but not on the shell
    pub fn interior(&self) -> bool {
        self.val > 0.0 && !self.on_shell()
    }
}
