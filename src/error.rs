//! Error handling for brickforge
//!
//! Configuration errors (an empty legal-size set, an unresolvable parent
//! pointer, a bad config bundle) are fatal: they indicate a logic bug in the
//! catalog or caller setup, not a runtime data problem. Missing neighbors in
//! the sparse lattice are never errors; they surface as `None` at the grid
//! API and are handled locally.

use crate::grid::{BrickType, CellKey};

/// Crate-wide result type
pub type BrickResult<T> = Result<T, BrickError>;

/// Main error type for brickforge
#[derive(Debug, thiserror::Error)]
pub enum BrickError {
    /// The legal-size catalog has no entries for a brick type and height
    /// class that the merge engine was asked to use.
    #[error("no legal brick sizes registered for {brick_type} at height class {height_class}")]
    EmptyLegalSizeSet {
        brick_type: BrickType,
        height_class: i32,
    },

    /// Not even the unit footprint survived the legality filter for a cell,
    /// which would leave that cell permanently unassigned.
    #[error("no legal merge candidate for cell {key} of type {brick_type}")]
    NoLegalCandidate { key: CellKey, brick_type: BrickType },

    /// A child cell's parent pointer does not land on an owner cell. The
    /// one-hop parent invariant is broken.
    #[error("cell {child} points at {target}, which is not an owner cell")]
    UnresolvedParent { child: CellKey, target: CellKey },

    /// A configuration bundle failed validation.
    #[error("invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
}
