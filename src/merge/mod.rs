//! Merge engine
//!
//! Fuses adjacent unit cells into larger legal brick footprints
//! ([`attempt_merge`], [`merge_all`]), splits them back to unit bricks for
//! the sturdiness search ([`split_bricks`]), and refines already-merged
//! parents through whole-brick growth ([`attempt_post_merge`]) and
//! face-inward shrinking ([`attempt_post_shrink`]).

pub(crate) mod engine;
mod post;

pub use engine::{
    attempt_merge, brick_available, mats_are_mergable, merge_all, split_bricks, Axis,
    AxisPriority, MergeDirection,
};
pub use post::{attempt_post_merge, attempt_post_shrink};
