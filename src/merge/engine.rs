//! Greedy/random fusion of unit cells into larger brick footprints
//!
//! `attempt_merge` probes outward from one seed cell, accumulating every
//! footprint reachable by monotonically growing each axis while all
//! intermediate cells stay available, then commits the best legal candidate.
//! `merge_all` drives it over a target set, z-level by z-level, in spatial
//! or seeded-shuffle order. `split_bricks` is the inverse: it resets merged
//! footprints back to unit bricks so the sturdiness search can rework a
//! region with a different seed and growth direction.

use crate::catalog::LegalSizeCatalog;
use crate::config::BrickworkConfig;
use crate::error::{BrickError, BrickResult};
use crate::grid::{BrickCell, BrickGrid, BrickSize, BrickType, CellKey, Parent};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};

/// Per-level shuffle seeds are decorrelated with this multiplier
pub(crate) const LEVEL_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Growth axes of a merge probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Depth,
    Height,
}

/// Horizontal growth direction signs, varied between optimizer iterations
/// so repeated re-merges do not systematically favor one corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDirection {
    pub sign_x: i32,
    pub sign_y: i32,
}

impl Default for MergeDirection {
    fn default() -> Self {
        MergeDirection {
            sign_x: 1,
            sign_y: 1,
        }
    }
}

/// Candidate ordering: sizes are compared by their components in this axis
/// order, each descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPriority(pub [Axis; 3]);

impl Default for AxisPriority {
    fn default() -> Self {
        AxisPriority([Axis::Height, Axis::Width, Axis::Depth])
    }
}

fn axis_component(size: BrickSize, axis: Axis) -> i32 {
    match axis {
        Axis::Width => size.w,
        Axis::Depth => size.d,
        Axis::Height => size.h,
    }
}

/// Whether two cells' materials allow them to share a brick.
///
/// Same material always merges. The internal ("") material merges across a
/// boundary when internal merging is permitted for the probed axis. A
/// manual material override pins the cell and blocks cross-material merges.
/// Gating is skipped entirely when the material mode disables it.
pub fn mats_are_mergable(cfg: &BrickworkConfig, a: &BrickCell, b: &BrickCell, internal_ok: bool) -> bool {
    if !cfg.materials_gate_merging() {
        return true;
    }
    if a.mat_name == b.mat_name {
        return true;
    }
    if a.custom_mat || b.custom_mat {
        return false;
    }
    internal_ok && (a.mat_name.is_empty() || b.mat_name.is_empty())
}

/// Whether a candidate cell may be absorbed into the brick growing from
/// `origin`: drawn, not yet attempted, marked available for this merge
/// invocation, and material-compatible.
pub fn brick_available(
    grid: &BrickGrid,
    key: CellKey,
    origin: &BrickCell,
    cfg: &BrickworkConfig,
    internal_ok: bool,
) -> bool {
    match grid.get(key) {
        Some(cell) => {
            cell.draw
                && !cell.attempted_merge
                && cell.available_for_merge
                && mats_are_mergable(cfg, origin, cell, internal_ok)
        }
        None => false,
    }
}

/// Every vertical layer of one footprint column must be available for the
/// column to participate in a brick of height `h`.
fn column_available(
    grid: &BrickGrid,
    origin: &BrickCell,
    seed: CellKey,
    direction: MergeDirection,
    dx: i32,
    dy: i32,
    h: i32,
    cfg: &BrickworkConfig,
) -> bool {
    let mut dz = 0;
    while dz < h {
        let key = seed.offset(direction.sign_x * dx, direction.sign_y * dy, dz);
        let internal_ok = if dz > 0 {
            cfg.merge_internals_vertical
        } else {
            cfg.merge_internals_horizontal
        };
        if !brick_available(grid, key, origin, cfg, internal_ok) {
            return false;
        }
        dz += cfg.z_step;
    }
    true
}

/// Probe outward from one seed cell and commit the best legal footprint.
///
/// Candidates are every size reachable by monotone growth of width and
/// depth (and height, for families that mix 1-tall and 3-tall classes),
/// filtered to legal sizes, then ordered by total volume when
/// `prefer_largest` is set (ambiguous interior cells) or by the supplied
/// axis priority otherwise. The committed parent is relocated to the
/// most-negative corner of the possibly negative-signed footprint.
///
/// Returns `Ok(None)` when the seed is absent, undrawn, already attempted,
/// or not marked available. Failing to find even one legal candidate is a
/// fatal configuration error.
pub fn attempt_merge(
    grid: &mut BrickGrid,
    key: CellKey,
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
    prefer_largest: bool,
    direction: MergeDirection,
    priority: AxisPriority,
) -> BrickResult<Option<BrickSize>> {
    let origin = match grid.get(key) {
        Some(c) if c.draw && !c.attempted_merge && c.available_for_merge => c.clone(),
        _ => return Ok(None),
    };

    let mut candidates: Vec<BrickSize> = Vec::new();
    for &h in cfg.family.heights() {
        let mut depth_cap = cfg.max_depth;
        for w in 1..=cfg.max_width {
            let mut reach = 0;
            for d in 1..=depth_cap {
                if column_available(grid, &origin, key, direction, w - 1, d - 1, h, cfg) {
                    reach = d;
                } else {
                    break;
                }
            }
            depth_cap = reach;
            if depth_cap == 0 {
                break;
            }
            for d in 1..=depth_cap {
                candidates.push(BrickSize::new(w, d, h));
            }
        }
    }

    let mut legal: Vec<BrickSize> = Vec::new();
    for size in candidates {
        if cfg.legal_bricks_only {
            let ty = cfg.family.brick_type_for_height(size.h);
            catalog.legal_sizes_for(ty, size.h)?;
            if !catalog.is_legal(size, ty) {
                continue;
            }
        }
        legal.push(size);
    }

    if prefer_largest {
        legal.sort_by(|a, b| b.volume().cmp(&a.volume()));
    } else {
        legal.sort_by(|a, b| {
            let ka = priority.0.map(|axis| axis_component(*a, axis));
            let kb = priority.0.map(|axis| axis_component(*b, axis));
            kb.cmp(&ka)
        });
    }

    let Some(&size) = legal.first() else {
        // Leaving a drawn cell permanently unassigned is never acceptable
        return Err(BrickError::NoLegalCandidate {
            key,
            brick_type: cfg.family.brick_type_for_height(cfg.z_step),
        });
    };

    let corner = CellKey::new(
        if direction.sign_x < 0 {
            key.x() - (size.w - 1)
        } else {
            key.x()
        },
        if direction.sign_y < 0 {
            key.y() - (size.d - 1)
        } else {
            key.y()
        },
        key.z(),
    );
    commit_brick(grid, corner, size, &origin, cfg);
    Ok(Some(size))
}

/// Write a committed footprint into the grid: the corner cell becomes the
/// owner, every other covered cell points at it, and type/orientation
/// propagate from the seed. A height-class transition can require a
/// supporting cell the voxelizer never created; such cells are synthesized
/// from the seed's provenance and tagged with `created_from`.
pub(crate) fn commit_brick(
    grid: &mut BrickGrid,
    corner: CellKey,
    size: BrickSize,
    origin: &BrickCell,
    cfg: &BrickworkConfig,
) {
    let ty = cfg.family.brick_type_for_height(size.h);
    let rotated = if ty == BrickType::Slope {
        size.d > size.w
    } else {
        origin.rotated
    };
    for covered in BrickGrid::cells_in_footprint(corner, size, cfg.z_step) {
        if !grid.contains(covered) {
            let mut cell = BrickCell::new(covered, origin.val, true);
            cell.mat_name = origin.mat_name.clone();
            cell.near_face = origin.near_face;
            cell.near_intersection = origin.near_intersection;
            cell.near_normal = origin.near_normal;
            cell.created_from = Some(origin.loc);
            grid.insert(cell);
        }
        if let Some(cell) = grid.get_mut(covered) {
            cell.draw = true;
            cell.parent = Parent::MemberOf(corner);
            cell.brick_type = ty;
            cell.flipped = origin.flipped;
            cell.rotated = rotated;
            cell.attempted_merge = true;
            cell.available_for_merge = false;
        }
    }
    if let Some(owner) = grid.get_mut(corner) {
        owner.parent = Parent::Owner(size);
    }
}

/// Drive `attempt_merge` over a target set.
///
/// Levels run from lowest z to highest. For families that mix 1-tall and
/// 3-tall bricks the levels are swept twice: the first sweep visits every
/// third level so 3-tall candidates get first claim, the second sweep picks
/// up the remainder. Within a level, keys keep their deterministic spatial
/// order unless a seed requests a shuffled (random merge) order. Cells
/// already attempted or owned by another parent are skipped. An empty
/// target set is a no-op.
///
/// Returns the number of bricks committed.
pub fn merge_all(
    grid: &mut BrickGrid,
    targets: &[CellKey],
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
    seed: Option<u64>,
    direction: MergeDirection,
    priority: AxisPriority,
) -> BrickResult<usize> {
    if targets.is_empty() {
        return Ok(0);
    }

    for &k in targets {
        if let Some(cell) = grid.get_mut(k) {
            if cell.draw {
                cell.available_for_merge = true;
            }
        }
    }

    let mut levels: BTreeMap<i32, Vec<CellKey>> = BTreeMap::new();
    for &k in targets {
        levels.entry(k.z()).or_default().push(k);
    }
    for keys in levels.values_mut() {
        keys.sort();
    }
    let Some(&z_min) = levels.keys().next() else {
        return Ok(0);
    };

    let all_levels: Vec<i32> = levels.keys().copied().collect();
    let sweeps: Vec<Vec<i32>> = if cfg.family.mixed_heights() {
        let tall_first: Vec<i32> = all_levels
            .iter()
            .copied()
            .filter(|z| (z - z_min).rem_euclid(3) == 0)
            .collect();
        vec![tall_first, all_levels]
    } else {
        vec![all_levels]
    };

    let mut committed = 0usize;
    for sweep in sweeps {
        for z in sweep {
            let Some(level_keys) = levels.get(&z) else {
                continue;
            };
            let mut keys = level_keys.clone();
            if let Some(s) = seed {
                let level_seed = s ^ (z as i64 as u64).wrapping_mul(LEVEL_SEED_MIX);
                keys.shuffle(&mut StdRng::seed_from_u64(level_seed));
            }
            for key in keys {
                let Some(cell) = grid.get(key) else {
                    continue;
                };
                if !cell.draw
                    || cell.attempted_merge
                    || matches!(cell.parent, Parent::MemberOf(_))
                {
                    continue;
                }
                // Fractional interior cells are ambiguous; let them grab the
                // largest reachable footprint instead of the priority order
                let prefer_largest = cell.interior();
                if attempt_merge(grid, key, cfg, catalog, prefer_largest, direction, priority)?
                    .is_some()
                {
                    committed += 1;
                }
            }
        }
    }

    for &k in targets {
        if let Some(cell) = grid.get_mut(k) {
            cell.available_for_merge = false;
        }
    }

    log::debug!(
        "[merge_all] committed {} bricks over {} target cells",
        committed,
        targets.len()
    );
    Ok(committed)
}

/// Reset every brick touching `keys` back to unit bricks.
///
/// Each covered cell becomes its own 1x1 owner at the family's vertical
/// granularity with `attempted_merge` cleared, ready for a re-merge pass.
/// Returns the full set of freed cell keys in deterministic order.
pub fn split_bricks(
    grid: &mut BrickGrid,
    cfg: &BrickworkConfig,
    keys: impl IntoIterator<Item = CellKey>,
) -> BrickResult<Vec<CellKey>> {
    let mut owners: BTreeSet<CellKey> = BTreeSet::new();
    for key in keys {
        if let Some(owner) = grid.parent_of(key)? {
            owners.insert(owner);
        }
    }

    let unit = BrickSize::unit(cfg.z_step);
    let unit_type = cfg.family.brick_type_for_height(cfg.z_step);
    let mut freed: Vec<CellKey> = Vec::new();
    for owner_key in owners {
        let Some(size) = grid.get(owner_key).and_then(|c| c.parent.size()) else {
            continue;
        };
        for covered in BrickGrid::cells_in_footprint(owner_key, size, cfg.z_step) {
            if let Some(cell) = grid.get_mut(covered) {
                cell.parent = Parent::Owner(unit);
                cell.brick_type = unit_type;
                cell.attempted_merge = false;
                freed.push(covered);
            }
        }
    }
    freed.sort();
    freed.dedup();
    Ok(freed)
}
