//! Growth and shrink primitives for an already-merged grid
//!
//! `attempt_post_merge` extends a parent brick by absorbing whole
//! neighboring bricks along an axis; `attempt_post_shrink` trims rows a
//! parent does not structurally need. Both operate on one parent at a time;
//! the fixed-point drivers live in the postprocess module.

use super::engine::mats_are_mergable;
use crate::catalog::LegalSizeCatalog;
use crate::config::BrickworkConfig;
use crate::error::BrickResult;
use crate::grid::{BrickGrid, BrickSize, CellKey, Parent};
use std::collections::HashSet;

/// Horizontal faces a shrink can trim from
const SHRINK_FACES: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Debug, Clone)]
struct GrowthCandidate {
    corner: CellKey,
    size: BrickSize,
    absorbed: Vec<CellKey>,
}

/// Horizontal growth is weighted more heavily than vertical, for stability
fn growth_score(size: BrickSize) -> f32 {
    size.w as f32 * size.d as f32 * 1.5 * size.h as f32
}

/// Try to grow one parent brick by absorbing whole neighboring bricks.
///
/// Each growth axis absorbs the run of adjacent bricks whose cross-section
/// matches exactly, one brick at a time, while the accumulated size stays
/// legal and inside the family caps. Among every reachable size (including
/// the unmodified original) the best `growth_score` wins.
///
/// Returns whether growth occurred and the owner keys of the absorbed
/// (now-dead) bricks.
pub fn attempt_post_merge(
    grid: &mut BrickGrid,
    key: CellKey,
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
) -> BrickResult<(bool, Vec<CellKey>)> {
    let origin = match grid.get(key) {
        Some(c) if c.draw && c.parent.is_owner() => c.clone(),
        _ => return Ok((false, Vec::new())),
    };
    let Some(size) = origin.parent.size() else {
        return Ok((false, Vec::new()));
    };

    let mut candidates = vec![GrowthCandidate {
        corner: key,
        size,
        absorbed: Vec::new(),
    }];

    // Horizontal growth in all four directions; vertical growth only for
    // families that produce both height classes (three absorbed plates make
    // a brick).
    let mut axes: Vec<(i32, i32, i32)> = vec![(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0)];
    if cfg.family.mixed_heights() {
        axes.push((0, 0, 1));
    }
    let max_height = cfg.family.heights().iter().copied().max().unwrap_or(cfg.z_step);

    for (ax, ay, az) in axes {
        let mut corner = key;
        let mut cur = size;
        let mut absorbed: Vec<CellKey> = Vec::new();
        loop {
            let probe = if ax > 0 {
                corner.offset(cur.w, 0, 0)
            } else if ax < 0 {
                corner.offset(-1, 0, 0)
            } else if ay > 0 {
                corner.offset(0, cur.d, 0)
            } else if ay < 0 {
                corner.offset(0, -1, 0)
            } else {
                corner.offset(0, 0, cur.h)
            };
            let Some(nb_key) = grid.parent_of(probe)? else {
                break;
            };
            let Some(nb) = grid.get(nb_key) else {
                break;
            };
            let Some(nb_size) = nb.parent.size() else {
                break;
            };
            if !nb.draw || nb_key == key {
                break;
            }

            // The absorbed brick must line up exactly on the two non-growth
            // axes
            let aligned = if az != 0 {
                nb_key.x() == corner.x()
                    && nb_key.y() == corner.y()
                    && nb_key.z() == corner.z() + cur.h
                    && nb_size.w == cur.w
                    && nb_size.d == cur.d
            } else if ax != 0 {
                nb_key.y() == corner.y()
                    && nb_key.z() == corner.z()
                    && nb_size.d == cur.d
                    && nb_size.h == cur.h
                    && if ax > 0 {
                        nb_key.x() == corner.x() + cur.w
                    } else {
                        nb_key.x() + nb_size.w == corner.x()
                    }
            } else {
                nb_key.x() == corner.x()
                    && nb_key.z() == corner.z()
                    && nb_size.w == cur.w
                    && nb_size.h == cur.h
                    && if ay > 0 {
                        nb_key.y() == corner.y() + cur.d
                    } else {
                        nb_key.y() + nb_size.d == corner.y()
                    }
            };
            if !aligned {
                break;
            }

            let internal_ok = if az != 0 {
                cfg.merge_internals_vertical
            } else {
                cfg.merge_internals_horizontal
            };
            if !mats_are_mergable(cfg, &origin, nb, internal_ok) {
                break;
            }

            let grown = BrickSize::new(
                cur.w + if ax != 0 { nb_size.w } else { 0 },
                cur.d + if ay != 0 { nb_size.d } else { 0 },
                cur.h + if az != 0 { nb_size.h } else { 0 },
            );
            if grown.w > cfg.max_width || grown.d > cfg.max_depth || grown.h > max_height {
                break;
            }

            let grown_corner = if ax < 0 {
                corner.offset(-nb_size.w, 0, 0)
            } else if ay < 0 {
                corner.offset(0, -nb_size.d, 0)
            } else {
                corner
            };

            absorbed.push(nb_key);
            corner = grown_corner;
            cur = grown;

            // An illegal intermediate is not committable, but further
            // absorption along the run may reach a legal size again
            let ty = cfg.family.brick_type_for_height(cur.h);
            if !cfg.legal_bricks_only || catalog.is_legal(cur, ty) {
                candidates.push(GrowthCandidate {
                    corner,
                    size: cur,
                    absorbed: absorbed.clone(),
                });
            }
        }
    }

    let mut best = 0usize;
    for (i, cand) in candidates.iter().enumerate() {
        if growth_score(cand.size) > growth_score(candidates[best].size) {
            best = i;
        }
    }
    if best == 0 {
        return Ok((false, Vec::new()));
    }
    let winner = candidates.swap_remove(best);

    for covered in BrickGrid::cells_in_footprint(winner.corner, winner.size, cfg.z_step) {
        if let Some(cell) = grid.get_mut(covered) {
            cell.parent = Parent::MemberOf(winner.corner);
            cell.brick_type = cfg.family.brick_type_for_height(winner.size.h);
            cell.top_exposed = None;
            cell.bot_exposed = None;
        }
    }
    if let Some(owner) = grid.get_mut(winner.corner) {
        owner.parent = Parent::Owner(winner.size);
    }
    log::debug!(
        "[attempt_post_merge] {} grew to {} absorbing {} bricks",
        key,
        winner.size,
        winner.absorbed.len()
    );
    Ok((true, winner.absorbed))
}

/// Try to trim unnecessary rows from a parent brick.
///
/// Scanning inward from each of the four horizontal faces, a row may go
/// only if every cell in it is off the visible shell and has no exposed
/// face in the trim direction. The smallest legal trimmed size by volume
/// wins (including "no trim"). Freed cells are reset to unassigned and
/// their draw flag re-derived from the density threshold so hollowing can
/// pick them up later.
///
/// Returns whether a trim occurred and the freed cell keys.
pub fn attempt_post_shrink(
    grid: &mut BrickGrid,
    key: CellKey,
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
) -> BrickResult<(bool, Vec<CellKey>)> {
    let origin = match grid.get(key) {
        Some(c) if c.draw && c.parent.is_owner() => c.clone(),
        _ => return Ok((false, Vec::new())),
    };
    let Some(size) = origin.parent.size() else {
        return Ok((false, Vec::new()));
    };

    // Consecutive trimmable rows inward from each face, in SHRINK_FACES
    // order
    let mut limits = [0i32; 4];
    for (face, &(fx, fy)) in SHRINK_FACES.iter().enumerate() {
        let max_rows = if fx != 0 { size.w - 1 } else { size.d - 1 };
        for t in 0..max_rows {
            if row_trimmable(grid, key, size, cfg, fx, fy, t) {
                limits[face] = t + 1;
            } else {
                break;
            }
        }
    }
    if limits.iter().all(|&l| l == 0) {
        return Ok((false, Vec::new()));
    }

    let mut best_size = size;
    let mut best_trims = [0i32; 4];
    for tx_neg in 0..=limits[0] {
        for tx_pos in 0..=limits[1] {
            let new_w = size.w - tx_neg - tx_pos;
            if new_w < 1 {
                continue;
            }
            for ty_neg in 0..=limits[2] {
                for ty_pos in 0..=limits[3] {
                    let new_d = size.d - ty_neg - ty_pos;
                    if new_d < 1 {
                        continue;
                    }
                    let trimmed = BrickSize::new(new_w, new_d, size.h);
                    if cfg.legal_bricks_only && !catalog.is_legal(trimmed, origin.brick_type) {
                        continue;
                    }
                    if trimmed.volume() < best_size.volume() {
                        best_size = trimmed;
                        best_trims = [tx_neg, tx_pos, ty_neg, ty_pos];
                    }
                }
            }
        }
    }
    if best_size == size {
        return Ok((false, Vec::new()));
    }

    let new_corner = key.offset(best_trims[0], best_trims[2], 0);
    let kept: HashSet<CellKey> =
        BrickGrid::cells_in_footprint(new_corner, best_size, cfg.z_step)
            .into_iter()
            .collect();
    let mut freed = Vec::new();
    for covered in BrickGrid::cells_in_footprint(key, size, cfg.z_step) {
        if kept.contains(&covered) {
            if let Some(cell) = grid.get_mut(covered) {
                cell.parent = Parent::MemberOf(new_corner);
            }
        } else if let Some(cell) = grid.get_mut(covered) {
            cell.parent = Parent::Unassigned;
            cell.attempted_merge = false;
            cell.top_exposed = None;
            cell.bot_exposed = None;
            cell.draw =
                cell.on_shell() || (cell.val > 0.0 && cell.val >= cfg.interior_density_threshold);
            freed.push(covered);
        }
    }
    if let Some(owner) = grid.get_mut(new_corner) {
        owner.parent = Parent::Owner(best_size);
    }
    log::debug!(
        "[attempt_post_shrink] {} shrank {} -> {}",
        key,
        size,
        best_size
    );
    freed.sort();
    Ok((true, freed))
}

/// A row is trimmable when every cell in it is off the shell and, for the
/// outermost row, the face it would expose is already covered by drawn
/// neighbors.
fn row_trimmable(
    grid: &BrickGrid,
    corner: CellKey,
    size: BrickSize,
    cfg: &BrickworkConfig,
    fx: i32,
    fy: i32,
    t: i32,
) -> bool {
    let (row_len, layers) = (if fx != 0 { size.d } else { size.w }, size.h);
    let mut dz = 0;
    while dz < layers {
        for i in 0..row_len {
            let (dx, dy) = if fx != 0 {
                (if fx < 0 { t } else { size.w - 1 - t }, i)
            } else {
                (i, if fy < 0 { t } else { size.d - 1 - t })
            };
            let cell_key = corner.offset(dx, dy, dz);
            let Some(cell) = grid.get(cell_key) else {
                return false;
            };
            if cell.on_shell() {
                return false;
            }
            if t == 0 {
                // Outermost row: the face in the trim direction must not be
                // exposed in the current grid state
                let outward = cell_key.offset(fx, fy, 0);
                let covered = grid
                    .get(outward)
                    .map(|c| c.draw || (cfg.internal_occlusion && c.val > 0.0))
                    .unwrap_or(false);
                if !covered {
                    return false;
                }
            }
        }
        dz += cfg.z_step;
    }
    true
}
