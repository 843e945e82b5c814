//! Sturdiness optimization
//!
//! Merging alone can leave a model in several disconnected pieces or hang
//! whole sub-assemblies off a single brick. The optimizer repeatedly tears
//! down the bricks around those flaws and re-merges them under a different
//! randomized growth order, keeping the best arrangement seen. Each
//! iteration is seeded deterministically from the configured merge seed, so
//! the whole search replays bit-for-bit.

use crate::catalog::LegalSizeCatalog;
use crate::config::BrickworkConfig;
use crate::connectivity::{
    build_graph, component_interfaces, connected_components, weak_point_neighbors, weak_points,
};
use crate::error::BrickResult;
use crate::grid::{BrickGrid, CellKey, VolumeBounds};
use crate::merge::engine::LEVEL_SEED_MIX;
use crate::merge::{merge_all, split_bricks, Axis, AxisPriority, MergeDirection};
use glam::IVec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// Outcome of one sturdiness search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SturdinessReport {
    /// Re-merge iterations actually run
    pub iterations: usize,
    /// Connected components in the kept arrangement
    pub components: usize,
    /// Weak points in the kept arrangement
    pub weak_points: usize,
    /// Whether the search stopped on a fully sturdy arrangement rather
    /// than on the iteration bound or the convergence window
    pub converged: bool,
}

/// Global component and weak-point counts for the current arrangement.
pub fn measure(grid: &BrickGrid, cfg: &BrickworkConfig) -> BrickResult<(usize, usize)> {
    let graph = build_graph(grid, cfg.z_step, None)?;
    let components = connected_components(&graph).len();
    let weak = weak_points(&graph).len();
    Ok((components, weak))
}

// Both counts can be zero on degenerate inputs; the half offset keeps the
// ratio finite and still rewards any absolute improvement.
fn count_ratio(new: usize, old: usize) -> f32 {
    (new as f32).max(0.5) / (old as f32).max(0.5)
}

fn is_improvement(new: (usize, usize), best: (usize, usize)) -> bool {
    let component_ratio = count_ratio(new.0, best.0);
    let weak_ratio = count_ratio(new.1, best.1);
    let strictly_no_worse = component_ratio <= 1.0
        && weak_ratio <= 1.0
        && (component_ratio < 1.0 || weak_ratio < 1.0);
    strictly_no_worse || component_ratio * weak_ratio < 0.95
}

/// Bricks worth rebuilding this iteration: every weak point with its side
/// contacts, plus all cross-component seam bricks found by scanning the
/// model in horizontal bands.
fn rebuild_set(grid: &BrickGrid, cfg: &BrickworkConfig) -> BrickResult<BTreeSet<CellKey>> {
    let graph = build_graph(grid, cfg.z_step, None)?;
    let weak = weak_points(&graph);
    let mut rebuild: BTreeSet<CellKey> = weak.iter().copied().collect();
    rebuild.extend(weak_point_neighbors(grid, &weak, cfg.z_step)?);

    let Some(bounds) = grid.bounds() else {
        return Ok(rebuild);
    };
    let bands = cfg.model_subdivisions + 1;
    let extent = bounds.max.z - bounds.min.z + 1;
    let thickness = (extent + bands as i32 - 1) / bands as i32;
    for band in 0..bands as i32 {
        let lo = bounds.min.z + band * thickness;
        let band_bounds = VolumeBounds::new(
            IVec3::new(bounds.min.x, bounds.min.y, lo),
            IVec3::new(bounds.max.x, bounds.max.y, (lo + thickness - 1).min(bounds.max.z)),
        );
        let band_graph = build_graph(grid, cfg.z_step, Some(&band_bounds))?;
        let band_components = connected_components(&band_graph);
        if band_components.len() > 1 {
            rebuild.extend(component_interfaces(grid, &band_components, cfg.z_step)?);
        }
    }
    Ok(rebuild)
}

/// Iteratively rebuild weak regions of the model, keeping the best
/// arrangement found. The grid is left holding that arrangement.
pub fn improve_sturdiness(
    grid: &mut BrickGrid,
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
) -> BrickResult<SturdinessReport> {
    let seed_base = cfg.merge_seed.unwrap_or(0);
    let mut best = measure(grid, cfg)?;
    let mut best_snapshot = grid.snapshot();
    let mut history: Vec<(usize, usize)> = Vec::new();
    let mut iterations = 0;
    let mut converged = best.0 <= 1 && best.1 == 0;

    while !converged && iterations < cfg.connect_thresh {
        let current = measure(grid, cfg)?;
        history.push(current);
        if history.len() >= cfg.consistency_window {
            let window = &history[history.len() - cfg.consistency_window..];
            if window.iter().all(|&r| r == window[0]) {
                log::debug!(
                    "[improve_sturdiness] converged after {} iterations at {:?}",
                    iterations,
                    window[0]
                );
                break;
            }
        }

        let rebuild: Vec<CellKey> = rebuild_set(grid, cfg)?.into_iter().collect();
        if rebuild.is_empty() {
            break;
        }

        grid.reset_attempted_merge();
        let freed = split_bricks(grid, cfg, rebuild)?;

        let iter_seed = seed_base
            .wrapping_add((iterations as u64 + 1).wrapping_mul(LEVEL_SEED_MIX));
        let mut rng = StdRng::seed_from_u64(iter_seed);
        let direction = MergeDirection {
            sign_x: if rng.gen_bool(0.5) { 1 } else { -1 },
            sign_y: if rng.gen_bool(0.5) { 1 } else { -1 },
        };
        let mut axes = [Axis::Height, Axis::Width, Axis::Depth];
        axes.shuffle(&mut rng);
        merge_all(
            grid,
            &freed,
            cfg,
            catalog,
            Some(iter_seed),
            direction,
            AxisPriority(axes),
        )?;
        iterations += 1;

        let result = measure(grid, cfg)?;
        if is_improvement(result, best) {
            log::debug!(
                "[improve_sturdiness] iteration {} improved {:?} -> {:?}",
                iterations,
                best,
                result
            );
            best = result;
            best_snapshot = grid.snapshot();
        }
        if result.0 <= 1 && result.1 == 0 {
            converged = true;
        }
    }

    if !converged {
        grid.restore(best_snapshot);
    }
    let (components, weak) = measure(grid, cfg)?;
    log::info!(
        "[improve_sturdiness] kept arrangement: {} components, {} weak points after {} iterations",
        components,
        weak,
        iterations
    );
    Ok(SturdinessReport {
        iterations,
        components,
        weak_points: weak,
        converged,
    })
}
