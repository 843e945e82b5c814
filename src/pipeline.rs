//! Conversion pipeline
//!
//! `build_bricks` runs the full voxel-to-brick conversion over a populated
//! grid: initial merge, exposure annotation, the sturdiness search, then
//! the configured post passes, finishing with a final exposure and
//! connectivity measurement. The returned stats summarize what each stage
//! did.

use crate::catalog::LegalSizeCatalog;
use crate::config::BrickworkConfig;
use crate::error::BrickResult;
use crate::exposure::set_all_exposures;
use crate::grid::BrickGrid;
use crate::merge::{merge_all, AxisPriority, MergeDirection};
use crate::postprocess::{post_hollow, run_post_merge, run_post_shrink};
use crate::sturdiness::{improve_sturdiness, measure};
use serde::{Deserialize, Serialize};

/// Summary of one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickStats {
    /// Populated cells at the start
    pub cells: usize,
    /// Bricks committed by the initial merge
    pub bricks_merged: usize,
    /// Re-merge iterations the sturdiness search ran
    pub sturdiness_iterations: usize,
    /// Growth commits in the post-merge pass
    pub bricks_grown: usize,
    /// Interior bricks removed by hollowing
    pub bricks_hollowed: usize,
    /// Shrink commits in the post-shrink pass
    pub bricks_shrunk: usize,
    /// Drawn bricks in the final arrangement
    pub final_bricks: usize,
    /// Connected components in the final arrangement
    pub components: usize,
    /// Weak points in the final arrangement
    pub weak_points: usize,
}

/// Convert a populated voxel grid into a brick arrangement in place.
pub fn build_bricks(
    grid: &mut BrickGrid,
    cfg: &BrickworkConfig,
    catalog: &LegalSizeCatalog,
) -> BrickResult<BrickStats> {
    cfg.validate()?;
    let cells = grid.len();
    let targets = grid.drawn_keys_sorted();
    log::info!(
        "[build_bricks] converting {} cells ({} drawn), family {:?}",
        cells,
        targets.len(),
        cfg.family
    );

    let bricks_merged = merge_all(
        grid,
        &targets,
        cfg,
        catalog,
        cfg.merge_seed,
        MergeDirection::default(),
        AxisPriority::default(),
    )?;
    set_all_exposures(grid, cfg)?;

    let mut sturdiness_iterations = 0;
    if cfg.connect_thresh > 0 && !targets.is_empty() {
        let report = improve_sturdiness(grid, cfg, catalog)?;
        sturdiness_iterations = report.iterations;
    }

    let bricks_grown = if cfg.post_merging {
        run_post_merge(grid, cfg, catalog)?
    } else {
        0
    };
    let bricks_hollowed = if cfg.post_hollowing {
        post_hollow(grid, cfg)?
    } else {
        0
    };
    let bricks_shrunk = if cfg.post_shrinking {
        run_post_shrink(grid, cfg, catalog)?
    } else {
        0
    };

    set_all_exposures(grid, cfg)?;
    let (components, weak_points) = measure(grid, cfg)?;
    let final_bricks = grid.parent_keys_sorted().len();

    let stats = BrickStats {
        cells,
        bricks_merged,
        sturdiness_iterations,
        bricks_grown,
        bricks_hollowed,
        bricks_shrunk,
        final_bricks,
        components,
        weak_points,
    };
    log::info!(
        "[build_bricks] {} cells -> {} bricks ({} components, {} weak points)",
        cells,
        final_bricks,
        components,
        weak_points
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BrickCell, BrickFamily, BrickSize, BrickType, CellKey};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn solid_block(w: i32, d: i32, h: i32) -> BrickGrid {
        let mut cells = Vec::new();
        for z in 0..h {
            for y in 0..d {
                for x in 0..w {
                    cells.push(BrickCell::new(CellKey::new(x, y, z), 1.0, true));
                }
            }
        }
        BrickGrid::from_cells(cells)
    }

    #[test]
    fn test_solid_block_becomes_one_brick() {
        init_logs();
        let mut cfg = BrickworkConfig::for_family(BrickFamily::BricksAndPlates);
        cfg.max_width = 4;
        cfg.max_depth = 4;
        let catalog = LegalSizeCatalog::default();
        let mut grid = solid_block(4, 4, 3);

        let stats = build_bricks(&mut grid, &cfg, &catalog).expect("conversion");
        assert_eq!(stats.cells, 48);
        assert_eq!(stats.bricks_merged, 1);
        assert_eq!(stats.final_bricks, 1);
        assert_eq!(stats.components, 1);
        assert_eq!(stats.weak_points, 0);

        let owner = grid.parent_keys_sorted()[0];
        let cell = grid.get(owner).expect("owner");
        assert_eq!(cell.parent.size(), Some(BrickSize::new(4, 4, 3)));
        assert_eq!(cell.brick_type, BrickType::Brick);
        assert_eq!(cell.top_exposed, Some(true));
        assert_eq!(cell.bot_exposed, Some(true));
    }

    #[test]
    fn test_brick_column_stays_connected() {
        init_logs();
        // Brick lattice: one cell per three plate heights
        let cfg = BrickworkConfig::for_family(BrickFamily::Bricks);
        let catalog = LegalSizeCatalog::default();
        let mut grid = BrickGrid::from_cells(vec![
            BrickCell::new(CellKey::new(0, 0, 0), 1.0, true),
            BrickCell::new(CellKey::new(0, 0, 3), 1.0, true),
        ]);

        let stats = build_bricks(&mut grid, &cfg, &catalog).expect("conversion");
        assert_eq!(stats.bricks_merged, 2);
        assert_eq!(stats.final_bricks, 2);
        assert_eq!(stats.components, 1);
        assert_eq!(stats.weak_points, 0);
        for key in grid.parent_keys_sorted() {
            let cell = grid.get(key).expect("owner");
            assert_eq!(cell.parent.size(), Some(BrickSize::new(1, 1, 3)));
            assert_eq!(cell.brick_type, BrickType::Brick);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let cfg = BrickworkConfig {
            z_step: 2,
            ..BrickworkConfig::default()
        };
        let catalog = LegalSizeCatalog::default();
        let mut grid = solid_block(1, 1, 1);
        assert!(build_bricks(&mut grid, &cfg, &catalog).is_err());
    }

    #[test]
    fn test_empty_grid_yields_empty_stats() {
        let cfg = BrickworkConfig::default();
        let catalog = LegalSizeCatalog::default();
        let mut grid = BrickGrid::new();
        let stats = build_bricks(&mut grid, &cfg, &catalog).expect("conversion");
        assert_eq!(stats.cells, 0);
        assert_eq!(stats.final_bricks, 0);
        assert_eq!(stats.components, 0);
        assert_eq!(stats.weak_points, 0);
    }

    #[test]
    fn test_stats_serialize() {
        let cfg = BrickworkConfig::default();
        let catalog = LegalSizeCatalog::default();
        let mut grid = solid_block(2, 2, 1);
        let stats = build_bricks(&mut grid, &cfg, &catalog).expect("conversion");
        let json = serde_json::to_string(&stats).expect("serialize stats");
        let back: BrickStats = serde_json::from_str(&json).expect("deserialize stats");
        assert_eq!(stats, back);
    }
}
