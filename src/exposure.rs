//! Per-brick top/bottom exposure
//!
//! A brick face is exposed when no occluding brick sits immediately against
//! it. Exposure is computed per footprint column and OR-ed across the
//! brick, so a single uncovered stud marks the whole top exposed. The mesh
//! generator downstream uses the flags to decide which stud/tube detail to
//! emit.

use crate::config::BrickworkConfig;
use crate::error::BrickResult;
use crate::grid::{BrickCell, BrickGrid, CellKey};

/// Whether the given neighbor cell occludes the face it presses against.
/// `from_above` is true when the neighbor sits on top of the brick under
/// test. Undrawn interior cells occlude only when internal occlusion is
/// enabled.
fn occludes(neighbor: Option<&BrickCell>, from_above: bool, cfg: &BrickworkConfig) -> bool {
    match neighbor {
        Some(cell) => {
            let type_occludes = if from_above {
                cell.brick_type.hides_below()
            } else {
                cell.brick_type.hides_above()
            };
            type_occludes && (cell.draw || (cfg.internal_occlusion && cell.val > 0.0))
        }
        None => false,
    }
}

/// Top/bottom exposure for one parent brick's full footprint.
pub fn brick_exposure(
    grid: &BrickGrid,
    key: CellKey,
    cfg: &BrickworkConfig,
) -> BrickResult<(bool, bool)> {
    let size = match grid.get(key).and_then(|c| c.parent.size()) {
        Some(s) => s,
        None => return Ok((false, false)),
    };
    let mut top = false;
    let mut bot = false;
    for dy in 0..size.d {
        for dx in 0..size.w {
            if !top && !occludes(grid.get(key.offset(dx, dy, size.h)), true, cfg) {
                top = true;
            }
            if !bot && !occludes(grid.get(key.offset(dx, dy, -cfg.z_step)), false, cfg) {
                bot = true;
            }
        }
    }
    Ok((top, bot))
}

/// Annotate every drawn parent brick with its exposure flags. Returns the
/// number of parents annotated.
pub fn set_all_exposures(grid: &mut BrickGrid, cfg: &BrickworkConfig) -> BrickResult<usize> {
    let parents = grid.parent_keys_sorted();
    for &key in &parents {
        let (top, bot) = brick_exposure(grid, key, cfg)?;
        if let Some(cell) = grid.get_mut(key) {
            cell.top_exposed = Some(top);
            cell.bot_exposed = Some(bot);
        }
    }
    log::debug!("[set_all_exposures] annotated {} bricks", parents.len());
    Ok(parents.len())
}
