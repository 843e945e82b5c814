//! Adjacency extraction from the grid
//!
//! Neighbor resolution always goes through `parent_of`, so a probe landing
//! anywhere inside another brick's footprint reports that brick's owner.

use super::ComponentGraph;
use crate::error::BrickResult;
use crate::grid::{BrickGrid, CellKey, VolumeBounds};
use std::collections::BTreeSet;

fn drawn_owner(grid: &BrickGrid, probe: CellKey) -> BrickResult<Option<CellKey>> {
    match grid.parent_of(probe)? {
        Some(owner) if grid.get(owner).map(|c| c.draw).unwrap_or(false) => Ok(Some(owner)),
        _ => Ok(None),
    }
}

/// Owners of drawn bricks resting directly on top of or underneath the
/// given brick. These are the stud connections.
pub fn vertical_neighbor_parents(
    grid: &BrickGrid,
    key: CellKey,
    z_step: i32,
) -> BrickResult<Vec<CellKey>> {
    let size = match grid.get(key).filter(|c| c.draw).and_then(|c| c.parent.size()) {
        Some(s) => s,
        None => return Ok(Vec::new()),
    };
    let mut found = BTreeSet::new();
    for dy in 0..size.d {
        for dx in 0..size.w {
            for probe in [key.offset(dx, dy, size.h), key.offset(dx, dy, -z_step)] {
                if let Some(owner) = drawn_owner(grid, probe)? {
                    if owner != key {
                        found.insert(owner);
                    }
                }
            }
        }
    }
    Ok(found.into_iter().collect())
}

/// Owners of drawn bricks touching the given brick's side faces. Side
/// contact carries no structural load but marks where two components could
/// be fused by a re-merge.
pub fn horizontal_neighbor_parents(
    grid: &BrickGrid,
    key: CellKey,
    z_step: i32,
) -> BrickResult<Vec<CellKey>> {
    const SIDES: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    let size = match grid.get(key).filter(|c| c.draw).and_then(|c| c.parent.size()) {
        Some(s) => s,
        None => return Ok(Vec::new()),
    };
    let mut found = BTreeSet::new();
    for pos in BrickGrid::cells_in_footprint(key, size, z_step) {
        for (dx, dy) in SIDES {
            if let Some(owner) = drawn_owner(grid, pos.offset(dx, dy, 0))? {
                if owner != key {
                    found.insert(owner);
                }
            }
        }
    }
    Ok(found.into_iter().collect())
}

/// Build the stud-connectivity graph over drawn parent bricks. When
/// `bounds` is given, only bricks whose owner cell lies inside it become
/// nodes, and edges leaving the volume are dropped with them.
pub fn build_graph(
    grid: &BrickGrid,
    z_step: i32,
    bounds: Option<&VolumeBounds>,
) -> BrickResult<ComponentGraph> {
    let mut graph = ComponentGraph::new();
    for key in grid.parent_keys_sorted() {
        if bounds.map(|b| b.contains(key)).unwrap_or(true) {
            graph.insert(key, BTreeSet::new());
        }
    }
    let nodes: Vec<CellKey> = graph.keys().copied().collect();
    for key in nodes {
        for nbr in vertical_neighbor_parents(grid, key, z_step)? {
            if graph.contains_key(&nbr) {
                graph.entry(key).or_default().insert(nbr);
                graph.entry(nbr).or_default().insert(key);
            }
        }
    }
    Ok(graph)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grid::{BrickCell, BrickSize, Parent};

    // Places a w x d x 1 plate with its owner at (x, y, z).
    pub(crate) fn place_plate(grid: &mut BrickGrid, x: i32, y: i32, z: i32, w: i32, d: i32) -> CellKey {
        let owner = CellKey::new(x, y, z);
        for pos in BrickGrid::cells_in_footprint(owner, BrickSize::new(w, d, 1), 1) {
            let mut cell = BrickCell::new(pos, 1.0, true);
            cell.parent = if pos == owner {
                Parent::Owner(BrickSize::new(w, d, 1))
            } else {
                Parent::MemberOf(owner)
            };
            grid.insert(cell);
        }
        owner
    }

    #[test]
    fn test_vertical_neighbors_through_footprints() {
        let mut grid = BrickGrid::new();
        let base = place_plate(&mut grid, 0, 0, 0, 4, 1);
        // Cap rests on the far end of the base, away from its owner cell
        let cap = place_plate(&mut grid, 3, 0, 1, 1, 1);
        assert_eq!(
            vertical_neighbor_parents(&grid, base, 1).expect("neighbors"),
            vec![cap]
        );
        assert_eq!(
            vertical_neighbor_parents(&grid, cap, 1).expect("neighbors"),
            vec![base]
        );
    }

    #[test]
    fn test_side_contact_is_not_vertical() {
        let mut grid = BrickGrid::new();
        let a = place_plate(&mut grid, 0, 0, 0, 2, 1);
        let b = place_plate(&mut grid, 2, 0, 0, 2, 1);
        assert!(vertical_neighbor_parents(&grid, a, 1)
            .expect("neighbors")
            .is_empty());
        assert_eq!(
            horizontal_neighbor_parents(&grid, a, 1).expect("neighbors"),
            vec![b]
        );
    }

    #[test]
    fn test_build_graph_respects_bounds() {
        let mut grid = BrickGrid::new();
        let a = place_plate(&mut grid, 0, 0, 0, 1, 1);
        let b = place_plate(&mut grid, 0, 0, 1, 1, 1);
        let c = place_plate(&mut grid, 0, 0, 2, 1, 1);

        let full = build_graph(&grid, 1, None).expect("graph");
        assert_eq!(full.len(), 3);
        assert_eq!(full[&b].len(), 2);

        let bounds = VolumeBounds::new(glam::IVec3::new(0, 0, 0), glam::IVec3::new(0, 0, 1));
        let clipped = build_graph(&grid, 1, Some(&bounds)).expect("graph");
        assert_eq!(clipped.len(), 2);
        assert!(!clipped.contains_key(&c));
        assert_eq!(clipped[&a].iter().copied().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_undrawn_bricks_are_excluded() {
        let mut grid = BrickGrid::new();
        let a = place_plate(&mut grid, 0, 0, 0, 1, 1);
        let b = place_plate(&mut grid, 0, 0, 1, 1, 1);
        grid.get_mut(b).expect("cell").draw = false;
        assert!(vertical_neighbor_parents(&grid, a, 1)
            .expect("neighbors")
            .is_empty());
        let graph = build_graph(&grid, 1, None).expect("graph");
        assert_eq!(graph.keys().copied().collect::<Vec<_>>(), vec![a]);
    }
}
