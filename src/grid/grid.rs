//! Sparse associative cell store
//!
//! The lattice is sparse: only cells inside the voxelized bounding volume
//! exist. Absent keys never raise errors; a lookup outside the populated
//! region simply reports "no neighbor", which every algorithm treats as
//! non-occluding empty space.

use super::cell::{BrickCell, BrickSize, Parent};
use super::key::CellKey;
use crate::error::{BrickError, BrickResult};
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inclusive axis-aligned sub-volume used to restrict connectivity scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeBounds {
    pub min: IVec3,
    pub max: IVec3,
}

impl VolumeBounds {
    pub fn new(min: IVec3, max: IVec3) -> Self {
        VolumeBounds { min, max }
    }

    /// Cube of the given radius centered on a key
    pub fn around(center: CellKey, radius: i32) -> Self {
        let c = center.to_ivec3();
        VolumeBounds {
            min: c - IVec3::splat(radius),
            max: c + IVec3::splat(radius),
        }
    }

    pub fn contains(&self, key: CellKey) -> bool {
        let v = key.to_ivec3();
        v.x >= self.min.x
            && v.x <= self.max.x
            && v.y >= self.min.y
            && v.y <= self.max.y
            && v.z >= self.min.z
            && v.z <= self.max.z
    }
}

/// Whole-grid snapshot used by the sturdiness search and the post passes to
/// roll back to a known-good state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSnapshot {
    cells: HashMap<CellKey, BrickCell>,
}

/// The voxel-cell associative store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrickGrid {
    cells: HashMap<CellKey, BrickCell>,
}

impl BrickGrid {
    pub fn new() -> Self {
        BrickGrid {
            cells: HashMap::new(),
        }
    }

    pub fn from_cells(cells: impl IntoIterator<Item = BrickCell>) -> Self {
        let mut grid = BrickGrid::new();
        for cell in cells {
            grid.insert(cell);
        }
        grid
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, key: CellKey) -> bool {
        self.cells.contains_key(&key)
    }

    pub fn get(&self, key: CellKey) -> Option<&BrickCell> {
        self.cells.get(&key)
    }

    pub fn get_mut(&mut self, key: CellKey) -> Option<&mut BrickCell> {
        self.cells.get_mut(&key)
    }

    /// Insert a cell, keyed by its `loc`
    pub fn insert(&mut self, cell: BrickCell) {
        self.cells.insert(cell.loc, cell);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &BrickCell)> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&CellKey, &mut BrickCell)> {
        self.cells.iter_mut()
    }

    /// All keys in deterministic (x, y, z) lexicographic order
    pub fn keys_sorted(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self.cells.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Keys of drawn cells in deterministic order
    pub fn drawn_keys_sorted(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self
            .cells
            .iter()
            .filter(|(_, c)| c.draw)
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }

    /// Keys of drawn owner cells (one per placed brick) in deterministic order
    pub fn parent_keys_sorted(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self
            .cells
            .iter()
            .filter(|(_, c)| c.draw && c.parent.is_owner())
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }

    /// Existing neighbors along ±x, ±y, ±z (up to 6)
    pub fn neighbors6(&self, key: CellKey) -> Vec<CellKey> {
        const OFFSETS: [(i32, i32, i32); 6] = [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ];
        OFFSETS
            .iter()
            .map(|&(dx, dy, dz)| key.offset(dx, dy, dz))
            .filter(|k| self.cells.contains_key(k))
            .collect()
    }

    /// Resolve the owner of a cell's brick.
    ///
    /// Returns `Ok(None)` for absent or unassigned cells. A `MemberOf`
    /// pointer is followed exactly once; if it does not land on an owner
    /// cell the one-hop invariant is broken, which is a fatal error.
    pub fn parent_of(&self, key: CellKey) -> BrickResult<Option<CellKey>> {
        let cell = match self.cells.get(&key) {
            Some(c) => c,
            None => return Ok(None),
        };
        match cell.parent {
            Parent::Unassigned => Ok(None),
            Parent::Owner(_) => Ok(Some(key)),
            Parent::MemberOf(target) => match self.cells.get(&target) {
                Some(owner) if owner.parent.is_owner() => Ok(Some(target)),
                _ => Err(BrickError::UnresolvedParent { child: key, target }),
            },
        }
    }

    /// Every lattice position covered by an origin + size footprint, with z
    /// strided by `z_step` (the vertical granularity unit). Positions are
    /// returned whether or not a cell record exists there; callers check
    /// presence themselves.
    pub fn cells_in_footprint(loc: CellKey, size: BrickSize, z_step: i32) -> Vec<CellKey> {
        let mut keys = Vec::with_capacity(
            (size.w * size.d * (size.h / z_step).max(1)) as usize,
        );
        let mut dz = 0;
        while dz < size.h {
            for dy in 0..size.d {
                for dx in 0..size.w {
                    keys.push(loc.offset(dx, dy, dz));
                }
            }
            dz += z_step;
        }
        keys
    }

    /// Min/max corner over all populated keys, or `None` for an empty grid
    pub fn bounds(&self) -> Option<VolumeBounds> {
        let mut iter = self.cells.keys();
        let first = iter.next()?.to_ivec3();
        let (mut min, mut max) = (first, first);
        for key in iter {
            let v = key.to_ivec3();
            min = min.min(v);
            max = max.max(v);
        }
        Some(VolumeBounds { min, max })
    }

    /// Clear the per-pass merge bookkeeping on every cell
    pub fn reset_attempted_merge(&mut self) {
        for cell in self.cells.values_mut() {
            cell.attempted_merge = false;
        }
    }

    /// Clone the full cell map
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            cells: self.cells.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: GridSnapshot) {
        self.cells = snapshot.cells;
    }

    /// Save the current state of a set of cells for a local rollback.
    /// Absent keys are recorded as absent so a rollback can remove cells
    /// that were synthesized in between.
    pub fn snapshot_keys(&self, keys: &[CellKey]) -> Vec<(CellKey, Option<BrickCell>)> {
        keys.iter()
            .map(|&k| (k, self.cells.get(&k).cloned()))
            .collect()
    }

    pub fn restore_keys(&mut self, saved: Vec<(CellKey, Option<BrickCell>)>) {
        for (key, cell) in saved {
            match cell {
                Some(c) => {
                    self.cells.insert(key, c);
                }
                None => {
                    self.cells.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell::Parent;

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
    fn test_neighbors6_sparse_edges() {
        let grid = solid_block(2, 1, 1);
        // Corner cell has exactly one existing neighbor
        assert_eq!(grid.neighbors6(CellKey::new(0, 0, 0)).len(), 1);
        // A position outside the grid has no neighbors inside except the edge
        assert!(grid.get(CellKey::new(5, 5, 5)).is_none());
    }

    #[test]
    fn test_parent_of_one_hop() {
        let mut grid = solid_block(2, 1, 1);
        let owner = CellKey::new(0, 0, 0);
        let child = CellKey::new(1, 0, 0);
        grid.get_mut(owner)
            .expect("owner cell")
            .parent = Parent::Owner(BrickSize::new(2, 1, 1));
        grid.get_mut(child)
            .expect("child cell")
            .parent = Parent::MemberOf(owner);

        assert_eq!(grid.parent_of(owner).expect("resolve"), Some(owner));
        assert_eq!(grid.parent_of(child).expect("resolve"), Some(owner));
        assert_eq!(
            grid.parent_of(CellKey::new(9, 9, 9)).expect("absent is none"),
            None
        );
    }

    #[test]
    fn test_parent_of_broken_chain_is_fatal() {
        let mut grid = solid_block(2, 1, 1);
        let child = CellKey::new(1, 0, 0);
        grid.get_mut(child)
            .expect("child cell")
            .parent = Parent::MemberOf(CellKey::new(0, 0, 0)); // target is not an owner
        assert!(grid.parent_of(child).is_err());
    }

    #[test]
    fn test_cells_in_footprint_strides_z() {
        // 2x2x3 footprint at plate granularity covers three layers
        let keys = BrickGrid::cells_in_footprint(CellKey::new(0, 0, 0), BrickSize::new(2, 2, 3), 1);
        assert_eq!(keys.len(), 12);
        // Same footprint at brick granularity covers a single layer
        let keys = BrickGrid::cells_in_footprint(CellKey::new(0, 0, 0), BrickSize::new(2, 2, 3), 3);
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut grid = solid_block(2, 2, 1);
        let snap = grid.snapshot();
        grid.get_mut(CellKey::new(0, 0, 0)).expect("cell").draw = false;
        grid.restore(snap);
        assert!(grid.get(CellKey::new(0, 0, 0)).expect("cell").draw);
    }

    #[test]
    fn test_snapshot_keys_restores_absence() {
        let mut grid = solid_block(1, 1, 1);
        let missing = CellKey::new(0, 0, 1);
        let saved = grid.snapshot_keys(&[missing]);
        grid.insert(BrickCell::new(missing, 0.5, true));
        grid.restore_keys(saved);
        assert!(!grid.contains(missing));
    }

    #[test]
    fn test_bounds() {
        let grid = solid_block(3, 2, 4);
        let b = grid.bounds().expect("non-empty grid");
        assert_eq!(b.min, IVec3::new(0, 0, 0));
        assert_eq!(b.max, IVec3::new(2, 1, 3));
        assert!(b.contains(CellKey::new(2, 1, 0)));
        assert!(!b.contains(CellKey::new(3, 0, 0)));
    }
}
