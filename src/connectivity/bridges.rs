//! Bridge detection
//!
//! A bridge is an edge whose removal disconnects its component; the bricks
//! at its ends are the structurally weak points the sturdiness search tries
//! to rebuild. Low-link computation runs over an explicit stack so deep,
//! chain-like models cannot overflow the call stack.

use super::graph::horizontal_neighbor_parents;
use super::ComponentGraph;
use crate::error::BrickResult;
use crate::grid::{BrickGrid, CellKey};
use std::collections::{BTreeMap, BTreeSet};

/// All bridge edges, each reported once as (discovered-first, discovered-
/// second) along the DFS tree.
pub fn bridge_edges(graph: &ComponentGraph) -> Vec<(CellKey, CellKey)> {
    let mut id: BTreeMap<CellKey, usize> = BTreeMap::new();
    let mut tree_parent: BTreeMap<CellKey, Option<CellKey>> = BTreeMap::new();
    let mut order: Vec<CellKey> = Vec::new();

    // Forward pass: depth-first discovery over an explicit stack. A node
    // may be pushed more than once; the entry that pops first fixes its
    // discovery id and tree parent.
    for &root in graph.keys() {
        if id.contains_key(&root) {
            continue;
        }
        let mut stack: Vec<(CellKey, Option<CellKey>)> = vec![(root, None)];
        while let Some((node, from)) = stack.pop() {
            if id.contains_key(&node) {
                continue;
            }
            id.insert(node, order.len());
            tree_parent.insert(node, from);
            order.push(node);
            if let Some(neighbors) = graph.get(&node) {
                for &next in neighbors {
                    if !id.contains_key(&next) {
                        stack.push((next, Some(node)));
                    }
                }
            }
        }
    }

    // Backward pass: nodes in reverse discovery order, so every tree
    // child's low-link is final before its parent reads it.
    let mut low: BTreeMap<CellKey, usize> = BTreeMap::new();
    for &node in order.iter().rev() {
        let mut link = id[&node];
        if let Some(neighbors) = graph.get(&node) {
            for &next in neighbors {
                if tree_parent[&node] == Some(next) {
                    continue;
                }
                if tree_parent[&next] == Some(node) {
                    link = link.min(low[&next]);
                } else {
                    link = link.min(id[&next]);
                }
            }
        }
        low.insert(node, link);
    }

    let mut bridges = Vec::new();
    for &node in &order {
        if let Some(parent) = tree_parent[&node] {
            if low[&node] > id[&parent] {
                bridges.push((parent, node));
            }
        }
    }
    bridges
}

/// Bridge endpoints that actually bear load: an endpoint whose only
/// connection is the bridge itself is a leaf brick, not a weak joint.
pub fn weak_points(graph: &ComponentGraph) -> Vec<CellKey> {
    let mut weak = BTreeSet::new();
    for (a, b) in bridge_edges(graph) {
        for key in [a, b] {
            if graph.get(&key).map(|n| n.len() > 1).unwrap_or(false) {
                weak.insert(key);
            }
        }
    }
    weak.into_iter().collect()
}

/// Bricks in side contact with a weak point, excluding the weak points
/// themselves. These widen the region the sturdiness search tears down
/// around a detected weakness.
pub fn weak_point_neighbors(
    grid: &BrickGrid,
    weak: &[CellKey],
    z_step: i32,
) -> BrickResult<BTreeSet<CellKey>> {
    let weak_set: BTreeSet<CellKey> = weak.iter().copied().collect();
    let mut keys = BTreeSet::new();
    for &key in weak {
        for neighbor in horizontal_neighbor_parents(grid, key, z_step)? {
            if !weak_set.contains(&neighbor) {
                keys.insert(neighbor);
            }
        }
    }
    Ok(keys)
}
