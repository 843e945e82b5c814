//! Connected components and cross-component contact

use super::graph::horizontal_neighbor_parents;
use super::ComponentGraph;
use crate::error::BrickResult;
use crate::grid::{BrickGrid, CellKey};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Partition the graph into connected components. Each component keeps its
/// own node-to-neighbors map. Expansion is breadth-first over an explicit
/// queue; components come out ordered by their smallest member.
pub fn connected_components(graph: &ComponentGraph) -> Vec<ComponentGraph> {
    let mut seen: BTreeSet<CellKey> = BTreeSet::new();
    let mut components = Vec::new();
    for &start in graph.keys() {
        if !seen.insert(start) {
            continue;
        }
        let mut component = ComponentGraph::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let neighbors = graph.get(&node).cloned().unwrap_or_default();
            for &next in &neighbors {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
            component.insert(node, neighbors);
        }
        components.push(component);
    }
    components
}

/// Seam bricks between disconnected islands.
///
/// For every component other than the largest, each member in side contact
/// with a brick from a different component is flagged, together with that
/// contact brick and the contact brick's own side neighbors. Re-merging
/// near a split must always include these keys.
pub fn component_interfaces(
    grid: &BrickGrid,
    components: &[ComponentGraph],
    z_step: i32,
) -> BrickResult<BTreeSet<CellKey>> {
    let mut largest = 0;
    for (index, component) in components.iter().enumerate() {
        if component.len() > components[largest].len() {
            largest = index;
        }
    }
    let mut component_of: BTreeMap<CellKey, usize> = BTreeMap::new();
    for (index, component) in components.iter().enumerate() {
        for &key in component.keys() {
            component_of.insert(key, index);
        }
    }

    let mut flagged = BTreeSet::new();
    for (index, component) in components.iter().enumerate() {
        if index == largest {
            continue;
        }
        for &member in component.keys() {
            for neighbor in horizontal_neighbor_parents(grid, member, z_step)? {
                if component_of.get(&neighbor) == Some(&index) {
                    continue;
                }
                flagged.insert(member);
                flagged.insert(neighbor);
                flagged.extend(horizontal_neighbor_parents(grid, neighbor, z_step)?);
            }
        }
    }
    Ok(flagged)
}
