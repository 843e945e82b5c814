//! Brick connectivity analysis
//!
//! Placed bricks connect through studs, so the structural graph only has
//! vertical edges: two drawn bricks are adjacent when one's footprint rests
//! directly on the other. [`build_graph`] derives that graph from the grid,
//! [`connected_components`] partitions it, and [`bridge_edges`] /
//! [`weak_points`] find the single edges whose removal would split a
//! component. The sturdiness search consumes all three.

mod bridges;
mod components;
mod graph;

use crate::grid::CellKey;
use std::collections::{BTreeMap, BTreeSet};

/// Adjacency over drawn parent bricks, keyed by owner cell. Ordered maps
/// keep every traversal deterministic.
pub type ComponentGraph = BTreeMap<CellKey, BTreeSet<CellKey>>;

pub use bridges::{bridge_edges, weak_point_neighbors, weak_points};
pub use components::{component_interfaces, connected_components};
pub use graph::{build_graph, horizontal_neighbor_parents, vertical_neighbor_parents};
