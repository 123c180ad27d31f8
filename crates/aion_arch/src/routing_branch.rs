//! The routing tree node shared by pre-routed device segments (C4) and by a
//! net's own accumulated routing tree (built by the router in `aion_pnr`).
//!
//! Grounded on `utils.h`'s `routing_branch` struct: a branching tree (not a
//! DAG) where children are owned by their parent and the root is owned by
//! whatever constructed the tree — a [`crate::prerouted::PreroutedPaths`]
//! table entry, or a net.

use crate::ids::{TileTypeId, VertexId};
use serde::{Deserialize, Serialize};

/// One node of a routing tree.
///
/// Coordinates (`dx`, `dy`) are the tile offset relative to the root of the
/// tree this node belongs to, not relative to its immediate parent — this
/// matches the original's convention of capturing the start tile's
/// coordinates once and subtracting them at every node along the way.
///
/// Unlike the original's raw pointer to a `wire_resource`, this node carries
/// only the coordinates/type/graph-index needed to resolve its physical
/// resource later: the owning net or router looks up the live
/// `WireResource` through its own per-tile-instance resource table, keyed by
/// the concrete tile this offset resolves to once the tree is anchored at a
/// root location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingBranch {
    /// Tile-column offset from the tree's root.
    pub dx: i32,
    /// Tile-row offset from the tree's root.
    pub dy: i32,
    /// Tile type this node's wire belongs to.
    pub tile_type: TileTypeId,
    /// Dense PIP-graph vertex index of this node's wire within `tile_type`.
    pub wire_graph_idx: VertexId,
    /// Whether this is the first wire visited within its tile (used to avoid
    /// double-charging a tile's entry cost).
    pub is_first_wire_of_tile: bool,
    /// The net sink index this node terminates at, or `-1` if not a sink.
    pub sink_id: i32,
    /// Child branches; empty for a leaf.
    pub children: Vec<RoutingBranch>,
}

impl RoutingBranch {
    /// A "no sink" marker matching the original's `sinkId = -1` default.
    pub const NO_SINK: i32 = -1;

    /// Creates a new branch with no children and no sink.
    pub fn new(
        dx: i32,
        dy: i32,
        tile_type: TileTypeId,
        wire_graph_idx: VertexId,
        is_first_wire_of_tile: bool,
    ) -> Self {
        Self {
            dx,
            dy,
            tile_type,
            wire_graph_idx,
            is_first_wire_of_tile,
            sink_id: Self::NO_SINK,
            children: Vec::new(),
        }
    }

    /// Whether this node terminates a sink.
    pub fn is_sink(&self) -> bool {
        self.sink_id != Self::NO_SINK
    }

    /// Total number of nodes in the subtree rooted at `self`, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(RoutingBranch::subtree_size)
            .sum::<usize>()
    }

    /// Depth of the deepest leaf below `self` (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.depth())
            .max()
            .unwrap_or(0)
    }
}
