//! Pre-routed fan-in/fan-out segments (C4): the fixed path connecting a
//! site pin to the nearest `"INT"` tile, computed once per tile type and
//! reused for every routed net that touches that pin.
//!
//! Grounded on `data.cpp`'s `findSinkOrSourceToINTpath` and
//! `getPreroutedPaths`.

use crate::device::DeviceTables;
use crate::ids::{TileId, TileTypeId, VertexId};
use crate::pip_graph::PipGraph;
use crate::routing_branch::RoutingBranch;
use aion_common::Ident;
use std::collections::{HashMap, VecDeque};

/// Which way a site pin's traffic flows relative to the switch-box fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// A site output pin driving into the fabric, towards an `"INT"` tile.
    Source,
    /// A site input pin fed from the fabric, from an `"INT"` tile.
    Sink,
}

/// Fixed site-pin-to-`"INT"`-tile paths, indexed by the pin's tile-local wire
/// within its tile type.
///
/// Every tile of a given type shares the same entries: the path only depends
/// on the type's local wire layout, not on where in the device the tile sits.
#[derive(Debug, Default)]
pub struct PreroutedPaths {
    /// Fan-out: from a site output pin's wire out to the nearest `"INT"` tile.
    /// The tree root is the site pin itself.
    pub fan_out: HashMap<Ident, RoutingBranch>,
    /// Fan-in: from the nearest `"INT"` tile in to a site input pin's wire.
    /// The tree root is the `"INT"`-side wire; its descendants lead to the pin.
    pub fan_in: HashMap<Ident, RoutingBranch>,
}

/// Builds the pre-routed fan-in/fan-out table for one tile type.
///
/// `type_idx` identifies the tile type within `tables.tile_types`/`pip_graphs`;
/// `representative` is any tile instance of that type, used to anchor the
/// relative coordinates the search accumulates.
pub fn build_prerouted_paths(
    tables: &DeviceTables,
    pip_graphs: &[PipGraph],
    type_idx: usize,
    representative: TileId,
) -> PreroutedPaths {
    let mut paths = PreroutedPaths::default();

    for &site_wire in &tables.source_and_sink_wires[type_idx] {
        if let Some(chain) = bfs_to_int_tile(tables, pip_graphs, representative, site_wire, Direction::Source) {
            paths.fan_out.insert(site_wire, build_tree(chain, false));
        }
        if let Some(chain) = bfs_to_int_tile(tables, pip_graphs, representative, site_wire, Direction::Sink) {
            paths.fan_in.insert(site_wire, build_tree(chain, true));
        }
    }

    paths
}

/// One step of the reconstructed path, fully resolved against the search's
/// starting tile so it can be dropped straight into a [`RoutingBranch`].
struct Step {
    /// Tile-column offset from the search's starting tile.
    dx: i32,
    /// Tile-row offset from the search's starting tile.
    dy: i32,
    tile_type: TileTypeId,
    wire_graph_idx: VertexId,
    is_first_wire_of_tile: bool,
}

/// Breadth-first search from `start_wire` in `start_tile` out to the nearest
/// wire belonging to an `"INT"`-type tile, following downhill PIPs (source
/// direction) or uphill PIPs (sink direction) both within a tile's switch box
/// and across tiles via shared nodes.
///
/// Cross-tile hops are only taken into a wire that itself has a PIP in the
/// search direction in its own tile type — a destination tile with no such
/// PIP is a dead end and is never worth entering.
fn bfs_to_int_tile(
    tables: &DeviceTables,
    pip_graphs: &[PipGraph],
    start_tile: TileId,
    start_wire: Ident,
    direction: Direction,
) -> Option<Vec<Step>> {
    let start = (start_tile, start_wire);
    // Maps a visited (tile, wire) to (parent (tile, wire), dx, dy relative to start_tile).
    let mut visited: HashMap<(TileId, Ident), ((TileId, Ident), i32, i32)> = HashMap::new();
    let mut queue: VecDeque<(TileId, Ident)> = VecDeque::new();
    visited.insert(start, (start, 0, 0));
    queue.push_back(start);

    let mut found = None;
    while let Some((tile, wire)) = queue.pop_front() {
        let tile_type = tables.tiles[tile.as_raw() as usize].tile_type;
        if tile_type == tables.int_tile_type {
            found = Some((tile, wire));
            break;
        }

        let (_, dx, dy) = visited[&(tile, wire)];
        let type_idx = tile_type.as_raw() as usize;
        let graph = &pip_graphs[type_idx];

        let reachable = match direction {
            Direction::Source => graph.find_outputs_plain(wire),
            Direction::Sink => graph.find_inputs_plain(wire),
        };
        for vertex in reachable {
            let next_wire = graph.convert_idx_to_wire(vertex);
            let next = (tile, next_wire);
            if visited.contains_key(&next) {
                continue;
            }
            visited.insert(next, ((tile, wire), dx, dy));
            queue.push_back(next);
        }

        if let Some(&node_id) = tables.wire2node.get(&(tile, wire)) {
            for &(other_tile, other_wire) in &tables.node_members[node_id.as_raw() as usize] {
                if (other_tile, other_wire) == (tile, wire) {
                    continue;
                }
                let other_type_idx = tables.tiles[other_tile.as_raw() as usize].tile_type.as_raw() as usize;
                let has_pip = match direction {
                    Direction::Source => {
                        tables.wires_with_downhill_pips_by_type[other_type_idx].contains(&other_wire)
                    }
                    Direction::Sink => tables.wires_with_uphill_pips.contains(&other_wire),
                };
                if !has_pip {
                    continue;
                }
                let next = (other_tile, other_wire);
                if visited.contains_key(&next) {
                    continue;
                }
                let other_rec = &tables.tiles[other_tile.as_raw() as usize];
                let this_rec = &tables.tiles[tile.as_raw() as usize];
                let next_dx = dx + (other_rec.x - this_rec.x);
                let next_dy = dy + (other_rec.y - this_rec.y);
                visited.insert(next, ((tile, wire), next_dx, next_dy));
                queue.push_back(next);
            }
        }
    }

    let (mut cur_tile, mut cur_wire) = found?;
    let mut rev_path = Vec::new();
    loop {
        let (parent, dx, dy) = visited[&(cur_tile, cur_wire)];
        let tile_type = tables.tiles[cur_tile.as_raw() as usize].tile_type;
        let type_idx = tile_type.as_raw() as usize;
        let wire_graph_idx = pip_graphs[type_idx]
            .convert_wire_to_idx(cur_wire)
            .unwrap_or(VertexId::from_raw(0));
        let is_first_wire_of_tile = parent.0 != cur_tile || parent == (cur_tile, cur_wire);
        rev_path.push(Step {
            dx,
            dy,
            tile_type,
            wire_graph_idx,
            is_first_wire_of_tile,
        });
        if parent == (cur_tile, cur_wire) {
            break;
        }
        cur_tile = parent.0;
        cur_wire = parent.1;
    }
    rev_path.reverse();
    Some(rev_path)
}

/// Turns a flat BFS path into a linear `RoutingBranch` chain.
///
/// When `reverse_for_sink` is set, the chain order is flipped and the
/// coordinates re-anchored to the new first element, so the tree root is the
/// `"INT"`-side end — matching the direction fan-in traffic actually flows.
fn build_tree(mut path: Vec<Step>, reverse_for_sink: bool) -> RoutingBranch {
    if reverse_for_sink {
        path.reverse();
        let (ox, oy) = (path[0].dx, path[0].dy);
        for step in &mut path {
            step.dx -= ox;
            step.dy -= oy;
        }
    }

    let mut nodes: Vec<RoutingBranch> = path
        .into_iter()
        .map(|step| {
            RoutingBranch::new(
                step.dx,
                step.dy,
                step.tile_type,
                step.wire_graph_idx,
                step.is_first_wire_of_tile,
            )
        })
        .collect();

    let mut tail = nodes.pop().expect("a found path always has at least one step");
    while let Some(mut node) = nodes.pop() {
        node.children.push(tail);
        tail = node;
    }
    tail
}
