//! A* search over the two-level routing graph (C6): per-tile PIP-graph hops
//! stitched together by the inter-tile template.
//!
//! Grounded on the teacher's `routing/astar.rs` for the priority-queue idiom
//! (a reversed-`Ord` state struct driving a `BinaryHeap` min-heap), but the
//! search itself is new: each popped state is a tile-entry point, not a
//! single wire, and expansion alternates between `aion_arch::PipGraph`'s
//! cost-aware in-tile search and the inter-tile template's cross-tile hops,
//! per SPEC_FULL.md §4.6.

use crate::net::BoundingBox;
use crate::resources::ResourceTable;
use aion_arch::{DeviceTables, InterTileGraph, PipGraph, TileTypeId, VertexId};
use aion_common::Ident;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// One A* entry point: a source wire already resolved to its effective
/// starting tile (past any pre-routed prefix).
#[derive(Debug, Clone, Copy)]
pub struct AStarSeed {
    /// Starting tile column.
    pub x: i32,
    /// Starting tile row.
    pub y: i32,
    /// Tile type at `(x, y)`.
    pub tile_type: TileTypeId,
    /// The wire search begins from within that tile.
    pub wire_in: Ident,
}

/// One tile's worth of the reconstructed path: the wires traversed from the
/// tile's entry point to its output, in that order.
#[derive(Debug, Clone)]
pub struct TilePath {
    /// Tile column.
    pub x: i32,
    /// Tile row.
    pub y: i32,
    /// Tile type.
    pub tile_type: TileTypeId,
    /// Wires from this tile's entry to its output, entry first.
    pub wires: Vec<VertexId>,
}

/// A found path: every tile it crosses (sink tile first, source tile last)
/// and the final wire reached at the sink.
#[derive(Debug, Clone)]
pub struct PathResult {
    /// Tile paths in sink-first order, consumed by `build_branches` in
    /// reverse (source to sink).
    pub tile_paths: Vec<TilePath>,
    /// The wire the search landed on at the sink tile.
    pub sink_wire: Ident,
}

/// An arena entry: one A* state, addressed by its index rather than a shared
/// pointer (see DESIGN.md's resolution of the "shared predecessor nodes"
/// design note).
struct Entry {
    x: i32,
    y: i32,
    tile_type: TileTypeId,
    wire_in: Ident,
    cost: f64,
    /// The predecessor arena index and the output wire (in the predecessor's
    /// tile) that led here, or `None` for a source seed.
    pred: Option<(usize, Ident)>,
}

struct QueueItem {
    priority: f64,
    idx: usize,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for QueueItem {}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the lowest priority first.
        other.priority.partial_cmp(&self.priority).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(x: i32, y: i32, target_x: i32, target_y: i32, multiplier: f64) -> f64 {
    (((target_x - x).abs() + (target_y - y).abs()) as f64) * multiplier
}

/// Runs the A* search from every seed to `(target_x, target_y)`, returning
/// the cheapest path found, or `None` if none exists within `bbox`.
///
/// `run_id` must be unique for the lifetime of `resources` (the router hands
/// out a fresh one per sink search); it distinguishes this search's visited
/// markers from any earlier one sharing the same per-tile resource vectors.
#[allow(clippy::too_many_arguments)]
pub fn find_path(
    tables: &DeviceTables,
    pip_graphs: &[PipGraph],
    inter_tile: &InterTileGraph,
    resources: &mut ResourceTable,
    heuristic_multiplier: f64,
    run_id: i64,
    sources: &[AStarSeed],
    target_x: i32,
    target_y: i32,
    bbox: &BoundingBox,
) -> Option<PathResult> {
    let mut arena: Vec<Entry> = Vec::new();
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::new();
    let mut claimed: HashSet<(i32, i32, Ident)> = HashSet::new();
    // (path_cost, predecessor arena index, wire reached at the sink)
    let mut best: Option<(f64, usize, Ident)> = None;

    for seed in sources {
        let h = heuristic(seed.x, seed.y, target_x, target_y, heuristic_multiplier);
        let idx = arena.len();
        arena.push(Entry {
            x: seed.x,
            y: seed.y,
            tile_type: seed.tile_type,
            wire_in: seed.wire_in,
            cost: 0.0,
            pred: None,
        });
        queue.push(QueueItem { priority: h, idx });
    }

    while let Some(QueueItem { priority, idx }) = queue.pop() {
        if let Some((best_cost, pred_idx, sink_wire)) = best {
            if best_cost <= priority {
                return Some(reconstruct_path(tables, pip_graphs, resources, pred_idx, sink_wire, &arena));
            }
        }

        let (n_x, n_y, n_type, n_wire, n_cost) = {
            let e = &arena[idx];
            (e.x, e.y, e.tile_type, e.wire_in, e.cost)
        };

        // A tile with no outgoing template (a dead end — its only relevant
        // wire has no onward node) still has to be searched: that is exactly
        // how a literal sink wire with nothing beyond it gets found. The
        // template only gates *extending past* this tile, never the in-tile
        // search itself.
        let template = inter_tile.template_for(n_x, n_y, n_type);
        let Some(tile_id) = tables.tile_at.get(&(n_x, n_y)).copied() else { continue };
        let type_idx = n_type.as_raw() as usize;
        let Some(start_vertex) = pip_graphs[type_idx].convert_wire_to_idx(n_wire) else { continue };

        let found = {
            let tile_resources = resources.tile_resources(tile_id);
            pip_graphs[type_idx].find_reachable(start_vertex, tile_resources, n_cost, run_id, None)
        };

        for (path_cost, output_vertex) in found {
            let present_cost = resources.get(tile_id, output_vertex).present_cost;
            let output_wire = pip_graphs[type_idx].convert_idx_to_wire(output_vertex);

            if present_cost == 0.0 {
                if best.map_or(true, |(bc, _, _)| path_cost < bc) {
                    best = Some((path_cost, idx, output_wire));
                }
                continue;
            }

            let Some(template) = template else { continue };
            let Some(dests) = template.get(&output_wire) else { continue };
            for dest in dests {
                let x2 = n_x + dest.dx;
                let y2 = n_y + dest.dy;
                if !bbox.contains(x2, y2) {
                    continue;
                }
                if let Some((best_cost, _, _)) = best {
                    if path_cost >= best_cost {
                        continue;
                    }
                }
                if !claimed.insert((x2, y2, dest.dest_wire)) {
                    continue;
                }
                let h = heuristic(x2, y2, target_x, target_y, heuristic_multiplier);
                let new_idx = arena.len();
                arena.push(Entry {
                    x: x2,
                    y: y2,
                    tile_type: dest.dest_tile_type,
                    wire_in: dest.dest_wire,
                    cost: path_cost,
                    pred: Some((idx, output_wire)),
                });
                queue.push(QueueItem { priority: path_cost + h, idx: new_idx });
            }
        }
    }

    best.map(|(_, pred_idx, sink_wire)| reconstruct_path(tables, pip_graphs, resources, pred_idx, sink_wire, &arena))
}

fn reconstruct_path(
    tables: &DeviceTables,
    pip_graphs: &[PipGraph],
    resources: &mut ResourceTable,
    start_pred_idx: usize,
    start_out_wire: Ident,
    arena: &[Entry],
) -> PathResult {
    let sink_wire = start_out_wire;
    let mut tile_paths = Vec::new();
    let mut node_idx = start_pred_idx;
    let mut out_wire = start_out_wire;

    loop {
        let entry = &arena[node_idx];
        let tile_id = tables.tile_at[&(entry.x, entry.y)];
        let type_idx = entry.tile_type.as_raw() as usize;
        let graph = &pip_graphs[type_idx];
        let tile_resources = resources.tile_resources(tile_id);

        let mut wires = Vec::new();
        let mut v = graph
            .convert_wire_to_idx(out_wire)
            .expect("a wire returned by find_reachable exists in its own tile's graph");
        loop {
            wires.push(v);
            let parent = tile_resources[v.as_raw() as usize].parent;
            if parent == aion_arch::resource::ROOT_PARENT {
                break;
            }
            v = VertexId::from_raw(parent as u32);
        }
        wires.reverse();

        tile_paths.push(TilePath { x: entry.x, y: entry.y, tile_type: entry.tile_type, wires });

        match entry.pred {
            Some((pred_idx, pred_out_wire)) => {
                node_idx = pred_idx;
                out_wire = pred_out_wire;
            }
            None => break,
        }
    }

    PathResult { tile_paths, sink_wire }
}
