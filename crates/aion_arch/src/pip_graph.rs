//! Per-tile-type switch-box PIP graph.
//!
//! Every tile of a given [`TileTypeId`](crate::ids::TileTypeId) shares exactly
//! one `PipGraph`: a directed graph whose vertices are the tile type's wires
//! and whose edges are its PIPs. Grounded on `pip_graph.h`'s `pip_graph` class.

use crate::ids::VertexId;
use crate::resource::{WireResource, OWNED_BY_CURRENT_NET, ROOT_PARENT};
use aion_common::Ident;
use std::collections::{HashMap, HashSet, VecDeque};

/// The switch-box routing graph for one tile type.
///
/// Vertices are dense `VertexId`s local to this graph; `wire_to_vertex`/
/// `vertex_to_wire` translate to and from the device's interned wire names.
#[derive(Debug, Clone)]
pub struct PipGraph {
    wire_to_vertex: HashMap<Ident, VertexId>,
    vertex_to_wire: Vec<Ident>,
    adjacency: Vec<Vec<VertexId>>,
    reverse_adjacency: Vec<Vec<VertexId>>,
    is_output: Vec<bool>,
    /// Default (never-yet-used) resource state for each vertex, used to seed
    /// a fresh per-tile-instance resource table.
    pub default_resources: Vec<WireResource>,
}

impl PipGraph {
    /// Creates an empty graph over the given set of wires (by interned name).
    ///
    /// `wires` determines the dense vertex numbering; duplicates are ignored.
    pub fn new(wires: impl IntoIterator<Item = Ident>) -> Self {
        let mut wire_to_vertex = HashMap::new();
        let mut vertex_to_wire = Vec::new();
        for wire in wires {
            if wire_to_vertex.contains_key(&wire) {
                continue;
            }
            let id = VertexId::from_raw(vertex_to_wire.len() as u32);
            wire_to_vertex.insert(wire, id);
            vertex_to_wire.push(wire);
        }
        let v = vertex_to_wire.len();
        Self {
            wire_to_vertex,
            vertex_to_wire,
            adjacency: vec![Vec::new(); v],
            reverse_adjacency: vec![Vec::new(); v],
            is_output: vec![false; v],
            default_resources: vec![WireResource::new(); v],
        }
    }

    /// Number of vertices (distinct wires) in this graph.
    pub fn vertex_count(&self) -> usize {
        self.vertex_to_wire.len()
    }

    /// Adds a directed PIP edge from wire `u` to wire `v`. Both must already
    /// be vertices of this graph (added via [`new`](Self::new)).
    pub fn add_edge(&mut self, u: Ident, v: Ident) {
        let u_idx = self.wire_to_vertex[&u];
        let v_idx = self.wire_to_vertex[&v];
        self.adjacency[u_idx.as_raw() as usize].push(v_idx);
        self.reverse_adjacency[v_idx.as_raw() as usize].push(u_idx);
    }

    /// Converts a wire name to its vertex index in this graph, if present.
    pub fn convert_wire_to_idx(&self, wire: Ident) -> Option<VertexId> {
        self.wire_to_vertex.get(&wire).copied()
    }

    /// Converts a vertex index back to its wire name.
    pub fn convert_idx_to_wire(&self, idx: VertexId) -> Ident {
        self.vertex_to_wire[idx.as_raw() as usize]
    }

    /// Marks `outputs` as boundary-output vertices (reachable destinations for
    /// a search to terminate on) and forbids routing through any vertex in
    /// `forbidden` by setting its default present cost to `-1.0`.
    pub fn set_output_wires(&mut self, outputs: &HashSet<Ident>, forbidden: &HashSet<Ident>) {
        for &wire in outputs {
            let Some(idx) = self.wire_to_vertex.get(&wire).copied() else {
                continue;
            };
            self.is_output[idx.as_raw() as usize] = true;
            if forbidden.contains(&wire) {
                self.default_resources[idx.as_raw() as usize].present_cost = -1.0;
            }
        }
    }

    /// Cost-aware single-source search used during A* to find every reachable
    /// output vertex from `start`, honoring per-tile-instance resource costs.
    ///
    /// `resources` must be sized `vertex_count()` and indexed by this graph's
    /// `VertexId`s; it is the live, per-tile-instance resource table (not
    /// `default_resources`). `search_id` distinguishes this call from others
    /// sharing the same `resources` table — resources already touched with a
    /// different id are treated as unexplored.
    ///
    /// `pruning_bound`, if given, stops exploring any branch whose cost would
    /// meet or exceed it (used once a cheaper path to a destination is already
    /// known, mirroring the original's two-overload `findOutputs`).
    pub fn find_reachable(
        &self,
        start: VertexId,
        resources: &mut [WireResource],
        cost_so_far: f64,
        search_id: i64,
        pruning_bound: Option<f64>,
    ) -> Vec<(f64, VertexId)> {
        let mut found = Vec::new();
        let mut queue: VecDeque<(f64, VertexId)> = VecDeque::new();

        let start_idx = start.as_raw() as usize;
        resources[start_idx].parent = ROOT_PARENT;
        resources[start_idx].cost_parent = 0.0;
        resources[start_idx].explored_id = search_id;
        queue.push_back((cost_so_far, start));

        while let Some((cost, idx)) = queue.pop_front() {
            for &w in &self.adjacency[idx.as_raw() as usize] {
                let w_idx = w.as_raw() as usize;
                let owned_by_current_net = resources[w_idx].explored_id == OWNED_BY_CURRENT_NET;
                if owned_by_current_net {
                    if resources[w_idx].parent != idx.as_raw() as i32 {
                        continue;
                    }
                    if resources[w_idx].cost_parent == 0.0 {
                        queue.push_back((cost, w));
                    } else {
                        resources[w_idx].cost_parent = cost;
                        queue.push_back((cost + resources[w_idx].cost(), w));
                    }
                } else if resources[w_idx].is_forbidden() {
                    continue;
                } else if let Some(bound) = pruning_bound {
                    if resources[w_idx].cost() + cost >= bound {
                        continue;
                    }
                    if resources[w_idx].explored_id != search_id {
                        resources[w_idx].explored_id = search_id;
                        resources[w_idx].parent = idx.as_raw() as i32;
                        resources[w_idx].cost_parent = cost;
                        queue.push_back((cost + resources[w_idx].cost(), w));
                    } else if resources[w_idx].cost_parent > cost {
                        resources[w_idx].parent = idx.as_raw() as i32;
                        resources[w_idx].cost_parent = cost;
                        queue.push_back((resources[w_idx].cost() + cost, w));
                    }
                } else if resources[w_idx].explored_id != search_id {
                    resources[w_idx].explored_id = search_id;
                    resources[w_idx].parent = idx.as_raw() as i32;
                    resources[w_idx].cost_parent = cost;
                    queue.push_back((cost + resources[w_idx].cost(), w));
                } else if resources[w_idx].cost_parent > cost {
                    resources[w_idx].parent = idx.as_raw() as i32;
                    resources[w_idx].cost_parent = cost;
                    queue.push_back((resources[w_idx].cost() + cost, w));
                }
            }
            if self.is_output[idx.as_raw() as usize] {
                found.push((cost, idx));
            }
        }
        found
    }

    /// Plain forward reachability from `start`, ignoring costs and resources.
    /// Used to build the pre-routed fan-out segments (C4) and the inter-tile
    /// template (C3).
    pub fn find_outputs_plain(&self, start: Ident) -> Vec<VertexId> {
        let Some(start_idx) = self.wire_to_vertex.get(&start).copied() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start_idx);
        while let Some(idx) = queue.pop_front() {
            for &w in &self.adjacency[idx.as_raw() as usize] {
                out.push(w);
            }
        }
        out
    }

    /// Plain backward reachability (uphill) from `start`. Used to build the
    /// pre-routed fan-in segments (C4).
    pub fn find_inputs_plain(&self, start: Ident) -> Vec<VertexId> {
        let Some(start_idx) = self.wire_to_vertex.get(&start).copied() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start_idx);
        while let Some(idx) = queue.pop_front() {
            for &w in &self.reverse_adjacency[idx.as_raw() as usize] {
                out.push(w);
            }
        }
        out
    }
}
