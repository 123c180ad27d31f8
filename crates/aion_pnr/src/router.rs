//! The negotiated-congestion outer loop (C6): iterates rip-up/reroute over a
//! net set until no resource is shared, or `config.max_iterations` is spent.
//!
//! Grounded on SPEC_FULL.md §4.6's `routeNets`/`routeIteration`/`buildBranches`
//! description; the per-net/per-sink A* call itself lives in [`crate::astar`].

use crate::astar::{self, AStarSeed};
use crate::net::Net;
use crate::resources::ResourceTable;
use aion_arch::resource::OWNED_BY_CURRENT_NET;
use aion_arch::{DeviceTables, InterTileGraph, PipGraph, RoutingBranch, TemplateDest, TileId, TileTypeId, VertexId};
use aion_config::RouterConfig;
use aion_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use aion_source::Span;
use std::collections::HashSet;

use crate::net::NetSource;

/// Drives the negotiated-congestion loop over a set of nets sharing one
/// device and resource table.
pub struct Router<'a> {
    tables: &'a DeviceTables,
    pip_graphs: &'a [PipGraph],
    inter_tile: &'a InterTileGraph,
    config: RouterConfig,
    node_cost: f64,
    next_run_id: i64,
}

struct SeedInfo {
    seed: AStarSeed,
    /// If the source's entry wire has no downhill PIP of its own (a bare site
    /// pin with no pre-routed fan-out), the seed actually starts one node-hop
    /// further in; this is that hop, spliced back in by `build_branches`.
    jump: Option<TemplateDest>,
    source_idx: usize,
}

impl<'a> Router<'a> {
    /// Builds a router over a fixed device (tables, per-type PIP graphs, and
    /// inter-tile template), configured by `config`.
    pub fn new(
        tables: &'a DeviceTables,
        pip_graphs: &'a [PipGraph],
        inter_tile: &'a InterTileGraph,
        config: RouterConfig,
    ) -> Self {
        Self {
            tables,
            pip_graphs,
            inter_tile,
            config,
            node_cost: 1.0,
            next_run_id: 0,
        }
    }

    fn bump_run_id(&mut self) -> i64 {
        self.next_run_id += 1;
        self.next_run_id
    }

    /// Runs the negotiated-congestion loop to completion: iterates rip-up and
    /// reroute until no net has a conflict, or `config.max_iterations` is
    /// spent (in which case a non-fatal diagnostic reports the best-effort
    /// result).
    pub fn route_nets(&mut self, nets: &mut [Net], resources: &mut ResourceTable, diagnostics: &DiagnosticSink) {
        let mut conflict_wires: HashSet<(TileId, VertexId)> = HashSet::new();
        let mut iter: u32 = 0;

        loop {
            iter += 1;
            nets.sort_by(crate::net::by_tot_cost_desc);
            self.route_iteration(nets, resources, iter == 1, diagnostics);

            let increment = self.node_cost;
            self.node_cost = (self.node_cost * 2.0).min(self.config.node_cost_cap);
            for net in nets.iter_mut() {
                net.update_node_costs(increment, &mut conflict_wires, resources);
            }
            for &(tile, vertex) in &conflict_wires {
                resources.get_mut(tile, vertex).update_historic_cost(1.0);
            }
            conflict_wires.clear();

            let any_conflicts = nets.iter_mut().any(|n| n.has_conflicts(resources));
            if !any_conflicts {
                break;
            }
            if iter >= self.config.max_iterations {
                diagnostics.emit(Diagnostic::warning(
                    DiagnosticCode::new(Category::Warning, 610),
                    format!("routing did not converge within {} iterations; emitting best-effort result", self.config.max_iterations),
                    Span::DUMMY,
                ));
                break;
            }
        }
    }

    fn route_iteration(
        &mut self,
        nets: &mut [Net],
        resources: &mut ResourceTable,
        is_first_iteration: bool,
        diagnostics: &DiagnosticSink,
    ) {
        for net in nets.iter_mut() {
            if !is_first_iteration {
                if net.has_conflicts(resources) {
                    net.rip_branches_with_conflict(self.node_cost, self.config.rip_cost_clamp, resources);
                } else {
                    continue;
                }
            }
            self.route_net(net, resources, diagnostics);
            resources.reset_owned_markers();
        }
    }

    /// Routes every unrouted sink of one net, reusing its sources' existing
    /// (possibly already partially built) trees.
    fn route_net(&mut self, net: &mut Net, resources: &mut ResourceTable, diagnostics: &DiagnosticSink) {
        let mut seed_infos = Vec::new();
        for (source_idx, source) in net.sources.iter().enumerate() {
            if let Some((seed, jump)) = self.derive_seed(source) {
                seed_infos.push(SeedInfo { seed, jump, source_idx });
            }
        }
        if seed_infos.is_empty() {
            diagnostics.emit(Diagnostic::warning(
                DiagnosticCode::new(Category::Warning, 611),
                format!("net {:?} has no reachable source entry point", net.name),
                Span::DUMMY,
            ));
            return;
        }
        let seeds: Vec<AStarSeed> = seed_infos.iter().map(|s| s.seed).collect();

        for sink_idx in 0..net.sinks.len() {
            if net.sinks[sink_idx].is_routed {
                continue;
            }

            let (target_x, target_y, sink_tile, sink_vertex) = {
                let sink = &net.sinks[sink_idx];
                let rec = &self.tables.tiles[sink.tile.as_raw() as usize];
                let type_idx = sink.tile_type.as_raw() as usize;
                let Some(vertex) = self.pip_graphs[type_idx].convert_wire_to_idx(sink.wire) else {
                    diagnostics.emit(Diagnostic::warning(
                        DiagnosticCode::new(Category::Warning, 612),
                        format!("net {:?}: sink {sink_idx} wire not found in its tile's switch-box graph", net.name),
                        Span::DUMMY,
                    ));
                    continue;
                };
                (rec.x, rec.y, sink.tile, vertex)
            };

            resources.get_mut(sink_tile, sink_vertex).present_cost = 0.0;
            let run_id = self.bump_run_id();
            let result = astar::find_path(
                self.tables,
                self.pip_graphs,
                self.inter_tile,
                resources,
                self.config.heuristic_multiplier,
                run_id,
                &seeds,
                target_x,
                target_y,
                &net.bbox,
            );
            resources.get_mut(sink_tile, sink_vertex).present_cost = -1.0;

            let Some(path) = result else {
                diagnostics.emit(Diagnostic::warning(
                    DiagnosticCode::new(Category::Warning, 613),
                    format!("net {:?}: no path found to sink {sink_idx} in this iteration", net.name),
                    Span::DUMMY,
                ));
                continue;
            };

            let last_tp = path.tile_paths.last().expect("a found path always crosses at least one tile");
            let matched = seed_infos.iter().find(|s| {
                s.seed.x == last_tp.x
                    && s.seed.y == last_tp.y
                    && s.seed.tile_type == last_tp.tile_type
                    && self.pip_graphs[s.seed.tile_type.as_raw() as usize].convert_wire_to_idx(s.seed.wire_in)
                        == Some(last_tp.wires[0])
            });
            let Some(matched) = matched else {
                diagnostics.emit(Diagnostic::warning(
                    DiagnosticCode::new(Category::Warning, 614),
                    format!("net {:?}: found path did not originate from any known source", net.name),
                    Span::DUMMY,
                ));
                continue;
            };

            let source = &mut net.sources[matched.source_idx];
            build_branches(source, &path.tile_paths, matched.jump, self.tables, self.pip_graphs, resources, self.node_cost, sink_idx);
            net.sinks[sink_idx].is_routed = true;
        }
    }

    /// Resolves a net source's A* entry point, hopping one node across if its
    /// entry wire has no downhill PIP of its own (i.e. it can only leave its
    /// tile through the node it shares with the next one).
    ///
    /// Grounded on SPEC_FULL.md §4.6: "If the source wire is not a PipGraph
    /// vertex, the template graph's entry... lists one or more next-tile
    /// entries — the LAST entry is the one used." In this implementation
    /// every tile-type wire is a `PipGraph` vertex regardless of whether it
    /// has any edges (see `PipGraph::new`), so the literal test is replaced
    /// with the equivalent "has a downhill PIP" check from `DeviceTables`.
    fn derive_seed(&self, source: &NetSource) -> Option<(AStarSeed, Option<TemplateDest>)> {
        let rec = &self.tables.tiles[source.entry_tile.as_raw() as usize];
        let type_idx = source.entry_tile_type.as_raw() as usize;

        if self.tables.wires_with_downhill_pips_by_type[type_idx].contains(&source.entry_wire) {
            return Some((
                AStarSeed {
                    x: rec.x,
                    y: rec.y,
                    tile_type: source.entry_tile_type,
                    wire_in: source.entry_wire,
                },
                None,
            ));
        }

        let template = self.inter_tile.template_for(rec.x, rec.y, source.entry_tile_type)?;
        let dests = template.get(&source.entry_wire)?;
        let dest = *dests.last()?;
        Some((
            AStarSeed {
                x: rec.x + dest.dx,
                y: rec.y + dest.dy,
                tile_type: dest.dest_tile_type,
                wire_in: dest.dest_wire,
            },
            Some(dest),
        ))
    }
}

/// Splices a found path into a source's accumulated routing tree: walks the
/// path source-to-sink, reusing any existing child branch at a shared-prefix
/// fork, creating new ones (charging usage/cost to their resource) otherwise,
/// and marks the terminal branch with `sink_id`.
#[allow(clippy::too_many_arguments)]
fn build_branches(
    source: &mut NetSource,
    tile_paths: &[astar::TilePath],
    jump: Option<TemplateDest>,
    tables: &DeviceTables,
    pip_graphs: &[PipGraph],
    resources: &mut ResourceTable,
    node_cost: f64,
    sink_id: usize,
) {
    let root_rec = &tables.tiles[source.entry_tile.as_raw() as usize];
    let (root_x, root_y) = (root_rec.x, root_rec.y);
    let entry_tile = source.entry_tile;

    if source.tree.is_none() {
        let type_idx = source.entry_tile_type.as_raw() as usize;
        let root_vertex = pip_graphs[type_idx]
            .convert_wire_to_idx(source.entry_wire)
            .expect("a net source's entry wire exists in its own tile's graph");
        source.tree = Some(RoutingBranch::new(0, 0, source.entry_tile_type, root_vertex, false));
    }

    let mut current = source.tree.as_mut().unwrap();

    if let Some(dest) = jump {
        let type_idx = dest.dest_tile_type.as_raw() as usize;
        let vertex = pip_graphs[type_idx]
            .convert_wire_to_idx(dest.dest_wire)
            .expect("a template destination's wire exists in its own tile's graph");
        let idx = descend(current, entry_tile, dest.dx, dest.dy, dest.dest_tile_type, vertex, true, resources, node_cost);
        current = &mut current.children[idx];
    }

    let ordered: Vec<&astar::TilePath> = tile_paths.iter().rev().collect();
    for (tp_idx, tp) in ordered.iter().enumerate() {
        let dx = tp.x - root_x;
        let dy = tp.y - root_y;
        let start_wire_idx = if tp_idx == 0 { 1 } else { 0 };
        for w_idx in start_wire_idx..tp.wires.len() {
            let vertex = tp.wires[w_idx];
            let is_first_wire_of_tile = w_idx == 0;
            let idx = descend(current, entry_tile, dx, dy, tp.tile_type, vertex, is_first_wire_of_tile, resources, node_cost);
            current = &mut current.children[idx];
        }
    }

    current.sink_id = sink_id as i32;
}

/// Finds an existing child matching `(dx, dy, tile_type, vertex)` (shared-
/// prefix reuse when the net forks), or creates one, charging usage/cost to
/// the resource it occupies. Returns the child's index within `parent.children`.
#[allow(clippy::too_many_arguments)]
fn descend(
    parent: &mut RoutingBranch,
    entry_tile: TileId,
    dx: i32,
    dy: i32,
    tile_type: TileTypeId,
    vertex: VertexId,
    is_first_wire_of_tile: bool,
    resources: &mut ResourceTable,
    node_cost: f64,
) -> usize {
    if let Some(i) = parent
        .children
        .iter()
        .position(|c| c.dx == dx && c.dy == dy && c.tile_type == tile_type && c.wire_graph_idx == vertex)
    {
        return i;
    }

    let tile_id = resources
        .resolve_tile(entry_tile, dx, dy)
        .expect("build_branches only visits tiles the search actually reached");
    let r = resources.get_mut(tile_id, vertex);
    r.explored_id = OWNED_BY_CURRENT_NET;
    if r.present_cost > -1.0 {
        r.increment_usage();
        r.present_cost += node_cost;
    }
    parent.children.push(RoutingBranch::new(dx, dy, tile_type, vertex, is_first_wire_of_tile));
    parent.children.len() - 1
}
