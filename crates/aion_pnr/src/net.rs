//! The routed net model (C5): sources, sinks, bounding box, accumulated
//! routing tree, and the rip-up/cost-update operations the negotiated
//! congestion loop drives.
//!
//! Grounded on the teacher's `route_tree.rs`/`data.rs` (the per-net state a
//! routed design carries) and `routing/congestion.rs` (rip-up/cost-update
//! shape), generalized to the tree-of-`RoutingBranch` representation and the
//! richer per-resource state `aion_arch::resource::WireResource` already
//! carries.

use crate::resources::ResourceTable;
use aion_arch::{RoutingBranch, TileId, TileTypeId, VertexId};
use aion_common::Ident;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A net's driving source: the entry point the router's A* search starts
/// from, plus the accumulated routing tree rooted there.
#[derive(Debug, Clone)]
pub struct NetSource {
    /// Tile the source's entry wire lives in. For a source with a pre-routed
    /// fan-out segment, this is the `"INT"`-side tile the segment ends at,
    /// not the site tile itself.
    pub entry_tile: TileId,
    /// Tile type of `entry_tile`.
    pub entry_tile_type: TileTypeId,
    /// The wire the router's search starts from within `entry_tile`.
    pub entry_wire: Ident,
    /// Fixed fan-out segment spliced in ahead of `entry_tile`/`entry_wire` at
    /// emission time, if the source pin had one.
    pub prerouted_prefix: Option<RoutingBranch>,
    /// The net's own accumulated routing tree, rooted at `entry_wire`. `None`
    /// until the first sink reaches this source.
    pub tree: Option<RoutingBranch>,
}

/// A net's sink: where the router must land a routed path, and the bookkeeping
/// needed to re-attach the fixed fan-in segment and the external stub at
/// emission time.
#[derive(Debug, Clone)]
pub struct NetSink {
    /// Index of this sink within its net's `sinks` list; mirrored into the
    /// terminating `RoutingBranch::sink_id` once routed.
    pub sink_id: usize,
    /// Tile the sink's entry wire lives in (the `"INT"`-side tile if this
    /// sink has a pre-routed fan-in segment, else the site tile itself).
    pub tile: TileId,
    /// Tile type of `tile`.
    pub tile_type: TileTypeId,
    /// The wire the router's search must reach within `tile`.
    pub wire: Ident,
    /// Site name, for matching this sink back to its external stub at emission.
    pub site_name: String,
    /// Pin name, for matching this sink back to its external stub at emission.
    pub pin_name: String,
    /// Whether the router has found a path to this sink in the current tree.
    pub is_routed: bool,
    /// Manhattan distance from the net's (first) source, used to route
    /// long sinks first.
    pub distance: i64,
    /// Fixed fan-in segment spliced in after the routed path at emission
    /// time, if the sink pin had one. Its root is the `"INT"`-side wire
    /// (`tile`/`wire` above); its leaves reach the site pin.
    pub prerouted_suffix: Option<RoutingBranch>,
}

/// Axis-aligned tile-grid bounding box used to prune the A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Minimum (leftmost) column.
    pub min_x: i32,
    /// Minimum (topmost) row.
    pub min_y: i32,
    /// Maximum (rightmost) column.
    pub max_x: i32,
    /// Maximum (bottommost) row.
    pub max_y: i32,
}

impl BoundingBox {
    /// Builds the smallest box spanning every `(x, y)` point given, or a
    /// degenerate single-point box at the origin if `points` is empty.
    pub fn spanning(points: impl IntoIterator<Item = (i32, i32)>) -> Self {
        let mut iter = points.into_iter();
        let Some((x0, y0)) = iter.next() else {
            return Self { min_x: 0, min_y: 0, max_x: 0, max_y: 0 };
        };
        let mut bb = Self { min_x: x0, min_y: y0, max_x: x0, max_y: y0 };
        for (x, y) in iter {
            bb.min_x = bb.min_x.min(x);
            bb.min_y = bb.min_y.min(y);
            bb.max_x = bb.max_x.max(x);
            bb.max_y = bb.max_y.max(y);
        }
        bb
    }

    /// Returns a copy of this box padded outward by `pad_x`/`pad_y` tiles.
    pub fn padded(self, pad_x: i32, pad_y: i32) -> Self {
        Self {
            min_x: self.min_x - pad_x,
            min_y: self.min_y - pad_y,
            max_x: self.max_x + pad_x,
            max_y: self.max_y + pad_y,
        }
    }

    /// Whether `(x, y)` falls inside this box, inclusive of the boundary.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// One logical net being routed: its sources, sinks, bounding box, and
/// accumulated cost.
#[derive(Debug, Clone)]
pub struct Net {
    /// Net name, carried through from the external design for diagnostics
    /// and emission.
    pub name: String,
    /// Driving sources (almost always exactly one; more than one only for
    /// clock-like fixed topologies the adapter pre-splits).
    pub sources: Vec<NetSource>,
    /// Sinks to route to.
    pub sinks: Vec<NetSink>,
    /// Bounding box pruning the A* search.
    pub bbox: BoundingBox,
    /// Accumulated congestion cost, recomputed by [`Net::update_node_costs`].
    pub tot_cost: f64,
}

impl Net {
    /// Builds a net from its adapter-resolved sources and sinks.
    pub fn new(name: String, sources: Vec<NetSource>, sinks: Vec<NetSink>, bbox: BoundingBox) -> Self {
        Self { name, sources, sinks, bbox, tot_cost: 0.0 }
    }

    /// Whether every sink has been routed.
    pub fn is_fully_routed(&self) -> bool {
        self.sinks.iter().all(|s| s.is_routed)
    }

    /// True iff any resource this net's tree owns is also owned by another
    /// net (`usage > 1`).
    pub fn has_conflicts(&self, resources: &mut ResourceTable) -> bool {
        self.sources
            .iter()
            .filter_map(|s| s.tree.as_ref().map(|root| (root, s.entry_tile)))
            .any(|(root, tile)| branch_has_conflict(root, tile, resources))
    }

    /// Rips up every branch belonging to a congested linear run (bounded by a
    /// fork or a sink), clearing the `is_routed` flag of any sink the run
    /// terminates at. A fork all of whose sub-branches are ripped is itself
    /// ripped, propagating up to the next surviving fork or the tree root.
    pub fn rip_branches_with_conflict(&mut self, node_cost: f64, rip_cost_clamp: f64, resources: &mut ResourceTable) {
        let mut cleared_sinks = Vec::new();
        for source in &mut self.sources {
            let Some(root) = source.tree.as_mut() else { continue };
            if rip_subtree(root, source.entry_tile, resources, node_cost, rip_cost_clamp, false, &mut cleared_sinks) {
                source.tree = None;
            }
        }
        for sink_id in cleared_sinks {
            self.sinks[sink_id].is_routed = false;
        }
    }

    /// Unconditionally rips the entire net: every owned resource's usage and
    /// present cost is decremented, every source's tree is cleared, and
    /// every sink's `is_routed` flag is reset.
    pub fn rip_all(&mut self, node_cost: f64, resources: &mut ResourceTable) {
        for source in &mut self.sources {
            if let Some(root) = source.tree.take() {
                rip_all_subtree(&root, source.entry_tile, resources, node_cost);
            }
        }
        for sink in &mut self.sinks {
            sink.is_routed = false;
        }
    }

    /// Walks the whole tree, charging `increment` to every owned resource's
    /// present cost, recomputing `tot_cost` from scratch, and recording every
    /// overused resource into `conflict_set` for the shared historic-cost
    /// bump the outer loop applies afterward.
    pub fn update_node_costs(
        &mut self,
        increment: f64,
        conflict_set: &mut HashSet<(TileId, VertexId)>,
        resources: &mut ResourceTable,
    ) {
        let mut tot_cost = 0.0;
        for source in &self.sources {
            if let Some(root) = &source.tree {
                update_costs_subtree(root, source.entry_tile, increment, conflict_set, resources, &mut tot_cost);
            }
        }
        self.tot_cost = tot_cost;
    }

    /// Whether `(x, y)` falls inside this net's bounding box.
    pub fn is_inside_bounding_box(&self, x: i32, y: i32) -> bool {
        self.bbox.contains(x, y)
    }

    /// Grows the bounding box by one tile on every side.
    ///
    /// Not called by the router's outer loop (see DESIGN.md's Open Question
    /// resolution); kept as an escalation knob for a caller that wants to
    /// retry a stubborn unroutable sink with a wider search.
    pub fn enlarge_bounding_box(&mut self) {
        self.bbox = self.bbox.padded(1, 1);
    }
}

/// Orders nets by descending `tot_cost`, so the router works on its most
/// expensive (most congested) nets first.
pub fn by_tot_cost_desc(a: &Net, b: &Net) -> Ordering {
    b.tot_cost.partial_cmp(&a.tot_cost).unwrap_or(Ordering::Equal)
}

fn branch_has_conflict(branch: &RoutingBranch, root: TileId, resources: &mut ResourceTable) -> bool {
    if !branch.is_sink() {
        let tile = resources
            .resolve_tile(root, branch.dx, branch.dy)
            .expect("a net's own branch always resolves to a real tile");
        if resources.get(tile, branch.wire_graph_idx).usage > 1 {
            return true;
        }
    }
    branch.children.iter().any(|c| branch_has_conflict(c, root, resources))
}

/// Whether any resource on the linear run starting at `node` (the chain of
/// single-child, non-sink branches down to the next fork or sink) is
/// congested. Checked before any ripping so a conflict anywhere on the run
/// — not just at `node` itself — is caught.
fn run_has_conflict(node: &RoutingBranch, root: TileId, resources: &mut ResourceTable) -> bool {
    let mut current = node;
    loop {
        if !current.is_sink() {
            let tile = resources
                .resolve_tile(root, current.dx, current.dy)
                .expect("a net's own branch always resolves to a real tile");
            if resources.get(tile, current.wire_graph_idx).usage > 1 {
                return true;
            }
        }
        if current.children.len() != 1 || current.is_sink() {
            return false;
        }
        current = &current.children[0];
    }
}

/// Returns the run's terminating fork or sink without mutating anything.
fn find_run_end(node: &mut RoutingBranch) -> &mut RoutingBranch {
    let mut current = node;
    while current.children.len() == 1 && !current.is_sink() {
        current = &mut current.children[0];
    }
    current
}

/// Decrements every resource on the run from `node` to its terminating fork
/// or sink: the unclamped `node_cost` for every resource strictly before the
/// terminus, and `node_cost` clamped to `rip_cost_clamp` for the terminus
/// itself — mirroring `ripBranchSegment`, where only the final resource of a
/// ripped run gets the clamp. A forbidden sink resource just clears that
/// sink's routed flag instead of being decremented; a forbidden resource
/// that is the first wire of its tile is otherwise left untouched, except at
/// the terminus, which is always decremented unless it is a forbidden sink.
/// Returns a mutable reference to the terminus so the caller can recurse
/// into its children.
fn rip_segment<'a>(
    node: &'a mut RoutingBranch,
    root: TileId,
    resources: &mut ResourceTable,
    node_cost: f64,
    rip_cost_clamp: f64,
    cleared_sinks: &mut Vec<usize>,
) -> &'a mut RoutingBranch {
    let mut current = node;
    loop {
        let is_end = current.children.len() != 1 || current.is_sink();
        let tile = resources
            .resolve_tile(root, current.dx, current.dy)
            .expect("a net's own branch always resolves to a real tile");
        let forbidden = resources.get(tile, current.wire_graph_idx).is_forbidden();

        if forbidden && current.is_sink() {
            cleared_sinks.push(current.sink_id as usize);
        } else if is_end || !forbidden || !current.is_first_wire_of_tile {
            let r = resources.get_mut(tile, current.wire_graph_idx);
            r.decrement_usage();
            r.present_cost -= if is_end { node_cost.min(rip_cost_clamp) } else { node_cost };
        }

        if is_end {
            return current;
        }
        current = &mut current.children[0];
    }
}

/// Rips `node`'s linear run, and recursively its descendants, if the run (or
/// any ancestor run) is congested. `forced` carries a conflict found on an
/// ancestor chain down into every recursive call once set, so a torn-out
/// parent can never leave a non-conflicted child's usage un-decremented — a
/// non-conflicted leaf dragged down by a conflicted ancestor is still
/// unconditionally ripped, matching `ripBranch`'s `haveConflict`-by-value
/// threading. A fork whose children are all ripped (whether by their own
/// conflict or by this same rule) is itself ripped, propagating the tear-out
/// up towards the root. Returns whether `node` (and the edge leading into
/// it) should be dropped by the caller.
fn rip_subtree(
    node: &mut RoutingBranch,
    root: TileId,
    resources: &mut ResourceTable,
    node_cost: f64,
    rip_cost_clamp: f64,
    forced: bool,
    cleared_sinks: &mut Vec<usize>,
) -> bool {
    let conflict = forced || run_has_conflict(node, root, resources);

    if conflict {
        let end = rip_segment(node, root, resources, node_cost, rip_cost_clamp, cleared_sinks);
        if end.is_sink() && end.children.is_empty() {
            return true;
        }
        let children = std::mem::take(&mut end.children);
        for mut child in children {
            rip_subtree(&mut child, root, resources, node_cost, rip_cost_clamp, true, cleared_sinks);
        }
        return true;
    }

    let end = find_run_end(node);
    if end.is_sink() && end.children.is_empty() {
        return false;
    }
    let children = std::mem::take(&mut end.children);
    let mut remaining = Vec::with_capacity(children.len());
    for mut child in children {
        if rip_subtree(&mut child, root, resources, node_cost, rip_cost_clamp, false, cleared_sinks) {
            continue;
        }
        remaining.push(child);
    }
    let all_children_removed = remaining.is_empty();
    end.children = remaining;

    if all_children_removed {
        rip_segment(node, root, resources, node_cost, rip_cost_clamp, cleared_sinks);
        true
    } else {
        false
    }
}

fn rip_all_subtree(node: &RoutingBranch, root: TileId, resources: &mut ResourceTable, node_cost: f64) {
    if !node.is_sink() {
        let tile = resources
            .resolve_tile(root, node.dx, node.dy)
            .expect("a net's own branch always resolves to a real tile");
        let r = resources.get_mut(tile, node.wire_graph_idx);
        r.decrement_usage();
        r.present_cost -= node_cost;
    }
    for child in &node.children {
        rip_all_subtree(child, root, resources, node_cost);
    }
}

fn update_costs_subtree(
    node: &RoutingBranch,
    root: TileId,
    increment: f64,
    conflict_set: &mut HashSet<(TileId, VertexId)>,
    resources: &mut ResourceTable,
    tot_cost: &mut f64,
) {
    if !node.is_sink() {
        let tile = resources
            .resolve_tile(root, node.dx, node.dy)
            .expect("a net's own branch always resolves to a real tile");
        let r = resources.get_mut(tile, node.wire_graph_idx);
        r.present_cost += increment;
        if r.usage > 1 {
            conflict_set.insert((tile, node.wire_graph_idx));
            *tot_cost += (increment * 2.0 * r.usage as f64 + 1.0) * (r.historic_cost + r.usage as f64);
        } else {
            *tot_cost += r.cost();
            r.historic_cost += r.usage.saturating_sub(1) as f64;
        }
    }
    for child in &node.children {
        update_costs_subtree(child, root, increment, conflict_set, resources, tot_cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::device::{build_device_tables, build_pip_graphs};

    fn one_resource_net() -> (aion_arch::DeviceTables, Vec<aion_arch::PipGraph>, Net) {
        let desc = crate::test_fixtures::tiny_int_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let tile = tables.tile_name_to_tile[&tables.interner.get_or_intern("INT_X5Y5")];
        let in_wire = tables.interner.get_or_intern("IN");
        let int_type: TileTypeId = tables.int_tile_type;
        let vertex = pip_graphs[int_type.as_raw() as usize].convert_wire_to_idx(in_wire).unwrap();

        let root = RoutingBranch::new(0, 0, int_type, vertex, false);
        let source = NetSource {
            entry_tile: tile,
            entry_tile_type: int_type,
            entry_wire: in_wire,
            prerouted_prefix: None,
            tree: Some(root),
        };
        let net = Net::new(
            "n0".to_string(),
            vec![source],
            vec![],
            BoundingBox::spanning([(5, 5)]).padded(3, 15),
        );
        (tables, pip_graphs, net)
    }

    #[test]
    fn fresh_net_has_no_conflicts() {
        let (tables, pip_graphs, net) = one_resource_net();
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        assert!(!net.has_conflicts(&mut resources));
    }

    #[test]
    fn conflict_detected_when_usage_exceeds_one() {
        let (tables, pip_graphs, net) = one_resource_net();
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        let root = net.sources[0].tree.as_ref().unwrap();
        let tile = resources.resolve_tile(net.sources[0].entry_tile, root.dx, root.dy).unwrap();
        resources.get_mut(tile, root.wire_graph_idx).increment_usage();
        resources.get_mut(tile, root.wire_graph_idx).increment_usage();
        assert!(net.has_conflicts(&mut resources));
    }

    #[test]
    fn rip_all_clears_tree_and_decrements_usage() {
        let (tables, pip_graphs, mut net) = one_resource_net();
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        let tile = net.sources[0].entry_tile;
        let vertex = net.sources[0].tree.as_ref().unwrap().wire_graph_idx;
        resources.get_mut(tile, vertex).increment_usage();
        resources.get_mut(tile, vertex).present_cost += 5.0;

        net.rip_all(5.0, &mut resources);

        assert!(net.sources[0].tree.is_none());
        assert_eq!(resources.get(tile, vertex).usage, 0);
    }

    #[test]
    fn bounding_box_contains_padded_region() {
        let bb = BoundingBox::spanning([(5, 5), (5, 8)]).padded(3, 15);
        assert!(bb.contains(5, 5));
        assert!(bb.contains(5, 8));
        assert!(bb.contains(8, 20));
        assert!(!bb.contains(9, 21));
    }

    #[test]
    fn comparator_orders_descending() {
        let mut a = one_resource_net().2;
        a.tot_cost = 3.0;
        let mut b = one_resource_net().2;
        b.tot_cost = 9.0;
        let mut nets = vec![a, b];
        nets.sort_by(by_tot_cost_desc);
        assert_eq!(nets[0].tot_cost, 9.0);
    }
}
