//! Design adapter (C7): translates between the abstract external netlist
//! shapes (§6) and this crate's `Net`/`ResourceTable` model.
//!
//! Grounded on SPEC_FULL.md §4.7/§6 and `aion_arch::prerouted`'s fan-in/fan-out
//! trees, which this module splices onto a net's source/sink entry points.
//! The concrete binary wire format is out of scope here, as it is for the
//! spec itself — a decoder/encoder plugs in by producing/consuming the
//! `ExternalNet`/`RoutedExternalNet` shapes below.

use crate::error::IngestError;
use crate::net::{BoundingBox, Net, NetSink, NetSource};
use crate::resources::ResourceTable;
use aion_arch::{
    build_prerouted_paths, DeviceTables, PipGraph, PreroutedPaths, RoutingBranch, TileId,
    TileTypeId, VertexId,
};
use aion_common::Ident;

/// Which way a stub's traffic flows relative to the net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubDirection {
    /// A site pin that drives the net.
    Source,
    /// A site pin fed by the net.
    Sink,
}

/// One unrouted (or not-yet-matched) site-pin endpoint of an external net.
#[derive(Debug, Clone)]
pub struct ExternalStub {
    pub site_name: String,
    pub pin_name: String,
    pub direction: StubDirection,
}

/// One already-configured PIP, as found on ingest or produced on emission.
#[derive(Debug, Clone)]
pub struct ExternalPip {
    pub tile_name: String,
    pub wire0_name: String,
    pub wire1_name: String,
}

/// The adapter's ingest input: one external net as the decoder produced it.
#[derive(Debug, Clone)]
pub struct ExternalNet {
    pub name: String,
    pub stubs: Vec<ExternalStub>,
    pub fixed_pips: Vec<ExternalPip>,
}

/// The adapter's egress output: a net's chosen PIPs, ready for an encoder.
#[derive(Debug, Clone)]
pub struct RoutedExternalNet {
    pub name: String,
    /// Pre-routed prefix plus router-chosen PIPs, source-to-sink order, one
    /// run per sink reached.
    pub source_pips: Vec<ExternalPip>,
    /// Stubs that were never reached by any routed path.
    pub unrouted_stubs: Vec<ExternalStub>,
}

/// Adapts external nets into/out of this crate's model for one fixed device.
pub struct DesignAdapter<'a> {
    tables: &'a DeviceTables,
    pip_graphs: &'a [PipGraph],
    /// Pre-routed fan-in/fan-out trees, indexed by `TileTypeId::as_raw`.
    prerouted: Vec<PreroutedPaths>,
}

impl<'a> DesignAdapter<'a> {
    /// Builds an adapter over a fixed device, computing each tile type's
    /// pre-routed fan-in/fan-out once up front.
    pub fn new(tables: &'a DeviceTables, pip_graphs: &'a [PipGraph]) -> Self {
        let prerouted = tables
            .tile_types
            .iter()
            .enumerate()
            .map(|(idx, _)| {
                let tile_type = TileTypeId::from_raw(idx as u32);
                match tables.representative_tile.get(&tile_type) {
                    Some(&rep) => build_prerouted_paths(tables, pip_graphs, idx, rep),
                    None => PreroutedPaths::default(),
                }
            })
            .collect();
        Self { tables, pip_graphs, prerouted }
    }

    /// Ingests one external net. Returns `Ok(None)` for a net that is already
    /// routed (no stubs, or fixed clock-like PIPs) after forbidding the PIPs'
    /// endpoints so the router never reuses them; `Ok(Some(net))` otherwise.
    pub fn ingest(
        &self,
        external: &ExternalNet,
        resources: &mut ResourceTable,
        config: &aion_config::RouterConfig,
    ) -> Result<Option<Net>, IngestError> {
        if external.stubs.is_empty() || !external.fixed_pips.is_empty() {
            for pip in &external.fixed_pips {
                self.forbid_pip(&external.name, pip, resources)?;
            }
            return Ok(None);
        }

        let mut sources = Vec::new();
        for stub in external.stubs.iter().filter(|s| s.direction == StubDirection::Source) {
            sources.push(self.resolve_source(&external.name, stub)?);
        }
        if sources.is_empty() {
            return Err(IngestError::MissingSource(external.name.clone()));
        }

        let first_source_tile = &self.tables.tiles[sources[0].entry_tile.as_raw() as usize];
        let mut sinks = Vec::new();
        for stub in external.stubs.iter().filter(|s| s.direction == StubDirection::Sink) {
            let (mut sink, vertex) = self.resolve_sink(&external.name, stub, sinks.len())?;
            sink.distance = ((self.tables.tiles[sink.tile.as_raw() as usize].x - first_source_tile.x).abs()
                + (self.tables.tiles[sink.tile.as_raw() as usize].y - first_source_tile.y).abs()) as i64;
            resources.get_mut(sink.tile, vertex).present_cost = -1.0;
            sinks.push(sink);
        }
        sinks.sort_by(|a, b| b.distance.cmp(&a.distance));
        for (idx, sink) in sinks.iter_mut().enumerate() {
            sink.sink_id = idx;
        }

        let points = sources
            .iter()
            .map(|s| {
                let r = &self.tables.tiles[s.entry_tile.as_raw() as usize];
                (r.x, r.y)
            })
            .chain(sinks.iter().map(|s| {
                let r = &self.tables.tiles[s.tile.as_raw() as usize];
                (r.x, r.y)
            }));
        let bbox = BoundingBox::spanning(points)
            .padded(config.bounding_box_pad_x as i32, config.bounding_box_pad_y as i32);

        Ok(Some(Net::new(external.name.clone(), sources, sinks, bbox)))
    }

    fn forbid_pip(&self, net_name: &str, pip: &ExternalPip, resources: &mut ResourceTable) -> Result<(), IngestError> {
        let tile_name = self.tables.interner.get_or_intern(&pip.tile_name);
        let tile = self
            .tables
            .tile_name_to_tile
            .get(&tile_name)
            .copied()
            .ok_or_else(|| IngestError::UnknownSite { net: net_name.to_string(), site: pip.tile_name.clone() })?;
        let type_idx = self.tables.tiles[tile.as_raw() as usize].tile_type.as_raw() as usize;
        for wire_name in [&pip.wire0_name, &pip.wire1_name] {
            let wire = self.tables.interner.get_or_intern(wire_name);
            if let Some(vertex) = self.pip_graphs[type_idx].convert_wire_to_idx(wire) {
                resources.get_mut(tile, vertex).present_cost = -1.0;
            }
        }
        Ok(())
    }

    fn resolve_site(&self, net_name: &str, stub: &ExternalStub) -> Result<(TileId, u32, Ident), IngestError> {
        let site_name = self.tables.interner.get_or_intern(&stub.site_name);
        let &(tile, slot) = self.tables.site_to_tile_type.get(&site_name).ok_or_else(|| IngestError::UnknownSite {
            net: net_name.to_string(),
            site: stub.site_name.clone(),
        })?;
        let type_idx = self.tables.tiles[tile.as_raw() as usize].tile_type.as_raw() as usize;
        let pin_name = self.tables.interner.get_or_intern(&stub.pin_name);
        let wire = self.tables.tile_types[type_idx].pins_to_wire.get(&(pin_name, slot)).copied().ok_or_else(|| {
            IngestError::UnknownPin { net: net_name.to_string(), site: stub.site_name.clone(), pin: stub.pin_name.clone() }
        })?;
        Ok((tile, slot, wire))
    }

    fn resolve_source(&self, net_name: &str, stub: &ExternalStub) -> Result<NetSource, IngestError> {
        let (site_tile, _slot, wire) = self.resolve_site(net_name, stub)?;
        let site_rec = &self.tables.tiles[site_tile.as_raw() as usize];
        let type_idx = site_rec.tile_type.as_raw() as usize;

        match self.prerouted[type_idx].fan_out.get(&wire) {
            Some(chain) => {
                let leaf = deepest_leaf(chain);
                let entry_tile = self
                    .tables
                    .tile_at
                    .get(&(site_rec.x + leaf.dx, site_rec.y + leaf.dy))
                    .copied()
                    .expect("a pre-routed fan-out path always ends on a real tile");
                let entry_wire = self.pip_graphs[leaf.tile_type.as_raw() as usize].convert_idx_to_wire(leaf.wire_graph_idx);
                Ok(NetSource {
                    entry_tile,
                    entry_tile_type: leaf.tile_type,
                    entry_wire,
                    prerouted_prefix: Some(chain.clone()),
                    tree: None,
                })
            }
            None => Ok(NetSource {
                entry_tile: site_tile,
                entry_tile_type: site_rec.tile_type,
                entry_wire: wire,
                prerouted_prefix: None,
                tree: None,
            }),
        }
    }

    fn resolve_sink(&self, net_name: &str, stub: &ExternalStub, sink_id: usize) -> Result<(NetSink, VertexId), IngestError> {
        let (site_tile, _slot, wire) = self.resolve_site(net_name, stub)?;
        let site_rec = &self.tables.tiles[site_tile.as_raw() as usize];
        let type_idx = site_rec.tile_type.as_raw() as usize;

        let (tile, tile_type, sink_wire, prerouted_suffix) = match self.prerouted[type_idx].fan_in.get(&wire) {
            Some(chain) => {
                let leaf = deepest_leaf(chain);
                let tile = self
                    .tables
                    .tile_at
                    .get(&(site_rec.x - leaf.dx, site_rec.y - leaf.dy))
                    .copied()
                    .expect("a pre-routed fan-in path always originates from a real tile");
                let root_wire = self.pip_graphs[chain.tile_type.as_raw() as usize].convert_idx_to_wire(chain.wire_graph_idx);
                (tile, chain.tile_type, root_wire, Some(chain.clone()))
            }
            None => (site_tile, site_rec.tile_type, wire, None),
        };

        let vertex = self.pip_graphs[tile_type.as_raw() as usize]
            .convert_wire_to_idx(sink_wire)
            .expect("a resolved sink wire exists in its own tile's switch-box graph");

        Ok((
            NetSink {
                sink_id,
                tile,
                tile_type,
                wire: sink_wire,
                site_name: stub.site_name.clone(),
                pin_name: stub.pin_name.clone(),
                is_routed: false,
                distance: 0,
                prerouted_suffix,
            },
            vertex,
        ))
    }

    /// Emits a routed (or partially routed) net back to the external shape.
    ///
    /// Every sink reached contributes the pre-routed prefix (if any), the
    /// router's own PIPs down to that sink, and the pre-routed suffix (if
    /// any); sinks never reached are returned as `unrouted_stubs`.
    pub fn emit(&self, net: &Net) -> RoutedExternalNet {
        let mut source_pips = Vec::new();
        let mut matched_sinks = vec![false; net.sinks.len()];

        for source in &net.sources {
            let Some(root) = &source.tree else { continue };
            if let Some(prefix) = &source.prerouted_prefix {
                self.collect_pips(prefix, source.entry_tile, &mut source_pips);
            }
            for sink_idx in 0..net.sinks.len() {
                if let Some(chain) = find_chain_to_sink(root, sink_idx) {
                    self.collect_chain_pips(&chain, source.entry_tile, &mut source_pips);
                    if let Some(suffix) = &net.sinks[sink_idx].prerouted_suffix {
                        self.collect_pips(suffix, net.sinks[sink_idx].tile, &mut source_pips);
                    }
                    matched_sinks[sink_idx] = true;
                }
            }
        }

        let unrouted_stubs = net
            .sinks
            .iter()
            .enumerate()
            .filter(|(idx, _)| !matched_sinks[*idx])
            .map(|(_, sink)| ExternalStub {
                site_name: sink.site_name.clone(),
                pin_name: sink.pin_name.clone(),
                direction: StubDirection::Sink,
            })
            .collect();

        RoutedExternalNet { name: net.name.clone(), source_pips, unrouted_stubs }
    }

    fn collect_pips(&self, branch: &RoutingBranch, root: TileId, out: &mut Vec<ExternalPip>) {
        let chain = flatten(branch);
        self.collect_chain_pips(&chain, root, out);
    }

    fn collect_chain_pips(&self, chain: &[&RoutingBranch], root: TileId, out: &mut Vec<ExternalPip>) {
        let root_rec = &self.tables.tiles[root.as_raw() as usize];
        for pair in chain.windows(2) {
            let (parent, child) = (pair[0], pair[1]);
            if child.is_first_wire_of_tile {
                continue;
            }
            let tile = self
                .tables
                .tile_at
                .get(&(root_rec.x + child.dx, root_rec.y + child.dy))
                .copied()
                .expect("every routed branch resolves to a real tile");
            let type_idx = child.tile_type.as_raw() as usize;
            let w0 = self.pip_graphs[type_idx].convert_idx_to_wire(parent.wire_graph_idx);
            let w1 = self.pip_graphs[type_idx].convert_idx_to_wire(child.wire_graph_idx);
            out.push(ExternalPip {
                tile_name: self.tables.interner.resolve(self.tables.tiles[tile.as_raw() as usize].name).to_string(),
                wire0_name: self.tables.interner.resolve(w0).to_string(),
                wire1_name: self.tables.interner.resolve(w1).to_string(),
            });
        }
    }
}

/// Walks a routing tree's single-child chain down to its deepest descendant.
fn deepest_leaf(branch: &RoutingBranch) -> &RoutingBranch {
    let mut current = branch;
    while let Some(first) = current.children.first() {
        current = first;
    }
    current
}

/// Flattens a linear (non-forking) branch chain, root first.
fn flatten(branch: &RoutingBranch) -> Vec<&RoutingBranch> {
    let mut chain = vec![branch];
    let mut current = branch;
    while let Some(first) = current.children.first() {
        chain.push(first);
        current = first;
    }
    chain
}

/// Finds the root-to-terminal chain reaching the branch marked with `sink_id`,
/// or `None` if no descendant of `root` carries it.
fn find_chain_to_sink(root: &RoutingBranch, sink_id: usize) -> Option<Vec<&RoutingBranch>> {
    if root.sink_id == sink_id as i32 {
        return Some(vec![root]);
    }
    for child in &root.children {
        if let Some(mut rest) = find_chain_to_sink(child, sink_id) {
            rest.insert(0, root);
            return Some(rest);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::device::{build_device_tables, build_pip_graphs};
    use aion_config::RouterConfig;

    fn stub(site: &str, pin: &str, direction: StubDirection) -> ExternalStub {
        ExternalStub { site_name: site.to_string(), pin_name: pin.to_string(), direction }
    }

    #[test]
    fn ingests_a_routable_net_with_site_pin_endpoints() {
        let desc = crate::test_fixtures::full_chain_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let adapter = DesignAdapter::new(&tables, &pip_graphs);
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        let config = RouterConfig::default();

        let external = ExternalNet {
            name: "n0".to_string(),
            stubs: vec![
                stub("SLICE_X5Y4", "O", StubDirection::Source),
                stub("SLICE_X5Y9", "I", StubDirection::Sink),
            ],
            fixed_pips: vec![],
        };

        let net = adapter.ingest(&external, &mut resources, &config).unwrap().expect("net should be routable");
        assert_eq!(net.sources.len(), 1);
        assert_eq!(net.sinks.len(), 1);
        assert!(!net.sinks[0].is_routed);
    }

    #[test]
    fn skips_and_forbids_an_already_routed_clock_like_net() {
        let desc = crate::test_fixtures::tiny_int_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let adapter = DesignAdapter::new(&tables, &pip_graphs);
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        let config = RouterConfig::default();

        let external = ExternalNet {
            name: "clk".to_string(),
            stubs: vec![],
            fixed_pips: vec![ExternalPip {
                tile_name: "INT_X5Y5".to_string(),
                wire0_name: "IN".to_string(),
                wire1_name: "OUT".to_string(),
            }],
        };

        let net = adapter.ingest(&external, &mut resources, &config).unwrap();
        assert!(net.is_none());

        let tile = tables.tile_name_to_tile[&tables.interner.get_or_intern("INT_X5Y5")];
        let in_wire = tables.interner.get_or_intern("IN");
        let vertex = pip_graphs[tables.int_tile_type.as_raw() as usize].convert_wire_to_idx(in_wire).unwrap();
        assert!(resources.get(tile, vertex).is_forbidden());
    }

    #[test]
    fn unknown_site_is_a_fatal_ingest_error() {
        let desc = crate::test_fixtures::tiny_int_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let adapter = DesignAdapter::new(&tables, &pip_graphs);
        let mut resources = ResourceTable::new(&tables, &pip_graphs);
        let config = RouterConfig::default();

        let external = ExternalNet {
            name: "n0".to_string(),
            stubs: vec![stub("NOPE", "O", StubDirection::Source)],
            fixed_pips: vec![],
        };

        let err = adapter.ingest(&external, &mut resources, &config).unwrap_err();
        assert!(matches!(err, IngestError::UnknownSite { .. }));
    }
}
