//! The inter-tile "template" graph (C3): how a tile's output wires reach
//! neighboring tiles in one node hop, expressed as coordinate offsets so
//! that structurally identical tiles can share a single template.
//!
//! Grounded on `data.cpp`'s `getInterconnectionTileGraph` and `utils.h`'s
//! `dest_t`.

use crate::device::DeviceTables;
use crate::ids::{TileId, TileTypeId};
use aion_common::Ident;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One destination reachable from an output wire via a single node hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateDest {
    /// Tile-column offset of the destination tile relative to the origin tile.
    pub dx: i32,
    /// Tile-row offset of the destination tile relative to the origin tile.
    pub dy: i32,
    /// Name of the wire reached within the destination tile.
    pub dest_wire: Ident,
    /// Tile type of the destination tile.
    pub dest_tile_type: TileTypeId,
}

/// A template: for each output (or source/sink) wire of some tile, the list
/// of destinations reachable through its node.
pub type Template = HashMap<Ident, Vec<TemplateDest>>;

/// The inter-tile template graph: every routable tile maps to a
/// (deduplicated) template describing its one-hop reach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterTileGraph {
    templates: Vec<Template>,
    tile_to_template: HashMap<(i32, i32, TileTypeId), usize>,
}

impl InterTileGraph {
    /// Returns the template applicable to a tile at `(x, y)` of type `tile_type`,
    /// if that tile has any routable output.
    pub fn template_for(&self, x: i32, y: i32, tile_type: TileTypeId) -> Option<&Template> {
        let idx = *self.tile_to_template.get(&(x, y, tile_type))?;
        Some(&self.templates[idx])
    }

    /// Number of distinct (deduplicated) templates stored.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Number of tiles that were assigned a template.
    pub fn tile_count(&self) -> usize {
        self.tile_to_template.len()
    }

    /// Records `template` for the tile at `(x, y, tile_type)`, reusing an
    /// existing entry if an identical template was already recorded for a
    /// different tile (structural-equality dedup).
    fn insert(&mut self, x: i32, y: i32, tile_type: TileTypeId, template: Template) {
        if template.is_empty() {
            return;
        }
        let existing = self.templates.iter().position(|t| t == &template);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                self.templates.push(template);
                self.templates.len() - 1
            }
        };
        self.tile_to_template.insert((x, y, tile_type), idx);
    }
}

/// Builder accumulating templates before freezing them into an [`InterTileGraph`].
#[derive(Debug, Default)]
pub struct InterTileGraphBuilder {
    graph: InterTileGraph,
}

impl InterTileGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the template computed for one tile.
    pub fn add_tile(&mut self, x: i32, y: i32, tile_type: TileTypeId, template: Template) {
        self.graph.insert(x, y, tile_type, template);
    }

    /// Finalizes the graph.
    pub fn build(self) -> InterTileGraph {
        self.graph
    }
}

/// Builds the inter-tile template graph for every tile in a device.
///
/// For each of a tile's output and source/sink wires, follows that wire's
/// node to every other member wire and records it as a destination when the
/// destination tile's type actually has a downhill PIP for that wire —
/// otherwise a route could be parked on a wire it can never leave. Grounded
/// on `data.cpp`'s `getInterconnectionTileGraph`.
pub fn build_inter_tile_graph(tables: &DeviceTables) -> InterTileGraph {
    let mut builder = InterTileGraphBuilder::new();

    for (tile_idx, tile) in tables.tiles.iter().enumerate() {
        let tile_id = TileId::from_raw(tile_idx as u32);
        let type_idx = tile.tile_type.as_raw() as usize;

        let mut wires_to_check: Vec<Ident> =
            tables.output_wires[type_idx].iter().copied().collect();
        for &w in &tables.source_and_sink_wires[type_idx] {
            if !tables.output_wires[type_idx].contains(&w) {
                wires_to_check.push(w);
            }
        }

        let mut template = Template::new();
        for wire in wires_to_check {
            let Some(&node_id) = tables.wire2node.get(&(tile_id, wire)) else {
                continue;
            };
            let members = &tables.node_members[node_id.as_raw() as usize];
            let mut dests = Vec::new();
            for &(other_tile_id, other_wire) in members {
                if other_tile_id == tile_id && other_wire == wire {
                    continue;
                }
                let other_tile = &tables.tiles[other_tile_id.as_raw() as usize];
                let other_type_idx = other_tile.tile_type.as_raw() as usize;
                if !tables.wires_with_downhill_pips_by_type[other_type_idx].contains(&other_wire) {
                    continue;
                }
                dests.push(TemplateDest {
                    dx: other_tile.x - tile.x,
                    dy: other_tile.y - tile.y,
                    dest_wire: other_wire,
                    dest_tile_type: other_tile.tile_type,
                });
            }
            if !dests.is_empty() {
                template.insert(wire, dests);
            }
        }

        if !template.is_empty() {
            builder.add_tile(tile.x, tile.y, tile.tile_type, template);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{build_device_tables, DeviceDescription, RawNode, RawPip, RawTile, RawTileType, RawWireRef};
    use aion_common::Interner;

    fn dest(interner: &Interner, dx: i32, dy: i32, wire: &str, t: u32) -> TemplateDest {
        TemplateDest {
            dx,
            dy,
            dest_wire: interner.get_or_intern(wire),
            dest_tile_type: TileTypeId::from_raw(t),
        }
    }

    #[test]
    fn distinct_tiles_with_identical_templates_share_one_entry() {
        let interner = Interner::new();
        let wire_a = interner.get_or_intern("EE1_E_BEG0");
        let mut builder = InterTileGraphBuilder::new();

        let mut t1 = Template::new();
        t1.insert(wire_a, vec![dest(&interner, 1, 0, "EE1_W_END0", 5)]);
        let mut t2 = Template::new();
        t2.insert(wire_a, vec![dest(&interner, 1, 0, "EE1_W_END0", 5)]);

        builder.add_tile(0, 0, TileTypeId::from_raw(5), t1);
        builder.add_tile(10, 0, TileTypeId::from_raw(5), t2);
        let graph = builder.build();

        assert_eq!(graph.template_count(), 1);
        assert_eq!(graph.tile_count(), 2);
    }

    #[test]
    fn differing_templates_get_separate_entries() {
        let interner = Interner::new();
        let wire_a = interner.get_or_intern("EE1_E_BEG0");
        let mut builder = InterTileGraphBuilder::new();

        let mut t1 = Template::new();
        t1.insert(wire_a, vec![dest(&interner, 1, 0, "EE1_W_END0", 5)]);
        let mut t2 = Template::new();
        t2.insert(wire_a, vec![dest(&interner, 2, 0, "EE1_W_END0", 5)]);

        builder.add_tile(0, 0, TileTypeId::from_raw(5), t1);
        builder.add_tile(10, 0, TileTypeId::from_raw(5), t2);
        let graph = builder.build();

        assert_eq!(graph.template_count(), 2);
    }

    #[test]
    fn empty_template_is_not_recorded() {
        let mut builder = InterTileGraphBuilder::new();
        builder.add_tile(0, 0, TileTypeId::from_raw(1), Template::new());
        let graph = builder.build();
        assert_eq!(graph.template_count(), 0);
        assert!(graph.template_for(0, 0, TileTypeId::from_raw(1)).is_none());
    }

    #[test]
    fn lookup_by_coordinates_and_type() {
        let interner = Interner::new();
        let wire_a = interner.get_or_intern("A");
        let mut builder = InterTileGraphBuilder::new();
        let mut t1 = Template::new();
        t1.insert(wire_a, vec![dest(&interner, 1, 1, "B", 2)]);
        builder.add_tile(3, 4, TileTypeId::from_raw(2), t1);
        let graph = builder.build();

        assert!(graph.template_for(3, 4, TileTypeId::from_raw(2)).is_some());
        assert!(graph.template_for(3, 4, TileTypeId::from_raw(9)).is_none());
    }

    #[test]
    fn two_int_tiles_linked_by_a_node_get_a_cross_tile_destination() {
        let int_type = RawTileType {
            name: "INT".to_string(),
            wires: vec![
                "IMUX_E0".to_string(),
                "EE1_BEG0".to_string(),
                "EE1_END0".to_string(),
                "IMUX_W0".to_string(),
            ],
            pips: vec![
                RawPip {
                    wire0: 0,
                    wire1: 1,
                    is_conventional: true,
                },
                RawPip {
                    wire0: 2,
                    wire1: 3,
                    is_conventional: true,
                },
            ],
            site_types: vec![],
        };
        let desc = DeviceDescription {
            part_name: "test".to_string(),
            tiles: vec![
                RawTile {
                    name: "INT_X0Y0".to_string(),
                    tile_type: 0,
                    sites: vec![],
                },
                RawTile {
                    name: "INT_X1Y0".to_string(),
                    tile_type: 0,
                    sites: vec![],
                },
            ],
            tile_types: vec![int_type],
            wires: vec![
                RawWireRef { tile: 0, wire: 1 },
                RawWireRef { tile: 1, wire: 2 },
            ],
            nodes: vec![RawNode { wires: vec![0, 1] }],
        };

        let tables = build_device_tables(&desc).unwrap();
        let graph = build_inter_tile_graph(&tables);

        assert_eq!(graph.template_count(), 1);
        assert_eq!(graph.tile_count(), 1);

        let template = graph
            .template_for(0, 0, TileTypeId::from_raw(0))
            .expect("tile (0,0) should have a template");
        let ee1_beg0 = tables.interner.get_or_intern("EE1_BEG0");
        let ee1_end0 = tables.interner.get_or_intern("EE1_END0");
        let dests = &template[&ee1_beg0];
        assert_eq!(dests.len(), 1);
        assert_eq!(dests[0].dx, 1);
        assert_eq!(dests[0].dy, 0);
        assert_eq!(dests[0].dest_wire, ee1_end0);

        assert!(graph.template_for(1, 0, TileTypeId::from_raw(0)).is_none());
    }
}
