//! Device-derived static tables (C1): the abstract, already-decoded view of a
//! device that every other component in this crate is built from.
//!
//! Raw device-file decoding is out of scope here — [`DeviceDescription`] is
//! the plain-data shape a decoder (elsewhere) hands us, mirroring the fields
//! `data.cpp` reads off the capnp `DeviceResources::Device` reader. Building
//! [`DeviceTables`] from a `DeviceDescription` is a deterministic, pure
//! function of its input.

use crate::error::ArchError;
use crate::ids::{NodeId, TileId, TileTypeId};
use aion_common::{Ident, Interner};
use std::collections::{HashMap, HashSet};

/// One PIP within a tile type's local wire list.
#[derive(Debug, Clone, Copy)]
pub struct RawPip {
    /// Index into the owning tile type's `wires` list.
    pub wire0: u32,
    /// Index into the owning tile type's `wires` list.
    pub wire1: u32,
    /// Whether this PIP is a conventional (always-available) PIP, as opposed
    /// to a pseudo-PIP that only some device generators expose.
    pub is_conventional: bool,
}

/// A site type nested within a tile type, giving the pin-to-tile-wire mapping
/// needed to build `pins_to_wire`.
#[derive(Debug, Clone)]
pub struct RawTileSiteType {
    /// Name of the primary site type backing this slot.
    pub name: String,
    /// Pin names of the primary site type, in the same order as
    /// `primary_pins_to_tile_wires`.
    pub pin_names: Vec<String>,
    /// For each pin (by position), the local wire index within the owning
    /// tile type that the pin connects to.
    pub primary_pins_to_tile_wires: Vec<u32>,
}

/// A tile type: the shared template for every tile instance of this type.
#[derive(Debug, Clone)]
pub struct RawTileType {
    /// Tile type name, e.g. `"INT"`, `"CLEL_L"`.
    pub name: String,
    /// Tile-local wire names, indexed by the local wire index used in `pips`
    /// and `RawTileSiteType::primary_pins_to_tile_wires`.
    pub wires: Vec<String>,
    /// PIPs within this tile type's switch box.
    pub pips: Vec<RawPip>,
    /// Site types instantiated within tiles of this type.
    pub site_types: Vec<RawTileSiteType>,
}

/// A site instance within a tile.
#[derive(Debug, Clone)]
pub struct RawSiteInstance {
    /// Site instance name, globally unique.
    pub name: String,
    /// Index into the owning tile type's `site_types`.
    pub site_type_slot: u32,
}

/// A tile instance in the device grid.
#[derive(Debug, Clone)]
pub struct RawTile {
    /// Tile name, expected to end in an `X<col>Y<row>` coordinate suffix.
    pub name: String,
    /// Index into `DeviceDescription::tile_types`.
    pub tile_type: u32,
    /// Site instances placed within this tile.
    pub sites: Vec<RawSiteInstance>,
}

/// One wire instance: a tile plus a tile-local wire index.
#[derive(Debug, Clone, Copy)]
pub struct RawWireRef {
    /// Index into `DeviceDescription::tiles`.
    pub tile: u32,
    /// Local wire index within that tile's tile type.
    pub wire: u32,
}

/// An electrically-equivalent set of wires spanning tiles.
#[derive(Debug, Clone)]
pub struct RawNode {
    /// Indices into `DeviceDescription::wires`.
    pub wires: Vec<u32>,
}

/// The plain-data, already-decoded view of a device that [`build_device_tables`]
/// consumes. Producing this from a vendor device file is out of scope.
#[derive(Debug, Clone, Default)]
pub struct DeviceDescription {
    /// The device part name, e.g. `"xc7a100tcsg324-1"`.
    pub part_name: String,
    /// Tile instances.
    pub tiles: Vec<RawTile>,
    /// Tile types.
    pub tile_types: Vec<RawTileType>,
    /// Global wire instance list, referenced by `RawNode::wires`.
    pub wires: Vec<RawWireRef>,
    /// Electrically-equivalent node list.
    pub nodes: Vec<RawNode>,
}

/// Static, device-derived tables used by every later routing stage.
pub struct DeviceTables {
    /// The device's string table; all names below are interned through it.
    pub interner: Interner,
    /// Tile instances, indexed by `TileId`.
    pub tiles: Vec<TileRecord>,
    /// Maps a tile's interned name to its `TileId`.
    pub tile_name_to_tile: HashMap<Ident, TileId>,
    /// Tile type records, indexed by `TileTypeId`.
    pub tile_types: Vec<TileTypeRecord>,
    /// Maps a tile type's interned name to its `TileTypeId`.
    pub tile_type_name_to_id: HashMap<Ident, TileTypeId>,
    /// The tile type named `"INT"`.
    pub int_tile_type: TileTypeId,
    /// `(tile, wire)` -> the node that wire belongs to.
    pub wire2node: HashMap<(TileId, Ident), NodeId>,
    /// Globally, wires that appear as the PIP source (`wire0`) of some
    /// routable PIP.
    pub wires_with_downhill_pips: HashSet<Ident>,
    /// As `wires_with_downhill_pips`, but split out per tile type.
    pub wires_with_downhill_pips_by_type: Vec<HashSet<Ident>>,
    /// Globally, wires that appear as the PIP destination (`wire1`) of some
    /// routable PIP.
    pub wires_with_uphill_pips: HashSet<Ident>,
    /// Per tile type, the wires that are site-pin sources or sinks.
    pub source_and_sink_wires: Vec<HashSet<Ident>>,
    /// Per tile type, wires that are not merely a switch-box bounce but can
    /// carry a route on to another tile.
    pub output_wires: Vec<HashSet<Ident>>,
    /// Maps a site instance's interned name to its owning tile and the local
    /// slot index of its site type within that tile's tile type.
    pub site_to_tile_type: HashMap<Ident, (TileId, u32)>,
    /// Per node, the `(tile, wire)` members of that node — the reverse of
    /// `wire2node`, needed to walk a node's other member wires when building
    /// the inter-tile template (C3) and pre-routed fan-in/fan-out (C4).
    pub node_members: Vec<Vec<(TileId, Ident)>>,
    /// One representative tile instance per tile type, used to anchor
    /// relative-coordinate constructions (C3/C4) that are the same for every
    /// tile of a type.
    pub representative_tile: HashMap<TileTypeId, TileId>,
    /// Maps a tile's grid coordinates to its `TileId`, the inverse of
    /// `tiles[..].x/y`. Used to resolve a `RoutingBranch`'s root-relative
    /// `(dx, dy)` offset back to a concrete tile instance during routing.
    pub tile_at: HashMap<(i32, i32), TileId>,
}

/// A tile instance.
#[derive(Debug, Clone, Copy)]
pub struct TileRecord {
    /// Interned tile name.
    pub name: Ident,
    /// This tile's type.
    pub tile_type: TileTypeId,
    /// Column coordinate parsed from the tile name's `X<col>` suffix.
    pub x: i32,
    /// Row coordinate parsed from the tile name's `Y<row>` suffix.
    pub y: i32,
}

/// A tile type.
pub struct TileTypeRecord {
    /// Interned tile type name.
    pub name: Ident,
    /// Tile-local wire names, indexed as in the source `RawTileType`.
    pub wires: Vec<Ident>,
    /// `(pin name, site-type slot within this tile type)` -> tile-local wire.
    pub pins_to_wire: HashMap<(Ident, u32), Ident>,
    /// Routable PIPs as `(source wire, destination wire)` pairs, already
    /// filtered by the CLE/RCLK conventional-only rule.
    pub routable_pips: Vec<(Ident, Ident)>,
}

/// Parses a tile name's trailing `X<col>Y<row>` coordinate suffix.
///
/// Grounded on `utils.h`'s `retrieveCoords`.
pub fn parse_tile_coords(name: &str) -> Option<(i32, i32)> {
    let y_pos = name.rfind('Y')?;
    let y_str = &name[y_pos + 1..];
    let y: i32 = y_str.parse().ok()?;
    let before_y = &name[..y_pos];
    let x_pos = before_y.rfind('X')?;
    let x_str = &before_y[x_pos + 1..];
    let x: i32 = x_str.parse().ok()?;
    Some((x, y))
}

/// Returns the tile-type-name portion of a tile name (everything before the
/// `X<col>Y<row>` suffix), grounded on `utils.h`'s `getTypeFromTileName`.
///
/// Device tile *names* are not the same string as their tile *type* name
/// (e.g. tile `CLEL_L_X10Y20` has type `"CLEL_L"`); callers that only have a
/// destination tile's name still need the type-name prefix to cross-reference
/// `tile_type_name_to_id`. This is only needed while constructing tables that
/// don't yet carry a direct tile-name -> tile-type lookup for an arbitrary
/// (possibly not-yet-visited) tile; once `DeviceTables` exists,
/// `tile_name_to_tile` plus `tiles[..].tile_type` should be preferred.
pub fn type_name_prefix(tile_name: &str) -> &str {
    match parse_tile_coords(tile_name) {
        Some(_) => {
            let y_pos = tile_name.rfind('Y').unwrap();
            let before_y = &tile_name[..y_pos];
            let x_pos = before_y.rfind('X').unwrap();
            &tile_name[..x_pos]
        }
        None => tile_name,
    }
}

fn is_cle_or_rclk(type_name: &str) -> bool {
    type_name.starts_with("CLE") || type_name.starts_with("RCLK")
}

/// Builds all device-derived tables from a decoded device description.
///
/// Pure and deterministic: the same `DeviceDescription` always yields
/// bit-identical tables (modulo interner assignment order, which follows the
/// description's own string-reference order).
pub fn build_device_tables(desc: &DeviceDescription) -> Result<DeviceTables, ArchError> {
    let interner = Interner::new();

    // Tile types.
    let mut tile_types = Vec::with_capacity(desc.tile_types.len());
    let mut tile_type_name_to_id = HashMap::new();
    let mut wires_with_downhill_pips = HashSet::new();
    let mut wires_with_downhill_pips_by_type = Vec::with_capacity(desc.tile_types.len());
    let mut wires_with_uphill_pips = HashSet::new();
    let mut source_and_sink_wires = Vec::with_capacity(desc.tile_types.len());

    for (raw_idx, raw_type) in desc.tile_types.iter().enumerate() {
        let type_id = TileTypeId::from_raw(raw_idx as u32);
        let name = interner.get_or_intern(&raw_type.name);
        tile_type_name_to_id.insert(name, type_id);

        let wires: Vec<Ident> = raw_type
            .wires
            .iter()
            .map(|w| interner.get_or_intern(w))
            .collect();

        let mut pins_to_wire = HashMap::new();
        for (slot, site_type) in raw_type.site_types.iter().enumerate() {
            for (pin_idx, pin_name) in site_type.pin_names.iter().enumerate() {
                let Some(&local_wire) = site_type.primary_pins_to_tile_wires.get(pin_idx) else {
                    continue;
                };
                let pin_ident = interner.get_or_intern(pin_name);
                let wire_ident = wires[local_wire as usize];
                pins_to_wire.insert((pin_ident, slot as u32), wire_ident);
            }
        }

        let is_cle_rclk = is_cle_or_rclk(&raw_type.name);
        let mut downhill_this_type = HashSet::new();
        let mut routable_pips = Vec::new();
        for pip in &raw_type.pips {
            if is_cle_rclk && !pip.is_conventional {
                continue;
            }
            let w0 = wires[pip.wire0 as usize];
            let w1 = wires[pip.wire1 as usize];
            wires_with_downhill_pips.insert(w0);
            downhill_this_type.insert(w0);
            wires_with_uphill_pips.insert(w1);
            routable_pips.push((w0, w1));
        }
        wires_with_downhill_pips_by_type.push(downhill_this_type);

        let mut sink_source = HashSet::new();
        for site_type in &raw_type.site_types {
            for &local_wire in &site_type.primary_pins_to_tile_wires {
                sink_source.insert(wires[local_wire as usize]);
            }
        }
        source_and_sink_wires.push(sink_source);

        tile_types.push(TileTypeRecord {
            name,
            wires,
            pins_to_wire,
            routable_pips,
        });
    }

    let int_tile_type = *tile_type_name_to_id
        .get(&interner.get_or_intern("INT"))
        .ok_or(ArchError::MissingIntTileType)?;

    // Tiles.
    let mut tiles = Vec::with_capacity(desc.tiles.len());
    let mut tile_name_to_tile = HashMap::new();
    let mut site_to_tile_type = HashMap::new();
    let mut representative_tile = HashMap::new();
    let mut tile_at = HashMap::new();
    for (raw_idx, raw_tile) in desc.tiles.iter().enumerate() {
        let tile_id = TileId::from_raw(raw_idx as u32);
        let name = interner.get_or_intern(&raw_tile.name);
        let (x, y) = parse_tile_coords(&raw_tile.name)
            .ok_or_else(|| ArchError::MalformedTileName(raw_tile.name.clone()))?;
        let tile_type = raw_tile
            .tile_type
            .try_into()
            .ok()
            .filter(|&idx: &usize| idx < tile_types.len())
            .map(|idx| TileTypeId::from_raw(idx as u32))
            .ok_or(ArchError::UnknownTileType(raw_tile.tile_type))?;

        tile_name_to_tile.insert(name, tile_id);
        representative_tile.entry(tile_type).or_insert(tile_id);
        tile_at.insert((x, y), tile_id);
        tiles.push(TileRecord {
            name,
            tile_type,
            x,
            y,
        });

        for site in &raw_tile.sites {
            let site_name = interner.get_or_intern(&site.name);
            site_to_tile_type.insert(site_name, (tile_id, site.site_type_slot));
        }
    }

    // wire2node, and its reverse, node_members.
    let mut wire2node = HashMap::new();
    let mut node_members: Vec<Vec<(TileId, Ident)>> = Vec::with_capacity(desc.nodes.len());
    for (node_idx, node) in desc.nodes.iter().enumerate() {
        let node_id = NodeId::from_raw(node_idx as u32);
        let mut members = Vec::with_capacity(node.wires.len());
        for &wire_ref_idx in &node.wires {
            let Some(wire_ref) = desc.wires.get(wire_ref_idx as usize) else {
                continue;
            };
            let Some(tile) = tiles.get(wire_ref.tile as usize) else {
                continue;
            };
            let tile_id = TileId::from_raw(wire_ref.tile);
            let wire_name = tile_types[tile.tile_type.as_raw() as usize].wires
                [wire_ref.wire as usize];
            wire2node.insert((tile_id, wire_name), node_id);
            members.push((tile_id, wire_name));
        }
        node_members.push(members);
    }

    // output_wires: a wire is an "output" if it has an uphill pip and either
    // its node fans out to more than one wire, or it is itself a source/sink.
    let mut output_wires: Vec<HashSet<Ident>> = vec![HashSet::new(); tile_types.len()];
    for (tile_idx, tile) in tiles.iter().enumerate() {
        let tile_id = TileId::from_raw(tile_idx as u32);
        let type_idx = tile.tile_type.as_raw() as usize;
        for &wire in &tile_types[type_idx].wires {
            if !wires_with_uphill_pips.contains(&wire) {
                continue;
            }
            let Some(&node_id) = wire2node.get(&(tile_id, wire)) else {
                continue;
            };
            let node = &desc.nodes[node_id.as_raw() as usize];
            if node.wires.len() > 1 || source_and_sink_wires[type_idx].contains(&wire) {
                output_wires[type_idx].insert(wire);
            }
        }
    }

    Ok(DeviceTables {
        interner,
        tiles,
        tile_name_to_tile,
        tile_types,
        tile_type_name_to_id,
        int_tile_type,
        wire2node,
        wires_with_downhill_pips,
        wires_with_downhill_pips_by_type,
        wires_with_uphill_pips,
        source_and_sink_wires,
        output_wires,
        site_to_tile_type,
        node_members,
        representative_tile,
        tile_at,
    })
}

/// Builds one [`PipGraph`](crate::pip_graph::PipGraph) per tile type from its
/// routable PIPs, marking output wires and forbidding `BYPASS`/`BOUNCE_`
/// wires within the `"INT"` tile type.
///
/// Grounded on `data.cpp`'s `getPipGraph`.
pub fn build_pip_graphs(tables: &DeviceTables) -> Vec<crate::pip_graph::PipGraph> {
    tables
        .tile_types
        .iter()
        .enumerate()
        .map(|(type_idx, type_record)| {
            let mut graph = crate::pip_graph::PipGraph::new(type_record.wires.iter().copied());
            for &(w0, w1) in &type_record.routable_pips {
                graph.add_edge(w0, w1);
            }

            let type_id = TileTypeId::from_raw(type_idx as u32);
            let forbidden: HashSet<Ident> = if type_id == tables.int_tile_type {
                type_record
                    .wires
                    .iter()
                    .copied()
                    .filter(|&w| {
                        let name = tables.interner.resolve(w);
                        name.starts_with("BYPASS") || name.starts_with("BOUNCE_")
                    })
                    .collect()
            } else {
                HashSet::new()
            };

            graph.set_output_wires(&tables.output_wires[type_idx], &forbidden);
            graph
        })
        .collect()
}
