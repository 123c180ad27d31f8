//! Per-tile-instance wire-resource table, shared by a net's routing and the
//! router's A* search.
//!
//! Grounded on `aion_arch::resource`'s own doc comment: "the owning net or
//! router looks up the live `WireResource` through its own per-tile-instance
//! resource table, keyed by the concrete tile this offset resolves to." This
//! module is that table — `wireResources : keyTile -> Vec<wire_resource>`
//! from the design notes, created lazily per tile as a clone of its type's
//! `PipGraph::default_resources`.

use aion_arch::{DeviceTables, PipGraph, TileId, VertexId, WireResource};
use std::collections::HashMap;

/// Live, per-tile-instance resource vectors.
pub struct ResourceTable<'a> {
    tables: &'a DeviceTables,
    pip_graphs: &'a [PipGraph],
    live: HashMap<TileId, Vec<WireResource>>,
}

impl<'a> ResourceTable<'a> {
    /// Creates an empty table over the given device tables and per-type PIP graphs.
    pub fn new(tables: &'a DeviceTables, pip_graphs: &'a [PipGraph]) -> Self {
        Self {
            tables,
            pip_graphs,
            live: HashMap::new(),
        }
    }

    fn ensure(&mut self, tile: TileId) -> &mut Vec<WireResource> {
        let tables = self.tables;
        let pip_graphs = self.pip_graphs;
        self.live.entry(tile).or_insert_with(|| {
            let type_idx = tables.tiles[tile.as_raw() as usize].tile_type.as_raw() as usize;
            pip_graphs[type_idx].default_resources.clone()
        })
    }

    /// Looks up a tile's concrete resource vector, creating it on first touch.
    ///
    /// Exposed for callers (the A* search) that need direct `&mut [WireResource]`
    /// access to hand to [`PipGraph::find_reachable`].
    pub fn tile_resources(&mut self, tile: TileId) -> &mut [WireResource] {
        self.ensure(tile)
    }

    /// Reads one resource, without requiring a mutable vertex-level borrow.
    pub fn get(&mut self, tile: TileId, vertex: VertexId) -> WireResource {
        self.ensure(tile)[vertex.as_raw() as usize]
    }

    /// Mutably borrows one resource.
    pub fn get_mut(&mut self, tile: TileId, vertex: VertexId) -> &mut WireResource {
        &mut self.ensure(tile)[vertex.as_raw() as usize]
    }

    /// Resolves a tile-root-relative offset to the concrete tile at
    /// `(root.x + dx, root.y + dy)`, if one exists.
    pub fn resolve_tile(&self, root: TileId, dx: i32, dy: i32) -> Option<TileId> {
        let root_rec = &self.tables.tiles[root.as_raw() as usize];
        self.tables.tile_at.get(&(root_rec.x + dx, root_rec.y + dy)).copied()
    }

    /// Clears every resource's "owned by current net" marker back to
    /// unexplored, across every tile this table has ever touched.
    ///
    /// Grounded on `resetParent()` in SPEC_FULL.md §4.6, called once per net
    /// after all its sinks have been searched. Search run-ids are unique for
    /// the router's lifetime (see `Router::next_run_id`), so a resource left
    /// with a stale positive `explored_id` is harmless: the next search's
    /// run-id will never equal it, so it is treated as unvisited regardless.
    /// Only the `OWNED_BY_CURRENT_NET` sentinel is special-cased for
    /// equality independent of run-id, so it is the only state that must be
    /// cleared explicitly between nets.
    pub fn reset_owned_markers(&mut self) {
        for resources in self.live.values_mut() {
            for r in resources.iter_mut() {
                if r.explored_id == aion_arch::resource::OWNED_BY_CURRENT_NET {
                    r.explored_id = aion_arch::resource::UNEXPLORED;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aion_arch::device::{build_device_tables, build_pip_graphs, DeviceDescription};

    fn tiny_device() -> DeviceDescription {
        crate::test_fixtures::tiny_int_device()
    }

    #[test]
    fn lazily_clones_defaults_on_first_touch() {
        let desc = tiny_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let mut resources = ResourceTable::new(&tables, &pip_graphs);

        let tile = tables.tiles.iter().position(|t| t.tile_type == tables.int_tile_type).unwrap();
        let tile_id = TileId::from_raw(tile as u32);
        let w0 = tables.interner.get_or_intern("W0");
        let vertex = pip_graphs[tables.int_tile_type.as_raw() as usize]
            .convert_wire_to_idx(w0)
            .unwrap();

        let r = resources.get(tile_id, vertex);
        assert_eq!(r.usage, 0);
        resources.get_mut(tile_id, vertex).increment_usage();
        assert_eq!(resources.get(tile_id, vertex).usage, 1);
    }

    #[test]
    fn resolve_tile_follows_offsets() {
        let desc = tiny_device();
        let tables = build_device_tables(&desc).unwrap();
        let pip_graphs = build_pip_graphs(&tables);
        let resources = ResourceTable::new(&tables, &pip_graphs);

        let root = tables.tile_name_to_tile[&tables.interner.get_or_intern("INT_X5Y5")];
        let target = resources.resolve_tile(root, 0, 3);
        assert_eq!(target, Some(tables.tile_name_to_tile[&tables.interner.get_or_intern("INT_X5Y8")]));
        assert_eq!(resources.resolve_tile(root, 99, 99), None);
    }
}
