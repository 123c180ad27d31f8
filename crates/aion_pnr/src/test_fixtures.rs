//! Small hand-built devices shared by this crate's unit and integration
//! tests, in the style of `aion_arch::device`'s `tiny_device()` and
//! `aion_arch::prerouted`'s `site_int_device()`.

#![cfg(test)]

use aion_arch::device::{
    DeviceDescription, RawNode, RawPip, RawSiteInstance, RawTile, RawTileSiteType, RawTileType,
    RawWireRef,
};

/// Four `"INT"` tiles in a column, `INT_X5Y5` through `INT_X5Y8`, each with a
/// single `IN -> OUT` PIP and linked to the next by a node. No sites.
///
/// Mirrors SPEC_FULL.md §8 scenario 1: a straight unit-cost path of known
/// length between two `"INT"`-tile wires.
pub fn tiny_int_device() -> DeviceDescription {
    let int_type = RawTileType {
        name: "INT".to_string(),
        wires: vec!["IN".to_string(), "OUT".to_string()],
        pips: vec![RawPip {
            wire0: 0,
            wire1: 1,
            is_conventional: true,
        }],
        site_types: vec![],
    };

    let tile_names = ["INT_X5Y5", "INT_X5Y6", "INT_X5Y7", "INT_X5Y8"];
    let tiles = tile_names
        .iter()
        .map(|name| RawTile {
            name: name.to_string(),
            tile_type: 0,
            sites: vec![],
        })
        .collect();

    let mut wires = Vec::new();
    for tile_idx in 0..tile_names.len() {
        wires.push(RawWireRef { tile: tile_idx as u32, wire: 0 }); // IN
        wires.push(RawWireRef { tile: tile_idx as u32, wire: 1 }); // OUT
    }

    let mut nodes = Vec::new();
    for tile_idx in 0..tile_names.len() - 1 {
        let out_ref = (tile_idx * 2 + 1) as u32;
        let next_in_ref = ((tile_idx + 1) * 2) as u32;
        nodes.push(RawNode { wires: vec![out_ref, next_in_ref] });
    }

    DeviceDescription {
        part_name: "test".to_string(),
        tiles,
        tile_types: vec![int_type],
        wires,
        nodes,
    }
}

/// A full source-to-sink device: a `SLICEL` site driving pin `O` into the
/// `"INT"` column's first tile, the column from `tiny_int_device`, and a
/// second `SLICEL` site fed by pin `I` from the column's last tile.
///
/// Used for adapter (C7) and end-to-end router tests where pre-routed
/// fan-out/fan-in segments must be spliced around the router's own search.
pub fn full_chain_device() -> DeviceDescription {
    let int_type = RawTileType {
        name: "INT".to_string(),
        wires: vec!["IN".to_string(), "OUT".to_string()],
        pips: vec![RawPip {
            wire0: 0,
            wire1: 1,
            is_conventional: true,
        }],
        site_types: vec![],
    };
    // Two distinct tile types for the source/sink CLBs: a real device's
    // tile type carries identical per-type wiring for every instance, so a
    // single type cannot plausibly wire one instance's output pin and
    // another instance's input pin differently.
    let clb_src_type = RawTileType {
        name: "CLEL_SRC".to_string(),
        wires: vec!["A_O".to_string()],
        pips: vec![],
        site_types: vec![RawTileSiteType {
            name: "SLICEL".to_string(),
            pin_names: vec!["O".to_string()],
            primary_pins_to_tile_wires: vec![0],
        }],
    };
    let clb_snk_type = RawTileType {
        name: "CLEL_SNK".to_string(),
        wires: vec!["A_I".to_string()],
        pips: vec![],
        site_types: vec![RawTileSiteType {
            name: "SLICEL".to_string(),
            pin_names: vec!["I".to_string()],
            primary_pins_to_tile_wires: vec![0],
        }],
    };

    let tiles = vec![
        RawTile {
            name: "CLEL_SRC_X5Y4".to_string(),
            tile_type: 1,
            sites: vec![RawSiteInstance { name: "SLICE_X5Y4".to_string(), site_type_slot: 0 }],
        },
        RawTile { name: "INT_X5Y5".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X5Y6".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X5Y7".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X5Y8".to_string(), tile_type: 0, sites: vec![] },
        RawTile {
            name: "CLEL_SNK_X5Y9".to_string(),
            tile_type: 2,
            sites: vec![RawSiteInstance { name: "SLICE_X5Y9".to_string(), site_type_slot: 0 }],
        },
    ];

    // tile indices: 0=CLB_src, 1..=4 = INT_X5Y5..8, 5=CLB_sink
    let wires = vec![
        RawWireRef { tile: 0, wire: 0 }, // 0: CLB_src.A_O
        RawWireRef { tile: 1, wire: 0 }, // 1: INT_X5Y5.IN
        RawWireRef { tile: 1, wire: 1 }, // 2: INT_X5Y5.OUT
        RawWireRef { tile: 2, wire: 0 }, // 3: INT_X5Y6.IN
        RawWireRef { tile: 2, wire: 1 }, // 4: INT_X5Y6.OUT
        RawWireRef { tile: 3, wire: 0 }, // 5: INT_X5Y7.IN
        RawWireRef { tile: 3, wire: 1 }, // 6: INT_X5Y7.OUT
        RawWireRef { tile: 4, wire: 0 }, // 7: INT_X5Y8.IN
        RawWireRef { tile: 4, wire: 1 }, // 8: INT_X5Y8.OUT
        RawWireRef { tile: 5, wire: 0 }, // 9: CLB_sink.A_I
    ];

    let nodes = vec![
        RawNode { wires: vec![0, 1] }, // CLB_src.A_O <-> INT_X5Y5.IN
        RawNode { wires: vec![2, 3] }, // INT_X5Y5.OUT <-> INT_X5Y6.IN
        RawNode { wires: vec![4, 5] }, // INT_X5Y6.OUT <-> INT_X5Y7.IN
        RawNode { wires: vec![6, 7] }, // INT_X5Y7.OUT <-> INT_X5Y8.IN
        RawNode { wires: vec![8, 9] }, // INT_X5Y8.OUT <-> CLB_sink.A_I
    ];

    DeviceDescription {
        part_name: "test".to_string(),
        tiles,
        tile_types: vec![int_type, clb_src_type, clb_snk_type],
        wires,
        nodes,
    }
}

/// A genuine fork: one `"FORK"` tile (`IN -> OUT_A`, `IN -> OUT_B`) feeding two
/// parallel four-tile `"INT"` columns, rejoined by one `"JOIN"` tile
/// (`IN_A -> OUT`, `IN_B -> OUT`), whose `OUT` in turn lands on a `"CLEL_SNK"`
/// site pin — the same trailing-sink-site shape as [`full_chain_device`], so
/// `JOIN.OUT` has a node of its own rather than dangling unreferenced.
///
/// Used to exercise rip-up/reroute across two nets contending for the same
/// path: unlike [`tiny_int_device`]'s single straight column, a net ripped up
/// here has an alternate column to reroute through, so both nets can end up
/// conflict-free instead of one being left permanently congested.
pub fn forked_int_device() -> DeviceDescription {
    let int_type = RawTileType {
        name: "INT".to_string(),
        wires: vec!["IN".to_string(), "OUT".to_string()],
        pips: vec![RawPip {
            wire0: 0,
            wire1: 1,
            is_conventional: true,
        }],
        site_types: vec![],
    };
    let fork_type = RawTileType {
        name: "FORK".to_string(),
        wires: vec!["IN".to_string(), "OUT_A".to_string(), "OUT_B".to_string()],
        pips: vec![
            RawPip { wire0: 0, wire1: 1, is_conventional: true },
            RawPip { wire0: 0, wire1: 2, is_conventional: true },
        ],
        site_types: vec![],
    };
    let join_type = RawTileType {
        name: "JOIN".to_string(),
        wires: vec!["IN_A".to_string(), "IN_B".to_string(), "OUT".to_string()],
        pips: vec![
            RawPip { wire0: 0, wire1: 2, is_conventional: true },
            RawPip { wire0: 1, wire1: 2, is_conventional: true },
        ],
        site_types: vec![],
    };
    let clb_snk_type = RawTileType {
        name: "CLEL_SNK".to_string(),
        wires: vec!["A_I".to_string()],
        pips: vec![],
        site_types: vec![RawTileSiteType {
            name: "SLICEL".to_string(),
            pin_names: vec!["I".to_string()],
            primary_pins_to_tile_wires: vec![0],
        }],
    };

    // tile indices: 0 = FORK, 1..=4 = column A (X4Y5..8), 5..=8 = column B
    // (X6Y5..8), 9 = JOIN, 10 = CLB sink.
    let tiles = vec![
        RawTile { name: "FORK_X5Y4".to_string(), tile_type: 1, sites: vec![] },
        RawTile { name: "INT_X4Y5".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X4Y6".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X4Y7".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X4Y8".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X6Y5".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X6Y6".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X6Y7".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "INT_X6Y8".to_string(), tile_type: 0, sites: vec![] },
        RawTile { name: "JOIN_X5Y9".to_string(), tile_type: 2, sites: vec![] },
        RawTile {
            name: "CLEL_SNK_X5Y10".to_string(),
            tile_type: 3,
            sites: vec![RawSiteInstance { name: "SLICE_X5Y10".to_string(), site_type_slot: 0 }],
        },
    ];

    let wires = vec![
        RawWireRef { tile: 0, wire: 0 }, // 0: FORK.IN
        RawWireRef { tile: 0, wire: 1 }, // 1: FORK.OUT_A
        RawWireRef { tile: 0, wire: 2 }, // 2: FORK.OUT_B
        RawWireRef { tile: 1, wire: 0 }, // 3: INT_X4Y5.IN
        RawWireRef { tile: 1, wire: 1 }, // 4: INT_X4Y5.OUT
        RawWireRef { tile: 2, wire: 0 }, // 5: INT_X4Y6.IN
        RawWireRef { tile: 2, wire: 1 }, // 6: INT_X4Y6.OUT
        RawWireRef { tile: 3, wire: 0 }, // 7: INT_X4Y7.IN
        RawWireRef { tile: 3, wire: 1 }, // 8: INT_X4Y7.OUT
        RawWireRef { tile: 4, wire: 0 }, // 9: INT_X4Y8.IN
        RawWireRef { tile: 4, wire: 1 }, // 10: INT_X4Y8.OUT
        RawWireRef { tile: 5, wire: 0 }, // 11: INT_X6Y5.IN
        RawWireRef { tile: 5, wire: 1 }, // 12: INT_X6Y5.OUT
        RawWireRef { tile: 6, wire: 0 }, // 13: INT_X6Y6.IN
        RawWireRef { tile: 6, wire: 1 }, // 14: INT_X6Y6.OUT
        RawWireRef { tile: 7, wire: 0 }, // 15: INT_X6Y7.IN
        RawWireRef { tile: 7, wire: 1 }, // 16: INT_X6Y7.OUT
        RawWireRef { tile: 8, wire: 0 }, // 17: INT_X6Y8.IN
        RawWireRef { tile: 8, wire: 1 }, // 18: INT_X6Y8.OUT
        RawWireRef { tile: 9, wire: 0 }, // 19: JOIN.IN_A
        RawWireRef { tile: 9, wire: 1 }, // 20: JOIN.IN_B
        RawWireRef { tile: 9, wire: 2 }, // 21: JOIN.OUT
        RawWireRef { tile: 10, wire: 0 }, // 22: CLB_sink.A_I
    ];

    let nodes = vec![
        RawNode { wires: vec![1, 3] },   // FORK.OUT_A <-> INT_X4Y5.IN
        RawNode { wires: vec![4, 5] },   // INT_X4Y5.OUT <-> INT_X4Y6.IN
        RawNode { wires: vec![6, 7] },   // INT_X4Y6.OUT <-> INT_X4Y7.IN
        RawNode { wires: vec![8, 9] },   // INT_X4Y7.OUT <-> INT_X4Y8.IN
        RawNode { wires: vec![10, 19] }, // INT_X4Y8.OUT <-> JOIN.IN_A
        RawNode { wires: vec![2, 11] },  // FORK.OUT_B <-> INT_X6Y5.IN
        RawNode { wires: vec![12, 13] }, // INT_X6Y5.OUT <-> INT_X6Y6.IN
        RawNode { wires: vec![14, 15] }, // INT_X6Y6.OUT <-> INT_X6Y7.IN
        RawNode { wires: vec![16, 17] }, // INT_X6Y7.OUT <-> INT_X6Y8.IN
        RawNode { wires: vec![18, 20] }, // INT_X6Y8.OUT <-> JOIN.IN_B
        RawNode { wires: vec![21, 22] }, // JOIN.OUT <-> CLB_sink.A_I
    ];

    DeviceDescription {
        part_name: "test".to_string(),
        tiles,
        tile_types: vec![int_type, fork_type, join_type, clb_snk_type],
        wires,
        nodes,
    }
}
