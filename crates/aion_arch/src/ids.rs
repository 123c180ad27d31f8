//! Opaque ID newtypes for device-table entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! These IDs index into the derived device tables built in [`crate::device`]: tiles,
//! tile types, electrically-equivalent nodes, and per-tile-type PIP-graph vertices.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a tile instance in the device grid.
    TileId
);

define_id!(
    /// Opaque, copyable ID for a tile type (all tiles of a type share one PIP graph).
    TileTypeId
);

define_id!(
    /// Opaque, copyable ID for a site instance within a tile.
    SiteId
);

define_id!(
    /// Opaque, copyable ID for an electrically-equivalent node spanning tiles.
    NodeId
);

define_id!(
    /// Dense, per-tile-type vertex index into a [`crate::pip_graph::PipGraph`].
    ///
    /// Two tiles of the same type share the same `VertexId` space; the same
    /// index means different physical wires in different tile instances.
    VertexId
);
