//! Device architecture model for the Aion FPGA router.
//!
//! This crate turns a decoded device description into the static,
//! derived-once tables the router searches against:
//!
//! - [`device`]: tile/tile-type indices, wire-to-node membership, and the
//!   downhill/uphill/output/source-sink wire sets (C1).
//! - [`pip_graph`]: one switch-box [`PipGraph`](pip_graph::PipGraph) per tile
//!   type, searched by A* during routing (C2).
//! - [`template`]: the inter-tile template graph describing how a tile's
//!   outputs reach neighboring tiles (C3).
//! - [`prerouted`]: fixed site-pin-to-`"INT"`-tile path segments, reused by
//!   every net touching that pin (C4).
//! - [`resource`]: the per-resource congestion/search-scratch state shared by
//!   [`pip_graph`] and the router.
//! - [`routing_branch`]: the tree representation used both by pre-routed
//!   segments and by a net's own accumulated route.
//!
//! Decoding a vendor device file into a [`device::DeviceDescription`] is out
//! of scope for this crate.

#![warn(missing_docs)]

pub mod device;
pub mod error;
pub mod ids;
pub mod pip_graph;
pub mod prerouted;
pub mod resource;
pub mod routing_branch;
pub mod template;

pub use device::{build_device_tables, build_pip_graphs, DeviceDescription, DeviceTables};
pub use error::ArchError;
pub use ids::{NodeId, TileId, TileTypeId, VertexId};
pub use pip_graph::PipGraph;
pub use prerouted::{build_prerouted_paths, PreroutedPaths};
pub use resource::WireResource;
pub use routing_branch::RoutingBranch;
pub use template::{build_inter_tile_graph, InterTileGraph, InterTileGraphBuilder, Template, TemplateDest};
