//! Place and route engine for the Aion FPGA toolchain: negotiated-congestion
//! routing over a fixed device (placement is out of scope here — nets arrive
//! already bound to site pins).
//!
//! # Pipeline
//!
//! 1. **Adapt** ([`adapter`]) — external nets in, resolved against device
//!    tables and pre-routed fan-in/fan-out segments.
//! 2. **Route** ([`router`]) — iterate rip-up and reroute until no net
//!    conflicts with another, or the iteration budget is spent.
//! 3. **Search** ([`astar`]) — one net's one sink, per iteration.
//! 4. **Adapt** ([`adapter`]) — routed nets back out, as external PIP lists.
//!
//! # Usage
//!
//! ```ignore
//! use aion_pnr::{DesignAdapter, Router, ResourceTable};
//!
//! let adapter = DesignAdapter::new(&tables, &pip_graphs);
//! let mut resources = ResourceTable::new(&tables, &pip_graphs);
//! let mut nets: Vec<_> = externals
//!     .iter()
//!     .filter_map(|e| adapter.ingest(e, &mut resources, &config).transpose())
//!     .collect::<Result<_, _>>()?;
//!
//! let mut router = Router::new(&tables, &pip_graphs, &inter_tile, config);
//! router.route_nets(&mut nets, &mut resources, &sink);
//!
//! let routed: Vec<_> = nets.iter().map(|n| adapter.emit(n)).collect();
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod astar;
pub mod error;
pub mod ids;
pub mod net;
pub mod resources;
pub mod router;
#[cfg(test)]
mod test_fixtures;

pub use adapter::{DesignAdapter, ExternalNet, ExternalPip, ExternalStub, RoutedExternalNet, StubDirection};
pub use astar::{AStarSeed, PathResult, TilePath};
pub use error::{IngestError, RouterError};
pub use ids::NetId;
pub use net::{BoundingBox, Net, NetSink, NetSource};
pub use resources::ResourceTable;
pub use router::Router;
