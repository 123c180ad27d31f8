//! Device-derived-table cache management.
//!
//! This crate provides content-hash-based caching for the static tables
//! derived from a device description (string table, tile/wire/node indices,
//! switch-box PIP graphs, inter-tile templates, pre-routed fan-in/fan-out
//! segments). Callers supply a device-identity hash; cache files are treated
//! as opaque blobs with no version negotiation beyond the artifact header's
//! magic/format/checksum check, so a stale or foreign-version cache simply
//! misses rather than failing.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod error;

pub use artifact::{ArtifactHeader, ArtifactStore};
pub use cache::DeviceTableCache;
pub use error::CacheError;
