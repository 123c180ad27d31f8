//! Device-derived-table cache orchestrator.
//!
//! `DeviceTableCache` stores and retrieves the static tables an architecture
//! loader derives from a device description (C1's string/tile/wire/node
//! tables, C2's per-tile-type `PipGraph`s, C3's inter-tile template graph,
//! C4's pre-routed fan-in/fan-out segments). Each table is keyed by a table
//! name (used as the artifact subdirectory) and a caller-supplied
//! `ContentHash` identifying the device description the tables were derived
//! from. There is no manifest: device-file decoding, and therefore computing
//! that identity hash, is out of scope here, so the cache carries no
//! knowledge of what makes two device descriptions equal beyond the hash it
//! is given. A caller that wants to invalidate a stale cache deletes the
//! directory; reads are fail-safe and simply miss on any corruption.
use std::path::{Path, PathBuf};

use aion_common::ContentHash;

use crate::artifact::ArtifactStore;
use crate::error::CacheError;

/// File extension used for all cached device-table artifacts.
const TABLE_EXT: &str = "bin";

/// Cache for device-derived static tables, keyed by table name and device identity.
pub struct DeviceTableCache {
    /// Root directory for all cache files.
    cache_dir: PathBuf,

    /// Content-addressed binary artifact store.
    store: ArtifactStore,

    /// Aion version string recorded in written artifact headers.
    aion_version: String,
}

impl DeviceTableCache {
    /// Opens a device-table cache rooted at `cache_dir`.
    ///
    /// The directory need not exist yet; it is created on first write.
    pub fn new(cache_dir: &Path, aion_version: &str) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            store: ArtifactStore::new(cache_dir),
            aion_version: aion_version.to_string(),
        }
    }

    /// Loads a cached table's raw bytes, or `None` on a cache miss.
    ///
    /// `table_name` identifies which derived table this is (e.g.
    /// `"pip_graphs"`, `"templates"`, `"prerouted"`); `device_identity`
    /// identifies the device description the tables were derived from.
    /// A miss covers everything from "never cached" through "corrupted" to
    /// "produced by a different Aion build" — all are treated identically,
    /// forcing the caller to recompute and re-store.
    pub fn load(&self, table_name: &str, device_identity: &ContentHash) -> Option<Vec<u8>> {
        self.store
            .read_artifact(table_name, &device_identity.to_string(), TABLE_EXT)
    }

    /// Stores a table's raw bytes under `table_name`, keyed by `device_identity`.
    pub fn store(
        &self,
        table_name: &str,
        device_identity: &ContentHash,
        bytes: &[u8],
    ) -> Result<(), CacheError> {
        self.store.write_artifact(
            table_name,
            TABLE_EXT,
            device_identity,
            bytes,
            &self.aion_version,
        )?;
        Ok(())
    }

    /// Root directory this cache is rooted at.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Runs garbage collection on a single table's artifacts, keeping only
    /// the ones whose device-identity key appears in `live_identities`.
    ///
    /// Returns the number of stale artifact files removed.
    pub fn gc(&self, table_name: &str, live_identities: &[ContentHash]) -> Result<usize, CacheError> {
        let live_keys: Vec<String> = live_identities.iter().map(ContentHash::to_string).collect();
        let live_keys: Vec<&str> = live_keys.iter().map(String::as_str).collect();
        self.store.gc(table_name, TABLE_EXT, &live_keys)
    }
}
