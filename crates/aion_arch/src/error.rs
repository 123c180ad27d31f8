//! Error types for device-table derivation.

use crate::ids::TileTypeId;

/// Fatal errors raised while deriving device tables, PIP graphs, the inter-tile
/// template, or pre-routed fan-in/fan-out segments from a device description.
///
/// These indicate the device description itself is malformed, not that a
/// particular net failed to route — routing failures are non-fatal and go
/// through `aion_diagnostics::DiagnosticSink` instead.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// A tile or PIP referenced a tile type index outside the device's tile type list.
    #[error("device description references unknown tile type index {0}")]
    UnknownTileType(u32),

    /// No tile type named `"INT"` was found; the router cannot identify interconnect tiles.
    #[error("device description has no tile type named \"INT\"")]
    MissingIntTileType,

    /// A tile name did not end in the expected `X<col>Y<row>` coordinate suffix.
    #[error("tile name {0:?} does not end in the expected X<col>Y<row> coordinate suffix")]
    MalformedTileName(String),

    /// A wire name was looked up in a tile type's PIP graph but never appeared in any PIP.
    #[error("wire {wire:?} has no PIP graph vertex in tile type {tile_type:?}")]
    UnknownWire { wire: String, tile_type: TileTypeId },

    /// Reading or writing the device-table cache failed.
    #[error("device table cache error: {0}")]
    Cache(#[from] aion_cache::CacheError),

    /// A cached table could not be decoded; the cache entry is corrupt or from an
    /// incompatible layout and should be rebuilt.
    #[error("failed to decode cached device table {table:?}: {reason}")]
    CacheDecode { table: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_int() {
        let err = ArchError::MissingIntTileType;
        assert_eq!(
            format!("{err}"),
            "device description has no tile type named \"INT\""
        );
    }

    #[test]
    fn display_malformed_tile_name() {
        let err = ArchError::MalformedTileName("CLEL_L".to_string());
        assert!(format!("{err}").contains("CLEL_L"));
    }

    #[test]
    fn display_unknown_wire() {
        let err = ArchError::UnknownWire {
            wire: "IMUX_E0".to_string(),
            tile_type: TileTypeId::from_raw(3),
        };
        let msg = format!("{err}");
        assert!(msg.contains("IMUX_E0"));
        assert!(msg.contains("3"));
    }
}
