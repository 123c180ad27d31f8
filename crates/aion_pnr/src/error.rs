//! Error types for net ingestion and routing.

/// Fatal errors raised while adapting an external design into nets the
/// router can work with.
///
/// These indicate the external design itself is malformed — an unresolvable
/// stub, PIP, or site reference — not that a net failed to route.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A stub referenced a site that does not exist on this device.
    #[error("net {net:?} references unknown site {site:?}")]
    UnknownSite { net: String, site: String },

    /// A stub referenced a pin that its site type does not expose.
    #[error("net {net:?} references unknown pin {pin:?} on site {site:?}")]
    UnknownPin { net: String, site: String, pin: String },

    /// A net had no driver stub.
    #[error("net {0:?} has no source stub")]
    MissingSource(String),

    /// Deriving device tables or PIP graphs failed.
    #[error("device table error: {0}")]
    Arch(#[from] aion_arch::ArchError),
}

/// Fatal errors raised by the router itself.
///
/// Failing to fully resolve congestion within the iteration budget is not
/// fatal — it is reported through `aion_diagnostics::DiagnosticSink` instead,
/// leaving the best routing found so far in place.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// A* search could not reach a sink at all (no path exists, as opposed to
    /// merely being congested).
    #[error("net {net:?} has no path to sink at ({x}, {y})")]
    UnreachableSink { net: String, x: i32, y: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_source() {
        let err = IngestError::MissingSource("clk_net".to_string());
        assert!(format!("{err}").contains("clk_net"));
    }

    #[test]
    fn display_unreachable_sink() {
        let err = RouterError::UnreachableSink {
            net: "data_net".to_string(),
            x: 3,
            y: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("data_net"));
        assert!(msg.contains('3'));
    }
}
