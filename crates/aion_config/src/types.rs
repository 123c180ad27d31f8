//! Configuration types deserialized from `router.toml`.

use serde::Deserialize;

/// Router tunables, loaded from an optional `router.toml`.
///
/// Every field has a default matching the values the negotiated-congestion
/// router is designed around, so routing runs correctly with no config file
/// present at all — `router.toml` only needs to name the fields a caller
/// wants to override.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum rip-up-and-reroute iterations before the router gives up on
    /// the current net set and reports unresolved congestion.
    pub max_iterations: u32,
    /// Ceiling applied to a resource's escalating present-congestion cost,
    /// preventing runaway cost growth across iterations from overflowing
    /// the A* priority ordering.
    pub node_cost_cap: f64,
    /// Clamp applied to the per-iteration historic-cost increment charged to
    /// a ripped-up resource.
    pub rip_cost_clamp: f64,
    /// Horizontal padding (in tile columns) added to a net's bounding box
    /// when constraining the A* search.
    pub bounding_box_pad_x: u32,
    /// Vertical padding (in tile rows) added to a net's bounding box when
    /// constraining the A* search.
    pub bounding_box_pad_y: u32,
    /// Multiplier applied to the A* admissible distance heuristic.
    pub heuristic_multiplier: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 150,
            node_cost_cap: 256.0,
            rip_cost_clamp: 8.0,
            bounding_box_pad_x: 3,
            bounding_box_pad_y: 15,
            heuristic_multiplier: 4.0,
        }
    }
}
