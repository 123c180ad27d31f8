//! Per-resource congestion bookkeeping shared by PIP-graph search and the router.
//!
//! A [`WireResource`] tracks both the negotiated-congestion state of a routing
//! resource (`usage`/`present_cost`/`historic_cost`, which persist across
//! routing iterations) and the scratch state of a single search pass
//! (`parent`/`cost_parent`/`explored_id`, which are rewritten every time the
//! resource is touched by [`crate::pip_graph::PipGraph::find_reachable`]).

/// Sentinel `explored_id` meaning "not yet visited by any search."
pub const UNEXPLORED: i64 = -2;

/// Sentinel `explored_id` meaning "owned exclusively by the net currently being
/// routed, and therefore free to reuse (but not to fork from)."
pub const OWNED_BY_CURRENT_NET: i64 = -1;

/// Sentinel `parent` meaning "this is the search root."
pub const ROOT_PARENT: i32 = -2;

/// A single routing resource's present/historic cost and search scratch state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireResource {
    /// Number of nets currently routed through this resource.
    pub usage: u32,
    /// Present-congestion cost. `-1.0` means forbidden, `0.0` means free to
    /// reuse by the net currently being routed, otherwise `>= 1.0`.
    pub present_cost: f64,
    /// Historic-congestion cost, monotonically non-decreasing, always `>= 1.0`.
    pub historic_cost: f64,
    /// Search-scratch: the vertex this resource was reached from, or
    /// [`ROOT_PARENT`] if this resource is a search root.
    pub parent: i32,
    /// Search-scratch: the path cost accumulated up to (not through) this resource.
    pub cost_parent: f64,
    /// Search-scratch: the id of the search that last touched this resource, or
    /// [`OWNED_BY_CURRENT_NET`]/[`UNEXPLORED`].
    pub explored_id: i64,
}

impl WireResource {
    /// A fresh, unused, unforbidden resource.
    pub fn new() -> Self {
        Self {
            usage: 0,
            present_cost: 1.0,
            historic_cost: 1.0,
            parent: ROOT_PARENT,
            cost_parent: 0.0,
            explored_id: UNEXPLORED,
        }
    }

    /// A resource that can never be routed through (e.g. a `BYPASS`/`BOUNCE_` wire).
    pub fn forbidden() -> Self {
        Self {
            present_cost: -1.0,
            ..Self::new()
        }
    }

    /// Whether this resource is forbidden from ever being routed through.
    pub fn is_forbidden(&self) -> bool {
        self.present_cost < 0.0
    }

    /// The combined congestion cost of using this resource: `present * historic`.
    ///
    /// Only meaningful when the resource is not forbidden; callers must check
    /// [`is_forbidden`](Self::is_forbidden) first.
    pub fn cost(&self) -> f64 {
        debug_assert!(self.present_cost >= 0.0, "cost() called on a forbidden resource");
        self.present_cost * self.historic_cost
    }

    /// Marks this resource as exclusively owned by the net currently being
    /// routed, making it free (but not forkable) to reuse during its search.
    pub fn mark_owned_by_current_net(&mut self) {
        self.explored_id = OWNED_BY_CURRENT_NET;
    }

    /// Increments usage by one net claiming this resource.
    pub fn increment_usage(&mut self) {
        self.usage += 1;
    }

    /// Decrements usage by one net releasing this resource.
    pub fn decrement_usage(&mut self) {
        self.usage = self.usage.saturating_sub(1);
    }

    /// Folds the current usage into the historic cost.
    ///
    /// Requires `usage >= 1`; callers only invoke this on resources that are
    /// actually in use (overused resources at the end of a routing iteration).
    pub fn update_historic_cost(&mut self, history_factor: f64) {
        debug_assert!(self.usage >= 1, "update_historic_cost on an unused resource");
        self.historic_cost += (self.usage as f64 - 1.0) * history_factor;
    }
}

impl Default for WireResource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_resource_is_free_and_unforbidden() {
        let r = WireResource::new();
        assert!(!r.is_forbidden());
        assert_eq!(r.cost(), 1.0);
        assert_eq!(r.usage, 0);
    }

    #[test]
    fn forbidden_resource_reports_forbidden() {
        let r = WireResource::forbidden();
        assert!(r.is_forbidden());
    }

    #[test]
    fn cost_multiplies_present_and_historic() {
        let mut r = WireResource::new();
        r.present_cost = 3.0;
        r.historic_cost = 2.0;
        assert_eq!(r.cost(), 6.0);
    }

    #[test]
    fn usage_increment_and_decrement() {
        let mut r = WireResource::new();
        r.increment_usage();
        r.increment_usage();
        assert_eq!(r.usage, 2);
        r.decrement_usage();
        assert_eq!(r.usage, 1);
    }

    #[test]
    fn decrement_usage_saturates_at_zero() {
        let mut r = WireResource::new();
        r.decrement_usage();
        assert_eq!(r.usage, 0);
    }

    #[test]
    fn update_historic_cost_folds_excess_usage() {
        let mut r = WireResource::new();
        r.usage = 3;
        r.historic_cost = 1.0;
        r.update_historic_cost(1.0);
        assert_eq!(r.historic_cost, 3.0);
    }

    #[test]
    fn mark_owned_sets_sentinel() {
        let mut r = WireResource::new();
        r.mark_owned_by_current_net();
        assert_eq!(r.explored_id, OWNED_BY_CURRENT_NET);
    }
}
