//! Contention and feasibility invariants for the dominant component.
//!
//! Contention estimates the number of requests in flight with Little's law
//! (arrival rate × mean latency), normalized by the quorum size:
//!
//! ```text
//! contention = requests_per_sec * latency_ms / (1000 * quorum_size)
//! ```
//!
//! The model is feasible only while three invariants hold together:
//!
//! | # | Invariant | Threshold |
//! |---|---|---|
//! | I1 | the component is latency dominant | supplied flag |
//! | I2 | reliability | `>= 94.7 %` |
//! | I3 | quorum availability | `>= 2/3` |

use quorumscope_core::Component;
use serde::Serialize;
use tracing::debug;

/// Minimum reliability, in percent, for the model to be feasible.
pub const MIN_RELIABILITY_PERCENT: f64 = 94.7;

/// Minimum fraction of the quorum that must be reachable.
pub const MIN_QUORUM_AVAILABILITY: f64 = 2.0 / 3.0;

/// The individual conditions evaluated by the last invariant check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvariantCheck {
    /// I1: the latency-dominance flag supplied by the caller.
    pub latency_dominant: bool,
    /// I2: reliability at or above [`MIN_RELIABILITY_PERCENT`].
    pub reliability_ok: bool,
    /// I3: quorum availability at or above [`MIN_QUORUM_AVAILABILITY`].
    pub quorum_ok: bool,
}

impl InvariantCheck {
    /// Whether all three conditions hold.
    pub fn holds(&self) -> bool {
        self.latency_dominant && self.reliability_ok && self.quorum_ok
    }
}

/// Contention metric and invariants for one component.
#[derive(Debug, Clone)]
pub struct ContentionModel<'a> {
    component: &'a Component,
    quorum_size: usize,
    /// Result of the last check. Starts `true`.
    invariants_valid: bool,
    last_check: Option<InvariantCheck>,
}

impl<'a> ContentionModel<'a> {
    /// Create a model for `component` with the given quorum size.
    pub fn new(component: &'a Component, quorum_size: usize) -> Self {
        Self {
            component,
            quorum_size,
            invariants_valid: true,
            last_check: None,
        }
    }

    /// Estimated in-flight requests per quorum member.
    pub fn calculate_contention(&self) -> f64 {
        (self.component.requests_per_sec as f64 * self.component.latency_ms)
            / (1000.0 * self.quorum_size as f64)
    }

    /// Evaluate I1..I3 and cache the combined result.
    pub fn check_invariants(&mut self, is_latency_dominant: bool, quorum_available: f64) -> bool {
        let check = InvariantCheck {
            latency_dominant: is_latency_dominant,
            reliability_ok: self.component.reliability_percent >= MIN_RELIABILITY_PERCENT,
            quorum_ok: quorum_available >= MIN_QUORUM_AVAILABILITY,
        };

        debug!(
            component = %self.component.name,
            latency_dominant = check.latency_dominant,
            reliability = self.component.reliability_percent,
            reliability_ok = check.reliability_ok,
            quorum_available,
            quorum_ok = check.quorum_ok,
            "checked contention invariants"
        );

        self.invariants_valid = check.holds();
        self.last_check = Some(check);
        self.invariants_valid
    }

    /// The cached result of the last check.
    ///
    /// Returns `true` if [`check_invariants`](Self::check_invariants) has never
    /// been called. Use [`last_check`](Self::last_check) to tell "never
    /// checked" apart from "checked and valid".
    pub fn is_feasible(&self) -> bool {
        self.invariants_valid
    }

    /// Details of the last check, `None` before the first one.
    pub fn last_check(&self) -> Option<InvariantCheck> {
        self.last_check
    }

    /// The modelled component.
    pub fn component(&self) -> &Component {
        self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(reliability: f64) -> Component {
        Component::new("Stage", 50.0, 4.0, 44.0, 1150.0, reliability, 275)
    }

    #[test]
    fn test_contention_formula() {
        let c = component(99.0);
        let model = ContentionModel::new(&c, 2);
        assert_eq!(model.component().name, "Stage");
        assert_eq!(model.calculate_contention(), 275.0 * 44.0 / 2000.0);
    }

    #[test]
    fn test_contention_scales_inversely_with_quorum() {
        let c = component(99.0);
        let two = ContentionModel::new(&c, 2).calculate_contention();
        let four = ContentionModel::new(&c, 4).calculate_contention();
        assert_eq!(two, four * 2.0);
    }

    #[test]
    fn test_feasible_by_default_until_checked() {
        let c = component(10.0);
        let model = ContentionModel::new(&c, 2);
        assert!(model.is_feasible());
        assert!(model.last_check().is_none());
    }

    #[test]
    fn test_low_reliability_is_infeasible() {
        let c = component(94.6);
        let mut model = ContentionModel::new(&c, 2);
        assert!(!model.check_invariants(true, 1.0));
        assert!(!model.is_feasible());

        let check = model.last_check().expect("checked");
        assert!(check.latency_dominant);
        assert!(!check.reliability_ok);
        assert!(check.quorum_ok);
    }

    #[test]
    fn test_exact_thresholds_are_feasible() {
        let c = component(94.7);
        let mut model = ContentionModel::new(&c, 2);
        assert!(model.check_invariants(true, 2.0 / 3.0));
        assert!(model.is_feasible());
    }

    #[test]
    fn test_each_invariant_is_required() {
        let c = component(94.7);
        let mut model = ContentionModel::new(&c, 2);

        assert!(!model.check_invariants(false, 0.95));
        assert!(!model.check_invariants(true, 0.66));
        assert!(model.check_invariants(true, 0.95));
    }

    #[test]
    fn test_result_is_cached_until_next_check() {
        let c = component(99.0);
        let mut model = ContentionModel::new(&c, 2);
        model.check_invariants(false, 0.95);
        assert!(!model.is_feasible());
        model.check_invariants(true, 0.95);
        assert!(model.is_feasible());
    }
}
