//! Safety-gated failover drill.
//!
//! A failover of the primary (the dominant component) onto one of its
//! backups is committed through the agreement simulator, but only while two
//! assumptions jointly hold:
//!
//! 1. **Latency dominance**: the primary's latency is within 5% of the
//!    slowest component.
//! 2. **Contention invariants**: the [`ContentionModel`] invariants, with
//!    quorum availability measured from the backups' health.
//!
//! Both are re-validated before `prepare` and again before `accept`.
//!
//! ```text
//! prepare_failover ──► promise (per backup node) ──► accept_failover ──► execute_failover
//!   (assumptions)          (node last timestamp)        (assumptions)       (pick healthy backup)
//! ```

use std::collections::HashMap;

use quorumscope_agreement::{AgreementSimulator, Timestamp};
use quorumscope_core::{Component, ComponentStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::contention::ContentionModel;

/// Fraction of the slowest latency the primary must reach to count as
/// latency dominant.
pub const LATENCY_DOMINANCE_TOLERANCE: f64 = 0.95;

/// Tracks whether the failover safety assumptions hold.
///
/// Both flags start `true` and are overwritten by each validation.
#[derive(Debug, Clone)]
pub struct AssumptionValidator {
    primary: Component,
    quorum_size: usize,
    latency_dominance_holds: bool,
    contention_invariants_hold: bool,
}

impl AssumptionValidator {
    /// Validator for `primary` with the given quorum size.
    pub fn new(primary: Component, quorum_size: usize) -> Self {
        Self {
            primary,
            quorum_size,
            latency_dominance_holds: true,
            contention_invariants_hold: true,
        }
    }

    /// Whether the primary's latency is at least
    /// [`LATENCY_DOMINANCE_TOLERANCE`] of the maximum latency in `all`.
    pub fn validate_latency_dominance(&mut self, all: &[Component]) -> bool {
        let max_latency = all.iter().map(|c| c.latency_ms).fold(0.0, f64::max);
        self.latency_dominance_holds =
            self.primary.latency_ms >= max_latency * LATENCY_DOMINANCE_TOLERANCE;
        self.latency_dominance_holds
    }

    /// The contention invariants for the primary, fed with the last latency
    /// dominance result.
    pub fn validate_contention_invariants(&mut self, quorum_availability: f64) -> bool {
        let mut model = ContentionModel::new(&self.primary, self.quorum_size);
        self.contention_invariants_hold =
            model.check_invariants(self.latency_dominance_holds, quorum_availability);
        self.contention_invariants_hold
    }

    /// Re-validate both assumptions.
    pub fn validate_joint_assumptions(
        &mut self,
        all: &[Component],
        quorum_availability: f64,
    ) -> bool {
        let dominance = self.validate_latency_dominance(all);
        let contention = self.validate_contention_invariants(quorum_availability);
        dominance && contention
    }

    /// Result of the last validations, without re-running them.
    pub fn safety_conditions_met(&self) -> bool {
        self.latency_dominance_holds && self.contention_invariants_hold
    }
}

/// A standby replica and its health.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupNode {
    /// The replica.
    pub component: Component,
    /// Its current health.
    pub status: ComponentStatus,
}

/// Result of [`FailoverManager::execute_failover`] (and of a full drill).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailoverOutcome {
    /// The primary was demoted and `target` took over.
    Completed {
        /// Name of the backup that took over.
        target: String,
    },
    /// The assumptions did not hold when the failover was prepared or
    /// accepted.
    AssumptionsViolated,
    /// The proposal was never accepted.
    NotCommitted,
    /// The proposal was accepted, but the safety conditions no longer hold.
    SafetyConditionsUnmet,
    /// No backup is healthy.
    NoHealthyBackup,
}

impl FailoverOutcome {
    /// Whether the failover went through.
    pub fn is_success(&self) -> bool {
        matches!(self, FailoverOutcome::Completed { .. })
    }
}

impl std::fmt::Display for FailoverOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverOutcome::Completed { target } => write!(f, "failover to {target}"),
            FailoverOutcome::AssumptionsViolated => {
                f.write_str("rejected: latency dominance and contention invariants do not jointly hold")
            }
            FailoverOutcome::NotCommitted => f.write_str("proposal not committed"),
            FailoverOutcome::SafetyConditionsUnmet => f.write_str("safety conditions not met"),
            FailoverOutcome::NoHealthyBackup => f.write_str("no healthy backup available"),
        }
    }
}

/// Drives a failover of the primary through quorum agreement.
#[derive(Debug, Clone)]
pub struct FailoverManager {
    primary: Component,
    primary_status: ComponentStatus,
    backups: Vec<BackupNode>,
    validator: AssumptionValidator,
    simulator: AgreementSimulator,
    /// Highest proposal timestamp each node has promised to.
    node_timestamps: HashMap<String, Timestamp>,
    safety_enabled: bool,
}

impl FailoverManager {
    /// Manager for `primary` with all `backups` initially healthy.
    pub fn new(primary: Component, backups: Vec<Component>, quorum_size: usize) -> Self {
        let backups = backups
            .into_iter()
            .map(|component| BackupNode {
                component,
                status: ComponentStatus::Healthy,
            })
            .collect();
        Self {
            validator: AssumptionValidator::new(primary.clone(), quorum_size),
            simulator: AgreementSimulator::new(primary.name.clone(), quorum_size),
            primary,
            primary_status: ComponentStatus::Healthy,
            backups,
            node_timestamps: HashMap::new(),
            safety_enabled: true,
        }
    }

    /// Fraction of backups that are healthy or degraded; `0` with no backups.
    pub fn quorum_availability(&self) -> f64 {
        if self.backups.is_empty() {
            return 0.0;
        }
        let available = self
            .backups
            .iter()
            .filter(|b| b.status.is_available())
            .count();
        available as f64 / self.backups.len() as f64
    }

    /// Prepare a failover proposal if the assumptions hold.
    pub fn prepare_failover(&mut self, request_id: &str, data: Vec<u8>, all: &[Component]) -> bool {
        let availability = self.quorum_availability();
        let valid = self.validator.validate_joint_assumptions(all, availability);
        if !valid || !self.safety_enabled {
            warn!(
                request_id,
                primary = %self.primary.name,
                quorum_availability = availability,
                safety_enabled = self.safety_enabled,
                "failover prepare rejected: assumptions do not jointly hold"
            );
            return false;
        }
        self.simulator.prepare(request_id, data)
    }

    /// Whether the live proposal for `request_id` is the one that was
    /// accepted. A re-prepared proposal starts uncommitted even though the
    /// earlier snapshot is still stored.
    pub fn is_committed(&self, request_id: &str) -> bool {
        match (
            self.simulator.proposal(request_id),
            self.simulator.accepted(request_id),
        ) {
            (Some(live), Some(accepted)) => live.timestamp == accepted.timestamp,
            _ => false,
        }
    }

    /// Record a promise from `node_id`, using the node's own last promised
    /// timestamp. Refused once the proposal is committed.
    pub fn promise(&mut self, request_id: &str, node_id: &str) -> bool {
        if self.is_committed(request_id) {
            return false;
        }
        let Some(timestamp) = self.simulator.proposal(request_id).map(|p| p.timestamp) else {
            return false;
        };

        let last = self
            .node_timestamps
            .get(node_id)
            .copied()
            .unwrap_or(Timestamp::ZERO);
        if !self.simulator.promise(request_id, node_id, last) {
            return false;
        }
        self.node_timestamps.insert(node_id.to_string(), timestamp);
        true
    }

    /// Accept the proposal, re-validating the assumptions first.
    pub fn accept_failover(&mut self, request_id: &str, all: &[Component]) -> bool {
        if self.simulator.proposal(request_id).is_none() || self.is_committed(request_id) {
            return false;
        }

        let availability = self.quorum_availability();
        if !self.validator.validate_joint_assumptions(all, availability) {
            warn!(
                request_id,
                primary = %self.primary.name,
                "failover accept rejected: assumptions violated before commit"
            );
            return false;
        }
        self.simulator.accept(request_id)
    }

    /// Switch to the fastest healthy backup if the proposal is committed and
    /// the safety conditions still hold.
    pub fn execute_failover(&mut self, request_id: &str) -> FailoverOutcome {
        if !self.is_committed(request_id) {
            return FailoverOutcome::NotCommitted;
        }
        if !self.validator.safety_conditions_met() {
            return FailoverOutcome::SafetyConditionsUnmet;
        }

        let target = self
            .backups
            .iter_mut()
            .filter(|b| b.status == ComponentStatus::Healthy)
            .min_by(|a, b| a.component.latency_ms.total_cmp(&b.component.latency_ms));
        let Some(target) = target else {
            return FailoverOutcome::NoHealthyBackup;
        };

        self.primary_status = ComponentStatus::Degraded;
        target.status = ComponentStatus::Healthy;

        info!(
            request_id,
            primary = %self.primary.name,
            target = %target.component.name,
            "failover executed"
        );
        FailoverOutcome::Completed {
            target: target.component.name.clone(),
        }
    }

    /// Re-validate the assumptions and enable or disable failovers
    /// accordingly.
    pub fn validate_safety_periodic(&mut self, all: &[Component]) -> bool {
        let availability = self.quorum_availability();
        let valid = self.validator.validate_joint_assumptions(all, availability);
        if !valid {
            warn!(
                primary = %self.primary.name,
                "safety assumptions violated, failover operations will be rejected"
            );
        }
        self.safety_enabled = valid;
        valid
    }

    /// Run prepare, one promise per backup, accept and execute.
    pub fn run_drill(&mut self, request_id: &str, data: Vec<u8>, all: &[Component]) -> FailoverOutcome {
        if !self.prepare_failover(request_id, data, all) {
            return FailoverOutcome::AssumptionsViolated;
        }

        let nodes: Vec<String> = self
            .backups
            .iter()
            .filter(|b| b.status.is_available())
            .map(|b| b.component.name.clone())
            .collect();
        for node in &nodes {
            self.promise(request_id, node);
        }

        if !self.accept_failover(request_id, all) && !self.validator.safety_conditions_met() {
            return FailoverOutcome::AssumptionsViolated;
        }
        self.execute_failover(request_id)
    }

    /// Change a backup's health. Returns `false` if no backup has that name.
    pub fn set_backup_status(&mut self, name: &str, status: ComponentStatus) -> bool {
        match self.backups.iter_mut().find(|b| b.component.name == name) {
            Some(backup) => {
                backup.status = status;
                true
            }
            None => false,
        }
    }

    /// The primary's health.
    pub fn primary_status(&self) -> ComponentStatus {
        self.primary_status
    }

    /// The backups and their health.
    pub fn backups(&self) -> &[BackupNode] {
        &self.backups
    }

    /// Whether failovers are currently allowed by the periodic check.
    pub fn safety_enabled(&self) -> bool {
        self.safety_enabled
    }

    /// The underlying agreement simulator.
    pub fn simulator(&self) -> &AgreementSimulator {
        &self.simulator
    }
}
