//! Pipeline orchestrator.
//!
//! Runs the analysis stages in a fixed order, threading the dominant
//! component through each one, and collects their outputs into
//! [`AnalysisResults`]:
//!
//! ```text
//! (a) dominance ──► (b) agreement probe ──► (c) contention + invariants
//!                                               │
//!        (f) failover drill ◄── (e) throughput ◄── (d) elasticity
//! ```
//!
//! Stage (f) only runs when backups are supplied.
//!
//! [`validate_assumption_chain`] then checks, from the collected results
//! alone, that each downstream result was produced from the upstream one it
//! depends on.

use quorumscope_agreement::{AgreementSimulator, Timestamp};
use quorumscope_core::{Component, ComponentRegistry, CoreError, DominanceAnalyzer, LatencyMetrics};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AnalysisConfig, AnalysisInput};
use crate::contention::{ContentionModel, InvariantCheck};
use crate::elasticity::{ElasticityOptimizer, TradeoffPoint};
use crate::error::{AnalysisError, ConfigError};
use crate::failover::{FailoverManager, FailoverOutcome};
use crate::throughput::{ThroughputOptimization, ThroughputOptimizer};

/// Node ids that answer the agreement probe.
const PROBE_NODES: [&str; 2] = ["node1", "node2"];

/// Outcome of the agreement probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    /// Request id of the probe proposal.
    pub request_id: String,
    /// Whether the probe reached its quorum.
    pub accepted: bool,
}

/// Elasticity stage results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElasticitySummary {
    /// Uncontended latency of the dominant component, in ms.
    pub base_latency: f64,
    /// Stationary contention level, `0` when `beta <= 1`.
    pub optimal_contention: f64,
    /// `L_eff` at the optimal contention, in ms.
    pub effective_latency_at_optimum: f64,
    /// Model evaluated at the requested contention levels.
    pub tradeoffs: Vec<TradeoffPoint>,
}

/// Everything the pipeline produced, stage by stage.
///
/// Entries are filled in order; a `None` means the stage did not run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResults {
    /// (a) Name of the dominant component.
    pub dominant_component: Option<String>,
    /// (a) Metrics for every component, in registry order.
    pub latency_metrics: Vec<LatencyMetrics>,
    /// (b) The simulator used for the probe, targeted at the dominant
    /// component.
    #[serde(skip)]
    pub agreement: Option<AgreementSimulator>,
    /// (b) Probe outcome.
    pub probe: Option<ProbeOutcome>,
    /// (c) Contention of the dominant component.
    pub contention: Option<f64>,
    /// (c) Individual invariant conditions.
    pub invariants: Option<InvariantCheck>,
    /// (c) Whether the contention model is feasible.
    pub model_feasible: Option<bool>,
    /// (d) Elasticity optimum and tradeoffs.
    pub elasticity: Option<ElasticitySummary>,
    /// (e) Memory-bounded throughput search.
    pub throughput: Option<ThroughputOptimization>,
    /// (f) Failover drill outcome.
    pub failover: Option<FailoverOutcome>,
}

impl AnalysisResults {
    /// Metrics of the dominant component.
    pub fn dominant_metrics(&self) -> Option<&LatencyMetrics> {
        let dominant = self.dominant_component.as_deref()?;
        self.latency_metrics.iter().find(|m| m.name == dominant)
    }

    /// See [`validate_assumption_chain`].
    pub fn validate_assumption_chain(&self) -> Result<(), ChainBreak> {
        validate_assumption_chain(self)
    }
}

/// First broken link found by [`validate_assumption_chain`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainBreak {
    /// (a) has not produced a dominant component.
    #[error("dominance analysis must complete first")]
    MissingDominance,

    /// (b) is missing or targets another component than (a) found.
    #[error("agreement target {found:?} does not match dominant component {expected}")]
    AgreementTargetMismatch {
        /// The dominant component.
        expected: String,
        /// The simulator's target, `None` if there is no simulator.
        found: Option<String>,
    },

    /// (c) has not produced a contention value.
    #[error("contention model has not been evaluated")]
    MissingContention,
}

/// Check that every stage result is backed by the result it depends on.
///
/// Purely structural: nothing is recomputed.
pub fn validate_assumption_chain(results: &AnalysisResults) -> Result<(), ChainBreak> {
    let outcome = check_chain(results);
    match &outcome {
        Ok(()) => info!("assumption chain validated"),
        Err(reason) => warn!(%reason, "assumption chain broken"),
    }
    outcome
}

fn check_chain(results: &AnalysisResults) -> Result<(), ChainBreak> {
    let dominant = results
        .dominant_component
        .as_deref()
        .ok_or(ChainBreak::MissingDominance)?;

    let target = results.agreement.as_ref().map(|a| a.target());
    if target != Some(dominant) {
        return Err(ChainBreak::AgreementTargetMismatch {
            expected: dominant.to_string(),
            found: target.map(str::to_string),
        });
    }

    if results.contention.is_none() {
        return Err(ChainBreak::MissingContention);
    }
    Ok(())
}

/// The analysis pipeline over a validated component set.
#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: ComponentRegistry,
    backups: Vec<Component>,
    config: AnalysisConfig,
    tradeoff_points: Vec<f64>,
}

impl Pipeline {
    /// Validate the configuration and build the registry.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Config`] for an invalid configuration and
    /// [`AnalysisError::Core`] for an invalid component set (cycle,
    /// duplicate name, unknown dependency, bad metric).
    pub fn new(components: Vec<Component>, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let registry = ComponentRegistry::new(components)?;
        Ok(Self {
            registry,
            backups: Vec::new(),
            config,
            tradeoff_points: Vec::new(),
        })
    }

    /// Build a pipeline from a parsed input document.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::new`].
    pub fn from_input(input: AnalysisInput) -> Result<Self, AnalysisError> {
        Ok(Self::new(input.components, input.config)?.with_backups(input.backups))
    }

    /// Standby replicas for the failover drill.
    pub fn with_backups(mut self, backups: Vec<Component>) -> Self {
        self.backups = backups;
        self
    }

    /// Contention levels to tabulate in the elasticity stage.
    pub fn with_tradeoff_points(mut self, points: Vec<f64>) -> Self {
        self.tradeoff_points = points;
        self
    }

    /// The validated registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The configuration in effect.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Core`] if the registry is empty, and
    /// [`AnalysisError::Config`] if the probe payload cannot be serialized.
    pub fn run(&self) -> Result<AnalysisResults, AnalysisError> {
        let mut results = AnalysisResults::default();

        // (a) dominance
        let report = DominanceAnalyzer::new(&self.registry).identify_dominant_source()?;
        let dominant = self
            .registry
            .get(&report.dominant)
            .ok_or_else(|| CoreError::UnknownComponent(report.dominant.clone()))?;
        results.dominant_component = Some(report.dominant.clone());
        results.latency_metrics = report.metrics;

        // (b) agreement probe
        let probe = &self.config.probe;
        let payload = serde_json::to_vec(&probe.payload).map_err(ConfigError::from)?;
        let mut agreement = AgreementSimulator::new(dominant.name.clone(), self.config.quorum_size);
        agreement.prepare(&probe.request_id, payload);
        for node in PROBE_NODES {
            agreement.promise(&probe.request_id, node, Timestamp::ZERO);
        }
        let accepted = agreement.accept(&probe.request_id);
        info!(
            target_component = %dominant.name,
            quorum_size = self.config.quorum_size,
            accepted,
            "agreement probe finished"
        );
        results.agreement = Some(agreement);
        results.probe = Some(ProbeOutcome {
            request_id: probe.request_id.clone(),
            accepted,
        });

        // (c) contention and invariants
        let mut contention_model = ContentionModel::new(dominant, self.config.quorum_size);
        let contention = contention_model.calculate_contention();
        contention_model.check_invariants(
            self.config.assume_latency_dominance,
            self.config.quorum_available,
        );
        info!(
            component = %dominant.name,
            contention,
            feasible = contention_model.is_feasible(),
            "contention model evaluated"
        );
        results.contention = Some(contention);
        results.invariants = contention_model.last_check();
        results.model_feasible = Some(contention_model.is_feasible());

        // (d) elasticity
        let elasticity = ElasticityOptimizer::from_config(dominant.latency_ms, &self.config.elasticity);
        let optimal_contention = elasticity.optimal_contention();
        let summary = ElasticitySummary {
            base_latency: dominant.latency_ms,
            optimal_contention,
            effective_latency_at_optimum: elasticity.effective_latency(optimal_contention),
            tradeoffs: elasticity.analyze_tradeoffs(&self.tradeoff_points),
        };
        info!(
            optimal_contention,
            effective_latency = summary.effective_latency_at_optimum,
            "elasticity optimum derived"
        );
        results.elasticity = Some(summary);

        // (e) throughput
        let optimizer =
            ThroughputOptimizer::new(dominant, &self.config.throughput, &self.config.elasticity);
        results.throughput = Some(optimizer.optimize_throughput());

        // (f) failover drill
        if !self.backups.is_empty() {
            let mut manager = FailoverManager::new(
                dominant.clone(),
                self.backups.clone(),
                self.config.quorum_size,
            );
            let outcome = manager.run_drill(
                &self.config.failover_request_id,
                dominant.name.as_bytes().to_vec(),
                self.registry.components(),
            );
            info!(outcome = %outcome, "failover drill finished");
            results.failover = Some(outcome);
        }

        Ok(results)
    }
}
