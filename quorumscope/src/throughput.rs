//! Memory-bounded throughput search.
//!
//! Queued requests hold memory while they wait, and they wait longer under
//! contention. Under worst-case scheduling:
//!
//! ```text
//! memory(C) = base_memory + request_size_gb * C * L_eff(C) / 1000
//! ceiling   = base_memory * (1 + divergence_limit)
//! ```
//!
//! The search samples `C = 0.1, 0.2, ..., 9.9`, drops every sample above the
//! ceiling, and scores the rest with
//! `base_throughput * ceiling / memory(C)`. The best score wins; an earlier
//! sample keeps its place on ties.

use quorumscope_core::Component;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ElasticityConfig, ThroughputConfig};
use crate::elasticity::ElasticityOptimizer;

/// Number of contention samples in the search grid.
pub const GRID_SAMPLES: u32 = 99;

/// Spacing between contention samples.
pub const GRID_STEP: f64 = 0.1;

/// Outcome of [`ThroughputOptimizer::optimize_throughput`].
///
/// When no sample fits under the memory ceiling the search degenerates to
/// `optimal_contention == 0` and `optimized_throughput == 0`. That is a
/// normal result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThroughputOptimization {
    /// Contention level with the best score, `0` if none fit.
    pub optimal_contention: f64,
    /// Best score, in Mbps, `0` if none fit.
    pub optimized_throughput: f64,
    /// The component's own throughput, in Mbps.
    pub current_throughput: f64,
    /// `(optimized - current) / current * 100`, `0` when current is `0`.
    pub improvement_percent: f64,
    /// Memory at the chosen contention, in GB.
    pub memory_used: f64,
    /// Memory ceiling, in GB.
    pub memory_max: f64,
    /// Grid samples that fit under the ceiling.
    pub feasible_samples: u32,
}

impl ThroughputOptimization {
    /// Whether at least one grid sample fit under the memory ceiling.
    ///
    /// A zero-throughput component can be feasible with an optimized
    /// throughput of `0`.
    pub fn is_feasible(&self) -> bool {
        self.feasible_samples > 0
    }
}

/// Grid search over contention levels for one component.
#[derive(Debug, Clone)]
pub struct ThroughputOptimizer<'a> {
    component: &'a Component,
    request_size_gb: f64,
    divergence_limit: f64,
    elasticity: ElasticityOptimizer,
}

impl<'a> ThroughputOptimizer<'a> {
    /// Create an optimizer for `component`.
    pub fn new(
        component: &'a Component,
        throughput: &ThroughputConfig,
        elasticity: &ElasticityConfig,
    ) -> Self {
        Self {
            component,
            request_size_gb: throughput.request_size_gb,
            divergence_limit: throughput.divergence_limit,
            elasticity: ElasticityOptimizer::from_config(component.latency_ms, elasticity),
        }
    }

    /// Memory in GB with `contention` requests queued per quorum member.
    pub fn memory_divergence(&self, contention: f64) -> f64 {
        let effective_latency = self.elasticity.effective_latency(contention);
        let queued = (self.request_size_gb * contention * effective_latency) / 1000.0;
        self.component.memory_gb + queued
    }

    /// Hard memory ceiling in GB.
    pub fn max_memory_allowed(&self) -> f64 {
        self.component.memory_gb * (1.0 + self.divergence_limit)
    }

    /// Search the contention grid for the best throughput under the ceiling.
    pub fn optimize_throughput(&self) -> ThroughputOptimization {
        let max_memory = self.max_memory_allowed();
        let mut best: Option<(f64, f64)> = None;
        let mut feasible_samples = 0u32;

        for contention in (1..=GRID_SAMPLES).map(|i| f64::from(i) * GRID_STEP) {
            let memory = self.memory_divergence(contention);
            if memory > max_memory {
                continue;
            }
            feasible_samples += 1;

            let throughput = self.component.throughput_mbps * (max_memory / memory);
            match best {
                Some((_, best_throughput)) if throughput <= best_throughput => {}
                _ => best = Some((contention, throughput)),
            }
        }
        let (best_contention, best_throughput) = best.unwrap_or((0.0, 0.0));

        debug!(
            component = %self.component.name,
            samples = GRID_SAMPLES,
            feasible_samples,
            rejected = GRID_SAMPLES - feasible_samples,
            max_memory,
            "throughput grid search complete"
        );

        let current = self.component.throughput_mbps;
        let improvement_percent = if current > 0.0 {
            (best_throughput - current) / current * 100.0
        } else {
            0.0
        };

        let result = ThroughputOptimization {
            optimal_contention: best_contention,
            optimized_throughput: best_throughput,
            current_throughput: current,
            improvement_percent,
            memory_used: self.memory_divergence(best_contention),
            memory_max: max_memory,
            feasible_samples,
        };

        info!(
            component = %self.component.name,
            optimal_contention = result.optimal_contention,
            optimized_throughput = result.optimized_throughput,
            feasible = result.is_feasible(),
            "optimized throughput under memory bound"
        );
        result
    }

    /// The elasticity model used for `L_eff`.
    pub fn elasticity(&self) -> &ElasticityOptimizer {
        &self.elasticity
    }
}
