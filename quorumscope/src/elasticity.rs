//! Latency elasticity under contention.
//!
//! Contention inflates latency non-linearly:
//!
//! ```text
//! L_eff(C) = L_base * (1 + alpha * C^beta)
//! ```
//!
//! For `beta > 1` the marginal-cost argument gives the stationary point
//! `C* = (beta / (alpha * (beta - 1)))^(1/beta)`. For `beta <= 1` there is no
//! finite interior optimum and the boundary value `0` is used instead.

use serde::Serialize;

use crate::config::ElasticityConfig;

/// One row of [`ElasticityOptimizer::analyze_tradeoffs`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeoffPoint {
    /// Contention level this row was evaluated at.
    pub contention: f64,
    /// `L_eff` at this contention, in ms.
    pub effective_latency: f64,
    /// `L_base / L_eff`: throughput relative to the uncontended case,
    /// assuming throughput scales inversely with latency.
    pub relative_throughput: f64,
    /// `L_eff / L_base`.
    pub latency_increase_factor: f64,
}

/// Closed-form contention penalty model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticityOptimizer {
    base_latency: f64,
    alpha: f64,
    beta: f64,
}

impl ElasticityOptimizer {
    /// Model with explicit coefficients.
    pub fn new(base_latency: f64, alpha: f64, beta: f64) -> Self {
        Self {
            base_latency,
            alpha,
            beta,
        }
    }

    /// Model with coefficients taken from configuration.
    pub fn from_config(base_latency: f64, config: &ElasticityConfig) -> Self {
        Self::new(base_latency, config.alpha, config.beta)
    }

    /// `L_base * (1 + alpha * C^beta)`.
    pub fn effective_latency(&self, contention: f64) -> f64 {
        self.base_latency * (1.0 + self.alpha * contention.powf(self.beta))
    }

    /// Stationary contention level, `0` when `beta <= 1`.
    pub fn optimal_contention(&self) -> f64 {
        if self.beta <= 1.0 {
            return 0.0;
        }
        (self.beta / (self.alpha * (self.beta - 1.0))).powf(1.0 / self.beta)
    }

    /// Evaluate the model at each contention level, in input order.
    pub fn analyze_tradeoffs(&self, contention_values: &[f64]) -> Vec<TradeoffPoint> {
        contention_values
            .iter()
            .map(|&contention| {
                let effective_latency = self.effective_latency(contention);
                TradeoffPoint {
                    contention,
                    effective_latency,
                    relative_throughput: self.base_latency / effective_latency,
                    latency_increase_factor: effective_latency / self.base_latency,
                }
            })
            .collect()
    }

    /// Uncontended latency, in ms.
    pub fn base_latency(&self) -> f64 {
        self.base_latency
    }

    /// Contention coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Non-linearity exponent.
    pub fn beta(&self) -> f64 {
        self.beta
    }
}
