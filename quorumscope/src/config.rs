//! Configuration for an analysis run.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration and reproduces the built-in sample analysis.

use std::path::Path;

use quorumscope_core::Component;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main configuration for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Promises required by the agreement simulator, also the contention
    /// normalizing divisor.
    pub quorum_size: usize,

    /// Fraction of the quorum currently reachable, in `[0, 1]`.
    pub quorum_available: f64,

    /// Latency-dominance flag handed to the invariant check.
    pub assume_latency_dominance: bool,

    /// Contention penalty model.
    pub elasticity: ElasticityConfig,

    /// Memory-bounded throughput search.
    pub throughput: ThroughputConfig,

    /// Test proposal pushed through the agreement simulator.
    pub probe: ProbeConfig,

    /// Request id used by the failover drill.
    pub failover_request_id: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            quorum_size: 2,
            quorum_available: 0.95,
            assume_latency_dominance: true,
            elasticity: ElasticityConfig::default(),
            throughput: ThroughputConfig::default(),
            probe: ProbeConfig::default(),
            failover_request_id: "failover-001".to_string(),
        }
    }
}

/// Parameters of `L_eff = L_base * (1 + alpha * C^beta)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticityConfig {
    /// Contention coefficient: scales the penalty linearly.
    pub alpha: f64,
    /// Non-linearity exponent: `beta > 1` gives a convex penalty with an
    /// interior optimum, `beta <= 1` gives none.
    pub beta: f64,
}

impl Default for ElasticityConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 1.5,
        }
    }
}

/// Parameters of the memory-bounded throughput search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThroughputConfig {
    /// Memory held per queued request, in GB.
    pub request_size_gb: f64,
    /// Allowed memory growth over the base, as a fraction. A negative value
    /// puts the ceiling below the base memory.
    pub divergence_limit: f64,
}

impl Default for ThroughputConfig {
    fn default() -> Self {
        Self {
            request_size_gb: 0.05,
            divergence_limit: 0.15,
        }
    }
}

/// The proposal pushed through the agreement simulator during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Request id of the probe proposal.
    pub request_id: String,
    /// Payload, serialized to JSON bytes before it is proposed.
    pub payload: serde_json::Value,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            request_id: "req_001".to_string(),
            payload: serde_json::json!({ "payload": "test" }),
        }
    }
}

impl AnalysisConfig {
    /// Check ranges before a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum_size == 0 {
            return Err(ConfigError::ZeroQuorum);
        }

        let finite = [
            ("quorum_available", self.quorum_available),
            ("elasticity.alpha", self.elasticity.alpha),
            ("elasticity.beta", self.elasticity.beta),
            ("throughput.request_size_gb", self.throughput.request_size_gb),
            ("throughput.divergence_limit", self.throughput.divergence_limit),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.quorum_available) {
            return Err(ConfigError::OutOfRange {
                field: "quorum_available",
                value: self.quorum_available,
                expected: "between 0 and 1",
            });
        }
        if self.elasticity.alpha <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "elasticity.alpha",
                value: self.elasticity.alpha,
                expected: "greater than 0",
            });
        }
        if self.throughput.request_size_gb < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "throughput.request_size_gb",
                value: self.throughput.request_size_gb,
                expected: "at least 0",
            });
        }
        Ok(())
    }
}

/// Everything a run needs: the components and how to analyse them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    /// Pipeline stages, in the order used for tie-breaking.
    pub components: Vec<Component>,

    /// Standby replicas of the dominant component. When non-empty, the run
    /// ends with a failover drill.
    #[serde(default)]
    pub backups: Vec<Component>,

    /// Analysis settings.
    #[serde(default)]
    pub config: AnalysisConfig,
}

impl AnalysisInput {
    /// Parse an input document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an input file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_sample_analysis() {
        let config = AnalysisConfig::default();
        assert_eq!(config.quorum_size, 2);
        assert_eq!(config.quorum_available, 0.95);
        assert!(config.assume_latency_dominance);
        assert_eq!(config.elasticity.alpha, 0.2);
        assert_eq!(config.elasticity.beta, 1.5);
        assert_eq!(config.throughput.request_size_gb, 0.05);
        assert_eq!(config.throughput.divergence_limit, 0.15);
        assert_eq!(config.probe.request_id, "req_001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: AnalysisConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"quorum_size": 3, "elasticity": {"beta": 0.8}}"#)
                .expect("deserialize");
        assert_eq!(config.quorum_size, 3);
        assert_eq!(config.elasticity.beta, 0.8);
        assert_eq!(config.elasticity.alpha, 0.2);
    }

    #[test]
    fn test_validate_rejects_zero_quorum() {
        let config = AnalysisConfig {
            quorum_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroQuorum)));
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut config = AnalysisConfig::default();
        config.elasticity.beta = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "elasticity.beta",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_allows_negative_divergence() {
        let mut config = AnalysisConfig::default();
        config.throughput.divergence_limit = -0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_availability_above_one() {
        let config = AnalysisConfig {
            quorum_available: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "quorum_available",
                ..
            })
        ));
    }

    #[test]
    fn test_input_parsing() {
        let input = AnalysisInput::from_json_str(
            r#"{
                "components": [{
                    "name": "Solo",
                    "cpu_percent": 10.0,
                    "memory_gb": 1.0,
                    "latency_ms": 5.0,
                    "throughput_mbps": 100.0,
                    "reliability_percent": 99.0,
                    "requests_per_sec": 10
                }]
            }"#,
        )
        .expect("parse");
        assert_eq!(input.components.len(), 1);
        assert!(input.backups.is_empty());
        assert_eq!(input.config, AnalysisConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisInput::from_path("/definitely/not/here.json").expect_err("missing");
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
