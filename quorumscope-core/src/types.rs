//! Core types for pipeline analysis.
//!
//! - [`Component`]: a pipeline stage with its static resource metrics
//! - [`FaultType`]: informational fault categories attached to a component
//! - [`ComponentStatus`]: health state used by the failover drill
//! - [`CoreError`]: configuration errors raised while building a registry

use serde::{Deserialize, Serialize};

/// Fault categories observed on a component.
///
/// Purely informational: no formula in the analysis consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    /// Requests retried by clients.
    Retry,
    /// Clock or configuration drift.
    Drift,
    /// Queue backpressure pushed upstream.
    Backpressure,
    /// Network partition isolating nodes.
    NodePartition,
    /// Nodes busy without making progress.
    Livelock,
    /// Process crash.
    Crash,
    /// Request timeout.
    Timeout,
    /// Duplicate delivery of an earlier request.
    Replay,
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FaultType::Retry => "Retry",
            FaultType::Drift => "Drift",
            FaultType::Backpressure => "Backpressure",
            FaultType::NodePartition => "NodePartition",
            FaultType::Livelock => "Livelock",
            FaultType::Crash => "Crash",
            FaultType::Timeout => "Timeout",
            FaultType::Replay => "Replay",
        };
        f.write_str(label)
    }
}

/// Health of a component as seen by the failover drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentStatus {
    /// Serving normally.
    #[default]
    Healthy,
    /// Serving with reduced capacity. Still counts toward quorum availability.
    Degraded,
    /// Not serving.
    Failed,
    /// Coming back after a failure.
    Recovering,
}

impl ComponentStatus {
    /// Whether a backup in this state can take part in a quorum.
    pub fn is_available(self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// A pipeline stage and its static metrics.
///
/// Components are built once by the caller and stay immutable for the whole
/// analysis run. The registry keeps them as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique name of the stage.
    pub name: String,
    /// CPU utilisation, in percent.
    pub cpu_percent: f64,
    /// Resident memory, in GB.
    pub memory_gb: f64,
    /// Mean latency contributed by this stage alone, in milliseconds.
    pub latency_ms: f64,
    /// Throughput of this stage alone, in Mbps.
    pub throughput_mbps: f64,
    /// Observed reliability, in percent.
    pub reliability_percent: f64,
    /// Request arrival rate.
    pub requests_per_sec: u64,
    /// The single upstream stage this one depends on, `None` for a root.
    #[serde(default)]
    pub dependency: Option<String>,
    /// Faults observed on this stage.
    #[serde(default)]
    pub fault_events: Vec<FaultType>,
}

impl Component {
    /// Create a root component with no recorded faults.
    pub fn new(
        name: impl Into<String>,
        cpu_percent: f64,
        memory_gb: f64,
        latency_ms: f64,
        throughput_mbps: f64,
        reliability_percent: f64,
        requests_per_sec: u64,
    ) -> Self {
        Self {
            name: name.into(),
            cpu_percent,
            memory_gb,
            latency_ms,
            throughput_mbps,
            reliability_percent,
            requests_per_sec,
            dependency: None,
            fault_events: Vec::new(),
        }
    }

    /// Declare the upstream stage this component depends on.
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// Attach observed fault categories.
    pub fn with_faults(mut self, faults: impl IntoIterator<Item = FaultType>) -> Self {
        self.fault_events = faults.into_iter().collect();
        self
    }

    /// Whether this component has no upstream dependency.
    pub fn is_root(&self) -> bool {
        self.dependency.is_none()
    }

    /// Named numeric metrics, in declaration order. Used for validation.
    pub(crate) fn numeric_metrics(&self) -> [(&'static str, f64); 6] {
        [
            ("cpu_percent", self.cpu_percent),
            ("memory_gb", self.memory_gb),
            ("latency_ms", self.latency_ms),
            ("throughput_mbps", self.throughput_mbps),
            ("reliability_percent", self.reliability_percent),
            ("requests_per_sec", self.requests_per_sec as f64),
        ]
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}(L={}ms, T={}Mbps)",
            self.name, self.latency_ms, self.throughput_mbps
        )
    }
}

/// Errors raised while building or querying a component registry.
///
/// All of these are configuration errors: the run cannot proceed and the
/// caller has to fix its input.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The dependency declarations contain a cycle.
    ///
    /// Without this check the recursive latency walk would never terminate.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Names along the cycle, starting and ending on the same component.
        cycle: Vec<String>,
    },

    /// Two components share the same name.
    #[error("duplicate component: {0}")]
    DuplicateComponent(String),

    /// A component depends on a name that is not registered.
    #[error("component {component} depends on unknown component {dependency}")]
    UnknownDependency {
        /// The declaring component.
        component: String,
        /// The missing dependency name.
        dependency: String,
    },

    /// A metric is negative, NaN or infinite.
    #[error("component {component} has invalid {metric}: {value}")]
    InvalidMetric {
        /// The offending component.
        component: String,
        /// Metric field name.
        metric: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A lookup named a component that is not registered.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// Dominance was requested on a registry with no components.
    #[error("registry has no components")]
    EmptyRegistry,
}
