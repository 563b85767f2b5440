//! Dominant latency source analysis.
//!
//! For every component the analyzer computes:
//!
//! | Metric | Definition |
//! |---|---|
//! | `cumulative_latency` | own latency + latency of every ancestor up to the root |
//! | `downstream_throughput` | own throughput + throughput of every descendant |
//! | `latency_throughput_ratio` | `latency / downstream_throughput`, `+inf` when the denominator is 0 |
//!
//! The **dominant** component is the one with the highest ratio: a lot of
//! latency for little gated throughput. Ties go to the component that comes
//! first in registry order.

use serde::Serialize;
use tracing::{debug, info};

use crate::registry::ComponentRegistry;
use crate::types::CoreError;

/// Latency and throughput figures for one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyMetrics {
    /// Component name.
    pub name: String,
    /// Own latency, in ms.
    pub latency: f64,
    /// Own latency plus all ancestors' latency, in ms.
    pub cumulative_latency: f64,
    /// Own throughput plus all descendants' throughput, in Mbps.
    pub downstream_throughput: f64,
    /// `latency / downstream_throughput`, `f64::INFINITY` on zero throughput.
    /// JSON has no infinity, so serde_json writes that case as `null`.
    pub latency_throughput_ratio: f64,
}

/// Outcome of [`DominanceAnalyzer::identify_dominant_source`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominanceReport {
    /// Name of the dominant component.
    pub dominant: String,
    /// Metrics for every component, in registry order.
    pub metrics: Vec<LatencyMetrics>,
}

impl DominanceReport {
    /// Metrics for the named component.
    pub fn metrics_for(&self, name: &str) -> Option<&LatencyMetrics> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Metrics for the dominant component.
    pub fn dominant_metrics(&self) -> Option<&LatencyMetrics> {
        self.metrics_for(&self.dominant)
    }
}

/// Dominance ratio with the zero-throughput guard applied.
pub fn dominance_ratio(latency: f64, downstream_throughput: f64) -> f64 {
    if downstream_throughput > 0.0 {
        latency / downstream_throughput
    } else {
        f64::INFINITY
    }
}

/// Walks a [`ComponentRegistry`] to rank components by dominance.
///
/// Nothing is cached across calls; each public method recomputes from the
/// registry.
#[derive(Debug, Clone, Copy)]
pub struct DominanceAnalyzer<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> DominanceAnalyzer<'a> {
    /// Create an analyzer over a validated registry.
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Own latency plus the cumulative latency of the dependency.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownComponent`] if `name` is not registered.
    pub fn cumulative_latency(&self, name: &str) -> Result<f64, CoreError> {
        let pos = self.lookup(name)?;
        let mut cache = vec![None; self.registry.len()];
        Ok(self.cumulative_at(pos, &mut cache))
    }

    /// Own throughput plus the downstream throughput of every child.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownComponent`] if `name` is not registered.
    pub fn downstream_throughput(&self, name: &str) -> Result<f64, CoreError> {
        let pos = self.lookup(name)?;
        let mut cache = vec![None; self.registry.len()];
        Ok(self.downstream_at(pos, &mut cache))
    }

    /// Compute metrics for every component and name the dominant one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyRegistry`] when there is nothing to rank.
    pub fn identify_dominant_source(&self) -> Result<DominanceReport, CoreError> {
        let len = self.registry.len();
        let mut cumulative_cache = vec![None; len];
        let mut downstream_cache = vec![None; len];

        let mut metrics = Vec::with_capacity(len);
        let mut best: Option<(usize, f64)> = None;

        for pos in 0..len {
            let component = self.registry.component_at(pos);
            let downstream = self.downstream_at(pos, &mut downstream_cache);
            let ratio = dominance_ratio(component.latency_ms, downstream);

            // Strict comparison keeps the first maximum on ties.
            match best {
                Some((_, best_ratio)) if ratio <= best_ratio => {}
                _ => best = Some((pos, ratio)),
            }

            metrics.push(LatencyMetrics {
                name: component.name.clone(),
                latency: component.latency_ms,
                cumulative_latency: self.cumulative_at(pos, &mut cumulative_cache),
                downstream_throughput: downstream,
                latency_throughput_ratio: ratio,
            });
        }

        let (dominant_pos, dominant_ratio) = best.ok_or(CoreError::EmptyRegistry)?;
        let dominant = self.registry.component_at(dominant_pos).name.clone();

        info!(
            dominant = %dominant,
            ratio = dominant_ratio,
            components = len,
            "identified dominant latency source"
        );

        Ok(DominanceReport { dominant, metrics })
    }

    fn lookup(&self, name: &str) -> Result<usize, CoreError> {
        self.registry
            .position(name)
            .ok_or_else(|| CoreError::UnknownComponent(name.to_string()))
    }

    fn cumulative_at(&self, pos: usize, cache: &mut [Option<f64>]) -> f64 {
        if let Some(value) = cache[pos] {
            return value;
        }
        let own = self.registry.component_at(pos).latency_ms;
        let total = match self.registry.parent_of(pos) {
            None => own,
            Some(parent) => own + self.cumulative_at(parent, cache),
        };
        cache[pos] = Some(total);
        total
    }

    fn downstream_at(&self, pos: usize, cache: &mut [Option<f64>]) -> f64 {
        if let Some(value) = cache[pos] {
            return value;
        }
        let mut total = self.registry.component_at(pos).throughput_mbps;
        for &child in self.registry.children_of(pos) {
            total += self.downstream_at(child, cache);
        }
        cache[pos] = Some(total);
        debug!(
            component = %self.registry.component_at(pos).name,
            downstream_throughput = total,
            "computed downstream throughput"
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Component;

    fn chain() -> ComponentRegistry {
        ComponentRegistry::new(vec![
            Component::new("AuthCore", 47.0, 2.4, 21.0, 520.0, 97.6, 165),
            Component::new("QueueRelay", 63.0, 3.1, 27.0, 430.0, 96.8, 118)
                .with_dependency("AuthCore"),
            Component::new("EdgeOrchestrator", 58.0, 4.6, 31.0, 610.0, 96.9, 190)
                .with_dependency("QueueRelay"),
            Component::new("WebGateway", 52.0, 3.7, 38.0, 690.0, 94.7, 215)
                .with_dependency("EdgeOrchestrator"),
            Component::new("CloudInference", 74.0, 9.3, 44.0, 1150.0, 92.4, 275)
                .with_dependency("WebGateway"),
        ])
        .expect("valid chain")
    }

    #[test]
    fn test_cumulative_latency_along_chain() {
        let registry = chain();
        let analyzer = DominanceAnalyzer::new(&registry);

        assert_eq!(analyzer.cumulative_latency("AuthCore").expect("known"), 21.0);
        assert_eq!(analyzer.cumulative_latency("QueueRelay").expect("known"), 48.0);
        assert_eq!(
            analyzer.cumulative_latency("CloudInference").expect("known"),
            161.0
        );
    }

    #[test]
    fn test_downstream_throughput_along_chain() {
        let registry = chain();
        let analyzer = DominanceAnalyzer::new(&registry);

        assert_eq!(
            analyzer.downstream_throughput("CloudInference").expect("known"),
            1150.0
        );
        assert_eq!(
            analyzer.downstream_throughput("WebGateway").expect("known"),
            1840.0
        );
        assert_eq!(
            analyzer.downstream_throughput("AuthCore").expect("known"),
            3400.0
        );
    }

    #[test]
    fn test_downstream_throughput_sums_siblings() {
        let registry = ComponentRegistry::new(vec![
            Component::new("root", 0.0, 1.0, 5.0, 10.0, 99.0, 1),
            Component::new("left", 0.0, 1.0, 5.0, 20.0, 99.0, 1).with_dependency("root"),
            Component::new("right", 0.0, 1.0, 5.0, 30.0, 99.0, 1).with_dependency("root"),
        ])
        .expect("valid");
        let analyzer = DominanceAnalyzer::new(&registry);
        assert_eq!(analyzer.downstream_throughput("root").expect("known"), 60.0);
    }

    #[test]
    fn test_dominant_is_max_ratio() {
        let registry = chain();
        let report = DominanceAnalyzer::new(&registry)
            .identify_dominant_source()
            .expect("non-empty");

        assert_eq!(report.dominant, "CloudInference");
        let m = report.dominant_metrics().expect("present");
        assert_eq!(m.latency_throughput_ratio, 44.0 / 1150.0);
        assert_eq!(report.metrics.len(), 5);
        assert_eq!(report.metrics[0].name, "AuthCore");
    }

    #[test]
    fn test_zero_throughput_is_infinite_ratio() {
        let registry = ComponentRegistry::new(vec![
            Component::new("busy", 0.0, 1.0, 100.0, 500.0, 99.0, 1),
            Component::new("stalled", 0.0, 1.0, 1.0, 0.0, 99.0, 1),
        ])
        .expect("valid");
        let report = DominanceAnalyzer::new(&registry)
            .identify_dominant_source()
            .expect("non-empty");

        assert_eq!(report.dominant, "stalled");
        let m = report.metrics_for("stalled").expect("present");
        assert!(m.latency_throughput_ratio.is_infinite());
    }

    #[test]
    fn test_tie_goes_to_first_in_registry_order() {
        let registry = ComponentRegistry::new(vec![
            Component::new("first", 0.0, 1.0, 10.0, 100.0, 99.0, 1),
            Component::new("second", 0.0, 1.0, 20.0, 200.0, 99.0, 1),
        ])
        .expect("valid");
        let report = DominanceAnalyzer::new(&registry)
            .identify_dominant_source()
            .expect("non-empty");
        assert_eq!(report.dominant, "first");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ComponentRegistry::new(Vec::new()).expect("empty is valid");
        let err = DominanceAnalyzer::new(&registry)
            .identify_dominant_source()
            .expect_err("nothing to rank");
        assert!(matches!(err, CoreError::EmptyRegistry));
    }

    #[test]
    fn test_unknown_component() {
        let registry = chain();
        let analyzer = DominanceAnalyzer::new(&registry);
        assert!(matches!(
            analyzer.cumulative_latency("Nope"),
            Err(CoreError::UnknownComponent(_))
        ));
    }
}
