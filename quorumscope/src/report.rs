//! Plain-text report of an analysis run.
//!
//! Formatting only: the report reads [`AnalysisResults`] and never changes
//! them. Stages that did not run are rendered as "not available".

use std::fmt;

use crate::pipeline::{AnalysisResults, ChainBreak};

const RULE_WIDTH: usize = 70;

/// Display adapter over [`AnalysisResults`].
pub struct AnalysisReport<'a> {
    results: &'a AnalysisResults,
}

impl<'a> AnalysisReport<'a> {
    /// Wrap results for display.
    pub fn new(results: &'a AnalysisResults) -> Self {
        Self { results }
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

fn not_available(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  not available")
}

impl fmt::Display for AnalysisReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.results;

        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "PIPELINE LATENCY AND CONTENTION ANALYSIS")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        section(f, "[A] Dominant Latency Analysis")?;
        match (r.dominant_component.as_deref(), r.dominant_metrics()) {
            (Some(name), Some(m)) => {
                writeln!(f, "Dominant Component: {name}")?;
                writeln!(f, "  Latency: {}ms", m.latency)?;
                writeln!(f, "  Cumulative Latency: {}ms", m.cumulative_latency)?;
                writeln!(
                    f,
                    "  Downstream Throughput Impact: {:.1} Mbps",
                    m.downstream_throughput
                )?;
                writeln!(f, "  Ratio: {:.5}", m.latency_throughput_ratio)?;
            }
            _ => not_available(f)?,
        }

        section(f, "[B] Quorum Agreement")?;
        match (&r.agreement, &r.probe) {
            (Some(agreement), Some(probe)) => {
                writeln!(f, "Agreement Target: {}", agreement.target())?;
                writeln!(f, "Quorum Size: {}", agreement.quorum_size())?;
                writeln!(
                    f,
                    "Test Agreement Result ({}): {}",
                    probe.request_id,
                    if probe.accepted { "SUCCESS" } else { "FAILED" }
                )?;
            }
            _ => not_available(f)?,
        }

        section(f, "[C] Contention Model")?;
        match r.contention {
            Some(contention) => {
                writeln!(f, "Contention Level: {contention:.3} concurrent requests")?;
                if let Some(check) = r.invariants {
                    writeln!(f, "Invariants Valid: {}", check.holds())?;
                    writeln!(f, "  Latency Dominant: {}", check.latency_dominant)?;
                    writeln!(f, "  Reliability >= 94.7%: {}", check.reliability_ok)?;
                    writeln!(f, "  Quorum Available >= 2/3: {}", check.quorum_ok)?;
                }
                if let Some(feasible) = r.model_feasible {
                    writeln!(f, "Model Feasible: {feasible}")?;
                }
            }
            None => not_available(f)?,
        }

        section(f, "[D] Latency Elasticity Trade-offs")?;
        match &r.elasticity {
            Some(e) => {
                writeln!(f, "Base Latency: {}ms", e.base_latency)?;
                writeln!(f, "Theoretical Optimal Contention: {:.2}", e.optimal_contention)?;
                writeln!(
                    f,
                    "Effective Latency at Optimal: {:.2}ms",
                    e.effective_latency_at_optimum
                )?;
                for point in &e.tradeoffs {
                    writeln!(
                        f,
                        "  C={:<6.2} L_eff={:>9.2}ms  relative throughput={:.3}  x{:.3}",
                        point.contention,
                        point.effective_latency,
                        point.relative_throughput,
                        point.latency_increase_factor
                    )?;
                }
            }
            None => not_available(f)?,
        }

        section(f, "[E] Throughput Optimization (Memory Bounded)")?;
        match &r.throughput {
            Some(t) => {
                writeln!(f, "Current Throughput: {:.1} Mbps", t.current_throughput)?;
                writeln!(f, "Optimized Throughput: {:.1} Mbps", t.optimized_throughput)?;
                writeln!(f, "Improvement: {:.2}%", t.improvement_percent)?;
                writeln!(f, "Optimal Contention: {:.2}", t.optimal_contention)?;
                writeln!(
                    f,
                    "Memory Usage: {:.3} GB / {:.3} GB",
                    t.memory_used, t.memory_max
                )?;
                if !t.is_feasible() {
                    writeln!(f, "No contention level fits under the memory ceiling")?;
                }
            }
            None => not_available(f)?,
        }

        if let Some(outcome) = &r.failover {
            section(f, "[F] Failover Drill")?;
            writeln!(f, "Outcome: {outcome}")?;
        }

        section(f, "[G] Assumption Chain Validation")?;
        match r.validate_assumption_chain() {
            Ok(()) => {
                writeln!(f, "✓ Assumption chain validated")?;
                writeln!(f, "✓ Each result depends on the preceding stages")?;
            }
            Err(reason) => write_break(f, &reason)?,
        }

        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))
    }
}

fn write_break(f: &mut fmt::Formatter<'_>, reason: &ChainBreak) -> fmt::Result {
    let stage = match reason {
        ChainBreak::MissingDominance => "A",
        ChainBreak::AgreementTargetMismatch { .. } => "B",
        ChainBreak::MissingContention => "C",
    };
    writeln!(f, "✗ INVALID at stage [{stage}]: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::Pipeline;
    use crate::sample;

    #[test]
    fn test_report_renders_every_stage() {
        let results = Pipeline::new(sample::telecom_chain(), AnalysisConfig::default())
            .expect("valid")
            .run()
            .expect("run");
        let text = AnalysisReport::new(&results).to_string();

        assert!(text.contains("Dominant Component: CloudInference"));
        assert!(text.contains("Test Agreement Result (req_001): SUCCESS"));
        assert!(text.contains("Contention Level: 6.050 concurrent requests"));
        assert!(text.contains("Model Feasible: false"));
        assert!(text.contains("Theoretical Optimal Contention: 6.08"));
        assert!(text.contains("✓ Assumption chain validated"));
        assert!(!text.contains("[F] Failover Drill"));
    }

    #[test]
    fn test_report_on_empty_results_does_not_fail() {
        let results = AnalysisResults::default();
        let text = AnalysisReport::new(&results).to_string();

        assert!(text.contains("not available"));
        assert!(text.contains("INVALID at stage [A]"));
    }
}
