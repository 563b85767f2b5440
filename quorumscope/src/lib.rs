//! # Quorumscope
//!
//! Latency dominance, quorum agreement and contention analysis for a chain
//! of dependent service components.
//!
//! Given the pipeline's components, a run:
//!
//! 1. names the component whose latency dominates the throughput it gates,
//! 2. pushes a probe decision about it through a counted-quorum agreement
//!    simulation,
//! 3. estimates its contention and checks the feasibility invariants,
//! 4. derives the contention level where the latency penalty is stationary,
//! 5. searches for the throughput-maximizing contention under a memory
//!    ceiling,
//! 6. optionally drills a safety-gated failover onto backups,
//!
//! and then validates that the chain of stage results is intact.
//!
//! ## Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              quorumscope (this crate)                       │
//! │   contention • elasticity • throughput • failover           │
//! │   pipeline orchestrator • text report • CLI                 │
//! ├──────────────────────────┬──────────────────────────────────┤
//! │  quorumscope-agreement   │       quorumscope-core           │
//! │  • prepare/promise/      │       • Component, FaultType     │
//! │    accept/learn          │       • ComponentRegistry        │
//! │  • ProposalStore         │       • DominanceAnalyzer        │
//! └──────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use quorumscope::{AnalysisConfig, AnalysisReport, Pipeline, sample};
//!
//! let results = Pipeline::new(sample::telecom_chain(), AnalysisConfig::default())?
//!     .run()?;
//! assert_eq!(results.dominant_component.as_deref(), Some("CloudInference"));
//! assert!(results.validate_assumption_chain().is_ok());
//! println!("{}", AnalysisReport::new(&results));
//! # Ok::<(), quorumscope::AnalysisError>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod contention;
pub mod elasticity;
pub mod error;
pub mod failover;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod throughput;

pub use quorumscope_agreement::{AgreementSimulator, QuorumPolicy, Timestamp};
pub use quorumscope_core::{
    Component, ComponentRegistry, ComponentStatus, CoreError, DominanceAnalyzer, FaultType,
    LatencyMetrics,
};

pub use config::{AnalysisConfig, AnalysisInput, ElasticityConfig, ThroughputConfig};
pub use contention::{ContentionModel, InvariantCheck};
pub use elasticity::{ElasticityOptimizer, TradeoffPoint};
pub use error::{AnalysisError, ConfigError};
pub use failover::{AssumptionValidator, FailoverManager, FailoverOutcome};
pub use pipeline::{validate_assumption_chain, AnalysisResults, ChainBreak, Pipeline};
pub use report::AnalysisReport;
pub use throughput::{ThroughputOptimization, ThroughputOptimizer};
