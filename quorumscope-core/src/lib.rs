//! # Quorumscope Core: Components and Latency Dominance
//!
//! This crate holds the leaf layer of quorumscope: the pipeline stages being
//! analysed ([`Component`]), the validated registry that owns them, and the
//! dominance analysis that names the stage whose latency weighs most on the
//! throughput it gates.
//!
//! ## Dependency Forest
//!
//! Every component declares at most one upstream dependency. Read in the
//! other direction, the declarations form a forest: roots have no
//! dependency, and each component's children are the components that
//! declare it as their dependency.
//!
//! ```text
//!   AuthCore            (root, cumulative = 21)
//!      │
//!   QueueRelay          (cumulative = 21 + 27)
//!      │
//!   EdgeOrchestrator    (cumulative = 21 + 27 + 31)
//!      │
//!   ...
//! ```
//!
//! Latency accumulates downward (a component pays for every ancestor) while
//! throughput accumulates upward (a component gates every descendant).
//!
//! ## Crate Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | `Component`, `FaultType`, `ComponentStatus`, `CoreError` |
//! | [`registry`] | `ComponentRegistry`: validated, ordered, acyclic |
//! | [`dominance`] | `DominanceAnalyzer`: cumulative latency, downstream throughput, ratio ranking |

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod dominance;
pub mod registry;
pub mod types;

pub use dominance::{DominanceAnalyzer, DominanceReport, LatencyMetrics};
pub use registry::ComponentRegistry;
pub use types::{Component, ComponentStatus, CoreError, FaultType};
