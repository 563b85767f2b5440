//! # Quorumscope Agreement: Four-Phase Quorum Simulation
//!
//! This crate simulates committing a decision about the dominant pipeline
//! component through a prepare / promise / accept / learn exchange with a
//! counted quorum. Everything runs in-process: "nodes" are strings and
//! "messages" are method calls.
//!
//! ## Mapping to Paxos
//!
//! | Simulator | Paxos | Notes |
//! |---|---|---|
//! | `prepare` | Phase 1a | Draws the next [`Timestamp`] (ballot) |
//! | `promise` | Phase 1b | Granted when the proposal is newer than the node's last timestamp |
//! | `accept` | Phase 2a/2b | Succeeds once promises reach the quorum size |
//! | `learn` | Learner | Reads the accepted snapshot |
//!
//! ## Crate Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | `Timestamp`, `Proposal`, `QuorumPolicy` |
//! | [`storage`] | `ProposalStore` trait and `InMemoryProposalStore` |
//! | [`simulator`] | `AgreementSimulator`: the four phases |

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod simulator;
pub mod storage;
pub mod types;

pub use simulator::AgreementSimulator;
pub use storage::{InMemoryProposalStore, ProposalStore};
pub use types::{Proposal, QuorumPolicy, Timestamp};
