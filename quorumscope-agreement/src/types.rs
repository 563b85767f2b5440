//! Core types for the agreement simulator.
//!
//! - [`Timestamp`]: per-simulator counter stamped on each prepared proposal
//! - [`Proposal`]: the per-request state mutated by promise/accept
//! - [`QuorumPolicy`]: how promises are counted toward the quorum

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Logical clock value stamped on a proposal by `prepare`.
///
/// Each simulator owns one counter and advances it on every `prepare`, so
/// a later proposal for the same request always carries a larger value. A
/// node passes the largest value it has promised to, and `promise` only
/// succeeds for a proposal stamped after it.
///
/// `Timestamp::ZERO` is what a node reports before its first promise; the
/// counter never hands it out.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Reported by a node that has not promised anything.
    pub const ZERO: Self = Self(0);

    /// Timestamp with the raw counter value `n`.
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// The value `prepare` stamps after `self`.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw counter value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ts({})", self.0)
    }
}

/// How `promise` calls count toward the quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuorumPolicy {
    /// Every granted promise increments the count, even a repeat from the
    /// same node. The node id is recorded but never used to deduplicate.
    #[default]
    CountEveryPromise,

    /// A node is counted at most once per proposal. A repeated promise from
    /// the same node is refused.
    DistinctVoters,
}

/// State of one request between `prepare` and `accept`.
///
/// An accepted snapshot is a clone of this record taken when the quorum was
/// reached; it is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Timestamp drawn by the `prepare` that created this proposal.
    pub timestamp: Timestamp,

    /// Opaque payload, kept as raw bytes so the simulator stays generic over
    /// the application's command type.
    pub data: Vec<u8>,

    /// Number of granted promises.
    pub promises: usize,

    /// Set equal to `promises` when the proposal is accepted.
    pub accepts: usize,

    /// Node ids whose promise was granted.
    pub voters: BTreeSet<String>,
}

impl Proposal {
    /// A fresh proposal with no promises yet.
    pub fn new(timestamp: Timestamp, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            data,
            promises: 0,
            accepts: 0,
            voters: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let t0 = Timestamp::ZERO;
        let t1 = Timestamp::new(1);

        assert!(t0 < t1);
        assert_eq!(t0.next(), t1);
        assert_eq!(t1.next().value(), 2);
        assert_eq!(Timestamp::new(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(Timestamp::new(42).to_string(), "ts(42)");
    }

    #[test]
    fn test_new_proposal_is_empty() {
        let p = Proposal::new(Timestamp::new(3), b"payload".to_vec());
        assert_eq!(p.promises, 0);
        assert_eq!(p.accepts, 0);
        assert!(p.voters.is_empty());
    }

    #[test]
    fn test_proposal_serde() {
        let mut p = Proposal::new(Timestamp::new(7), b"{\"payload\":\"test\"}".to_vec());
        p.promises = 2;
        p.voters.insert("node1".to_string());
        let json = serde_json::to_string(&p).expect("serialize");
        let decoded: Proposal = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(p, decoded);
    }

    #[test]
    fn test_default_policy_counts_every_promise() {
        assert_eq!(QuorumPolicy::default(), QuorumPolicy::CountEveryPromise);
    }
}
