//! Proposal store trait and in-memory implementation.
//!
//! The [`ProposalStore`] trait abstracts the two maps the simulator keeps:
//!
//! - **proposals**: the live record per request id, replaced by every
//!   `prepare` and mutated by `promise`/`accept`. Never deleted.
//! - **accepted**: snapshots taken when a proposal reached its quorum.
//!
//! [`InMemoryProposalStore`] is the only implementation; all state is lost
//! when it is dropped.

use std::collections::BTreeMap;

use crate::types::Proposal;

/// Storage for proposal records and accepted snapshots.
///
/// Mutating methods take `&mut self`, so a store cannot be driven from two
/// callers at once without an outer lock.
pub trait ProposalStore {
    /// Load the live proposal for a request.
    fn load_proposal(&self, request_id: &str) -> Option<&Proposal>;

    /// Mutable access to the live proposal for a request.
    fn proposal_mut(&mut self, request_id: &str) -> Option<&mut Proposal>;

    /// Insert or replace the live proposal for a request.
    fn store_proposal(&mut self, request_id: &str, proposal: Proposal);

    /// Load the accepted snapshot for a request.
    fn load_accepted(&self, request_id: &str) -> Option<&Proposal>;

    /// Record an accepted snapshot, replacing any earlier one.
    fn store_accepted(&mut self, request_id: &str, snapshot: Proposal);

    /// Number of live proposals.
    fn proposal_count(&self) -> usize;

    /// Number of accepted snapshots.
    fn accepted_count(&self) -> usize;
}

/// In-memory implementation of [`ProposalStore`].
///
/// Uses `BTreeMap`s so iteration (and therefore debug output) is ordered by
/// request id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProposalStore {
    proposals: BTreeMap<String, Proposal>,
    accepted: BTreeMap<String, Proposal>,
}

impl InMemoryProposalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProposalStore for InMemoryProposalStore {
    fn load_proposal(&self, request_id: &str) -> Option<&Proposal> {
        self.proposals.get(request_id)
    }

    fn proposal_mut(&mut self, request_id: &str) -> Option<&mut Proposal> {
        self.proposals.get_mut(request_id)
    }

    fn store_proposal(&mut self, request_id: &str, proposal: Proposal) {
        self.proposals.insert(request_id.to_string(), proposal);
    }

    fn load_accepted(&self, request_id: &str) -> Option<&Proposal> {
        self.accepted.get(request_id)
    }

    fn store_accepted(&mut self, request_id: &str, snapshot: Proposal) {
        self.accepted.insert(request_id.to_string(), snapshot);
    }

    fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    #[test]
    fn test_initial_state() {
        let store = InMemoryProposalStore::new();
        assert!(store.load_proposal("req").is_none());
        assert!(store.load_accepted("req").is_none());
        assert_eq!(store.proposal_count(), 0);
        assert_eq!(store.accepted_count(), 0);
    }

    #[test]
    fn test_store_proposal_overwrites() {
        let mut store = InMemoryProposalStore::new();
        store.store_proposal("req", Proposal::new(Timestamp::new(1), b"first".to_vec()));
        store.store_proposal("req", Proposal::new(Timestamp::new(2), b"second".to_vec()));

        let loaded = store.load_proposal("req").expect("should exist");
        assert_eq!(loaded.timestamp, Timestamp::new(2));
        assert_eq!(loaded.data, b"second");
        assert_eq!(store.proposal_count(), 1);
    }

    #[test]
    fn test_accepted_is_independent_copy() {
        let mut store = InMemoryProposalStore::new();
        let proposal = Proposal::new(Timestamp::new(1), b"value".to_vec());
        store.store_proposal("req", proposal.clone());
        store.store_accepted("req", proposal);

        store.proposal_mut("req").expect("exists").promises = 9;

        assert_eq!(store.load_accepted("req").expect("accepted").promises, 0);
    }
}
