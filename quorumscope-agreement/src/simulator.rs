//! Four-phase quorum agreement simulator.
//!
//! One proposer per request id drives four phases against a counted quorum:
//!
//! ```text
//! prepare(id, data)          draw the next timestamp, (re)create the proposal
//!     │
//! promise(id, node, last)    grant if proposal.timestamp > last
//!     │                      (promises += 1)
//! accept(id)                 commit if promises >= quorum_size
//!     │                      (snapshot copied to the accepted set)
//! learn(id)                  read the accepted snapshot's data
//! ```
//!
//! ## What this is not
//!
//! There is no network, no competing proposer and no conflict resolution
//! between two `prepare` calls for the same id: the last `prepare` wins.
//! Under [`QuorumPolicy::CountEveryPromise`] the node id passed to `promise`
//! is not used to deduplicate voters, so one node can fill the quorum on its
//! own. That is the default; opt into
//! [`QuorumPolicy::DistinctVoters`] for one vote per node.
//!
//! ## Failure reporting
//!
//! Protocol-level failures (unknown request id, stale timestamp, quorum not
//! met) are local and non-fatal. They surface as `false` or `None` and the
//! caller is expected to branch on them.

use tracing::debug;

use crate::storage::{InMemoryProposalStore, ProposalStore};
use crate::types::{Proposal, QuorumPolicy, Timestamp};

/// Quorum agreement simulator targeted at one component.
///
/// The timestamp counter belongs to the simulator, so independent simulators
/// never interfere with each other.
#[derive(Debug, Clone)]
pub struct AgreementSimulator<S: ProposalStore = InMemoryProposalStore> {
    /// Component the decisions are about.
    target: String,
    /// Promises needed before `accept` succeeds.
    quorum_size: usize,
    /// Last timestamp issued by `prepare`.
    clock: Timestamp,
    policy: QuorumPolicy,
    store: S,
}

impl AgreementSimulator<InMemoryProposalStore> {
    /// Create a simulator with an in-memory store and the default policy.
    pub fn new(target: impl Into<String>, quorum_size: usize) -> Self {
        Self::with_store(target, quorum_size, InMemoryProposalStore::new())
    }
}

impl<S: ProposalStore> AgreementSimulator<S> {
    /// Create a simulator over the given store.
    pub fn with_store(target: impl Into<String>, quorum_size: usize, store: S) -> Self {
        Self {
            target: target.into(),
            quorum_size,
            clock: Timestamp::ZERO,
            policy: QuorumPolicy::default(),
            store,
        }
    }

    /// Switch the promise counting policy.
    pub fn with_policy(mut self, policy: QuorumPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Phase 1: create (or replace) the proposal for `request_id`.
    ///
    /// Always succeeds. Each call draws a fresh timestamp, so re-preparing an
    /// id discards its promise count.
    pub fn prepare(&mut self, request_id: &str, data: Vec<u8>) -> bool {
        self.clock = self.clock.next();
        let replaced = self.store.load_proposal(request_id).is_some();
        self.store
            .store_proposal(request_id, Proposal::new(self.clock, data));

        debug!(
            target_component = %self.target,
            request_id,
            timestamp = %self.clock,
            replaced,
            "prepared proposal"
        );
        true
    }

    /// Phase 2: record a promise from `node_id`.
    ///
    /// Granted only when the proposal's timestamp is strictly newer than
    /// `last_timestamp`. Returns `false` for an unknown request id.
    pub fn promise(&mut self, request_id: &str, node_id: &str, last_timestamp: Timestamp) -> bool {
        let quorum_size = self.quorum_size;
        let policy = self.policy;
        let Some(proposal) = self.store.proposal_mut(request_id) else {
            debug!(request_id, node_id, "promise for unknown request");
            return false;
        };

        if proposal.timestamp <= last_timestamp {
            debug!(
                request_id,
                node_id,
                timestamp = %proposal.timestamp,
                last_timestamp = %last_timestamp,
                "refusing promise: proposal is not newer"
            );
            return false;
        }

        let first_vote = proposal.voters.insert(node_id.to_string());
        if policy == QuorumPolicy::DistinctVoters && !first_vote {
            debug!(request_id, node_id, "refusing repeated promise");
            return false;
        }

        proposal.promises += 1;
        debug!(
            request_id,
            node_id,
            promises = proposal.promises,
            quorum_size,
            "granted promise"
        );
        true
    }

    /// Phase 3: accept the proposal once the quorum is reached.
    ///
    /// On success the accept count is set to the promise count and a
    /// snapshot is copied into the accepted set. Returns `false` for an
    /// unknown request id or when promises are below the quorum size; no
    /// accepted entry is created in either case.
    pub fn accept(&mut self, request_id: &str) -> bool {
        let quorum_size = self.quorum_size;
        let Some(proposal) = self.store.proposal_mut(request_id) else {
            debug!(request_id, "accept for unknown request");
            return false;
        };

        if proposal.promises < quorum_size {
            debug!(
                request_id,
                promises = proposal.promises,
                quorum_size,
                "quorum not reached"
            );
            return false;
        }

        proposal.accepts = proposal.promises;
        let snapshot = proposal.clone();
        self.store.store_accepted(request_id, snapshot);

        debug!(
            target_component = %self.target,
            request_id,
            quorum_size,
            "proposal accepted"
        );
        true
    }

    /// Phase 4: the data of the accepted snapshot, if the request was ever
    /// accepted.
    pub fn learn(&self, request_id: &str) -> Option<&[u8]> {
        self.store
            .load_accepted(request_id)
            .map(|snapshot| snapshot.data.as_slice())
    }

    /// Whether the agreement result can be trusted.
    ///
    /// Correctness of the scheme is contingent on latency dominance, which
    /// the simulator does not check itself: the caller's flag is returned
    /// unchanged.
    pub fn is_consensus_valid(&self, latency_dominance_holds: bool) -> bool {
        latency_dominance_holds
    }

    /// Component the simulated decisions are about.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Promises required for `accept`.
    pub fn quorum_size(&self) -> usize {
        self.quorum_size
    }

    /// Promise counting policy in effect.
    pub fn policy(&self) -> QuorumPolicy {
        self.policy
    }

    /// Last timestamp issued, `Timestamp::ZERO` before the first `prepare`.
    pub fn current_timestamp(&self) -> Timestamp {
        self.clock
    }

    /// The live proposal for a request.
    pub fn proposal(&self, request_id: &str) -> Option<&Proposal> {
        self.store.load_proposal(request_id)
    }

    /// The accepted snapshot for a request.
    pub fn accepted(&self, request_id: &str) -> Option<&Proposal> {
        self.store.load_accepted(request_id)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_simulator() -> AgreementSimulator {
        AgreementSimulator::new("CloudInference", 2)
    }

    // =========================================================================
    // prepare
    // =========================================================================

    #[test]
    fn test_prepare_creates_proposal() {
        let mut sim = make_simulator();
        assert!(sim.prepare("req_001", b"payload".to_vec()));

        let p = sim.proposal("req_001").expect("created");
        assert_eq!(p.timestamp, Timestamp::new(1));
        assert_eq!(p.promises, 0);
        assert_eq!(sim.current_timestamp(), Timestamp::new(1));
    }

    #[test]
    fn test_reprepare_replaces_and_advances_clock() {
        let mut sim = make_simulator();
        sim.prepare("req", b"first".to_vec());
        sim.promise("req", "node1", Timestamp::ZERO);
        let first_ts = sim.current_timestamp();

        sim.prepare("req", b"second".to_vec());

        assert!(sim.current_timestamp() > first_ts);
        let p = sim.proposal("req").expect("present");
        assert_eq!(p.data, b"second");
        assert_eq!(p.promises, 0, "re-prepare discards promises");
        assert_eq!(sim.store().proposal_count(), 1);
    }

    #[test]
    fn test_clock_is_global_across_requests() {
        let mut sim = make_simulator();
        sim.prepare("a", Vec::new());
        sim.prepare("b", Vec::new());

        assert_eq!(sim.proposal("a").expect("a").timestamp, Timestamp::new(1));
        assert_eq!(sim.proposal("b").expect("b").timestamp, Timestamp::new(2));
    }

    #[test]
    fn test_simulators_do_not_share_clock() {
        let mut one = make_simulator();
        let mut two = make_simulator();
        one.prepare("x", Vec::new());
        one.prepare("y", Vec::new());
        two.prepare("x", Vec::new());

        assert_eq!(two.current_timestamp(), Timestamp::new(1));
    }

    // =========================================================================
    // promise
    // =========================================================================

    #[test]
    fn test_promise_unknown_request() {
        let mut sim = make_simulator();
        assert!(!sim.promise("missing", "node1", Timestamp::ZERO));
    }

    #[test]
    fn test_promise_requires_newer_timestamp() {
        let mut sim = make_simulator();
        sim.prepare("req", Vec::new()); // ts(1)

        assert!(!sim.promise("req", "node1", Timestamp::new(1)));
        assert!(!sim.promise("req", "node1", Timestamp::new(5)));
        assert!(sim.promise("req", "node1", Timestamp::ZERO));
        assert_eq!(sim.proposal("req").expect("present").promises, 1);
    }

    #[test]
    fn test_same_node_counts_twice_by_default() {
        let mut sim = make_simulator();
        assert_eq!(sim.policy(), QuorumPolicy::CountEveryPromise);
        sim.prepare("req", Vec::new());

        assert!(sim.promise("req", "node1", Timestamp::ZERO));
        assert!(sim.promise("req", "node1", Timestamp::ZERO));
        assert_eq!(sim.proposal("req").expect("present").promises, 2);
        assert!(sim.accept("req"), "one node filled the quorum on its own");
    }

    #[test]
    fn test_distinct_voters_policy_refuses_repeat() {
        let mut sim = make_simulator().with_policy(QuorumPolicy::DistinctVoters);
        assert_eq!(sim.policy(), QuorumPolicy::DistinctVoters);
        sim.prepare("req", Vec::new());

        assert!(sim.promise("req", "node1", Timestamp::ZERO));
        assert!(!sim.promise("req", "node1", Timestamp::ZERO));
        assert!(!sim.accept("req"));

        assert!(sim.promise("req", "node2", Timestamp::ZERO));
        assert!(sim.accept("req"));
    }

    // =========================================================================
    // accept / learn
    // =========================================================================

    #[test]
    fn test_quorum_boundary() {
        let mut sim = make_simulator();
        sim.prepare("req", b"v".to_vec());

        assert!(sim.promise("req", "node1", Timestamp::ZERO));
        assert!(!sim.accept("req"), "one promise is below quorum 2");
        assert!(sim.accepted("req").is_none());

        assert!(sim.promise("req", "node2", Timestamp::ZERO));
        assert!(sim.accept("req"));

        let snapshot = sim.accepted("req").expect("accepted");
        assert_eq!(snapshot.accepts, 2);
        assert_eq!(snapshot.promises, 2);
    }

    #[test]
    fn test_accept_unknown_request() {
        let mut sim = make_simulator();
        assert!(!sim.accept("missing"));
        assert_eq!(sim.store().accepted_count(), 0);
    }

    #[test]
    fn test_learn_returns_accepted_data() {
        let mut sim = make_simulator();
        assert!(sim.learn("req").is_none());

        sim.prepare("req", b"{\"payload\":\"test\"}".to_vec());
        sim.promise("req", "node1", Timestamp::ZERO);
        assert!(sim.learn("req").is_none(), "not accepted yet");

        sim.promise("req", "node2", Timestamp::ZERO);
        sim.accept("req");
        assert_eq!(sim.learn("req"), Some(&b"{\"payload\":\"test\"}"[..]));
    }

    #[test]
    fn test_accepted_snapshot_survives_reprepare() {
        let mut sim = make_simulator();
        sim.prepare("req", b"old".to_vec());
        sim.promise("req", "node1", Timestamp::ZERO);
        sim.promise("req", "node2", Timestamp::ZERO);
        sim.accept("req");

        sim.prepare("req", b"new".to_vec());
        assert_eq!(sim.learn("req"), Some(&b"old"[..]));
    }

    #[test]
    fn test_consensus_validity_is_pass_through() {
        let sim = make_simulator();
        assert!(sim.is_consensus_valid(true));
        assert!(!sim.is_consensus_valid(false));
    }
}
