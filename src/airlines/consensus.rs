//! Consensus Vote Tracking
//!
//! Collects distinct endorsements for candidates that need multiparty approval
//! and computes how many endorsements are enough.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::types::{AirlineId, ProposalTally};

/// Pending registration of one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationProposal {
    pub candidate: AirlineId,
    pub voters: BTreeSet<AirlineId>,
}

impl RegistrationProposal {
    fn new(candidate: AirlineId) -> Self {
        Self {
            candidate,
            voters: BTreeSet::new(),
        }
    }

    pub fn votes(&self) -> usize {
        self.voters.len()
    }
}

/// Result of recording a single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTally {
    pub votes: usize,
    pub required: usize,
    /// False when the voter had already endorsed this candidate
    pub newly_counted: bool,
}

impl VoteTally {
    pub fn reached(&self) -> bool {
        self.votes >= self.required
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusVoteTracker {
    min_votes: usize,
    proposals: BTreeMap<AirlineId, RegistrationProposal>,
}

impl ConsensusVoteTracker {
    pub fn new(min_votes: usize) -> Self {
        Self {
            min_votes,
            proposals: BTreeMap::new(),
        }
    }

    pub fn min_votes(&self) -> usize {
        self.min_votes
    }

    /// Votes needed to admit a candidate: half of the funded airlines,
    /// rounded up, but never fewer than `min_votes`.
    pub fn required_votes(&self, funded_count: usize) -> usize {
        funded_count.div_ceil(2).max(self.min_votes)
    }

    /// Add `voter` to the candidate's proposal, creating it on first vote.
    /// Repeated votes from the same airline are absorbed.
    pub fn record_vote(
        &mut self,
        candidate: &AirlineId,
        voter: &AirlineId,
        funded_count: usize,
    ) -> VoteTally {
        let required = self.required_votes(funded_count);
        let proposal = self
            .proposals
            .entry(candidate.clone())
            .or_insert_with(|| RegistrationProposal::new(candidate.clone()));
        let newly_counted = proposal.voters.insert(voter.clone());

        debug!(
            "Vote from {} for {}: {}/{} (new: {})",
            voter,
            candidate,
            proposal.votes(),
            required,
            newly_counted
        );

        VoteTally {
            votes: proposal.votes(),
            required,
            newly_counted,
        }
    }

    /// Drop a finalized proposal
    pub fn close(&mut self, candidate: &AirlineId) -> Option<RegistrationProposal> {
        self.proposals.remove(candidate)
    }

    pub fn proposal(&self, candidate: &AirlineId) -> Option<&RegistrationProposal> {
        self.proposals.get(candidate)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &RegistrationProposal> {
        self.proposals.values()
    }

    pub fn pending_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn tally(&self, candidate: &AirlineId, funded_count: usize) -> Option<ProposalTally> {
        self.proposals.get(candidate).map(|proposal| ProposalTally {
            candidate: proposal.candidate.clone(),
            voters: proposal.voters.iter().cloned().collect(),
            votes: proposal.votes(),
            required: self.required_votes(funded_count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AirlineId {
        AirlineId::parse(s).unwrap()
    }

    #[test]
    fn test_required_votes_is_half_of_funded_rounded_up() {
        let tracker = ConsensusVoteTracker::new(1);
        assert_eq!(tracker.required_votes(1), 1);
        assert_eq!(tracker.required_votes(4), 2);
        assert_eq!(tracker.required_votes(5), 3);
        assert_eq!(tracker.required_votes(10), 5);
    }

    #[test]
    fn test_required_votes_has_a_floor() {
        let tracker = ConsensusVoteTracker::new(2);
        assert_eq!(tracker.required_votes(0), 2);
        assert_eq!(tracker.required_votes(1), 2);
        assert_eq!(tracker.required_votes(2), 2);
        assert_eq!(tracker.required_votes(7), 4);
    }

    #[test]
    fn test_duplicate_votes_collapse() {
        let mut tracker = ConsensusVoteTracker::new(2);
        let first = tracker.record_vote(&id("airline8"), &id("owner"), 1);
        let again = tracker.record_vote(&id("airline8"), &id("owner"), 1);

        assert!(first.newly_counted);
        assert!(!again.newly_counted);
        assert_eq!(again.votes, 1);
        assert!(!again.reached());
        assert_eq!(tracker.pending_count(), 1);
    }

    #[test]
    fn test_second_distinct_voter_reaches_consensus() {
        let mut tracker = ConsensusVoteTracker::new(2);
        tracker.record_vote(&id("airline8"), &id("owner"), 2);
        let tally = tracker.record_vote(&id("airline8"), &id("airline6"), 2);
        assert_eq!(tally.votes, 2);
        assert!(tally.reached());

        let closed = tracker.close(&id("airline8")).unwrap();
        assert_eq!(closed.votes(), 2);
        assert!(tracker.proposal(&id("airline8")).is_none());
    }

    #[test]
    fn test_tally_lists_voters() {
        let mut tracker = ConsensusVoteTracker::new(2);
        tracker.record_vote(&id("c"), &id("v2"), 6);
        tracker.record_vote(&id("c"), &id("v1"), 6);

        let tally = tracker.tally(&id("c"), 6).unwrap();
        assert_eq!(tally.voters, vec![id("v1"), id("v2")]);
        assert_eq!(tally.required, 3);
        assert!(tracker.tally(&id("other"), 6).is_none());
    }
}
