//! Network State
//!
//! The single owned instance that holds every airline, balance and pending
//! proposal. All mutation goes through the operations below; each one checks
//! every precondition before writing anything, so a failed call leaves the
//! state exactly as it was.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::airlines::{
    Airline, AirlineId, AirlineRegistry, AirlineStatus, Amount, ConsensusVoteTracker,
    FundingLedger, OperationalGate, ProposalTally, RegistrationOutcome,
};
use crate::config::EngineConfig;
use crate::error::MembershipError;
use crate::journal::{EventJournal, NetworkEvent};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct NetworkState {
    gate: OperationalGate,
    ledger: FundingLedger,
    registry: AirlineRegistry,
    votes: ConsensusVoteTracker,
    journal: EventJournal,
}

impl NetworkState {
    /// Deploy a network with its seed airline registered and funded
    pub fn new(config: &EngineConfig) -> Result<Self, MembershipError> {
        config.validate()?;
        let owner = config.owner_id()?;

        let mut registry = AirlineRegistry::new(config.consensus_threshold);
        let mut ledger = FundingLedger::new(config.funding_min);
        registry.admit(owner.clone(), None);
        ledger.set_balance(&owner, config.seed_funding);

        let mut journal = EventJournal::new();
        journal.append(NetworkEvent::NetworkInitialized {
            owner: owner.clone(),
            seed_funding: config.seed_funding,
        });

        info!(
            "Network initialized with seed airline {} (consensus from {} members, minimum funding {})",
            owner, config.consensus_threshold, config.funding_min
        );

        Ok(Self {
            gate: OperationalGate::new(owner),
            ledger,
            registry,
            votes: ConsensusVoteTracker::new(config.min_consensus_votes),
            journal,
        })
    }

    pub fn owner(&self) -> &AirlineId {
        self.gate.owner()
    }

    pub fn is_operational(&self) -> bool {
        self.gate.is_operational()
    }

    /// Suspend or resume the network. Only the owner may do this, and it is
    /// allowed while suspended.
    pub fn set_operating_status(
        &mut self,
        mode: bool,
        caller: &AirlineId,
    ) -> Result<(), MembershipError> {
        if self.gate.set_operating_status(mode, caller)? {
            self.journal.append(NetworkEvent::OperatingStatusChanged {
                operational: mode,
                changed_by: caller.clone(),
            });
        }
        Ok(())
    }

    /// Propose `candidate` for membership on behalf of `proposer`.
    ///
    /// Below the consensus threshold the candidate is admitted at once.
    /// From the threshold on, the call counts as one endorsement and the
    /// candidate is admitted when enough distinct funded airlines endorse it.
    pub fn register_airline(
        &mut self,
        candidate: &AirlineId,
        proposer: &AirlineId,
    ) -> Result<RegistrationOutcome, MembershipError> {
        self.gate.require_operational()?;
        self.registry.ensure_not_registered(candidate)?;
        self.registry
            .ensure_eligible_proposer(proposer, &self.ledger)?;

        if !self.registry.requires_consensus() {
            self.admit(candidate, proposer);
            return Ok(RegistrationOutcome::Finalized {
                candidate: candidate.clone(),
            });
        }

        let tally = self
            .votes
            .record_vote(candidate, proposer, self.ledger.funded_count());

        if tally.newly_counted {
            self.journal.append(NetworkEvent::VoteRecorded {
                candidate: candidate.clone(),
                voter: proposer.clone(),
                votes: tally.votes,
                required: tally.required,
            });
        }

        if tally.reached() {
            self.admit(candidate, proposer);
            return Ok(RegistrationOutcome::Finalized {
                candidate: candidate.clone(),
            });
        }

        info!(
            "Registration of {} pending consensus: {}/{} votes",
            candidate, tally.votes, tally.required
        );
        Ok(RegistrationOutcome::PendingConsensus {
            candidate: candidate.clone(),
            votes: tally.votes,
            required: tally.required,
        })
    }

    /// Credit `amount` to `airline`. Airlines fund themselves, so `caller`
    /// must be the airline. Returns the airline's new total.
    pub fn fund(
        &mut self,
        airline: &AirlineId,
        amount: Amount,
        caller: &AirlineId,
    ) -> Result<Amount, MembershipError> {
        self.gate.require_operational()?;

        if caller != airline {
            warn!("{} attempted to fund {}", caller, airline);
            return Err(MembershipError::unauthorized(
                caller,
                &format!("fund airline {}", airline),
            ));
        }

        self.registry.ensure_registered(airline)?;
        let total = self.ledger.credit(airline, amount)?;

        self.journal.append(NetworkEvent::AirlineFunded {
            airline: airline.clone(),
            amount,
            total,
        });
        info!("Airline {} funded with {} (total {})", airline, amount, total);
        Ok(total)
    }

    pub fn is_airline_registered(&self, airline: &AirlineId) -> bool {
        self.registry.contains(airline)
    }

    pub fn get_airline(&self, airline: &AirlineId) -> Result<Airline, MembershipError> {
        if !self.registry.contains(airline) {
            return Err(MembershipError::UnknownAirline(airline.clone()));
        }

        let funded_amount = self.ledger.balance_of(airline);
        let status = if funded_amount > 0 {
            AirlineStatus::Funded
        } else {
            AirlineStatus::Registered
        };

        Ok(Airline {
            id: airline.clone(),
            status,
            funded_amount,
        })
    }

    pub fn count_of_registered_airlines(&self) -> usize {
        self.registry.registered_count()
    }

    pub fn funded_airline_count(&self) -> usize {
        self.ledger.funded_count()
    }

    pub fn airlines(&self) -> Vec<Airline> {
        self.registry
            .members()
            .map(|(id, _)| Airline {
                id: id.clone(),
                status: if self.ledger.is_funded(id) {
                    AirlineStatus::Funded
                } else {
                    AirlineStatus::Registered
                },
                funded_amount: self.ledger.balance_of(id),
            })
            .collect()
    }

    pub fn requires_consensus(&self) -> bool {
        self.registry.requires_consensus()
    }

    /// Endorsements a new candidate currently needs in the consensus regime
    pub fn required_votes(&self) -> usize {
        self.votes.required_votes(self.ledger.funded_count())
    }

    pub fn proposal(&self, candidate: &AirlineId) -> Option<ProposalTally> {
        self.votes.tally(candidate, self.ledger.funded_count())
    }

    pub fn pending_proposals(&self) -> Vec<ProposalTally> {
        let funded = self.ledger.funded_count();
        self.votes
            .proposals()
            .filter_map(|proposal| self.votes.tally(&proposal.candidate, funded))
            .collect()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// Release journal entries below `sequence` from memory. Callers must
    /// have persisted them first.
    pub fn discard_journal_before(&mut self, sequence: u64) -> usize {
        self.journal.discard_before(sequence)
    }

    fn admit(&mut self, candidate: &AirlineId, proposer: &AirlineId) {
        self.votes.close(candidate);
        self.registry.admit(candidate.clone(), Some(proposer.clone()));

        let registered_count = self.registry.registered_count();
        self.journal.append(NetworkEvent::AirlineRegistered {
            airline: candidate.clone(),
            registered_by: proposer.clone(),
            registered_count,
        });
        info!(
            "Airline {} registered by {} ({} members)",
            candidate, proposer, registered_count
        );
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            version: SNAPSHOT_VERSION,
            gate: self.gate.clone(),
            ledger: self.ledger.clone(),
            registry: self.registry.clone(),
            votes: self.votes.clone(),
        }
    }

    /// Rebuild a network from a snapshot after checking its invariants.
    /// The restored network starts a fresh journal.
    pub fn restore(snapshot: NetworkSnapshot) -> Result<Self, MembershipError> {
        snapshot.validate()?;

        let mut journal = EventJournal::new();
        journal.append(NetworkEvent::StateRestored {
            owner: snapshot.gate.owner().clone(),
            registered_count: snapshot.registry.registered_count(),
            funded_count: snapshot.ledger.funded_count(),
        });

        info!(
            "Network restored with {} members and {} pending proposals",
            snapshot.registry.registered_count(),
            snapshot.votes.pending_count()
        );

        Ok(Self {
            gate: snapshot.gate,
            ledger: snapshot.ledger,
            registry: snapshot.registry,
            votes: snapshot.votes,
            journal,
        })
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), MembershipError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, json).map_err(|e| {
            MembershipError::SnapshotError(format!("Failed to write {:?}: {}", path, e))
        })?;
        info!("Snapshot written to {:?}", path);
        Ok(())
    }

    pub fn load_snapshot(path: &Path) -> Result<Self, MembershipError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MembershipError::SnapshotError(format!("Failed to read {:?}: {}", path, e))
        })?;
        let snapshot: NetworkSnapshot = serde_json::from_str(&contents)?;
        Self::restore(snapshot)
    }
}

/// Serializable image of the network, without its journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub version: u32,
    pub gate: OperationalGate,
    pub ledger: FundingLedger,
    pub registry: AirlineRegistry,
    pub votes: ConsensusVoteTracker,
}

impl NetworkSnapshot {
    pub fn validate(&self) -> Result<(), MembershipError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(invalid(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        if self.registry.consensus_threshold() == 0 {
            return Err(invalid("consensus_threshold must be at least 1".to_string()));
        }

        if self.votes.min_votes() == 0 {
            return Err(invalid("min_consensus_votes must be at least 1".to_string()));
        }

        if self.ledger.funding_min() == 0 {
            return Err(invalid("funding_min must be at least 1".to_string()));
        }

        if let Some(empty) = self
            .ledger
            .funded_airlines()
            .find(|id| self.ledger.balance_of(id) == 0)
        {
            return Err(invalid(format!(
                "airline {} is listed with a zero balance",
                empty
            )));
        }

        let owner = self.gate.owner();
        if !self.registry.contains(owner) || !self.ledger.is_funded(owner) {
            return Err(invalid(format!(
                "seed airline {} must be registered and funded",
                owner
            )));
        }

        if let Some(unregistered) = self
            .ledger
            .funded_airlines()
            .find(|id| !self.registry.contains(id))
        {
            return Err(invalid(format!(
                "airline {} is funded but not registered",
                unregistered
            )));
        }

        for proposal in self.votes.proposals() {
            if self.registry.contains(&proposal.candidate) {
                return Err(invalid(format!(
                    "proposal for {} outlived its registration",
                    proposal.candidate
                )));
            }

            if proposal.voters.is_empty() {
                return Err(invalid(format!(
                    "proposal for {} has no voters",
                    proposal.candidate
                )));
            }

            if let Some(voter) = proposal
                .voters
                .iter()
                .find(|voter| !self.registry.contains(voter) || !self.ledger.is_funded(voter))
            {
                return Err(invalid(format!(
                    "voter {} on proposal for {} is not a funded member",
                    voter, proposal.candidate
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> MembershipError {
    MembershipError::SnapshotError(format!("Invalid snapshot: {}", reason))
}
