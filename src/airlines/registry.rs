//! Airline Registry
//!
//! Owns the membership set and decides which registration regime applies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::ledger::FundingLedger;
use super::types::AirlineId;
use crate::error::MembershipError;

/// Registration record of a member airline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Position in registration order, the seed airline is 0
    pub ordinal: u64,
    /// Airline whose call finalized the registration, `None` for the seed
    pub registered_by: Option<AirlineId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirlineRegistry {
    consensus_threshold: usize,
    members: BTreeMap<AirlineId, Membership>,
}

impl AirlineRegistry {
    pub fn new(consensus_threshold: usize) -> Self {
        Self {
            consensus_threshold,
            members: BTreeMap::new(),
        }
    }

    pub fn consensus_threshold(&self) -> usize {
        self.consensus_threshold
    }

    pub fn contains(&self, airline: &AirlineId) -> bool {
        self.members.contains_key(airline)
    }

    pub fn membership(&self, airline: &AirlineId) -> Option<&Membership> {
        self.members.get(airline)
    }

    pub fn registered_count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> impl Iterator<Item = (&AirlineId, &Membership)> {
        self.members.iter()
    }

    /// Whether new registrations must go through multiparty consensus
    pub fn requires_consensus(&self) -> bool {
        self.registered_count() >= self.consensus_threshold
    }

    pub fn ensure_not_registered(&self, candidate: &AirlineId) -> Result<(), MembershipError> {
        if self.contains(candidate) {
            warn!("Airline {} is already registered", candidate);
            return Err(MembershipError::AlreadyRegistered(candidate.clone()));
        }
        Ok(())
    }

    pub fn ensure_registered(&self, airline: &AirlineId) -> Result<(), MembershipError> {
        if !self.contains(airline) {
            warn!("Airline {} is not registered", airline);
            return Err(MembershipError::NotRegistered(airline.clone()));
        }
        Ok(())
    }

    /// Check that `proposer` may propose or endorse a registration.
    ///
    /// Only funded members qualify. An empty registry accepts any proposer so
    /// the first member can be bootstrapped; after seeding this never applies.
    pub fn ensure_eligible_proposer(
        &self,
        proposer: &AirlineId,
        ledger: &FundingLedger,
    ) -> Result<(), MembershipError> {
        if self.members.is_empty() {
            return Ok(());
        }

        if !self.contains(proposer) || !ledger.is_funded(proposer) {
            warn!("Proposer {} is not a funded member", proposer);
            return Err(MembershipError::ProposerNotFunded(proposer.clone()));
        }
        Ok(())
    }

    /// Add a member. Callers must have checked `ensure_not_registered`.
    pub(crate) fn admit(&mut self, candidate: AirlineId, registered_by: Option<AirlineId>) {
        let ordinal = self.members.len() as u64;
        self.members.insert(
            candidate,
            Membership {
                ordinal,
                registered_by,
            },
        );
    }
}
