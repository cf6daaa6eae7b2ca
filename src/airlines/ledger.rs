//! Funding Ledger
//!
//! Tracks how much each airline has contributed. An airline is funded exactly
//! when its balance is non-zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::types::{AirlineId, Amount};
use crate::error::MembershipError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingLedger {
    funding_min: Amount,
    balances: BTreeMap<AirlineId, Amount>,
}

impl FundingLedger {
    pub fn new(funding_min: Amount) -> Self {
        Self {
            funding_min,
            balances: BTreeMap::new(),
        }
    }

    pub fn funding_min(&self) -> Amount {
        self.funding_min
    }

    /// Check that a contribution would be accepted, without crediting it
    pub fn check_contribution(&self, amount: Amount) -> Result<(), MembershipError> {
        if amount < self.funding_min {
            warn!(
                "Funding of {} rejected, minimum is {}",
                amount, self.funding_min
            );
            return Err(MembershipError::InsufficientFunding {
                offered: amount,
                minimum: self.funding_min,
            });
        }
        Ok(())
    }

    /// Credit a contribution and return the new balance. Contributions
    /// accumulate; each one must meet the minimum on its own.
    pub fn credit(&mut self, airline: &AirlineId, amount: Amount) -> Result<Amount, MembershipError> {
        self.check_contribution(amount)?;

        let current = self.balance_of(airline);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| MembershipError::BalanceOverflow(airline.clone()))?;

        self.balances.insert(airline.clone(), updated);
        Ok(updated)
    }

    /// Record a balance without the minimum check (seed funding, restores)
    pub(crate) fn set_balance(&mut self, airline: &AirlineId, amount: Amount) {
        if amount == 0 {
            self.balances.remove(airline);
        } else {
            self.balances.insert(airline.clone(), amount);
        }
    }

    pub fn balance_of(&self, airline: &AirlineId) -> Amount {
        self.balances.get(airline).copied().unwrap_or(0)
    }

    pub fn is_funded(&self, airline: &AirlineId) -> bool {
        self.balance_of(airline) > 0
    }

    pub fn funded_count(&self) -> usize {
        self.balances.len()
    }

    pub fn funded_airlines(&self) -> impl Iterator<Item = &AirlineId> {
        self.balances.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AirlineId {
        AirlineId::parse(s).unwrap()
    }

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = FundingLedger::new(10);
        assert_eq!(ledger.credit(&id("airline1"), 10).unwrap(), 10);
        assert_eq!(ledger.credit(&id("airline1"), 15).unwrap(), 25);
        assert_eq!(ledger.balance_of(&id("airline1")), 25);
        assert_eq!(ledger.funded_count(), 1);
    }

    #[test]
    fn test_under_minimum_is_not_credited() {
        let mut ledger = FundingLedger::new(10);
        let err = ledger.credit(&id("airline1"), 9).unwrap_err();
        assert_eq!(
            err,
            MembershipError::InsufficientFunding {
                offered: 9,
                minimum: 10
            }
        );
        assert!(!ledger.is_funded(&id("airline1")));
        assert_eq!(ledger.funded_count(), 0);
    }

    #[test]
    fn test_exact_minimum_is_accepted() {
        let mut ledger = FundingLedger::new(10);
        ledger.credit(&id("airline2"), 10).unwrap();
        assert!(ledger.is_funded(&id("airline2")));
    }

    #[test]
    fn test_overflow_leaves_balance_untouched() {
        let mut ledger = FundingLedger::new(1);
        ledger.set_balance(&id("whale"), Amount::MAX);
        assert!(ledger.credit(&id("whale"), 1).is_err());
        assert_eq!(ledger.balance_of(&id("whale")), Amount::MAX);
    }
}
