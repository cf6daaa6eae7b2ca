//! Airline Types and Data Structures

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MembershipError;

/// Opaque funding credit, in the smallest unit of the value-transfer substrate
pub type Amount = u64;

/// Address-like identifier of a network participant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AirlineId(String);

impl AirlineId {
    /// Parse an identifier. Surrounding whitespace is ignored and hex
    /// addresses (`0x...`) compare case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, MembershipError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(MembershipError::InvalidIdentifier(raw.to_string()));
        }

        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AirlineId {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AirlineId {
    type Error = MembershipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AirlineId> for String {
    fn from(id: AirlineId) -> Self {
        id.0
    }
}

/// Lifecycle state of a registered airline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirlineStatus {
    Registered,
    Funded,
}

impl AirlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AirlineStatus::Registered => "registered",
            AirlineStatus::Funded => "funded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "registered" => Some(AirlineStatus::Registered),
            "funded" => Some(AirlineStatus::Funded),
            _ => None,
        }
    }
}

/// Read-only view of an airline's membership and funding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    pub id: AirlineId,
    pub status: AirlineStatus,
    pub funded_amount: Amount,
}

impl Airline {
    pub fn is_funded(&self) -> bool {
        self.status == AirlineStatus::Funded
    }
}

/// Result of a `register_airline` call that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// The candidate is now a registered member
    Finalized { candidate: AirlineId },
    /// The vote was recorded but consensus has not been reached
    PendingConsensus {
        candidate: AirlineId,
        votes: usize,
        required: usize,
    },
}

impl RegistrationOutcome {
    pub fn candidate(&self) -> &AirlineId {
        match self {
            RegistrationOutcome::Finalized { candidate } => candidate,
            RegistrationOutcome::PendingConsensus { candidate, .. } => candidate,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, RegistrationOutcome::Finalized { .. })
    }
}

/// Current tally of a pending registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTally {
    pub candidate: AirlineId,
    pub voters: Vec<AirlineId>,
    pub votes: usize,
    pub required: usize,
}
