use thiserror::Error;

use crate::airlines::types::{AirlineId, Amount};

impl From<serde_json::Error> for MembershipError {
    fn from(err: serde_json::Error) -> Self {
        Self::SnapshotError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for MembershipError {
    fn from(err: std::io::Error) -> Self {
        Self::JournalError(format!("I/O error: {}", err))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Caller {caller} is not authorized to {action}")]
    Unauthorized { caller: AirlineId, action: String },

    #[error("Network is not operational")]
    ServiceSuspended,

    #[error("Airline {0} is already registered")]
    AlreadyRegistered(AirlineId),

    #[error("Airline {0} is unknown")]
    UnknownAirline(AirlineId),

    #[error("Proposer {0} has not funded its participation")]
    ProposerNotFunded(AirlineId),

    #[error("Airline {0} is not registered")]
    NotRegistered(AirlineId),

    #[error("Funding of {offered} is below the minimum of {minimum}")]
    InsufficientFunding { offered: Amount, minimum: Amount },

    #[error("Balance of airline {0} would overflow")]
    BalanceOverflow(AirlineId),

    #[error("Invalid airline identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Journal error: {0}")]
    JournalError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),
}

impl MembershipError {
    /// Stable machine-readable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::ServiceSuspended => "service_suspended",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::UnknownAirline(_) => "unknown_airline",
            Self::ProposerNotFunded(_) => "proposer_not_funded",
            Self::NotRegistered(_) => "not_registered",
            Self::InsufficientFunding { .. } => "insufficient_funding",
            Self::BalanceOverflow(_) => "balance_overflow",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::ConfigError(_) => "config_error",
            Self::JournalError(_) => "journal_error",
            Self::SnapshotError(_) => "snapshot_error",
        }
    }

    pub fn unauthorized(caller: &AirlineId, action: &str) -> Self {
        Self::Unauthorized {
            caller: caller.clone(),
            action: action.to_string(),
        }
    }
}
