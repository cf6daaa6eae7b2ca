//! Engine configuration
//!
//! Loaded from environment variables or a TOML file, then validated before the
//! network is built.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::airlines::types::{AirlineId, Amount};
use crate::error::MembershipError;
use crate::journal::DEFAULT_JOURNAL_RETENTION;

/// Default seed airline: the first account of a local development chain
pub const DEFAULT_OWNER: &str = "0x627306090abab3a6e1400e9345bc60c78a8bef57";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed airline, registered and funded at deployment
    pub owner: String,
    /// Registered-airline count from which new members need consensus
    pub consensus_threshold: usize,
    /// Lower bound on endorsements required in the consensus regime
    pub min_consensus_votes: usize,
    pub funding_min: Amount,
    /// Amount credited to the seed airline at deployment
    pub seed_funding: Amount,
    pub server_host: String,
    pub server_port: u16,
    pub journal_path: Option<String>,
    /// Journal entries kept in memory once written to `journal_path`
    pub journal_retention: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            consensus_threshold: 4,
            min_consensus_votes: 2,
            funding_min: 10,
            seed_funding: 10,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            journal_path: None,
            journal_retention: DEFAULT_JOURNAL_RETENTION,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn load() -> Result<Self, MembershipError> {
        let defaults = Self::default();

        let config = Self {
            owner: env::var("AIRLINE_OWNER").unwrap_or(defaults.owner),
            consensus_threshold: env_or("CONSENSUS_THRESHOLD", defaults.consensus_threshold)?,
            min_consensus_votes: env_or("MIN_CONSENSUS_VOTES", defaults.min_consensus_votes)?,
            funding_min: env_or("FUNDING_MIN", defaults.funding_min)?,
            seed_funding: env_or("SEED_FUNDING", defaults.seed_funding)?,
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: env_or("SERVER_PORT", defaults.server_port)?,
            journal_path: env::var("JOURNAL_PATH").ok(),
            journal_retention: env_or("JOURNAL_RETENTION", defaults.journal_retention)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, MembershipError> {
        info!("Loading engine configuration from: {:?}", path);

        let contents = fs::read_to_string(path).map_err(|e| {
            MembershipError::ConfigError(format!("Failed to read {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| {
            MembershipError::ConfigError(format!("Failed to parse {:?}: {}", path, e))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MembershipError> {
        self.owner_id()?;

        if self.consensus_threshold == 0 {
            return Err(MembershipError::ConfigError(
                "consensus_threshold must be at least 1".to_string(),
            ));
        }

        if self.min_consensus_votes == 0 {
            return Err(MembershipError::ConfigError(
                "min_consensus_votes must be at least 1".to_string(),
            ));
        }

        if self.funding_min == 0 {
            return Err(MembershipError::ConfigError(
                "funding_min must be at least 1".to_string(),
            ));
        }

        if self.seed_funding == 0 {
            return Err(MembershipError::ConfigError(
                "seed_funding must be at least 1, the seed airline starts funded".to_string(),
            ));
        }

        Ok(())
    }

    pub fn owner_id(&self) -> Result<AirlineId, MembershipError> {
        AirlineId::parse(&self.owner)
            .map_err(|e| MembershipError::ConfigError(format!("Invalid owner: {}", e)))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, MembershipError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| MembershipError::ConfigError(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
