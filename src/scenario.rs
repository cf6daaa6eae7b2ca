//! Scenario Replay
//!
//! Runs a scripted sequence of calls against a freshly deployed network.
//! Scenarios are YAML documents:
//!
//! ```yaml
//! config:
//!   owner: owner
//! steps:
//!   - register: { candidate: airline1, caller: owner }
//!     expect: finalized
//!   - fund: { amount: 10, caller: airline1 }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::airlines::types::{AirlineId, Amount, RegistrationOutcome};
use crate::config::EngineConfig;
use crate::error::MembershipError;
use crate::network::NetworkState;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Step {
    #[serde(flatten)]
    pub call: Call,
    /// `ok`, `finalized`, `pending` or an error kind such as `proposer_not_funded`
    #[serde(default)]
    pub expect: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    SetOperatingStatus { operational: bool, caller: AirlineId },
    Register { candidate: AirlineId, caller: AirlineId },
    Fund { amount: Amount, caller: AirlineId },
}

impl Call {
    pub fn describe(&self) -> String {
        match self {
            Call::SetOperatingStatus {
                operational,
                caller,
            } => format!("{} sets operational={}", caller, operational),
            Call::Register { candidate, caller } => {
                format!("{} registers {}", caller, candidate)
            }
            Call::Fund { amount, caller } => format!("{} funds {}", caller, amount),
        }
    }

    fn apply(&self, network: &mut NetworkState) -> Result<String, MembershipError> {
        match self {
            Call::SetOperatingStatus {
                operational,
                caller,
            } => {
                network.set_operating_status(*operational, caller)?;
                Ok("ok".to_string())
            }
            Call::Register { candidate, caller } => {
                match network.register_airline(candidate, caller)? {
                    RegistrationOutcome::Finalized { .. } => Ok("finalized".to_string()),
                    RegistrationOutcome::PendingConsensus { .. } => Ok("pending".to_string()),
                }
            }
            Call::Fund { amount, caller } => {
                network.fund(caller, *amount, caller)?;
                Ok("ok".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub index: usize,
    pub call: String,
    /// `ok`, `finalized`, `pending` or the error kind
    pub outcome: String,
    pub message: Option<String>,
    pub expected: Option<String>,
}

impl StepResult {
    pub fn matches_expectation(&self) -> bool {
        self.expected
            .as_ref()
            .map_or(true, |expected| expected == &self.outcome)
    }
}

pub struct ScenarioReport {
    pub results: Vec<StepResult>,
    pub network: NetworkState,
}

impl ScenarioReport {
    pub fn failed_expectations(&self) -> Vec<&StepResult> {
        self.results
            .iter()
            .filter(|result| !result.matches_expectation())
            .collect()
    }
}

impl Scenario {
    pub fn from_yaml(contents: &str) -> Result<Self, MembershipError> {
        serde_yaml::from_str(contents)
            .map_err(|e| MembershipError::ConfigError(format!("Invalid scenario: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, MembershipError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MembershipError::ConfigError(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Deploy a network and apply every step in order. Failing calls are
    /// recorded and the replay continues.
    pub fn run(&self) -> Result<ScenarioReport, MembershipError> {
        let mut network = NetworkState::new(&self.config)?;
        let mut results = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let (outcome, message) = match step.call.apply(&mut network) {
                Ok(outcome) => (outcome, None),
                Err(e) => (e.kind().to_string(), Some(e.to_string())),
            };

            let result = StepResult {
                index,
                call: step.call.describe(),
                outcome,
                message,
                expected: step.expect.clone(),
            };

            if result.matches_expectation() {
                info!("Step {}: {} -> {}", index, result.call, result.outcome);
            } else {
                warn!(
                    "Step {}: {} -> {} (expected {:?})",
                    index, result.call, result.outcome, result.expected
                );
            }
            results.push(result);
        }

        Ok(ScenarioReport { results, network })
    }
}
