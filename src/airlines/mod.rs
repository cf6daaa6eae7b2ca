//! Airline Membership Components
//!
//! Funding ledger, membership registry, consensus vote tracking and the
//! operational gate that together make up the network's admission rules.

pub mod consensus;
pub mod gate;
pub mod ledger;
pub mod registry;
pub mod types;

pub use consensus::{ConsensusVoteTracker, RegistrationProposal, VoteTally};
pub use gate::OperationalGate;
pub use ledger::FundingLedger;
pub use registry::{AirlineRegistry, Membership};
pub use types::*;
