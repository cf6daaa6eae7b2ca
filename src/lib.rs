pub mod airlines;
pub mod api;
pub mod config;
pub mod error;
pub mod journal;
pub mod network;
pub mod scenario;

pub use airlines::types::{Airline, AirlineId, AirlineStatus, Amount, RegistrationOutcome};
pub use config::EngineConfig;
pub use error::MembershipError;
pub use network::NetworkState;
