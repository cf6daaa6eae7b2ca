#![allow(dead_code)]

use airline_membership::{AirlineId, EngineConfig, NetworkState};

pub const OWNER: &str = "0x627306090abab3a6e1400e9345bc60c78a8bef57";

pub fn id(raw: &str) -> AirlineId {
    AirlineId::parse(raw).expect("valid airline id")
}

pub fn owner() -> AirlineId {
    id(OWNER)
}

/// Network with default rules: consensus from 4 members, minimum funding 10
pub fn setup_network() -> NetworkState {
    NetworkState::new(&EngineConfig::default()).expect("default config is valid")
}

/// Network with the owner plus `airline1..=airline3` registered, none funded
pub fn setup_network_at_threshold() -> NetworkState {
    let mut network = setup_network();
    for n in 1..=3 {
        network
            .register_airline(&id(&format!("airline{}", n)), &owner())
            .expect("direct registration");
    }
    assert_eq!(network.count_of_registered_airlines(), 4);
    network
}
