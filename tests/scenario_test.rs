//! Scenario Replay Tests

mod common;

use std::path::PathBuf;

use airline_membership::scenario::Scenario;
use airline_membership::AirlineStatus;
use common::*;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

#[test]
fn test_flight_surety_walkthrough_meets_expectations() {
    let scenario = Scenario::load(&scenario_path("flight_surety.yml")).unwrap();
    let report = scenario.run().unwrap();

    for result in &report.results {
        assert!(
            result.matches_expectation(),
            "step {} ({}) returned {}, expected {:?}",
            result.index,
            result.call,
            result.outcome,
            result.expected
        );
    }

    let network = &report.network;
    assert_eq!(network.count_of_registered_airlines(), 5);
    assert_eq!(network.funded_airline_count(), 3);
    assert!(!network.is_operational());
    assert!(network.pending_proposals().is_empty());
    assert!(network.journal().verify().is_ok());

    let airline3 = network
        .get_airline(&id("0x821aea9a577a9b44299b9c15c88cf3087f3b5544"))
        .unwrap();
    assert_eq!(airline3.status, AirlineStatus::Registered);
}

#[test]
fn test_replay_continues_after_failures() {
    let scenario = Scenario::from_yaml(
        r#"
steps:
  - register: { candidate: airline1, caller: nobody }
  - register: { candidate: airline1, caller: "0x627306090abab3a6e1400e9345bc60c78a8bef57" }
"#,
    )
    .unwrap();

    let report = scenario.run().unwrap();
    assert_eq!(report.results[0].outcome, "proposer_not_funded");
    assert!(report.results[0].message.is_some());
    assert_eq!(report.results[1].outcome, "finalized");
    assert!(report.failed_expectations().is_empty());
}
