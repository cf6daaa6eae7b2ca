use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::types::AirlineId;
use crate::error::MembershipError;

/// Network-wide switch that suspends every mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalGate {
    owner: AirlineId,
    operational: bool,
}

impl OperationalGate {
    pub fn new(owner: AirlineId) -> Self {
        Self {
            owner,
            operational: true,
        }
    }

    pub fn owner(&self) -> &AirlineId {
        &self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn require_operational(&self) -> Result<(), MembershipError> {
        if !self.operational {
            warn!("Rejected mutating call while network is suspended");
            return Err(MembershipError::ServiceSuspended);
        }
        Ok(())
    }

    /// Change the flag. Returns whether the value actually changed.
    pub fn set_operating_status(
        &mut self,
        mode: bool,
        caller: &AirlineId,
    ) -> Result<bool, MembershipError> {
        if caller != &self.owner {
            warn!("{} attempted to change operating status", caller);
            return Err(MembershipError::unauthorized(caller, "change operating status"));
        }

        if self.operational == mode {
            return Ok(false);
        }

        self.operational = mode;
        info!("Operating status set to {} by {}", mode, caller);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AirlineId {
        AirlineId::parse(s).unwrap()
    }

    #[test]
    fn test_initially_operational() {
        let gate = OperationalGate::new(id("owner"));
        assert!(gate.is_operational());
        assert!(gate.require_operational().is_ok());
    }

    #[test]
    fn test_non_owner_cannot_toggle() {
        let mut gate = OperationalGate::new(id("owner"));
        let err = gate.set_operating_status(false, &id("airline2")).unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
        assert!(gate.is_operational());
    }

    #[test]
    fn test_owner_can_suspend_and_resume() {
        let mut gate = OperationalGate::new(id("owner"));
        assert_eq!(gate.set_operating_status(false, &id("owner")), Ok(true));
        assert_eq!(
            gate.require_operational(),
            Err(MembershipError::ServiceSuspended)
        );

        // Same value again is a no-op
        assert_eq!(gate.set_operating_status(false, &id("owner")), Ok(false));

        assert_eq!(gate.set_operating_status(true, &id("owner")), Ok(true));
        assert!(gate.require_operational().is_ok());
    }
}
