use crate::commands::{Command, Request};
use crate::envelope::{EnumerateRequest, InvokeRequest};
use crate::error::{Error, Result};
use crate::filter::FilterQuery;
use crate::record::require_text;
use crate::return_code::RET_SUCCESS;
use crate::types::PowerState;
use crate::uris::DCIM_COMPUTER_SYSTEM;
use crate::xml::Element;

/// Read the host power state from `DCIM_ComputerSystem.EnabledState`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPowerState;

impl Command for GetPowerState {
    type Output = PowerState;

    fn request(&self) -> Result<Request> {
        let query = FilterQuery::select("EnabledState", "DCIM_ComputerSystem").build()?;
        Ok(Request::Enumerate(
            EnumerateRequest::new(DCIM_COMPUTER_SYSTEM).filter(query),
        ))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        let state = require_text(response, DCIM_COMPUTER_SYSTEM, "EnabledState")?;
        PowerState::from_cim_state(state)
            .ok_or_else(|| Error::malformed(format!("unknown EnabledState {state:?}")))
    }
}

/// CIM `Invalid State Transition`: the host already is in the requested state.
const RET_ALREADY_IN_STATE: &str = "4097";

/// `DCIM_ComputerSystem.RequestStateChange`.
///
/// Requesting the state the host is already in is a successful no-op.
#[derive(Debug, Clone, Copy)]
pub struct RequestStateChange {
    /// Target power state.
    pub target: PowerState,
}

impl Command for RequestStateChange {
    type Output = ();

    fn request(&self) -> Result<Request> {
        Ok(Request::Invoke(
            InvokeRequest::new(DCIM_COMPUTER_SYSTEM, "RequestStateChange")
                .selector("CreationClassName", "DCIM_ComputerSystem")
                .selector("Name", "srv:system")
                .property("RequestedState", self.target.cim_state())
                .expect_return_value(RET_SUCCESS)
                .no_change_code(RET_ALREADY_IN_STATE),
        ))
    }

    fn parse_response(&self, _response: &Element) -> Result<Self::Output> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::return_code::Outcome;

    #[test]
    fn request_state_change_targets_the_host() {
        let Request::Invoke(request) = RequestStateChange {
            target: PowerState::Reboot,
        }
        .request()
        .expect("request") else {
            panic!("expected invocation");
        };

        assert_eq!(request.method(), "RequestStateChange");
        assert_eq!(request.selectors()["Name"], "srv:system");
        assert_eq!(
            request.properties()["RequestedState"].values(),
            ["11".to_owned()]
        );
        assert_eq!(request.expected_return_value(), Some(RET_SUCCESS));
    }

    #[test]
    fn current_state_is_a_no_op() {
        let Request::Invoke(request) = RequestStateChange {
            target: PowerState::PowerOn,
        }
        .request()
        .expect("request") else {
            panic!("expected invocation");
        };

        assert_eq!(request.policy().classify(RET_ALREADY_IN_STATE), Outcome::NoChange);
        assert_eq!(request.policy().classify("2"), Outcome::Failed);
        assert_eq!(request.policy().classify("4096"), Outcome::Unexpected);
    }

    #[test]
    fn unknown_enabled_state_is_malformed() {
        let doc = Element::parse(&format!(
            r#"<Items xmlns:n1="{DCIM_COMPUTER_SYSTEM}"><n1:DCIM_ComputerSystem><n1:EnabledState>6</n1:EnabledState></n1:DCIM_ComputerSystem></Items>"#
        ))
        .expect("parse");
        let err = GetPowerState.parse_response(&doc).expect_err("unknown");
        assert!(matches!(err, Error::MalformedResponse(_)));
    }
}
