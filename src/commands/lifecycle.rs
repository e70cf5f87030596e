use crate::commands::{Command, Request};
use crate::envelope::EnumerateRequest;
use crate::error::Result;
use crate::filter::FilterQuery;
use crate::record::require_text;
use crate::types::LifecycleControllerVersion;
use crate::uris::DCIM_SYSTEM_VIEW;
use crate::xml::Element;

/// Read `DCIM_SystemView.LifecycleControllerVersion`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetLifecycleControllerVersion;

impl Command for GetLifecycleControllerVersion {
    type Output = LifecycleControllerVersion;

    fn request(&self) -> Result<Request> {
        let query = FilterQuery::select("LifecycleControllerVersion", "DCIM_SystemView").build()?;
        Ok(Request::Enumerate(
            EnumerateRequest::new(DCIM_SYSTEM_VIEW).filter(query),
        ))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        require_text(response, DCIM_SYSTEM_VIEW, "LifecycleControllerVersion")?.parse()
    }
}
