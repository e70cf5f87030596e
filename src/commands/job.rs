use crate::commands::{Command, Request};
use crate::envelope::ns::WSMAN;
use crate::envelope::{EnumerateRequest, InvokeRequest};
use crate::error::{Error, Result};
use crate::filter::FilterQuery;
use crate::record::{Field, FieldMap, Fields};
use crate::return_code::{RET_CREATED, RET_SUCCESS};
use crate::types::Job;
use crate::uris::{DCIM_BIOS_SERVICE, DCIM_JOB_SERVICE, DCIM_LIFECYCLE_JOB};
use crate::xml::Element;

const JOB_FIELDS: FieldMap = FieldMap::new(
    "DCIM_LifecycleJob",
    DCIM_LIFECYCLE_JOB,
    &[
        Field::required("InstanceID"),
        Field::optional("Name", ""),
        Field::optional("JobStartTime", "TIME_NA"),
        Field::optional("JobUntilTime", "TIME_NA"),
        Field::optional("Message", "NA"),
        Field::required("JobStatus"),
        Field::optional("PercentComplete", "NA"),
    ],
);

/// Job states after which a job no longer runs.
const FINISHED_STATES: &[&str] = &["Reboot Completed", "Completed", "Completed with Errors", "Failed"];

fn job(f: &Fields<'_>) -> Result<Job> {
    Ok(Job {
        id: f.string("InstanceID"),
        name: f.string("Name"),
        start_time: f.string("JobStartTime"),
        until_time: f.string("JobUntilTime"),
        message: f.string("Message"),
        state: f.string("JobStatus"),
        percent_complete: f.string("PercentComplete"),
    })
}

/// List Lifecycle Controller jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListJobs {
    /// Skip finished jobs and the `CLEARALL` pseudo job.
    pub only_unfinished: bool,
}

impl ListJobs {
    pub(crate) fn filter(&self) -> Option<FilterQuery> {
        if !self.only_unfinished {
            return None;
        }
        let query = FilterQuery::select_all("DCIM_LifecycleJob").not_equals("Name", "CLEARALL");
        Some(
            FINISHED_STATES
                .iter()
                .fold(query, |q, state| q.not_equals("JobStatus", *state)),
        )
    }
}

impl Command for ListJobs {
    type Output = Vec<Job>;

    fn request(&self) -> Result<Request> {
        let mut request = EnumerateRequest::new(DCIM_LIFECYCLE_JOB);
        if let Some(query) = self.filter() {
            request = request.filter(query.build()?);
        }
        Ok(Request::Enumerate(request))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        JOB_FIELDS.parse_all(response, job)
    }
}

/// Look up one job by id. Filtering happens on the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetJob {
    /// Job id, e.g. `JID_442507917525`.
    pub id: String,
}

impl Command for GetJob {
    type Output = Option<Job>;

    fn request(&self) -> Result<Request> {
        let query = FilterQuery::select_all("DCIM_LifecycleJob")
            .equals("InstanceID", self.id.as_str())
            .build()?;
        Ok(Request::Enumerate(
            EnumerateRequest::new(DCIM_LIFECYCLE_JOB).filter(query),
        ))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        JOB_FIELDS.parse_first(response, job)
    }
}

/// The service instance and device a configuration job applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTarget {
    /// Resource URI of the configuration service, e.g. [`DCIM_BIOS_SERVICE`].
    pub resource_uri: String,
    /// `CreationClassName` selector of the service.
    pub cim_creation_class_name: String,
    /// `Name` selector of the service.
    pub cim_name: String,
    /// FQDD of the configured device, e.g. `BIOS.Setup.1-1`.
    pub target: String,
    /// `SystemCreationClassName` selector.
    pub cim_system_creation_class_name: String,
    /// `SystemName` selector.
    pub cim_system_name: String,
}

impl ConfigTarget {
    /// A target on the default computer system.
    pub fn new(
        resource_uri: impl Into<String>,
        cim_creation_class_name: impl Into<String>,
        cim_name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            resource_uri: resource_uri.into(),
            cim_creation_class_name: cim_creation_class_name.into(),
            cim_name: cim_name.into(),
            target: target.into(),
            cim_system_creation_class_name: "DCIM_ComputerSystem".to_owned(),
            cim_system_name: "DCIM:ComputerSystem".to_owned(),
        }
    }

    /// The BIOS configuration service.
    pub fn bios() -> Self {
        Self::new(DCIM_BIOS_SERVICE, "DCIM_BIOSService", "DCIM:BIOSService", "BIOS.Setup.1-1")
    }

    pub(crate) fn invoke(&self, method: &str) -> InvokeRequest {
        InvokeRequest::new(self.resource_uri.as_str(), method)
            .selector("CreationClassName", self.cim_creation_class_name.as_str())
            .selector("Name", self.cim_name.as_str())
            .selector(
                "SystemCreationClassName",
                self.cim_system_creation_class_name.as_str(),
            )
            .selector("SystemName", self.cim_system_name.as_str())
            .property("Target", self.target.as_str())
    }
}

/// `CreateTargetedConfigJob`: apply pending configuration. Returns the new job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateConfigJob {
    /// What to apply.
    pub target: ConfigTarget,
    /// Ask the controller to reboot the host to run the job.
    pub reboot: bool,
}

/// `RebootJobType` for a graceful reboot with forced shutdown fallback.
const REBOOT_JOB_TYPE: &str = "3";

impl Command for CreateConfigJob {
    type Output = String;

    fn request(&self) -> Result<Request> {
        let mut request = self
            .target
            .invoke("CreateTargetedConfigJob")
            .property("ScheduledStartTime", "TIME_NOW")
            .expect_return_value(RET_CREATED);
        if self.reboot {
            request = request.property("RebootJobType", REBOOT_JOB_TYPE);
        }
        Ok(Request::Invoke(request))
    }

    fn parse_response(&self, response: &Element) -> Result<Self::Output> {
        response
            .find_all(WSMAN, "Selector")
            .into_iter()
            .find(|s| s.attribute("Name") == Some("InstanceID"))
            .map(|s| s.text().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::malformed("CreateTargetedConfigJob response has no job id"))
    }
}

/// `DeletePendingConfiguration`: drop staged configuration changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePendingConfig {
    /// What to discard.
    pub target: ConfigTarget,
}

impl Command for DeletePendingConfig {
    type Output = ();

    fn request(&self) -> Result<Request> {
        Ok(Request::Invoke(
            self.target
                .invoke("DeletePendingConfiguration")
                .expect_return_value(RET_SUCCESS),
        ))
    }

    fn parse_response(&self, _response: &Element) -> Result<Self::Output> {
        Ok(())
    }
}

/// Job id that clears the whole job queue.
pub const JID_CLEARALL: &str = "JID_CLEARALL";

/// `DCIM_JobService.DeleteJobQueue`: remove one job from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteJobQueue {
    /// Job id to delete; [`JID_CLEARALL`] deletes every job.
    pub job_id: String,
}

impl Command for DeleteJobQueue {
    type Output = ();

    fn request(&self) -> Result<Request> {
        if self.job_id.trim().is_empty() {
            return Err(Error::invalid("job id is required"));
        }
        Ok(Request::Invoke(
            InvokeRequest::new(DCIM_JOB_SERVICE, "DeleteJobQueue")
                .selector("CreationClassName", "DCIM_JobService")
                .selector("Name", "JobService")
                .selector("SystemCreationClassName", "DCIM_ComputerSystem")
                .selector("SystemName", "idrac")
                .property("JobID", self.job_id.as_str())
                .expect_return_value(RET_SUCCESS),
        ))
    }

    fn parse_response(&self, _response: &Element) -> Result<Self::Output> {
        Ok(())
    }
}
