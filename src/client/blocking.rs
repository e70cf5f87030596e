use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::client::ClientBuilder;
use crate::client::core::{Enumeration, interpret_invoke, invoke_body};
use crate::commands::{
    BiosAttributeClass, ChangeBootOrder, Command, ConfigTarget, CreateConfigJob, DeleteJobQueue,
    DeletePendingConfig, GetJob, GetLifecycleControllerVersion, GetPowerState, ListBiosAttributes,
    ListBootDevices, ListBootModes, ListJobs, Request, RequestStateChange, SetBiosAttributes,
};
use crate::envelope::{EnumerateRequest, InvokeRequest, PropertyValue};
use crate::error::Result;
use crate::observe::{Call, record_err, record_ok};
use crate::transport::Transport;
use crate::transport::blocking::HttpTransport;
use crate::types::{
    BiosAttribute, BiosSetResult, BootDevice, BootMode, Job, LifecycleControllerVersion,
    PowerState,
};
use crate::xml::Element;

const MODE: &str = "blocking";

impl ClientBuilder {
    /// Build a blocking [`DracClient`].
    pub fn build(self) -> Result<DracClient> {
        self.build_wsman().map(DracClient::from_wsman)
    }

    /// Build a blocking [`WsmanClient`] for raw enumerations and invocations.
    pub fn build_wsman(self) -> Result<WsmanClient> {
        let transport = HttpTransport::new(self.settings()?)?;
        Ok(WsmanClient::with_transport(transport))
    }
}

/// A blocking WS-Man client: enumerations (with automatic paging) and invocations.
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct WsmanClient {
    transport: Arc<dyn Transport + Send + Sync>,
}

impl WsmanClient {
    /// Create a [`ClientBuilder`].
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Use a custom transport.
    pub fn with_transport(transport: impl Transport + Send + Sync + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Enumerate every instance of `resource_uri`, optionally filtered by a WQL query.
    pub fn enumerate(&self, resource_uri: &str, filter_query: Option<&str>) -> Result<Element> {
        let mut request = EnumerateRequest::new(resource_uri);
        if let Some(query) = filter_query {
            request = request.filter(query);
        }
        self.enumerate_request(&request)
    }

    /// Run an enumeration, pulling until the controller reports the end of the sequence.
    ///
    /// Pulled items are appended to the `Items` element of the first response.
    pub fn enumerate_request(&self, request: &EnumerateRequest) -> Result<Element> {
        let mut enumeration = Enumeration::new(self.transport.url(), request);
        let mut envelope = Some(enumeration.first_envelope()?);
        let mut action = "Enumerate";

        while let Some(body) = envelope.take() {
            let call = Call {
                action,
                resource_uri: request.resource_uri(),
            };
            let response = self.observed(call, || self.post(&body))?;
            envelope = enumeration.absorb(&response)?;
            action = "Pull";
        }
        enumeration.finish()
    }

    /// Invoke a method and validate its return code.
    ///
    /// The document is returned only when the return code satisfies the request's policy.
    pub fn invoke(&self, request: &InvokeRequest) -> Result<Element> {
        let body = invoke_body(self.transport.url(), request)?;
        let call = Call {
            action: request.method(),
            resource_uri: request.resource_uri(),
        };
        self.observed(call, || {
            let response = self.post(&body)?;
            interpret_invoke(request, &response)
        })
    }

    /// Execute a typed command (single logical request/response).
    pub fn execute<C: Command>(&self, command: C) -> Result<C::Output> {
        let response = match command.request()? {
            Request::Enumerate(request) => self.enumerate_request(&request)?,
            Request::Invoke(request) => self.invoke(&request)?,
        };
        command.parse_response(&response)
    }

    fn post(&self, body: &str) -> Result<String> {
        crate::debug::dump_xml("wsman request", body);
        let response = self.transport.post(body)?;
        crate::debug::dump_xml("wsman response", &response);
        Ok(response)
    }

    fn observed<T>(&self, call: Call<'_>, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        match &result {
            Ok(_) => record_ok(MODE, call, elapsed),
            Err(err) => record_err(MODE, call, elapsed, err),
        }
        result
    }
}

/// A blocking client for Dell iDRAC power, boot, BIOS and job management.
#[derive(Clone)]
pub struct DracClient {
    wsman: WsmanClient,
}

impl DracClient {
    /// Create a [`ClientBuilder`].
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Wrap an existing WS-Man client.
    pub fn from_wsman(wsman: WsmanClient) -> Self {
        Self { wsman }
    }

    /// Use a custom transport.
    pub fn with_transport(transport: impl Transport + Send + Sync + 'static) -> Self {
        Self::from_wsman(WsmanClient::with_transport(transport))
    }

    /// The underlying WS-Man client.
    pub fn wsman(&self) -> &WsmanClient {
        &self.wsman
    }

    /// Execute a typed command.
    pub fn execute<C: Command>(&self, command: C) -> Result<C::Output> {
        self.wsman.execute(command)
    }

    /// Current host power state.
    pub fn get_power_state(&self) -> Result<PowerState> {
        self.execute(GetPowerState)
    }

    /// Power the host on or off, or reboot it.
    ///
    /// Requesting the state the host is already in succeeds without a change.
    pub fn set_power_state(&self, target: PowerState) -> Result<()> {
        self.execute(RequestStateChange { target })
    }

    /// Boot modes and which of them is current and next.
    pub fn list_boot_modes(&self) -> Result<Vec<BootMode>> {
        self.execute(ListBootModes)
    }

    /// Boot devices grouped by boot mode, each group in pending boot order.
    pub fn list_boot_devices(&self) -> Result<BTreeMap<String, Vec<BootDevice>>> {
        let version = self.get_lifecycle_controller_version()?;
        self.execute(ListBootDevices::for_version(version))
    }

    /// Set the boot order of `boot_mode` to `devices` (boot device instance ids).
    ///
    /// The change is staged; commit it with a BIOS configuration job.
    pub fn change_boot_device_order(
        &self,
        boot_mode: &str,
        devices: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.execute(ChangeBootOrder::new(boot_mode, devices))
    }

    /// Lifecycle Controller jobs, optionally only those still pending or running.
    pub fn list_jobs(&self, only_unfinished: bool) -> Result<Vec<Job>> {
        self.execute(ListJobs { only_unfinished })
    }

    /// Look up a job; `None` if the controller has no such job.
    pub fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        self.execute(GetJob {
            id: job_id.to_owned(),
        })
    }

    /// Create a configuration job applying the pending changes of `target`.
    ///
    /// Returns the new job id.
    pub fn create_config_job(&self, target: ConfigTarget, reboot: bool) -> Result<String> {
        self.execute(CreateConfigJob { target, reboot })
    }

    /// Drop the pending (uncommitted) changes of `target`.
    pub fn delete_pending_config(&self, target: ConfigTarget) -> Result<()> {
        self.execute(DeletePendingConfig { target })
    }

    /// Delete jobs from the job queue, one invocation per job, stopping at the first
    /// failure. [`crate::commands::JID_CLEARALL`] clears the whole queue.
    pub fn delete_jobs<I, S>(&self, job_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for job_id in job_ids {
            self.execute(DeleteJobQueue {
                job_id: job_id.into(),
            })?;
        }
        Ok(())
    }

    /// Apply pending BIOS changes (boot order, attributes) with a configuration job.
    ///
    /// With `reboot`, the controller reboots the host to run the job. Returns the job id.
    pub fn commit_pending_bios_changes(&self, reboot: bool) -> Result<String> {
        self.create_config_job(ConfigTarget::bios(), reboot)
    }

    /// Discard pending BIOS changes.
    pub fn abandon_pending_bios_changes(&self) -> Result<()> {
        self.delete_pending_config(ConfigTarget::bios())
    }

    /// Every BIOS attribute, keyed by name.
    pub fn list_bios_settings(&self) -> Result<BTreeMap<String, BiosAttribute>> {
        let mut settings = BTreeMap::new();
        for class in BiosAttributeClass::ALL {
            for attribute in self.execute(ListBiosAttributes { class })? {
                settings.insert(attribute.name.clone(), attribute);
            }
        }
        Ok(settings)
    }

    /// Stage new BIOS attribute values.
    ///
    /// Every value is checked against the controller's attribute list first; nothing is
    /// sent if any of them is invalid. Values equal to the effective one are skipped.
    pub fn set_bios_settings(&self, settings: BTreeMap<String, String>) -> Result<BiosSetResult> {
        let attributes = self.list_bios_settings()?;
        match SetBiosAttributes::changes(&attributes, settings)? {
            Some(command) => self.execute(command),
            None => Ok(BiosSetResult {
                commit_required: false,
            }),
        }
    }

    /// Lifecycle Controller firmware version.
    pub fn get_lifecycle_controller_version(&self) -> Result<LifecycleControllerVersion> {
        self.execute(GetLifecycleControllerVersion)
    }
}
