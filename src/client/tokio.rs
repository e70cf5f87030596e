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
use crate::transport::AsyncTransport;
use crate::transport::tokio::AsyncHttpTransport;
use crate::types::{
    BiosAttribute, BiosSetResult, BootDevice, BootMode, Job, LifecycleControllerVersion,
    PowerState,
};
use crate::xml::Element;

const MODE: &str = "tokio";

impl ClientBuilder {
    /// Build an [`AsyncDracClient`].
    pub fn build_async(self) -> Result<AsyncDracClient> {
        self.build_async_wsman().map(AsyncDracClient::from_wsman)
    }

    /// Build an [`AsyncWsmanClient`] for raw enumerations and invocations.
    pub fn build_async_wsman(self) -> Result<AsyncWsmanClient> {
        let transport = AsyncHttpTransport::new(self.settings()?)?;
        Ok(AsyncWsmanClient::with_transport(transport))
    }
}

/// An async (Tokio) WS-Man client.
///
/// Mirrors the blocking `WsmanClient`.
#[derive(Clone)]
pub struct AsyncWsmanClient {
    transport: Arc<dyn AsyncTransport + Send + Sync>,
}

impl AsyncWsmanClient {
    /// Create a [`ClientBuilder`].
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Use a custom transport.
    pub fn with_transport(transport: impl AsyncTransport + Send + Sync + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Enumerate every instance of `resource_uri`, optionally filtered by a WQL query.
    pub async fn enumerate(&self, resource_uri: &str, filter_query: Option<&str>) -> Result<Element> {
        let mut request = EnumerateRequest::new(resource_uri);
        if let Some(query) = filter_query {
            request = request.filter(query);
        }
        self.enumerate_request(&request).await
    }

    /// Run an enumeration, pulling until the controller reports the end of the sequence.
    pub async fn enumerate_request(&self, request: &EnumerateRequest) -> Result<Element> {
        let mut enumeration = Enumeration::new(self.transport.url(), request);
        let mut envelope = Some(enumeration.first_envelope()?);
        let mut action = "Enumerate";

        while let Some(body) = envelope.take() {
            let call = Call {
                action,
                resource_uri: request.resource_uri(),
            };
            let start = Instant::now();
            let response = self.post(&body).await;
            observe(call, start, &response);
            envelope = enumeration.absorb(&response?)?;
            action = "Pull";
        }
        enumeration.finish()
    }

    /// Invoke a method and validate its return code.
    pub async fn invoke(&self, request: &InvokeRequest) -> Result<Element> {
        let body = invoke_body(self.transport.url(), request)?;
        let call = Call {
            action: request.method(),
            resource_uri: request.resource_uri(),
        };
        let start = Instant::now();
        let result = match self.post(&body).await {
            Ok(response) => interpret_invoke(request, &response),
            Err(err) => Err(err),
        };
        observe(call, start, &result);
        result
    }

    /// Execute a typed command (single logical request/response).
    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output> {
        let response = match command.request()? {
            Request::Enumerate(request) => self.enumerate_request(&request).await?,
            Request::Invoke(request) => self.invoke(&request).await?,
        };
        command.parse_response(&response)
    }

    async fn post(&self, body: &str) -> Result<String> {
        crate::debug::dump_xml("wsman request", body);
        let response = self.transport.post(body).await?;
        crate::debug::dump_xml("wsman response", &response);
        Ok(response)
    }
}

fn observe<T>(call: Call<'_>, start: Instant, result: &Result<T>) {
    let elapsed = start.elapsed();
    match result {
        Ok(_) => record_ok(MODE, call, elapsed),
        Err(err) => record_err(MODE, call, elapsed, err),
    }
}

/// An async (Tokio) client for Dell iDRAC power, boot, BIOS and job management.
///
/// Mirrors the blocking `DracClient`.
#[derive(Clone)]
pub struct AsyncDracClient {
    wsman: AsyncWsmanClient,
}

impl AsyncDracClient {
    /// Create a [`ClientBuilder`].
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Wrap an existing WS-Man client.
    pub fn from_wsman(wsman: AsyncWsmanClient) -> Self {
        Self { wsman }
    }

    /// Use a custom transport.
    pub fn with_transport(transport: impl AsyncTransport + Send + Sync + 'static) -> Self {
        Self::from_wsman(AsyncWsmanClient::with_transport(transport))
    }

    /// The underlying WS-Man client.
    pub fn wsman(&self) -> &AsyncWsmanClient {
        &self.wsman
    }

    /// Execute a typed command.
    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output> {
        self.wsman.execute(command).await
    }

    /// Current host power state.
    pub async fn get_power_state(&self) -> Result<PowerState> {
        self.execute(GetPowerState).await
    }

    /// Power the host on or off, or reboot it.
    pub async fn set_power_state(&self, target: PowerState) -> Result<()> {
        self.execute(RequestStateChange { target }).await
    }

    /// Boot modes and which of them is current and next.
    pub async fn list_boot_modes(&self) -> Result<Vec<BootMode>> {
        self.execute(ListBootModes).await
    }

    /// Boot devices grouped by boot mode, each group in pending boot order.
    pub async fn list_boot_devices(&self) -> Result<BTreeMap<String, Vec<BootDevice>>> {
        let version = self.get_lifecycle_controller_version().await?;
        self.execute(ListBootDevices::for_version(version)).await
    }

    /// Set the boot order of `boot_mode` to `devices` (boot device instance ids).
    pub async fn change_boot_device_order(
        &self,
        boot_mode: &str,
        devices: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.execute(ChangeBootOrder::new(boot_mode, devices)).await
    }

    /// Lifecycle Controller jobs.
    pub async fn list_jobs(&self, only_unfinished: bool) -> Result<Vec<Job>> {
        self.execute(ListJobs { only_unfinished }).await
    }

    /// Look up a job; `None` if the controller has no such job.
    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        self.execute(GetJob {
            id: job_id.to_owned(),
        })
        .await
    }

    /// Create a configuration job for `target`. Returns the new job id.
    pub async fn create_config_job(&self, target: ConfigTarget, reboot: bool) -> Result<String> {
        self.execute(CreateConfigJob { target, reboot }).await
    }

    /// Drop the pending changes of `target`.
    pub async fn delete_pending_config(&self, target: ConfigTarget) -> Result<()> {
        self.execute(DeletePendingConfig { target }).await
    }

    /// Delete jobs from the job queue, one invocation per job.
    pub async fn delete_jobs<I, S>(&self, job_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for job_id in job_ids {
            self.execute(DeleteJobQueue {
                job_id: job_id.into(),
            })
            .await?;
        }
        Ok(())
    }

    /// Apply pending BIOS changes with a configuration job. Returns the job id.
    pub async fn commit_pending_bios_changes(&self, reboot: bool) -> Result<String> {
        self.create_config_job(ConfigTarget::bios(), reboot).await
    }

    /// Discard pending BIOS changes.
    pub async fn abandon_pending_bios_changes(&self) -> Result<()> {
        self.delete_pending_config(ConfigTarget::bios()).await
    }

    /// Every BIOS attribute, keyed by name.
    pub async fn list_bios_settings(&self) -> Result<BTreeMap<String, BiosAttribute>> {
        let mut settings = BTreeMap::new();
        for class in BiosAttributeClass::ALL {
            for attribute in self.execute(ListBiosAttributes { class }).await? {
                settings.insert(attribute.name.clone(), attribute);
            }
        }
        Ok(settings)
    }

    /// Stage new BIOS attribute values after validating all of them.
    pub async fn set_bios_settings(
        &self,
        settings: BTreeMap<String, String>,
    ) -> Result<BiosSetResult> {
        let attributes = self.list_bios_settings().await?;
        match SetBiosAttributes::changes(&attributes, settings)? {
            Some(command) => self.execute(command).await,
            None => Ok(BiosSetResult {
                commit_required: false,
            }),
        }
    }

    /// Lifecycle Controller firmware version.
    pub async fn get_lifecycle_controller_version(&self) -> Result<LifecycleControllerVersion> {
        self.execute(GetLifecycleControllerVersion).await
    }
}
