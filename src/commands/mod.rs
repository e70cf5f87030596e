//! Typed WS-Man commands.
//!
//! A command describes one business operation as a single enumeration or invocation
//! plus a parser for the response document. Commands do no I/O; run them with
//! `WsmanClient::execute` (or the async client).

use crate::envelope::{EnumerateRequest, InvokeRequest};
use crate::error::Result;
use crate::xml::Element;

mod bios;
mod boot;
mod job;
mod lifecycle;
mod power;

pub use bios::{BiosAttributeClass, ListBiosAttributes, SetBiosAttributes};
pub use boot::{BootModeSource, ChangeBootOrder, ListBootDevices, ListBootModes};
pub use job::{
    ConfigTarget, CreateConfigJob, DeleteJobQueue, DeletePendingConfig, GetJob, JID_CLEARALL, ListJobs,
};
pub use lifecycle::GetLifecycleControllerVersion;
pub use power::{GetPowerState, RequestStateChange};

/// The request a command sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// List instances of a class.
    Enumerate(EnumerateRequest),
    /// Call a method on an instance.
    Invoke(InvokeRequest),
}

/// A typed WS-Man command (single logical request/response).
pub trait Command {
    /// Parsed output type.
    type Output;

    /// Build the request. Fails on invalid arguments, before anything is sent.
    fn request(&self) -> Result<Request>;

    /// Parse the response document into the typed output.
    ///
    /// For invocations the client has already validated the return code.
    fn parse_response(&self, response: &Element) -> Result<Self::Output>;
}
