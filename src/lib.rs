#![deny(unsafe_code)]
#![warn(missing_docs)]

//! A WS-Management client for Dell iDRAC controllers.
//!
//! The crate covers:
//! - host power state (read, power on/off, reboot)
//! - boot modes, boot devices and boot order
//! - BIOS attributes and configuration jobs
//! - the Lifecycle Controller job queue
//!
//! [`DracClient`] is the entry point. [`WsmanClient`] exposes raw enumerations and
//! invocations for classes without a typed wrapper, and [`commands`] holds the typed
//! request/response pairs both clients run.
//!
//! ```no_run
//! # fn main() -> drac::Result<()> {
//! let client = drac::DracClient::builder("10.0.0.10")
//!     .username("root")
//!     .password("calvin")
//!     .build()?;
//! println!("{}", client.get_power_state()?);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod commands;
mod debug;
mod envelope;
mod error;
mod filter;
mod observe;
mod record;
mod return_code;
mod secret;
mod transport;
mod types;
pub mod uris;
mod xml;

pub use crate::client::{ClientBuilder, DEFAULT_PATH, DEFAULT_PORT, DEFAULT_TIMEOUT};
#[cfg(feature = "blocking")]
pub use crate::client::blocking::{DracClient, WsmanClient};
#[cfg(feature = "async")]
pub use crate::client::tokio::{AsyncDracClient, AsyncWsmanClient};
pub use crate::envelope::{DEFAULT_MAX_ELEMENTS, EnumerateRequest, InvokeRequest, PropertyValue};
pub use crate::error::{Error, Result};
pub use crate::filter::FilterQuery;
pub use crate::return_code::{Outcome, RET_CREATED, RET_ERROR, RET_SUCCESS, ReturnPolicy};
pub use crate::transport::Transport;
#[cfg(feature = "async")]
pub use crate::transport::AsyncTransport;
pub use crate::types::{
    BiosAttribute, BiosAttributeKind, BiosSetResult, BootDevice, BootMode, Job,
    LifecycleControllerVersion, PowerState,
};
pub use crate::xml::Element;
