//! Device CDM interface: shared error type, endpoint paths, and the
//! device-wide configuration resources that are not scoped to any job.

mod http;

pub use http::CdmHttpClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by CDM collaborators (ticket store, job manager, alert
/// channel, device endpoints).
#[derive(Debug, Error)]
pub enum CdmError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("timed out waiting for {what} after {waited:?}")]
    Timeout { what: String, waited: Duration },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl CdmError {
    /// Build a timeout error for a named wait.
    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        CdmError::Timeout {
            what: what.into(),
            waited,
        }
    }
}

/// CDM endpoint paths used by the HTTP client and by generic get/put callers.
pub mod endpoints {
    /// Device-wide copy configuration (copy mode, interrupt policy).
    pub const COPY_CONFIGURATION: &str = "/cdm/copy/v1/configuration";
    /// Job ticket collection.
    pub const JOB_TICKETS: &str = "/cdm/jobTicket/v1/tickets";
    /// Ticket configuration defaults, keyed by ticket type.
    pub const TICKET_CONFIGURATION_DEFAULTS: &str = "/cdm/jobTicket/v1/configurationDefaults";
    /// Job collection.
    pub const JOBS: &str = "/cdm/jobManagement/v1/jobs";
    /// Active alert collection.
    pub const ALERTS: &str = "/cdm/eventing/v1/alerts";
    /// One-time device identity fetch (family and product names).
    pub const SYSTEM_IDENTITY: &str = "/cdm/system/v1/identity";
}

/// Raw access to CDM endpoints for resources without a dedicated trait,
/// such as the copy configuration and alert action links.
#[async_trait]
pub trait DeviceEndpoints: Send + Sync {
    /// GET an endpoint and return its JSON body.
    async fn get(&self, endpoint: &str) -> Result<Value, CdmError>;

    /// PUT a JSON payload to an endpoint.
    async fn put(&self, endpoint: &str, payload: &Value) -> Result<(), CdmError>;
}

/// Device-reported identity, fetched once when resolving the family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub product_name: String,
}

/// Device-wide copy mode.
///
/// `Undefined` is what devices without copy-mode support report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyMode {
    #[serde(rename = "printAfterScanning")]
    PrintAfterScanning,
    #[serde(rename = "printWhileScanning")]
    PrintWhileScanning,
    #[default]
    #[serde(rename = "_undefined_")]
    Undefined,
}

/// Snapshot of the device-wide copy settings, independent of any single job.
///
/// The interrupt flag is a string boolean on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyConfiguration {
    #[serde(default)]
    pub copy_mode: CopyMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_interrupt: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CopyConfiguration {
    /// Whether the device supports a copy mode at all.
    pub fn copy_mode_supported(&self) -> bool {
        self.copy_mode != CopyMode::Undefined
    }

    /// Whether interrupting copy jobs is currently allowed.
    pub fn allow_interrupt_active(&self) -> bool {
        self.allow_interrupt.as_deref() == Some("true")
    }
}
