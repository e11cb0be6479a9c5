//! Types for the copy orchestrator.

use std::time::Duration;

use thiserror::Error;

use crate::cdm::CdmError;
use crate::job::JobAction;

/// Errors that can occur while orchestrating a copy job.
#[derive(Debug, Error)]
pub enum CopyError {
    /// The device rejected a payload.
    #[error("payload rejected: {0}")]
    Validation(String),

    /// Communication with the device failed.
    #[error("device communication failed: {0}")]
    Transport(String),

    /// The device returned a non-success status for an expected transition.
    #[error("{action} -> {target} returned status {status}")]
    StateTransition {
        action: &'static str,
        target: &'static str,
        status: u16,
    },

    /// A polling or alert wait exceeded its bound.
    #[error("timed out waiting for {what} after {waited:?}")]
    Timeout { what: String, waited: Duration },
}

impl CopyError {
    /// Build a state-transition error for a failed action.
    pub(crate) fn state_transition(action: JobAction, status: u16) -> Self {
        CopyError::StateTransition {
            action: action.action_name(),
            target: action.target_state(),
            status,
        }
    }
}

impl From<CdmError> for CopyError {
    fn from(err: CdmError) -> Self {
        match err {
            CdmError::Rejected(msg) => CopyError::Validation(msg),
            CdmError::Timeout { what, waited } => CopyError::Timeout { what, waited },
            other => CopyError::Transport(other.to_string()),
        }
    }
}

/// Why two-segment pipeline detection could not reach a verdict.
///
/// A `false` verdict means the ticket confirmed a single-segment pipeline;
/// an error means the question could not be answered. Callers decide
/// whether to default to single-segment.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("ticket fetch failed: {0}")]
    Fetch(#[from] CdmError),

    #[error("ticket {0} does not declare a scan capture mode")]
    MissingCaptureMode(String),
}

/// Side-products of ticket normalization, read back during the start
/// sequence to decide alert handling.
///
/// `adf_loaded` stays `None` until normalization observes a media source;
/// alert waits only trigger on an explicit `Some(false)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFlags {
    /// Whether the automatic document feeder is loaded. `Some(false)` when
    /// the ticket selected the flatbed.
    pub adf_loaded: Option<bool>,
    /// Input side is duplex.
    pub input_duplex: bool,
    /// Output side is duplex.
    pub output_duplex: bool,
}

impl TicketFlags {
    /// True only when normalization recorded the feeder as not loaded.
    pub fn feeder_missing(&self) -> bool {
        self.adf_loaded == Some(false)
    }
}
