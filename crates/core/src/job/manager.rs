//! Job manager collaborator trait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::cdm::CdmError;

use super::{JobAction, JobInfo, JobState, JobSubStatus};

/// Extra request headers forwarded to job calls (e.g. session tokens).
pub type JobHeaders = HashMap<String, String>;

/// Request to create a job from a ticket.
#[derive(Debug, Clone)]
pub struct CreateJobRequest {
    /// Ticket the job is created from. Consumed exactly once.
    pub ticket_id: String,
    /// Whether the device should start the job without explicit transitions.
    pub autostart: bool,
    /// Session id for priority mode, empty when unused.
    pub priority_session_id: String,
    /// Extra request headers.
    pub headers: Option<JobHeaders>,
}

impl CreateJobRequest {
    /// Create a request with default options.
    pub fn new(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            autostart: false,
            priority_session_id: String::new(),
            headers: None,
        }
    }

    /// Enable autostart.
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Set the priority mode session id.
    pub fn with_priority_session(mut self, session_id: impl Into<String>) -> Self {
        self.priority_session_id = session_id.into();
        self
    }

    /// Attach extra request headers.
    pub fn with_headers(mut self, headers: JobHeaders) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Trait for the device's job manager.
///
/// State-change and cancel calls return the device status code unchanged,
/// including non-success codes; only communication failures are errors.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Bound for waits on the job reaching its ready state.
    fn wait_start_timeout(&self) -> Duration;

    /// Create a job from a ticket and return its identifier.
    async fn create_job(&self, request: CreateJobRequest) -> Result<String, CdmError>;

    /// Fetch current job details.
    async fn job_info(
        &self,
        job_id: &str,
        headers: Option<&JobHeaders>,
    ) -> Result<JobInfo, CdmError>;

    /// Request a state change and return the device status code.
    async fn change_state(
        &self,
        job_id: &str,
        action: JobAction,
        headers: Option<&JobHeaders>,
    ) -> Result<u16, CdmError>;

    /// Cancel a job and return the device status code.
    async fn cancel(&self, job_id: &str, headers: Option<&JobHeaders>) -> Result<u16, CdmError>;

    /// Block until the job reaches one of `states`, returning the state
    /// reached. Fails with [`CdmError::Timeout`] when the bound expires.
    async fn wait_for_state(
        &self,
        job_id: &str,
        states: &[JobState],
    ) -> Result<JobState, CdmError>;

    /// Block until every preview sub-job of `job_id` has finished.
    /// Returns false when the wait expired before they did.
    async fn wait_all_previews_done(&self, job_id: &str) -> Result<bool, CdmError>;

    /// Block until the job reports the given processing sub-status.
    async fn wait_for_processing_sub_status(
        &self,
        job_id: &str,
        sub_status: JobSubStatus,
    ) -> Result<(), CdmError>;
}
