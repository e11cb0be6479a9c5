//! Job lifecycle types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Externally-tracked state of a copy job.
///
/// State machine flow:
/// ```text
/// created -> initializing -> ready -> (preview <-> ready)* ->
///     prepareProcessing -> processing -> completed | cancelled
/// ```
///
/// `failed` is an absorbing error state reachable from any non-terminal
/// state. Transitions are driven by explicit state-change requests or by
/// device-initiated alerts; the client only ever observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Created,
    Initializing,
    Ready,
    PrepareProcessing,
    Processing,
    Completed,
    Cancelled,
    Failed,
    /// Any state this client does not model.
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Initializing => "initializing",
            JobState::Ready => "ready",
            JobState::PrepareProcessing => "prepareProcessing",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Failed => "failed",
            JobState::Unknown => "unknown",
        }
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

/// Sub-status reported while a job is in the processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobSubStatus {
    Scanning,
    Printing,
    #[serde(other)]
    Unknown,
}

impl JobSubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSubStatus::Scanning => "scanning",
            JobSubStatus::Printing => "printing",
            JobSubStatus::Unknown => "unknown",
        }
    }
}

/// A state-change request the device accepts.
///
/// Each action carries the action name and the target state the device
/// expects in the state-change call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobAction {
    Initialize,
    Preview,
    PrepareProcessing,
    Start,
    Cancel,
    Pause,
    Resume,
}

impl JobAction {
    /// The action name on the wire.
    pub fn action_name(&self) -> &'static str {
        match self {
            JobAction::Initialize => "Initialize",
            JobAction::Preview => "Preview",
            JobAction::PrepareProcessing => "Prepare_Processing",
            JobAction::Start => "Start",
            JobAction::Cancel => "Cancel",
            JobAction::Pause => "Pause",
            JobAction::Resume => "Resume",
        }
    }

    /// The target state on the wire.
    pub fn target_state(&self) -> &'static str {
        match self {
            JobAction::Initialize => "initializeProcessing",
            JobAction::Preview => "prepareProcessing",
            JobAction::PrepareProcessing => "prepareProcessing",
            JobAction::Start => "startProcessing",
            JobAction::Cancel => "cancelProcessing",
            JobAction::Pause => "pauseProcessing",
            JobAction::Resume => "resumeProcessing",
        }
    }
}

/// Job details as reported by the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<JobSubStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobInfo {
    /// A minimal info in the given state, without sub-status.
    pub fn in_state(state: JobState) -> Self {
        Self {
            state,
            sub_status: None,
            extra: Map::new(),
        }
    }

    /// A processing info with the given sub-status.
    pub fn processing_with(sub_status: JobSubStatus) -> Self {
        Self {
            state: JobState::Processing,
            sub_status: Some(sub_status),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&JobState::PrepareProcessing).unwrap(),
            "\"prepareProcessing\""
        );
        assert_eq!(serde_json::to_string(&JobState::Ready).unwrap(), "\"ready\"");
    }

    #[test]
    fn test_job_state_unknown_fallback() {
        let state: JobState = serde_json::from_str("\"mysteryState\"").unwrap();
        assert_eq!(state, JobState::Unknown);
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Ready.is_terminal());
    }

    #[test]
    fn test_action_wire_pairs() {
        assert_eq!(JobAction::Initialize.action_name(), "Initialize");
        assert_eq!(JobAction::Initialize.target_state(), "initializeProcessing");
        assert_eq!(JobAction::Preview.action_name(), "Preview");
        assert_eq!(JobAction::Preview.target_state(), "prepareProcessing");
        assert_eq!(
            JobAction::PrepareProcessing.action_name(),
            "Prepare_Processing"
        );
        assert_eq!(JobAction::Start.target_state(), "startProcessing");
        assert_eq!(JobAction::Cancel.target_state(), "cancelProcessing");
    }

    #[test]
    fn test_job_info_deserializes_device_payload() {
        let json = r#"{"state":"processing","subStatus":"printing","jobId":"j-1","pagesScanned":3}"#;
        let info: JobInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.state, JobState::Processing);
        assert_eq!(info.sub_status, Some(JobSubStatus::Printing));
        assert_eq!(info.extra["pagesScanned"], 3);
    }
}
