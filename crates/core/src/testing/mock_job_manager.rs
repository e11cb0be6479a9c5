//! Mock job manager for testing.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cdm::CdmError;
use crate::job::{
    CreateJobRequest, JobAction, JobHeaders, JobInfo, JobManager, JobState, JobSubStatus,
};

/// Mock implementation of the [`JobManager`] trait.
///
/// Job info can be scripted as a sequence per job: each `job_info` call pops
/// the next entry and the last entry keeps repeating, which drives polling
/// loops deterministically. Status codes for state changes and cancels are
/// configurable, and every call is recorded for assertions.
#[derive(Debug)]
pub struct MockJobManager {
    wait_timeout: Duration,
    created: RwLock<Vec<CreateJobRequest>>,
    state_changes: RwLock<Vec<(String, JobAction)>>,
    cancels: RwLock<Vec<String>>,
    info_sequences: RwLock<HashMap<String, VecDeque<JobInfo>>>,
    current_info: RwLock<HashMap<String, JobInfo>>,
    action_status: RwLock<HashMap<JobAction, u16>>,
    cancel_status: RwLock<u16>,
    previews_done: RwLock<bool>,
    preview_waits: RwLock<Vec<String>>,
    sub_status_waits: RwLock<Vec<(String, JobSubStatus)>>,
    next_error: RwLock<Option<CdmError>>,
}

impl Default for MockJobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MockJobManager {
    /// Create a mock with a short wait bound suitable for tests.
    pub fn new() -> Self {
        Self {
            wait_timeout: Duration::from_millis(200),
            created: RwLock::new(Vec::new()),
            state_changes: RwLock::new(Vec::new()),
            cancels: RwLock::new(Vec::new()),
            info_sequences: RwLock::new(HashMap::new()),
            current_info: RwLock::new(HashMap::new()),
            action_status: RwLock::new(HashMap::new()),
            cancel_status: RwLock::new(200),
            previews_done: RwLock::new(true),
            preview_waits: RwLock::new(Vec::new()),
            sub_status_waits: RwLock::new(Vec::new()),
            next_error: RwLock::new(None),
        }
    }

    /// Create a mock with an explicit wait bound.
    pub fn with_wait_start_timeout(timeout: Duration) -> Self {
        Self {
            wait_timeout: timeout,
            ..Self::new()
        }
    }

    /// Get all recorded create calls.
    pub async fn created_jobs(&self) -> Vec<CreateJobRequest> {
        self.created.read().await.clone()
    }

    /// Get all recorded state changes in order.
    pub async fn state_changes(&self) -> Vec<(String, JobAction)> {
        self.state_changes.read().await.clone()
    }

    /// Actions recorded for one job, in order.
    pub async fn actions_for(&self, job_id: &str) -> Vec<JobAction> {
        self.state_changes
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == job_id)
            .map(|(_, action)| *action)
            .collect()
    }

    /// Number of times an action was issued for a job.
    pub async fn action_count(&self, job_id: &str, action: JobAction) -> usize {
        self.actions_for(job_id)
            .await
            .into_iter()
            .filter(|a| *a == action)
            .count()
    }

    /// Get all recorded cancel calls.
    pub async fn cancelled_jobs(&self) -> Vec<String> {
        self.cancels.read().await.clone()
    }

    /// Jobs whose preview sub-jobs were awaited.
    pub async fn preview_waits(&self) -> Vec<String> {
        self.preview_waits.read().await.clone()
    }

    /// Recorded sub-status waits.
    pub async fn sub_status_waits(&self) -> Vec<(String, JobSubStatus)> {
        self.sub_status_waits.read().await.clone()
    }

    /// Pin the current info for a job.
    pub async fn set_job_info(&self, job_id: impl Into<String>, info: JobInfo) {
        self.current_info.write().await.insert(job_id.into(), info);
    }

    /// Pin the current state for a job.
    pub async fn set_job_state(&self, job_id: impl Into<String>, state: JobState) {
        self.set_job_info(job_id, JobInfo::in_state(state)).await;
    }

    /// Script a sequence of job infos; the last one keeps repeating.
    pub async fn push_info_sequence(&self, job_id: impl Into<String>, infos: Vec<JobInfo>) {
        self.info_sequences
            .write()
            .await
            .insert(job_id.into(), infos.into());
    }

    /// Script a sequence of states; the last one keeps repeating.
    pub async fn push_state_sequence(&self, job_id: impl Into<String>, states: Vec<JobState>) {
        let infos = states.into_iter().map(JobInfo::in_state).collect();
        self.push_info_sequence(job_id, infos).await;
    }

    /// Status code returned for one action (default 200).
    pub async fn set_action_status(&self, action: JobAction, status: u16) {
        self.action_status.write().await.insert(action, status);
    }

    /// Status code returned by cancels (default 200).
    pub async fn set_cancel_status(&self, status: u16) {
        *self.cancel_status.write().await = status;
    }

    /// Whether preview sub-jobs report as finished (default true).
    pub async fn set_previews_done(&self, done: bool) {
        *self.previews_done.write().await = done;
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CdmError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<CdmError> {
        self.next_error.write().await.take()
    }

    async fn current_state(&self, job_id: &str) -> JobInfo {
        // Prefer the scripted sequence, falling back to pinned info.
        {
            let mut sequences = self.info_sequences.write().await;
            if let Some(queue) = sequences.get_mut(job_id) {
                if queue.len() > 1 {
                    let info = queue.pop_front().expect("non-empty queue");
                    self.current_info
                        .write()
                        .await
                        .insert(job_id.to_string(), info.clone());
                    return info;
                }
                if let Some(info) = queue.front() {
                    return info.clone();
                }
            }
        }

        self.current_info
            .read()
            .await
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| JobInfo::in_state(JobState::Created))
    }
}

#[async_trait]
impl JobManager for MockJobManager {
    fn wait_start_timeout(&self) -> Duration {
        self.wait_timeout
    }

    async fn create_job(&self, request: CreateJobRequest) -> Result<String, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.created.write().await.push(request);
        let job_id = format!("job-{}", Uuid::new_v4());
        self.current_info
            .write()
            .await
            .insert(job_id.clone(), JobInfo::in_state(JobState::Created));
        Ok(job_id)
    }

    async fn job_info(
        &self,
        job_id: &str,
        _headers: Option<&JobHeaders>,
    ) -> Result<JobInfo, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(self.current_state(job_id).await)
    }

    async fn change_state(
        &self,
        job_id: &str,
        action: JobAction,
        _headers: Option<&JobHeaders>,
    ) -> Result<u16, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.state_changes
            .write()
            .await
            .push((job_id.to_string(), action));
        Ok(self
            .action_status
            .read()
            .await
            .get(&action)
            .copied()
            .unwrap_or(200))
    }

    async fn cancel(&self, job_id: &str, _headers: Option<&JobHeaders>) -> Result<u16, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.cancels.write().await.push(job_id.to_string());
        Ok(*self.cancel_status.read().await)
    }

    async fn wait_for_state(
        &self,
        job_id: &str,
        states: &[JobState],
    ) -> Result<JobState, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let info = self.current_state(job_id).await;
        if states.contains(&info.state) {
            return Ok(info.state);
        }

        let names: Vec<&str> = states.iter().map(JobState::as_str).collect();
        Err(CdmError::timeout(
            format!("job {} to reach {:?}", job_id, names),
            self.wait_timeout,
        ))
    }

    async fn wait_all_previews_done(&self, job_id: &str) -> Result<bool, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.preview_waits.write().await.push(job_id.to_string());
        Ok(*self.previews_done.read().await)
    }

    async fn wait_for_processing_sub_status(
        &self,
        job_id: &str,
        sub_status: JobSubStatus,
    ) -> Result<(), CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.sub_status_waits
            .write()
            .await
            .push((job_id.to_string(), sub_status));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_info_sequence_repeats_last_entry() {
        let jobs = MockJobManager::new();
        jobs.push_state_sequence(
            "j-1",
            vec![JobState::Initializing, JobState::Ready],
        )
        .await;

        let first = jobs.job_info("j-1", None).await.unwrap();
        assert_eq!(first.state, JobState::Initializing);

        for _ in 0..3 {
            let info = jobs.job_info("j-1", None).await.unwrap();
            assert_eq!(info.state, JobState::Ready);
        }
    }

    #[tokio::test]
    async fn test_change_state_records_and_returns_status() {
        let jobs = MockJobManager::new();
        jobs.set_action_status(JobAction::Start, 503).await;

        let status = jobs.change_state("j-1", JobAction::Start, None).await.unwrap();
        assert_eq!(status, 503);
        assert_eq!(jobs.action_count("j-1", JobAction::Start).await, 1);

        let status = jobs
            .change_state("j-1", JobAction::Initialize, None)
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_cancel_status_configurable() {
        let jobs = MockJobManager::new();
        jobs.set_cancel_status(404).await;
        assert_eq!(jobs.cancel("gone", None).await.unwrap(), 404);
        assert_eq!(jobs.cancelled_jobs().await, vec!["gone".to_string()]);
    }

    #[tokio::test]
    async fn test_wait_for_state_times_out_on_mismatch() {
        let jobs = MockJobManager::new();
        jobs.set_job_state("j-1", JobState::Initializing).await;

        let result = jobs.wait_for_state("j-1", &[JobState::Ready]).await;
        assert!(matches!(result, Err(CdmError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let jobs = MockJobManager::new();
        jobs.set_next_error(CdmError::ConnectionFailed("down".into()))
            .await;

        assert!(jobs.job_info("j-1", None).await.is_err());
        assert!(jobs.job_info("j-1", None).await.is_ok());
    }
}
