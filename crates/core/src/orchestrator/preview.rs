//! Preview loop: repeats the preview sub-state before final execution.

use std::time::Duration;

use tracing::debug;

use crate::job::{JobAction, JobState};

use super::runner::CopyOrchestrator;
use super::types::CopyError;

/// Drives a job through repeated preview iterations.
///
/// Each iteration re-enters the prepare state via a Preview action, waits a
/// settle delay, then polls the job back to ready before the next iteration
/// or the final start.
#[derive(Debug, Clone)]
pub struct PreviewLoop {
    reps: u32,
    settle_delay: Duration,
}

impl PreviewLoop {
    /// Create a loop running `reps` preview iterations.
    pub fn new(reps: u32, settle_delay: Duration) -> Self {
        Self { reps, settle_delay }
    }

    /// Number of iterations this loop will run.
    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// Run the preview iterations against a ready job.
    pub async fn run(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
    ) -> Result<(), CopyError> {
        for rep in 1..=self.reps {
            orchestrator
                .change_job_state(job_id, JobAction::Preview)
                .await?;
            tokio::time::sleep(self.settle_delay).await;
            orchestrator
                .wait_for_state(job_id, &[JobState::Ready])
                .await?;
            debug!(job_id, rep, "preview iteration returned to ready");
        }
        Ok(())
    }
}
