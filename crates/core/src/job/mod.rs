//! Copy jobs: lifecycle states, state-change actions, and the job manager
//! collaborator.

mod manager;
mod types;

pub use manager::{CreateJobRequest, JobHeaders, JobManager};
pub use types::{JobAction, JobInfo, JobState, JobSubStatus};
