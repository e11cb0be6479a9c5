pub mod alert;
pub mod cdm;
pub mod config;
pub mod family;
pub mod job;
pub mod orchestrator;
pub mod testing;
pub mod ticket;

pub use alert::AlertChannel;
pub use cdm::{CdmError, CdmHttpClient, CopyConfiguration, CopyMode, DeviceEndpoints};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use family::Family;
pub use job::{CreateJobRequest, JobAction, JobInfo, JobManager, JobState, JobSubStatus};
pub use orchestrator::{
    CopyError, CopyOrchestrator, DetectionError, OrchestratorConfig, PreviewLoop, TicketFlags,
};
pub use ticket::{TicketPayload, TicketStore};
