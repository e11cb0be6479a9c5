//! Family-specific orchestration strategies.
//!
//! One strategy per hardware family, selected once by [`strategy_for`] at
//! orchestrator construction and never re-resolved. Strategies only branch
//! where families actually differ: the pre-start sequence and the ticket
//! rewrite.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cdm::CopyMode;
use crate::family::Family;
use crate::job::{JobAction, JobState, JobSubStatus};
use crate::ticket::TicketPayload;

use super::runner::CopyOrchestrator;
use super::types::CopyError;

/// Scan resolution every enterprise device captures at.
const ENTERPRISE_RESOLUTION: &str = "e600Dpi";

/// Behavior variant for one hardware family.
#[async_trait]
pub(crate) trait FamilyStrategy: Send + Sync {
    /// Family this strategy drives.
    fn family(&self) -> Family;

    /// Family-specific payload rewrite applied during ticket creation.
    fn rewrite_ticket(&self, _payload: &mut TicketPayload) {}

    /// Drive the pre-start sequence and issue the final start transition,
    /// returning its device status code.
    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        ticket_id: &str,
        preview_reps: u32,
    ) -> Result<u16, CopyError>;
}

/// Select the strategy for a family. Closed set, resolved exactly once.
pub(crate) fn strategy_for(family: Family) -> Box<dyn FamilyStrategy> {
    match family {
        Family::Enterprise => Box::new(EnterpriseStrategy),
        Family::DesignJet => Box::new(DesignJetStrategy),
        Family::HomePro => Box::new(HomeProStrategy),
        Family::Beam => Box::new(BeamStrategy),
        Family::Generic => Box::new(GenericStrategy),
    }
}

/// Base behavior shared by families without their own start sequence.
struct GenericStrategy;

#[async_trait]
impl FamilyStrategy for GenericStrategy {
    fn family(&self) -> Family {
        Family::Generic
    }

    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        _ticket_id: &str,
        preview_reps: u32,
    ) -> Result<u16, CopyError> {
        orchestrator.preview_start(job_id, preview_reps).await?;

        if preview_reps == 0 {
            return orchestrator.change_job_state(job_id, JobAction::Start).await;
        }

        orchestrator.settle().await;
        let start_status = orchestrator.change_job_state(job_id, JobAction::Start).await?;

        if orchestrator.flags().await.feeder_missing() {
            orchestrator.answer_flatbed_add_page().await?;
        } else {
            info!("ADF loaded, no flatbed page needed");
        }

        Ok(start_status)
    }
}

/// Enterprise devices capture at a fixed resolution and only raise the
/// flatbed alert for duplex output on non-preview jobs.
struct EnterpriseStrategy;

#[async_trait]
impl FamilyStrategy for EnterpriseStrategy {
    fn family(&self) -> Family {
        Family::Enterprise
    }

    fn rewrite_ticket(&self, payload: &mut TicketPayload) {
        if let Some(scan) = payload.src.as_mut().map(|src| &mut src.scan) {
            if scan.resolution.is_some() {
                scan.resolution = Some(ENTERPRISE_RESOLUTION.to_string());
            }
        }
    }

    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        _ticket_id: &str,
        preview_reps: u32,
    ) -> Result<u16, CopyError> {
        orchestrator.preview_start(job_id, preview_reps).await?;

        orchestrator.settle().await;
        let start_status = orchestrator.change_job_state(job_id, JobAction::Start).await?;

        let flags = orchestrator.flags().await;
        let wants_flatbed_page = if preview_reps == 0 {
            flags.feeder_missing() && flags.output_duplex
        } else {
            flags.feeder_missing()
        };

        if wants_flatbed_page {
            orchestrator.answer_flatbed_add_page().await?;
        } else {
            info!("ADF loaded, no flatbed page needed");
        }

        Ok(start_status)
    }
}

/// DesignJet devices split job-build tickets into two independently driven
/// segments: scan/build first, then print.
struct DesignJetStrategy;

#[async_trait]
impl FamilyStrategy for DesignJetStrategy {
    fn family(&self) -> Family {
        Family::DesignJet
    }

    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        ticket_id: &str,
        _preview_reps: u32,
    ) -> Result<u16, CopyError> {
        orchestrator.preview_start(job_id, 0).await?;

        // Detection is best-effort: an unanswerable question means single
        // segment, not a failed job.
        let two_segment = if ticket_id.is_empty() {
            false
        } else {
            match orchestrator.two_segment_pipeline(ticket_id).await {
                Ok(two_segment) => two_segment,
                Err(e) => {
                    debug!(ticket_id, "two-segment detection inconclusive: {}", e);
                    false
                }
            }
        };

        if two_segment {
            let status = orchestrator
                .change_job_state(job_id, JobAction::PrepareProcessing)
                .await?;
            if status != 200 {
                return Err(CopyError::state_transition(
                    JobAction::PrepareProcessing,
                    status,
                ));
            }

            orchestrator
                .wait_for_state(job_id, &[JobState::Processing])
                .await?;
            orchestrator.wait_all_previews_done(job_id).await?;

            if orchestrator.copy_configuration().await?.copy_mode == CopyMode::PrintWhileScanning {
                info!("copy mode is printWhileScanning, waiting for print start to finish job");
                orchestrator
                    .wait_for_processing_sub_status(job_id, JobSubStatus::Printing)
                    .await?;
            }
        }

        orchestrator.change_job_state(job_id, JobAction::Start).await
    }
}

/// HomePro devices follow the base sequence.
struct HomeProStrategy;

#[async_trait]
impl FamilyStrategy for HomeProStrategy {
    fn family(&self) -> Family {
        Family::HomePro
    }

    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        ticket_id: &str,
        preview_reps: u32,
    ) -> Result<u16, CopyError> {
        GenericStrategy
            .start(orchestrator, job_id, ticket_id, preview_reps)
            .await
    }
}

/// Beam refinement of HomePro. No divergent behavior yet; kept as its own
/// strategy so product-specific handling has a seat when it appears.
struct BeamStrategy;

#[async_trait]
impl FamilyStrategy for BeamStrategy {
    fn family(&self) -> Family {
        Family::Beam
    }

    async fn start(
        &self,
        orchestrator: &CopyOrchestrator,
        job_id: &str,
        ticket_id: &str,
        preview_reps: u32,
    ) -> Result<u16, CopyError> {
        GenericStrategy
            .start(orchestrator, job_id, ticket_id, preview_reps)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_covers_every_family() {
        for family in [
            Family::Enterprise,
            Family::DesignJet,
            Family::HomePro,
            Family::Beam,
            Family::Generic,
        ] {
            assert_eq!(strategy_for(family).family(), family);
        }
    }

    #[test]
    fn test_enterprise_rewrite_overrides_requested_resolution() {
        let mut payload = TicketPayload::default().with_resolution("e300Dpi");
        EnterpriseStrategy.rewrite_ticket(&mut payload);
        assert_eq!(
            payload.scan().unwrap().resolution.as_deref(),
            Some("e600Dpi")
        );
    }

    #[test]
    fn test_enterprise_rewrite_leaves_absent_resolution() {
        let mut payload = TicketPayload::default().with_copies(1);
        EnterpriseStrategy.rewrite_ticket(&mut payload);
        assert!(payload.scan().is_none());
    }

    #[test]
    fn test_generic_rewrite_is_identity() {
        let mut payload = TicketPayload::default().with_resolution("e300Dpi");
        GenericStrategy.rewrite_ticket(&mut payload);
        assert_eq!(
            payload.scan().unwrap().resolution.as_deref(),
            Some("e300Dpi")
        );
    }
}
