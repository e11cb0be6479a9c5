//! Family-specific behavior integration tests.
//!
//! Covers the enterprise resolution override and alert gating, the
//! designjet two-segment pipeline, and the homepro/beam fallthrough to the
//! base sequence.

use std::sync::Arc;

use copykit_core::alert::{FLATBED_ADD_PAGE, RESPONSE_SCAN_DONE};
use copykit_core::cdm::endpoints;
use copykit_core::testing::{
    fixtures, MockAlertChannel, MockDeviceEndpoints, MockJobManager, MockTicketStore,
};
use copykit_core::{
    AlertChannel, CopyError, CopyOrchestrator, CreateJobRequest, DeviceEndpoints, Family,
    JobAction, JobManager, JobState, JobSubStatus, OrchestratorConfig, TicketPayload, TicketStore,
};

struct TestHarness {
    tickets: Arc<MockTicketStore>,
    jobs: Arc<MockJobManager>,
    alerts: Arc<MockAlertChannel>,
    device: Arc<MockDeviceEndpoints>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            tickets: Arc::new(MockTicketStore::new()),
            jobs: Arc::new(MockJobManager::new()),
            alerts: Arc::new(MockAlertChannel::new()),
            device: Arc::new(MockDeviceEndpoints::new()),
        }
    }

    fn orchestrator(&self, family: Family) -> CopyOrchestrator {
        let config = OrchestratorConfig {
            ready_poll_interval_ms: 1,
            settle_delay_ms: 1,
        };
        CopyOrchestrator::new(
            config,
            family,
            Arc::clone(&self.tickets) as Arc<dyn TicketStore>,
            Arc::clone(&self.jobs) as Arc<dyn JobManager>,
            Arc::clone(&self.alerts) as Arc<dyn AlertChannel>,
            Arc::clone(&self.device) as Arc<dyn DeviceEndpoints>,
        )
    }

    async fn ready_job(&self, orchestrator: &CopyOrchestrator, ticket_id: &str) -> String {
        let job_id = orchestrator
            .create_job(CreateJobRequest::new(ticket_id))
            .await
            .expect("Failed to create job");
        self.jobs.set_job_state(&job_id, JobState::Ready).await;
        job_id
    }
}

// =============================================================================
// Enterprise
// =============================================================================

#[tokio::test]
async fn test_enterprise_overrides_requested_resolution() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    let payload = TicketPayload::default().with_resolution("e300Dpi");
    let ticket_id = orchestrator.create_ticket(payload).await.unwrap();

    let info = harness.tickets.get_info(&ticket_id).await.unwrap();
    assert_eq!(info.scan().unwrap().resolution.as_deref(), Some("e600Dpi"));
}

#[tokio::test]
async fn test_enterprise_keeps_resolution_absent() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    let ticket_id = orchestrator
        .create_ticket(fixtures::color_copies_payload())
        .await
        .unwrap();

    let info = harness.tickets.get_info(&ticket_id).await.unwrap();
    assert!(info.scan().unwrap().resolution.is_none());
}

#[tokio::test]
async fn test_enterprise_answers_flatbed_alert_for_duplex_flatbed_job() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    let ticket_id = orchestrator
        .create_ticket(fixtures::flatbed_duplex_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;
    harness.alerts.raise(fixtures::flatbed_add_page_alert()).await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);

    assert_eq!(
        harness.alerts.responses().await,
        vec![(FLATBED_ADD_PAGE.to_string(), RESPONSE_SCAN_DONE.to_string())]
    );
}

#[tokio::test]
async fn test_enterprise_skips_alert_for_simplex_output() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    // Flatbed capture but simplex output: no alert handling without
    // previews.
    let payload = TicketPayload::default().with_scan_media_source("flatbed");
    let ticket_id = orchestrator.create_ticket(payload).await.unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();

    assert!(harness.alerts.waited_categories().await.is_empty());
}

#[tokio::test]
async fn test_enterprise_with_previews_gates_only_on_feeder() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    // Simplex output, but previews requested: feeder state alone decides.
    let payload = TicketPayload::default().with_scan_media_source("flatbed");
    let ticket_id = orchestrator.create_ticket(payload).await.unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;
    harness.alerts.raise(fixtures::flatbed_add_page_alert()).await;

    orchestrator.start_job(&job_id, &ticket_id, 1).await.unwrap();

    assert_eq!(
        harness.alerts.responses().await,
        vec![(FLATBED_ADD_PAGE.to_string(), RESPONSE_SCAN_DONE.to_string())]
    );
}

#[tokio::test]
async fn test_enterprise_swallows_alert_timeout() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    let ticket_id = orchestrator
        .create_ticket(fixtures::flatbed_duplex_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    // No alert raised: hardware without the alert must not fail the job.
    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);

    assert_eq!(
        harness.alerts.waited_categories().await,
        vec![FLATBED_ADD_PAGE.to_string()]
    );
    assert!(harness.alerts.responses().await.is_empty());
}

#[tokio::test]
async fn test_start_without_prior_ticket_skips_alert_handling() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    // No create_ticket in this orchestrator lifetime: flags stay at their
    // defaults and no alert wait happens.
    let job_id = harness.ready_job(&orchestrator, "ticket-elsewhere").await;

    let status = orchestrator.start_job(&job_id, "", 0).await.unwrap();
    assert_eq!(status, 200);
    assert!(harness.alerts.waited_categories().await.is_empty());
}

// =============================================================================
// Generic
// =============================================================================

#[tokio::test]
async fn test_generic_without_previews_skips_alert_handling() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Generic);

    let ticket_id = orchestrator
        .create_ticket(fixtures::flatbed_duplex_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();

    assert!(harness.alerts.waited_categories().await.is_empty());
}

#[tokio::test]
async fn test_generic_with_previews_answers_flatbed_alert() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Generic);

    let ticket_id = orchestrator
        .create_ticket(fixtures::flatbed_duplex_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;
    harness.alerts.raise(fixtures::flatbed_add_page_alert()).await;

    orchestrator.start_job(&job_id, &ticket_id, 2).await.unwrap();

    assert_eq!(harness.jobs.action_count(&job_id, JobAction::Preview).await, 2);
    assert_eq!(
        harness.alerts.responses().await,
        vec![(FLATBED_ADD_PAGE.to_string(), RESPONSE_SCAN_DONE.to_string())]
    );
}

// =============================================================================
// DesignJet
// =============================================================================

#[tokio::test]
async fn test_designjet_single_segment_goes_straight_to_start() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    let ticket_id = orchestrator
        .create_ticket(TicketPayload::default().with_scan_capture_mode("standard"))
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);

    let actions = harness.jobs.actions_for(&job_id).await;
    assert_eq!(actions, vec![JobAction::Initialize, JobAction::Start]);
}

#[tokio::test]
async fn test_designjet_inconclusive_detection_defaults_to_single_segment() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    // No scanCaptureMode on the ticket: detection cannot answer, the job
    // must still run as single segment.
    let ticket_id = orchestrator
        .create_ticket(fixtures::color_copies_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(
        harness.jobs.action_count(&job_id, JobAction::PrepareProcessing).await,
        0
    );
}

#[tokio::test]
async fn test_designjet_empty_ticket_id_skips_detection() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    let job_id = harness.ready_job(&orchestrator, "unused").await;

    let status = orchestrator.start_job(&job_id, "", 0).await.unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_designjet_two_segment_flow() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    harness
        .device
        .set(
            endpoints::COPY_CONFIGURATION,
            fixtures::copy_configuration("printAfterScanning"),
        )
        .await;

    let ticket_id = orchestrator
        .create_ticket(fixtures::job_build_payload())
        .await
        .unwrap();
    let job_id = orchestrator
        .create_job(CreateJobRequest::new(&ticket_id))
        .await
        .unwrap();
    // Ready for the pre-start poll, processing once the first segment runs.
    harness
        .jobs
        .push_state_sequence(&job_id, vec![JobState::Ready, JobState::Processing])
        .await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);

    let actions = harness.jobs.actions_for(&job_id).await;
    assert_eq!(
        actions,
        vec![
            JobAction::Initialize,
            JobAction::PrepareProcessing,
            JobAction::Start,
        ]
    );
    assert_eq!(harness.jobs.preview_waits().await, vec![job_id]);
    // Indirect copy mode: no sub-status wait.
    assert!(harness.jobs.sub_status_waits().await.is_empty());
}

#[tokio::test]
async fn test_designjet_print_while_scanning_waits_for_printing() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    harness
        .device
        .set(
            endpoints::COPY_CONFIGURATION,
            fixtures::copy_configuration("printWhileScanning"),
        )
        .await;

    let ticket_id = orchestrator
        .create_ticket(fixtures::job_build_payload())
        .await
        .unwrap();
    let job_id = orchestrator
        .create_job(CreateJobRequest::new(&ticket_id))
        .await
        .unwrap();
    harness
        .jobs
        .push_state_sequence(&job_id, vec![JobState::Ready, JobState::Processing])
        .await;

    orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();

    assert_eq!(
        harness.jobs.sub_status_waits().await,
        vec![(job_id, JobSubStatus::Printing)]
    );
}

#[tokio::test]
async fn test_designjet_prepare_failure_is_state_transition_error() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    let ticket_id = orchestrator
        .create_ticket(fixtures::job_build_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;
    harness
        .jobs
        .set_action_status(JobAction::PrepareProcessing, 500)
        .await;

    let result = orchestrator.start_job(&job_id, &ticket_id, 0).await;
    match result {
        Err(CopyError::StateTransition { action, status, .. }) => {
            assert_eq!(action, "Prepare_Processing");
            assert_eq!(status, 500);
        }
        other => panic!("Expected StateTransition error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_designjet_unfinished_previews_is_timeout() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::DesignJet);

    let ticket_id = orchestrator
        .create_ticket(fixtures::job_build_payload())
        .await
        .unwrap();
    let job_id = orchestrator
        .create_job(CreateJobRequest::new(&ticket_id))
        .await
        .unwrap();
    harness
        .jobs
        .push_state_sequence(&job_id, vec![JobState::Ready, JobState::Processing])
        .await;
    harness.jobs.set_previews_done(false).await;

    let result = orchestrator.start_job(&job_id, &ticket_id, 0).await;
    match result {
        Err(CopyError::Timeout { what, .. }) => assert_eq!(what, "preview sub-jobs"),
        other => panic!("Expected Timeout error, got {:?}", other),
    }
}

// =============================================================================
// HomePro and Beam
// =============================================================================

#[tokio::test]
async fn test_homepro_follows_base_sequence() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::HomePro);

    let ticket_id = orchestrator
        .create_ticket(fixtures::color_copies_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(
        harness.jobs.actions_for(&job_id).await,
        vec![JobAction::Initialize, JobAction::Start]
    );
}

#[tokio::test]
async fn test_beam_follows_base_sequence() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Beam);

    let ticket_id = orchestrator
        .create_ticket(fixtures::color_copies_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;

    let status = orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_beam_resolved_from_product_name() {
    let harness = TestHarness::new();
    harness
        .device
        .set(
            endpoints::SYSTEM_IDENTITY,
            fixtures::identity("homepro", "HomePro Beam 500"),
        )
        .await;

    let orchestrator = CopyOrchestrator::discover(
        OrchestratorConfig::default(),
        Arc::clone(&harness.tickets) as Arc<dyn TicketStore>,
        Arc::clone(&harness.jobs) as Arc<dyn JobManager>,
        Arc::clone(&harness.alerts) as Arc<dyn AlertChannel>,
        Arc::clone(&harness.device) as Arc<dyn DeviceEndpoints>,
    )
    .await
    .unwrap();

    assert_eq!(orchestrator.family(), Family::Beam);
}

// =============================================================================
// Resolution immutability
// =============================================================================

#[tokio::test]
async fn test_family_is_fixed_for_orchestrator_lifetime() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator(Family::Enterprise);

    assert_eq!(orchestrator.family(), Family::Enterprise);

    // Driving jobs does not re-resolve the family.
    let ticket_id = orchestrator
        .create_ticket(fixtures::color_copies_payload())
        .await
        .unwrap();
    let job_id = harness.ready_job(&orchestrator, &ticket_id).await;
    orchestrator.start_job(&job_id, &ticket_id, 0).await.unwrap();

    assert_eq!(orchestrator.family(), Family::Enterprise);
}
