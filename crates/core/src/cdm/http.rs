//! HTTP implementation of the CDM collaborators.
//!
//! One client implements all four collaborator traits against a live
//! device: ticket store, job manager, alert channel, and raw endpoint
//! access. Status codes from state-change and cancel calls are surfaced
//! unchanged; only communication failures become errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::alert::{AlertChannel, AlertDetail};
use crate::config::DeviceConfig;
use crate::job::{CreateJobRequest, JobAction, JobHeaders, JobInfo, JobManager, JobState, JobSubStatus};
use crate::ticket::{TicketPayload, TicketStore};

use super::{endpoints, CdmError, DeviceEndpoints};

/// Bound for waits on a job reaching its ready state.
const WAIT_START_JOB_TIMEOUT: Duration = Duration::from_secs(120);

/// Interval between polls inside wait helpers.
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bound for alert waits. Alerts that are going to be raised at all are
/// raised quickly; everything longer means the hardware does not have them.
const ALERT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// CDM client over HTTP.
pub struct CdmHttpClient {
    client: Client,
    config: DeviceConfig,
}

impl CdmHttpClient {
    /// Create a new CDM client for a device.
    pub fn new(config: DeviceConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url(), endpoint)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs as u64)
    }

    fn map_request_error(&self, e: reqwest::Error) -> CdmError {
        if e.is_timeout() {
            CdmError::timeout("device response", self.request_timeout())
        } else {
            CdmError::ConnectionFailed(e.to_string())
        }
    }

    fn header_map(headers: Option<&JobHeaders>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(headers) = headers {
            for (name, value) in headers {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    (Ok(name), Ok(value)) => {
                        map.insert(name, value);
                    }
                    _ => warn!(header = %name, "dropping malformed request header"),
                }
            }
        }
        map
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: Option<&JobHeaders>,
    ) -> Result<Response, CdmError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(endpoint))
            .headers(Self::header_map(headers));
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, endpoint, "CDM request");
        request.send().await.map_err(|e| self.map_request_error(e))
    }

    /// Send a request and fail on any non-success status.
    async fn send_expect_success(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: Option<&JobHeaders>,
    ) -> Result<Response, CdmError> {
        let response = self.send(method, endpoint, body, headers).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status = status.as_u16();
        match status {
            400 | 409 | 422 => {
                let body = response.text().await.unwrap_or_default();
                Err(CdmError::Rejected(body))
            }
            404 => Err(CdmError::NotFound(endpoint.to_string())),
            _ => Err(CdmError::Status {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }

    async fn get_json(&self, endpoint: &str, headers: Option<&JobHeaders>) -> Result<Value, CdmError> {
        let response = self
            .send_expect_success(Method::GET, endpoint, None, headers)
            .await?;
        response
            .json()
            .await
            .map_err(|e| CdmError::Decode(e.to_string()))
    }

    /// Send a request and return the raw status code; only communication
    /// failures are errors.
    async fn send_for_status(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: Option<&JobHeaders>,
    ) -> Result<u16, CdmError> {
        let response = self.send(method, endpoint, body, headers).await?;
        Ok(response.status().as_u16())
    }

    fn job_endpoint(job_id: &str) -> String {
        format!("{}/{}", endpoints::JOBS, job_id)
    }

    fn job_state_endpoint(job_id: &str) -> String {
        format!("{}/{}/state", endpoints::JOBS, job_id)
    }

    async fn current_alerts(&self) -> Result<Vec<AlertDetail>, CdmError> {
        let value = self.get_json(endpoints::ALERTS, None).await?;
        let list = value
            .get("alerts")
            .cloned()
            .unwrap_or_else(|| value.clone());
        serde_json::from_value(list).map_err(|e| CdmError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TicketStore for CdmHttpClient {
    async fn create(&self, base: &TicketPayload) -> Result<String, CdmError> {
        let body = serde_json::to_value(base).map_err(|e| CdmError::Decode(e.to_string()))?;
        let response = self
            .send_expect_success(Method::POST, endpoints::JOB_TICKETS, Some(&body), None)
            .await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| CdmError::Decode(e.to_string()))?;

        value
            .get("ticketId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CdmError::Decode("ticket create response without ticketId".to_string()))
    }

    async fn update(&self, ticket_id: &str, payload: &TicketPayload) -> Result<(), CdmError> {
        let endpoint = format!("{}/{}", endpoints::JOB_TICKETS, ticket_id);
        let body = serde_json::to_value(payload).map_err(|e| CdmError::Decode(e.to_string()))?;
        self.send_expect_success(Method::PUT, &endpoint, Some(&body), None)
            .await?;
        Ok(())
    }

    async fn get_info(&self, ticket_id: &str) -> Result<TicketPayload, CdmError> {
        let endpoint = format!("{}/{}", endpoints::JOB_TICKETS, ticket_id);
        let value = self.get_json(&endpoint, None).await?;
        serde_json::from_value(value).map_err(|e| CdmError::Decode(e.to_string()))
    }

    async fn configuration_defaults(&self, ticket_type: &str) -> Result<Value, CdmError> {
        let endpoint = format!("{}/{}", endpoints::TICKET_CONFIGURATION_DEFAULTS, ticket_type);
        self.get_json(&endpoint, None).await
    }

    async fn update_configuration_defaults(
        &self,
        ticket_type: &str,
        payload: &Value,
    ) -> Result<u16, CdmError> {
        let endpoint = format!("{}/{}", endpoints::TICKET_CONFIGURATION_DEFAULTS, ticket_type);
        self.send_for_status(Method::PATCH, &endpoint, Some(payload), None)
            .await
    }
}

#[async_trait]
impl JobManager for CdmHttpClient {
    fn wait_start_timeout(&self) -> Duration {
        WAIT_START_JOB_TIMEOUT
    }

    async fn create_job(&self, request: CreateJobRequest) -> Result<String, CdmError> {
        let body = json!({
            "ticketId": request.ticket_id,
            "autostart": request.autostart,
            "prioritySessionId": request.priority_session_id,
        });
        let response = self
            .send_expect_success(
                Method::POST,
                endpoints::JOBS,
                Some(&body),
                request.headers.as_ref(),
            )
            .await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| CdmError::Decode(e.to_string()))?;

        value
            .get("jobId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CdmError::Decode("job create response without jobId".to_string()))
    }

    async fn job_info(
        &self,
        job_id: &str,
        headers: Option<&JobHeaders>,
    ) -> Result<JobInfo, CdmError> {
        let value = self.get_json(&Self::job_endpoint(job_id), headers).await?;
        serde_json::from_value(value).map_err(|e| CdmError::Decode(e.to_string()))
    }

    async fn change_state(
        &self,
        job_id: &str,
        action: JobAction,
        headers: Option<&JobHeaders>,
    ) -> Result<u16, CdmError> {
        let body = json!({
            "action": action.action_name(),
            "state": action.target_state(),
        });
        self.send_for_status(Method::PUT, &Self::job_state_endpoint(job_id), Some(&body), headers)
            .await
    }

    async fn cancel(&self, job_id: &str, headers: Option<&JobHeaders>) -> Result<u16, CdmError> {
        self.change_state(job_id, JobAction::Cancel, headers).await
    }

    async fn wait_for_state(
        &self,
        job_id: &str,
        states: &[JobState],
    ) -> Result<JobState, CdmError> {
        let start = tokio::time::Instant::now();
        loop {
            let info = self.job_info(job_id, None).await?;
            if states.contains(&info.state) {
                return Ok(info.state);
            }
            if start.elapsed() >= WAIT_START_JOB_TIMEOUT {
                let names: Vec<&str> = states.iter().map(JobState::as_str).collect();
                return Err(CdmError::timeout(
                    format!("job {} to reach {:?}", job_id, names),
                    WAIT_START_JOB_TIMEOUT,
                ));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn wait_all_previews_done(&self, job_id: &str) -> Result<bool, CdmError> {
        let endpoint = format!("{}/{}/previews", endpoints::JOBS, job_id);
        let start = tokio::time::Instant::now();
        loop {
            let pending = match self.get_json(&endpoint, None).await {
                Ok(value) => value.get("pending").and_then(Value::as_u64).unwrap_or(0),
                // Hardware without preview sub-jobs has nothing to wait for.
                Err(CdmError::NotFound(_)) => return Ok(true),
                Err(e) => return Err(e),
            };
            if pending == 0 {
                return Ok(true);
            }
            if start.elapsed() >= WAIT_START_JOB_TIMEOUT {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_processing_sub_status(
        &self,
        job_id: &str,
        sub_status: JobSubStatus,
    ) -> Result<(), CdmError> {
        let start = tokio::time::Instant::now();
        loop {
            let info = self.job_info(job_id, None).await?;
            if info.sub_status == Some(sub_status) {
                return Ok(());
            }
            if start.elapsed() >= WAIT_START_JOB_TIMEOUT {
                return Err(CdmError::timeout(
                    format!("job {} sub-status {}", job_id, sub_status.as_str()),
                    WAIT_START_JOB_TIMEOUT,
                ));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl AlertChannel for CdmHttpClient {
    async fn wait_for_alerts(&self, category: &str) -> Result<Vec<AlertDetail>, CdmError> {
        let start = tokio::time::Instant::now();
        loop {
            let matching: Vec<AlertDetail> = self
                .current_alerts()
                .await?
                .into_iter()
                .filter(|alert| alert.category == category)
                .collect();
            if !matching.is_empty() {
                return Ok(matching);
            }
            if start.elapsed() >= ALERT_WAIT_TIMEOUT {
                return Err(CdmError::timeout(
                    format!("alert {}", category),
                    ALERT_WAIT_TIMEOUT,
                ));
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn alert_action(&self, category: &str, response: &str) -> Result<(), CdmError> {
        let alert = self
            .current_alerts()
            .await?
            .into_iter()
            .find(|alert| alert.category == category)
            .ok_or_else(|| CdmError::NotFound(format!("alert {}", category)))?;

        let href = alert
            .actions
            .links
            .first()
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                CdmError::Decode(format!("alert {} carries no action link", category))
            })?;

        self.send_expect_success(Method::PUT, &href, Some(&json!({ "jobAction": response })), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceEndpoints for CdmHttpClient {
    async fn get(&self, endpoint: &str) -> Result<Value, CdmError> {
        self.get_json(endpoint, None).await
    }

    async fn put(&self, endpoint: &str, payload: &Value) -> Result<(), CdmError> {
        self.send_expect_success(Method::PUT, endpoint, Some(payload), None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CdmHttpClient {
        CdmHttpClient::new(DeviceConfig {
            url: "http://printer.local/".to_string(),
            timeout_secs: 5,
        })
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        assert_eq!(client().base_url(), "http://printer.local");
    }

    #[test]
    fn test_job_endpoints() {
        assert_eq!(
            CdmHttpClient::job_endpoint("j-1"),
            "/cdm/jobManagement/v1/jobs/j-1"
        );
        assert_eq!(
            CdmHttpClient::job_state_endpoint("j-1"),
            "/cdm/jobManagement/v1/jobs/j-1/state"
        );
    }

    #[test]
    fn test_header_map_drops_malformed_names() {
        let mut headers = JobHeaders::new();
        headers.insert("X-Session".to_string(), "abc".to_string());
        headers.insert("bad header".to_string(), "x".to_string());

        let map = CdmHttpClient::header_map(Some(&headers));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("X-Session").unwrap(), "abc");
    }

    #[test]
    fn test_wait_start_timeout_constant() {
        assert_eq!(client().wait_start_timeout(), Duration::from_secs(120));
    }
}
