//! Device alerts: job-adjacent events raised mid-job that require an
//! explicit response before processing continues.
//!
//! Alerts are transient and correlated to a job by timing, not by job id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cdm::CdmError;

/// Alert raised when the flatbed needs the next page placed on it.
pub const FLATBED_ADD_PAGE: &str = "flatbedAddPage";

/// Alert raised when a scanned page must be ejected from the MDF.
pub const MDF_EJECT_PAGE: &str = "mdfEjectPage";

/// Response token: another page follows.
pub const RESPONSE_SCAN_NEXT_PAGE: &str = "Response_01";

/// Response token: scanning is done.
pub const RESPONSE_SCAN_DONE: &str = "Response_02";

/// An action link attached to an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertLink {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

/// A response value the device accepts for an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertActionValue {
    pub se_value: String,
}

/// A supported response for an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedAction {
    pub value: AlertActionValue,
}

/// Action links and supported responses for an alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertActions {
    #[serde(default)]
    pub links: Vec<AlertLink>,
    #[serde(default)]
    pub supported: Vec<SupportedAction>,
}

/// An alert as reported by the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetail {
    /// Alert category name (e.g. "flatbedAddPage").
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raised_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: AlertActions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlertDetail {
    /// A minimal alert with just a category, for tests and fixtures.
    pub fn named(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            raised_at: Some(Utc::now()),
            actions: AlertActions::default(),
            extra: Map::new(),
        }
    }
}

/// Trait for the device's alert channel.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Block until at least one alert with the given category is raised.
    /// Fails with [`CdmError::Timeout`] when the bound expires; not every
    /// hardware raises every alert.
    async fn wait_for_alerts(&self, category: &str) -> Result<Vec<AlertDetail>, CdmError>;

    /// Answer an alert with a response token.
    async fn alert_action(&self, category: &str, response: &str) -> Result<(), CdmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_detail_deserializes_device_shape() {
        let json = serde_json::json!({
            "category": "mdfEjectPage",
            "actions": {
                "links": [{"href": "/cdm/eventing/v1/alerts/42/action"}],
                "supported": [{"value": {"seValue": "ejectPage"}}]
            },
            "severity": "warning"
        });

        let alert: AlertDetail = serde_json::from_value(json).unwrap();
        assert_eq!(alert.category, "mdfEjectPage");
        assert_eq!(alert.actions.links[0].href, "/cdm/eventing/v1/alerts/42/action");
        assert_eq!(alert.actions.supported[0].value.se_value, "ejectPage");
        assert_eq!(alert.extra["severity"], "warning");
    }

    #[test]
    fn test_named_alert_has_no_actions() {
        let alert = AlertDetail::named(FLATBED_ADD_PAGE);
        assert_eq!(alert.category, "flatbedAddPage");
        assert!(alert.actions.links.is_empty());
    }
}
