//! Mock alert channel for testing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::alert::{AlertChannel, AlertDetail};
use crate::cdm::CdmError;

/// Mock implementation of the [`AlertChannel`] trait.
///
/// Raised alerts are consumed by the first matching wait, mirroring their
/// transient nature on real hardware. A wait for a category with nothing
/// raised fails with a timeout, which is what devices that never raise the
/// alert look like.
#[derive(Debug, Default)]
pub struct MockAlertChannel {
    pending: RwLock<HashMap<String, Vec<AlertDetail>>>,
    waits: RwLock<Vec<String>>,
    actions: RwLock<Vec<(String, String)>>,
    next_error: RwLock<Option<CdmError>>,
}

impl MockAlertChannel {
    /// Create a new mock alert channel with no alerts raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert so the next matching wait observes it.
    pub async fn raise(&self, detail: AlertDetail) {
        self.pending
            .write()
            .await
            .entry(detail.category.clone())
            .or_default()
            .push(detail);
    }

    /// Categories that were waited for, in order.
    pub async fn waited_categories(&self) -> Vec<String> {
        self.waits.read().await.clone()
    }

    /// Recorded alert responses as (category, response token) pairs.
    pub async fn responses(&self) -> Vec<(String, String)> {
        self.actions.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CdmError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<CdmError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl AlertChannel for MockAlertChannel {
    async fn wait_for_alerts(&self, category: &str) -> Result<Vec<AlertDetail>, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.waits.write().await.push(category.to_string());

        match self.pending.write().await.remove(category) {
            Some(alerts) if !alerts.is_empty() => Ok(alerts),
            _ => Err(CdmError::timeout(
                format!("alert {}", category),
                Duration::from_millis(50),
            )),
        }
    }

    async fn alert_action(&self, category: &str, response: &str) -> Result<(), CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.actions
            .write()
            .await
            .push((category.to_string(), response.to_string()));
        Ok(())
    }
}
