//! Mock device endpoints for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cdm::{CdmError, DeviceEndpoints};

/// Mock implementation of the [`DeviceEndpoints`] trait.
///
/// Serves seeded values on get, records every put, and supports one-shot
/// error injection.
#[derive(Debug, Default)]
pub struct MockDeviceEndpoints {
    values: RwLock<HashMap<String, Value>>,
    puts: RwLock<Vec<(String, Value)>>,
    next_error: RwLock<Option<CdmError>>,
}

impl MockDeviceEndpoints {
    /// Create a new mock with no endpoints seeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the value served for an endpoint.
    pub async fn set(&self, endpoint: impl Into<String>, value: Value) {
        self.values.write().await.insert(endpoint.into(), value);
    }

    /// Get all recorded put calls.
    pub async fn puts(&self) -> Vec<(String, Value)> {
        self.puts.read().await.clone()
    }

    /// Recorded put payloads for one endpoint.
    pub async fn puts_for(&self, endpoint: &str) -> Vec<Value> {
        self.puts
            .read()
            .await
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, value)| value.clone())
            .collect()
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
impl DeviceEndpoints for MockDeviceEndpoints {
    async fn get(&self, endpoint: &str) -> Result<Value, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.values
            .read()
            .await
            .get(endpoint)
            .cloned()
            .ok_or_else(|| CdmError::NotFound(endpoint.to_string()))
    }

    async fn put(&self, endpoint: &str, payload: &Value) -> Result<(), CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.puts
            .write()
            .await
            .push((endpoint.to_string(), payload.clone()));
        self.values
            .write()
            .await
            .insert(endpoint.to_string(), payload.clone());
        Ok(())
    }
}
