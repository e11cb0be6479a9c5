//! Mock ticket store for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cdm::CdmError;
use crate::ticket::{TicketPayload, TicketStore};

/// Mock implementation of the [`TicketStore`] trait.
///
/// Records every create and update for assertions, serves ticket info from
/// the last update (or an explicit override), and supports one-shot error
/// injection.
#[derive(Debug, Default)]
pub struct MockTicketStore {
    created: RwLock<Vec<TicketPayload>>,
    updates: RwLock<Vec<(String, TicketPayload)>>,
    infos: RwLock<HashMap<String, TicketPayload>>,
    defaults: RwLock<HashMap<String, Value>>,
    defaults_status: RwLock<u16>,
    next_error: RwLock<Option<CdmError>>,
}

impl MockTicketStore {
    /// Create a new mock ticket store.
    pub fn new() -> Self {
        Self {
            defaults_status: RwLock::new(200),
            ..Default::default()
        }
    }

    /// Get all recorded create calls.
    pub async fn created_tickets(&self) -> Vec<TicketPayload> {
        self.created.read().await.clone()
    }

    /// Get all recorded update calls.
    pub async fn updates(&self) -> Vec<(String, TicketPayload)> {
        self.updates.read().await.clone()
    }

    /// Number of updates recorded for one ticket.
    pub async fn update_count(&self, ticket_id: &str) -> usize {
        self.updates
            .read()
            .await
            .iter()
            .filter(|(id, _)| id == ticket_id)
            .count()
    }

    /// Override the info served for a ticket.
    pub async fn set_info(&self, ticket_id: impl Into<String>, payload: TicketPayload) {
        self.infos.write().await.insert(ticket_id.into(), payload);
    }

    /// Seed the configuration defaults for a ticket type.
    pub async fn set_defaults(&self, ticket_type: impl Into<String>, defaults: Value) {
        self.defaults.write().await.insert(ticket_type.into(), defaults);
    }

    /// Status code returned by defaults updates.
    pub async fn set_defaults_status(&self, status: u16) {
        *self.defaults_status.write().await = status;
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
impl TicketStore for MockTicketStore {
    async fn create(&self, base: &TicketPayload) -> Result<String, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.created.write().await.push(base.clone());
        let ticket_id = format!("ticket-{}", Uuid::new_v4());
        self.infos
            .write()
            .await
            .insert(ticket_id.clone(), base.clone());
        Ok(ticket_id)
    }

    async fn update(&self, ticket_id: &str, payload: &TicketPayload) -> Result<(), CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.updates
            .write()
            .await
            .push((ticket_id.to_string(), payload.clone()));
        self.infos
            .write()
            .await
            .insert(ticket_id.to_string(), payload.clone());
        Ok(())
    }

    async fn get_info(&self, ticket_id: &str) -> Result<TicketPayload, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.infos
            .read()
            .await
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| CdmError::NotFound(ticket_id.to_string()))
    }

    async fn configuration_defaults(&self, ticket_type: &str) -> Result<Value, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.defaults
            .read()
            .await
            .get(ticket_type)
            .cloned()
            .ok_or_else(|| CdmError::NotFound(ticket_type.to_string()))
    }

    async fn update_configuration_defaults(
        &self,
        ticket_type: &str,
        payload: &Value,
    ) -> Result<u16, CdmError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.defaults
            .write()
            .await
            .insert(ticket_type.to_string(), payload.clone());
        Ok(*self.defaults_status.read().await)
    }
}
