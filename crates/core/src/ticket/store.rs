//! Ticket store collaborator trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::cdm::CdmError;

use super::TicketPayload;

/// Trait for the device's ticket store.
///
/// Implemented over HTTP by [`crate::cdm::CdmHttpClient`] and by
/// `testing::MockTicketStore` in tests.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Create a ticket from a base payload and return its identifier.
    async fn create(&self, base: &TicketPayload) -> Result<String, CdmError>;

    /// Apply a payload update to an existing ticket.
    async fn update(&self, ticket_id: &str, payload: &TicketPayload) -> Result<(), CdmError>;

    /// Fetch the current payload of a ticket.
    async fn get_info(&self, ticket_id: &str) -> Result<TicketPayload, CdmError>;

    /// Fetch the device's ticket configuration defaults for a ticket type.
    async fn configuration_defaults(&self, ticket_type: &str) -> Result<Value, CdmError>;

    /// Update the device's ticket configuration defaults for a ticket type.
    /// Returns the device status code.
    async fn update_configuration_defaults(
        &self,
        ticket_type: &str,
        payload: &Value,
    ) -> Result<u16, CdmError>;
}
