//! Copy job tickets: the payload model and the store collaborator.
//!
//! A ticket is a draft job configuration. It is created from a base
//! skeleton, updated with the caller's settings, and consumed exactly once
//! by job creation. Ticket identifiers are opaque strings.

mod store;
mod types;

pub use store::TicketStore;
pub use types::{
    DestSection, DuplexBinding, PlexMode, PrintSettings, ScanSettings, SourceSection,
    TicketPayload,
};

/// Ticket type under which copy defaults are stored on the device.
pub const COPY_TICKET_TYPE: &str = "copy";
