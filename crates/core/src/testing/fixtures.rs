//! Shared payload and alert fixtures for tests.

use serde_json::{json, Value};

use crate::alert::{AlertActionValue, AlertActions, AlertDetail, AlertLink, SupportedAction};
use crate::ticket::{PlexMode, TicketPayload};

/// A color copy payload with two copies.
pub fn color_copies_payload() -> TicketPayload {
    TicketPayload::default().with_color_mode("color").with_copies(2)
}

/// A flatbed capture with duplex output, the shape that triggers the
/// flatbed add-page alert handling.
pub fn flatbed_duplex_payload() -> TicketPayload {
    TicketPayload::default()
        .with_scan_media_source("flatbed")
        .with_print_plex_mode(PlexMode::Duplex)
}

/// A job-build ticket, the shape designjet devices split into two segments.
pub fn job_build_payload() -> TicketPayload {
    TicketPayload::default()
        .with_scan_capture_mode("jobBuild")
        .with_copies(1)
}

/// A flatbed add-page alert without action metadata.
pub fn flatbed_add_page_alert() -> AlertDetail {
    AlertDetail::named(crate::alert::FLATBED_ADD_PAGE)
}

/// An MDF eject-page alert carrying an action link, as the device reports
/// it.
pub fn mdf_eject_page_alert() -> AlertDetail {
    let mut alert = AlertDetail::named(crate::alert::MDF_EJECT_PAGE);
    alert.actions = AlertActions {
        links: vec![AlertLink {
            href: "/cdm/eventing/v1/alerts/7/action".to_string(),
            rel: Some("alertAction".to_string()),
        }],
        supported: vec![SupportedAction {
            value: AlertActionValue {
                se_value: "ejectPage".to_string(),
            },
        }],
    };
    alert
}

/// A device identity body for the given family and product names.
pub fn identity(family_name: &str, product_name: &str) -> Value {
    json!({
        "familyName": family_name,
        "productName": product_name,
    })
}

/// A copy configuration body with the given copy mode.
pub fn copy_configuration(copy_mode: &str) -> Value {
    json!({
        "copyMode": copy_mode,
        "allowInterrupt": "false",
    })
}
