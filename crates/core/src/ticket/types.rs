//! Ticket payload model.
//!
//! The payload is a nested configuration tree with two top-level sections:
//! `src` (capture settings) and `dest` (output settings). Fields the
//! orchestrator never inspects are carried through untouched in flattened
//! maps, so callers can set any device-supported key without the typed
//! model having to name it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input or output plex mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlexMode {
    Simplex,
    Duplex,
}

/// Binding edge for duplex output.
///
/// `OneSided` is what devices report for simplex output; it is incompatible
/// with duplex output and gets corrected during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplexBinding {
    OneSided,
    TwoSidedLongEdge,
    TwoSidedShortEdge,
}

/// Capture (scan) settings under `src.scan`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plex_mode: Option<PlexMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_capture_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_size: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Output (print) settings under `dest.print`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plex_mode: Option<PlexMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplex_binding: Option<DuplexBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collate: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `src` section of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `dest` section of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestSection {
    #[serde(default)]
    pub print: PrintSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A copy job ticket payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<SourceSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<DestSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TicketPayload {
    /// The base skeleton every ticket is created from before the caller's
    /// settings are applied as an update.
    pub fn skeleton() -> Self {
        Self {
            src: Some(SourceSection::default()),
            dest: Some(DestSection::default()),
            extra: Map::new(),
        }
    }

    /// Scan settings, creating the `src` section if absent.
    pub fn scan_mut(&mut self) -> &mut ScanSettings {
        &mut self.src.get_or_insert_with(SourceSection::default).scan
    }

    /// Print settings, creating the `dest` section if absent.
    pub fn print_mut(&mut self) -> &mut PrintSettings {
        &mut self.dest.get_or_insert_with(DestSection::default).print
    }

    /// Scan settings if the `src` section is present.
    pub fn scan(&self) -> Option<&ScanSettings> {
        self.src.as_ref().map(|s| &s.scan)
    }

    /// Print settings if the `dest` section is present.
    pub fn print(&self) -> Option<&PrintSettings> {
        self.dest.as_ref().map(|d| &d.print)
    }

    /// Set the scan color mode.
    pub fn with_color_mode(mut self, mode: impl Into<String>) -> Self {
        self.scan_mut().color_mode = Some(mode.into());
        self
    }

    /// Set the scan resolution.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.scan_mut().resolution = Some(resolution.into());
        self
    }

    /// Set the scan media source (e.g. "flatbed", "adf").
    pub fn with_scan_media_source(mut self, source: impl Into<String>) -> Self {
        self.scan_mut().media_source = Some(source.into());
        self
    }

    /// Set the scan plex mode.
    pub fn with_scan_plex_mode(mut self, mode: PlexMode) -> Self {
        self.scan_mut().plex_mode = Some(mode);
        self
    }

    /// Set the scan capture mode (e.g. "jobBuild").
    pub fn with_scan_capture_mode(mut self, mode: impl Into<String>) -> Self {
        self.scan_mut().scan_capture_mode = Some(mode.into());
        self
    }

    /// Set the number of copies.
    pub fn with_copies(mut self, copies: u32) -> Self {
        self.print_mut().copies = Some(copies);
        self
    }

    /// Set the print media source (tray).
    pub fn with_print_media_source(mut self, source: impl Into<String>) -> Self {
        self.print_mut().media_source = Some(source.into());
        self
    }

    /// Set the print plex mode.
    pub fn with_print_plex_mode(mut self, mode: PlexMode) -> Self {
        self.print_mut().plex_mode = Some(mode);
        self
    }

    /// Set the duplex binding edge.
    pub fn with_duplex_binding(mut self, binding: DuplexBinding) -> Self {
        self.print_mut().duplex_binding = Some(binding);
        self
    }
}
