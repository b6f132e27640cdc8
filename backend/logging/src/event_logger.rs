//! Slip Event Logger
//!
//! Audit trail of each submission (extracted, row appended, archived,
//! failed) emitted under the `slip_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlipEvent {
    Extracted {
        filename: String,
        fields: usize,
    },
    RowAppended {
        worksheet: String,
        header_written: bool,
        columns: usize,
    },
    Archived {
        name: String,
        file_id: String,
    },
    Failed {
        stage: String,
        detail: String,
        row_persisted: bool,
    },
}

#[derive(Debug, Serialize)]
pub struct SlipEventEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: SlipEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build the log entry, redacting free-form text.
    pub fn entry(request_id: &str, mut event: SlipEvent) -> SlipEventEntry {
        if let SlipEvent::Failed { detail, .. } = &mut event {
            *detail = redact_sensitive_data(detail);
        }
        SlipEventEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log_event(request_id: &str, event: SlipEvent) {
        let entry = Self::entry(request_id, event);
        let json = serde_json::to_string(&entry).unwrap_or_else(|e| e.to_string());
        info!(target: "slip_events", event = %json, "Slip event");
    }
}
