//! Structured logging for scaleslip.
//!
//! Subscriber setup with an optional rolling NDJSON file, redaction of
//! credentials, and the slip audit trail.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, SlipEvent, SlipEventEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
