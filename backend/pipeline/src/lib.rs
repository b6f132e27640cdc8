//! Slip submission pipeline.
//!
//! Sequences format check, extraction, parsing, normalization, worksheet
//! append, naming, and archival, and reports exactly one outcome.

pub mod locks;
pub mod outcome;
pub mod pipeline;

pub use locks::WorksheetLocks;
pub use outcome::{Progress, SlipFailure, SlipReceipt, SlipUpload};
pub use pipeline::{PipelineSettings, SlipPipeline};
