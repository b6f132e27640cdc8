//! Upload format detection and archive naming for slip images.

pub mod mime_detect;
pub mod naming;

pub use mime_detect::{SlipFormat, split_extension};
pub use naming::artifact_filename;
