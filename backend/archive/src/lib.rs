//! Archival of original slip images.
//!
//! The Drive adapter stores each image under its deterministic name and makes
//! it readable by link; the in-memory store backs tests and offline runs.

pub mod drive;
pub mod store;

pub use drive::GoogleDriveStore;
pub use store::InMemoryArchiveStore;
