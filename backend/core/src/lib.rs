pub mod defaults;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{SlipError, Stage};
pub use traits::{
    ArchiveStore, ArchiveUpload, StoredFile, VisionOracle, VisionRequest, VisionResponse,
    WorksheetRef, WorksheetStore,
};
pub use types::{ExtractedRecord, RawEntry, WorksheetRow, WorksheetSchema, UNNAMED_FIELD};
