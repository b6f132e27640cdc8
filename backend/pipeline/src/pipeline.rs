//! The slip pipeline: image in, spreadsheet row and archived file out.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument};

use logging::{EventLogger, SlipEvent, redact_sensitive_data};
use media::{SlipFormat, artifact_filename, split_extension};
use scaleslip_core::{
    ArchiveStore, ArchiveUpload, ExtractedRecord, SlipError, VisionOracle, VisionRequest,
    WorksheetRef, WorksheetStore,
};
use scaleslip_ledger::Reconciler;
use scaleslip_understanding::{WEIGH_SCALE_PROMPT, normalize_entries, parse_response};

use crate::locks::WorksheetLocks;
use crate::outcome::{Progress, SlipFailure, SlipReceipt, SlipUpload};

pub use scaleslip_core::defaults::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Fixed per-deployment inputs to every submission.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub max_tokens: u32,
    pub prompt: String,
    pub worksheet: WorksheetRef,
    /// Parent folder for archived images; `None` uses the archive root.
    pub drive_folder_id: Option<String>,
}

impl PipelineSettings {
    pub fn new(worksheet: WorksheetRef) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt: WEIGH_SCALE_PROMPT.to_string(),
            worksheet,
            drive_folder_id: None,
        }
    }
}

/// Orchestrates one slip submission across the oracle, the worksheet, and
/// the archive.
pub struct SlipPipeline {
    oracle: Arc<dyn VisionOracle>,
    reconciler: Reconciler,
    archive: Arc<dyn ArchiveStore>,
    settings: PipelineSettings,
    locks: WorksheetLocks,
}

impl SlipPipeline {
    pub fn new(
        oracle: Arc<dyn VisionOracle>,
        sheets: Arc<dyn WorksheetStore>,
        archive: Arc<dyn ArchiveStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            oracle,
            reconciler: Reconciler::new(sheets),
            archive,
            settings,
            locks: WorksheetLocks::new(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Process one slip image end to end.
    ///
    /// Nothing is retried or rolled back; on failure the returned
    /// [`Progress`] says which writes had already landed.
    #[instrument(skip_all, fields(request_id = tracing::field::Empty, filename = %upload.filename))]
    pub async fn submit(&self, upload: SlipUpload) -> Result<SlipReceipt, SlipFailure> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());
        let started = Instant::now();

        match self.run(&request_id, upload).await {
            Ok(receipt) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    archived_as = %receipt.filename,
                    "Slip processed"
                );
                Ok(receipt)
            }
            Err(failure) => {
                error!(
                    stage = %failure.stage(),
                    header_written = failure.progress.header_written,
                    row_appended = failure.progress.row_appended,
                    error = %redact_sensitive_data(&failure.to_string()),
                    "Slip processing failed"
                );
                EventLogger::log_event(
                    &request_id,
                    SlipEvent::Failed {
                        stage: failure.stage().to_string(),
                        detail: failure.to_string(),
                        row_persisted: failure.progress.row_appended,
                    },
                );
                Err(failure)
            }
        }
    }

    async fn run(&self, request_id: &str, upload: SlipUpload) -> Result<SlipReceipt, SlipFailure> {
        let format = SlipFormat::from_filename(&upload.filename)?;
        let extension = split_extension(&upload.filename).to_string();

        let record = self.extract(&upload, format).await?;
        EventLogger::log_event(
            request_id,
            SlipEvent::Extracted {
                filename: upload.filename.clone(),
                fields: record.len(),
            },
        );

        let report = {
            let worksheet = &self.settings.worksheet;
            let _guard = self.locks.acquire(worksheet).await;
            self.reconciler
                .append_record(worksheet, &record)
                .await
                .map_err(|e| {
                    SlipFailure::new(
                        SlipError::PersistenceFailure(e.to_string()),
                        Progress {
                            header_written: e.header_written,
                            row_appended: false,
                        },
                    )
                })?
        };
        EventLogger::log_event(
            request_id,
            SlipEvent::RowAppended {
                worksheet: self.settings.worksheet.to_string(),
                header_written: report.header_written,
                columns: report.schema.len(),
            },
        );
        let progress = Progress {
            header_written: report.header_written,
            row_appended: true,
        };

        let name = artifact_filename(&record, &extension);
        let archival = |e: anyhow::Error| {
            SlipFailure::new(SlipError::ArchivalFailure(format!("{e:#}")), progress)
        };
        let stored = self
            .archive
            .create_file(ArchiveUpload {
                bytes: upload.bytes,
                name: name.clone(),
                mime_type: format.mime_type().to_string(),
                parent_folder_id: self.settings.drive_folder_id.clone(),
            })
            .await
            .map_err(archival)?;
        self.archive
            .grant_public_read(&stored.id)
            .await
            .map_err(archival)?;
        EventLogger::log_event(
            request_id,
            SlipEvent::Archived {
                name: name.clone(),
                file_id: stored.id.clone(),
            },
        );

        Ok(SlipReceipt {
            record,
            filename: name,
            stored,
            header_written: report.header_written,
        })
    }

    /// Oracle call, parse, and normalize.
    async fn extract(
        &self,
        upload: &SlipUpload,
        format: SlipFormat,
    ) -> Result<ExtractedRecord, SlipError> {
        let request = VisionRequest {
            model: self.settings.model.clone(),
            prompt: self.settings.prompt.clone(),
            image: upload.bytes.clone(),
            mime_type: format.mime_type().to_string(),
            max_tokens: self.settings.max_tokens,
        };

        let reply = self
            .oracle
            .complete(&request)
            .await
            .map_err(|e| SlipError::OracleFailure(format!("{e:#}")))?;
        debug!(
            provider = %reply.provider,
            reply = %redact_sensitive_data(&reply.content),
            "Raw model output"
        );

        let entries = parse_response(&reply.content)?;
        let record = normalize_entries(&entries);
        info!(
            fields = record.len(),
            tokens = reply.tokens_used,
            latency_ms = reply.latency_ms,
            "Extracted slip fields"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaleslip_archive::InMemoryArchiveStore;
    use scaleslip_core::Stage;
    use scaleslip_ledger::InMemoryWorksheetStore;
    use scaleslip_understanding::MockOracle;

    const REPLY: &str = r#"Here is the data:
[["Weigh Scale Load Slip #", "194647 / 1"], ["Date In", "08/Sep/25"], ["Gross", "65,080 kg"], ["Company", "LP"]]
Let me know if you need more."#;

    struct Harness {
        oracle: Arc<MockOracle>,
        sheets: Arc<InMemoryWorksheetStore>,
        archive: Arc<InMemoryArchiveStore>,
        pipeline: SlipPipeline,
    }

    fn worksheet() -> WorksheetRef {
        WorksheetRef::new("sheet-1", "West")
    }

    fn harness(
        oracle: MockOracle,
        sheets: InMemoryWorksheetStore,
        archive: InMemoryArchiveStore,
    ) -> Harness {
        let oracle = Arc::new(oracle);
        let sheets = Arc::new(sheets);
        let archive = Arc::new(archive);
        let mut settings = PipelineSettings::new(worksheet());
        settings.drive_folder_id = Some("folder-9".into());
        let pipeline = SlipPipeline::new(oracle.clone(), sheets.clone(), archive.clone(), settings);
        Harness {
            oracle,
            sheets,
            archive,
            pipeline,
        }
    }

    fn default_harness() -> Harness {
        harness(
            MockOracle::new("mock").with_response(REPLY),
            InMemoryWorksheetStore::new(),
            InMemoryArchiveStore::new(),
        )
    }

    #[tokio::test]
    async fn happy_path_writes_row_and_archives() {
        let h = default_harness();
        let receipt = h
            .pipeline
            .submit(SlipUpload::new("slip.JPG", &b"jpeg-bytes"[..]))
            .await
            .unwrap();

        assert_eq!(receipt.filename, "194647_1_08-Sep-25.JPG");
        assert_eq!(receipt.record.get("Gross"), Some("65,080 kg"));
        assert!(receipt.header_written);

        let rows = h.sheets.rows(&worksheet()).unwrap();
        assert_eq!(
            rows[0],
            vec!["Weigh Scale Load Slip #", "Date In", "Gross", "Company"]
        );
        assert_eq!(rows[1], vec!["194647 / 1", "08/Sep/25", "65,080 kg", "LP"]);

        let uploads = h.archive.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].name, "194647_1_08-Sep-25.JPG");
        assert_eq!(uploads[0].mime_type, "image/jpeg");
        assert_eq!(uploads[0].parent_folder_id.as_deref(), Some("folder-9"));
        assert!(h.archive.is_public(&receipt.stored.id));

        let request = h.oracle.last_request().unwrap();
        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(&request.image[..], b"jpeg-bytes");
    }

    #[tokio::test]
    async fn unsupported_format_makes_no_external_calls() {
        let h = default_harness();
        let failure = h
            .pipeline
            .submit(SlipUpload::new("slip.pdf", &b"%PDF"[..]))
            .await
            .unwrap_err();

        assert_eq!(failure.stage(), Stage::Intake);
        assert!(matches!(
            failure.error,
            SlipError::UnsupportedFormat { ref extension } if extension == ".pdf"
        ));
        assert_eq!(h.oracle.call_count(), 0);
        assert_eq!(h.sheets.rows(&worksheet()), None);
        assert!(h.archive.uploads().is_empty());
    }

    #[tokio::test]
    async fn unparseable_reply_stops_before_spreadsheet() {
        let h = harness(
            MockOracle::new("mock").with_response("I could not read this slip."),
            InMemoryWorksheetStore::new(),
            InMemoryArchiveStore::new(),
        );
        let failure = h
            .pipeline
            .submit(SlipUpload::new("slip.png", &b"png"[..]))
            .await
            .unwrap_err();

        assert_eq!(failure.stage(), Stage::Parsing);
        assert_eq!(failure.progress, Progress::default());
        assert_eq!(h.oracle.call_count(), 1);
        assert_eq!(h.sheets.append_count(), 0);
    }

    #[tokio::test]
    async fn oracle_failure_is_extraction_stage() {
        let h = harness(
            MockOracle::new("mock").failing("OpenAI returned 429"),
            InMemoryWorksheetStore::new(),
            InMemoryArchiveStore::new(),
        );
        let failure = h
            .pipeline
            .submit(SlipUpload::new("slip.jpeg", &b"jpg"[..]))
            .await
            .unwrap_err();

        assert_eq!(failure.stage(), Stage::Extraction);
        assert!(failure.to_string().contains("OpenAI returned 429"));
    }

    #[tokio::test]
    async fn spreadsheet_failure_reports_header_progress() {
        let h = harness(
            MockOracle::new("mock").with_response(REPLY),
            InMemoryWorksheetStore::new().fail_appends_after(1),
            InMemoryArchiveStore::new(),
        );
        let failure = h
            .pipeline
            .submit(SlipUpload::new("slip.png", &b"png"[..]))
            .await
            .unwrap_err();

        assert_eq!(failure.stage(), Stage::Persistence);
        assert_eq!(
            failure.progress,
            Progress {
                header_written: true,
                row_appended: false
            }
        );
        assert!(h.archive.uploads().is_empty());
    }

    #[tokio::test]
    async fn archive_failure_after_row_is_reported() {
        let h = harness(
            MockOracle::new("mock").with_response(REPLY),
            InMemoryWorksheetStore::new(),
            InMemoryArchiveStore::new().fail_grant(),
        );
        let failure = h
            .pipeline
            .submit(SlipUpload::new("slip.png", &b"png"[..]))
            .await
            .unwrap_err();

        assert_eq!(failure.stage(), Stage::Archival);
        assert!(failure.progress.row_appended);
        assert_eq!(h.sheets.rows(&worksheet()).unwrap().len(), 2);
        assert_eq!(h.archive.uploads().len(), 1);
    }

    #[tokio::test]
    async fn second_submission_reuses_header() {
        let h = default_harness();
        h.pipeline
            .submit(SlipUpload::new("a.png", &b"1"[..]))
            .await
            .unwrap();
        let second = h
            .pipeline
            .submit(SlipUpload::new("b.png", &b"2"[..]))
            .await
            .unwrap();

        assert!(!second.header_written);
        let rows = h.sheets.rows(&worksheet()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(h.sheets.header_replacements(&worksheet()), 0);
    }

    #[tokio::test]
    async fn concurrent_first_submissions_write_one_header() {
        let h = Arc::new(default_harness());
        let tasks: Vec<_> = (0..4)
            .map(|i| {
                let h = h.clone();
                tokio::spawn(async move {
                    h.pipeline
                        .submit(SlipUpload::new(format!("{i}.png"), &b"x"[..]))
                        .await
                        .map(|r| r.header_written)
                })
            })
            .collect();

        let mut headers_written = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() {
                headers_written += 1;
            }
        }
        assert_eq!(headers_written, 1);
        assert_eq!(h.sheets.rows(&worksheet()).unwrap().len(), 5);
    }
}
