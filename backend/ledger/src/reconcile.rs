//! Schema reconciliation: fit a record into a worksheet whose header row
//! grows over time.
//!
//! The header row is append-only. A fresh worksheet gets the priority columns
//! first; afterwards new fields are only ever added at the end.

use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info};

use scaleslip_core::{ExtractedRecord, WorksheetRef, WorksheetRow, WorksheetSchema, WorksheetStore};

/// Columns placed first, in this order, when a worksheet gets its header row.
pub const PRIORITY_COLUMNS: [&str; 6] = [
    "Weigh Scale Load Slip #",
    "Date In",
    "Gross",
    "Tare",
    "Net",
    "Truck",
];

/// How the header row has to change before the data row goes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderWrite {
    /// Worksheet was empty: append this as row 0.
    Create(Vec<String>),
    /// Row 0 gained columns: overwrite it with the full extended list.
    Replace(Vec<String>),
}

/// The writes needed to append one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendPlan {
    pub header_write: Option<HeaderWrite>,
    pub schema: WorksheetSchema,
    pub row: WorksheetRow,
}

/// Work out the header change and the data row for `record`, given the full
/// current contents of the worksheet (row 0 is the header row).
pub fn plan_append(existing_rows: &[Vec<String>], record: &ExtractedRecord) -> AppendPlan {
    let Some(header_row) = existing_rows.first() else {
        let schema = initial_schema(record);
        let row = schema.row_for(record);
        return AppendPlan {
            header_write: Some(HeaderWrite::Create(schema.headers().to_vec())),
            schema,
            row,
        };
    };

    let mut schema = WorksheetSchema::new(header_row.clone());
    let added = schema.extend_from(record);
    let header_write = if added.is_empty() {
        None
    } else {
        debug!(added = ?added, "Extending worksheet header row");
        Some(HeaderWrite::Replace(schema.headers().to_vec()))
    };
    let row = schema.row_for(record);
    AppendPlan {
        header_write,
        schema,
        row,
    }
}

/// Priority columns present in the record, then the rest in record order.
fn initial_schema(record: &ExtractedRecord) -> WorksheetSchema {
    let mut headers: Vec<String> = PRIORITY_COLUMNS
        .iter()
        .filter(|col| record.contains_key(col))
        .map(|col| col.to_string())
        .collect();
    headers.extend(
        record
            .keys()
            .filter(|k| !PRIORITY_COLUMNS.contains(k))
            .map(str::to_string),
    );
    WorksheetSchema::new(headers)
}

/// What a successful append did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReport {
    pub header_written: bool,
    pub schema: WorksheetSchema,
    pub row: WorksheetRow,
}

/// A failed append. `header_written` is set when the header row was already
/// changed before the failure; the writes are not rolled back.
#[derive(Debug, Error)]
#[error("{source:#}")]
pub struct ReconcileError {
    pub header_written: bool,
    #[source]
    pub source: anyhow::Error,
}

impl ReconcileError {
    fn before_header(source: anyhow::Error) -> Self {
        Self {
            header_written: false,
            source,
        }
    }
}

/// Applies [`AppendPlan`]s against a [`WorksheetStore`].
///
/// The worksheet is re-read on every call; nothing about its schema is cached.
pub struct Reconciler {
    store: Arc<dyn WorksheetStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn WorksheetStore>) -> Self {
        Self { store }
    }

    /// Append `record` as a new row of `worksheet`, creating the tab and
    /// extending its header row as needed.
    ///
    /// Performs at most one header write and exactly one row append.
    pub async fn append_record(
        &self,
        worksheet: &WorksheetRef,
        record: &ExtractedRecord,
    ) -> Result<AppendReport, ReconcileError> {
        self.store
            .ensure_worksheet(worksheet)
            .await
            .with_context(|| format!("Failed to open worksheet {worksheet}"))
            .map_err(ReconcileError::before_header)?;

        let existing = self
            .store
            .read_all_rows(worksheet)
            .await
            .with_context(|| format!("Failed to read worksheet {worksheet}"))
            .map_err(ReconcileError::before_header)?;

        let plan = plan_append(&existing, record);

        let header_written = match &plan.header_write {
            Some(HeaderWrite::Create(headers)) => {
                self.store
                    .append_row(worksheet, headers)
                    .await
                    .context("Failed to write header row")
                    .map_err(ReconcileError::before_header)?;
                true
            }
            Some(HeaderWrite::Replace(headers)) => {
                self.store
                    .replace_header_row(worksheet, headers)
                    .await
                    .context("Failed to update header row")
                    .map_err(ReconcileError::before_header)?;
                true
            }
            None => false,
        };

        self.store
            .append_row(worksheet, plan.row.cells())
            .await
            .context("Failed to append data row")
            .map_err(|source| ReconcileError {
                header_written,
                source,
            })?;

        info!(
            worksheet = %worksheet,
            existing_rows = existing.len(),
            columns = plan.schema.len(),
            header_written,
            "Appended slip row"
        );

        Ok(AppendReport {
            header_written,
            schema: plan.schema,
            row: plan.row,
        })
    }
}
