//! The spreadsheet ledger: one row per slip, headers grown on demand.

pub mod reconcile;
pub mod sheets;
pub mod store;

pub use reconcile::{
    plan_append, AppendPlan, AppendReport, HeaderWrite, ReconcileError, Reconciler,
    PRIORITY_COLUMNS,
};
pub use sheets::GoogleSheetsStore;
pub use store::InMemoryWorksheetStore;
