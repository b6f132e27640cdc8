use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, bail};
use async_trait::async_trait;

use scaleslip_core::{WorksheetRef, WorksheetStore};

#[derive(Debug, Default)]
struct Tab {
    rows: Vec<Vec<String>>,
    header_replacements: usize,
}

#[derive(Debug, Default)]
struct State {
    tabs: HashMap<WorksheetRef, Tab>,
    appends: usize,
}

/// In-memory worksheet store for local runs and tests.
///
/// Failure injection mimics a back end that goes away mid-request.
#[derive(Debug, Default)]
pub struct InMemoryWorksheetStore {
    state: Mutex<State>,
    fail_reads: bool,
    fail_appends_after: Option<usize>,
}

impl InMemoryWorksheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tab with existing rows.
    pub fn with_rows(self, worksheet: &WorksheetRef, rows: Vec<Vec<String>>) -> Self {
        self.lock().tabs.insert(
            worksheet.clone(),
            Tab {
                rows,
                header_replacements: 0,
            },
        );
        self
    }

    /// Every read fails.
    pub fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Appends succeed `n` times, then fail.
    pub fn fail_appends_after(mut self, n: usize) -> Self {
        self.fail_appends_after = Some(n);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current rows of a tab, `None` if the tab was never created.
    pub fn rows(&self, worksheet: &WorksheetRef) -> Option<Vec<Vec<String>>> {
        self.lock().tabs.get(worksheet).map(|t| t.rows.clone())
    }

    pub fn header_replacements(&self, worksheet: &WorksheetRef) -> usize {
        self.lock()
            .tabs
            .get(worksheet)
            .map_or(0, |t| t.header_replacements)
    }

    /// Total append calls that succeeded, across tabs.
    pub fn append_count(&self) -> usize {
        self.lock().appends
    }
}

#[async_trait]
impl WorksheetStore for InMemoryWorksheetStore {
    async fn ensure_worksheet(&self, worksheet: &WorksheetRef) -> Result<()> {
        self.lock().tabs.entry(worksheet.clone()).or_default();
        Ok(())
    }

    async fn read_all_rows(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>> {
        if self.fail_reads {
            bail!("worksheet {worksheet} is unreachable");
        }
        match self.lock().tabs.get(worksheet) {
            Some(tab) => Ok(tab.rows.clone()),
            None => bail!("worksheet {worksheet} not found"),
        }
    }

    async fn append_row(&self, worksheet: &WorksheetRef, row: &[String]) -> Result<()> {
        let mut state = self.lock();
        if self.fail_appends_after.is_some_and(|n| state.appends >= n) {
            bail!("append to {worksheet} rejected");
        }
        let Some(tab) = state.tabs.get_mut(worksheet) else {
            bail!("worksheet {worksheet} not found");
        };
        tab.rows.push(row.to_vec());
        state.appends += 1;
        Ok(())
    }

    async fn replace_header_row(&self, worksheet: &WorksheetRef, headers: &[String]) -> Result<()> {
        let mut state = self.lock();
        let Some(tab) = state.tabs.get_mut(worksheet) else {
            bail!("worksheet {worksheet} not found");
        };
        match tab.rows.first_mut() {
            Some(first) => *first = headers.to_vec(),
            None => tab.rows.push(headers.to_vec()),
        }
        tab.header_replacements += 1;
        Ok(())
    }
}
