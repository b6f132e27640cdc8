use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, bail};
use async_trait::async_trait;

use scaleslip_core::{ArchiveStore, ArchiveUpload, StoredFile};

#[derive(Debug, Default)]
struct State {
    files: Vec<ArchiveUpload>,
    public: HashSet<String>,
}

/// In-memory archive for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryArchiveStore {
    state: Mutex<State>,
    fail_create: bool,
    fail_grant: bool,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn fail_grant(mut self) -> Self {
        self.fail_grant = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every upload received, in order.
    pub fn uploads(&self) -> Vec<ArchiveUpload> {
        self.lock().files.clone()
    }

    pub fn is_public(&self, file_id: &str) -> bool {
        self.lock().public.contains(file_id)
    }
}

fn mem_id(index: usize) -> String {
    format!("mem-{}", index + 1)
}

#[async_trait]
impl ArchiveStore for InMemoryArchiveStore {
    async fn create_file(&self, upload: ArchiveUpload) -> Result<StoredFile> {
        if self.fail_create {
            bail!("archive rejected {}", upload.name);
        }
        let mut state = self.lock();
        let id = mem_id(state.files.len());
        state.files.push(upload);
        Ok(StoredFile {
            web_view_link: format!("memory://archive/{id}"),
            id,
        })
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<()> {
        if self.fail_grant {
            bail!("permission change on {file_id} rejected");
        }
        let mut state = self.lock();
        if !state.files.iter().enumerate().any(|(i, _)| mem_id(i) == file_id) {
            bail!("file {file_id} not found");
        }
        state.public.insert(file_id.to_string());
        Ok(())
    }
}
