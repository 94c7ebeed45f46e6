/// Shared server state: the files uploaded during this session.
use crate::api::FileSummary;
use crate::config::SweeperConfig;
use crate::error::{Result, SweepError};
use crate::sweep::{FileInfo, Sweeper};
use crate::upload::UploadedFile;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct SessionFile {
    file: Arc<UploadedFile>,
    info: FileInfo,
}

pub struct AppState {
    files: Mutex<BTreeMap<u64, SessionFile>>,
    next_id: AtomicU64,
    pub sweeper: Sweeper,
}

impl AppState {
    pub fn new(config: &SweeperConfig) -> Self {
        AppState {
            files: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            sweeper: Sweeper::from_config(config),
        }
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<u64, SessionFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an accepted file and return its id.
    pub fn insert(&self, file: UploadedFile, info: FileInfo) -> FileSummary {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let summary = FileSummary::new(id, &info);
        self.files().insert(
            id,
            SessionFile {
                file: Arc::new(file),
                info,
            },
        );
        summary
    }

    /// Clone the file out of the store so the lock is released before any
    /// parsing happens.
    pub fn get(&self, id: u64) -> Result<Arc<UploadedFile>> {
        self.files()
            .get(&id)
            .map(|entry| Arc::clone(&entry.file))
            .ok_or(SweepError::FileNotFound(id))
    }

    pub fn remove(&self, id: u64) -> Result<()> {
        self.files()
            .remove(&id)
            .map(|_| ())
            .ok_or(SweepError::FileNotFound(id))
    }

    /// Session files in upload order.
    pub fn list(&self) -> Vec<FileSummary> {
        self.files()
            .iter()
            .map(|(id, entry)| FileSummary::new(*id, &entry.info))
            .collect()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&SweeperConfig::default())
    }
}
