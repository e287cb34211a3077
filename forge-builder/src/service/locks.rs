//! Working directory locks
//!
//! Builds for the same agent type share a working directory and its
//! intermediate output files, so they must not overlap.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// One async mutex per working directory
#[derive(Default)]
pub struct WorkdirLocks {
    locks: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl WorkdirLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `working_dir`
    ///
    /// The directory stays locked until the returned guard is dropped.
    pub async fn acquire(&self, working_dir: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(working_dir.to_path_buf()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
