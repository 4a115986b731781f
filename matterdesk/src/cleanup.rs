//! Deletion of temporary documents once the editor holding them lets go.
//!
//! Generated documents are opened in an external editor that keeps them locked. The
//! watcher runs on its own thread, polls the lock and deletes the file when it is released.
//! It never reports back: failures only go to the log.

use crate::clock::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
            interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupOutcome {
    Deleted,
    AlreadyGone,
    TimedOut,
}

/// A file is considered released when it can be opened for writing.
pub fn is_unlocked(path: &Path) -> bool {
    OpenOptions::new().append(true).open(path).is_ok()
}

fn watch_with<F>(path: &Path, policy: CleanupPolicy, clock: &dyn Clock, is_free: F) -> CleanupOutcome
where
    F: Fn(&Path) -> bool,
{
    let start = clock.now();
    while clock.now().saturating_sub(start) < policy.timeout {
        if !path.exists() {
            info!("Temp file already deleted: {}", path.display());
            return CleanupOutcome::AlreadyGone;
        }
        if is_free(path) {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    info!("Temp file deleted: {}", path.display());
                    return CleanupOutcome::Deleted;
                }
                Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
            }
        } else {
            debug!("{} still locked", path.display());
        }
        clock.sleep(policy.interval);
    }
    warn!(
        "Gave up on {} after {:?}: file still in use or deletion failed",
        path.display(),
        policy.timeout
    );
    CleanupOutcome::TimedOut
}

/// Blocks until `path` is deleted, already gone, or the policy timeout passes.
pub fn watch_until_released(path: &Path, policy: CleanupPolicy, clock: &dyn Clock) -> CleanupOutcome {
    watch_with(path, policy, clock, is_unlocked)
}

/// Starts a watcher thread for `path`. The handle may be dropped to detach it.
pub fn spawn_cleanup(path: PathBuf, policy: CleanupPolicy) -> std::io::Result<JoinHandle<CleanupOutcome>> {
    info!("Watching temp file for release: {}", path.display());
    std::thread::Builder::new()
        .name("temp-doc-cleanup".to_string())
        .spawn(move || watch_until_released(&path, policy, &SystemClock::new()))
}
