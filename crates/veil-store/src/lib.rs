pub mod ledger;
pub mod quota;
pub mod retention;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use tracing::{error, info, warn};

use veil_types::Snapshot;

pub use ledger::{MatchKind, Resolved};
pub use quota::{DAILY_MESSAGE_LIMIT, QuotaStatus};

/// File-backed snapshot store.
///
/// The whole bot state lives in one JSON file that is read, pruned, mutated
/// in memory, and rewritten in full on every operation. A single mutex
/// serializes each load-mutate-save cycle so concurrent handlers cannot
/// clobber each other's writes.
///
/// The store is fail-soft on both ends: a missing or unparseable file yields
/// an empty snapshot, and write failures are logged and swallowed. The bot
/// keeps answering even when its disk does not.
pub struct SnapshotStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SnapshotStore {
    /// Create a store handle. Does no I/O; the file is created lazily on
    /// first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Snapshot store at {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only access. Loads the snapshot, prunes expired records (writing
    /// the pruned state back if anything was dropped), and runs `f` on the
    /// result.
    pub fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.load_pruned();
        f(&snapshot)
    }

    /// Mutating access. Same load-and-prune as [`read`](Self::read), then
    /// runs `f` and rewrites the file with whatever `f` left behind.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Snapshot) -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = self.load_pruned();
        let out = f(&mut snapshot);
        self.save(&snapshot);
        out
    }

    fn load_pruned(&self) -> Snapshot {
        let mut snapshot = self.load();
        if retention::prune(&mut snapshot, Local::now()) {
            self.save(&snapshot);
        }
        snapshot
    }

    fn load(&self) -> Snapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Snapshot::default(),
            Err(e) => {
                warn!("Failed to read {}: {e}; starting empty", self.path.display());
                return Snapshot::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to parse {}: {e}; starting empty", self.path.display());
                Snapshot::default()
            }
        }
    }

    fn save(&self, snapshot: &Snapshot) {
        let json = match serde_json::to_string_pretty(snapshot) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize snapshot: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            error!("Failed to write {}: {e}", self.path.display());
        }
    }
}
