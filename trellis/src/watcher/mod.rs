//! Manifest watching: periodic re-restore of the network store.
//!
//! A [`PollingObserver`] scans the manifest file and every file under its
//! directory on a short interval, accumulating modified/added/deleted
//! counters. The [`ManifestWatcher`] loop sleeps for the update period,
//! reads and resets those counters, and when anything happened re-restores
//! the manifest and atomically replaces the store's map. In-flight turns are
//! unaffected because they hold their network through providers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::network::{ManifestRestorer, NetworkStore};

/// Snapshot key for one file: mtime plus length, so rapid rewrites on
/// coarse-mtime filesystems still register as modifications.
type FileStamp = (SystemTime, u64);

/// Counters of filesystem events seen since the last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObservedEvents {
    pub modified: usize,
    pub added: usize,
    pub deleted: usize,
}

impl ObservedEvents {
    pub fn any(&self) -> bool {
        self.modified + self.added + self.deleted > 0
    }
}

/// Observer seam so an event-based implementation can replace polling.
pub trait RegistryObserver: Send + Sync {
    /// Returns the counters accumulated since the previous call, resetting them.
    fn reset_event_counters(&self) -> ObservedEvents;
}

struct ObserverState {
    snapshot: HashMap<PathBuf, FileStamp>,
    counters: ObservedEvents,
}

/// Polling observer over the manifest file and its sibling registry files.
///
/// `start` spawns a scan loop on the polling interval; each scan folds
/// differences into the counters that [`reset_event_counters`] hands out.
///
/// [`reset_event_counters`]: RegistryObserver::reset_event_counters
pub struct PollingObserver {
    manifest_path: PathBuf,
    state: Arc<Mutex<ObserverState>>,
}

impl PollingObserver {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        let manifest_path = manifest_path.into();
        // Seed the baseline so the first scan reports only real changes.
        let snapshot = scan(&manifest_path);
        Self {
            manifest_path,
            state: Arc::new(Mutex::new(ObserverState {
                snapshot,
                counters: ObservedEvents::default(),
            })),
        }
    }

    /// The polling interval for a requested update period: a quarter of the
    /// period, floored at one second.
    pub fn polling_interval(update_period: Duration) -> Duration {
        if update_period <= Duration::from_secs(5) {
            Duration::from_secs(1)
        } else {
            Duration::from_secs((update_period.as_secs() as f64 / 4.0).round() as u64)
        }
    }

    /// Spawns the scan loop.
    pub fn start(&self, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let manifest_path = self.manifest_path.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(poll_interval).await;
                accumulate(&manifest_path, &state);
            }
        })
    }

    /// One scan, folded into the counters. Exposed for tests and for callers
    /// that prefer scanning lazily over running the loop.
    pub fn scan_once(&self) {
        accumulate(&self.manifest_path, &self.state);
    }
}

fn accumulate(manifest_path: &Path, state: &Arc<Mutex<ObserverState>>) {
    let current = scan(manifest_path);
    let mut state = state.lock().unwrap_or_else(|e| e.into_inner());

    for (path, stamp) in &current {
        match state.snapshot.get(path) {
            None => state.counters.added += 1,
            Some(previous) if previous != stamp => state.counters.modified += 1,
            Some(_) => {}
        }
    }
    let deleted = state
        .snapshot
        .keys()
        .filter(|path| !current.contains_key(*path))
        .count();
    state.counters.deleted += deleted;
    state.snapshot = current;
}

fn scan(manifest_path: &Path) -> HashMap<PathBuf, FileStamp> {
    let mut stamps = HashMap::new();
    record_stamp(manifest_path, &mut stamps);
    if let Some(dir) = manifest_path.parent() {
        scan_dir(dir, &mut stamps);
    }
    stamps
}

fn record_stamp(path: &Path, stamps: &mut HashMap<PathBuf, FileStamp>) {
    if let Ok(metadata) = std::fs::metadata(path) {
        if let Ok(mtime) = metadata.modified() {
            stamps.insert(path.to_path_buf(), (mtime, metadata.len()));
        }
    }
}

fn scan_dir(dir: &Path, stamps: &mut HashMap<PathBuf, FileStamp>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, stamps);
        } else {
            record_stamp(&path, stamps);
        }
    }
}

impl RegistryObserver for PollingObserver {
    fn reset_event_counters(&self) -> ObservedEvents {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut state.counters)
    }
}

/// Periodic updater that re-restores the manifest when the observer saw
/// changes. A zero update period disables the watcher entirely.
pub struct ManifestWatcher {
    store: Arc<NetworkStore>,
    restorer: ManifestRestorer,
    observer: Arc<dyn RegistryObserver>,
    /// Kept typed so `start` can spawn the scan loop alongside the updater.
    polling: Option<Arc<PollingObserver>>,
    update_period: Duration,
}

impl ManifestWatcher {
    /// Builds a watcher with a polling observer; `start` runs both loops.
    pub fn new(
        store: Arc<NetworkStore>,
        restorer: ManifestRestorer,
        update_period: Duration,
    ) -> Self {
        let polling = Arc::new(PollingObserver::new(restorer.manifest_file()));
        let mut watcher = Self::with_observer(
            store,
            restorer,
            Arc::clone(&polling) as Arc<dyn RegistryObserver>,
            update_period,
        );
        watcher.polling = Some(polling);
        watcher
    }

    pub fn with_observer(
        store: Arc<NetworkStore>,
        restorer: ManifestRestorer,
        observer: Arc<dyn RegistryObserver>,
        update_period: Duration,
    ) -> Self {
        Self {
            store,
            restorer,
            observer,
            polling: None,
            update_period,
        }
    }

    /// Spawns the update loop, plus the observer's scan loop when the
    /// built-in polling observer is in use. Returns `None` when the period
    /// is zero.
    pub fn start(self) -> Option<tokio::task::JoinHandle<()>> {
        if self.update_period.is_zero() {
            return None;
        }
        info!(
            manifest = %self.restorer.manifest_file().display(),
            period_seconds = self.update_period.as_secs(),
            "starting manifest watcher"
        );
        if let Some(polling) = &self.polling {
            polling.start(PollingObserver::polling_interval(self.update_period));
        }
        Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(self.update_period).await;
                self.tick();
            }
        }))
    }

    /// One update cycle. Public so tests can drive it without the loop.
    pub fn tick(&self) {
        let events = self.observer.reset_event_counters();
        if !events.any() {
            return;
        }
        info!(
            modified = events.modified,
            added = events.added,
            deleted = events.deleted,
            "observed registry events, reloading manifest"
        );
        match self.restorer.restore() {
            Ok(networks) => {
                let changes = self.store.replace_all(networks);
                info!(changes = changes.len(), "network store replaced");
            }
            Err(e) => warn!(error = %e, "manifest reload failed, keeping previous store"),
        }
    }
}
