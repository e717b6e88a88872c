use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::FileDialogError;
use crate::entry::{DirEntry, EntryId, EntryKind};
use crate::fs::FileSystem;

/// Default per-scan deadline.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of one committed (or failed) scan, surfaced by [`ScanCoordinator::poll`].
#[derive(Debug)]
pub enum ScanCommit {
    /// A fresh listing replaced the previous one.
    Committed {
        /// Directory that was scanned.
        path: PathBuf,
        /// Ordered entries: parent link, directories, then files.
        entries: Vec<DirEntry>,
    },
    /// The scan failed; the previous listing stays in place.
    Failed {
        /// Directory whose scan failed.
        path: PathBuf,
        /// What went wrong.
        error: FileDialogError,
    },
}

struct ScanOutcome {
    generation: u64,
    path: PathBuf,
    result: Result<Vec<DirEntry>, FileDialogError>,
}

struct ActiveScan {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    deadline: Instant,
    path: PathBuf,
}

/// Owns the single in-flight directory scan.
///
/// `begin_scan` cancels whatever is running, issues a fresh generation token
/// with a deadline, and spawns the enumeration on a background thread. The
/// frame thread drains outcomes through `poll`; only the outcome matching the
/// live token commits, so a slow older scan can never clobber a newer one.
pub struct ScanCoordinator {
    fs: Arc<dyn FileSystem>,
    folder_only: bool,
    timeout: Duration,
    debounce: Duration,
    tx: Sender<ScanOutcome>,
    rx: Receiver<ScanOutcome>,
    generation: u64,
    active: Option<ActiveScan>,
    pending: Option<PathBuf>,
    last_spawn: Option<Instant>,
}

impl ScanCoordinator {
    /// New coordinator. `folder_only` drops file entries from listings.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        folder_only: bool,
        timeout: Duration,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = channel();
        Self {
            fs,
            folder_only,
            timeout,
            debounce,
            tx,
            rx,
            generation: 0,
            active: None,
            pending: None,
            last_spawn: None,
        }
    }

    /// Request a scan of `path`, cancelling any scan in flight.
    ///
    /// Within the debounce window the path is parked instead and promoted by
    /// the next `poll` once the window has passed; only the latest parked
    /// path survives.
    pub fn begin_scan(&mut self, path: PathBuf) {
        self.cancel_active();
        if self.debounce > Duration::ZERO {
            if let Some(t) = self.last_spawn {
                if t.elapsed() < self.debounce {
                    self.pending = Some(path);
                    return;
                }
            }
        }
        self.pending = None;
        self.spawn(path);
    }

    /// Whether a scan is currently in flight or parked.
    pub fn is_loading(&self) -> bool {
        self.active.is_some() || self.pending.is_some()
    }

    /// Cancel everything in flight; outstanding outcomes will be discarded.
    pub fn close(&mut self) {
        self.cancel_active();
        self.pending = None;
    }

    /// Drain worker outcomes. Returns the newest commit for the live token,
    /// if one arrived this frame.
    pub fn poll(&mut self) -> Option<ScanCommit> {
        if let Some(path) = self.pending.take() {
            let elapsed = self
                .last_spawn
                .map(|t| t.elapsed() >= self.debounce)
                .unwrap_or(true);
            if elapsed {
                self.spawn(path);
            } else {
                self.pending = Some(path);
            }
        }

        let mut commit = None;
        while let Ok(outcome) = self.rx.try_recv() {
            let current = self
                .active
                .as_ref()
                .map(|a| a.generation == outcome.generation && !a.cancelled.load(Ordering::Relaxed))
                .unwrap_or(false);
            if !current {
                trace_scan_dropped_stale(outcome.generation, &outcome.path);
                continue;
            }
            self.active = None;
            commit = Some(match outcome.result {
                Ok(entries) => {
                    trace_scan_committed(outcome.generation, &outcome.path, entries.len());
                    ScanCommit::Committed {
                        path: outcome.path,
                        entries,
                    }
                }
                Err(error) => ScanCommit::Failed {
                    path: outcome.path,
                    error,
                },
            });
        }

        // A worker stuck past its deadline: fail the scan from this side and
        // orphan the token so a late outcome is dropped.
        if commit.is_none() {
            if let Some(a) = &self.active {
                if Instant::now() >= a.deadline {
                    a.cancelled.store(true, Ordering::Relaxed);
                    let path = a.path.clone();
                    self.active = None;
                    commit = Some(ScanCommit::Failed {
                        path,
                        error: FileDialogError::Interrupted,
                    });
                }
            }
        }
        commit
    }

    fn cancel_active(&mut self) {
        if let Some(a) = self.active.take() {
            a.cancelled.store(true, Ordering::Relaxed);
        }
    }

    fn spawn(&mut self, path: PathBuf) {
        self.generation += 1;
        let generation = self.generation;
        let cancelled = Arc::new(AtomicBool::new(false));
        let deadline = Instant::now() + self.timeout;
        trace_scan_requested(generation, &path);
        self.active = Some(ActiveScan {
            generation,
            cancelled: cancelled.clone(),
            deadline,
            path: path.clone(),
        });
        self.last_spawn = Some(Instant::now());

        let fs = self.fs.clone();
        let folder_only = self.folder_only;
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                scan_directory(&*fs, &path, generation, folder_only, &cancelled, deadline)
            }))
            .unwrap_or_else(|_| {
                Err(FileDialogError::Internal("scan task panicked".to_string()))
            });
            let _ = tx.send(ScanOutcome {
                generation,
                path,
                result,
            });
        });
    }
}

/// Enumerate a directory into ordered entries: an optional `..` parent link,
/// then directories, then files. Checks the cancellation token and deadline
/// between entries so an orphaned scan stops early.
fn scan_directory(
    fs: &dyn FileSystem,
    dir: &Path,
    generation: u64,
    folder_only: bool,
    cancelled: &AtomicBool,
    deadline: Instant,
) -> Result<Vec<DirEntry>, FileDialogError> {
    let raw = fs.read_dir(dir)?;
    let mut out = Vec::with_capacity(raw.len() + 1);
    let mut index: u32 = 0;

    if let Some(parent) = dir.parent() {
        out.push(DirEntry {
            id: EntryId::new(generation, index),
            name: "..".to_string(),
            path: parent.to_path_buf(),
            kind: EntryKind::ParentLink,
            size: None,
            modified: None,
        });
        index += 1;
    }

    let (mut dirs, mut files): (Vec<_>, Vec<_>) = raw.into_iter().partition(|e| e.is_dir);
    dirs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    files.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    for e in dirs.into_iter().chain(if folder_only { Vec::new() } else { files }) {
        if cancelled.load(Ordering::Relaxed) || Instant::now() >= deadline {
            return Err(FileDialogError::Interrupted);
        }
        out.push(DirEntry {
            id: EntryId::new(generation, index),
            name: e.name,
            path: e.path,
            kind: if e.is_dir { EntryKind::Dir } else { EntryKind::File },
            size: e.size,
            modified: e.modified,
        });
        index += 1;
    }
    Ok(out)
}

#[cfg(feature = "tracing")]
fn trace_scan_requested(generation: u64, path: &Path) {
    tracing::debug!(generation, path = %path.display(), "scan requested");
}
#[cfg(not(feature = "tracing"))]
fn trace_scan_requested(_generation: u64, _path: &Path) {}

#[cfg(feature = "tracing")]
fn trace_scan_committed(generation: u64, path: &Path, entries: usize) {
    tracing::debug!(generation, path = %path.display(), entries, "scan committed");
}
#[cfg(not(feature = "tracing"))]
fn trace_scan_committed(_generation: u64, _path: &Path, _entries: usize) {}

#[cfg(feature = "tracing")]
fn trace_scan_dropped_stale(generation: u64, path: &Path) {
    tracing::trace!(generation, path = %path.display(), "stale scan outcome dropped");
}
#[cfg(not(feature = "tracing"))]
fn trace_scan_dropped_stale(_generation: u64, _path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FsEntry, FsMetadata, StdFileSystem};

    struct SlowFs {
        delay: Duration,
    }

    impl FileSystem for SlowFs {
        fn read_dir(&self, _dir: &Path) -> std::io::Result<Vec<FsEntry>> {
            std::thread::sleep(self.delay);
            Ok(Vec::new())
        }

        fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
            Ok(path.to_path_buf())
        }

        fn metadata(&self, _path: &Path) -> std::io::Result<FsMetadata> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "mock"))
        }
    }

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("file-browser-core-{tag}-{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn poll_until_commit(c: &mut ScanCoordinator) -> ScanCommit {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(commit) = c.poll() {
                return commit;
            }
            assert!(Instant::now() < deadline, "scan did not complete");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn lists_dirs_before_files_with_parent_link() {
        let dir = unique_temp_dir("order");
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("a.txt"), b"x").unwrap();

        let mut c = ScanCoordinator::new(
            Arc::new(StdFileSystem),
            false,
            DEFAULT_SCAN_TIMEOUT,
            Duration::ZERO,
        );
        c.begin_scan(dir.clone());
        match poll_until_commit(&mut c) {
            ScanCommit::Committed { entries, .. } => {
                let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
                assert_eq!(names, vec!["..", "sub", "a.txt"]);
                assert_eq!(entries[0].kind, EntryKind::ParentLink);
                assert_eq!(entries[1].size, None);
                assert_eq!(entries[2].size, Some(1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!c.is_loading());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn folder_only_drops_files() {
        let dir = unique_temp_dir("folders");
        std::fs::create_dir(dir.join("sub")).unwrap();
        std::fs::write(dir.join("a.txt"), b"x").unwrap();

        let mut c = ScanCoordinator::new(
            Arc::new(StdFileSystem),
            true,
            DEFAULT_SCAN_TIMEOUT,
            Duration::ZERO,
        );
        c.begin_scan(dir.clone());
        match poll_until_commit(&mut c) {
            ScanCommit::Committed { entries, .. } => {
                assert!(entries.iter().all(|e| e.kind.is_dir()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_directory_fails_without_panic() {
        let mut c = ScanCoordinator::new(
            Arc::new(StdFileSystem),
            false,
            DEFAULT_SCAN_TIMEOUT,
            Duration::ZERO,
        );
        c.begin_scan(PathBuf::from("/definitely/not/here/xyz"));
        match poll_until_commit(&mut c) {
            ScanCommit::Failed { error, .. } => {
                assert!(matches!(error, FileDialogError::Io(_)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn deadline_fails_scan_stuck_past_timeout() {
        let mut c = ScanCoordinator::new(
            Arc::new(SlowFs {
                delay: Duration::from_millis(200),
            }),
            false,
            Duration::from_millis(30),
            Duration::ZERO,
        );
        c.begin_scan(PathBuf::from("/slow"));
        match poll_until_commit(&mut c) {
            ScanCommit::Failed { path, error } => {
                assert_eq!(path, PathBuf::from("/slow"));
                assert!(matches!(error, FileDialogError::Interrupted));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!c.is_loading());
        // the worker's late result is orphaned, not committed
        std::thread::sleep(Duration::from_millis(250));
        assert!(c.poll().is_none());
    }

    #[test]
    fn debounce_parks_and_promotes_latest_path() {
        let dir_a = unique_temp_dir("deb-a");
        let dir_b = unique_temp_dir("deb-b");
        std::fs::write(dir_b.join("b.txt"), b"x").unwrap();

        let mut c = ScanCoordinator::new(
            Arc::new(StdFileSystem),
            false,
            DEFAULT_SCAN_TIMEOUT,
            Duration::from_millis(30),
        );
        c.begin_scan(dir_a.clone());
        // Within the window: both parked, only the last survives.
        c.begin_scan(dir_a.clone());
        c.begin_scan(dir_b.clone());
        assert!(c.is_loading());

        let deadline = Instant::now() + Duration::from_secs(5);
        let commit = loop {
            if let Some(commit) = c.poll() {
                break commit;
            }
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        };
        match commit {
            ScanCommit::Committed { path, entries } => {
                assert_eq!(path, dir_b);
                assert!(entries.iter().any(|e| e.name == "b.txt"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let _ = std::fs::remove_dir_all(dir_a);
        let _ = std::fs::remove_dir_all(dir_b);
    }
}
