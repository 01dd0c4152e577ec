use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use walkdir::WalkDir;

/// State of one cached directory size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeState {
    /// A walk has been scheduled and has not written its result yet
    Pending,
    Ready(u64),
}

/// Shared, process-lifetime map of directory path to computed size.
///
/// Entries are never evicted. A path moves from unset to `Pending` through
/// [`SizeCache::mark_pending`], which is the only way to obtain permission to
/// schedule a walk, and from `Pending` to `Ready` through [`SizeCache::complete`].
#[derive(Debug, Default)]
pub struct SizeCache {
    entries: Mutex<HashMap<PathBuf, SizeState>>,
    /// Number of `Pending` entries, readable without the lock
    in_flight: AtomicUsize,
}

impl SizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, SizeState>> {
        // A panicking walker cannot leave the map half-written, so a poisoned
        // lock still guards consistent data.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, path: &Path) -> Option<SizeState> {
        self.lock().get(path).copied()
    }

    /// Final size for `path`, `None` while unset or pending.
    pub fn size_of(&self, path: &Path) -> Option<u64> {
        match self.get(path) {
            Some(SizeState::Ready(size)) => Some(size),
            _ => None,
        }
    }

    /// Atomically mark `path` as pending if it has no entry yet.
    /// Returns true when the caller now owns the single in-flight computation.
    pub fn mark_pending(&self, path: &Path) -> bool {
        let mut entries = self.lock();
        if entries.contains_key(path) {
            return false;
        }
        entries.insert(path.to_path_buf(), SizeState::Pending);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub fn complete(&self, path: &Path, size: u64) {
        let previous = self.lock().insert(path.to_path_buf(), SizeState::Ready(size));
        if previous == Some(SizeState::Pending) {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Sum of the sizes of all regular files below `path`.
///
/// Unreadable entries are skipped. Returns `None` if `cancel_flag` was raised
/// before the walk finished.
pub fn calculate_dir_size(path: &Path, cancel_flag: &AtomicBool) -> Option<u64> {
    let mut total: u64 = 0;
    for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
        if cancel_flag.load(Ordering::Relaxed) {
            return None;
        }
        if entry.file_type().is_file() {
            if let Ok(metadata) = entry.metadata() {
                total += metadata.len();
            }
        }
    }
    Some(total)
}

/// Bounded pool of threads that compute directory sizes into a [`SizeCache`].
///
/// Jobs queue up without limit but at most `workers` walks run at once.
/// Dropping the pool raises the cancel flag, closes the queue and joins the
/// threads.
pub struct SizeWorkers {
    sender: Option<Sender<PathBuf>>,
    cancel_flag: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    submitted: AtomicUsize,
}

impl SizeWorkers {
    pub fn spawn(cache: Arc<SizeCache>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = crossbeam_channel::unbounded::<PathBuf>();
        let cancel_flag = Arc::new(AtomicBool::new(false));

        let handles = (0..workers)
            .filter_map(|i| {
                let rx = rx.clone();
                let cache = cache.clone();
                let cancel_flag = cancel_flag.clone();
                thread::Builder::new()
                    .name(format!("size-worker-{}", i))
                    .spawn(move || worker_loop(rx, cache, cancel_flag))
                    .map_err(|e| tracing::warn!("failed to start size worker {}: {}", i, e))
                    .ok()
            })
            .collect();

        Self {
            sender: Some(tx),
            cancel_flag,
            handles,
            submitted: AtomicUsize::new(0),
        }
    }

    fn submit(&self, path: PathBuf) {
        if let Some(ref sender) = self.sender {
            self.submitted.fetch_add(1, Ordering::Relaxed);
            if sender.send(path).is_err() {
                tracing::warn!("size queue closed, job dropped");
            }
        }
    }

    /// Number of walks handed to the pool so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn shutdown(&mut self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
        self.sender = None;
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for SizeWorkers {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(rx: Receiver<PathBuf>, cache: Arc<SizeCache>, cancel_flag: Arc<AtomicBool>) {
    while let Ok(path) = rx.recv() {
        if cancel_flag.load(Ordering::Relaxed) {
            break;
        }
        tracing::debug!("sizing {}", path.display());
        match calculate_dir_size(&path, &cancel_flag) {
            Some(size) => {
                tracing::debug!("sized {} = {} bytes", path.display(), size);
                cache.complete(&path, size);
            }
            None => break,
        }
    }
}

/// Cache plus the pool that feeds it; the handle components receive.
pub struct SizeTracker {
    cache: Arc<SizeCache>,
    workers: SizeWorkers,
}

impl SizeTracker {
    pub fn new(workers: usize) -> Self {
        let cache = Arc::new(SizeCache::new());
        let workers = SizeWorkers::spawn(cache.clone(), workers);
        Self { cache, workers }
    }

    pub fn cache(&self) -> &SizeCache {
        &self.cache
    }

    /// Final size of the directory at `path`, scheduling a walk the first
    /// time it is asked for. Repeated calls while the walk runs schedule nothing.
    pub fn directory_size(&self, path: &Path) -> Option<u64> {
        if let Some(size) = self.cache.size_of(path) {
            return Some(size);
        }
        if self.cache.mark_pending(path) {
            self.workers.submit(path.to_path_buf());
        }
        None
    }

    pub fn is_busy(&self) -> bool {
        self.cache.pending_count() > 0
    }

    pub fn jobs_submitted(&self) -> usize {
        self.workers.submitted()
    }

    pub fn shutdown(&mut self) {
        self.workers.shutdown();
    }
}
