//! Append-only classification cache
//!
//! The cache file holds one JSON object per line:
//!
//! ```text
//! {"key":"<sha256>","result":{"category_slug":"cocktails","confidence":0.9,...},"created_at":"2025-01-01T00:00:00Z"}
//! ```
//!
//! On open the whole file is read into an in-memory index; malformed lines are
//! skipped. Lookups only touch the index. Inserts update the index and hand the
//! serialized line to a single writer task, which is the only code that ever
//! touches the file, so concurrent workers never interleave partial lines.
//! Existing lines are never rewritten; a later line for the same key wins on
//! the next load.
//!
//! Every I/O failure is logged and otherwise ignored. A broken cache degrades
//! to "no cache", it never fails a note.

use chrono::{DateTime, Utc};
use quire_core::{ClassificationResult, ClassifyError, ClassifyResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// One line of the cache file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content-addressed key
    pub key: String,
    /// Raw provider result
    pub result: ClassificationResult,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

/// What was found when the cache file was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Distinct keys loaded
    pub entries: usize,
    /// Lines that could not be parsed
    pub skipped_lines: usize,
}

enum WriteCommand {
    Append(String),
    Flush(oneshot::Sender<()>),
}

/// Content-addressed store of classification results
pub struct CacheStore {
    path: Option<PathBuf>,
    index: RwLock<HashMap<String, ClassificationResult>>,
    writer: Option<mpsc::UnboundedSender<WriteCommand>>,
    write_errors: Arc<AtomicUsize>,
    load_stats: LoadStats,
}

impl CacheStore {
    /// A cache that never hits and never writes
    pub fn disabled() -> Self {
        Self {
            path: None,
            index: RwLock::new(HashMap::new()),
            writer: None,
            write_errors: Arc::new(AtomicUsize::new(0)),
            load_stats: LoadStats::default(),
        }
    }

    /// Open (or lazily create) the cache file at `path`
    ///
    /// Must be called inside a Tokio runtime; the writer task is spawned here.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (index, load_stats) = load_index(&path).await;

        let write_errors = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(path.clone(), rx, Arc::clone(&write_errors)));

        Self {
            path: Some(path),
            index: RwLock::new(index),
            writer: Some(tx),
            write_errors,
            load_stats,
        }
    }

    /// Whether results are being persisted
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Backing file, when enabled
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stats from opening the file
    pub fn load_stats(&self) -> LoadStats {
        self.load_stats
    }

    /// Failed file writes so far
    pub fn write_errors(&self) -> usize {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Number of keys in the index
    pub fn len(&self) -> usize {
        self.index.read().map(|idx| idx.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached result for `key`
    pub fn lookup(&self, key: &str) -> Option<ClassificationResult> {
        if !self.is_enabled() {
            return None;
        }
        let index = self.index.read().unwrap_or_else(|e| e.into_inner());
        index.get(key).cloned()
    }

    /// Record a result and append it to the file
    pub fn insert(&self, key: &str, result: &ClassificationResult) {
        let Some(writer) = &self.writer else {
            return;
        };

        self.index
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), result.clone());

        let entry = CacheEntry {
            key: key.to_string(),
            result: result.clone(),
            created_at: Utc::now(),
        };
        let line = match serde_json::to_string(&entry) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => {
                warn!(error = %e, "Could not serialize cache entry");
                return;
            }
        };

        if writer.send(WriteCommand::Append(line)).is_err() {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Cache writer has stopped; entry kept in memory only");
        }
    }

    /// Wait until every entry inserted so far has been written
    pub async fn flush(&self) -> ClassifyResult<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        writer
            .send(WriteCommand::Flush(ack_tx))
            .map_err(|_| ClassifyError::cache_io("cache writer has stopped"))?;
        ack_rx
            .await
            .map_err(|_| ClassifyError::cache_io("cache writer stopped before flushing"))
    }
}

async fn load_index(path: &Path) -> (HashMap<String, ClassificationResult>, LoadStats) {
    let mut index = HashMap::new();
    let mut stats = LoadStats::default();

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No cache file yet");
            return (index, stats);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file unreadable; starting empty");
            return (index, stats);
        }
    };

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CacheEntry>(line) {
            Ok(entry) => {
                index.insert(entry.key, entry.result);
            }
            Err(_) => stats.skipped_lines += 1,
        }
    }
    stats.entries = index.len();

    if stats.skipped_lines > 0 {
        warn!(
            path = %path.display(),
            skipped = stats.skipped_lines,
            "Ignored malformed cache lines"
        );
    }
    info!(path = %path.display(), entries = stats.entries, "Loaded classification cache");
    (index, stats)
}

async fn open_for_append(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

async fn run_writer(
    path: PathBuf,
    mut rx: mpsc::UnboundedReceiver<WriteCommand>,
    errors: Arc<AtomicUsize>,
) {
    let mut file: Option<tokio::fs::File> = None;

    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Append(line) => {
                if file.is_none() {
                    match open_for_append(&path).await {
                        Ok(f) => file = Some(f),
                        Err(e) => {
                            errors.fetch_add(1, Ordering::Relaxed);
                            warn!(path = %path.display(), error = %e, "Cannot open cache file for writing");
                            continue;
                        }
                    }
                }
                if let Some(f) = file.as_mut() {
                    if let Err(e) = f.write_all(line.as_bytes()).await {
                        errors.fetch_add(1, Ordering::Relaxed);
                        warn!(path = %path.display(), error = %e, "Cache write failed");
                    }
                }
            }
            WriteCommand::Flush(ack) => {
                if let Some(f) = file.as_mut() {
                    if let Err(e) = f.flush().await {
                        errors.fetch_add(1, Ordering::Relaxed);
                        warn!(path = %path.display(), error = %e, "Cache flush failed");
                    }
                }
                let _ = ack.send(());
            }
        }
    }

    if let Some(f) = file.as_mut() {
        if let Err(e) = f.flush().await {
            warn!(path = %path.display(), error = %e, "Cache flush on shutdown failed");
        }
    }
}
