//! The tiered audit logger.
//!
//! Critical events are chained and persisted synchronously before
//! `log_event` returns; everything else is enqueued to a bounded queue
//! drained by a background batcher (batch size or flush interval, whichever
//! trips first). A full queue falls back to a synchronous write on the hot
//! chain, so no event is ever silently dropped.
//!
//! The in-memory chain hash only advances after a successful file append,
//! so a failed write leaves disk continuity intact.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use vortex_domain::constants::audit::{
    GENESIS_HASH, HOT_BATCH_SIZE, HOT_FLUSH_INTERVAL_MS, HOT_QUEUE_CAPACITY,
};
use vortex_domain::entities::{AuditEntry, ChainedEntry, is_critical_event};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::audit::AuditSink;

/// Audit logger tuning.
#[derive(Debug, Clone)]
pub struct AuditLogSettings {
    /// Directory holding the chain files
    pub dir: PathBuf,
    /// Hot-chain batch size trigger
    pub batch_size: usize,
    /// Hot-chain flush interval
    pub flush_interval: Duration,
    /// Hot queue capacity; overflow falls back to a sync write
    pub queue_capacity: usize,
}

impl AuditLogSettings {
    /// Default settings rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            batch_size: HOT_BATCH_SIZE,
            flush_interval: Duration::from_millis(HOT_FLUSH_INTERVAL_MS),
            queue_capacity: HOT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ChainStateFile {
    critical: String,
    hot: String,
    updated_at: String,
}

struct ChainState {
    critical: String,
    hot: String,
}

struct AuditFiles {
    critical_path: PathBuf,
    hot_path: PathBuf,
    state_path: PathBuf,
    chains: Mutex<ChainState>,
}

impl AuditFiles {
    fn load(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::io_with_source("create audit directory", e))?;
        let state_path = dir.join("audit_chain.state");

        let mut critical = GENESIS_HASH.to_owned();
        let mut hot = GENESIS_HASH.to_owned();
        if let Ok(content) = std::fs::read_to_string(&state_path) {
            match serde_json::from_str::<ChainStateFile>(&content) {
                Ok(state) => {
                    critical = state.critical;
                    hot = state.hot;
                }
                Err(e) => {
                    tracing::error!(error = %e, "audit chain state unreadable; restarting chains");
                }
            }
        }

        Ok(Self {
            critical_path: dir.join("audit_critical.jsonl"),
            hot_path: dir.join("audit_hot.jsonl"),
            state_path,
            chains: Mutex::new(ChainState { critical, hot }),
        })
    }

    fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::io_with_source("open audit file", e))?;
        for line in lines {
            writeln!(file, "{line}").map_err(|e| Error::io_with_source("append audit entry", e))?;
        }
        file.flush()
            .map_err(|e| Error::io_with_source("flush audit file", e))?;
        Ok(())
    }

    fn save_state(&self, critical: &str, hot: &str) {
        let state = ChainStateFile {
            critical: critical.to_owned(),
            hot: hot.to_owned(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        match serde_json::to_vec(&state) {
            Ok(body) => {
                if let Err(e) = std::fs::write(&self.state_path, body) {
                    tracing::error!(error = %e, "audit chain state save failed");
                }
            }
            Err(e) => tracing::error!(error = %e, "audit chain state serialization failed"),
        }
    }

    /// Chain and persist entries on the critical chain.
    fn write_critical(&self, entry: AuditEntry) {
        let Ok(mut chains) = self.chains.lock() else {
            tracing::error!("audit chain lock poisoned; critical entry lost");
            return;
        };
        let chained = ChainedEntry::chain(entry, &chains.critical);
        let Ok(line) = serde_json::to_string(&chained) else {
            tracing::error!("audit entry serialization failed");
            return;
        };
        match Self::append_lines(&self.critical_path, &[line]) {
            Ok(()) => {
                chains.critical = chained.hash;
                self.save_state(&chains.critical, &chains.hot);
            }
            Err(e) => {
                tracing::error!(error = %e, "CRITICAL AUDIT WRITE FAILED");
            }
        }
    }

    /// Chain and persist a batch on the hot chain.
    fn write_hot(&self, entries: Vec<AuditEntry>) {
        if entries.is_empty() {
            return;
        }
        let Ok(mut chains) = self.chains.lock() else {
            tracing::error!("audit chain lock poisoned; hot batch lost");
            return;
        };

        let mut prev = chains.hot.clone();
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            let chained = ChainedEntry::chain(entry, &prev);
            prev = chained.hash.clone();
            match serde_json::to_string(&chained) {
                Ok(line) => lines.push(line),
                Err(e) => tracing::error!(error = %e, "audit entry serialization failed"),
            }
        }

        match Self::append_lines(&self.hot_path, &lines) {
            Ok(()) => {
                chains.hot = prev;
                self.save_state(&chains.critical, &chains.hot);
            }
            Err(e) => {
                tracing::error!(error = %e, "audit hot batch flush failed");
            }
        }
    }
}

/// The tiered audit logger. Cloneable; the background batcher is owned by
/// the application lifetime and stops when every clone is dropped.
#[derive(Clone)]
pub struct AuditLog {
    files: Arc<AuditFiles>,
    hot_tx: mpsc::Sender<AuditEntry>,
}

impl AuditLog {
    /// Open (or continue) the chains under `settings.dir` and start the
    /// hot-chain batcher.
    ///
    /// # Errors
    /// Returns an error when the audit directory cannot be created.
    pub fn start(settings: AuditLogSettings) -> Result<Self> {
        let files = Arc::new(AuditFiles::load(&settings.dir)?);
        let (hot_tx, hot_rx) = mpsc::channel(settings.queue_capacity);

        let worker_files = Arc::clone(&files);
        tokio::spawn(run_batcher(
            worker_files,
            hot_rx,
            settings.batch_size,
            settings.flush_interval,
        ));
        tracing::info!(dir = %settings.dir.display(), "audit logger started");

        Ok(Self { files, hot_tx })
    }

    /// Path of the critical chain file.
    #[must_use]
    pub fn critical_path(&self) -> PathBuf {
        self.files.critical_path.clone()
    }

    /// Path of the hot chain file.
    #[must_use]
    pub fn hot_path(&self) -> PathBuf {
        self.files.hot_path.clone()
    }

    fn make_entry(event_type: &str, data: serde_json::Value) -> AuditEntry {
        AuditEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type: event_type.to_owned(),
            data,
        }
    }
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn log_event(&self, event_type: &str, data: serde_json::Value) {
        if event_type.is_empty() {
            return;
        }
        let entry = Self::make_entry(event_type, data);

        if is_critical_event(event_type) {
            self.files.write_critical(entry);
            return;
        }

        if let Err(mpsc::error::TrySendError::Full(entry)) = self.hot_tx.try_send(entry) {
            tracing::warn!("audit queue full; falling back to sync hot write");
            self.files.write_hot(vec![entry]);
        }
    }
}

async fn run_batcher(
    files: Arc<AuditFiles>,
    mut rx: mpsc::Receiver<AuditEntry>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut batch: Vec<AuditEntry> = Vec::new();
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => {
                match received {
                    Some(entry) => {
                        batch.push(entry);
                        if batch.len() >= batch_size {
                            files.write_hot(std::mem::take(&mut batch));
                        }
                    }
                    None => {
                        files.write_hot(std::mem::take(&mut batch));
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    files.write_hot(std::mem::take(&mut batch));
                }
            }
        }
    }
}
