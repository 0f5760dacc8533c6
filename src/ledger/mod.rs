//! Dedup ledger: content hash -> processing status
//!
//! Consulted before scoring so the same bytes never reach feature extraction
//! twice. Stores are reached only through [`DedupLedger::lookup`] and
//! [`DedupLedger::record`].

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome recorded for a content hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Processed,
    LowQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub status: LedgerStatus,
    /// Submission ids that carried this content
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn new(status: LedgerStatus, id: impl Into<String>) -> Self {
        Self {
            status,
            ids: vec![id.into()],
            recorded_at: Some(Utc::now()),
        }
    }
}

/// MD5 hex digest used as the ledger key
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

pub trait DedupLedger: Send {
    fn lookup(&self, hash: &str) -> Result<Option<LedgerEntry>, LedgerError>;
    fn record(&mut self, hash: &str, entry: LedgerEntry) -> Result<(), LedgerError>;
}

/// In-memory ledger
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DedupLedger for MemoryLedger {
    fn lookup(&self, hash: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.get(hash).cloned())
    }

    fn record(&mut self, hash: &str, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.entries.insert(hash.to_string(), entry);
        Ok(())
    }
}

/// Ledger persisted as one JSON object, rewritten after every record
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    entries: HashMap<String, LedgerEntry>,
}

impl JsonFileLedger {
    /// Open the ledger at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read(&path).map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_slice(&data)?
        } else {
            HashMap::new()
        };

        debug!("Opened ledger {} with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, data).map_err(io_err)
    }
}

impl DedupLedger for JsonFileLedger {
    fn lookup(&self, hash: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.entries.get(hash).cloned())
    }

    /// The entry only stays in memory once it is on disk
    fn record(&mut self, hash: &str, entry: LedgerEntry) -> Result<(), LedgerError> {
        let previous = self.entries.insert(hash.to_string(), entry);
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.entries.insert(hash.to_string(), old),
                None => self.entries.remove(hash),
            };
            return Err(e);
        }
        Ok(())
    }
}
