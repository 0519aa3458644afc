//! # Forensic Log
//!
//! Append-only, tamper-evident record of security events. Each entry carries
//! `hash = hex(SHA256(entry_type ‖ canonical JSON details))`; canonical JSON
//! is `serde_json`'s compact form with object keys sorted. The log is capped
//! and evicts oldest first.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_crypto::sha256_hex;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{SecurityError, SecurityResult};

/// One forensic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicLogEntry {
    pub id: Uuid,
    pub entry_type: String,
    pub timestamp: u64,
    pub details: serde_json::Value,
    pub hash: String,
}

impl ForensicLogEntry {
    /// Hash binding `entry_type` and `details`.
    pub fn compute_hash(entry_type: &str, details: &serde_json::Value) -> String {
        let mut preimage = entry_type.as_bytes().to_vec();
        preimage.extend_from_slice(details.to_string().as_bytes());
        sha256_hex(&preimage)
    }

    /// Whether the stored hash matches the content.
    pub fn verify(&self) -> bool {
        Self::compute_hash(&self.entry_type, &self.details) == self.hash
    }
}

/// Export encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format: {}", other)),
        }
    }
}

/// Quote a CSV field when needed.
pub fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Query filter; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForensicQuery {
    pub entry_type: Option<String>,
    /// Inclusive lower bound (ms)
    pub from: Option<u64>,
    /// Inclusive upper bound (ms)
    pub to: Option<u64>,
}

impl ForensicQuery {
    pub fn of_type(entry_type: impl Into<String>) -> Self {
        Self {
            entry_type: Some(entry_type.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: u64, to: u64) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    fn matches(&self, entry: &ForensicLogEntry) -> bool {
        self.entry_type
            .as_ref()
            .map_or(true, |t| *t == entry.entry_type)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp <= to)
    }
}

/// Capped, tamper-evident event log.
#[derive(Debug)]
pub struct ForensicLogger {
    entries: RwLock<VecDeque<ForensicLogEntry>>,
    max_entries: usize,
}

impl ForensicLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Append an entry and return its id.
    pub fn log(&self, entry_type: &str, details: serde_json::Value, timestamp: u64) -> Uuid {
        let entry = ForensicLogEntry {
            id: Uuid::new_v4(),
            entry_type: entry_type.to_string(),
            timestamp,
            hash: ForensicLogEntry::compute_hash(entry_type, &details),
            details,
        };
        let id = entry.id;

        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
        debug!(entry_type, %id, "Forensic entry recorded");
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<ForensicLogEntry> {
        self.entries.read().iter().find(|e| e.id == *id).cloned()
    }

    /// Entries matching `query`, oldest first.
    pub fn query(&self, query: &ForensicQuery) -> Vec<ForensicLogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Ids of entries whose hash does not match their content.
    pub fn corrupted_entries(&self) -> Vec<Uuid> {
        self.entries
            .read()
            .iter()
            .filter(|e| !e.verify())
            .map(|e| e.id)
            .collect()
    }

    /// Re-hash every entry; returns the number checked.
    pub fn verify_integrity(&self) -> SecurityResult<usize> {
        let checked = self.len();
        let corrupted = self.corrupted_entries();
        if corrupted.is_empty() {
            Ok(checked)
        } else {
            error!(corrupted = corrupted.len(), "Forensic log integrity violated");
            Err(SecurityError::IntegrityLogCorrupted {
                corrupted: corrupted.len(),
            })
        }
    }

    /// Serialize all entries.
    pub fn export(&self, format: ExportFormat) -> SecurityResult<String> {
        let entries = self.entries.read();
        match format {
            ExportFormat::Json => {
                let all: Vec<&ForensicLogEntry> = entries.iter().collect();
                serde_json::to_string_pretty(&all).map_err(|e| SecurityError::Export(e.to_string()))
            }
            ExportFormat::Csv => {
                let mut out = String::from("id,entry_type,timestamp,hash,details\n");
                for e in entries.iter() {
                    out.push_str(&format!(
                        "{},{},{},{},{}\n",
                        e.id,
                        csv_field(&e.entry_type),
                        e.timestamp,
                        e.hash,
                        csv_field(&e.details.to_string())
                    ));
                }
                Ok(out)
            }
        }
    }

    #[cfg(test)]
    fn tamper(&self, index: usize, details: serde_json::Value) {
        if let Some(entry) = self.entries.write().get_mut(index) {
            entry.details = details;
        }
    }
}

impl Default for ForensicLogger {
    fn default() -> Self {
        Self::new(10_000)
    }
}
