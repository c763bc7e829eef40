//! Durable commitment records, one JSON file per label.
//!
//! The store is the resumability boundary between a commit invocation and a
//! later reveal invocation. Records are keyed by the canonical label, so runs
//! on disjoint labels never touch the same file. Concurrent runs on the same
//! label are not guarded (no file locking).

use alloy::primitives::{Address, TxHash, B256};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ens::contracts::CommitmentParams;
use crate::ens::label::EnsLabel;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Persisted position of a label in the commit-reveal protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    /// Secret stored, commit transaction broadcast but not yet confirmed.
    CommitSent,
    /// Commit confirmed on-chain; waiting out the minimum age.
    Maturing,
    /// Registration confirmed.
    Registered,
    /// Resolver and records applied without failures.
    RecordsSet,
}

/// Everything needed to reveal a commitment from a fresh process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub label: EnsLabel,
    pub name: String,
    pub owner: Address,
    pub secret: B256,
    pub commitment: B256,
    pub duration_secs: u64,
    pub status: CommitmentStatus,
    /// Wall-clock time the secret was generated (ms since epoch).
    pub created_at_ms: u64,
    /// Wall-clock time the commit was confirmed (ms since epoch).
    pub committed_at_ms: u64,
    #[serde(default)]
    pub commit_tx: Option<TxHash>,
    #[serde(default)]
    pub register_tx: Option<TxHash>,
}

impl CommitmentRecord {
    /// Reconstruct the parameters the commitment was computed from.
    pub fn params(&self) -> CommitmentParams {
        CommitmentParams {
            label: self.label.as_str().to_string(),
            owner: self.owner,
            duration_secs: self.duration_secs,
            secret: self.secret,
        }
    }

    /// Age of the confirmed commitment in whole seconds.
    pub fn age_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.committed_at_ms) / 1000
    }

    /// Earliest wall-clock time (ms) at which a reveal may be submitted.
    pub fn reveal_after_ms(&self, min_age_secs: u64) -> u64 {
        self.committed_at_ms
            .saturating_add(min_age_secs.saturating_mul(1000))
    }

    /// Return a copy advanced to `status`.
    pub fn with_status(&self, status: CommitmentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// File-backed commitment store.
#[derive(Debug, Clone)]
pub struct CommitmentStore {
    dir: PathBuf,
}

impl CommitmentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `label`.
    pub fn path_for(&self, label: &EnsLabel) -> PathBuf {
        self.dir.join(format!("commit-{}.json", label.as_str()))
    }

    /// Persist `record`, replacing any earlier record for the same label.
    ///
    /// Written to a sibling temp file and renamed, so a crash never leaves a
    /// truncated record behind.
    pub fn save(&self, record: &CommitmentRecord) -> OrchestratorResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| store_error("create store directory", &self.dir, e))?;

        let path = self.path_for(&record.label);
        let tmp = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp).map_err(|e| store_error("create", &tmp, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, record)
                .map_err(|e| OrchestratorError::Store(format!("serialize {}: {}", record.label, e)))?;
            writer.flush().map_err(|e| store_error("flush", &tmp, e))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| store_error("sync", &tmp, e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| store_error("rename", &path, e))?;

        tracing::debug!(label = %record.label, status = ?record.status, path = %path.display(), "Commitment record saved");
        Ok(path)
    }

    /// Load the record for `label`; `None` when no record exists.
    pub fn load(&self, label: &EnsLabel) -> OrchestratorResult<Option<CommitmentRecord>> {
        let path = self.path_for(label);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|e| store_error("open", &path, e))?;
        let record: CommitmentRecord = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| OrchestratorError::Store(format!("corrupt record {}: {}", path.display(), e)))?;

        if &record.label != label {
            return Err(OrchestratorError::Store(format!(
                "record {} belongs to {}, not {}",
                path.display(),
                record.label,
                label
            )));
        }
        Ok(Some(record))
    }
}

fn store_error(action: &str, path: &Path, e: std::io::Error) -> OrchestratorError {
    OrchestratorError::Store(format!("{} {}: {}", action, path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str) -> CommitmentRecord {
        let label = EnsLabel::parse(label).unwrap();
        let params = CommitmentParams {
            label: label.as_str().to_string(),
            owner: Address::repeat_byte(0xaa),
            duration_secs: 31_536_000,
            secret: B256::repeat_byte(0x07),
        };
        CommitmentRecord {
            name: label.full_name(),
            commitment: params.commitment_hash(),
            owner: params.owner,
            secret: params.secret,
            duration_secs: params.duration_secs,
            status: CommitmentStatus::Maturing,
            created_at_ms: 1_000,
            committed_at_ms: 2_000,
            commit_tx: Some(TxHash::repeat_byte(0x01)),
            register_tx: None,
            label,
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path().join("nested"));
        let original = record("example");

        store.save(&original).unwrap();
        let loaded = store.load(&original.label).unwrap().unwrap();

        assert_eq!(loaded.secret, original.secret);
        assert_eq!(loaded.commitment, original.commitment);
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path());
        let label = EnsLabel::parse("nothing").unwrap();
        assert!(store.load(&label).unwrap().is_none());
    }

    #[test]
    fn test_save_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path());
        let first = record("example");
        let mut second = record("example");
        second.secret = B256::repeat_byte(0x08);

        store.save(&first).unwrap();
        store.save(&second).unwrap();

        let loaded = store.load(&first.label).unwrap().unwrap();
        assert_eq!(loaded.secret, B256::repeat_byte(0x08));
        assert!(!store.path_for(&first.label).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_record_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path());
        let label = EnsLabel::parse("broken").unwrap();
        fs::write(store.path_for(&label), "{not json").unwrap();
        assert!(matches!(store.load(&label), Err(OrchestratorError::Store(_))));
    }

    #[test]
    fn test_status_serialized_snake_case() {
        let json = serde_json::to_string(&record("example")).unwrap();
        assert!(json.contains("\"status\":\"maturing\""));
    }

    #[test]
    fn test_age_and_reveal_time() {
        let r = record("example");
        assert_eq!(r.age_secs(72_000), 70);
        assert_eq!(r.reveal_after_ms(60), 62_000);
        assert_eq!(r.with_status(CommitmentStatus::Registered).status, CommitmentStatus::Registered);
    }
}
