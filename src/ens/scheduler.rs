//! Commit-reveal scheduler.
//!
//! Drives each label through
//! `Uncommitted → CommitSent → Maturing → RevealReady → Registered → RecordsSet`,
//! persisting the record before every step that can outlive the process.
//! Labels are processed one at a time; a failure on one label is recorded
//! and the batch moves on.

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash, B256, U256};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::ens::contracts::CommitmentParams;
use crate::ens::gateway::RegistrarGateway;
use crate::ens::label::EnsLabel;
use crate::ens::records::{RecordFailure, RecordRequest};
use crate::ens::store::{now_ms, CommitmentRecord, CommitmentStatus, CommitmentStore};
use crate::error::{OrchestratorError, OrchestratorResult, CANCELLED_EXIT_CODE};
use crate::lifecycle::Shutdown;
use crate::resilience::deadline::{deadline_from_wall_clock, sleep_until_or_cancelled};

/// Slack added after the minimum age before revealing, so the reveal block's
/// timestamp is safely past the threshold.
const REVEAL_SLACK_MS: u64 = 1_000;

/// Which phases a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Commit, wait out the minimum age, reveal, set records.
    #[default]
    Full,
    /// Commit and persist, then stop.
    CommitOnly,
    /// Reveal a previously stored commitment.
    RevealOnly,
    /// Report rent and gas; send nothing.
    Simulate,
}

/// Where a label ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    Uncommitted,
    CommitSent,
    Maturing,
    RevealReady,
    Registered,
    RecordsSet,
    Skipped,
    Failed,
}

impl LabelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncommitted => "uncommitted",
            Self::CommitSent => "commit_sent",
            Self::Maturing => "maturing",
            Self::RevealReady => "reveal_ready",
            Self::Registered => "registered",
            Self::RecordsSet => "records_set",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// State implied by a stored record at `now_ms`.
    pub fn from_record(record: &CommitmentRecord, min_age_secs: Option<u64>, now_ms: u64) -> Self {
        match record.status {
            CommitmentStatus::CommitSent => Self::CommitSent,
            CommitmentStatus::Maturing => match min_age_secs {
                Some(min) if record.age_secs(now_ms) >= min => Self::RevealReady,
                _ => Self::Maturing,
            },
            CommitmentStatus::Registered => Self::Registered,
            CommitmentStatus::RecordsSet => Self::RecordsSet,
        }
    }
}

impl std::fmt::Display for LabelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-run parameters shared by every label in a batch.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub owner: Address,
    pub duration_secs: u64,
    pub mode: RunMode,
    pub records: RecordRequest,
}

/// Outcome for one input name.
#[derive(Debug, Clone)]
pub struct LabelReport {
    /// Name as given by the operator.
    pub input: String,
    /// Canonical `<label>.eth`, when the input parsed.
    pub name: Option<String>,
    pub state: LabelState,
    pub commitment: Option<B256>,
    pub commit_tx: Option<TxHash>,
    pub register_tx: Option<TxHash>,
    pub rent_wei: Option<U256>,
    pub estimated_gas: Option<u64>,
    /// Earliest reveal time (ms since epoch).
    pub reveal_after_ms: Option<u64>,
    pub age_secs: Option<u64>,
    pub record_failures: Vec<RecordFailure>,
    /// Skip reason or error message.
    pub detail: Option<String>,
    pub error_kind: Option<&'static str>,
}

impl LabelReport {
    fn new(input: &str, state: LabelState) -> Self {
        Self {
            input: input.to_string(),
            name: None,
            state,
            commitment: None,
            commit_tx: None,
            register_tx: None,
            rent_wei: None,
            estimated_gas: None,
            reveal_after_ms: None,
            age_secs: None,
            record_failures: Vec::new(),
            detail: None,
            error_kind: None,
        }
    }

    fn for_label(input: &str, label: &EnsLabel, state: LabelState) -> Self {
        Self {
            name: Some(label.full_name()),
            ..Self::new(input, state)
        }
    }

    fn failed(input: &str, error: &OrchestratorError) -> Self {
        Self {
            detail: Some(error.to_string()),
            error_kind: Some(error.kind()),
            ..Self::new(input, LabelState::Failed)
        }
    }

    fn apply_record(mut self, record: &CommitmentRecord, min_age_secs: Option<u64>) -> Self {
        self.commitment = Some(record.commitment);
        self.commit_tx = record.commit_tx;
        self.register_tx = record.register_tx;
        if record.status >= CommitmentStatus::Maturing {
            self.age_secs = Some(record.age_secs(now_ms()));
        }
        if record.status == CommitmentStatus::Maturing {
            self.reveal_after_ms = min_age_secs.map(|min| record.reveal_after_ms(min));
        }
        self
    }
}

impl std::fmt::Display for LabelReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name.as_deref().unwrap_or(&self.input), self.state)?;
        if let Some(rent) = self.rent_wei {
            write!(f, ", rent={} ETH", format_ether(rent))?;
        }
        match self.estimated_gas {
            Some(gas) => write!(f, ", est_gas={}", gas)?,
            None if self.rent_wei.is_some() && self.register_tx.is_none() => write!(f, ", est_gas=n/a")?,
            None => {}
        }
        if let Some(age) = self.age_secs {
            write!(f, ", age={}s", age)?;
        }
        if let Some(eta) = self.reveal_after_ms.and_then(format_timestamp) {
            write!(f, ", reveal_after={}", eta)?;
        }
        if let Some(tx) = self.commit_tx {
            write!(f, ", commit_tx={}", tx)?;
        }
        if let Some(tx) = self.register_tx {
            write!(f, ", register_tx={}", tx)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        for failure in &self.record_failures {
            write!(f, "\n  record {} failed: {}", failure.record, failure.error)?;
        }
        Ok(())
    }
}

fn format_timestamp(ms: u64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub labels: Vec<LabelReport>,
    /// The operator cancelled; remaining labels were not processed.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.labels
            .iter()
            .filter(|r| r.state == LabelState::Failed)
            .count()
    }

    /// 0 when every label succeeded or was skipped, 1 when any failed,
    /// 130 when cancelled.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            CANCELLED_EXIT_CODE
        } else if self.failed() > 0 {
            1
        } else {
            0
        }
    }
}

/// Drives labels through the commit-reveal protocol.
pub struct CommitRevealScheduler<G> {
    gateway: G,
    store: CommitmentStore,
    shutdown: Shutdown,
}

impl<G: RegistrarGateway> CommitRevealScheduler<G> {
    pub fn new(gateway: G, store: CommitmentStore, shutdown: Shutdown) -> Self {
        Self {
            gateway,
            store,
            shutdown,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn store(&self) -> &CommitmentStore {
        &self.store
    }

    /// Process `names` sequentially.
    ///
    /// Only a failure to read the minimum commitment age (before anything is
    /// sent) aborts the batch; per-label errors land in the report.
    pub async fn run_batch(
        &self,
        names: &[String],
        options: &SchedulerOptions,
    ) -> OrchestratorResult<BatchReport> {
        let min_age = self.gateway.min_commitment_age().await?;
        tracing::info!(
            owner = %options.owner,
            duration_secs = options.duration_secs,
            mode = ?options.mode,
            min_commitment_age_secs = min_age,
            labels = names.len(),
            "Starting batch"
        );

        let mut report = BatchReport::default();
        for name in names {
            match self.process_with_min_age(name, options, min_age).await {
                Ok(label_report) => {
                    tracing::info!(input = %name, state = %label_report.state, "Label finished");
                    report.labels.push(label_report);
                }
                Err(OrchestratorError::Cancelled) => {
                    tracing::warn!(input = %name, "Cancelled; resume later with a reveal-only run");
                    report.labels.push(LabelReport::failed(name, &OrchestratorError::Cancelled));
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::error!(input = %name, kind = e.kind(), error = %e, "Label failed");
                    report.labels.push(LabelReport::failed(name, &e));
                }
            }
        }
        Ok(report)
    }

    /// Process a single name.
    pub async fn process_label(
        &self,
        name: &str,
        options: &SchedulerOptions,
    ) -> OrchestratorResult<LabelReport> {
        let min_age = self.gateway.min_commitment_age().await?;
        self.process_with_min_age(name, options, min_age).await
    }

    async fn process_with_min_age(
        &self,
        name: &str,
        options: &SchedulerOptions,
        min_age: u64,
    ) -> OrchestratorResult<LabelReport> {
        let label = EnsLabel::parse(name)?;
        let available = self.gateway.available(&label).await?;

        if options.mode != RunMode::RevealOnly {
            let owner = self.gateway.owner(&label).await?;
            if !available {
                tracing::warn!(label = %label, owner = %owner, "Name not available, skipping");
                return Ok(LabelReport {
                    detail: Some(format!("not available, owned by {}", owner)),
                    ..LabelReport::for_label(name, &label, LabelState::Skipped)
                });
            }
            // Expired names can keep a stale registry owner until re-registered.
            if owner != Address::ZERO && owner != options.owner {
                tracing::warn!(label = %label, owner = %owner, "Registry lists another owner, skipping");
                return Ok(LabelReport {
                    detail: Some(format!("registry still lists {} as owner", owner)),
                    ..LabelReport::for_label(name, &label, LabelState::Skipped)
                });
            }
        }

        match options.mode {
            RunMode::Simulate => self.simulate(name, &label, options, min_age).await,
            RunMode::RevealOnly => self.resume(name, &label, options, min_age).await,
            RunMode::Full | RunMode::CommitOnly => {
                let record = self.commit(&label, options).await?;
                if options.mode == RunMode::CommitOnly {
                    let report = LabelReport::for_label(name, &label, LabelState::Maturing)
                        .apply_record(&record, Some(min_age));
                    tracing::info!(
                        label = %label,
                        reveal_after = report.reveal_after_ms.and_then(format_timestamp).unwrap_or_default(),
                        "Committed; reveal later"
                    );
                    return Ok(report);
                }

                self.wait_for_maturity(&record, min_age).await?;
                let record = self.reveal(&label, record, min_age).await?;
                self.finish_with_records(name, &label, record, &options.records).await
            }
        }
    }

    async fn simulate(
        &self,
        name: &str,
        label: &EnsLabel,
        options: &SchedulerOptions,
        min_age: u64,
    ) -> OrchestratorResult<LabelReport> {
        let stored = self.store.load(label)?;
        let duration = stored
            .as_ref()
            .map(|r| r.duration_secs)
            .unwrap_or(options.duration_secs);
        let rent = self.gateway.rent_price(label, duration).await?;

        let now = now_ms();
        let state = stored
            .as_ref()
            .map(|r| LabelState::from_record(r, Some(min_age), now))
            .unwrap_or(LabelState::Uncommitted);

        let mut report = LabelReport::for_label(name, label, state);
        report.rent_wei = Some(rent);
        if let Some(record) = &stored {
            report = report.apply_record(record, Some(min_age));
        }

        if let (LabelState::RevealReady, Some(record)) = (state, &stored) {
            match self.gateway.estimate_register_gas(&record.params(), rent).await {
                Ok(gas) => report.estimated_gas = Some(gas),
                Err(e) => {
                    tracing::debug!(label = %label, error = %e, "Register gas estimate unavailable");
                }
            }
        }
        let before_reveal = matches!(
            state,
            LabelState::Uncommitted | LabelState::CommitSent | LabelState::Maturing | LabelState::RevealReady
        );
        if before_reveal && report.estimated_gas.is_none() {
            report.detail = Some("no matured commitment; register gas estimate not available".to_string());
        }

        tracing::info!(
            label = %label,
            rent_eth = %format_ether(rent),
            estimated_gas = ?report.estimated_gas,
            state = %state,
            "Simulated"
        );
        Ok(report)
    }

    /// Reveal-only path: inspect the stored status and continue from it.
    async fn resume(
        &self,
        name: &str,
        label: &EnsLabel,
        options: &SchedulerOptions,
        min_age: u64,
    ) -> OrchestratorResult<LabelReport> {
        let record = self.store.load(label)?.ok_or_else(|| OrchestratorError::MissingCommitment {
            label: label.full_name(),
            reason: "no stored commitment; run a commit first".to_string(),
        })?;

        // The stored commitment is bound to its owner.
        if record.owner != options.owner {
            return Err(OrchestratorError::OwnershipConflict {
                subject: format!("stored commitment for {}", label),
                expected: options.owner,
                actual: record.owner,
            });
        }

        match record.status {
            CommitmentStatus::CommitSent => Err(OrchestratorError::MissingCommitment {
                label: label.full_name(),
                reason: "commit transaction was never confirmed; commit again".to_string(),
            }),
            CommitmentStatus::Maturing => {
                let record = self.reveal(label, record, min_age).await?;
                self.finish_with_records(name, label, record, &options.records).await
            }
            CommitmentStatus::Registered => {
                tracing::info!(label = %label, "Already registered, applying records");
                self.finish_with_records(name, label, record, &options.records).await
            }
            CommitmentStatus::RecordsSet if options.records.is_empty() => {
                tracing::info!(label = %label, "Already registered with records, nothing to do");
                Ok(LabelReport::for_label(name, label, LabelState::RecordsSet).apply_record(&record, None))
            }
            CommitmentStatus::RecordsSet => {
                self.finish_with_records(name, label, record, &options.records).await
            }
        }
    }

    async fn commit(&self, label: &EnsLabel, options: &SchedulerOptions) -> OrchestratorResult<CommitmentRecord> {
        let params = CommitmentParams {
            label: label.as_str().to_string(),
            owner: options.owner,
            duration_secs: options.duration_secs,
            secret: random_secret(),
        };
        let commitment = params.commitment_hash();
        let controller_commitment = self.gateway.make_commitment(&params).await?;
        if controller_commitment != commitment {
            return Err(OrchestratorError::PreconditionFailed(format!(
                "controller computed commitment {} but expected {}; check the controller address",
                controller_commitment, commitment
            )));
        }

        let created_at_ms = now_ms();
        let mut record = CommitmentRecord {
            label: label.clone(),
            name: label.full_name(),
            owner: params.owner,
            secret: params.secret,
            commitment,
            duration_secs: params.duration_secs,
            status: CommitmentStatus::CommitSent,
            created_at_ms,
            committed_at_ms: created_at_ms,
            commit_tx: None,
            register_tx: None,
        };
        // Stored before broadcast so a crash mid-commit leaves a trace.
        self.store.save(&record)?;

        tracing::info!(label = %label, commitment = %commitment, "Submitting commitment");
        let tx = self.gateway.commit(commitment).await?;

        record.status = CommitmentStatus::Maturing;
        record.committed_at_ms = now_ms();
        record.commit_tx = Some(tx);
        let path = self.store.save(&record)?;
        tracing::info!(label = %label, tx_hash = %tx, path = %path.display(), "Commitment confirmed and stored");
        Ok(record)
    }

    async fn wait_for_maturity(&self, record: &CommitmentRecord, min_age: u64) -> OrchestratorResult<()> {
        let target_ms = record.reveal_after_ms(min_age).saturating_add(REVEAL_SLACK_MS);
        let now = now_ms();
        tracing::info!(
            label = %record.label,
            wait_secs = target_ms.saturating_sub(now) / 1000,
            min_commitment_age_secs = min_age,
            "Waiting for commitment to mature"
        );
        let mut shutdown = self.shutdown.subscribe();
        sleep_until_or_cancelled(deadline_from_wall_clock(target_ms, now), &mut shutdown).await
    }

    /// Register using a matured record. Nothing is sent unless every check
    /// passes.
    async fn reveal(
        &self,
        label: &EnsLabel,
        record: CommitmentRecord,
        min_age: u64,
    ) -> OrchestratorResult<CommitmentRecord> {
        if !self.gateway.available(label).await? {
            let actual = self.gateway.owner(label).await?;
            if actual == record.owner {
                tracing::info!(label = %label, owner = %actual, "Name already held by the owner");
                let registered = record.with_status(CommitmentStatus::Registered);
                self.store.save(&registered)?;
                return Ok(registered);
            }
            return Err(OrchestratorError::OwnershipConflict {
                subject: label.full_name(),
                expected: record.owner,
                actual,
            });
        }

        let age = record.age_secs(now_ms());
        if age < min_age {
            return Err(OrchestratorError::CommitmentImmature {
                label: label.full_name(),
                age_secs: age,
                min_age_secs: min_age,
            });
        }

        let params = record.params();
        if params.commitment_hash() != record.commitment {
            return Err(OrchestratorError::Store(format!(
                "stored commitment for {} does not match its secret",
                label
            )));
        }

        let rent = self.gateway.rent_price(label, record.duration_secs).await?;
        tracing::info!(
            label = %label,
            age_secs = age,
            rent_eth = %format_ether(rent),
            duration_secs = record.duration_secs,
            "Revealing commitment"
        );
        let tx = self.gateway.register(&params, rent).await?;

        let mut registered = record.with_status(CommitmentStatus::Registered);
        registered.register_tx = Some(tx);
        self.store.save(&registered)?;
        tracing::info!(label = %label, tx_hash = %tx, "Registered");
        Ok(registered)
    }

    async fn finish_with_records(
        &self,
        name: &str,
        label: &EnsLabel,
        record: CommitmentRecord,
        records: &RecordRequest,
    ) -> OrchestratorResult<LabelReport> {
        let failures = self.apply_records(label, records).await;
        let state = if failures.is_empty() {
            let done = record.with_status(CommitmentStatus::RecordsSet);
            self.store.save(&done)?;
            LabelState::RecordsSet
        } else {
            LabelState::Registered
        };

        let mut report = LabelReport::for_label(name, label, state).apply_record(&record, None);
        report.record_failures = failures;
        Ok(report)
    }

    /// Each record is its own transaction; failures are collected, not
    /// propagated.
    async fn apply_records(&self, label: &EnsLabel, records: &RecordRequest) -> Vec<RecordFailure> {
        let mut failures = Vec::new();

        match self.gateway.set_resolver(label).await {
            Ok(tx) => tracing::info!(label = %label, tx_hash = %tx, "Resolver set"),
            Err(e) => {
                tracing::warn!(label = %label, error = %e, "Setting resolver failed; skipping records");
                failures.push(RecordFailure {
                    record: "resolver".to_string(),
                    error: e.to_string(),
                });
                return failures;
            }
        }

        if let Some(addr) = records.addr {
            match self.gateway.set_addr(label, addr).await {
                Ok(tx) => tracing::info!(label = %label, addr = %addr, tx_hash = %tx, "Address record set"),
                Err(e) => failures.push(record_failure(label, "addr".to_string(), e)),
            }
        }
        for (key, value) in &records.texts {
            match self.gateway.set_text(label, key, value).await {
                Ok(tx) => tracing::info!(label = %label, key = %key, tx_hash = %tx, "Text record set"),
                Err(e) => failures.push(record_failure(label, format!("text:{}", key), e)),
            }
        }
        if let Some(hash) = &records.contenthash {
            match self.gateway.set_contenthash(label, hash).await {
                Ok(tx) => tracing::info!(
                    label = %label,
                    uri = records.contenthash_uri.as_deref().unwrap_or(""),
                    tx_hash = %tx,
                    "Contenthash set"
                ),
                Err(e) => failures.push(record_failure(label, "contenthash".to_string(), e)),
            }
        }
        failures
    }
}

fn record_failure(label: &EnsLabel, record: String, e: OrchestratorError) -> RecordFailure {
    tracing::warn!(label = %label, record = %record, error = %e, "Record update failed");
    RecordFailure {
        record,
        error: e.to_string(),
    }
}

/// Fresh 32-byte secret from the OS RNG.
pub fn random_secret() -> B256 {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    B256::from(bytes)
}

/// Read-only view of stored records for `names`.
pub fn status_reports(
    store: &CommitmentStore,
    names: &[String],
    min_age_secs: Option<u64>,
) -> Vec<LabelReport> {
    let now = now_ms();
    names
        .iter()
        .map(|name| {
            let label = match EnsLabel::parse(name) {
                Ok(label) => label,
                Err(e) => return LabelReport::failed(name, &e),
            };
            match store.load(&label) {
                Ok(Some(record)) => {
                    let state = LabelState::from_record(&record, min_age_secs, now);
                    LabelReport::for_label(name, &label, state).apply_record(&record, min_age_secs)
                }
                Ok(None) => LabelReport {
                    detail: Some("no stored commitment".to_string()),
                    ..LabelReport::for_label(name, &label, LabelState::Uncommitted)
                },
                Err(e) => LabelReport::failed(name, &e),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: CommitmentStatus, committed_at_ms: u64) -> CommitmentRecord {
        let label = EnsLabel::parse("example").unwrap();
        let params = CommitmentParams {
            label: label.as_str().to_string(),
            owner: Address::repeat_byte(0x11),
            duration_secs: 31_536_000,
            secret: B256::repeat_byte(0x01),
        };
        CommitmentRecord {
            name: label.full_name(),
            label,
            owner: params.owner,
            secret: params.secret,
            commitment: params.commitment_hash(),
            duration_secs: params.duration_secs,
            status,
            created_at_ms: committed_at_ms,
            committed_at_ms,
            commit_tx: None,
            register_tx: None,
        }
    }

    #[test]
    fn test_state_from_record() {
        let now = 100_000;
        let young = record(CommitmentStatus::Maturing, now - 30_000);
        let old = record(CommitmentStatus::Maturing, now - 70_000);

        assert_eq!(LabelState::from_record(&young, Some(60), now), LabelState::Maturing);
        assert_eq!(LabelState::from_record(&old, Some(60), now), LabelState::RevealReady);
        assert_eq!(LabelState::from_record(&old, None, now), LabelState::Maturing);
        assert_eq!(
            LabelState::from_record(&record(CommitmentStatus::CommitSent, 0), Some(60), now),
            LabelState::CommitSent
        );
    }

    #[test]
    fn test_random_secrets_differ() {
        assert_ne!(random_secret(), random_secret());
        assert_ne!(random_secret(), B256::ZERO);
    }

    #[test]
    fn test_batch_exit_code() {
        let mut batch = BatchReport::default();
        assert_eq!(batch.exit_code(), 0);

        batch.labels.push(LabelReport::new("a", LabelState::Skipped));
        assert_eq!(batch.exit_code(), 0);

        batch.labels.push(LabelReport::new("b", LabelState::Failed));
        assert_eq!(batch.exit_code(), 1);

        batch.cancelled = true;
        assert_eq!(batch.exit_code(), 130);
    }

    #[test]
    fn test_status_reports() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommitmentStore::new(dir.path());
        store
            .save(&record(CommitmentStatus::Maturing, now_ms() - 10_000))
            .unwrap();

        let names = vec!["example.eth".to_string(), "other".to_string(), "a.b.eth".to_string()];
        let reports = status_reports(&store, &names, Some(60));

        assert_eq!(reports[0].state, LabelState::Maturing);
        assert!(reports[0].reveal_after_ms.is_some());
        assert_eq!(reports[1].state, LabelState::Uncommitted);
        assert_eq!(reports[2].state, LabelState::Failed);
        assert_eq!(reports[2].error_kind, Some("InvalidLabel"));
    }

    #[test]
    fn test_report_display() {
        let mut report = LabelReport::new("example", LabelState::Registered);
        report.name = Some("example.eth".to_string());
        report.record_failures.push(RecordFailure {
            record: "text:url".to_string(),
            error: "reverted".to_string(),
        });
        let text = report.to_string();
        assert!(text.starts_with("example.eth: registered"));
        assert!(text.contains("record text:url failed: reverted"));
    }
}
