//! Consensus Security Service - orchestration of the security envelope
//!
//! # Lifecycle
//!
//! ```text
//! UNINITIALIZED ──initialize()──► INITIALIZING ──DKG ok──► READY
//!                                      │                   │  ▲
//!                                      └──DKG failed──►    │  │ round done
//!                                        UNINITIALIZED     ▼  │
//!                                                   EXECUTING_CONSENSUS
//! ```
//!
//! Signing and proof operations require `READY`. Join, connection and request
//! validation work in any state.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use qc_zkp::{PedersenCommitment, ProofGuard, RangeProof};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_crypto::{
    CurvePoint, DkgCeremony, Scalar, ThresholdParams, ThresholdScheme, ThresholdSignature,
};
use tracing::{debug, error, info, warn};

use crate::adapters::TracingAuditSink;
use crate::alerting::{AlertHandler, AlertStatistics, SecurityAlertSystem};
use crate::config::SecurityConfig;
use crate::detection::{
    ByzantineDetector, ConnectionReport, DosMitigator, DosReport, EclipseGuard, JoinAssessment,
    SybilGuard,
};
use crate::domain::{
    AlertType, Anomaly, ConsensusRound, ConnectionRecord, IdentityCredential, InboundRequest,
    NodeId, NodeJoinRequest, Proposal, SecureConsensusResult, SecurityAlert, SecurityAnalysis,
    SecurityError, SecurityResult, SecurityState, Severity,
};
use crate::forensics::{ExportFormat, ForensicLogEntry, ForensicLogger, ForensicQuery};
use crate::metrics::{self, SecurityMetrics};
use crate::ports::{AuditSink, BlacklistCache, SystemTimeSource, TimeSource};
use crate::reputation::ReputationSystem;

#[cfg(test)]
mod tests;

const ALERT_STATS_WINDOW_MS: u64 = 3_600_000;

/// Snapshot returned by [`ConsensusSecurityManager::security_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityStatus {
    pub state: SecurityState,
    pub parties: usize,
    pub threshold: usize,
    /// Hex-encoded compressed group key, once initialized
    pub group_public_key: Option<String>,
    pub roster: Vec<NodeId>,
    pub tracked_nodes: usize,
    pub blacklisted_nodes: Vec<NodeId>,
    pub alerts_last_hour: AlertStatistics,
    pub forensic_entries: usize,
    pub forensic_integrity_ok: bool,
    pub timestamp: u64,
}

#[derive(Debug, Default)]
struct Counters {
    rounds_completed: AtomicU64,
    rounds_failed: AtomicU64,
    anomalies_detected: AtomicU64,
    joins_accepted: AtomicU64,
    joins_rejected: AtomicU64,
    requests_allowed: AtomicU64,
    requests_blocked: AtomicU64,
    connections_blocked: AtomicU64,
    proofs_issued: AtomicU64,
    proofs_verified: AtomicU64,
    proofs_rejected: AtomicU64,
    alerts_raised: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

/// Marks a round in flight for the lifetime of the guard.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Security envelope around consensus rounds.
///
/// Owns all security state. `Send + Sync`; share it through an `Arc`.
pub struct ConsensusSecurityManager {
    config: SecurityConfig,
    roster: Vec<NodeId>,
    state: RwLock<SecurityState>,
    init_lock: Mutex<()>,
    in_flight: AtomicUsize,
    scheme: RwLock<Option<Arc<ThresholdScheme>>>,
    faulty_dealers: Vec<u32>,
    faulty_signers: Vec<u32>,
    auth_guard: Arc<ProofGuard>,
    reputation: RwLock<ReputationSystem>,
    byzantine: ByzantineDetector,
    sybil: Mutex<SybilGuard>,
    eclipse: EclipseGuard,
    dos: Mutex<DosMitigator>,
    alerts: SecurityAlertSystem,
    forensics: ForensicLogger,
    audit: Arc<dyn AuditSink>,
    blacklist_cache: Option<Arc<dyn BlacklistCache>>,
    time_source: Arc<dyn TimeSource>,
    counters: Counters,
}

impl ConsensusSecurityManager {
    /// Create an uninitialized manager. The configuration is validated.
    pub fn new(config: SecurityConfig) -> SecurityResult<Self> {
        config.validate()?;
        let roster = config.threshold.resolved_roster();
        let auth_guard = Arc::new(ProofGuard::new(config.zkp));
        Ok(Self {
            roster,
            state: RwLock::new(SecurityState::Uninitialized),
            init_lock: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            scheme: RwLock::new(None),
            faulty_dealers: Vec::new(),
            faulty_signers: Vec::new(),
            sybil: Mutex::new(SybilGuard::new(config.sybil.clone(), Arc::clone(&auth_guard))),
            auth_guard,
            reputation: RwLock::new(ReputationSystem::new(config.reputation.clone())),
            byzantine: ByzantineDetector::new(config.byzantine.clone()),
            eclipse: EclipseGuard::new(config.eclipse.clone()),
            dos: Mutex::new(DosMitigator::new(config.dos.clone())),
            alerts: SecurityAlertSystem::new(config.alerts.history_size),
            forensics: ForensicLogger::new(config.forensics.max_entries),
            audit: Arc::new(TracingAuditSink),
            blacklist_cache: None,
            time_source: Arc::new(SystemTimeSource),
            counters: Counters::default(),
            config,
        })
    }

    /// Set the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Mirror DoS blacklist entries to a shared cache
    pub fn with_blacklist_cache(mut self, cache: Arc<dyn BlacklistCache>) -> Self {
        self.blacklist_cache = Some(cache);
        self
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Dealers whose shares will be corrupted during the key ceremony.
    pub fn with_faulty_dealers(mut self, dealers: impl IntoIterator<Item = u32>) -> Self {
        self.faulty_dealers.extend(dealers);
        self
    }

    /// Signatories that will emit invalid partial signatures.
    pub fn with_faulty_signers(mut self, signers: impl IntoIterator<Item = u32>) -> Self {
        self.faulty_signers.extend(signers);
        self
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Key holders in party-index order.
    pub fn roster(&self) -> &[NodeId] {
        &self.roster
    }

    /// Current lifecycle state
    pub fn state(&self) -> SecurityState {
        let state = *self.state.read();
        if state == SecurityState::Ready && self.in_flight.load(Ordering::SeqCst) > 0 {
            SecurityState::ExecutingConsensus
        } else {
            state
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.scheme.read().is_some()
    }

    fn now(&self) -> u64 {
        self.time_source.now_millis()
    }

    fn scheme(&self) -> SecurityResult<Arc<ThresholdScheme>> {
        self.scheme
            .read()
            .clone()
            .ok_or(SecurityError::NotInitialized)
    }

    // === LIFECYCLE ===

    /// Run the key ceremony. Idempotent: once ready, returns the existing
    /// group key without a new ceremony.
    pub fn initialize(&self) -> SecurityResult<CurvePoint> {
        let _guard = self.init_lock.lock();
        if let Some(scheme) = self.scheme.read().as_ref() {
            debug!("Security manager already initialized");
            return Ok(scheme.group_public_key().clone());
        }

        *self.state.write() = SecurityState::Initializing;
        let t = &self.config.threshold;
        info!(
            parties = t.parties,
            threshold = t.threshold,
            "Starting threshold key ceremony"
        );

        let outcome = ThresholdParams::new(t.threshold, t.parties).and_then(|params| {
            DkgCeremony::new(params)
                .with_faulty_dealers(self.faulty_dealers.iter().copied())
                .run_with_retries(t.dkg_max_attempts)
        });

        match outcome {
            Ok(keys) => {
                let scheme = ThresholdScheme::from_dkg(keys)
                    .with_faulty_signers(self.faulty_signers.iter().copied());
                let group_key = scheme.group_public_key().clone();
                *self.scheme.write() = Some(Arc::new(scheme));
                *self.state.write() = SecurityState::Ready;

                let now = self.now();
                self.forensics.log(
                    "initialization",
                    json!({
                        "parties": t.parties,
                        "threshold": t.threshold,
                        "group_public_key": group_key.to_hex(),
                    }),
                    now,
                );
                self.audit_event("initialized", &json!({ "group_public_key": group_key.to_hex() }));
                info!(group_key = %group_key, "Security manager ready");
                Ok(group_key)
            }
            Err(e) => {
                *self.state.write() = SecurityState::Uninitialized;
                error!(error = %e, "Threshold key ceremony failed");
                Err(e.into())
            }
        }
    }

    /// Group public key of the ceremony.
    pub fn group_public_key(&self) -> SecurityResult<CurvePoint> {
        Ok(self.scheme()?.group_public_key().clone())
    }

    // === CONSENSUS ===

    /// Threshold-sign a proposal on behalf of `participants` and analyse the
    /// accompanying round.
    ///
    /// Anomalies never abort the round. Integrity failures do.
    pub fn execute_secure_consensus(
        &self,
        proposal: &Proposal,
        participants: &[NodeId],
        round: Option<&ConsensusRound>,
    ) -> SecurityResult<SecureConsensusResult> {
        let scheme = self.scheme()?;
        let _in_flight = InFlight::enter(&self.in_flight);
        let now = self.now();
        let round_id = round.map(|r| r.id.as_str()).unwrap_or("");

        if let Some(attached) = &proposal.hash {
            let computed = proposal.compute_hash();
            if *attached != computed {
                self.raise_alert(
                    AlertType::Integrity,
                    Severity::High,
                    json!({
                        "reason": "proposal_hash_mismatch",
                        "round": round_id,
                        "attached": attached,
                        "computed": computed,
                    }),
                    now,
                );
                self.fail_round("hash_mismatch");
                return Err(SecurityError::IntegrityHashMismatch {
                    attached: attached.clone(),
                    computed,
                });
            }
        }

        let mut analysis = SecurityAnalysis::default();
        let signers = self.map_signers(participants, now, &mut analysis);
        analysis.signatories = signers.clone();

        let started = Instant::now();
        let signature = match scheme.sign(proposal.signing_bytes(), &signers) {
            Ok(signature) => signature,
            Err(e) => {
                warn!(round = round_id, error = %e, "Threshold signing failed");
                self.forensics.log(
                    "consensus_failed",
                    json!({ "round": round_id, "error": e.to_string(), "signers": signers }),
                    now,
                );
                self.fail_round("signing");
                return Err(e.into());
            }
        };
        metrics::record_signing_latency(started.elapsed().as_secs_f64());

        let anomalies = round
            .map(|r| self.byzantine.analyze(r))
            .unwrap_or_default();
        let affected = affected_nodes(participants, round, &anomalies);
        self.reputation
            .write()
            .apply_round_outcome(&affected, &anomalies, now);
        for anomaly in &anomalies {
            self.report_anomaly(round_id, anomaly, now);
        }
        analysis.high_severity_count = anomalies
            .iter()
            .filter(|a| a.severity == Severity::High)
            .count();
        analysis.anomalies = anomalies;

        if !signature.verify(proposal.signing_bytes(), scheme.group_public_key()) {
            self.raise_alert(
                AlertType::Integrity,
                Severity::High,
                json!({ "reason": "signature_verification_failed", "round": round_id }),
                now,
            );
            self.fail_round("invalid_signature");
            return Err(SecurityError::InvalidSignature);
        }

        if analysis.high_severity_count > 0 {
            warn!(
                round = round_id,
                high = analysis.high_severity_count,
                "Round completed with high-severity anomalies"
            );
        }

        self.forensics.log(
            "consensus_round",
            json!({
                "round": round_id,
                "proposal_hash": proposal.compute_hash(),
                "signature": signature.to_hex(),
                "signatories": analysis.signatories,
                "anomalies": analysis.anomalies.len(),
            }),
            now,
        );
        self.audit_event(
            "consensus_round",
            &json!({ "round": round_id, "signatories": analysis.signatories }),
        );
        bump(&self.counters.rounds_completed, 1);
        metrics::record_round_completed();
        info!(
            round = round_id,
            signatories = analysis.signatories.len(),
            anomalies = analysis.anomalies.len(),
            "Secure consensus round completed"
        );

        Ok(SecureConsensusResult {
            proposal: proposal.clone(),
            signature,
            participants: participants.to_vec(),
            security_analysis: analysis,
            timestamp: now,
        })
    }

    /// Map participants to party indices, skipping blacklist-eligible and
    /// unknown nodes.
    fn map_signers(
        &self,
        participants: &[NodeId],
        now: u64,
        analysis: &mut SecurityAnalysis,
    ) -> Vec<u32> {
        let reputation = self.reputation.read();
        let mut signers = BTreeSet::new();
        for node in participants {
            if reputation.is_blacklist_eligible(node, now) {
                debug!(node = %node, "Excluding low-reputation participant");
                analysis.excluded_participants.push(node.clone());
                continue;
            }
            match self.party_index(node) {
                Some(index) => {
                    signers.insert(index);
                }
                None => analysis.unknown_participants.push(node.clone()),
            }
        }
        signers.into_iter().collect()
    }

    /// 1-based party index of a roster node.
    pub fn party_index(&self, node: &str) -> Option<u32> {
        self.roster
            .iter()
            .position(|n| n == node)
            .map(|i| i as u32 + 1)
    }

    fn report_anomaly(&self, round_id: &str, anomaly: &Anomaly, now: u64) {
        bump(&self.counters.anomalies_detected, 1);
        metrics::record_anomaly(&anomaly.severity.to_string());
        self.raise_alert(
            AlertType::Byzantine,
            anomaly.severity,
            json!({
                "round": round_id,
                "kind": anomaly.kind,
                "nodes": anomaly.nodes,
                "description": anomaly.description,
            }),
            now,
        );
    }

    fn fail_round(&self, reason: &str) {
        bump(&self.counters.rounds_failed, 1);
        metrics::record_round_failed(reason);
    }

    /// Verify a group signature against the master key.
    pub fn verify_threshold_signature(
        &self,
        message: &[u8],
        signature: &ThresholdSignature,
    ) -> SecurityResult<bool> {
        let scheme = self.scheme()?;
        Ok(signature.verify(message, scheme.group_public_key()))
    }

    // === ADMISSION CONTROL ===

    /// Evaluate a join request. Rejections are errors.
    pub fn validate_node_join(&self, request: &NodeJoinRequest) -> SecurityResult<JoinAssessment> {
        let now = self.now();
        let prior = self.reputation.read().peek(&request.node_id, now);
        let (assessment, min_factors) = {
            let mut sybil = self.sybil.lock();
            let assessment = sybil.evaluate(request, prior, now);
            (assessment, sybil.config().min_factors)
        };
        metrics::record_join(assessment.accepted);

        self.forensics.log(
            "join_attempt",
            json!({
                "node": request.node_id,
                "ip": request.ip,
                "accepted": assessment.accepted,
                "factors": assessment.factors,
                "patterns": assessment.patterns,
            }),
            now,
        );

        if assessment.accepted {
            bump(&self.counters.joins_accepted, 1);
            self.reputation.write().get_score(&request.node_id, now);
            self.audit_event("node_joined", &json!({ "node": request.node_id }));
            return Ok(assessment);
        }

        bump(&self.counters.joins_rejected, 1);
        let reason = assessment.reason(min_factors);
        let severity = if assessment.patterns.is_empty() {
            Severity::Medium
        } else {
            Severity::High
        };
        self.raise_alert(
            AlertType::Sybil,
            severity,
            json!({
                "node": request.node_id,
                "ip": request.ip,
                "reason": reason,
                "factors": assessment.factors.count(),
            }),
            now,
        );
        Err(SecurityError::JoinRejected {
            node_id: request.node_id.clone(),
            reason,
        })
    }

    /// Enforce connection diversity and per-source caps on `node_id`'s peer
    /// set.
    pub fn validate_connections(
        &self,
        node_id: &str,
        connections: &[ConnectionRecord],
    ) -> ConnectionReport {
        let now = self.now();
        let report = self.eclipse.evaluate(connections);

        self.forensics.log(
            "connection_check",
            json!({
                "node": node_id,
                "connections": connections.len(),
                "accepted": report.accepted.len(),
                "blocked": report.blocked.len(),
                "diversity_enforced": report.diversity_enforced,
            }),
            now,
        );

        if report.has_blocked() {
            let blocked = report.blocked.len() as u64;
            bump(&self.counters.connections_blocked, blocked);
            metrics::record_connections_blocked(blocked);
            let severity = if report.diversity_enforced {
                Severity::High
            } else {
                Severity::Medium
            };
            self.raise_alert(
                AlertType::Eclipse,
                severity,
                json!({
                    "node": node_id,
                    "accepted": report.accepted.len(),
                    "blocked": report.blocked.len(),
                    "country_entropy": report.country_entropy,
                    "asn_entropy": report.asn_entropy,
                    "diversity_enforced": report.diversity_enforced,
                }),
                now,
            );
        }
        report
    }

    /// Drop flood traffic and return the rest in priority order.
    pub fn filter_requests(&self, requests: Vec<InboundRequest>) -> DosReport {
        let now = self.now();
        let mut dos = self.dos.lock();

        if let Some(cache) = &self.blacklist_cache {
            let sources: BTreeSet<&str> = requests.iter().map(|r| r.source.as_str()).collect();
            for source in sources {
                match cache.get(&blacklist_key(source)) {
                    Ok(Some(until)) => match until.parse::<u64>() {
                        Ok(until) => dos.blacklist_until(source, until),
                        Err(_) => warn!(source = %source, "Ignoring malformed cached blacklist entry"),
                    },
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "Blacklist cache unavailable, using local state");
                        break;
                    }
                }
            }
        }

        let report = dos.filter(requests, now);
        drop(dos);

        if let Some(cache) = &self.blacklist_cache {
            for (source, until) in &report.newly_blacklisted {
                let ttl = until.saturating_sub(now);
                if let Err(e) = cache.set(&blacklist_key(source), &until.to_string(), ttl) {
                    warn!(source = %source, error = %e, "Failed to mirror blacklist entry");
                }
            }
        }

        bump(&self.counters.requests_allowed, report.allowed.len() as u64);
        if report.blocked_count > 0 {
            bump(&self.counters.requests_blocked, report.blocked_count as u64);
            metrics::record_requests_blocked(report.blocked_count as u64);
            let severity = if report.newly_blacklisted.is_empty() {
                Severity::Medium
            } else {
                Severity::High
            };
            let offenders: Vec<&str> = report
                .offenders()
                .take(10)
                .map(|v| v.source.as_str())
                .collect();
            self.raise_alert(
                AlertType::Dos,
                severity,
                json!({
                    "blocked": report.blocked_count,
                    "allowed": report.allowed.len(),
                    "offenders": offenders,
                    "blacklisted": report.newly_blacklisted.len(),
                }),
                now,
            );
        }
        report
    }

    // === AUTHENTICATION ===

    /// Issue a fresh Schnorr credential for `secret`.
    pub fn generate_auth_proof(&self, secret: &Scalar) -> SecurityResult<IdentityCredential> {
        self.scheme()?;
        let public_key = CurvePoint::mul_generator(secret);
        let proof = qc_zkp::schnorr::prove(secret, &public_key, self.now())?;
        bump(&self.counters.proofs_issued, 1);
        Ok(IdentityCredential { public_key, proof })
    }

    /// Check a credential: proof, freshness and replay.
    pub fn verify_auth_proof(&self, credential: &IdentityCredential) -> SecurityResult<bool> {
        self.scheme()?;
        match self
            .auth_guard
            .verify(&credential.proof, &credential.public_key, self.now())
        {
            Ok(()) => {
                bump(&self.counters.proofs_verified, 1);
                Ok(true)
            }
            Err(e) => {
                debug!(error = %e, "Authentication proof rejected");
                bump(&self.counters.proofs_rejected, 1);
                Ok(false)
            }
        }
    }

    /// Commit to `value` and prove `min <= value <= max`.
    pub fn generate_range_proof(
        &self,
        value: u64,
        min: u64,
        max: u64,
    ) -> SecurityResult<(PedersenCommitment, RangeProof)> {
        self.scheme()?;
        let proof = RangeProof::prove(value, &Scalar::random(), min, max)?;
        bump(&self.counters.proofs_issued, 1);
        Ok(proof)
    }

    pub fn verify_range_proof(
        &self,
        commitment: &PedersenCommitment,
        proof: &RangeProof,
    ) -> SecurityResult<bool> {
        self.scheme()?;
        let valid = proof.verify(commitment).is_ok();
        if valid {
            bump(&self.counters.proofs_verified, 1);
        } else {
            bump(&self.counters.proofs_rejected, 1);
        }
        Ok(valid)
    }

    // === ALERTS AND FORENSICS ===

    fn raise_alert(&self, alert_type: AlertType, severity: Severity, details: serde_json::Value, now: u64) {
        self.forensics.log(
            "security_alert",
            json!({
                "alert_type": alert_type,
                "severity": severity,
                "details": details,
            }),
            now,
        );
        self.alerts
            .raise(SecurityAlert::new(alert_type, severity, now, details));
        bump(&self.counters.alerts_raised, 1);
        metrics::record_alert(alert_type.as_str());
    }

    fn audit_event(&self, event_type: &str, context: &serde_json::Value) {
        if let Err(e) = self.audit.record(event_type, context) {
            warn!(event_type, error = %e, "Audit sink failed");
        }
    }

    /// Replace the handler for one alert type.
    pub fn register_alert_handler(&self, alert_type: AlertType, handler: Arc<dyn AlertHandler>) {
        self.alerts.register_handler(alert_type, handler);
    }

    pub fn alerts(&self) -> &SecurityAlertSystem {
        &self.alerts
    }

    /// Alert counts over the last `window_ms`.
    pub fn alert_statistics(&self, window_ms: u64) -> AlertStatistics {
        self.alerts.statistics(window_ms, self.now())
    }

    pub fn forensics(&self) -> &ForensicLogger {
        &self.forensics
    }

    pub fn query_forensics(&self, query: &ForensicQuery) -> Vec<ForensicLogEntry> {
        self.forensics.query(query)
    }

    pub fn export_forensics(&self, format: ExportFormat) -> SecurityResult<String> {
        self.forensics.export(format)
    }

    pub fn verify_forensic_integrity(&self) -> SecurityResult<usize> {
        self.forensics.verify_integrity()
    }

    // === REPUTATION ===

    /// Decayed score of a known node.
    pub fn reputation_score(&self, node: &str) -> Option<f64> {
        self.reputation.read().peek(node, self.now())
    }

    // === STATUS ===

    pub fn security_status(&self) -> SecurityStatus {
        let now = self.now();
        let group_public_key = self
            .scheme
            .read()
            .as_ref()
            .map(|s| s.group_public_key().to_hex());
        let reputation = self.reputation.read();
        SecurityStatus {
            state: self.state(),
            parties: self.config.threshold.parties,
            threshold: self.config.threshold.threshold,
            group_public_key,
            roster: self.roster.clone(),
            tracked_nodes: reputation.len(),
            blacklisted_nodes: reputation.blacklist_candidates(now),
            alerts_last_hour: self.alerts.statistics(ALERT_STATS_WINDOW_MS, now),
            forensic_entries: self.forensics.len(),
            forensic_integrity_ok: self.forensics.corrupted_entries().is_empty(),
            timestamp: now,
        }
    }

    pub fn export_security_metrics(&self) -> SecurityMetrics {
        let now = self.now();
        let c = &self.counters;
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let reputation = self.reputation.read();
        SecurityMetrics {
            rounds_completed: load(&c.rounds_completed),
            rounds_failed: load(&c.rounds_failed),
            anomalies_detected: load(&c.anomalies_detected),
            joins_accepted: load(&c.joins_accepted),
            joins_rejected: load(&c.joins_rejected),
            requests_allowed: load(&c.requests_allowed),
            requests_blocked: load(&c.requests_blocked),
            connections_blocked: load(&c.connections_blocked),
            proofs_issued: load(&c.proofs_issued),
            proofs_verified: load(&c.proofs_verified),
            proofs_rejected: load(&c.proofs_rejected),
            alerts_raised: load(&c.alerts_raised),
            forensic_entries: self.forensics.len(),
            tracked_nodes: reputation.len(),
            blacklisted_sources: self.dos.lock().blacklist_len(now),
            average_reputation: reputation.average_score(now),
        }
    }
}

impl std::fmt::Debug for ConsensusSecurityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusSecurityManager")
            .field("state", &self.state())
            .field("roster", &self.roster)
            .field("alerts", &self.alerts)
            .field("forensic_entries", &self.forensics.len())
            .finish()
    }
}

fn blacklist_key(source: &str) -> String {
    format!("qc:dos:blacklist:{}", source)
}

/// Participants, round participants and any node an anomaly names.
fn affected_nodes(
    participants: &[NodeId],
    round: Option<&ConsensusRound>,
    anomalies: &[Anomaly],
) -> Vec<NodeId> {
    let round_nodes = round.map(|r| r.participants.as_slice()).unwrap_or(&[]);
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::new();
    for node in participants
        .iter()
        .chain(round_nodes)
        .chain(anomalies.iter().flat_map(|a| &a.nodes))
    {
        if seen.insert(node) {
            nodes.push(node.clone());
        }
    }
    nodes
}
