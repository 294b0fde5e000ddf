//! The consumer dispatcher — one client request, a quorum of providers.
//!
//! Each request acquires sessions from the pool, fans out one concurrent
//! call per session, compares the answers by content hash, feeds every
//! finalization marker to the tracker, and files conflict reports for
//! whatever disagrees. The client always gets a best-effort answer without
//! waiting on adjudication.

use crate::context::{ConsumerContext, EndpointState};
use crate::error::DispatchError;
use crate::submitter::ConflictSubmitter;
use crate::transport::{RelayEnvelope, RelayRequest, RelayTransport};
use relaymesh_conflict::{ConflictKind, ConflictReport};
use relaymesh_crypto::{hash_payload, relay_proof_message, verify_signature};
use relaymesh_finalization::Disagreement;
use relaymesh_session::{Session, SessionOutcome};
use relaymesh_types::{
    Endpoint, FinalizationMarker, Provider, ProviderResponse, RelayError, Timestamp,
};
use relaymesh_utils::StatsCounter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Timing and quorum knobs for request execution.
#[derive(Clone, Copy, Debug)]
pub struct DispatchConfig {
    /// Provider responses to require per request.
    pub required_responses: usize,
    /// Per-provider call timeout.
    pub call_timeout: Duration,
    /// Overall client deadline; outstanding calls are abandoned past it.
    pub request_deadline: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            required_responses: 1,
            call_timeout: Duration::from_millis(5_000),
            request_deadline: Duration::from_millis(15_000),
        }
    }
}

/// A decided request.
#[derive(Clone, Debug)]
pub struct DispatchOutcome {
    /// The answer returned to the client (majority, or first on a tie).
    pub response: ProviderResponse,
    /// Fewer responses than requested arrived, but at least one did.
    pub partial_quorum: bool,
    /// Conflict reports filed as a side effect of this request.
    pub reported_conflicts: usize,
}

const STAT_NAMES: &[&str] = &[
    "relays_sent",
    "relay_failures",
    "conflict_reports",
    "partial_quorums",
    "requests_cancelled",
];

/// Executes client requests against an endpoint's provider quorum.
pub struct Dispatcher<T: RelayTransport> {
    context: Arc<ConsumerContext>,
    transport: Arc<T>,
    submitter: Arc<dyn ConflictSubmitter>,
    config: DispatchConfig,
    stats: StatsCounter,
}

impl<T: RelayTransport> Dispatcher<T> {
    pub fn new(
        context: Arc<ConsumerContext>,
        transport: Arc<T>,
        submitter: Arc<dyn ConflictSubmitter>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            context,
            transport,
            submitter,
            config,
            stats: StatsCounter::new(STAT_NAMES),
        }
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Execute a query with the configured quorum.
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        query: Vec<u8>,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.execute_with_quorum(endpoint, query, self.config.required_responses)
            .await
    }

    /// Execute a query requiring `required_responses` independent answers.
    ///
    /// Falls back to best effort when fewer providers are available; fails
    /// with [`DispatchError::InsufficientProviders`] only when none are.
    pub async fn execute_with_quorum(
        &self,
        endpoint: &Endpoint,
        query: Vec<u8>,
        required_responses: usize,
    ) -> Result<DispatchOutcome, DispatchError> {
        let state = self
            .context
            .state(endpoint)
            .ok_or_else(|| DispatchError::UnknownEndpoint(endpoint.key()))?;

        let now = Timestamp::now();
        let sessions = state.pool.allocate(required_responses.max(1), now);
        if sessions.is_empty() {
            return Err(DispatchError::InsufficientProviders(endpoint.key()));
        }

        let request = RelayRequest {
            endpoint: endpoint.clone(),
            query,
        };
        // Set once the request is abandoned; late sub-task results check it
        // and drop their result instead of touching shared state.
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::channel::<(u64, Result<ProviderResponse, RelayError>)>(
            sessions.len(),
        );

        let mut pending: HashMap<u64, Session> = HashMap::new();
        for session in sessions {
            let Some(provider) = state.pool.provider(&session.provider) else {
                // Unpaired between allocation and lookup; not the provider's
                // fault.
                state.pool.release(&session, SessionOutcome::Cancelled, now);
                continue;
            };
            self.stats.increment("relays_sent");
            self.spawn_call(&session, provider, &request, &tx, &cancelled);
            pending.insert(session.id, session);
        }
        drop(tx);

        if pending.is_empty() {
            return Err(DispatchError::InsufficientProviders(endpoint.key()));
        }
        let allocated = pending.len();

        // Collect until every sub-task resolved or the client deadline fires.
        let deadline = tokio::time::sleep(self.config.request_deadline);
        tokio::pin!(deadline);

        let mut successes: Vec<(Session, ProviderResponse)> = Vec::new();
        let mut resolved = 0usize;
        while resolved < allocated {
            tokio::select! {
                msg = rx.recv() => {
                    let Some((session_id, call)) = msg else { break };
                    resolved += 1;
                    let Some(session) = pending.remove(&session_id) else { continue };
                    match call {
                        Ok(response) => successes.push((session, response)),
                        Err(e) => {
                            debug!(
                                endpoint = %endpoint,
                                provider = %session.provider,
                                error = %e,
                                "provider call failed"
                            );
                            self.stats.increment("relay_failures");
                            state.pool.release(&session, SessionOutcome::Failure, Timestamp::now());
                        }
                    }
                }
                _ = &mut deadline => {
                    self.stats.increment("requests_cancelled");
                    cancelled.store(true, Ordering::Release);
                    break;
                }
            }
        }

        // Abandonment: whatever is still in flight gets its session back
        // without a health penalty.
        if !pending.is_empty() {
            cancelled.store(true, Ordering::Release);
            let now = Timestamp::now();
            for session in pending.into_values() {
                state.pool.release(&session, SessionOutcome::Cancelled, now);
            }
        }

        if successes.is_empty() {
            return Err(DispatchError::AllProvidersFailed(endpoint.key()));
        }

        let reported = self.decide(endpoint, &state, &mut successes);
        let partial_quorum = successes.len() < required_responses;
        if partial_quorum {
            self.stats.increment("partial_quorums");
        }

        Ok(DispatchOutcome {
            response: successes[0].1.clone(),
            partial_quorum,
            reported_conflicts: reported,
        })
    }

    /// Fan out one provider call as its own task.
    fn spawn_call(
        &self,
        session: &Session,
        provider: Provider,
        request: &RelayRequest,
        tx: &mpsc::Sender<(u64, Result<ProviderResponse, RelayError>)>,
        cancelled: &Arc<AtomicBool>,
    ) {
        let tx = tx.clone();
        let cancelled = Arc::clone(cancelled);
        let transport = Arc::clone(&self.transport);
        let request = request.clone();
        let call_timeout = self.config.call_timeout;
        let session_id = session.id;

        tokio::spawn(async move {
            let started = Instant::now();
            let result =
                tokio::time::timeout(call_timeout, transport.relay(&provider, &request)).await;
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            let latency_ms = started.elapsed().as_millis() as u64;
            let call = match result {
                Ok(Ok(envelope)) => build_response(&provider, envelope, latency_ms),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(RelayError::CallTimeout(call_timeout.as_millis() as u64)),
            };
            let _ = tx.send((session_id, call)).await;
        });
    }

    /// Compare the successful responses, file conflict reports, release the
    /// remaining sessions, and reorder `successes` so the chosen answer is
    /// first. Returns how many reports were filed.
    fn decide(
        &self,
        endpoint: &Endpoint,
        state: &EndpointState,
        successes: &mut Vec<(Session, ProviderResponse)>,
    ) -> usize {
        // Group indices by content hash, preserving arrival order.
        let mut groups: Vec<(relaymesh_types::DataHash, Vec<usize>)> = Vec::new();
        for (i, (_, response)) in successes.iter().enumerate() {
            match groups.iter_mut().find(|(h, _)| *h == response.data_hash) {
                Some((_, members)) => members.push(i),
                None => groups.push((response.data_hash, vec![i])),
            }
        }

        // Majority group wins; a tie keeps the first-seen response.
        let winner = groups
            .iter()
            .enumerate()
            .max_by_key(|(i, (_, members))| (members.len(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let reference = successes[groups[winner].1[0]].1.clone();

        let mut reported = 0usize;
        let now = Timestamp::now();
        for (gi, (_, members)) in groups.iter().enumerate() {
            for &i in members {
                let (session, response) = &successes[i];
                if gi == winner {
                    state.pool.release(
                        session,
                        SessionOutcome::Success {
                            latency_ms: response.latency_ms,
                        },
                        now,
                    );
                } else {
                    warn!(
                        endpoint = %endpoint,
                        provider = %response.provider,
                        ours = %response.data_hash,
                        reference = %reference.data_hash,
                        "response conflict detected"
                    );
                    let report = ConflictReport::new(
                        endpoint.clone(),
                        ConflictKind::Response,
                        reference.clone(),
                        response.clone(),
                    );
                    self.submitter.submit(&report);
                    reported += 1;
                    state
                        .pool
                        .release(session, SessionOutcome::Failure, now);
                }
            }
        }
        if reported > 0 {
            self.stats.add("conflict_reports", reported as u64);
        }

        reported += self.track_finalization(endpoint, state, successes, now);

        // Surface the chosen answer at index 0 for the caller.
        let chosen = groups[winner].1[0];
        successes.swap(0, chosen);

        reported
    }

    /// Feed every successful response's marker to the tracker and file
    /// finalization conflicts, which are orthogonal to content conflicts.
    fn track_finalization(
        &self,
        endpoint: &Endpoint,
        state: &EndpointState,
        successes: &[(Session, ProviderResponse)],
        now: Timestamp,
    ) -> usize {
        let mut reported = 0usize;
        for (_, response) in successes {
            let weight = state
                .pool
                .provider(&response.provider)
                .map(|p| p.stake_weight)
                .unwrap_or(1);
            let disagreement =
                state
                    .tracker
                    .record(&response.provider, weight, response.finalized, now);

            if let Some(disagreement) = &disagreement {
                if let Some(report) =
                    self.finalization_report(endpoint, state, successes, response, disagreement)
                {
                    self.submitter.submit(&report);
                    self.stats.increment("conflict_reports");
                    reported += 1;
                } else {
                    warn!(
                        endpoint = %endpoint,
                        provider = %response.provider,
                        ?disagreement,
                        "finalization disagreement without a signed counterpart"
                    );
                }
            }
            // Archive after use so self-conflicts can cite the old proof.
            state.swap_proof(&response.provider, response.clone());
        }
        state.publish_consensus(now);
        reported
    }

    /// Pair a flagged response with the signed evidence it disagrees with.
    fn finalization_report(
        &self,
        endpoint: &Endpoint,
        state: &EndpointState,
        successes: &[(Session, ProviderResponse)],
        response: &ProviderResponse,
        disagreement: &Disagreement,
    ) -> Option<ConflictReport> {
        let (kind, counterpart) = match disagreement {
            Disagreement::SelfRegression { previous, .. } => (
                ConflictKind::SameProvider,
                state
                    .proof_with_marker(previous)
                    .filter(|r| r.provider == response.provider),
            ),
            Disagreement::HashMismatch { against, .. } => (
                ConflictKind::Finalization,
                find_by_marker(successes, against, &response.provider)
                    .or_else(|| state.proof_with_marker(against)),
            ),
            Disagreement::StaleProvider { consensus, .. } => (
                ConflictKind::Finalization,
                find_by_marker(successes, consensus, &response.provider)
                    .or_else(|| state.proof_with_marker(consensus)),
            ),
        };
        counterpart.map(|counterpart| {
            ConflictReport::new(endpoint.clone(), kind, counterpart, response.clone())
        })
    }
}

fn find_by_marker(
    successes: &[(Session, ProviderResponse)],
    marker: &FinalizationMarker,
    exclude: &relaymesh_types::ProviderAddress,
) -> Option<ProviderResponse> {
    successes
        .iter()
        .map(|(_, r)| r)
        .find(|r| r.finalized == *marker && r.provider != *exclude)
        .cloned()
}

/// Verify the relay proof and turn an envelope into a recorded response.
///
/// A response whose signature does not verify against the provider's paired
/// key is a call failure, not a candidate answer.
fn build_response(
    provider: &Provider,
    envelope: RelayEnvelope,
    latency_ms: u64,
) -> Result<ProviderResponse, RelayError> {
    let data_hash = hash_payload(&envelope.payload);
    let message =
        relay_proof_message(&data_hash, envelope.finalized_height, &envelope.finalized_hash);
    if !verify_signature(&message, &envelope.signature, &provider.public_key) {
        return Err(RelayError::InvalidRelayProof(provider.address.to_string()));
    }
    Ok(ProviderResponse {
        provider: provider.address.clone(),
        payload: envelope.payload,
        data_hash,
        finalized: FinalizationMarker::new(envelope.finalized_height, envelope.finalized_hash),
        signature: envelope.signature,
        latency_ms,
    })
}
