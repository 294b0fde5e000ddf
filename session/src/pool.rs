//! The session pool — allocation, release, and pairing updates.

use crate::health::{HealthConfig, ProviderHealth};
use relaymesh_types::{Endpoint, Provider, ProviderAddress, Timestamp};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

/// An exclusive lease on one provider for one request.
///
/// Lifecycle: allocated on dispatch start, consumed once a response (or
/// failure) is recorded, released back to the pool. The pool guarantees the
/// underlying provider is never leased twice concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: u64,
    pub endpoint: Endpoint,
    pub provider: ProviderAddress,
    pub allocated_at: Timestamp,
}

/// How a session ended, from the pool's perspective.
///
/// `Cancelled` exists so that client-side deadlines do not unfairly penalize
/// providers: it releases the lease without touching the health score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Success { latency_ms: u64 },
    Failure,
    Cancelled,
}

struct PoolInner {
    /// Eligible provider set, replaced wholesale by pairing updates.
    providers: HashMap<ProviderAddress, Provider>,
    /// Health history, kept across pairing updates for surviving providers.
    health: HashMap<ProviderAddress, ProviderHealth>,
    /// Outstanding leases: session id -> provider.
    leases: HashMap<u64, ProviderAddress>,
    /// Providers currently leased (inverse index of `leases`).
    leased_providers: HashSet<ProviderAddress>,
    next_session_id: u64,
    /// Monotonic allocation sequence for least-recently-used tie-breaking.
    use_seq: u64,
}

/// Per-endpoint pool of providers with exclusive session leases.
///
/// All state sits behind a single mutex: allocation and release are short,
/// synchronous critical sections, and request volume is bounded by client
/// concurrency rather than provider count.
pub struct SessionPool {
    endpoint: Endpoint,
    config: HealthConfig,
    inner: Mutex<PoolInner>,
}

impl SessionPool {
    pub fn new(endpoint: Endpoint, config: HealthConfig) -> Self {
        Self {
            endpoint,
            config,
            inner: Mutex::new(PoolInner {
                providers: HashMap::new(),
                health: HashMap::new(),
                leases: HashMap::new(),
                leased_providers: HashSet::new(),
                next_session_id: 1,
                use_seq: 0,
            }),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Allocate up to `count` sessions over distinct, currently eligible,
    /// not-currently-leased providers.
    ///
    /// Returns fewer than `count` (possibly zero) when not enough providers
    /// are available; callers decide whether that satisfies their quorum.
    /// Never blocks beyond the internal lock. Selection prefers the best
    /// health score, ties broken least-recently-used to spread load.
    pub fn allocate(&self, count: usize, now: Timestamp) -> Vec<Session> {
        let mut inner = self.inner.lock().expect("session pool lock poisoned");
        let now_secs = now.as_secs();

        let mut candidates: Vec<(ProviderAddress, f64, u64)> = inner
            .providers
            .keys()
            .filter(|addr| !inner.leased_providers.contains(*addr))
            .map(|addr| {
                let (score, last_used) = inner
                    .health
                    .get(addr)
                    .map(|h| (h.score(&self.config, now_secs), h.last_used))
                    .unwrap_or((0.5, 0));
                (addr.clone(), score, last_used)
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(&b.2))
        });
        candidates.truncate(count);

        let mut sessions = Vec::with_capacity(candidates.len());
        for (addr, _, _) in candidates {
            let id = inner.next_session_id;
            inner.next_session_id += 1;
            inner.use_seq += 1;
            let seq = inner.use_seq;
            inner
                .health
                .entry(addr.clone())
                .or_insert_with(|| ProviderHealth::new(now_secs))
                .last_used = seq;
            inner.leases.insert(id, addr.clone());
            inner.leased_providers.insert(addr.clone());
            sessions.push(Session {
                id,
                endpoint: self.endpoint.clone(),
                provider: addr,
                allocated_at: now,
            });
        }
        sessions
    }

    /// Return a session's provider to the eligible set and record the
    /// outcome for health scoring.
    ///
    /// Releasing a session the pool no longer knows about is a no-op and
    /// returns `false` — the provider may have been unpaired mid-flight, or
    /// the release may be a late duplicate.
    pub fn release(&self, session: &Session, outcome: SessionOutcome, now: Timestamp) -> bool {
        let mut inner = self.inner.lock().expect("session pool lock poisoned");
        let Some(addr) = inner.leases.remove(&session.id) else {
            return false;
        };
        inner.leased_providers.remove(&addr);

        let now_secs = now.as_secs();
        if let Some(health) = inner.health.get_mut(&addr) {
            match outcome {
                SessionOutcome::Success { latency_ms } => {
                    health.record_success(&self.config, latency_ms, now_secs);
                }
                SessionOutcome::Failure => {
                    health.record_failure(&self.config, now_secs);
                }
                SessionOutcome::Cancelled => {}
            }
        }
        debug!(
            endpoint = %self.endpoint,
            provider = %addr,
            session = session.id,
            ?outcome,
            "session released"
        );
        true
    }

    /// Replace the eligible provider set for this endpoint.
    ///
    /// Outstanding leases on removed providers are allowed to finish; the
    /// provider is simply never reissued. Health history is kept for
    /// providers that survive the update.
    pub fn apply_pairing_update(&self, providers: Vec<Provider>, now: Timestamp) {
        let mut inner = self.inner.lock().expect("session pool lock poisoned");
        let now_secs = now.as_secs();

        inner.providers = providers
            .into_iter()
            .map(|p| (p.address.clone(), p))
            .collect();

        let retained: HashSet<ProviderAddress> = inner.providers.keys().cloned().collect();
        inner.health.retain(|addr, _| retained.contains(addr));
        for addr in &retained {
            inner
                .health
                .entry(addr.clone())
                .or_insert_with(|| ProviderHealth::new(now_secs));
        }
        debug!(
            endpoint = %self.endpoint,
            providers = retained.len(),
            "pairing update applied"
        );
    }

    /// Look up a currently paired provider by address.
    pub fn provider(&self, addr: &ProviderAddress) -> Option<Provider> {
        let inner = self.inner.lock().expect("session pool lock poisoned");
        inner.providers.get(addr).cloned()
    }

    /// Number of currently paired providers.
    pub fn paired_count(&self) -> usize {
        let inner = self.inner.lock().expect("session pool lock poisoned");
        inner.providers.len()
    }

    /// Number of outstanding leases.
    pub fn outstanding(&self) -> usize {
        let inner = self.inner.lock().expect("session pool lock poisoned");
        inner.leases.len()
    }
}
