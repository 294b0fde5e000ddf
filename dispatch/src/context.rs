//! The consumer context — explicit owner of all per-endpoint state.
//!
//! Instead of process-wide registries, everything keyed by endpoint (session
//! pool, finalization tracker, relay proof archive, consensus subscribers)
//! hangs off one context object created at startup and dropped at shutdown.

use relaymesh_finalization::{FinalizationTracker, TrackerConfig};
use relaymesh_session::{HealthConfig, SessionPool};
use relaymesh_types::{Endpoint, FinalizationMarker, ProviderAddress, ProviderResponse, Timestamp};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Receives consensus snapshots as the tracker's view moves.
pub type FinalizationSink = Box<dyn Fn(&FinalizationMarker) + Send + Sync>;

/// Everything the consumer holds for one endpoint.
pub struct EndpointState {
    pub pool: Arc<SessionPool>,
    pub tracker: Arc<FinalizationTracker>,
    /// Latest signed response per provider. Kept so that finalization
    /// conflicts against a provider's *earlier* assertion can still carry
    /// both pieces of signed evidence.
    proofs: Mutex<HashMap<ProviderAddress, ProviderResponse>>,
    sinks: Mutex<Vec<FinalizationSink>>,
    last_published: Mutex<Option<FinalizationMarker>>,
}

impl EndpointState {
    fn new(endpoint: Endpoint, health: HealthConfig, tracker: TrackerConfig) -> Self {
        Self {
            pool: Arc::new(SessionPool::new(endpoint.clone(), health)),
            tracker: Arc::new(FinalizationTracker::new(endpoint, tracker)),
            proofs: Mutex::new(HashMap::new()),
            sinks: Mutex::new(Vec::new()),
            last_published: Mutex::new(None),
        }
    }

    /// The provider's previous signed response, replaced with the new one.
    pub fn swap_proof(
        &self,
        provider: &ProviderAddress,
        response: ProviderResponse,
    ) -> Option<ProviderResponse> {
        let mut proofs = self.proofs.lock().expect("proof archive lock poisoned");
        proofs.insert(provider.clone(), response)
    }

    /// Find an archived response asserting exactly the given marker.
    pub fn proof_with_marker(&self, marker: &FinalizationMarker) -> Option<ProviderResponse> {
        let proofs = self.proofs.lock().expect("proof archive lock poisoned");
        proofs.values().find(|r| r.finalized == *marker).cloned()
    }

    /// Subscribe a sink to consensus snapshot changes.
    pub fn subscribe_finalization(&self, sink: FinalizationSink) {
        self.sinks.lock().expect("sink list lock poisoned").push(sink);
    }

    /// Notify sinks if the consensus snapshot moved since the last publish.
    pub fn publish_consensus(&self, now: Timestamp) {
        let Some(snapshot) = self.tracker.consensus_snapshot(now) else {
            return;
        };
        let mut last = self.last_published.lock().expect("publish lock poisoned");
        if *last == Some(snapshot) {
            return;
        }
        *last = Some(snapshot);
        drop(last);
        for sink in self.sinks.lock().expect("sink list lock poisoned").iter() {
            sink(&snapshot);
        }
    }
}

/// Owner of all per-endpoint state, with at most one pool and one tracker
/// per endpoint key.
pub struct ConsumerContext {
    health_config: HealthConfig,
    tracker_config: TrackerConfig,
    endpoints: Mutex<HashMap<Endpoint, Arc<EndpointState>>>,
}

impl ConsumerContext {
    pub fn new(health_config: HealthConfig, tracker_config: TrackerConfig) -> Self {
        Self {
            health_config,
            tracker_config,
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Register an endpoint, creating its pool and tracker.
    ///
    /// Idempotent: returns `false` when the endpoint already exists, leaving
    /// the existing state untouched.
    pub fn register_endpoint(&self, endpoint: Endpoint) -> bool {
        let mut endpoints = self.endpoints.lock().expect("endpoint map lock poisoned");
        if endpoints.contains_key(&endpoint) {
            return false;
        }
        info!(endpoint = %endpoint, "endpoint registered");
        let state = Arc::new(EndpointState::new(
            endpoint.clone(),
            self.health_config,
            self.tracker_config,
        ));
        endpoints.insert(endpoint, state);
        true
    }

    pub fn state(&self, endpoint: &Endpoint) -> Option<Arc<EndpointState>> {
        let endpoints = self.endpoints.lock().expect("endpoint map lock poisoned");
        endpoints.get(endpoint).cloned()
    }

    pub fn pool(&self, endpoint: &Endpoint) -> Option<Arc<SessionPool>> {
        self.state(endpoint).map(|s| Arc::clone(&s.pool))
    }

    pub fn tracker(&self, endpoint: &Endpoint) -> Option<Arc<FinalizationTracker>> {
        self.state(endpoint).map(|s| Arc::clone(&s.tracker))
    }

    /// The tracker's current agreed marker for an endpoint.
    pub fn consensus_snapshot(
        &self,
        endpoint: &Endpoint,
        now: Timestamp,
    ) -> Option<FinalizationMarker> {
        self.state(endpoint)?.tracker.consensus_snapshot(now)
    }

    pub fn registered_endpoints(&self) -> Vec<Endpoint> {
        let endpoints = self.endpoints.lock().expect("endpoint map lock poisoned");
        endpoints.keys().cloned().collect()
    }
}
