//! Update registrar — the seam between the chain-state layer and the core.
//!
//! The chain-state synchronization layer (an external collaborator) watches
//! the chain and pushes updates; this adapter routes them into the session
//! pool and exposes finalization-consensus subscriptions. The core never
//! learns how updates are transported — the external layer owns the delivery
//! loop and simply calls in.

use crate::context::{ConsumerContext, FinalizationSink};
use relaymesh_types::{Endpoint, Provider, Timestamp};
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes chain-state pushes into per-endpoint state.
pub struct UpdateRegistrar {
    context: Arc<ConsumerContext>,
}

impl UpdateRegistrar {
    pub fn new(context: Arc<ConsumerContext>) -> Self {
        Self { context }
    }

    /// A new pairing list for an endpoint: replaces the pool's eligible set.
    ///
    /// Updates for unregistered endpoints are dropped with a warning — the
    /// chain-state layer may race endpoint registration at startup.
    pub fn on_pairing_update(&self, endpoint: &Endpoint, providers: Vec<Provider>, now: Timestamp) {
        match self.context.pool(endpoint) {
            Some(pool) => {
                debug!(endpoint = %endpoint, count = providers.len(), "pairing update");
                pool.apply_pairing_update(providers, now);
            }
            None => warn!(endpoint = %endpoint, "pairing update for unregistered endpoint"),
        }
    }

    /// A chain specification update. Parsing configuration belongs to the
    /// request-encoding collaborator, which subscribes on its own; the core
    /// only acknowledges the push.
    pub fn on_spec_update(&self, endpoint: &Endpoint, _parser_config: serde_json::Value) {
        debug!(endpoint = %endpoint, "spec update forwarded to request-encoding layer");
    }

    /// Subscribe a sink to the endpoint's finalization-consensus snapshots.
    ///
    /// Returns `false` when the endpoint is not registered.
    pub fn on_finalization_consensus_subscribe(
        &self,
        endpoint: &Endpoint,
        sink: FinalizationSink,
    ) -> bool {
        match self.context.state(endpoint) {
            Some(state) => {
                state.subscribe_finalization(sink);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaymesh_finalization::TrackerConfig;
    use relaymesh_session::HealthConfig;
    use relaymesh_types::{ApiInterface, ProviderAddress, PublicKey};

    fn ep() -> Endpoint {
        Endpoint::new("ETH1", ApiInterface::JsonRpc)
    }

    fn provider(name: &str) -> Provider {
        Provider::new(
            ProviderAddress::new(format!("rmesh1{name}")),
            format!("https://{name}.example.com"),
            PublicKey([7u8; 32]),
            1_000,
        )
    }

    #[test]
    fn pairing_update_reaches_pool() {
        let ctx = Arc::new(ConsumerContext::new(
            HealthConfig::default(),
            TrackerConfig::default(),
        ));
        ctx.register_endpoint(ep());
        let registrar = UpdateRegistrar::new(Arc::clone(&ctx));

        registrar.on_pairing_update(&ep(), vec![provider("a"), provider("b")], Timestamp::new(0));
        assert_eq!(ctx.pool(&ep()).unwrap().paired_count(), 2);
    }

    #[test]
    fn update_for_unknown_endpoint_is_dropped() {
        let ctx = Arc::new(ConsumerContext::new(
            HealthConfig::default(),
            TrackerConfig::default(),
        ));
        let registrar = UpdateRegistrar::new(Arc::clone(&ctx));
        // Must not panic or create state as a side effect.
        registrar.on_pairing_update(&ep(), vec![provider("a")], Timestamp::new(0));
        assert!(ctx.pool(&ep()).is_none());
    }

    #[test]
    fn finalization_subscribe_requires_registration() {
        let ctx = Arc::new(ConsumerContext::new(
            HealthConfig::default(),
            TrackerConfig::default(),
        ));
        let registrar = UpdateRegistrar::new(Arc::clone(&ctx));
        assert!(!registrar.on_finalization_consensus_subscribe(&ep(), Box::new(|_| {})));

        ctx.register_endpoint(ep());
        assert!(registrar.on_finalization_consensus_subscribe(&ep(), Box::new(|_| {})));
    }
}
