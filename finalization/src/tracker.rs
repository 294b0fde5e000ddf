//! Per-endpoint finalization consensus tracking.

use relaymesh_types::{Endpoint, FinalizationMarker, ProviderAddress, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Escalation policy for providers that stay behind the consensus height.
///
/// The underlying protocol defines no staleness timeout, so escalation is
/// opt-in: when unset, a lagging-but-consistent provider is never flagged.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LagEscalation {
    /// How many blocks behind consensus a provider may trail.
    pub max_blocks_behind: u64,
    /// How long (seconds) the provider may stay beyond that lag.
    pub grace_secs: u64,
}

/// Tuning knobs for the tracker.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Records older than this (seconds) are ignored when computing the
    /// consensus view.
    pub recency_window_secs: u64,
    /// Optional escalation for chronically lagging providers.
    pub lag_escalation: Option<LagEscalation>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            recency_window_secs: 600,
            lag_escalation: None,
        }
    }
}

/// Why a recorded marker disagrees with the current view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disagreement {
    /// The marker's hash diverges from another assertion at the same height.
    /// `against` is the heaviest opposing marker.
    HashMismatch {
        ours: FinalizationMarker,
        against: FinalizationMarker,
    },
    /// The provider contradicted its own earlier assertion: a strictly older
    /// height, or a different hash at the height it already asserted.
    SelfRegression {
        previous: FinalizationMarker,
        current: FinalizationMarker,
    },
    /// The provider has trailed consensus beyond the configured lag
    /// escalation policy.
    StaleProvider {
        ours: FinalizationMarker,
        consensus: FinalizationMarker,
    },
}

struct Record {
    marker: FinalizationMarker,
    weight: u128,
    recorded_at: Timestamp,
    /// When the provider first exceeded the allowed lag, if it currently does.
    behind_since: Option<Timestamp>,
}

/// Tracks the latest finalized-block assertion per provider and the
/// weight-majority consensus view derived from them.
pub struct FinalizationTracker {
    endpoint: Endpoint,
    config: TrackerConfig,
    records: Mutex<HashMap<ProviderAddress, Record>>,
}

impl FinalizationTracker {
    pub fn new(endpoint: Endpoint, config: TrackerConfig) -> Self {
        Self {
            endpoint,
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Record a provider's latest marker and report whether it creates a
    /// disagreement.
    ///
    /// Last-writer-wins per provider. A marker that merely trails consensus
    /// (lower height whose hash agrees with whatever is known at that
    /// height) is not a disagreement. A strictly older height from the same
    /// provider is recorded anyway — it is evidence, and rejecting it would
    /// hide the evidence.
    pub fn record(
        &self,
        provider: &ProviderAddress,
        weight: u128,
        marker: FinalizationMarker,
        now: Timestamp,
    ) -> Option<Disagreement> {
        let mut records = self.records.lock().expect("finalization tracker lock poisoned");

        let regression = records.get(provider).and_then(|prev| {
            let contradicts_self = prev.marker.height > marker.height
                || (prev.marker.height == marker.height
                    && prev.marker.block_hash != marker.block_hash);
            contradicts_self.then_some(Disagreement::SelfRegression {
                previous: prev.marker,
                current: marker,
            })
        });

        // Divergence at equal height against other providers' live records.
        let cutoff = self.config.recency_window_secs;
        let against = records
            .iter()
            .filter(|(addr, r)| {
                *addr != provider
                    && !r.recorded_at.has_expired(cutoff, now)
                    && r.marker.height == marker.height
                    && r.marker.block_hash != marker.block_hash
            })
            .max_by_key(|(_, r)| r.weight)
            .map(|(_, r)| r.marker);

        let behind_since = records.get(provider).and_then(|r| r.behind_since);
        records.insert(
            provider.clone(),
            Record {
                marker,
                weight,
                recorded_at: now,
                behind_since,
            },
        );

        if let Some(regression) = regression {
            debug!(
                endpoint = %self.endpoint,
                provider = %provider,
                "provider contradicted its own finalization assertion"
            );
            return Some(regression);
        }
        if let Some(against) = against {
            debug!(
                endpoint = %self.endpoint,
                provider = %provider,
                height = marker.height,
                "finalization hash mismatch at equal height"
            );
            return Some(Disagreement::HashMismatch { ours: marker, against });
        }

        self.check_lag(&mut records, provider, marker, now)
    }

    /// Apply the lag escalation policy, updating the provider's
    /// `behind_since` bookkeeping.
    fn check_lag(
        &self,
        records: &mut HashMap<ProviderAddress, Record>,
        provider: &ProviderAddress,
        marker: FinalizationMarker,
        now: Timestamp,
    ) -> Option<Disagreement> {
        let policy = self.config.lag_escalation?;
        let consensus = Self::consensus_of(records, self.config.recency_window_secs, now)?;

        let lagging = consensus
            .height
            .saturating_sub(marker.height)
            > policy.max_blocks_behind;

        let record = records.get_mut(provider)?;
        if !lagging {
            record.behind_since = None;
            return None;
        }
        let since = *record.behind_since.get_or_insert(now);
        if now > since && since.has_expired(policy.grace_secs, now) {
            debug!(
                endpoint = %self.endpoint,
                provider = %provider,
                behind = consensus.height - marker.height,
                "provider exceeded lag escalation policy"
            );
            return Some(Disagreement::StaleProvider { ours: marker, consensus });
        }
        None
    }

    /// The current agreed marker: the (height, hash) pair asserted by the
    /// largest-weight subset of recently-seen providers. Ties prefer the
    /// higher height.
    pub fn consensus_snapshot(&self, now: Timestamp) -> Option<FinalizationMarker> {
        let records = self.records.lock().expect("finalization tracker lock poisoned");
        Self::consensus_of(&records, self.config.recency_window_secs, now)
    }

    fn consensus_of(
        records: &HashMap<ProviderAddress, Record>,
        recency_window_secs: u64,
        now: Timestamp,
    ) -> Option<FinalizationMarker> {
        let mut groups: HashMap<FinalizationMarker, u128> = HashMap::new();
        for record in records.values() {
            if record.recorded_at.has_expired(recency_window_secs, now) {
                continue;
            }
            *groups.entry(record.marker).or_insert(0) += record.weight;
        }
        groups
            .into_iter()
            .max_by(|(ma, wa), (mb, wb)| {
                wa.cmp(wb)
                    .then(ma.height.cmp(&mb.height))
                    .then(ma.block_hash.as_bytes().cmp(mb.block_hash.as_bytes()))
            })
            .map(|(marker, _)| marker)
    }

    /// Number of providers with a live record.
    pub fn tracked_providers(&self) -> usize {
        self.records.lock().expect("finalization tracker lock poisoned").len()
    }
}
