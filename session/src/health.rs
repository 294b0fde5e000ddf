//! Per-provider health scoring with exponential decay.
//!
//! Success and failure counts decay continuously so that a provider's score
//! reflects its recent behavior rather than its lifetime totals. A provider
//! with a high recent failure rate sinks in the selection order (soft
//! exclusion) but is never removed — removal happens only through pairing
//! updates.

use serde::{Deserialize, Serialize};

/// Tuning knobs for health scoring.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Half-life of success/failure counts, in seconds.
    pub half_life_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { half_life_secs: 60 }
    }
}

/// Decayed success/failure tallies for one provider.
#[derive(Clone, Debug)]
pub struct ProviderHealth {
    successes: f64,
    failures: f64,
    /// Running average round-trip latency (EMA, milliseconds).
    avg_latency_ms: f64,
    /// Timestamp (epoch seconds) of the last decay application.
    last_decay: u64,
    /// Pool-wide use sequence at the provider's last allocation,
    /// for least-recently-used tie-breaking.
    pub last_used: u64,
}

impl ProviderHealth {
    pub fn new(now_secs: u64) -> Self {
        Self {
            successes: 0.0,
            failures: 0.0,
            avg_latency_ms: 0.0,
            last_decay: now_secs,
            last_used: 0,
        }
    }

    fn decay(&mut self, config: &HealthConfig, now_secs: u64) {
        let elapsed = now_secs.saturating_sub(self.last_decay);
        if elapsed == 0 {
            return;
        }
        let factor = 0.5_f64.powf(elapsed as f64 / config.half_life_secs.max(1) as f64);
        self.successes *= factor;
        self.failures *= factor;
        self.last_decay = now_secs;
    }

    pub fn record_success(&mut self, config: &HealthConfig, latency_ms: u64, now_secs: u64) {
        self.decay(config, now_secs);
        self.successes += 1.0;
        if self.avg_latency_ms == 0.0 {
            self.avg_latency_ms = latency_ms as f64;
        } else {
            self.avg_latency_ms = 0.8 * self.avg_latency_ms + 0.2 * latency_ms as f64;
        }
    }

    pub fn record_failure(&mut self, config: &HealthConfig, now_secs: u64) {
        self.decay(config, now_secs);
        self.failures += 1.0;
    }

    /// Score in (0, 1), higher is healthier.
    ///
    /// Laplace-smoothed success ratio over the decayed counts, so an unknown
    /// provider starts at 0.5 rather than at either extreme.
    pub fn score(&self, config: &HealthConfig, now_secs: u64) -> f64 {
        let elapsed = now_secs.saturating_sub(self.last_decay);
        let factor = 0.5_f64.powf(elapsed as f64 / config.half_life_secs.max(1) as f64);
        let s = self.successes * factor;
        let f = self.failures * factor;
        (s + 1.0) / (s + f + 2.0)
    }

    pub fn avg_latency_ms(&self) -> f64 {
        self.avg_latency_ms
    }
}
