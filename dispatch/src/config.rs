//! Consumer configuration with TOML file support.

use relaymesh_finalization::LagEscalation;
use relaymesh_types::ApiInterface;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DispatchError;

/// One endpoint the consumer serves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub chain_id: String,
    pub api_interface: ApiInterface,
}

/// Configuration for the relaymesh consumer.
///
/// Can be loaded from a TOML file via [`ConsumerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Endpoints to serve.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// How many independent provider responses to require per request.
    #[serde(default = "default_required_responses")]
    pub required_responses: usize,

    /// Per-provider call timeout in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Overall client deadline per request in milliseconds.
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,

    /// Half-life of provider health counts, in seconds.
    #[serde(default = "default_health_half_life_secs")]
    pub health_half_life_secs: u64,

    /// Finalization records older than this are ignored, in seconds.
    #[serde(default = "default_recency_window_secs")]
    pub recency_window_secs: u64,

    /// Optional escalation for providers that stay behind consensus.
    #[serde(default)]
    pub lag_escalation: Option<LagEscalation>,

    /// Capacity of the outbound conflict report queue.
    #[serde(default = "default_report_queue_capacity")]
    pub report_queue_capacity: usize,

    /// Path to a 32-byte hex-encoded signing seed.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Allow running with a freshly generated throwaway identity. Meant for
    /// development only; without a key file the daemon otherwise refuses to
    /// start.
    #[serde(default)]
    pub allow_ephemeral_key: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_required_responses() -> usize {
    1
}

fn default_call_timeout_ms() -> u64 {
    5_000
}

fn default_request_deadline_ms() -> u64 {
    15_000
}

fn default_health_half_life_secs() -> u64 {
    60
}

fn default_recency_window_secs() -> u64 {
    600
}

fn default_report_queue_capacity() -> usize {
    1_024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ConsumerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, DispatchError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DispatchError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DispatchError> {
        toml::from_str(s).map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ConsumerConfig is always serializable to TOML")
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            required_responses: default_required_responses(),
            call_timeout_ms: default_call_timeout_ms(),
            request_deadline_ms: default_request_deadline_ms(),
            health_half_life_secs: default_health_half_life_secs(),
            recency_window_secs: default_recency_window_secs(),
            lag_escalation: None,
            report_queue_capacity: default_report_queue_capacity(),
            key_file: None,
            allow_ephemeral_key: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ConsumerConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = ConsumerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.required_responses, config.required_responses);
        assert_eq!(parsed.call_timeout_ms, config.call_timeout_ms);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ConsumerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.required_responses, 1);
        assert_eq!(config.call_timeout_ms, 5_000);
        assert_eq!(config.log_format, "human");
        assert!(config.lag_escalation.is_none());
        assert!(!config.allow_ephemeral_key);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            required_responses = 3
            call_timeout_ms = 2000

            [[endpoints]]
            chain_id = "ETH1"
            api_interface = "jsonrpc"

            [lag_escalation]
            max_blocks_behind = 10
            grace_secs = 120
        "#;
        let config = ConsumerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.required_responses, 3);
        assert_eq!(config.call_timeout_ms, 2_000);
        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].chain_id, "ETH1");
        assert_eq!(config.lag_escalation.unwrap().max_blocks_behind, 10);
        assert_eq!(config.log_format, "human"); // default
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("relaymesh.toml");
        let mut config = ConsumerConfig::default();
        config.required_responses = 5;
        std::fs::write(&path, config.to_toml_string()).expect("write config");

        let loaded = ConsumerConfig::from_toml_file(path.to_str().unwrap()).expect("load");
        assert_eq!(loaded.required_responses, 5);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ConsumerConfig::from_toml_file("/nonexistent/relaymesh.toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }
}
