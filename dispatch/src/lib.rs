//! Consumer dispatcher for relaymesh.
//!
//! Orchestrates a single client request end to end: session allocation,
//! concurrent provider calls, response comparison, finalization tracking,
//! and conflict reporting. Also owns the consumer-side wiring: the context
//! holding per-endpoint state, the registrar the chain-state layer pushes
//! updates through, the report submitter feeding the transaction layer, and
//! the consumer configuration.
//!
//! ## Module overview
//!
//! - [`dispatcher`] — request execution (`Dispatcher::execute`).
//! - [`context`] — per-endpoint state owner (`ConsumerContext`).
//! - [`registrar`] — chain-state update adapter (`UpdateRegistrar`).
//! - [`transport`] — provider call transport (`RelayTransport`, HTTP impl).
//! - [`submitter`] — fire-and-forget conflict report submission.
//! - [`config`] — TOML consumer configuration.
//! - [`shutdown`] — broadcast-based graceful shutdown.
//! - [`error`] — dispatch error types.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod registrar;
pub mod shutdown;
pub mod submitter;
pub mod transport;

pub use config::{ConsumerConfig, EndpointConfig};
pub use context::{ConsumerContext, EndpointState, FinalizationSink};
pub use dispatcher::{DispatchConfig, DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use registrar::UpdateRegistrar;
pub use shutdown::ShutdownController;
pub use submitter::{ConflictSubmitter, TxQueueSubmitter};
pub use transport::{HttpRelayTransport, RelayEnvelope, RelayRequest, RelayTransport};
