//! Finalization tracker — records each provider's asserted finalized block
//! and flags markers that diverge from the weighted consensus view.
//!
//! One tracker exists per endpoint, owned by the consumer context. The
//! tracker is a pure in-memory aggregation: it never blocks on I/O and never
//! errors — absence of data means "unknown", not disagreement.

pub mod tracker;

pub use tracker::{Disagreement, FinalizationTracker, LagEscalation, TrackerConfig};
