//! Session pool — exclusive, time-bounded provider leases per endpoint.
//!
//! One pool exists per endpoint, owned by the consumer context. The pool
//! holds the paired provider set (replaced wholesale by pairing updates),
//! tracks per-provider health, and hands out sessions: exclusive leases that
//! guarantee no provider serves two in-flight requests at once.
//!
//! ## Module overview
//!
//! - [`pool`] — the `SessionPool` itself (allocate / release / pairing).
//! - [`health`] — per-provider health scoring with exponential decay.

pub mod health;
pub mod pool;

pub use health::{HealthConfig, ProviderHealth};
pub use pool::{Session, SessionOutcome, SessionPool};
