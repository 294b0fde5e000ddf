//! Conflict detection and resolution for relaymesh.
//!
//! When two providers answer the same query differently, the consumer files a
//! conflict report; the network then runs a two-phase commit-reveal vote
//! among third-party voters who did not witness the exchange, producing a
//! binding verdict. This crate carries both halves of that wire contract:
//! the report format the consumer submits and the vote state machine the
//! network runs.
//!
//! ## Module overview
//!
//! - [`commit`] — the commit-reveal binding (`SHA-256(LE64(nonce) ‖ dataHash)`).
//! - [`verdict`] — typed verdicts and tally phases, plus the legacy wire values.
//! - [`report`] — conflict reports and their deterministic ids.
//! - [`vote`] — the per-conflict vote state machine.
//! - [`registry`] — container routing commits/reveals and driving deadlines.
//! - [`events`] — lifecycle events with the wire-stable event names.
//! - [`error`] — conflict error types.

pub mod commit;
pub mod error;
pub mod events;
pub mod registry;
pub mod report;
pub mod verdict;
pub mod vote;

pub use commit::{commit_vote_data, reveal_matches};
pub use error::ConflictError;
pub use events::{ConflictEvent, EventBus};
pub use registry::VoteRegistry;
pub use report::{ConflictKind, ConflictReport};
pub use verdict::{TallyPhase, Verdict};
pub use vote::{ConflictVote, Resolution, VoteConfig};
