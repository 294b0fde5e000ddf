//! Conflict lifecycle events for subscribers.
//!
//! The event name strings are wire-stable: downstream tooling matches on
//! them, so they carry the exact names used by the dispute module they
//! interoperate with.

use crate::verdict::Verdict;
use relaymesh_types::{Endpoint, ProviderAddress};

pub const CONFLICT_DETECTION_RECEIVED_EVENT: &str = "conflict_detection_received";
pub const CONFLICT_VOTE_REVEAL_EVENT: &str = "conflict_vote_reveal_started";
pub const CONFLICT_VOTE_DETECTION_EVENT: &str = "response_conflict_detection";
pub const CONFLICT_VOTE_RESOLVED_EVENT: &str = "conflict_detection_vote_resolved";
pub const CONFLICT_VOTE_UNRESOLVED_EVENT: &str = "conflict_detection_vote_unresolved";
pub const CONFLICT_VOTE_GOT_COMMIT_EVENT: &str = "conflict_vote_got_commit";
pub const CONFLICT_VOTE_GOT_REVEAL_EVENT: &str = "conflict_vote_got_reveal";
pub const CONFLICT_UNSTAKE_FRAUD_VOTER_EVENT: &str = "conflict_unstake_fraud_voter";

/// Events emitted as a conflict moves through detection and adjudication.
#[derive(Clone, Debug)]
pub enum ConflictEvent {
    /// A conflict report was accepted and a vote opened.
    DetectionReceived { vote_id: String },
    /// A response conflict was detected between two providers.
    ResponseConflictDetected {
        endpoint: Endpoint,
        provider0: ProviderAddress,
        provider1: ProviderAddress,
    },
    /// The commit window closed; reveals are now accepted.
    RevealStarted { vote_id: String },
    /// A voter's commitment was accepted.
    GotCommit {
        vote_id: String,
        voter: ProviderAddress,
    },
    /// A voter's reveal was accepted.
    GotReveal {
        vote_id: String,
        voter: ProviderAddress,
    },
    /// The vote resolved with a verdict.
    VoteResolved {
        vote_id: String,
        verdict: Verdict,
    },
    /// The reveal window closed without a majority.
    VoteUnresolved { vote_id: String },
    /// A provider found at fault forfeits its stake.
    FraudVoterUnstaked {
        vote_id: String,
        provider: ProviderAddress,
    },
}

impl ConflictEvent {
    /// The wire-stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DetectionReceived { .. } => CONFLICT_DETECTION_RECEIVED_EVENT,
            Self::ResponseConflictDetected { .. } => CONFLICT_VOTE_DETECTION_EVENT,
            Self::RevealStarted { .. } => CONFLICT_VOTE_REVEAL_EVENT,
            Self::GotCommit { .. } => CONFLICT_VOTE_GOT_COMMIT_EVENT,
            Self::GotReveal { .. } => CONFLICT_VOTE_GOT_REVEAL_EVENT,
            Self::VoteResolved { .. } => CONFLICT_VOTE_RESOLVED_EVENT,
            Self::VoteUnresolved { .. } => CONFLICT_VOTE_UNRESOLVED_EVENT,
            Self::FraudVoterUnstaked { .. } => CONFLICT_UNSTAKE_FRAUD_VOTER_EVENT,
        }
    }
}

/// Synchronous fan-out event bus for conflict events.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling vote processing.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ConflictEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ConflictEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ConflictEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&ConflictEvent::VoteUnresolved {
            vote_id: "aa".into(),
        });
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&ConflictEvent::DetectionReceived {
            vote_id: "aa".into(),
        }); // should not panic
    }

    #[test]
    fn event_names_are_wire_stable() {
        assert_eq!(
            ConflictEvent::DetectionReceived { vote_id: String::new() }.name(),
            "conflict_detection_received"
        );
        assert_eq!(
            ConflictEvent::RevealStarted { vote_id: String::new() }.name(),
            "conflict_vote_reveal_started"
        );
        assert_eq!(
            ConflictEvent::VoteResolved {
                vote_id: String::new(),
                verdict: Verdict::Provider0,
            }
            .name(),
            "conflict_detection_vote_resolved"
        );
        assert_eq!(
            ConflictEvent::FraudVoterUnstaked {
                vote_id: String::new(),
                provider: ProviderAddress::new("rmesh1x"),
            }
            .name(),
            "conflict_unstake_fraud_voter"
        );
    }
}
