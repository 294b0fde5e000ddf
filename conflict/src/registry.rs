//! Vote registry — container managing all conflict votes under adjudication.
//!
//! This is the network-side coordinator: it accepts conflict reports
//! (idempotently), routes commits and reveals to the right vote, drives
//! height-based window transitions, and fans lifecycle events out to
//! subscribers.

use crate::error::ConflictError;
use crate::events::{ConflictEvent, EventBus};
use crate::report::ConflictReport;
use crate::verdict::Verdict;
use crate::vote::{ConflictVote, PhaseChange, VoteConfig};
use relaymesh_types::{DataHash, ProviderAddress};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Container for all conflict votes, keyed by report id.
///
/// Enforces a capacity bound against report spam, and remembers concluded
/// vote ids so that re-detecting an already-adjudicated disagreement is a
/// no-op rather than a fresh vote.
pub struct VoteRegistry {
    votes: HashMap<String, ConflictVote>,
    /// Ids of votes that reached a terminal phase, kept after cleanup.
    concluded: HashSet<String>,
    config: VoteConfig,
    max_votes: usize,
    events: EventBus,
}

impl VoteRegistry {
    pub fn new(config: VoteConfig, max_votes: usize) -> Self {
        Self {
            votes: HashMap::new(),
            concluded: HashSet::new(),
            config,
            max_votes,
            events: EventBus::new(),
        }
    }

    /// Register a listener for lifecycle events.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ConflictEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Accept a conflict report and open its vote at `height`.
    ///
    /// Duplicate reports — a vote already running or already adjudicated for
    /// the same pair — are a no-op and return the existing id.
    pub fn submit_report(
        &mut self,
        report: ConflictReport,
        eligible: Vec<(ProviderAddress, u128)>,
        height: u64,
    ) -> Result<String, ConflictError> {
        let id = report.id_hex();
        if self.votes.contains_key(&id) || self.concluded.contains(&id) {
            debug!(vote = %id, "duplicate conflict report ignored");
            return Ok(id);
        }
        if self.votes.len() >= self.max_votes {
            return Err(ConflictError::CapacityReached(self.max_votes));
        }

        let provider0 = report.first.provider.clone();
        let provider1 = report.second.provider.clone();
        let endpoint = report.endpoint.clone();

        let mut vote = ConflictVote::new(report, eligible, height, self.config);
        vote.open();
        self.votes.insert(id.clone(), vote);

        info!(vote = %id, endpoint = %endpoint, "conflict vote opened");
        self.events.emit(&ConflictEvent::DetectionReceived { vote_id: id.clone() });
        self.events.emit(&ConflictEvent::ResponseConflictDetected {
            endpoint,
            provider0,
            provider1,
        });
        Ok(id)
    }

    /// Route a voter's commitment to its vote.
    pub fn commit(
        &mut self,
        vote_id: &str,
        voter: &ProviderAddress,
        commitment: [u8; 32],
    ) -> Result<(), ConflictError> {
        let vote = self
            .votes
            .get_mut(vote_id)
            .ok_or_else(|| ConflictError::VoteNotFound(vote_id.to_string()))?;
        vote.commit(voter, commitment)?;
        self.events.emit(&ConflictEvent::GotCommit {
            vote_id: vote_id.to_string(),
            voter: voter.clone(),
        });
        Ok(())
    }

    /// Route a voter's reveal to its vote.
    ///
    /// An invalid reveal (hash mismatch, inconsistent verdict) is returned
    /// as an error for the caller's bookkeeping but leaves the vote intact —
    /// it simply never counts toward the tally.
    pub fn reveal(
        &mut self,
        vote_id: &str,
        voter: &ProviderAddress,
        nonce: u64,
        verdict: Verdict,
        data_hash: DataHash,
    ) -> Result<(), ConflictError> {
        let vote = self
            .votes
            .get_mut(vote_id)
            .ok_or_else(|| ConflictError::VoteNotFound(vote_id.to_string()))?;
        match vote.reveal(voter, nonce, verdict, data_hash) {
            Ok(()) => {
                self.events.emit(&ConflictEvent::GotReveal {
                    vote_id: vote_id.to_string(),
                    voter: voter.clone(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(vote = %vote_id, voter = %voter, error = %e, "reveal discarded");
                Err(e)
            }
        }
    }

    /// Drive every vote's window transitions for the given block height,
    /// emitting lifecycle events for each change.
    pub fn advance(&mut self, height: u64) {
        let mut emitted = Vec::new();
        for (id, vote) in &mut self.votes {
            for change in vote.advance(height) {
                match change {
                    PhaseChange::RevealOpened => {
                        emitted.push(ConflictEvent::RevealStarted { vote_id: id.clone() });
                    }
                    PhaseChange::Resolved(resolution) => {
                        self.concluded.insert(id.clone());
                        emitted.push(ConflictEvent::VoteResolved {
                            vote_id: id.clone(),
                            verdict: resolution.verdict,
                        });
                        if let Some(provider) = resolution.punished {
                            emitted.push(ConflictEvent::FraudVoterUnstaked {
                                vote_id: id.clone(),
                                provider,
                            });
                        }
                    }
                    PhaseChange::Unresolved => {
                        self.concluded.insert(id.clone());
                        emitted.push(ConflictEvent::VoteUnresolved { vote_id: id.clone() });
                    }
                }
            }
        }
        for event in &emitted {
            self.events.emit(event);
        }
    }

    /// Remove concluded votes after their outcomes have been observed.
    ///
    /// The concluded-id set is retained, so resubmitting the same report
    /// stays a no-op.
    pub fn cleanup_concluded(&mut self) -> Vec<String> {
        let done: Vec<String> = self
            .votes
            .iter()
            .filter(|(_, v)| v.phase().is_terminal())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &done {
            self.votes.remove(id);
        }
        done
    }

    pub fn vote(&self, id: &str) -> Option<&ConflictVote> {
        self.votes.get(id)
    }

    pub fn active_votes(&self) -> usize {
        self.votes.len()
    }
}
