//! Conflict vote state machine.
//!
//! One `ConflictVote` adjudicates one reported disagreement. The vote runs
//! network-side, driven by block heights: a commit window in which eligible
//! voters submit binding commitments, then a reveal window in which they
//! disclose their choices. A verdict whose revealed weight strictly exceeds
//! the majority threshold of the total eligible weight resolves the vote;
//! otherwise it concludes unresolved. The consumer only ever originates the
//! report — it never mutates a vote.

use crate::commit::reveal_matches;
use crate::error::ConflictError;
use crate::report::ConflictReport;
use crate::verdict::{TallyPhase, Verdict};
use relaymesh_types::{DataHash, ProviderAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Window lengths and the majority threshold, in the network's units.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VoteConfig {
    /// Blocks the commit window stays open after the report is accepted.
    pub commit_window_blocks: u64,
    /// Blocks the reveal window stays open after commits close.
    pub reveal_window_blocks: u64,
    /// Majority threshold in basis points of total eligible weight. A
    /// verdict resolves only when its revealed weight strictly exceeds this
    /// fraction.
    pub majority_bps: u128,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            commit_window_blocks: 100,
            reveal_window_blocks: 100,
            majority_bps: 5_000,
        }
    }
}

/// Per-voter progress through commit and reveal.
#[derive(Clone, Debug)]
struct VoterState {
    weight: u128,
    commitment: Option<[u8; 32]>,
    revealed: Option<Verdict>,
}

/// Outcome of a resolved vote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub verdict: Verdict,
    /// Revealed weight behind the winning verdict.
    pub tally: u128,
    pub total_eligible: u128,
    /// The provider forfeiting stake, when the verdict implicates one.
    pub punished: Option<ProviderAddress>,
}

/// A phase transition produced by [`ConflictVote::advance`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseChange {
    RevealOpened,
    Resolved(Resolution),
    Unresolved,
}

/// One reported disagreement under adjudication.
#[derive(Clone, Debug)]
pub struct ConflictVote {
    id: String,
    report: ConflictReport,
    phase: TallyPhase,
    commit_until: u64,
    reveal_until: u64,
    majority_bps: u128,
    voters: HashMap<ProviderAddress, VoterState>,
    total_eligible_weight: u128,
    resolution: Option<Resolution>,
}

impl ConflictVote {
    /// Create a vote in the `NoVote` phase.
    ///
    /// `eligible` is the voter set with stake weights, fixed for the vote's
    /// lifetime. Windows are anchored at `start_height`.
    pub fn new(
        report: ConflictReport,
        eligible: Vec<(ProviderAddress, u128)>,
        start_height: u64,
        config: VoteConfig,
    ) -> Self {
        let total_eligible_weight = eligible.iter().map(|(_, w)| w).sum();
        let voters = eligible
            .into_iter()
            .map(|(addr, weight)| {
                (
                    addr,
                    VoterState {
                        weight,
                        commitment: None,
                        revealed: None,
                    },
                )
            })
            .collect();
        let id = report.id_hex();
        Self {
            id,
            report,
            phase: TallyPhase::NoVote,
            commit_until: start_height + config.commit_window_blocks,
            reveal_until: start_height + config.commit_window_blocks + config.reveal_window_blocks,
            majority_bps: config.majority_bps,
            voters,
            total_eligible_weight,
            resolution: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn report(&self) -> &ConflictReport {
        &self.report
    }

    pub fn phase(&self) -> TallyPhase {
        self.phase
    }

    pub fn total_eligible_weight(&self) -> u128 {
        self.total_eligible_weight
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Accept the report: `NoVote → Commit`. Returns false if already open.
    pub fn open(&mut self) -> bool {
        if self.phase != TallyPhase::NoVote {
            return false;
        }
        self.phase = TallyPhase::Commit;
        true
    }

    /// Record a voter's commitment. At most one per voter, commit phase only.
    pub fn commit(
        &mut self,
        voter: &ProviderAddress,
        commitment: [u8; 32],
    ) -> Result<(), ConflictError> {
        if self.phase != TallyPhase::Commit {
            return Err(ConflictError::WrongPhase(self.phase));
        }
        let state = self
            .voters
            .get_mut(voter)
            .ok_or_else(|| ConflictError::NotEligible(voter.to_string()))?;
        if state.commitment.is_some() {
            return Err(ConflictError::AlreadyCommitted(voter.to_string()));
        }
        state.commitment = Some(commitment);
        Ok(())
    }

    /// Record a voter's reveal. Valid only when re-hashing the nonce and
    /// data hash reproduces the commitment exactly, and the claimed verdict
    /// agrees with the revealed hash. Invalid reveals are rejected without
    /// affecting the vote.
    pub fn reveal(
        &mut self,
        voter: &ProviderAddress,
        nonce: u64,
        verdict: Verdict,
        data_hash: DataHash,
    ) -> Result<(), ConflictError> {
        if self.phase != TallyPhase::Reveal {
            return Err(ConflictError::WrongPhase(self.phase));
        }
        let first_hash = self.report.first.data_hash;
        let second_hash = self.report.second.data_hash;
        let state = self
            .voters
            .get_mut(voter)
            .ok_or_else(|| ConflictError::NotEligible(voter.to_string()))?;
        let Some(commitment) = state.commitment else {
            return Err(ConflictError::NoCommitment(voter.to_string()));
        };
        if state.revealed.is_some() {
            return Err(ConflictError::AlreadyRevealed(voter.to_string()));
        }
        if !reveal_matches(nonce, &data_hash, &commitment) {
            return Err(ConflictError::RevealMismatch);
        }
        let consistent = match verdict {
            Verdict::Provider0 => data_hash == first_hash,
            Verdict::Provider1 => data_hash == second_hash,
            Verdict::NoneOfTheProviders => data_hash != first_hash && data_hash != second_hash,
        };
        if !consistent {
            return Err(ConflictError::VerdictMismatch);
        }
        state.revealed = Some(verdict);
        Ok(())
    }

    /// Drive height-based transitions. Both windows may elapse in one call
    /// (e.g. after a long gap), so this returns every change in order.
    pub fn advance(&mut self, height: u64) -> Vec<PhaseChange> {
        let mut changes = Vec::new();
        if self.phase == TallyPhase::Commit && height > self.commit_until {
            self.phase = TallyPhase::Reveal;
            changes.push(PhaseChange::RevealOpened);
        }
        if self.phase == TallyPhase::Reveal && height > self.reveal_until {
            let change = self.conclude();
            changes.push(change);
        }
        changes
    }

    /// Tally valid reveals and enter a terminal phase.
    fn conclude(&mut self) -> PhaseChange {
        let mut tally: HashMap<Verdict, u128> = HashMap::new();
        for state in self.voters.values() {
            if let Some(verdict) = state.revealed {
                *tally.entry(verdict).or_insert(0) += state.weight;
            }
        }

        let winner = tally
            .into_iter()
            .max_by(|(va, wa), (vb, wb)| {
                wa.cmp(wb).then(vb.wire_value().cmp(&va.wire_value()))
            });

        if let Some((verdict, weight)) = winner {
            if weight * 10_000 > self.total_eligible_weight * self.majority_bps {
                // The verdict names the vindicated response; the other
                // provider is the fraud and forfeits its stake.
                let punished = match verdict {
                    Verdict::Provider0 => Some(self.report.second.provider.clone()),
                    Verdict::Provider1 => Some(self.report.first.provider.clone()),
                    Verdict::NoneOfTheProviders => None,
                };
                let resolution = Resolution {
                    verdict,
                    tally: weight,
                    total_eligible: self.total_eligible_weight,
                    punished,
                };
                self.phase = TallyPhase::Resolved;
                self.resolution = Some(resolution.clone());
                return PhaseChange::Resolved(resolution);
            }
        }
        self.phase = TallyPhase::Unresolved;
        PhaseChange::Unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::commit_vote_data;
    use crate::report::ConflictKind;
    use relaymesh_types::{
        ApiInterface, BlockHash, Endpoint, FinalizationMarker, ProviderResponse, Signature,
    };

    fn addr(name: &str) -> ProviderAddress {
        ProviderAddress::new(format!("rmesh1{name}"))
    }

    fn response(name: &str, payload: &[u8]) -> ProviderResponse {
        ProviderResponse {
            provider: addr(name),
            payload: payload.to_vec(),
            data_hash: relaymesh_crypto::hash_payload(payload),
            finalized: FinalizationMarker::new(10, BlockHash::new([1u8; 32])),
            signature: Signature([0u8; 64]),
            latency_ms: 5,
        }
    }

    fn report() -> ConflictReport {
        ConflictReport::new(
            Endpoint::new("ETH1", ApiInterface::JsonRpc),
            ConflictKind::Response,
            response("p0", b"answer-a"),
            response("p1", b"answer-b"),
        )
    }

    /// Three equal-weight voters; commit window ends at 100, reveal at 200.
    fn vote() -> ConflictVote {
        let eligible = vec![(addr("v1"), 100), (addr("v2"), 100), (addr("v3"), 100)];
        let mut v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        assert!(v.open());
        v
    }

    fn commit_and_reveal_all(
        v: &mut ConflictVote,
        choices: &[(&str, Verdict)],
    ) {
        let first = v.report().first.data_hash;
        let second = v.report().second.data_hash;
        for (i, (name, verdict)) in choices.iter().enumerate() {
            let data_hash = match verdict {
                Verdict::Provider0 => first,
                Verdict::Provider1 => second,
                Verdict::NoneOfTheProviders => DataHash::new([0xEE; 32]),
            };
            let nonce = 1000 + i as u64;
            v.commit(&addr(name), commit_vote_data(nonce, &data_hash))
                .unwrap();
        }
        v.advance(101);
        for (i, (name, verdict)) in choices.iter().enumerate() {
            let data_hash = match verdict {
                Verdict::Provider0 => first,
                Verdict::Provider1 => second,
                Verdict::NoneOfTheProviders => DataHash::new([0xEE; 32]),
            };
            let nonce = 1000 + i as u64;
            v.reveal(&addr(name), nonce, *verdict, data_hash).unwrap();
        }
    }

    #[test]
    fn new_vote_starts_in_no_vote() {
        let eligible = vec![(addr("v1"), 100)];
        let v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        assert_eq!(v.phase(), TallyPhase::NoVote);
        assert_eq!(v.total_eligible_weight(), 100);
    }

    #[test]
    fn open_is_one_shot() {
        let eligible = vec![(addr("v1"), 100)];
        let mut v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        assert!(v.open());
        assert!(!v.open());
        assert_eq!(v.phase(), TallyPhase::Commit);
    }

    #[test]
    fn commit_rejected_before_open() {
        let eligible = vec![(addr("v1"), 100)];
        let mut v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        let c = commit_vote_data(1, &v.report().first.data_hash);
        assert!(matches!(
            v.commit(&addr("v1"), c),
            Err(ConflictError::WrongPhase(TallyPhase::NoVote))
        ));
    }

    #[test]
    fn ineligible_voter_rejected() {
        let mut v = vote();
        let c = commit_vote_data(1, &v.report().first.data_hash);
        assert!(matches!(
            v.commit(&addr("stranger"), c),
            Err(ConflictError::NotEligible(_))
        ));
    }

    #[test]
    fn double_commit_rejected() {
        let mut v = vote();
        let c = commit_vote_data(1, &v.report().first.data_hash);
        v.commit(&addr("v1"), c).unwrap();
        assert!(matches!(
            v.commit(&addr("v1"), c),
            Err(ConflictError::AlreadyCommitted(_))
        ));
    }

    #[test]
    fn reveal_rejected_during_commit_window() {
        let mut v = vote();
        let hash = v.report().first.data_hash;
        v.commit(&addr("v1"), commit_vote_data(1, &hash)).unwrap();
        assert!(matches!(
            v.reveal(&addr("v1"), 1, Verdict::Provider0, hash),
            Err(ConflictError::WrongPhase(TallyPhase::Commit))
        ));
    }

    #[test]
    fn reveal_without_commit_rejected() {
        let mut v = vote();
        let hash = v.report().first.data_hash;
        v.advance(101);
        assert!(matches!(
            v.reveal(&addr("v1"), 1, Verdict::Provider0, hash),
            Err(ConflictError::NoCommitment(_))
        ));
    }

    #[test]
    fn wrong_nonce_reveal_discarded() {
        let mut v = vote();
        let hash = v.report().first.data_hash;
        v.commit(&addr("v1"), commit_vote_data(42, &hash)).unwrap();
        v.advance(101);

        // Nonce 43 does not reproduce the commitment.
        assert!(matches!(
            v.reveal(&addr("v1"), 43, Verdict::Provider0, hash),
            Err(ConflictError::RevealMismatch)
        ));

        // The failed reveal never counts toward the tally.
        let changes = v.advance(201);
        assert_eq!(changes, vec![PhaseChange::Unresolved]);
    }

    #[test]
    fn verdict_inconsistent_with_hash_discarded() {
        let mut v = vote();
        let first = v.report().first.data_hash;
        v.commit(&addr("v1"), commit_vote_data(7, &first)).unwrap();
        v.advance(101);
        // Committed to provider0's hash but claims Provider1.
        assert!(matches!(
            v.reveal(&addr("v1"), 7, Verdict::Provider1, first),
            Err(ConflictError::VerdictMismatch)
        ));
    }

    #[test]
    fn majority_resolves_and_punishes() {
        let mut v = vote();
        commit_and_reveal_all(
            &mut v,
            &[
                ("v1", Verdict::Provider0),
                ("v2", Verdict::Provider0),
                ("v3", Verdict::Provider1),
            ],
        );

        let changes = v.advance(201);
        assert_eq!(changes.len(), 1);
        let PhaseChange::Resolved(resolution) = &changes[0] else {
            panic!("expected resolution, got {:?}", changes);
        };
        assert_eq!(resolution.verdict, Verdict::Provider0);
        assert_eq!(resolution.tally, 200);
        assert_eq!(resolution.total_eligible, 300);
        // The first response was vindicated, so the second provider pays.
        assert_eq!(resolution.punished, Some(addr("p1")));
        assert_eq!(v.phase(), TallyPhase::Resolved);
    }

    #[test]
    fn exactly_half_does_not_resolve() {
        // Four equal voters, 2-2 split: 200 * 10000 > 400 * 5000 is false.
        let eligible = vec![
            (addr("v1"), 100),
            (addr("v2"), 100),
            (addr("v3"), 100),
            (addr("v4"), 100),
        ];
        let mut v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        v.open();
        commit_and_reveal_all(
            &mut v,
            &[
                ("v1", Verdict::Provider0),
                ("v2", Verdict::Provider0),
                ("v3", Verdict::Provider1),
                ("v4", Verdict::Provider1),
            ],
        );

        assert_eq!(v.advance(201), vec![PhaseChange::Unresolved]);
        assert_eq!(v.phase(), TallyPhase::Unresolved);
    }

    #[test]
    fn non_revealing_committers_are_discarded() {
        // All three commit, only one reveals: 100 of 300 is no majority.
        let mut v = vote();
        let first = v.report().first.data_hash;
        for name in ["v1", "v2", "v3"] {
            v.commit(&addr(name), commit_vote_data(5, &first)).unwrap();
        }
        v.advance(101);
        v.reveal(&addr("v1"), 5, Verdict::Provider0, first).unwrap();

        assert_eq!(v.advance(201), vec![PhaseChange::Unresolved]);
    }

    #[test]
    fn weight_decides_not_headcount() {
        let eligible = vec![(addr("whale"), 1_000), (addr("v1"), 100), (addr("v2"), 100)];
        let mut v = ConflictVote::new(report(), eligible, 0, VoteConfig::default());
        v.open();
        let first = v.report().first.data_hash;
        let second = v.report().second.data_hash;

        v.commit(&addr("whale"), commit_vote_data(1, &second)).unwrap();
        v.commit(&addr("v1"), commit_vote_data(2, &first)).unwrap();
        v.commit(&addr("v2"), commit_vote_data(3, &first)).unwrap();
        v.advance(101);
        v.reveal(&addr("whale"), 1, Verdict::Provider1, second).unwrap();
        v.reveal(&addr("v1"), 2, Verdict::Provider0, first).unwrap();
        v.reveal(&addr("v2"), 3, Verdict::Provider0, first).unwrap();

        let changes = v.advance(201);
        let PhaseChange::Resolved(resolution) = &changes[0] else {
            panic!("expected resolution");
        };
        assert_eq!(resolution.verdict, Verdict::Provider1);
        assert_eq!(resolution.punished, Some(addr("p0")));
    }

    #[test]
    fn none_of_the_providers_punishes_nobody() {
        let mut v = vote();
        commit_and_reveal_all(
            &mut v,
            &[
                ("v1", Verdict::NoneOfTheProviders),
                ("v2", Verdict::NoneOfTheProviders),
                ("v3", Verdict::NoneOfTheProviders),
            ],
        );

        let changes = v.advance(201);
        let PhaseChange::Resolved(resolution) = &changes[0] else {
            panic!("expected resolution");
        };
        assert_eq!(resolution.verdict, Verdict::NoneOfTheProviders);
        assert_eq!(resolution.punished, None);
    }

    #[test]
    fn no_reveals_means_unresolved() {
        let mut v = vote();
        assert_eq!(v.advance(201), vec![PhaseChange::RevealOpened, PhaseChange::Unresolved]);
        assert_eq!(v.phase(), TallyPhase::Unresolved);
    }

    #[test]
    fn advance_is_noop_on_terminal_vote() {
        let mut v = vote();
        v.advance(201);
        assert!(v.advance(500).is_empty());
    }

    #[test]
    fn commit_window_boundary_is_inclusive() {
        let mut v = vote();
        // Height equal to the deadline keeps the window open.
        assert!(v.advance(100).is_empty());
        assert_eq!(v.phase(), TallyPhase::Commit);
        assert_eq!(v.advance(101), vec![PhaseChange::RevealOpened]);
    }
}
