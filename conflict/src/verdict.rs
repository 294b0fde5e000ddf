//! Typed verdicts and tally phases.
//!
//! The legacy wire format uses one four-valued enumeration both as a voter's
//! vote content and as the tally status (`NoVote=0, Commit=1, Provider0=2,
//! Provider1=3, NoneOfTheProviders=4`). Conflating "no one has voted yet"
//! with a valid vote choice invites bugs, so the types are split: [`Verdict`]
//! is what a reveal says, [`TallyPhase`] is where the vote stands. The wire
//! values are preserved through the conversion functions below.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Legacy wire values, kept bit-compatible with the original enumeration.
pub mod wire {
    pub const NO_VOTE: u8 = 0;
    pub const COMMIT: u8 = 1;
    pub const PROVIDER_0: u8 = 2;
    pub const PROVIDER_1: u8 = 3;
    pub const NONE_OF_THE_PROVIDERS: u8 = 4;
}

/// The outcome a voter (or the resolved tally) asserts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The first response in the report is the correct one.
    Provider0,
    /// The second response in the report is the correct one.
    Provider1,
    /// Neither response matches the voter's own computation.
    NoneOfTheProviders,
}

impl Verdict {
    pub fn wire_value(&self) -> u8 {
        match self {
            Self::Provider0 => wire::PROVIDER_0,
            Self::Provider1 => wire::PROVIDER_1,
            Self::NoneOfTheProviders => wire::NONE_OF_THE_PROVIDERS,
        }
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            wire::PROVIDER_0 => Some(Self::Provider0),
            wire::PROVIDER_1 => Some(Self::Provider1),
            wire::NONE_OF_THE_PROVIDERS => Some(Self::NoneOfTheProviders),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Provider0 => "provider0",
            Self::Provider1 => "provider1",
            Self::NoneOfTheProviders => "none_of_the_providers",
        };
        f.write_str(s)
    }
}

/// Lifecycle phase of a conflict vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TallyPhase {
    /// Report not yet accepted by the network.
    NoVote,
    /// Commit window open: voters submit commitments.
    Commit,
    /// Reveal window open: committed voters disclose their choices.
    Reveal,
    /// Terminal: a verdict reached the majority threshold.
    Resolved,
    /// Terminal: the reveal window closed without a majority.
    Unresolved,
}

impl TallyPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(Verdict::Provider0.wire_value(), 2);
        assert_eq!(Verdict::Provider1.wire_value(), 3);
        assert_eq!(Verdict::NoneOfTheProviders.wire_value(), 4);
    }

    #[test]
    fn wire_roundtrip() {
        for v in [
            Verdict::Provider0,
            Verdict::Provider1,
            Verdict::NoneOfTheProviders,
        ] {
            assert_eq!(Verdict::from_wire(v.wire_value()), Some(v));
        }
    }

    #[test]
    fn status_values_are_not_verdicts() {
        assert_eq!(Verdict::from_wire(wire::NO_VOTE), None);
        assert_eq!(Verdict::from_wire(wire::COMMIT), None);
        assert_eq!(Verdict::from_wire(99), None);
    }

    #[test]
    fn terminal_phases() {
        assert!(TallyPhase::Resolved.is_terminal());
        assert!(TallyPhase::Unresolved.is_terminal());
        assert!(!TallyPhase::Commit.is_terminal());
        assert!(!TallyPhase::Reveal.is_terminal());
        assert!(!TallyPhase::NoVote.is_terminal());
    }
}
