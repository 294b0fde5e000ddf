use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("vote {0} not found")]
    VoteNotFound(String),

    #[error("vote is in phase {0:?}, operation not allowed")]
    WrongPhase(crate::verdict::TallyPhase),

    #[error("voter {0} is not eligible for this vote")]
    NotEligible(String),

    #[error("voter {0} already committed")]
    AlreadyCommitted(String),

    #[error("voter {0} already revealed")]
    AlreadyRevealed(String),

    #[error("voter {0} has no commitment to reveal against")]
    NoCommitment(String),

    #[error("reveal does not reproduce the commitment")]
    RevealMismatch,

    #[error("revealed verdict is inconsistent with the revealed data hash")]
    VerdictMismatch,

    #[error("vote capacity reached ({0})")]
    CapacityReached(usize),

    #[error("{0}")]
    Other(String),
}
