//! Engine error types.

use thiserror::Error;

use super::models::{TournamentFormat, TournamentPhase};
use crate::scoring::{MatchId, MatchKey};
use crate::table::AllocationRejection;

/// Engine errors
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Insufficient participants for {format}: need {needed}, have {have}")]
    InsufficientParticipants {
        format: TournamentFormat,
        needed: usize,
        have: usize,
    },

    #[error("Bracket already generated; reset the tournament first")]
    AlreadyGenerated,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Duplicate match at {0}")]
    DuplicateMatchKey(MatchKey),

    #[error("Duplicate match id {0}")]
    DuplicateMatchId(MatchId),

    #[error("Group stage incomplete: {pending} match(es) still open")]
    GroupStageIncomplete { pending: usize },

    #[error("Round {round} still in progress")]
    RoundInProgress { round: u32 },

    #[error("All {rounds} rounds have been played")]
    AllRoundsPlayed { rounds: u32 },

    #[error("Operation requires format {expected}, tournament is {actual}")]
    WrongFormat {
        expected: TournamentFormat,
        actual: TournamentFormat,
    },

    #[error("Tournament not in correct phase: expected {expected}, got {actual}")]
    WrongPhase {
        expected: TournamentPhase,
        actual: TournamentPhase,
    },

    #[error(transparent)]
    Rejected(#[from] AllocationRejection),
}

impl EngineError {
    /// Whether the error is an expected business-rule rejection (as opposed
    /// to a malformed request or snapshot).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_)
                | Self::GroupStageIncomplete { .. }
                | Self::RoundInProgress { .. }
                | Self::AllRoundsPlayed { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
