//! Typed commands accepted by the engine and the deltas it emits.
//!
//! Every mutation the engine performs is described by a [`Delta`]. Hosts
//! persist deltas (and fan them out to other clients) instead of diffing
//! whole snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::TournamentPhase;
use crate::scoring::{
    Match, MatchId, MatchStatus, ParticipantId, SetScore, Slot, TableNumber,
};

/// Commands accepted by [`TournamentEngine::execute`](super::TournamentEngine::execute)
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Build the initial match set from the tournament's participants
    GenerateBracket,
    /// Enter or correct the score sheet of a match
    EvaluateScore {
        match_id: MatchId,
        sets: Vec<SetScore>,
    },
    /// Put a ready match on a table (the lowest free one if none given)
    ActivateMatch {
        match_id: MatchId,
        #[serde(default)]
        table: Option<TableNumber>,
    },
    /// Promote the group stage into a knockout bracket
    AdvanceGroupToKnockout,
    /// Pair the next Swiss round
    GenerateNextSwissRound,
    /// Fill free tables with ready matches
    AutoAssignTables,
    /// Drop every match and return to setup
    Reset,
}

impl Command {
    /// Short name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GenerateBracket => "generate_bracket",
            Self::EvaluateScore { .. } => "evaluate_score",
            Self::ActivateMatch { .. } => "activate_match",
            Self::AdvanceGroupToKnockout => "advance_group_to_knockout",
            Self::GenerateNextSwissRound => "generate_next_swiss_round",
            Self::AutoAssignTables => "auto_assign_tables",
            Self::Reset => "reset",
        }
    }
}

/// Change to a single existing match.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchUpdate {
    /// Score sheet re-evaluated
    Scored {
        sets: Vec<SetScore>,
        status: MatchStatus,
        winner: Option<ParticipantId>,
        completed_at: Option<DateTime<Utc>>,
    },
    /// Match moved from pending to active
    Activated { table: Option<TableNumber> },
    /// Upstream winner or loser placed into a slot
    SlotFilled {
        slot: Slot,
        participant: ParticipantId,
    },
    /// Stale upstream result removed from a slot
    SlotCleared { slot: Slot },
    /// Lone participant advanced without playing
    ByeAwarded { winner: ParticipantId },
    /// Bye taken back after its lone participant or its open slot changed
    ByeRevoked,
}

impl MatchUpdate {
    /// Apply the update to `m`
    pub fn apply_to(&self, m: &mut Match) {
        match self {
            Self::Scored {
                sets,
                status,
                winner,
                completed_at,
            } => {
                m.sets.clone_from(sets);
                m.status = *status;
                m.winner = *winner;
                m.completed_at = *completed_at;
            }
            Self::Activated { table } => {
                m.status = MatchStatus::Active;
                m.table = *table;
            }
            Self::SlotFilled { slot, participant } => {
                m.set_participant(*slot, Some(*participant));
            }
            Self::SlotCleared { slot } => m.set_participant(*slot, None),
            Self::ByeAwarded { winner } => {
                m.status = MatchStatus::Completed;
                m.winner = Some(*winner);
                m.completed_at = None;
            }
            Self::ByeRevoked => {
                m.status = MatchStatus::Pending;
                m.winner = None;
            }
        }
    }
}

/// One change to the tournament snapshot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    MatchCreated {
        #[serde(rename = "match")]
        created: Match,
    },
    MatchUpdated {
        match_id: MatchId,
        update: MatchUpdate,
    },
    PhaseChanged {
        phase: TournamentPhase,
    },
    MatchesCleared,
}

impl Delta {
    /// Match the delta touches, if any
    #[must_use]
    pub const fn match_id(&self) -> Option<MatchId> {
        match self {
            Self::MatchCreated { created } => Some(created.id),
            Self::MatchUpdated { match_id, .. } => Some(*match_id),
            _ => None,
        }
    }
}

/// Deltas produced by a single command.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub deltas: Vec<Delta>,
}

impl CommandOutcome {
    #[must_use]
    pub const fn new(deltas: Vec<Delta>) -> Self {
        Self { deltas }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Matches created by the command
    pub fn created(&self) -> impl Iterator<Item = &Match> {
        self.deltas.iter().filter_map(|delta| match delta {
            Delta::MatchCreated { created } => Some(created),
            _ => None,
        })
    }

    /// Updates applied to existing matches
    pub fn updates(&self) -> impl Iterator<Item = (MatchId, &MatchUpdate)> {
        self.deltas.iter().filter_map(|delta| match delta {
            Delta::MatchUpdated { match_id, update } => Some((*match_id, update)),
            _ => None,
        })
    }
}

/// Replay `deltas` onto a match list and phase, the way a host store would.
///
/// Updates for unknown match IDs are skipped.
pub fn apply_deltas(matches: &mut Vec<Match>, phase: &mut TournamentPhase, deltas: &[Delta]) {
    for delta in deltas {
        match delta {
            Delta::MatchCreated { created } => matches.push(created.clone()),
            Delta::MatchUpdated { match_id, update } => {
                if let Some(m) = matches.iter_mut().find(|m| m.id == *match_id) {
                    update.apply_to(m);
                }
            }
            Delta::PhaseChanged { phase: next } => *phase = *next,
            Delta::MatchesCleared => matches.clear(),
        }
    }
}
