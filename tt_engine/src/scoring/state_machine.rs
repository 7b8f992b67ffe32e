//! Match state machine: turns raw set scores into set wins, a match winner
//! and a status.
//!
//! Evaluation is a pure function of the match and the entered sets. Feeding
//! the same sets twice produces the same result, so hosts may re-submit a
//! full score sheet after every rally without tracking what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::{Match, MatchStatus, ParticipantId, SetScore, Slot};

/// Points needed to take a set.
pub const SET_POINTS: u32 = 11;

/// Minimum margin a set must be won by.
pub const SET_MARGIN: u32 = 2;

/// Default number of set wins needed to take a match.
pub const DEFAULT_BEST_OF: u8 = 2;

/// Winner of a single set, if the score is decisive.
///
/// A side takes the set with at least 11 points and a lead of two or more.
/// There is no ceiling, so long deuce sets such as 15:13 are valid.
#[must_use]
pub const fn set_winner(set: &SetScore) -> Option<Slot> {
    if set.score1 >= SET_POINTS && set.score1 >= set.score2.saturating_add(SET_MARGIN) {
        Some(Slot::First)
    } else if set.score2 >= SET_POINTS && set.score2 >= set.score1.saturating_add(SET_MARGIN) {
        Some(Slot::Second)
    } else {
        None
    }
}

/// Set wins per side over `sets`.
#[must_use]
pub fn set_wins(sets: &[SetScore]) -> (u32, u32) {
    sets.iter()
        .fold((0, 0), |(first, second), set| match set_winner(set) {
            Some(Slot::First) => (first + 1, second),
            Some(Slot::Second) => (first, second + 1),
            None => (first, second),
        })
}

/// Set wins needed to take a match. `best_of` already counts winning sets.
#[must_use]
pub const fn required_wins(best_of: u8) -> u32 {
    best_of as u32
}

/// Best-of that actually applies to a match given its entered sets.
///
/// Matches declared as two winning sets that already show a side with three
/// set wins are treated as upgraded to three winning sets (typical for
/// finals that organizers lengthen on the spot). This is the only upgrade
/// rule.
#[must_use]
pub fn effective_best_of(sets: &[SetScore], declared: u8) -> u8 {
    let (first, second) = set_wins(sets);
    if declared == 2 && first.max(second) >= 3 {
        3
    } else {
        declared
    }
}

/// Whether the entered sets exceed what the declared best-of allows.
#[must_use]
pub fn is_upgraded(sets: &[SetScore], declared: u8) -> bool {
    effective_best_of(sets, declared) != declared
}

/// Result of evaluating a score sheet against a match.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Evaluation {
    pub sets: Vec<SetScore>,
    pub winner: Option<ParticipantId>,
    pub status: MatchStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// Whether applying this evaluation would alter `m`.
    #[must_use]
    pub fn changes(&self, m: &Match) -> bool {
        self.sets != m.sets
            || self.winner != m.winner
            || self.status != m.status
            || self.completed_at != m.completed_at
    }

    pub fn apply_to(&self, m: &mut Match) {
        m.sets.clone_from(&self.sets);
        m.winner = self.winner;
        m.status = self.status;
        m.completed_at = self.completed_at;
    }
}

/// Evaluate `sets` for `m`.
///
/// Sets are scanned in order; the first side to reach `required` set wins
/// takes the match. A side with an empty participant slot cannot win.
/// When no side reaches the threshold a completed match falls back to
/// `Active`; pending and active matches keep their status.
#[must_use]
pub fn evaluate(m: &Match, sets: &[SetScore], required: u32, now: DateTime<Utc>) -> Evaluation {
    let mut counts = (0u32, 0u32);
    let mut decided = None;
    for set in sets {
        match set_winner(set) {
            Some(Slot::First) => counts.0 += 1,
            Some(Slot::Second) => counts.1 += 1,
            None => continue,
        }
        if counts.0 >= required {
            decided = Some(Slot::First);
            break;
        }
        if counts.1 >= required {
            decided = Some(Slot::Second);
            break;
        }
    }

    let winner = decided.and_then(|slot| m.participant(slot));
    match winner {
        Some(winner) => {
            let completed_at = if m.is_completed() && m.winner == Some(winner) {
                m.completed_at.or(Some(now))
            } else {
                Some(now)
            };
            Evaluation {
                sets: sets.to_vec(),
                winner: Some(winner),
                status: MatchStatus::Completed,
                completed_at,
            }
        }
        None => Evaluation {
            sets: sets.to_vec(),
            winner: None,
            status: match m.status {
                MatchStatus::Completed => MatchStatus::Active,
                other => other,
            },
            completed_at: None,
        },
    }
}

/// Evaluate `sets` using the match's effective best-of.
#[must_use]
pub fn evaluate_best_of(
    m: &Match,
    sets: &[SetScore],
    declared_best_of: u8,
    now: DateTime<Utc>,
) -> Evaluation {
    let best_of = effective_best_of(sets, declared_best_of);
    evaluate(m, sets, required_wins(best_of), now)
}
