use serde::{Deserialize, Serialize};

use crate::scoring::ParticipantId;

/// Tie-break chain applied after wins.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Head-to-head, then set and point difference
    #[default]
    HeadToHead,
    /// Buchholz, then set and point difference
    Buchholz,
}

/// Which matches a standings query covers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum StandingsScope {
    /// Everything outside the group stage
    Overall,
    /// One group of a group + knockout event
    Group { group: i32 },
}

/// Ranked line of a standings table. Derived from the match list, never
/// stored.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Standing {
    pub participant_id: ParticipantId,
    /// 1-based
    pub rank: usize,
    pub played: u32,
    pub won: u32,
    pub lost: u32,
    pub sets_won: u32,
    pub sets_lost: u32,
    pub points_won: u64,
    pub points_lost: u64,
    /// Sum of opponents' wins. Only filled for Swiss.
    pub buchholz: Option<u32>,
}

impl Standing {
    #[must_use]
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn set_difference(&self) -> i64 {
        self.sets_won as i64 - self.sets_lost as i64
    }

    #[must_use]
    pub const fn point_difference(&self) -> i128 {
        self.points_won as i128 - self.points_lost as i128
    }
}
