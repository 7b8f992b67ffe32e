use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a player, a doubles pair, or a team.
pub type ParticipantId = i64;

/// Match identifier. Assigned by the engine when a match is created.
pub type MatchId = i64;

/// Table number. Tables are numbered from 1.
pub type TableNumber = u32;

/// Group number sentinel for the loser bracket in the persisted layout.
pub const LOSERS_GROUP_NUMBER: i32 = -1;

/// Group number sentinel for the grand final in the persisted layout.
pub const GRAND_FINAL_GROUP_NUMBER: i32 = -2;

/// Raw point totals of one set (a "game" in table-tennis terms).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SetScore {
    pub score1: u32,
    pub score2: u32,
}

impl SetScore {
    #[must_use]
    pub const fn new(score1: u32, score2: u32) -> Self {
        Self { score1, score2 }
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.score1, self.score2)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
        };
        write!(f, "{repr}")
    }
}

/// Sub-graph a match belongs to.
///
/// Persisted as the nullable `group_number` column: `null` for the main
/// bracket, `1..` for group-stage groups, `-1` for the loser bracket and
/// `-2` for the grand final.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "Option<i32>", try_from = "Option<i32>")]
pub enum Section {
    Main,
    Group(i32),
    Losers,
    GrandFinal,
}

impl Section {
    #[must_use]
    pub const fn group_number(self) -> Option<i32> {
        match self {
            Self::Main => None,
            Self::Group(number) => Some(number),
            Self::Losers => Some(LOSERS_GROUP_NUMBER),
            Self::GrandFinal => Some(GRAND_FINAL_GROUP_NUMBER),
        }
    }

    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl From<Section> for Option<i32> {
    fn from(value: Section) -> Self {
        value.group_number()
    }
}

impl TryFrom<Option<i32>> for Section {
    type Error = String;

    fn try_from(value: Option<i32>) -> Result<Self, Self::Error> {
        match value {
            None => Ok(Self::Main),
            Some(LOSERS_GROUP_NUMBER) => Ok(Self::Losers),
            Some(GRAND_FINAL_GROUP_NUMBER) => Ok(Self::GrandFinal),
            Some(number) if number >= 0 => Ok(Self::Group(number)),
            Some(number) => Err(format!("unknown group number sentinel {number}")),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Group(number) => write!(f, "group {number}"),
            Self::Losers => write!(f, "losers"),
            Self::GrandFinal => write!(f, "grand final"),
        }
    }
}

/// Address of a match inside the bracket graph.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MatchKey {
    pub section: Section,
    pub round: u32,
    pub position: u32,
}

impl MatchKey {
    #[must_use]
    pub const fn new(section: Section, round: u32, position: u32) -> Self {
        Self {
            section,
            round,
            position,
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} r{}p{}", self.section, self.round, self.position)
    }
}

/// One of the two participant slots of a match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// Slot fed by an upstream match at `position`: even positions feed the
    /// first slot, odd positions the second.
    #[must_use]
    pub const fn by_parity(position: u32) -> Self {
        if position % 2 == 0 {
            Self::First
        } else {
            Self::Second
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::First => "participant1",
            Self::Second => "participant2",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    pub position: u32,
    #[serde(rename = "group_number")]
    pub section: Section,
    pub participant1: Option<ParticipantId>,
    pub participant2: Option<ParticipantId>,
    #[serde(default)]
    pub sets: Vec<SetScore>,
    pub winner: Option<ParticipantId>,
    #[serde(default)]
    pub status: MatchStatus,
    pub table: Option<TableNumber>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Empty `Pending` match at `key`.
    #[must_use]
    pub fn empty(id: MatchId, key: MatchKey) -> Self {
        Self {
            id,
            round: key.round,
            position: key.position,
            section: key.section,
            participant1: None,
            participant2: None,
            sets: Vec::new(),
            winner: None,
            status: MatchStatus::Pending,
            table: None,
            completed_at: None,
        }
    }

    /// Match between two seeded participants. A missing second participant
    /// makes it a bye, which is created already completed.
    #[must_use]
    pub fn seeded(
        id: MatchId,
        key: MatchKey,
        participant1: Option<ParticipantId>,
        participant2: Option<ParticipantId>,
    ) -> Self {
        let mut m = Self::empty(id, key);
        // Normalize so a lone participant always sits in the first slot.
        let (p1, p2) = match (participant1, participant2) {
            (None, Some(p)) => (Some(p), None),
            other => other,
        };
        m.participant1 = p1;
        m.participant2 = p2;
        if p1.is_some() && p2.is_none() {
            m.status = MatchStatus::Completed;
            m.winner = p1;
        }
        m
    }

    #[must_use]
    pub const fn key(&self) -> MatchKey {
        MatchKey::new(self.section, self.round, self.position)
    }

    #[must_use]
    pub const fn participant(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::First => self.participant1,
            Slot::Second => self.participant2,
        }
    }

    pub fn set_participant(&mut self, slot: Slot, participant: Option<ParticipantId>) {
        match slot {
            Slot::First => self.participant1 = participant,
            Slot::Second => self.participant2 = participant,
        }
    }

    #[must_use]
    pub fn has_participant(&self, participant: ParticipantId) -> bool {
        self.participant1 == Some(participant) || self.participant2 == Some(participant)
    }

    #[must_use]
    pub const fn has_both_participants(&self) -> bool {
        self.participant1.is_some() && self.participant2.is_some()
    }

    /// Completed with a single participant. Byes handed out by the
    /// generator always use the first slot; byes awarded later in the loser
    /// bracket may sit in either.
    #[must_use]
    pub const fn is_bye(&self) -> bool {
        self.participant1.is_some() != self.participant2.is_some()
            && matches!(self.status, MatchStatus::Completed)
    }

    /// The only participant of a one-sided match.
    #[must_use]
    pub const fn lone_participant(&self) -> Option<ParticipantId> {
        match (self.participant1, self.participant2) {
            (Some(p), None) | (None, Some(p)) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.status, MatchStatus::Completed)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, MatchStatus::Active)
    }

    /// Pending with both participants known.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.status, MatchStatus::Pending) && self.has_both_participants()
    }

    /// The participant that did not win. `None` for byes and unfinished
    /// matches.
    #[must_use]
    pub fn loser(&self) -> Option<ParticipantId> {
        let winner = self.winner?;
        let (p1, p2) = (self.participant1?, self.participant2?);
        if winner == p1 {
            Some(p2)
        } else if winner == p2 {
            Some(p1)
        } else {
            None
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |p: Option<ParticipantId>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
        write!(
            f,
            "#{} [{}] {} vs {} ({})",
            self.id,
            self.key(),
            side(self.participant1),
            side(self.participant2),
            self.status
        )
    }
}
