//! Tournament data models: participants, settings, phase and the
//! caller-owned snapshot the engine operates on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::scoring::{DEFAULT_BEST_OF, Match, ParticipantId, Section};

/// Tournament format
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Single elimination
    Knockout,
    /// Double elimination with a winner bracket, loser bracket and grand final
    DoubleKnockout,
    /// Everyone plays everyone
    RoundRobin,
    /// Round-robin groups followed by a single-elimination knockout
    GroupKnockout,
    /// Swiss system, one round generated at a time
    Swiss,
}

impl TournamentFormat {
    /// Minimum participants needed to generate a bracket.
    #[must_use]
    pub const fn min_participants(self) -> usize {
        match self {
            Self::DoubleKnockout => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Knockout => "knockout",
            Self::DoubleKnockout => "double_knockout",
            Self::RoundRobin => "round_robin",
            Self::GroupKnockout => "group_knockout",
            Self::Swiss => "swiss",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "knockout" => Ok(Self::Knockout),
            "double_knockout" => Ok(Self::DoubleKnockout),
            "round_robin" => Ok(Self::RoundRobin),
            "group_knockout" => Ok(Self::GroupKnockout),
            "swiss" => Ok(Self::Swiss),
            other => Err(format!("unknown tournament format '{other}'")),
        }
    }
}

/// Kind of entrant. The engine itself only sees participant IDs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    #[default]
    Singles,
    Doubles,
    Team,
}

impl fmt::Display for ParticipantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Singles => "singles",
            Self::Doubles => "doubles",
            Self::Team => "team",
        };
        write!(f, "{repr}")
    }
}

/// A player, doubles pair or team.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Seeding value (TTR). Only read when a bracket is generated.
    #[serde(default)]
    pub ranking: i32,
    /// Club affiliation, used to keep clubmates apart in group draws.
    #[serde(default)]
    pub club: Option<String>,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>, ranking: i32) -> Self {
        Self {
            id,
            name: name.into(),
            ranking,
            club: None,
        }
    }

    /// Set the club affiliation
    #[must_use]
    pub fn with_club(mut self, club: impl Into<String>) -> Self {
        self.club = Some(club.into());
        self
    }
}

/// Tournament phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    /// No matches generated yet
    #[default]
    Setup,
    /// Group stage of a group + knockout tournament
    Group,
    /// Elimination bracket in play
    Knockout,
    /// Round-robin or Swiss rounds in play
    Rounds,
    /// Champion determined
    Finished,
}

impl fmt::Display for TournamentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Setup => "setup",
            Self::Group => "group",
            Self::Knockout => "knockout",
            Self::Rounds => "rounds",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Tournament settings
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TournamentSettings {
    pub format: TournamentFormat,
    #[serde(default)]
    pub participant_type: ParticipantType,
    /// Set wins needed to take a match.
    pub best_of: u8,
    /// Minutes a participant rests after finishing a match.
    pub break_minutes: u32,
    /// Number of tables. Zero disables table management.
    pub table_count: u32,
    /// Target group size for group + knockout.
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    /// Total Swiss rounds. Defaults to `ceil(log2 n)` when unset.
    #[serde(default)]
    pub swiss_rounds: Option<u32>,
}

const fn default_group_size() -> usize {
    4
}

impl TournamentSettings {
    /// Settings with the usual club-tournament defaults
    #[must_use]
    pub const fn new(format: TournamentFormat) -> Self {
        Self {
            format,
            participant_type: ParticipantType::Singles,
            best_of: DEFAULT_BEST_OF,
            break_minutes: 0,
            table_count: 0,
            group_size: default_group_size(),
            swiss_rounds: None,
        }
    }

    #[must_use]
    pub const fn with_best_of(mut self, best_of: u8) -> Self {
        self.best_of = best_of;
        self
    }

    #[must_use]
    pub const fn with_tables(mut self, table_count: u32, break_minutes: u32) -> Self {
        self.table_count = table_count;
        self.break_minutes = break_minutes;
        self
    }

    #[must_use]
    pub const fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    #[must_use]
    pub const fn with_swiss_rounds(mut self, rounds: u32) -> Self {
        self.swiss_rounds = Some(rounds);
        self
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), String> {
        if self.best_of == 0 {
            return Err("best_of must be at least 1".to_string());
        }

        if self.format == TournamentFormat::GroupKnockout && self.group_size < 2 {
            return Err(format!(
                "group_size must be at least 2, got {}",
                self.group_size
            ));
        }

        if self.swiss_rounds == Some(0) {
            return Err("swiss_rounds must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Full tournament snapshot. Owned by the host and passed into every engine
/// call; the engine keeps nothing between calls.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tournament {
    pub name: String,
    pub settings: TournamentSettings,
    #[serde(default)]
    pub phase: TournamentPhase,
    /// Participants in seeding order.
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl Tournament {
    pub fn new(
        name: impl Into<String>,
        settings: TournamentSettings,
        participants: Vec<Participant>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            phase: TournamentPhase::Setup,
            participants,
            matches: Vec::new(),
        }
    }

    #[must_use]
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Highest round number among main-section matches (Swiss rounds).
    #[must_use]
    pub fn current_round(&self) -> Option<u32> {
        last_main_round(&self.matches)
    }

    /// Matches of one group.
    pub fn group_matches(&self, group: i32) -> impl Iterator<Item = &Match> {
        self.matches
            .iter()
            .filter(move |m| m.section == Section::Group(group))
    }

    /// Group numbers present, ascending.
    #[must_use]
    pub fn group_numbers(&self) -> Vec<i32> {
        group_numbers(&self.matches)
    }
}

pub(crate) fn last_main_round(matches: &[Match]) -> Option<u32> {
    matches
        .iter()
        .filter(|m| m.section == Section::Main)
        .map(|m| m.round)
        .max()
}

pub(crate) fn group_numbers(matches: &[Match]) -> Vec<i32> {
    let mut groups: Vec<i32> = matches
        .iter()
        .filter_map(|m| match m.section {
            Section::Group(group) => Some(group),
            _ => None,
        })
        .collect();
    groups.sort_unstable();
    groups.dedup();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wire_names() {
        let json = serde_json::to_string(&TournamentFormat::DoubleKnockout).unwrap();
        assert_eq!(json, "\"double_knockout\"");
        let format: TournamentFormat = serde_json::from_str("\"group_knockout\"").unwrap();
        assert_eq!(format, TournamentFormat::GroupKnockout);
        assert_eq!(TournamentFormat::Swiss.to_string(), "swiss");
        assert_eq!("Round-Robin".parse(), Ok(TournamentFormat::RoundRobin));
        assert!("ladder".parse::<TournamentFormat>().is_err());
    }

    #[test]
    fn test_min_participants() {
        assert_eq!(TournamentFormat::Knockout.min_participants(), 2);
        assert_eq!(TournamentFormat::DoubleKnockout.min_participants(), 3);
        assert_eq!(TournamentFormat::RoundRobin.min_participants(), 2);
    }

    #[test]
    fn test_settings_validation() {
        assert!(TournamentSettings::new(TournamentFormat::Knockout).validate().is_ok());
        assert!(
            TournamentSettings::new(TournamentFormat::Knockout)
                .with_best_of(0)
                .validate()
                .is_err()
        );
        assert!(
            TournamentSettings::new(TournamentFormat::Knockout)
                .with_best_of(2)
                .validate()
                .is_ok()
        );
        assert!(
            TournamentSettings::new(TournamentFormat::GroupKnockout)
                .with_group_size(1)
                .validate()
                .is_err()
        );
        assert!(
            TournamentSettings::new(TournamentFormat::Swiss)
                .with_swiss_rounds(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_snapshot_defaults_on_deserialize() {
        let json = r#"{
            "name": "Club Open",
            "settings": {"format": "knockout", "best_of": 3, "break_minutes": 10, "table_count": 4},
            "participants": [{"id": 1, "name": "Ada"}]
        }"#;
        let tournament: Tournament = serde_json::from_str(json).unwrap();
        assert_eq!(tournament.phase, TournamentPhase::Setup);
        assert_eq!(tournament.settings.group_size, 4);
        assert_eq!(tournament.settings.participant_type, ParticipantType::Singles);
        assert!(tournament.matches.is_empty());
        assert_eq!(tournament.participants[0].ranking, 0);
    }
}
