//! Engine façade: runs typed commands against a caller-owned snapshot.
//!
//! Each command works on a draft built from a copy of the snapshot's
//! matches. The draft is committed back, and its deltas returned, only when
//! the command succeeds.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::commands::{Command, CommandOutcome, Delta};
use super::errors::{EngineError, EngineResult};
use super::models::{
    Tournament, TournamentFormat, TournamentPhase, group_numbers, last_main_round,
};
use crate::bracket::{
    BracketTopology, MatchArena, cross_seed, double_elimination, draw_groups, ranked, ranked_ids,
    resolve, retract, round_robin, single_elimination, swiss, swiss_opening,
};
use crate::scoring::{
    Match, MatchId, MatchKey, ParticipantId, Section, SetScore, TableNumber, evaluate_best_of,
};
use crate::standings::{self, Standing, StandingsScope, TieBreak};
use crate::table::{AllocationRejection, TableAllocator};

/// Engine-wide knobs that are not part of a tournament's own settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EngineConfig {
    /// Entrants per group that reach the knockout
    pub qualifiers_per_group: usize,
    /// Position offset per group number, keeping group positions distinct
    pub group_position_stride: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            qualifiers_per_group: 2,
            group_position_stride: 100,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.qualifiers_per_group == 0 {
            return Err("qualifiers_per_group must be at least 1".to_string());
        }
        if self.group_position_stride == 0 {
            return Err("group_position_stride must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Stateless tournament engine.
#[derive(Clone, Debug, Default)]
pub struct TournamentEngine {
    config: EngineConfig,
}

struct Draft {
    arena: MatchArena,
    phase: TournamentPhase,
    cleared: bool,
}

impl Draft {
    fn open(tournament: &Tournament) -> EngineResult<Self> {
        Ok(Self {
            arena: MatchArena::build(tournament.matches.clone())?,
            phase: tournament.phase,
            cleared: false,
        })
    }

    fn resolve(&mut self, format: TournamentFormat) {
        let topology = BracketTopology::detect(format, self.arena.matches());
        resolve(&mut self.arena, &topology);
    }

    fn insert_all(&mut self, matches: Vec<Match>) -> EngineResult<()> {
        for m in matches {
            self.arena.insert(m)?;
        }
        Ok(())
    }

    fn commit(self, tournament: &mut Tournament) -> CommandOutcome {
        let (matches, arena_deltas) = self.arena.into_parts();
        let mut deltas = Vec::with_capacity(arena_deltas.len() + 2);
        if self.cleared {
            deltas.push(Delta::MatchesCleared);
        }
        deltas.extend(arena_deltas);
        if self.phase != tournament.phase {
            info!(
                "'{}' moves from {} to {}",
                tournament.name, tournament.phase, self.phase
            );
            deltas.push(Delta::PhaseChanged { phase: self.phase });
        }
        tournament.matches = matches;
        tournament.phase = self.phase;
        CommandOutcome::new(deltas)
    }
}

impl TournamentEngine {
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `command` against `tournament`.
    ///
    /// On success the snapshot is updated in place and the deltas describing
    /// the change are returned. On failure the snapshot is left untouched.
    pub fn execute(
        &self,
        tournament: &mut Tournament,
        command: Command,
        now: DateTime<Utc>,
    ) -> EngineResult<CommandOutcome> {
        info!("{} on '{}'", command.name(), tournament.name);
        let mut draft = Draft::open(tournament)?;
        let snapshot: &Tournament = tournament;

        match command {
            Command::GenerateBracket => self.generate_bracket(snapshot, &mut draft)?,
            Command::EvaluateScore { match_id, sets } => {
                self.evaluate_score(snapshot, &mut draft, match_id, &sets, now)?;
            }
            Command::ActivateMatch { match_id, table } => {
                Self::activate_match(snapshot, &mut draft, match_id, table, now)?;
            }
            Command::AdvanceGroupToKnockout => {
                self.advance_group_to_knockout(snapshot, &mut draft)?;
            }
            Command::GenerateNextSwissRound => {
                self.generate_next_swiss_round(snapshot, &mut draft)?;
            }
            Command::AutoAssignTables => Self::auto_assign_tables(snapshot, &mut draft, now),
            Command::Reset => Self::reset(snapshot, &mut draft)?,
        }

        Ok(draft.commit(tournament))
    }

    fn generate_bracket(&self, tournament: &Tournament, draft: &mut Draft) -> EngineResult<()> {
        if tournament.phase != TournamentPhase::Setup || !draft.arena.is_empty() {
            return Err(EngineError::AlreadyGenerated);
        }
        let settings = &tournament.settings;
        settings.validate().map_err(EngineError::InvalidSettings)?;

        let format = settings.format;
        let needed = format.min_participants();
        let have = tournament.participants.len();
        if have < needed {
            return Err(EngineError::InsufficientParticipants {
                format,
                needed,
                have,
            });
        }
        let mut seen = HashSet::with_capacity(have);
        if let Some(dup) = tournament.participants.iter().find(|p| !seen.insert(p.id)) {
            return Err(EngineError::InvalidSettings(format!(
                "participant id {} appears more than once",
                dup.id
            )));
        }

        let seeds = ranked_ids(&tournament.participants);
        let (matches, phase) = match format {
            TournamentFormat::Knockout => (single_elimination(&seeds), TournamentPhase::Knockout),
            TournamentFormat::DoubleKnockout => {
                (double_elimination(&seeds), TournamentPhase::Knockout)
            }
            TournamentFormat::RoundRobin => (
                round_robin(&seeds, Section::Main, 0),
                TournamentPhase::Rounds,
            ),
            TournamentFormat::Swiss => (swiss_opening(&seeds), TournamentPhase::Rounds),
            TournamentFormat::GroupKnockout => {
                (self.group_stage(tournament)?, TournamentPhase::Group)
            }
        };

        draft.insert_all(matches)?;
        draft.resolve(format);
        draft.phase = phase;
        info!(
            "generated {} matches for {} participants ({format})",
            draft.arena.len(),
            have
        );
        Ok(())
    }

    fn group_stage(&self, tournament: &Tournament) -> EngineResult<Vec<Match>> {
        let group_size = tournament.settings.group_size;
        let groups = draw_groups(&ranked(&tournament.participants), group_size);
        if let Some(short) = groups.iter().position(|members| members.len() < 2) {
            return Err(EngineError::InvalidSettings(format!(
                "group_size {group_size} leaves group {} with a single participant",
                short + 1
            )));
        }

        let stride = self.config.group_position_stride;
        let mut matches = Vec::new();
        for (idx, members) in groups.iter().enumerate() {
            let number = idx as u32 + 1;
            debug!("group {number}: {members:?}");
            matches.extend(round_robin(
                members,
                Section::Group(number as i32),
                number * stride,
            ));
        }
        Ok(matches)
    }

    fn evaluate_score(
        &self,
        tournament: &Tournament,
        draft: &mut Draft,
        match_id: MatchId,
        sets: &[SetScore],
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let idx = draft
            .arena
            .index_of_id(match_id)
            .ok_or(EngineError::MatchNotFound(match_id))?;
        let previous = draft.arena.at(idx).clone();
        let evaluation = evaluate_best_of(&previous, sets, tournament.settings.best_of, now);
        if !draft.arena.apply_evaluation(idx, &evaluation) {
            debug!("score of match {match_id} unchanged");
            return Ok(());
        }

        let format = tournament.settings.format;
        let topology = BracketTopology::detect(format, draft.arena.matches());
        if previous.is_completed() && previous.winner != evaluation.winner {
            retract(&mut draft.arena, &topology, &previous);
        }
        resolve(&mut draft.arena, &topology);
        self.settle_phase(tournament, draft);
        Ok(())
    }

    fn activate_match(
        tournament: &Tournament,
        draft: &mut Draft,
        match_id: MatchId,
        table: Option<TableNumber>,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let idx = draft
            .arena
            .index_of_id(match_id)
            .ok_or(AllocationRejection::MatchNotFound { match_id })?;
        let allocator =
            TableAllocator::from_settings(draft.arena.matches(), &tournament.settings, now);
        let table = allocator.validate(draft.arena.at(idx), table)?;
        draft.arena.activate(idx, table);
        info!("match {match_id} started on table {table:?}");
        Ok(())
    }

    fn auto_assign_tables(tournament: &Tournament, draft: &mut Draft, now: DateTime<Utc>) {
        let assignments =
            TableAllocator::from_settings(draft.arena.matches(), &tournament.settings, now)
                .auto_assign();
        for assignment in assignments {
            if let Some(idx) = draft.arena.index_of_id(assignment.match_id) {
                draft.arena.activate(idx, Some(assignment.table));
            }
        }
    }

    fn advance_group_to_knockout(
        &self,
        tournament: &Tournament,
        draft: &mut Draft,
    ) -> EngineResult<()> {
        let format = tournament.settings.format;
        if format != TournamentFormat::GroupKnockout {
            return Err(EngineError::WrongFormat {
                expected: TournamentFormat::GroupKnockout,
                actual: format,
            });
        }
        if draft.phase != TournamentPhase::Group {
            return Err(EngineError::WrongPhase {
                expected: TournamentPhase::Group,
                actual: draft.phase,
            });
        }
        let matches = draft.arena.matches();
        let pending = matches
            .iter()
            .filter(|m| m.section.is_group() && !m.is_completed())
            .count();
        if pending > 0 {
            return Err(EngineError::GroupStageIncomplete { pending });
        }

        let seeds = ranked_ids(&tournament.participants);
        let qualifiers = self.config.qualifiers_per_group;
        let mut by_place: Vec<Vec<ParticipantId>> = vec![Vec::new(); qualifiers];
        for group in group_numbers(matches) {
            let table = standings::compute_standings(
                matches.iter().filter(|m| m.section == Section::Group(group)),
                &seeds,
                TieBreak::HeadToHead,
            );
            for (place, standing) in table.iter().take(qualifiers).enumerate() {
                by_place[place].push(standing.participant_id);
            }
        }

        let winners = by_place.first().map(Vec::as_slice).unwrap_or_default();
        let runners_up = by_place.get(1).map(Vec::as_slice).unwrap_or_default();
        let mut order = cross_seed(winners, runners_up);
        for rest in by_place.iter().skip(2) {
            order.extend(rest);
        }
        info!("{} qualifiers enter the knockout", order.len());

        draft.insert_all(single_elimination(&order))?;
        draft.resolve(format);
        draft.phase = TournamentPhase::Knockout;
        Ok(())
    }

    fn generate_next_swiss_round(
        &self,
        tournament: &Tournament,
        draft: &mut Draft,
    ) -> EngineResult<()> {
        let format = tournament.settings.format;
        if format != TournamentFormat::Swiss {
            return Err(EngineError::WrongFormat {
                expected: TournamentFormat::Swiss,
                actual: format,
            });
        }
        let limit = swiss::round_limit(
            tournament.participants.len(),
            tournament.settings.swiss_rounds,
        );
        let matches = draft.arena.matches();
        let Some(current) = last_main_round(matches) else {
            return Err(EngineError::WrongPhase {
                expected: TournamentPhase::Rounds,
                actual: draft.phase,
            });
        };
        if current + 1 >= limit {
            return Err(EngineError::AllRoundsPlayed { rounds: limit });
        }
        if matches
            .iter()
            .any(|m| m.section == Section::Main && m.round == current && !m.is_completed())
        {
            return Err(EngineError::RoundInProgress { round: current });
        }

        let seeds = ranked_ids(&tournament.participants);
        let order = swiss::order_by_wins(&seeds, matches);
        let next = swiss::pair_round(&order, matches, current + 1);
        info!("pairing swiss round {} ({} matches)", current + 1, next.len());

        draft.insert_all(next)?;
        draft.resolve(format);
        self.settle_phase(tournament, draft);
        Ok(())
    }

    fn reset(tournament: &Tournament, draft: &mut Draft) -> EngineResult<()> {
        if tournament.matches.is_empty() && tournament.phase == TournamentPhase::Setup {
            return Ok(());
        }
        draft.arena = MatchArena::build(Vec::new())?;
        draft.cleared = true;
        draft.phase = TournamentPhase::Setup;
        Ok(())
    }

    /// Move to `Finished` once a champion exists, and back if a score edit
    /// takes the title away again.
    fn settle_phase(&self, tournament: &Tournament, draft: &mut Draft) {
        let matches = draft.arena.matches();
        let decided = self
            .champion_of(tournament, draft.phase, matches)
            .is_some();
        let format = tournament.settings.format;
        if decided {
            draft.phase = TournamentPhase::Finished;
        } else if draft.phase == TournamentPhase::Finished {
            draft.phase = match format {
                TournamentFormat::RoundRobin | TournamentFormat::Swiss => TournamentPhase::Rounds,
                _ => TournamentPhase::Knockout,
            };
        }
    }

    /// Tournament winner, once decided.
    #[must_use]
    pub fn champion(&self, tournament: &Tournament) -> Option<ParticipantId> {
        self.champion_of(tournament, tournament.phase, &tournament.matches)
    }

    fn champion_of(
        &self,
        tournament: &Tournament,
        phase: TournamentPhase,
        matches: &[Match],
    ) -> Option<ParticipantId> {
        let all_done = || !matches.is_empty() && matches.iter().all(Match::is_completed);
        let leader = |tie_break| {
            let seeds = ranked_ids(&tournament.participants);
            standings::compute_standings(matches, &seeds, tie_break)
                .first()
                .map(|s| s.participant_id)
        };

        match tournament.settings.format {
            TournamentFormat::Knockout | TournamentFormat::GroupKnockout => {
                if phase == TournamentPhase::Group {
                    return None;
                }
                let round = last_main_round(matches)?;
                let key = MatchKey::new(Section::Main, round, 0);
                matches.iter().find(|m| m.key() == key)?.winner
            }
            TournamentFormat::DoubleKnockout => {
                let key = MatchKey::new(Section::GrandFinal, 0, 0);
                matches.iter().find(|m| m.key() == key)?.winner
            }
            TournamentFormat::RoundRobin => {
                if all_done() {
                    leader(TieBreak::HeadToHead)
                } else {
                    None
                }
            }
            TournamentFormat::Swiss => {
                let limit = swiss::round_limit(
                    tournament.participants.len(),
                    tournament.settings.swiss_rounds,
                );
                let played = last_main_round(matches).map_or(0, |round| round + 1);
                if played >= limit && all_done() {
                    leader(TieBreak::Buchholz)
                } else {
                    None
                }
            }
        }
    }

    /// Ranked standings for `scope`.
    #[must_use]
    pub fn compute_standings(
        &self,
        tournament: &Tournament,
        scope: StandingsScope,
    ) -> Vec<Standing> {
        let seeds = ranked_ids(&tournament.participants);
        match scope {
            StandingsScope::Group { group } => standings::compute_standings(
                tournament.group_matches(group),
                &seeds,
                TieBreak::HeadToHead,
            ),
            StandingsScope::Overall => {
                let tie_break = match tournament.settings.format {
                    TournamentFormat::Swiss => TieBreak::Buchholz,
                    _ => TieBreak::HeadToHead,
                };
                standings::compute_standings(
                    tournament.matches.iter().filter(|m| !m.section.is_group()),
                    &seeds,
                    tie_break,
                )
            }
        }
    }

    /// Replace `tournament` with a snapshot received from elsewhere (another
    /// device, or a fresh fetch from the store).
    pub fn apply_remote_snapshot(
        &self,
        tournament: &mut Tournament,
        snapshot: Tournament,
    ) -> EngineResult<()> {
        snapshot
            .settings
            .validate()
            .map_err(EngineError::InvalidSettings)?;
        MatchArena::build(snapshot.matches.clone())?;
        debug!(
            "applying remote snapshot of '{}' with {} matches",
            snapshot.name,
            snapshot.matches.len()
        );
        *tournament = snapshot;
        Ok(())
    }
}
