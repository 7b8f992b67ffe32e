//! Host persistence seam.
//!
//! The engine never does I/O. Hosts persist the deltas of each command
//! through a [`TournamentStore`]; [`MemoryStore`] keeps everything in
//! process and backs tests and the command-line host.

use log::debug;
use thiserror::Error;

use super::commands::{CommandOutcome, Delta, MatchUpdate};
use super::models::{Tournament, TournamentPhase};
use crate::scoring::{Match, MatchId};

/// Store errors
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Match {0} already stored")]
    DuplicateMatch(MatchId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations a host offers the engine's output.
pub trait TournamentStore {
    /// Insert newly generated matches
    fn create_matches(&mut self, matches: &[Match]) -> StoreResult<()>;

    /// Apply one update to a stored match
    fn update_match(&mut self, match_id: MatchId, update: &MatchUpdate) -> StoreResult<()>;

    /// Apply several updates, in order
    fn update_multiple_matches(&mut self, updates: &[(MatchId, MatchUpdate)]) -> StoreResult<()> {
        for (match_id, update) in updates {
            self.update_match(*match_id, update)?;
        }
        Ok(())
    }

    /// Record a phase transition
    fn set_phase(&mut self, phase: TournamentPhase) -> StoreResult<()>;

    /// Drop every match of the tournament
    fn clear_matches(&mut self) -> StoreResult<()>;

    /// Load the current snapshot
    fn fetch_tournament(&self) -> StoreResult<Tournament>;

    /// Persist every delta of `outcome`, batching consecutive updates.
    fn persist(&mut self, outcome: &CommandOutcome) -> StoreResult<()> {
        let mut created: Vec<Match> = Vec::new();
        let mut updates: Vec<(MatchId, MatchUpdate)> = Vec::new();

        for delta in &outcome.deltas {
            if !matches!(delta, Delta::MatchCreated { .. }) && !created.is_empty() {
                self.create_matches(&created)?;
                created.clear();
            }
            if !matches!(delta, Delta::MatchUpdated { .. }) && !updates.is_empty() {
                self.update_multiple_matches(&updates)?;
                updates.clear();
            }
            match delta {
                Delta::MatchCreated { created: m } => created.push(m.clone()),
                Delta::MatchUpdated { match_id, update } => {
                    updates.push((*match_id, update.clone()));
                }
                Delta::PhaseChanged { phase } => self.set_phase(*phase)?,
                Delta::MatchesCleared => self.clear_matches()?,
            }
        }
        if !created.is_empty() {
            self.create_matches(&created)?;
        }
        if !updates.is_empty() {
            self.update_multiple_matches(&updates)?;
        }
        Ok(())
    }
}

/// In-process store holding a single tournament.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    tournament: Tournament,
}

impl MemoryStore {
    #[must_use]
    pub const fn new(tournament: Tournament) -> Self {
        Self { tournament }
    }

    #[must_use]
    pub fn into_inner(self) -> Tournament {
        self.tournament
    }
}

impl TournamentStore for MemoryStore {
    fn create_matches(&mut self, matches: &[Match]) -> StoreResult<()> {
        for m in matches {
            if self.tournament.matches.iter().any(|stored| stored.id == m.id) {
                return Err(StoreError::DuplicateMatch(m.id));
            }
        }
        debug!("storing {} new matches", matches.len());
        self.tournament.matches.extend_from_slice(matches);
        Ok(())
    }

    fn update_match(&mut self, match_id: MatchId, update: &MatchUpdate) -> StoreResult<()> {
        let stored = self
            .tournament
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(StoreError::MatchNotFound(match_id))?;
        update.apply_to(stored);
        Ok(())
    }

    fn set_phase(&mut self, phase: TournamentPhase) -> StoreResult<()> {
        self.tournament.phase = phase;
        Ok(())
    }

    fn clear_matches(&mut self) -> StoreResult<()> {
        self.tournament.matches.clear();
        Ok(())
    }

    fn fetch_tournament(&self) -> StoreResult<Tournament> {
        Ok(self.tournament.clone())
    }
}
