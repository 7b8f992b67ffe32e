//! Match arena: owns the match list of one command and indexes it by
//! `(section, round, position)` and by ID.
//!
//! All mutations go through the arena so each one is recorded as a
//! [`Delta`]. Commands work on an arena built from a copy of the snapshot's
//! matches and only commit it back once they succeed, so a failed command
//! leaves the snapshot untouched.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::scoring::{
    Evaluation, Match, MatchId, MatchKey, MatchStatus, ParticipantId, Slot, TableNumber,
};
use crate::tournament::{Delta, EngineError, EngineResult, MatchUpdate};

#[derive(Debug)]
pub struct MatchArena {
    matches: Vec<Match>,
    by_key: HashMap<MatchKey, usize>,
    by_id: HashMap<MatchId, usize>,
    next_id: MatchId,
    deltas: Vec<Delta>,
}

impl MatchArena {
    /// Index `matches`. Fails if two matches share a key or an ID.
    pub fn build(matches: Vec<Match>) -> EngineResult<Self> {
        let mut by_key = HashMap::with_capacity(matches.len());
        let mut by_id = HashMap::with_capacity(matches.len());
        for (idx, m) in matches.iter().enumerate() {
            if by_key.insert(m.key(), idx).is_some() {
                return Err(EngineError::DuplicateMatchKey(m.key()));
            }
            by_id.insert(m.id, idx);
        }
        if by_id.len() != matches.len() {
            let mut seen = HashSet::with_capacity(matches.len());
            let duplicate = matches.iter().find(|m| !seen.insert(m.id)).map(|m| m.id);
            return Err(EngineError::DuplicateMatchId(duplicate.unwrap_or_default()));
        }
        let next_id = matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;

        Ok(Self {
            matches,
            by_key,
            by_id,
            next_id,
            deltas: Vec::new(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[must_use]
    pub fn at(&self, idx: usize) -> &Match {
        &self.matches[idx]
    }

    #[must_use]
    pub fn index_of(&self, key: MatchKey) -> Option<usize> {
        self.by_key.get(&key).copied()
    }

    #[must_use]
    pub fn index_of_id(&self, id: MatchId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, key: MatchKey) -> Option<&Match> {
        self.index_of(key).map(|idx| &self.matches[idx])
    }

    /// Add a freshly generated match, assigning it the next free ID.
    pub fn insert(&mut self, mut m: Match) -> EngineResult<usize> {
        let key = m.key();
        if self.by_key.contains_key(&key) {
            return Err(EngineError::DuplicateMatchKey(key));
        }
        m.id = self.next_id;
        self.next_id += 1;

        let idx = self.matches.len();
        self.by_key.insert(key, idx);
        self.by_id.insert(m.id, idx);
        self.deltas.push(Delta::MatchCreated { created: m.clone() });
        self.matches.push(m);
        Ok(idx)
    }

    /// Put `participant` into `slot`. Returns whether anything changed.
    pub fn fill_slot(&mut self, idx: usize, slot: Slot, participant: ParticipantId) -> bool {
        let m = &mut self.matches[idx];
        if m.participant(slot) == Some(participant) {
            return false;
        }
        m.set_participant(slot, Some(participant));
        debug!("placed {participant} into {slot} of {}", m.key());
        self.record(idx, MatchUpdate::SlotFilled { slot, participant });
        true
    }

    pub fn clear_slot(&mut self, idx: usize, slot: Slot) -> bool {
        let m = &mut self.matches[idx];
        if m.participant(slot).is_none() {
            return false;
        }
        m.set_participant(slot, None);
        debug!("cleared {slot} of {}", m.key());
        self.record(idx, MatchUpdate::SlotCleared { slot });
        true
    }

    /// Complete a one-sided pending match in favour of its lone participant.
    pub fn award_bye(&mut self, idx: usize) -> bool {
        let m = &mut self.matches[idx];
        let Some(winner) = m.lone_participant() else {
            return false;
        };
        if m.status != MatchStatus::Pending {
            return false;
        }
        m.status = MatchStatus::Completed;
        m.winner = Some(winner);
        m.completed_at = None;
        debug!("bye for {winner} at {}", m.key());
        self.record(idx, MatchUpdate::ByeAwarded { winner });
        true
    }

    /// Reopen a bye the engine awarded, returning the match as it was.
    ///
    /// Byes entered through a score sheet are left alone.
    pub fn revoke_bye(&mut self, idx: usize) -> Option<Match> {
        let m = &mut self.matches[idx];
        if !m.is_bye() || !m.sets.is_empty() {
            return None;
        }
        let previous = m.clone();
        m.status = MatchStatus::Pending;
        m.winner = None;
        debug!("bye at {} reopened", m.key());
        self.record(idx, MatchUpdate::ByeRevoked);
        Some(previous)
    }

    pub fn apply_evaluation(&mut self, idx: usize, evaluation: &Evaluation) -> bool {
        if !evaluation.changes(&self.matches[idx]) {
            return false;
        }
        evaluation.apply_to(&mut self.matches[idx]);
        self.record(
            idx,
            MatchUpdate::Scored {
                sets: evaluation.sets.clone(),
                status: evaluation.status,
                winner: evaluation.winner,
                completed_at: evaluation.completed_at,
            },
        );
        true
    }

    pub fn activate(&mut self, idx: usize, table: Option<TableNumber>) {
        let m = &mut self.matches[idx];
        m.status = MatchStatus::Active;
        m.table = table;
        self.record(idx, MatchUpdate::Activated { table });
    }

    fn record(&mut self, idx: usize, update: MatchUpdate) {
        let match_id = self.matches[idx].id;
        self.deltas.push(Delta::MatchUpdated { match_id, update });
    }

    /// Hand back the matches and the deltas recorded since the arena was
    /// built. Updates to matches created in the same batch are folded into
    /// their creation delta.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Match>, Vec<Delta>) {
        let created: HashSet<MatchId> = self
            .deltas
            .iter()
            .filter_map(|delta| match delta {
                Delta::MatchCreated { created } => Some(created.id),
                _ => None,
            })
            .collect();

        let deltas = self
            .deltas
            .into_iter()
            .filter_map(|delta| match delta {
                Delta::MatchCreated { created } => {
                    let idx = self.by_id[&created.id];
                    Some(Delta::MatchCreated {
                        created: self.matches[idx].clone(),
                    })
                }
                Delta::MatchUpdated { match_id, .. } if created.contains(&match_id) => None,
                other => Some(other),
            })
            .collect();

        (self.matches, deltas)
    }
}
