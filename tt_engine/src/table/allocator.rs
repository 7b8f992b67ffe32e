//! Table allocation under exclusivity and rest-period rules.
//!
//! A ready match may go on table `t` only if no active match holds `t`,
//! neither participant is in an active match, and neither finished a match
//! less than the break period ago. The allocator reads everything from the
//! match list it is given and keeps nothing between calls.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use super::errors::{AllocationRejection, AllocationResult};
use crate::scoring::{Match, MatchId, ParticipantId, TableNumber};
use crate::tournament::TournamentSettings;

/// Table handed to a match by auto-assignment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Assignment {
    pub match_id: MatchId,
    pub table: TableNumber,
}

#[derive(Clone, Copy, Debug)]
pub struct TableAllocator<'a> {
    matches: &'a [Match],
    table_count: u32,
    break_period: Duration,
    now: DateTime<Utc>,
}

impl<'a> TableAllocator<'a> {
    #[must_use]
    pub fn new(
        matches: &'a [Match],
        table_count: u32,
        break_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            matches,
            table_count,
            break_period: Duration::minutes(i64::from(break_minutes)),
            now,
        }
    }

    #[must_use]
    pub fn from_settings(
        matches: &'a [Match],
        settings: &TournamentSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(matches, settings.table_count, settings.break_minutes, now)
    }

    /// Table management is off when the event has no tables.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.table_count > 0
    }

    fn active(&self) -> impl Iterator<Item = &'a Match> {
        self.matches.iter().filter(|m| m.is_active())
    }

    /// Free tables, lowest first.
    #[must_use]
    pub fn free_tables(&self) -> Vec<TableNumber> {
        let occupied: HashSet<TableNumber> = self.active().filter_map(|m| m.table).collect();
        (1..=self.table_count)
            .filter(|t| !occupied.contains(t))
            .collect()
    }

    pub fn check_table(&self, table: TableNumber) -> AllocationResult<()> {
        if table == 0 || table > self.table_count {
            return Err(AllocationRejection::TableOutOfRange {
                table,
                table_count: self.table_count,
            });
        }
        if self.active().any(|m| m.table == Some(table)) {
            return Err(AllocationRejection::TableOccupied { table });
        }
        Ok(())
    }

    /// Whether `participant` may start a match now.
    pub fn check_participant(&self, participant: ParticipantId) -> AllocationResult<()> {
        if self.active().any(|m| m.has_participant(participant)) {
            return Err(AllocationRejection::PlayerInPlay { participant });
        }

        let last_finished = self
            .matches
            .iter()
            .filter(|m| m.is_completed() && m.has_participant(participant))
            .filter_map(|m| m.completed_at)
            .max();
        if let Some(finished) = last_finished {
            let remaining = finished + self.break_period - self.now;
            if remaining > Duration::zero() {
                return Err(AllocationRejection::PlayerResting {
                    participant,
                    remaining_minutes: ceil_minutes(remaining),
                });
            }
        }
        Ok(())
    }

    /// Validate putting `m` on `table`, or on the lowest free table when
    /// none is requested. Returns the table to use; `None` when table
    /// management is off.
    pub fn validate(
        &self,
        m: &Match,
        table: Option<TableNumber>,
    ) -> AllocationResult<Option<TableNumber>> {
        if !m.is_ready() {
            return Err(AllocationRejection::MatchNotReady { match_id: m.id });
        }

        let table = match (self.is_enabled(), table) {
            (false, None) => None,
            (_, Some(table)) => {
                self.check_table(table)?;
                Some(table)
            }
            (true, None) => Some(
                self.free_tables()
                    .first()
                    .copied()
                    .ok_or(AllocationRejection::NoTableAvailable)?,
            ),
        };

        for participant in [m.participant1, m.participant2].into_iter().flatten() {
            self.check_participant(participant)?;
        }
        Ok(table)
    }

    /// Fill free tables with ready matches in list order.
    ///
    /// Matches with an unavailable participant are skipped, as are matches
    /// sharing a participant with one already placed in this batch.
    #[must_use]
    pub fn auto_assign(&self) -> Vec<Assignment> {
        let mut tables = self.free_tables().into_iter();
        let mut claimed: HashSet<ParticipantId> = HashSet::new();
        let mut assignments = Vec::new();

        for m in self.matches.iter().filter(|m| m.is_ready()) {
            if tables.len() == 0 {
                break;
            }
            let participants: Vec<ParticipantId> =
                [m.participant1, m.participant2].into_iter().flatten().collect();
            let available = participants
                .iter()
                .all(|&p| !claimed.contains(&p) && self.check_participant(p).is_ok());
            if !available {
                debug!("skipping match {}: participant unavailable", m.id);
                continue;
            }
            if let Some(table) = tables.next() {
                claimed.extend(participants);
                assignments.push(Assignment {
                    match_id: m.id,
                    table,
                });
            }
        }
        assignments
    }
}

/// Whole minutes, rounded up.
fn ceil_minutes(duration: Duration) -> i64 {
    let millis = duration.num_milliseconds();
    (millis + 59_999).div_euclid(60_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{MatchKey, MatchStatus, Section};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 20, hour, minute, 0).unwrap()
    }

    fn ready(position: u32, p1: i64, p2: i64) -> Match {
        let mut m = Match::seeded(0, MatchKey::new(Section::Main, 0, position), Some(p1), Some(p2));
        m.id = i64::from(position) + 1;
        m
    }

    fn active(position: u32, p1: i64, p2: i64, table: u32) -> Match {
        let mut m = ready(position, p1, p2);
        m.status = MatchStatus::Active;
        m.table = Some(table);
        m
    }

    fn finished(position: u32, p1: i64, p2: i64, when: DateTime<Utc>) -> Match {
        let mut m = ready(position, p1, p2);
        m.status = MatchStatus::Completed;
        m.winner = Some(p1);
        m.completed_at = Some(when);
        m
    }

    #[test]
    fn test_occupied_table_rejected() {
        let matches = vec![active(0, 1, 2, 1), ready(1, 3, 4)];
        let allocator = TableAllocator::new(&matches, 2, 0, at(10, 0));
        assert_eq!(
            allocator.validate(&matches[1], Some(1)),
            Err(AllocationRejection::TableOccupied { table: 1 })
        );
        assert_eq!(allocator.validate(&matches[1], None), Ok(Some(2)));
        assert_eq!(
            allocator.validate(&matches[1], Some(3)),
            Err(AllocationRejection::TableOutOfRange {
                table: 3,
                table_count: 2
            })
        );
    }

    #[test]
    fn test_player_in_play_rejected() {
        let matches = vec![active(0, 1, 2, 1), ready(1, 2, 3)];
        let allocator = TableAllocator::new(&matches, 2, 0, at(10, 0));
        assert_eq!(
            allocator.validate(&matches[1], Some(2)),
            Err(AllocationRejection::PlayerInPlay { participant: 2 })
        );
    }

    #[test]
    fn test_rest_period_boundary() {
        let finished_at = at(10, 0);
        let matches = vec![finished(0, 1, 2, finished_at), ready(1, 1, 3)];

        let allocator = TableAllocator::new(&matches, 2, 10, at(10, 4));
        assert_eq!(
            allocator.validate(&matches[1], None),
            Err(AllocationRejection::PlayerResting {
                participant: 1,
                remaining_minutes: 6
            })
        );

        let allocator =
            TableAllocator::new(&matches, 2, 10, finished_at + Duration::seconds(9 * 60 + 30));
        assert_eq!(
            allocator.check_participant(1),
            Err(AllocationRejection::PlayerResting {
                participant: 1,
                remaining_minutes: 1
            })
        );

        let allocator = TableAllocator::new(&matches, 2, 10, at(10, 10));
        assert_eq!(allocator.validate(&matches[1], None), Ok(Some(1)));
    }

    #[test]
    fn test_bye_never_triggers_rest() {
        let mut bye = Match::seeded(0, MatchKey::new(Section::Main, 0, 0), Some(1), None);
        bye.id = 9;
        let matches = vec![bye, ready(1, 1, 2)];
        let allocator = TableAllocator::new(&matches, 1, 30, at(10, 0));
        assert_eq!(allocator.validate(&matches[1], None), Ok(Some(1)));
    }

    #[test]
    fn test_not_ready_and_full_house() {
        let pending = Match::empty(5, MatchKey::new(Section::Main, 1, 0));
        let matches = vec![active(0, 1, 2, 1), ready(1, 3, 4), pending];
        let allocator = TableAllocator::new(&matches, 1, 0, at(10, 0));
        assert_eq!(
            allocator.validate(&matches[2], None),
            Err(AllocationRejection::MatchNotReady { match_id: 5 })
        );
        assert_eq!(
            allocator.validate(&matches[1], None),
            Err(AllocationRejection::NoTableAvailable)
        );
    }

    #[test]
    fn test_tables_disabled() {
        let matches = vec![ready(0, 1, 2)];
        let allocator = TableAllocator::new(&matches, 0, 0, at(10, 0));
        assert!(!allocator.is_enabled());
        assert_eq!(allocator.validate(&matches[0], None), Ok(None));
        assert!(allocator.auto_assign().is_empty());
    }

    #[test]
    fn test_auto_assign_respects_batch_claims() {
        let matches = vec![
            active(0, 9, 10, 2),
            ready(1, 1, 2),
            ready(2, 2, 3),
            ready(3, 4, 5),
            ready(4, 6, 7),
            finished(5, 8, 11, at(9, 55)),
            ready(6, 8, 12),
        ];
        let allocator = TableAllocator::new(&matches, 5, 10, at(10, 0));
        let assignments = allocator.auto_assign();
        assert_eq!(
            assignments,
            vec![
                Assignment {
                    match_id: 2,
                    table: 1
                },
                Assignment {
                    match_id: 4,
                    table: 3
                },
                Assignment {
                    match_id: 5,
                    table: 4
                },
            ]
        );
    }
}
