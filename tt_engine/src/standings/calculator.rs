//! Standings aggregation and tie-break ordering.
//!
//! Standings are a pure function of the matches passed in. Only completed
//! matches between two participants with at least one set entered are
//! counted, so byes and walkovers never move a table.

use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};

use crate::scoring::{Match, ParticipantId, Slot, set_winner};

use super::models::{Standing, TieBreak};

/// Ranked standings over `matches`.
///
/// Every participant appearing in `matches` is listed, including those who
/// have not finished a match yet. `seeding` gives the final tie-break;
/// participants missing from it rank after seeded ones, in order of
/// appearance.
#[must_use]
pub fn compute_standings<'a>(
    matches: impl IntoIterator<Item = &'a Match>,
    seeding: &[ParticipantId],
    tie_break: TieBreak,
) -> Vec<Standing> {
    let matches: Vec<&Match> = matches.into_iter().collect();
    let counted: Vec<&Match> = matches.iter().copied().filter(|m| counts(m)).collect();

    let mut table = Table::listing(&matches, seeding);
    for m in &counted {
        table.record(m);
    }
    if tie_break == TieBreak::Buchholz {
        table.fill_buchholz(&counted);
    }

    let mut rows = table.rows;
    match tie_break {
        TieBreak::Buchholz => rows.sort_by_key(|s| {
            (
                Reverse(s.won),
                Reverse(s.buchholz.unwrap_or(0)),
                Reverse(s.set_difference()),
                Reverse(s.point_difference()),
            )
        }),
        TieBreak::HeadToHead => order_head_to_head(&mut rows, &counted),
    }

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| Standing {
            rank: idx + 1,
            ..row
        })
        .collect()
}

fn counts(m: &Match) -> bool {
    m.is_completed() && m.has_both_participants() && m.winner.is_some() && !m.sets.is_empty()
}

struct Table {
    /// Kept in seeding order so stable sorts fall back to it.
    rows: Vec<Standing>,
    index: HashMap<ParticipantId, usize>,
}

impl Table {
    fn listing(matches: &[&Match], seeding: &[ParticipantId]) -> Self {
        let mut appearing = Vec::new();
        let mut seen = HashSet::new();
        for m in matches {
            for p in [m.participant1, m.participant2].into_iter().flatten() {
                if seen.insert(p) {
                    appearing.push(p);
                }
            }
        }

        let seed_rank: HashMap<ParticipantId, usize> =
            seeding.iter().enumerate().map(|(idx, &p)| (p, idx)).collect();
        // Stable, so unseeded participants keep appearance order.
        appearing.sort_by_key(|p| seed_rank.get(p).copied().unwrap_or(usize::MAX));

        let index = appearing
            .iter()
            .enumerate()
            .map(|(idx, &p)| (p, idx))
            .collect();
        let rows = appearing.into_iter().map(Standing::new).collect();
        Self { rows, index }
    }

    fn get_mut(&mut self, participant: Option<ParticipantId>) -> Option<&mut Standing> {
        let idx = *self.index.get(&participant?)?;
        Some(&mut self.rows[idx])
    }

    fn record(&mut self, m: &Match) {
        let sides = [(Slot::First, m.participant1), (Slot::Second, m.participant2)];
        for (slot, participant) in sides {
            let Some(standing) = self.get_mut(participant) else {
                continue;
            };
            standing.played += 1;
            if m.winner == participant {
                standing.won += 1;
            } else {
                standing.lost += 1;
            }
            for set in &m.sets {
                let (own, other) = match slot {
                    Slot::First => (set.score1, set.score2),
                    Slot::Second => (set.score2, set.score1),
                };
                // Set scores are unbounded, so totals saturate.
                standing.points_won = standing.points_won.saturating_add(u64::from(own));
                standing.points_lost = standing.points_lost.saturating_add(u64::from(other));
                match set_winner(set) {
                    Some(side) if side == slot => standing.sets_won += 1,
                    Some(_) => standing.sets_lost += 1,
                    None => {}
                }
            }
        }
    }

    fn fill_buchholz(&mut self, counted: &[&Match]) {
        let won: HashMap<ParticipantId, u32> = self
            .rows
            .iter()
            .map(|row| (row.participant_id, row.won))
            .collect();
        for row in &mut self.rows {
            row.buchholz = Some(0);
        }
        for m in counted {
            let (Some(p1), Some(p2)) = (m.participant1, m.participant2) else {
                continue;
            };
            let opponent_wins = [(p1, won.get(&p2)), (p2, won.get(&p1))];
            for (participant, wins) in opponent_wins {
                if let (Some(standing), Some(wins)) = (self.get_mut(Some(participant)), wins) {
                    standing.buchholz = Some(standing.buchholz.unwrap_or(0) + wins);
                }
            }
        }
    }
}

/// Wins first, then head-to-head within each block of equal wins.
///
/// A block of two is split by their meeting if they met exactly once. A
/// larger block is ordered by wins against the other block members. Set
/// and point difference follow, then seeding order.
fn order_head_to_head(rows: &mut [Standing], counted: &[&Match]) {
    rows.sort_by_key(|row| Reverse(row.won));

    let mut start = 0;
    while start < rows.len() {
        let won = rows[start].won;
        let end = rows[start..]
            .iter()
            .position(|row| row.won != won)
            .map_or(rows.len(), |offset| start + offset);
        let block = &mut rows[start..end];
        match block.len() {
            0 | 1 => {}
            2 => {
                let (a, b) = (&block[0], &block[1]);
                let order = pair_meeting(a.participant_id, b.participant_id, counted)
                    .unwrap_or_else(|| by_differences(a, b));
                if order == Ordering::Greater {
                    block.swap(0, 1);
                }
            }
            _ => {
                let members: HashSet<ParticipantId> =
                    block.iter().map(|row| row.participant_id).collect();
                let mini = mini_table_wins(&members, counted);
                block.sort_by(|a, b| {
                    let mini_a = mini.get(&a.participant_id).copied().unwrap_or(0);
                    let mini_b = mini.get(&b.participant_id).copied().unwrap_or(0);
                    mini_b.cmp(&mini_a).then_with(|| by_differences(a, b))
                });
            }
        }
        start = end;
    }
}

/// `Less` if `a` won their only meeting, `Greater` if `b` did.
fn pair_meeting(a: ParticipantId, b: ParticipantId, counted: &[&Match]) -> Option<Ordering> {
    let mut meetings = counted
        .iter()
        .filter(|m| m.has_participant(a) && m.has_participant(b));
    let only = meetings.next()?;
    if meetings.next().is_some() {
        return None;
    }
    match only.winner {
        Some(winner) if winner == a => Some(Ordering::Less),
        Some(winner) if winner == b => Some(Ordering::Greater),
        _ => None,
    }
}

fn mini_table_wins(
    members: &HashSet<ParticipantId>,
    counted: &[&Match],
) -> HashMap<ParticipantId, u32> {
    let mut wins = HashMap::new();
    for m in counted {
        let (Some(p1), Some(p2), Some(winner)) = (m.participant1, m.participant2, m.winner) else {
            continue;
        };
        if members.contains(&p1) && members.contains(&p2) {
            *wins.entry(winner).or_default() += 1;
        }
    }
    wins
}

fn by_differences(a: &Standing, b: &Standing) -> Ordering {
    b.set_difference()
        .cmp(&a.set_difference())
        .then_with(|| b.point_difference().cmp(&a.point_difference()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{MatchKey, MatchStatus, Section, SetScore};

    fn result(position: u32, p1: i64, p2: i64, sets: &[(u32, u32)]) -> Match {
        let mut m = Match::seeded(0, MatchKey::new(Section::Main, 0, position), Some(p1), Some(p2));
        m.sets = sets.iter().map(|&(a, b)| SetScore::new(a, b)).collect();
        let (first, second) = crate::scoring::set_wins(&m.sets);
        m.winner = Some(if first > second { p1 } else { p2 });
        m.status = MatchStatus::Completed;
        m
    }

    fn order(standings: &[Standing]) -> Vec<i64> {
        standings.iter().map(|s| s.participant_id).collect()
    }

    #[test]
    fn test_aggregation() {
        let matches = vec![result(0, 1, 2, &[(11, 7), (9, 11), (11, 5)])];
        let standings = compute_standings(&matches, &[1, 2], TieBreak::HeadToHead);
        let first = &standings[0];
        assert_eq!(first.participant_id, 1);
        assert_eq!(first.rank, 1);
        assert_eq!((first.played, first.won, first.lost), (1, 1, 0));
        assert_eq!((first.sets_won, first.sets_lost), (2, 1));
        assert_eq!((first.points_won, first.points_lost), (31, 23));
        assert_eq!(first.buchholz, None);

        let second = &standings[1];
        assert_eq!((second.sets_won, second.sets_lost), (1, 2));
        assert_eq!((second.points_won, second.points_lost), (23, 31));
    }

    #[test]
    fn test_huge_set_scores_do_not_overflow() {
        let marathon = result(0, 1, 2, &[(3_000_000_000, 0), (3_000_000_000, 0)]);
        let standings = compute_standings(&[marathon], &[1, 2], TieBreak::HeadToHead);
        assert_eq!(standings[0].participant_id, 1);
        assert_eq!(standings[0].points_won, 6_000_000_000);
        assert_eq!(standings[1].points_lost, 6_000_000_000);
        assert_eq!(standings[0].point_difference(), 6_000_000_000);
    }

    #[test]
    fn test_unfinished_and_byes_are_listed_but_not_counted() {
        let pending = Match::seeded(0, MatchKey::new(Section::Main, 0, 0), Some(3), Some(4));
        let bye = Match::seeded(0, MatchKey::new(Section::Main, 0, 1), Some(5), None);
        let standings = compute_standings([&pending, &bye], &[5, 4, 3], TieBreak::HeadToHead);
        assert_eq!(order(&standings), vec![5, 4, 3]);
        assert!(standings.iter().all(|s| s.played == 0));
    }

    #[test]
    fn test_head_to_head_beats_differences() {
        let matches = vec![
            result(0, 1, 2, &[(9, 11), (9, 11)]),
            result(1, 1, 3, &[(11, 0), (11, 0), (11, 0)]),
            result(2, 4, 2, &[(11, 9), (11, 9)]),
            result(3, 4, 3, &[(11, 5), (11, 5)]),
        ];
        let standings = compute_standings(&matches, &[1, 2, 3, 4], TieBreak::HeadToHead);
        assert_eq!(order(&standings), vec![4, 2, 1, 3]);
        assert!(standings[2].set_difference() > standings[1].set_difference());
    }

    #[test]
    fn test_three_way_tie_uses_mini_table_then_sets() {
        let matches = vec![
            result(0, 1, 2, &[(11, 5), (11, 5)]),
            result(1, 2, 3, &[(11, 5), (5, 11), (11, 5)]),
            result(2, 3, 1, &[(11, 9), (5, 11), (11, 9)]),
        ];
        let standings = compute_standings(&matches, &[1, 2, 3], TieBreak::HeadToHead);
        // 1: +1 sets, 2: -1 sets, 3: 0 sets.
        assert_eq!(order(&standings), vec![1, 3, 2]);
    }

    #[test]
    fn test_seeding_breaks_full_ties() {
        let standings = compute_standings(
            &[
                result(0, 1, 2, &[(11, 5)]),
                result(1, 3, 4, &[(11, 5)]),
            ],
            &[3, 1, 4, 2],
            TieBreak::HeadToHead,
        );
        assert_eq!(order(&standings), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_buchholz() {
        let matches = vec![
            result(0, 1, 2, &[(11, 5), (11, 5)]),
            result(1, 3, 4, &[(11, 5), (11, 5)]),
            result(2, 1, 3, &[(11, 5), (11, 5)]),
            result(3, 4, 2, &[(11, 5), (11, 5)]),
        ];
        let standings = compute_standings(&matches, &[1, 2, 3, 4], TieBreak::Buchholz);
        // 3 and 4 both won once; 3 met 4 (1 win) and 1 (2 wins).
        assert_eq!(order(&standings), vec![1, 3, 4, 2]);
        assert_eq!(standings[1].buchholz, Some(3));
        assert_eq!(standings[2].buchholz, Some(1));
    }

    #[test]
    fn test_is_deterministic() {
        let matches = vec![
            result(0, 1, 2, &[(11, 5)]),
            result(1, 2, 3, &[(11, 5)]),
            result(2, 3, 1, &[(11, 5)]),
        ];
        let first = compute_standings(&matches, &[1, 2, 3], TieBreak::HeadToHead);
        let second = compute_standings(&matches, &[1, 2, 3], TieBreak::HeadToHead);
        assert_eq!(first, second);
        assert_eq!(order(&first), vec![1, 2, 3]);
    }
}
