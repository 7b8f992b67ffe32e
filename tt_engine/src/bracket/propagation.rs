//! Moves winners and losers through the bracket graph.
//!
//! [`resolve`] runs to a fixed point after every batch of creation or
//! scoring: completed matches push their results downstream, and pending
//! matches whose open slot can never be filled are completed as byes.

use log::{debug, warn};

use crate::scoring::{Match, MatchKey, MatchStatus, ParticipantId, Slot};

use super::arena::MatchArena;
use super::topology::{BracketTopology, SlotSource, Target, Topology};

/// Propagate results until nothing changes. Returns whether anything did.
pub fn resolve(arena: &mut MatchArena, topology: &BracketTopology) -> bool {
    let mut changed_any = false;
    loop {
        let mut changed = false;
        for idx in 0..arena.len() {
            let m = arena.at(idx);
            let key = m.key();
            match m.status {
                MatchStatus::Completed if stale_bye(arena, topology, m) => {
                    changed |= reopen_bye(arena, topology, idx);
                }
                MatchStatus::Completed => {
                    let (winner, loser) = (m.winner, m.loser());
                    if let (Some(winner), Some(target)) = (winner, topology.winner_target(key)) {
                        changed |= place(arena, topology, target, winner, key);
                    }
                    if let (Some(loser), Some(target)) = (loser, topology.loser_target(key)) {
                        changed |= place(arena, topology, target, loser, key);
                    }
                }
                MatchStatus::Pending => {
                    let open = match (m.participant1, m.participant2) {
                        (Some(_), None) => Slot::Second,
                        (None, Some(_)) => Slot::First,
                        _ => continue,
                    };
                    if !slot_alive(arena, topology, key, open) {
                        changed |= arena.award_bye(idx);
                    }
                }
                MatchStatus::Active => {}
            }
        }
        if !changed {
            return changed_any;
        }
        changed_any = true;
    }
}

/// Pull a stale result of `previous` back out of the matches it fed.
///
/// Called when a match is re-scored so that it is no longer complete or now
/// has a different winner. Pending downstream matches lose the stale
/// participant and byes the engine awarded them are reopened, recursively.
/// A match that has been started or scored is left alone.
pub fn retract(arena: &mut MatchArena, topology: &BracketTopology, previous: &Match) {
    let key = previous.key();
    if let (Some(winner), Some(target)) = (previous.winner, topology.winner_target(key)) {
        withdraw(arena, topology, target, winner, key);
    }
    if let (Some(loser), Some(target)) = (previous.loser(), topology.loser_target(key)) {
        withdraw(arena, topology, target, loser, key);
    }
}

/// An engine-awarded bye is no longer backed by a dead slot.
fn stale_bye(arena: &MatchArena, topology: &BracketTopology, m: &Match) -> bool {
    if !m.is_bye() || !m.sets.is_empty() {
        return false;
    }
    let open = if m.participant1.is_none() {
        Slot::First
    } else {
        Slot::Second
    };
    let key = m.key();
    matches!(
        topology.slot_source(key, open),
        SlotSource::Winner(_) | SlotSource::Loser(_)
    ) && slot_alive(arena, topology, key, open)
}

/// Put an engine-awarded bye back to pending and pull its winner out of
/// the match it advanced into.
fn reopen_bye(arena: &mut MatchArena, topology: &BracketTopology, idx: usize) -> bool {
    match arena.revoke_bye(idx) {
        Some(previous) => {
            retract(arena, topology, &previous);
            true
        }
        None => false,
    }
}

fn place(
    arena: &mut MatchArena,
    topology: &BracketTopology,
    (key, slot): Target,
    participant: ParticipantId,
    from: MatchKey,
) -> bool {
    let Some(idx) = arena.index_of(key) else {
        warn!("no match at {key} to receive {participant} from {from}");
        return false;
    };
    let target = arena.at(idx);
    let current = target.participant(slot);
    if current == Some(participant) {
        return false;
    }
    let open = match target.status {
        MatchStatus::Pending => true,
        MatchStatus::Active => current.is_none(),
        MatchStatus::Completed => false,
    };
    if open || reopen_bye(arena, topology, idx) {
        return arena.fill_slot(idx, slot, participant);
    }
    warn!(
        "{key} is already {}; not placing {participant} from {from} into {slot}",
        arena.at(idx).status
    );
    false
}

fn withdraw(
    arena: &mut MatchArena,
    topology: &BracketTopology,
    (key, slot): Target,
    participant: ParticipantId,
    from: MatchKey,
) {
    let Some(idx) = arena.index_of(key) else {
        return;
    };
    let target = arena.at(idx);
    if target.participant(slot) != Some(participant) {
        return;
    }
    if target.status == MatchStatus::Pending || reopen_bye(arena, topology, idx) {
        debug!("withdrawing {participant} from {key} after {from} changed");
        arena.clear_slot(idx, slot);
    } else {
        warn!(
            "{key} is already {}; keeping {participant} although {from} changed",
            arena.at(idx).status
        );
    }
}

/// Whether `slot` of the match at `key` holds or can still receive a
/// participant.
fn slot_alive(
    arena: &MatchArena,
    topology: &BracketTopology,
    key: MatchKey,
    slot: Slot,
) -> bool {
    let Some(m) = arena.get(key) else {
        return false;
    };
    if m.participant(slot).is_some() {
        return true;
    }
    match topology.slot_source(key, slot) {
        SlotSource::Seed => false,
        SlotSource::Fixed => true,
        SlotSource::Winner(feeder) => can_produce_winner(arena, topology, feeder),
        SlotSource::Loser(feeder) => can_produce_loser(arena, topology, feeder),
    }
}

fn can_produce_winner(arena: &MatchArena, topology: &BracketTopology, key: MatchKey) -> bool {
    match arena.get(key) {
        Some(m) if m.is_completed() => m.winner.is_some(),
        Some(_) => {
            slot_alive(arena, topology, key, Slot::First)
                || slot_alive(arena, topology, key, Slot::Second)
        }
        None => false,
    }
}

// A bye has no loser, so one dead slot is enough.
fn can_produce_loser(arena: &MatchArena, topology: &BracketTopology, key: MatchKey) -> bool {
    match arena.get(key) {
        Some(m) if m.is_completed() => m.loser().is_some(),
        Some(_) => {
            slot_alive(arena, topology, key, Slot::First)
                && slot_alive(arena, topology, key, Slot::Second)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::generator::{double_elimination, single_elimination};
    use crate::bracket::topology::{DoubleElimination, SingleElimination};
    use crate::scoring::{Evaluation, Section};
    use chrono::{TimeZone, Utc};

    fn arena_from(matches: Vec<Match>) -> MatchArena {
        let mut arena = MatchArena::build(Vec::new()).unwrap();
        for m in matches {
            arena.insert(m).unwrap();
        }
        arena
    }

    fn finish(arena: &mut MatchArena, key: MatchKey, winner: ParticipantId) -> Match {
        let idx = arena.index_of(key).unwrap();
        let previous = arena.at(idx).clone();
        let evaluation = Evaluation {
            sets: Vec::new(),
            winner: Some(winner),
            status: MatchStatus::Completed,
            completed_at: Some(Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()),
        };
        arena.apply_evaluation(idx, &evaluation);
        previous
    }

    fn main(round: u32, position: u32) -> MatchKey {
        MatchKey::new(Section::Main, round, position)
    }

    fn losers(round: u32, position: u32) -> MatchKey {
        MatchKey::new(Section::Losers, round, position)
    }

    fn participants(arena: &MatchArena, key: MatchKey) -> (Option<i64>, Option<i64>) {
        let m = arena.get(key).unwrap();
        (m.participant1, m.participant2)
    }

    #[test]
    fn test_byes_advance_on_generation() {
        let topology: BracketTopology = SingleElimination { rounds: 3 }.into();

        // r0p2 (5 vs 6) is real and r0p3 is void: nothing moves until 5-6
        // is played, then its winner walks through r1p1.
        let mut arena = arena_from(single_elimination(&[1, 2, 3, 4, 5, 6]));
        assert!(!resolve(&mut arena, &topology));
        assert_eq!(participants(&arena, main(1, 1)), (None, None));
        finish(&mut arena, main(0, 2), 6);
        assert!(resolve(&mut arena, &topology));
        assert!(arena.get(main(1, 1)).unwrap().is_bye());
        assert_eq!(participants(&arena, main(2, 0)), (None, Some(6)));

        // 5 gets a bye in r0p2, then the void r0p3 gives 5 a second bye.
        let mut arena = arena_from(single_elimination(&[1, 2, 3, 4, 5]));
        assert!(resolve(&mut arena, &topology));
        assert_eq!(participants(&arena, main(1, 1)), (Some(5), None));
        assert!(arena.get(main(1, 1)).unwrap().is_bye());
        assert_eq!(participants(&arena, main(2, 0)), (None, Some(5)));
        assert_eq!(arena.get(main(2, 0)).unwrap().status, MatchStatus::Pending);
    }

    #[test]
    fn test_four_player_double_elimination_flow() {
        let mut arena = arena_from(double_elimination(&[1, 2, 3, 4]));
        let topology: BracketTopology = DoubleElimination { wb_rounds: 2 }.into();
        resolve(&mut arena, &topology);

        finish(&mut arena, main(0, 0), 1);
        finish(&mut arena, main(0, 1), 3);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, main(1, 0)), (Some(1), Some(3)));
        assert_eq!(participants(&arena, losers(0, 0)), (Some(2), Some(4)));

        finish(&mut arena, losers(0, 0), 2);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, losers(1, 0)), (Some(2), None));

        finish(&mut arena, main(1, 0), 1);
        resolve(&mut arena, &topology);
        let grand_final = MatchKey::new(Section::GrandFinal, 0, 0);
        assert_eq!(participants(&arena, losers(1, 0)), (Some(2), Some(3)));
        assert_eq!(participants(&arena, grand_final), (Some(1), None));

        finish(&mut arena, losers(1, 0), 3);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, grand_final), (Some(1), Some(3)));
    }

    #[test]
    fn test_loser_bracket_bye_from_wb_bye() {
        let mut arena = arena_from(double_elimination(&[1, 2, 3]));
        let topology: BracketTopology = DoubleElimination { wb_rounds: 2 }.into();
        resolve(&mut arena, &topology);
        // 3 has a bye in r0p1, so r1p0 waits on 1 vs 2.
        assert_eq!(participants(&arena, main(1, 0)), (None, Some(3)));

        finish(&mut arena, main(0, 0), 2);
        resolve(&mut arena, &topology);
        let lb0 = arena.get(losers(0, 0)).unwrap();
        assert!(lb0.is_bye());
        assert_eq!(lb0.winner, Some(1));
        assert_eq!(participants(&arena, losers(1, 0)), (Some(1), None));
    }

    #[test]
    fn test_retract_clears_pending_downstream() {
        let mut arena = arena_from(single_elimination(&[1, 2, 3, 4]));
        let topology: BracketTopology = SingleElimination { rounds: 2 }.into();
        finish(&mut arena, main(0, 0), 1);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, main(1, 0)), (Some(1), None));

        let previous = finish(&mut arena, main(0, 0), 2);
        assert_eq!(previous.winner, Some(1));
        retract(&mut arena, &topology, &previous);
        assert_eq!(participants(&arena, main(1, 0)), (None, None));
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, main(1, 0)), (Some(2), None));
    }

    #[test]
    fn test_started_downstream_is_not_overwritten() {
        let mut arena = arena_from(single_elimination(&[1, 2, 3, 4]));
        let topology: BracketTopology = SingleElimination { rounds: 2 }.into();
        finish(&mut arena, main(0, 0), 1);
        finish(&mut arena, main(0, 1), 3);
        resolve(&mut arena, &topology);
        let final_idx = arena.index_of(main(1, 0)).unwrap();
        arena.activate(final_idx, Some(1));

        finish(&mut arena, main(0, 0), 2);
        assert!(!resolve(&mut arena, &topology));
        assert_eq!(participants(&arena, main(1, 0)), (Some(1), Some(3)));
    }

    #[test]
    fn test_retract_reopens_awarded_bye() {
        let mut arena = arena_from(single_elimination(&[1, 2, 3, 4, 5, 6]));
        let topology: BracketTopology = SingleElimination { rounds: 3 }.into();
        finish(&mut arena, main(0, 2), 5);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, main(2, 0)), (None, Some(5)));

        let previous = finish(&mut arena, main(0, 2), 6);
        retract(&mut arena, &topology, &previous);
        assert_eq!(participants(&arena, main(1, 1)), (None, None));
        assert_eq!(arena.get(main(1, 1)).unwrap().status, MatchStatus::Pending);
        assert_eq!(participants(&arena, main(2, 0)), (None, None));

        resolve(&mut arena, &topology);
        let bye = arena.get(main(1, 1)).unwrap();
        assert!(bye.is_bye());
        assert_eq!(bye.winner, Some(6));
        assert_eq!(participants(&arena, main(2, 0)), (None, Some(6)));
    }

    #[test]
    fn test_loser_bracket_bye_follows_corrected_loser() {
        let mut arena = arena_from(double_elimination(&[1, 2, 3]));
        let topology: BracketTopology = DoubleElimination { wb_rounds: 2 }.into();
        resolve(&mut arena, &topology);
        finish(&mut arena, main(0, 0), 2);
        resolve(&mut arena, &topology);
        assert_eq!(participants(&arena, losers(1, 0)), (Some(1), None));

        let previous = finish(&mut arena, main(0, 0), 1);
        retract(&mut arena, &topology, &previous);
        resolve(&mut arena, &topology);

        assert_eq!(participants(&arena, main(1, 0)), (Some(1), Some(3)));
        let lb0 = arena.get(losers(0, 0)).unwrap();
        assert!(lb0.is_bye());
        assert_eq!(lb0.winner, Some(2));
        assert_eq!(participants(&arena, losers(1, 0)), (Some(2), None));
    }

    #[test]
    fn test_missing_target_is_ignored() {
        let mut arena = arena_from(vec![Match::seeded(0, main(0, 0), Some(1), None)]);
        let topology: BracketTopology = SingleElimination { rounds: 3 }.into();
        assert!(!resolve(&mut arena, &topology));
    }
}
