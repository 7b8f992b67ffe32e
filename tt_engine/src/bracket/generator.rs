//! Initial match sets for each format.
//!
//! Generators only lay out matches. IDs are assigned when the arena takes
//! them, and byes are propagated afterwards by [`resolve`](super::resolve).

use crate::scoring::{Match, MatchKey, ParticipantId, Section};

use super::topology::DoubleElimination;

/// Bracket size for `n` entrants: the next power of two.
#[must_use]
pub const fn bracket_slots(n: usize) -> usize {
    if n <= 1 { 1 } else { n.next_power_of_two() }
}

/// Single-elimination rounds for `n` entrants.
#[must_use]
pub const fn elimination_rounds(n: usize) -> u32 {
    bracket_slots(n).trailing_zeros()
}

/// Single-elimination bracket in `Section::Main`.
///
/// Seed `i` sits in slot `i`; round 0 match `i` pairs slots `2i` and
/// `2i + 1`. Later rounds start empty.
#[must_use]
pub fn single_elimination(seeds: &[ParticipantId]) -> Vec<Match> {
    let slots = bracket_slots(seeds.len());
    let rounds = elimination_rounds(seeds.len());
    let mut matches = Vec::with_capacity(slots.saturating_sub(1));

    for i in 0..slots / 2 {
        let key = MatchKey::new(Section::Main, 0, i as u32);
        matches.push(Match::seeded(
            0,
            key,
            seeds.get(2 * i).copied(),
            seeds.get(2 * i + 1).copied(),
        ));
    }
    for round in 1..rounds {
        let count = slots >> (round + 1);
        for position in 0..count {
            let key = MatchKey::new(Section::Main, round, position as u32);
            matches.push(Match::empty(0, key));
        }
    }
    matches
}

/// Winner bracket, loser bracket and grand final.
#[must_use]
pub fn double_elimination(seeds: &[ParticipantId]) -> Vec<Match> {
    let slots = bracket_slots(seeds.len());
    let topology = DoubleElimination {
        wb_rounds: elimination_rounds(seeds.len()),
    };
    let mut matches = single_elimination(seeds);

    for round in 0..topology.lb_rounds() {
        let count = (slots / (4 << (round / 2))).max(1);
        for position in 0..count {
            let key = MatchKey::new(Section::Losers, round, position as u32);
            matches.push(Match::empty(0, key));
        }
    }
    matches.push(Match::empty(0, MatchKey::new(Section::GrandFinal, 0, 0)));
    matches
}

/// Round-robin schedule by the circle method.
///
/// An odd field gets a placeholder; pairings against it are skipped.
/// Positions count up from `position_offset` within each round.
#[must_use]
pub fn round_robin(
    seeds: &[ParticipantId],
    section: Section,
    position_offset: u32,
) -> Vec<Match> {
    if seeds.len() < 2 {
        return Vec::new();
    }
    let mut circle: Vec<Option<ParticipantId>> = seeds.iter().copied().map(Some).collect();
    if circle.len() % 2 == 1 {
        circle.push(None);
    }
    let m = circle.len();
    let mut matches = Vec::with_capacity(seeds.len() * (seeds.len() - 1) / 2);

    for round in 0..(m - 1) as u32 {
        let mut position = position_offset;
        for i in 0..m / 2 {
            if let (Some(home), Some(away)) = (circle[i], circle[m - 1 - i]) {
                let key = MatchKey::new(section, round, position);
                matches.push(Match::seeded(0, key, Some(home), Some(away)));
                position += 1;
            }
        }
        // Index 0 stays put; the last entrant moves to index 1.
        if let Some(last) = circle.pop() {
            circle.insert(1, last);
        }
    }
    matches
}

/// First Swiss round: top half against bottom half. The middle entrant of
/// an odd field gets a bye.
#[must_use]
pub fn swiss_opening(seeds: &[ParticipantId]) -> Vec<Match> {
    let n = seeds.len();
    let half = n.div_ceil(2);
    let mut matches = Vec::with_capacity(half);

    for i in 0..n / 2 {
        let key = MatchKey::new(Section::Main, 0, i as u32);
        matches.push(Match::seeded(0, key, Some(seeds[i]), Some(seeds[i + half])));
    }
    if n % 2 == 1 {
        let key = MatchKey::new(Section::Main, 0, (n / 2) as u32);
        matches.push(Match::seeded(0, key, Some(seeds[half - 1]), None));
    }
    matches
}
