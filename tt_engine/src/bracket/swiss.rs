//! Swiss pairing for rounds after the first.
//!
//! Pairing is greedy first-fit: each unpaired entrant, in order of wins,
//! takes the first later entrant it has not met yet. An entrant with no
//! such opponent left gets a bye instead of a rematch.

use std::collections::{HashMap, HashSet};

use crate::scoring::{Match, MatchKey, ParticipantId, Section};

use super::generator::elimination_rounds;

/// Rounds a Swiss event runs for: the configured count, or `ceil(log2 n)`.
#[must_use]
pub fn round_limit(entrants: usize, configured: Option<u32>) -> u32 {
    configured.unwrap_or_else(|| elimination_rounds(entrants).max(1))
}

/// Entrants ordered by wins, byes included. Equal records keep seeding
/// order.
#[must_use]
pub fn order_by_wins(seeds: &[ParticipantId], matches: &[Match]) -> Vec<ParticipantId> {
    let mut wins: HashMap<ParticipantId, u32> = HashMap::new();
    for winner in matches.iter().filter_map(|m| m.winner) {
        *wins.entry(winner).or_default() += 1;
    }
    let mut order = seeds.to_vec();
    order.sort_by_key(|id| std::cmp::Reverse(wins.get(id).copied().unwrap_or(0)));
    order
}

/// Pairings already played, as unordered pairs.
fn played_pairs(matches: &[Match]) -> HashSet<(ParticipantId, ParticipantId)> {
    matches
        .iter()
        .filter_map(|m| Some(unordered(m.participant1?, m.participant2?)))
        .collect()
}

const fn unordered(a: ParticipantId, b: ParticipantId) -> (ParticipantId, ParticipantId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Matches of `round` for entrants in `order`.
#[must_use]
pub fn pair_round(order: &[ParticipantId], history: &[Match], round: u32) -> Vec<Match> {
    let played = played_pairs(history);
    let mut paired = vec![false; order.len()];
    let mut matches = Vec::with_capacity(order.len().div_ceil(2));
    let mut position = 0;

    for i in 0..order.len() {
        if paired[i] {
            continue;
        }
        paired[i] = true;
        let opponent = (i + 1..order.len())
            .find(|&j| !paired[j] && !played.contains(&unordered(order[i], order[j])));

        let key = MatchKey::new(Section::Main, round, position);
        let m = match opponent {
            Some(j) => {
                paired[j] = true;
                Match::seeded(0, key, Some(order[i]), Some(order[j]))
            }
            None => Match::seeded(0, key, Some(order[i]), None),
        };
        matches.push(m);
        position += 1;
    }
    matches
}
