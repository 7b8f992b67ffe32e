//! Bracket topologies: where each match's winner and loser go, and where
//! each slot is fed from.
//!
//! Edges are computed from `(section, round, position)` arithmetic rather
//! than stored, so the topology only needs the bracket's round counts.

use enum_dispatch::enum_dispatch;

use crate::scoring::{Match, MatchKey, Section, Slot};
use crate::tournament::TournamentFormat;

/// Where a slot's participant comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotSource {
    /// Placed by the generator; an empty seed slot never fills.
    Seed,
    /// Fixed at creation and never fed (round robin, Swiss, groups).
    Fixed,
    Winner(MatchKey),
    Loser(MatchKey),
}

/// Downstream edge of a match result.
pub type Target = (MatchKey, Slot);

#[enum_dispatch]
pub trait Topology {
    /// Slot the winner of `key` moves into.
    fn winner_target(&self, key: MatchKey) -> Option<Target>;

    /// Slot the loser of `key` drops into.
    fn loser_target(&self, key: MatchKey) -> Option<Target>;

    /// Feeder of `slot` in the match at `key`.
    fn slot_source(&self, key: MatchKey, slot: Slot) -> SlotSource;
}

/// Single elimination over the main section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SingleElimination {
    pub rounds: u32,
}

impl Topology for SingleElimination {
    fn winner_target(&self, key: MatchKey) -> Option<Target> {
        if key.section != Section::Main || key.round + 1 >= self.rounds {
            return None;
        }
        Some((
            MatchKey::new(Section::Main, key.round + 1, key.position / 2),
            Slot::by_parity(key.position),
        ))
    }

    fn loser_target(&self, _key: MatchKey) -> Option<Target> {
        None
    }

    fn slot_source(&self, key: MatchKey, slot: Slot) -> SlotSource {
        feeder_in_previous_round(key, slot)
    }
}

/// Double elimination: winner bracket in the main section, loser bracket and
/// a single grand final.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DoubleElimination {
    pub wb_rounds: u32,
}

impl DoubleElimination {
    #[must_use]
    pub const fn lb_rounds(&self) -> u32 {
        2 * self.wb_rounds.saturating_sub(1)
    }

    const fn grand_final() -> MatchKey {
        MatchKey::new(Section::GrandFinal, 0, 0)
    }
}

impl Topology for DoubleElimination {
    fn winner_target(&self, key: MatchKey) -> Option<Target> {
        let MatchKey {
            section,
            round,
            position,
        } = key;
        match section {
            Section::Main if round + 1 >= self.wb_rounds => Some((Self::grand_final(), Slot::First)),
            Section::Main => Some((
                MatchKey::new(Section::Main, round + 1, position / 2),
                Slot::by_parity(position),
            )),
            Section::Losers if round + 1 >= self.lb_rounds() => {
                Some((Self::grand_final(), Slot::Second))
            }
            Section::Losers if round % 2 == 0 => {
                Some((MatchKey::new(Section::Losers, round + 1, position), Slot::First))
            }
            Section::Losers => Some((
                MatchKey::new(Section::Losers, round + 1, position / 2),
                Slot::by_parity(position),
            )),
            _ => None,
        }
    }

    fn loser_target(&self, key: MatchKey) -> Option<Target> {
        if key.section != Section::Main {
            return None;
        }
        if key.round == 0 {
            Some((
                MatchKey::new(Section::Losers, 0, key.position / 2),
                Slot::by_parity(key.position),
            ))
        } else {
            Some((
                MatchKey::new(Section::Losers, 2 * key.round - 1, key.position),
                Slot::Second,
            ))
        }
    }

    fn slot_source(&self, key: MatchKey, slot: Slot) -> SlotSource {
        let MatchKey {
            section,
            round,
            position,
        } = key;
        match section {
            Section::Main => feeder_in_previous_round(key, slot),
            Section::Losers if round == 0 => SlotSource::Loser(MatchKey::new(
                Section::Main,
                0,
                2 * position + slot_offset(slot),
            )),
            Section::Losers if round % 2 == 1 => match slot {
                Slot::First => SlotSource::Winner(MatchKey::new(Section::Losers, round - 1, position)),
                Slot::Second => {
                    SlotSource::Loser(MatchKey::new(Section::Main, round.div_ceil(2), position))
                }
            },
            Section::Losers => SlotSource::Winner(MatchKey::new(
                Section::Losers,
                round - 1,
                2 * position + slot_offset(slot),
            )),
            Section::GrandFinal => match slot {
                Slot::First => SlotSource::Winner(MatchKey::new(
                    Section::Main,
                    self.wb_rounds.saturating_sub(1),
                    0,
                )),
                Slot::Second => SlotSource::Winner(MatchKey::new(
                    Section::Losers,
                    self.lb_rounds().saturating_sub(1),
                    0,
                )),
            },
            Section::Group(_) => SlotSource::Fixed,
        }
    }
}

/// Round robin, Swiss and group stages: every match is fixed at creation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flat;

impl Topology for Flat {
    fn winner_target(&self, _key: MatchKey) -> Option<Target> {
        None
    }

    fn loser_target(&self, _key: MatchKey) -> Option<Target> {
        None
    }

    fn slot_source(&self, _key: MatchKey, _slot: Slot) -> SlotSource {
        SlotSource::Fixed
    }
}

#[enum_dispatch(Topology)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BracketTopology {
    SingleElimination,
    DoubleElimination,
    Flat,
}

impl BracketTopology {
    /// Topology of the bracket currently held in `matches`.
    #[must_use]
    pub fn detect(format: TournamentFormat, matches: &[Match]) -> Self {
        let main_rounds = matches
            .iter()
            .filter(|m| m.section == Section::Main)
            .map(|m| m.round + 1)
            .max()
            .unwrap_or(0);
        match format {
            TournamentFormat::Knockout | TournamentFormat::GroupKnockout => {
                SingleElimination {
                    rounds: main_rounds,
                }
                .into()
            }
            TournamentFormat::DoubleKnockout => DoubleElimination {
                wb_rounds: main_rounds,
            }
            .into(),
            TournamentFormat::RoundRobin | TournamentFormat::Swiss => Flat.into(),
        }
    }
}

const fn slot_offset(slot: Slot) -> u32 {
    match slot {
        Slot::First => 0,
        Slot::Second => 1,
    }
}

fn feeder_in_previous_round(key: MatchKey, slot: Slot) -> SlotSource {
    match key.section {
        Section::Main if key.round == 0 => SlotSource::Seed,
        Section::Main => SlotSource::Winner(MatchKey::new(
            Section::Main,
            key.round - 1,
            2 * key.position + slot_offset(slot),
        )),
        _ => SlotSource::Fixed,
    }
}
