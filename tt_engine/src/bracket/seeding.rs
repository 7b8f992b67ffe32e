//! Seeding: ranked order, group draws and knockout cross-seeding.

use crate::scoring::ParticipantId;
use crate::tournament::Participant;

/// Participants by ranking, best first. Equal rankings keep their input
/// order.
#[must_use]
pub fn ranked(participants: &[Participant]) -> Vec<&Participant> {
    let mut ranked: Vec<&Participant> = participants.iter().collect();
    ranked.sort_by(|a, b| b.ranking.cmp(&a.ranking));
    ranked
}

#[must_use]
pub fn ranked_ids(participants: &[Participant]) -> Vec<ParticipantId> {
    ranked(participants).into_iter().map(|p| p.id).collect()
}

/// Number of groups needed for `n` entrants at `group_size` per group.
#[must_use]
pub const fn group_count(n: usize, group_size: usize) -> usize {
    n.div_ceil(group_size)
}

/// Snake-seeded group draw that keeps clubmates apart where it can.
///
/// The ranked field is cut into pots of `group_count` entrants. Even pots
/// walk the groups forward, odd pots backward. Each entrant goes to the
/// group, among those this pot has not filled yet, holding the fewest
/// members of the same club; ties go to the earliest group in walk order.
///
/// Returns member IDs per group, each in ranked order.
#[must_use]
pub fn draw_groups(ranked: &[&Participant], group_size: usize) -> Vec<Vec<ParticipantId>> {
    let count = group_count(ranked.len(), group_size.max(1));
    let mut groups: Vec<Vec<&Participant>> = vec![Vec::new(); count];

    for (pot_index, pot) in ranked.chunks(count.max(1)).enumerate() {
        let mut order: Vec<usize> = (0..count).collect();
        if pot_index % 2 == 1 {
            order.reverse();
        }

        for participant in pot {
            let chosen = order
                .iter()
                .enumerate()
                .min_by_key(|&(_, &group)| same_club_members(&groups[group], participant))
                .map(|(at, _)| at);
            if let Some(at) = chosen {
                let group = order.remove(at);
                groups[group].push(participant);
            }
        }
    }

    groups
        .into_iter()
        .map(|members| members.into_iter().map(|p| p.id).collect())
        .collect()
}

fn same_club_members(group: &[&Participant], participant: &Participant) -> usize {
    let Some(club) = participant.club.as_deref() else {
        return 0;
    };
    group
        .iter()
        .filter(|member| member.club.as_deref() == Some(club))
        .count()
}

/// Knockout entry order from group results: winners by group interleaved
/// with runners-up in reverse group order, so that group mates land in
/// opposite halves. Extra entrants are appended.
#[must_use]
pub fn cross_seed(winners: &[ParticipantId], runners_up: &[ParticipantId]) -> Vec<ParticipantId> {
    let mut order = Vec::with_capacity(winners.len() + runners_up.len());
    let mut runners = runners_up.iter().rev();
    for &winner in winners {
        order.push(winner);
        if let Some(&runner) = runners.next() {
            order.push(runner);
        }
    }
    order.extend(runners);
    order
}
