/// Property-based tests for bracket generation and result flow using proptest
///
/// These tests play whole tournaments with randomly chosen results and check
/// the structural guarantees every bracket has to keep.
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use tt_engine::{
    Command, EngineError, Match, Participant, ParticipantId, Section, SetScore, Slot, TieBreak,
    Tournament, TournamentEngine, TournamentFormat, TournamentSettings,
    bracket::{bracket_slots, ranked_ids},
    scoring::set_winner,
    standings::compute_standings,
    tournament::apply_deltas,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap()
}

fn tournament(settings: TournamentSettings, n: usize) -> Tournament {
    let participants = (1..=n as i64)
        .map(|id| Participant::new(id, format!("Player {id}"), 3000 - id as i32))
        .collect();
    Tournament::new("Property Open", settings, participants)
}

fn sheet(first_wins: bool) -> Vec<SetScore> {
    if first_wins {
        vec![SetScore::new(11, 6), SetScore::new(11, 9)]
    } else {
        vec![SetScore::new(5, 11), SetScore::new(13, 15)]
    }
}

// Strategy for a non-empty list of match results, consumed cyclically
fn results_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..=64)
}

// Strategy for a single set score, including deuce scores
fn set_strategy() -> impl Strategy<Value = SetScore> {
    (0u32..=25, 0u32..=25).prop_map(|(a, b)| SetScore::new(a, b))
}

/// Play every ready match until none is left, checking after each command
/// that replaying its deltas onto the previous snapshot reproduces the new
/// one. Counts played matches into `played`.
fn play_out(
    engine: &TournamentEngine,
    t: &mut Tournament,
    results: &[bool],
    played: &mut usize,
) -> Result<(), TestCaseError> {
    while let Some(id) = t.matches.iter().find(|m| m.is_ready()).map(|m| m.id) {
        let before = t.clone();
        let first_wins = results[*played % results.len()];
        let outcome = engine
            .execute(
                t,
                Command::EvaluateScore {
                    match_id: id,
                    sets: sheet(first_wins),
                },
                now(),
            )
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let (mut matches, mut phase) = (before.matches, before.phase);
        apply_deltas(&mut matches, &mut phase, &outcome.deltas);
        prop_assert_eq!(&matches, &t.matches, "deltas must replay to the snapshot");
        prop_assert_eq!(phase, t.phase);
        *played += 1;
    }
    Ok(())
}

fn generated(settings: TournamentSettings, n: usize) -> (TournamentEngine, Tournament) {
    let engine = TournamentEngine::default();
    let mut t = tournament(settings, n);
    engine
        .execute(&mut t, Command::GenerateBracket, now())
        .expect("generation succeeds");
    (engine, t)
}

fn played_pairs(matches: &[Match]) -> Vec<(ParticipantId, ParticipantId)> {
    matches
        .iter()
        .filter_map(|m| Some((m.participant1?, m.participant2?)))
        .map(|(a, b)| (a.min(b), a.max(b)))
        .collect()
}

proptest! {
    #[test]
    fn test_set_winner_rule(set in set_strategy()) {
        let expected = if set.score1 >= 11 && set.score1 >= set.score2 + 2 {
            Some(Slot::First)
        } else if set.score2 >= 11 && set.score2 >= set.score1 + 2 {
            Some(Slot::Second)
        } else {
            None
        };
        prop_assert_eq!(set_winner(&set), expected);
    }

    #[test]
    fn test_single_elimination_shape(n in 2usize..=64) {
        let (_, t) = generated(TournamentSettings::new(TournamentFormat::Knockout), n);
        let slots = bracket_slots(n);
        let opening: Vec<&Match> = t.matches.iter().filter(|m| m.round == 0).collect();

        prop_assert_eq!(opening.len(), slots / 2);
        prop_assert_eq!(t.matches.len(), slots - 1);

        let empty_slots = opening
            .iter()
            .flat_map(|m| [m.participant1, m.participant2])
            .filter(Option::is_none)
            .count();
        prop_assert_eq!(empty_slots, slots - n);

        let rounds = t.matches.iter().map(|m| m.round).max().map_or(0, |r| r + 1);
        prop_assert_eq!(1usize << rounds, slots);
    }

    #[test]
    fn test_single_elimination_plays_n_minus_one(n in 2usize..=40, results in results_strategy()) {
        let (engine, mut t) = generated(TournamentSettings::new(TournamentFormat::Knockout), n);
        let mut played = 0;
        play_out(&engine, &mut t, &results, &mut played)?;

        prop_assert_eq!(played, n - 1);
        prop_assert!(engine.champion(&t).is_some());
    }

    #[test]
    fn test_double_elimination_plays_two_n_minus_two(
        n in 3usize..=24,
        results in results_strategy(),
    ) {
        let (engine, mut t) = generated(TournamentSettings::new(TournamentFormat::DoubleKnockout), n);
        let mut played = 0;
        play_out(&engine, &mut t, &results, &mut played)?;

        // Every non-champion is knocked out by a second loss, except a
        // winner-bracket champion beaten in the grand final, who then
        // leaves the champion with one loss of their own.
        prop_assert_eq!(played, 2 * n - 2);
        let champion = engine.champion(&t);
        prop_assert!(champion.is_some());

        let losses = |p: ParticipantId| {
            t.matches
                .iter()
                .filter(|m| m.loser() == Some(p))
                .count()
        };
        let champion = champion.unwrap_or_default();
        prop_assert!(losses(champion) <= 1);
        for id in 1..=n as i64 {
            if id != champion {
                prop_assert!((1..=2).contains(&losses(id)));
            }
        }
    }

    #[test]
    fn test_round_robin_meets_everyone_once(n in 2usize..=16) {
        let (_, t) = generated(TournamentSettings::new(TournamentFormat::RoundRobin), n);
        let pairs = played_pairs(&t.matches);
        let distinct: HashSet<_> = pairs.iter().copied().collect();

        prop_assert_eq!(pairs.len(), n * (n - 1) / 2);
        prop_assert_eq!(distinct.len(), pairs.len());

        let rounds = t.matches.iter().map(|m| m.round).max().map_or(0, |r| r + 1);
        let expected = if n % 2 == 0 { n - 1 } else { n };
        prop_assert_eq!(rounds as usize, expected);

        // Nobody plays twice in one round.
        for round in 0..rounds {
            let mut seen = HashSet::new();
            for m in t.matches.iter().filter(|m| m.round == round) {
                for p in [m.participant1, m.participant2].into_iter().flatten() {
                    prop_assert!(seen.insert(p));
                }
            }
        }
    }

    #[test]
    fn test_swiss_never_rematches(
        n in 3usize..=12,
        extra_rounds in 0u32..=3,
        results in results_strategy(),
    ) {
        let rounds = (n as u32 - 1).min(2 + extra_rounds);
        let settings = TournamentSettings::new(TournamentFormat::Swiss).with_swiss_rounds(rounds);
        let (engine, mut t) = generated(settings, n);
        let mut played = 0;

        loop {
            play_out(&engine, &mut t, &results, &mut played)?;
            match engine.execute(&mut t, Command::GenerateNextSwissRound, now()) {
                Ok(_) => {}
                Err(EngineError::AllRoundsPlayed { .. }) => break,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }

        let pairs = played_pairs(&t.matches);
        let distinct: HashSet<_> = pairs.iter().copied().collect();
        prop_assert_eq!(distinct.len(), pairs.len(), "no pair meets twice");
        prop_assert_eq!(t.current_round(), Some(rounds - 1));
        prop_assert!(engine.champion(&t).is_some());
    }

    #[test]
    fn test_standings_ignore_match_order(n in 3usize..=8, results in results_strategy()) {
        let (engine, mut t) = generated(TournamentSettings::new(TournamentFormat::RoundRobin), n);
        let mut played = 0;
        play_out(&engine, &mut t, &results, &mut played)?;

        let seeds = ranked_ids(&t.participants);
        let forward = compute_standings(t.matches.iter(), &seeds, TieBreak::HeadToHead);
        let backward = compute_standings(t.matches.iter().rev(), &seeds, TieBreak::HeadToHead);
        prop_assert_eq!(&forward, &backward);

        let ranks: Vec<usize> = forward.iter().map(|s| s.rank).collect();
        prop_assert_eq!(ranks, (1..=n).collect::<Vec<_>>());
        let wins: u32 = forward.iter().map(|s| s.won).sum();
        prop_assert_eq!(wins as usize, n * (n - 1) / 2);
    }

    #[test]
    fn test_group_positions_stay_in_group_band(n in 4usize..=20, size in 2usize..=6) {
        let settings = TournamentSettings::new(TournamentFormat::GroupKnockout).with_group_size(size);
        let engine = TournamentEngine::default();
        let mut t = tournament(settings, n);

        // A draw that leaves a group below two members is refused outright.
        if engine.execute(&mut t, Command::GenerateBracket, now()).is_err() {
            return Ok(());
        }
        for m in &t.matches {
            if let Section::Group(group) = m.section {
                prop_assert_eq!(m.position / 100, group as u32);
            }
        }
    }
}
