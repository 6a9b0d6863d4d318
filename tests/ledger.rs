use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveDateTime};

use tournament_rating::config::settings::RatingSettings;
use tournament_rating::database::{self, create_memory_pool};
use tournament_rating::domain::{
    MatchRecord, NewMatch, NewParticipant, ParticipantSlot, PlayerState, ReplayScope,
};
use tournament_rating::errors::{RatingError, ValidationError, WarningKind};
use tournament_rating::rating::Points;
use tournament_rating::services::ledger::RatingLedger;

fn ledger_with(settings: RatingSettings) -> RatingLedger {
    RatingLedger::open(create_memory_pool().unwrap(), settings).unwrap()
}

fn ledger() -> RatingLedger {
    ledger_with(RatingSettings::default())
}

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, day)
        .unwrap()
        .and_hms_opt(19, 0, 0)
        .unwrap()
}

fn new_match(group_id: i64, day: u32, results: &[(i64, u8)]) -> NewMatch {
    NewMatch {
        group_id,
        played_at: at(day),
        sequence_number: None,
        participants: results
            .iter()
            .map(|&(player_id, placement)| NewParticipant {
                player_id,
                placement,
                minor_points: placement as f64 * 1.5,
            })
            .collect(),
    }
}

fn pts(value: f64) -> Points {
    Points::round_from(value).unwrap()
}

/// Everything but the update timestamp, which differs between runs.
fn aggregates(state: &PlayerState) -> (i64, Points, u32, Points, u32) {
    (
        state.id,
        state.rating,
        state.matches_played,
        state.minor_points_total,
        state.major_point_wins,
    )
}

fn all_players(ledger: &RatingLedger) -> Vec<(i64, Points, u32, Points, u32)> {
    let (rows, _) = ledger.leaderboard(1000).unwrap();
    let mut players: Vec<_> = rows
        .iter()
        .map(aggregates)
        .collect();
    players.sort_by_key(|p| p.0);
    players
}

fn all_matches(ledger: &RatingLedger, player_ids: &[i64]) -> Vec<MatchRecord> {
    let mut records: Vec<MatchRecord> = Vec::new();
    for &id in player_ids {
        for record in ledger.player_matches(id).unwrap() {
            if !records.iter().any(|r| r.id == record.id) {
                records.push(record);
            }
        }
    }
    records.sort_by_key(|r| r.id);
    records
}

#[test]
fn test_two_player_scenario() {
    let ledger = ledger();
    let outcome = ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();

    let slots = &outcome.record.slots;
    assert_eq!(slots[0].rating_before, pts(1200.0));
    assert_eq!(slots[0].rating_delta, pts(16.0));
    assert_eq!(slots[1].rating_delta, pts(-16.0));
    assert!(outcome.warnings.is_empty());

    assert_eq!(ledger.player(1).unwrap().rating, pts(1216.0));
    assert_eq!(ledger.player(2).unwrap().rating, pts(1184.0));
    assert_eq!(outcome.record.major_point_player_id(), Some(1));
}

#[test]
fn test_four_player_scenario() {
    let ledger = ledger();
    let outcome = ledger
        .insert_match(new_match(1, 1, &[(10, 1), (11, 2), (12, 3), (13, 4)]))
        .unwrap();

    let deltas: Vec<Points> = outcome.record.slots.iter().map(|s| s.rating_delta).collect();
    assert_eq!(deltas, vec![pts(16.0), pts(5.44), pts(-5.44), pts(-16.0)]);

    assert_eq!(ledger.player(11).unwrap().rating, pts(1205.44));
    assert_eq!(ledger.player(12).unwrap().rating, pts(1194.56));
    assert_eq!(ledger.player(10).unwrap().major_point_wins, 1);
    assert_eq!(ledger.player(13).unwrap().major_point_wins, 0);
}

#[test]
fn test_every_slot_satisfies_after_equals_before_plus_delta() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 1, &[(1, 2), (2, 1), (3, 3)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(1, 1), (3, 2), (4, 4), (2, 3)])).unwrap();
    ledger.insert_match(new_match(1, 3, &[(4, 1), (2, 2)])).unwrap();

    for day in 4..=24 {
        let winner = if day % 3 == 0 { 2 } else { 1 };
        ledger
            .insert_match(new_match(2, day, &[(winner, 1), (3 - winner, 2)]))
            .unwrap();
    }

    for record in all_matches(&ledger, &[1, 2, 3, 4]) {
        for slot in &record.slots {
            assert_eq!(
                slot.rating_after - slot.rating_before,
                slot.rating_delta,
                "match {}",
                record.id
            );
        }
    }
}

#[test]
fn test_delete_restores_decimal_minor_points_exactly() {
    let ledger = ledger();
    let decimal_match = |day, minor_points| NewMatch {
        group_id: 1,
        played_at: at(day),
        sequence_number: None,
        participants: vec![
            NewParticipant {
                player_id: 1,
                placement: 1,
                minor_points,
            },
            NewParticipant {
                player_id: 2,
                placement: 2,
                minor_points: 0.3,
            },
        ],
    };

    ledger.insert_match(decimal_match(1, 0.1)).unwrap();
    let before = ledger.player(1).unwrap();
    assert_eq!(before.minor_points_total, pts(0.1));

    let second = ledger.insert_match(decimal_match(2, 0.2)).unwrap();
    assert_eq!(ledger.player(1).unwrap().minor_points_total, pts(0.3));
    ledger.delete_match(second.record.id).unwrap();

    assert_eq!(aggregates(&ledger.player(1).unwrap()), aggregates(&before));
}

#[test]
fn test_sequence_numbers_are_assigned_per_group() {
    let ledger = ledger();
    let first = ledger.insert_match(new_match(5, 1, &[(1, 1), (2, 2)])).unwrap();
    let second = ledger.insert_match(new_match(5, 1, &[(1, 2), (2, 1)])).unwrap();
    let other = ledger.insert_match(new_match(6, 1, &[(3, 1), (4, 2)])).unwrap();

    assert_eq!(first.record.sequence_number, 1);
    assert_eq!(second.record.sequence_number, 2);
    assert_eq!(other.record.sequence_number, 1);
}

#[test]
fn test_insert_then_delete_restores_previous_state() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2), (3, 3)])).unwrap();
    let before = all_players(&ledger);

    let inserted = ledger.insert_match(new_match(1, 2, &[(3, 1), (1, 2)])).unwrap();
    assert_ne!(all_players(&ledger), before);

    let deleted = ledger.delete_match(inserted.record.id).unwrap();

    assert!(deleted.warnings.is_empty());
    assert_eq!(all_players(&ledger), before);
    assert!(matches!(
        ledger.match_record(inserted.record.id),
        Err(RatingError::MatchNotFound(_))
    ));
}

#[test]
fn test_deleting_non_latest_match_diverges_from_replay() {
    let ledger = ledger();
    let older = ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(1, 1), (3, 2)])).unwrap();

    let deleted = ledger.delete_match(older.record.id).unwrap();
    assert_eq!(deleted.warnings.len(), 1);
    assert_eq!(deleted.warnings[0].player_id, 1);
    assert_eq!(deleted.warnings[0].kind, WarningKind::DeletedNonLatest);

    // The snapshot reversal throws away the later win as well.
    let incremental = ledger.player(1).unwrap();
    assert_eq!(incremental.rating, pts(1200.0));
    assert_eq!(incremental.matches_played, 1);

    ledger.recalculate(ReplayScope::All).unwrap();
    let replayed = ledger.player(1).unwrap();
    assert_eq!(replayed.rating, pts(1216.0));
    assert_ne!(incremental.rating, replayed.rating);
}

#[test]
fn test_automatic_replay_on_out_of_order_delete() {
    let settings = RatingSettings {
        replay_on_out_of_order: true,
        ..RatingSettings::default()
    };
    let ledger = ledger_with(settings);
    let older = ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(1, 1), (3, 2)])).unwrap();

    let deleted = ledger.delete_match(older.record.id).unwrap();

    assert!(deleted.warnings.is_empty());
    assert_eq!(deleted.replayed.map(|s| s.matches_replayed), Some(1));
    assert_eq!(ledger.player(1).unwrap().rating, pts(1216.0));
}

#[test]
fn test_backdated_insert_is_flagged() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 10, &[(1, 1), (2, 2)])).unwrap();

    let backdated = ledger.insert_match(new_match(1, 3, &[(2, 1), (3, 2)])).unwrap();

    assert_eq!(backdated.warnings.len(), 1);
    assert_eq!(backdated.warnings[0].player_id, 2);
    assert_eq!(backdated.warnings[0].kind, WarningKind::BackdatedInsert);
    assert!(backdated.replayed.is_none());
}

#[test]
fn test_backdated_insert_with_automatic_replay_matches_full_replay() {
    let settings = RatingSettings {
        replay_on_out_of_order: true,
        ..RatingSettings::default()
    };
    let ledger = ledger_with(settings);
    ledger.insert_match(new_match(1, 10, &[(1, 1), (2, 2)])).unwrap();
    let backdated = ledger.insert_match(new_match(1, 3, &[(2, 1), (1, 2)])).unwrap();

    assert!(backdated.replayed.is_some());
    assert_eq!(backdated.record.slots[0].rating_before, pts(1200.0));

    let after_insert = all_players(&ledger);
    ledger.recalculate(ReplayScope::All).unwrap();
    assert_eq!(all_players(&ledger), after_insert);
}

#[test]
fn test_recalculate_is_idempotent() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 5, &[(1, 1), (2, 2), (3, 3), (4, 4)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(2, 1), (4, 2)])).unwrap();
    ledger.insert_match(new_match(2, 3, &[(3, 1), (1, 3), (4, 2)])).unwrap();
    ledger.insert_match(new_match(2, 1, &[(1, 1), (3, 2)])).unwrap();

    let first = ledger.recalculate(ReplayScope::All).unwrap();
    let players_first = all_players(&ledger);
    let matches_first = all_matches(&ledger, &[1, 2, 3, 4]);

    let second = ledger.recalculate(ReplayScope::All).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.matches_replayed, 4);
    assert_eq!(first.players_reset, 4);
    assert_eq!(all_players(&ledger), players_first);
    assert_eq!(all_matches(&ledger, &[1, 2, 3, 4]), matches_first);
}

#[test]
fn test_replay_counts_match_participation() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(1, 2), (2, 1), (3, 3)])).unwrap();
    ledger.insert_match(new_match(1, 3, &[(3, 1), (1, 2)])).unwrap();

    ledger.recalculate(ReplayScope::All).unwrap();

    for id in 1..=3 {
        let state = ledger.player(id).unwrap();
        let played = ledger.player_matches(id).unwrap().len() as u32;
        assert_eq!(state.matches_played, played);
    }
    assert_eq!(ledger.player(1).unwrap().major_point_wins, 1);
    assert_eq!(ledger.player(1).unwrap().minor_points_total, pts(7.5));
}

#[test]
fn test_group_replay_only_touches_group_players() {
    let ledger = ledger();
    ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();
    ledger.insert_match(new_match(2, 1, &[(3, 1), (4, 2)])).unwrap();
    let outsider = ledger.player(3).unwrap();

    let summary = ledger.recalculate(ReplayScope::Group(1)).unwrap();

    assert_eq!(summary.matches_replayed, 1);
    assert_eq!(summary.players_reset, 2);
    assert_eq!(aggregates(&ledger.player(3).unwrap()), aggregates(&outsider));
    assert_eq!(ledger.player(1).unwrap().rating, pts(1216.0));
}

#[test]
fn test_invalid_match_leaves_no_trace() {
    let ledger = ledger();
    let err = ledger
        .insert_match(new_match(1, 1, &[(1, 1), (2, 1)]))
        .unwrap_err();

    assert!(matches!(
        err,
        RatingError::Validation(ValidationError::DuplicatePlacement(1))
    ));
    assert!(matches!(ledger.player(1), Err(RatingError::PlayerNotFound(1))));
    assert_eq!(ledger.leaderboard(10).unwrap(), (Vec::new(), 0));

    let lonely = ledger.insert_match(new_match(1, 1, &[(1, 1)])).unwrap_err();
    assert!(matches!(
        lonely,
        RatingError::Validation(ValidationError::InvalidParticipantCount(1))
    ));
}

#[test]
fn test_non_finite_minor_points_are_rejected() {
    let ledger = ledger();
    let mut bad = new_match(1, 1, &[(1, 1), (2, 2)]);
    bad.participants[1].minor_points = f64::INFINITY;

    let err = ledger.insert_match(bad).unwrap_err();
    assert!(matches!(
        err,
        RatingError::Validation(ValidationError::NonFiniteMinorPoints { player_id: 2 })
    ));
}

#[test]
fn test_unknown_ids_are_not_found() {
    let ledger = ledger();
    assert!(matches!(ledger.delete_match(42), Err(RatingError::MatchNotFound(42))));
    assert!(matches!(ledger.player(7), Err(RatingError::PlayerNotFound(7))));
    assert!(matches!(ledger.player_matches(7), Err(RatingError::PlayerNotFound(7))));
}

#[test]
fn test_aborted_replay_keeps_prior_state() {
    let pool = create_memory_pool().unwrap();
    let ledger = RatingLedger::open(pool.clone(), RatingSettings::default()).unwrap();
    ledger.insert_match(new_match(1, 1, &[(1, 1), (2, 2)])).unwrap();
    ledger.insert_match(new_match(1, 2, &[(2, 1), (1, 2)])).unwrap();
    ledger.insert_match(new_match(1, 3, &[(1, 1), (2, 2)])).unwrap();
    let before = all_players(&ledger);

    // A corrupt record written behind the ledger's back.
    let corrupt_id = {
        let conn = database::get_connection(&pool).unwrap();
        let slot = |player_id| ParticipantSlot {
            player_id,
            placement: 1,
            minor_points: Points::ZERO,
            rating_before: pts(1200.0),
            rating_after: pts(1200.0),
            rating_delta: Points::ZERO,
            k_factor_used: 32.0,
        };
        let record = MatchRecord {
            id: 0,
            group_id: 1,
            sequence_number: 99,
            played_at: at(2),
            slots: vec![slot(1), slot(2)],
        };
        database::matches::insert_match(&conn, &record).unwrap()
    };

    let err = ledger.recalculate(ReplayScope::All).unwrap_err();

    match err {
        RatingError::ReplayAborted { match_id, source } => {
            assert_eq!(match_id, corrupt_id);
            assert_eq!(source, ValidationError::DuplicatePlacement(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(all_players(&ledger), before);
}

#[test]
fn test_concurrent_inserts_do_not_lose_updates() {
    let ledger = Arc::new(ledger());
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for round in 0..5 {
                    let winner = 1 + ((worker + round) % 3) as i64;
                    let others: Vec<i64> = (1..=3).filter(|&p| p != winner).collect();
                    let results = [(winner, 1), (others[0], 2), (others[1], 3)];
                    ledger
                        .insert_match(new_match(1, 1 + round as u32, &results))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for id in 1..=3 {
        assert_eq!(ledger.player(id).unwrap().matches_played, 20);
    }
    let wins: u32 = (1..=3)
        .map(|id| ledger.player(id).unwrap().major_point_wins)
        .sum();
    assert_eq!(wins, 20);
}
