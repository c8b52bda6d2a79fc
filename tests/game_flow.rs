//! End-to-end rounds driven through the public API on a virtual clock.

use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use memory_cards::{
    BestScore, CardState, FileStore, Game, GameConfig, GameEvent, Ignored, KeyValueStore,
    ManualScheduler, MemoryStore, RecordingSink, Selection, TOTAL_PAIRS,
};

struct Table {
    game: Game,
    scheduler: Rc<ManualScheduler>,
    sink: Rc<RecordingSink>,
}

fn table_with(store: Rc<dyn KeyValueStore>, seed: u64) -> Table {
    let scheduler = Rc::new(ManualScheduler::new());
    let sink = Rc::new(RecordingSink::new());
    let game = Game::new(GameConfig::default(), scheduler.clone(), store, sink.clone())
        .unwrap()
        .with_rng(Box::new(StdRng::seed_from_u64(seed)));
    Table {
        game,
        scheduler,
        sink,
    }
}

fn table() -> Table {
    table_with(Rc::new(MemoryStore::new()), 42)
}

fn face_down_positions(game: &Game) -> Vec<usize> {
    game.round()
        .cards()
        .iter()
        .filter(|card| card.state == CardState::FaceDown)
        .map(|card| card.position)
        .collect()
}

fn mismatched_pair(game: &Game) -> (usize, usize) {
    let round = game.round();
    let down = face_down_positions(game);
    let first = down[0];
    let second = down
        .iter()
        .copied()
        .find(|&p| round.cards()[p].symbol != round.cards()[first].symbol)
        .unwrap();
    (first, second)
}

fn match_next_pair(game: &Game) -> Selection {
    let first = face_down_positions(game)[0];
    let second = game.round().partner_of(first).unwrap();
    game.select(first);
    game.select(second)
}

/// Play a whole round with `mismatches` wrong guesses, finishing at exactly
/// `seconds` on the clock.
fn play_round(t: &Table, mismatches: u32, seconds: u64) {
    t.game.start_round();
    let started = t.scheduler.now();
    for _ in 0..mismatches {
        let (a, b) = mismatched_pair(&t.game);
        t.game.select(a);
        t.game.select(b);
        t.scheduler.advance(Duration::from_millis(800));
    }
    let spent = t.scheduler.now() - started;
    t.scheduler.advance(Duration::from_secs(seconds) - spent);
    for _ in 0..TOTAL_PAIRS {
        match_next_pair(&t.game);
    }
    assert!(!t.game.is_active());
}

#[test]
fn perfect_round_takes_eight_moves() {
    let t = table();
    play_round(&t, 0, 10);
    assert_eq!(t.game.move_count(), 8);
    assert_eq!(t.game.matched_pairs(), 8);
    assert_eq!(t.game.round().count_in(CardState::Matched), 16);
}

#[test]
fn best_score_keeps_the_fewest_moves() {
    let store = Rc::new(MemoryStore::new());
    let t = table_with(store.clone(), 7);

    play_round(&t, 4, 45);
    assert_eq!(
        t.game.best_score(),
        Some(BestScore {
            moves: 12,
            time_seconds: 45
        })
    );
    assert!(t.game.last_summary().unwrap().new_record);

    play_round(&t, 7, 30);
    assert_eq!(t.game.move_count(), 15);
    assert_eq!(t.game.best_score().map(|b| (b.moves, b.time_seconds)), Some((12, 45)));
    let summary = t.game.last_summary().unwrap();
    assert!(!summary.new_record);
    assert_eq!(
        summary.message(),
        "You matched all 8 pairs in 00:30 with 15 moves! (Best: 12 moves)"
    );

    play_round(&t, 1, 60);
    assert_eq!(
        t.game.best_score(),
        Some(BestScore {
            moves: 9,
            time_seconds: 60
        })
    );
    assert_eq!(
        store.raw("memoryCardBestScore").as_deref(),
        Some(r#"{"moves":9,"time":60}"#)
    );
}

#[test]
fn equal_moves_do_not_replace_the_record() {
    let store = Rc::new(MemoryStore::new());
    let t = table_with(store.clone(), 3);
    play_round(&t, 2, 50);
    play_round(&t, 2, 20);
    assert_eq!(
        t.game.best_score(),
        Some(BestScore {
            moves: 10,
            time_seconds: 50
        })
    );
    assert!(!t.game.last_summary().unwrap().new_record);
}

#[test]
fn round_completes_exactly_on_the_eighth_pair() {
    let t = table();
    t.game.start_round();
    for _ in 0..TOTAL_PAIRS - 1 {
        match_next_pair(&t.game);
        assert!(t.game.is_active());
        assert!(t.game.timer_running());
    }
    assert!(matches!(
        match_next_pair(&t.game),
        Selection::Matched {
            round_complete: true,
            ..
        }
    ));
    assert!(!t.game.is_active());
    assert!(!t.game.timer_running());
    assert_eq!(t.sink.summaries().len(), 1);
}

#[test]
fn clock_stops_when_the_round_is_won() {
    let t = table();
    play_round(&t, 0, 12);
    assert_eq!(t.game.elapsed_seconds(), 12);
    t.scheduler.advance(Duration::from_secs(30));
    assert_eq!(t.game.elapsed_seconds(), 12);
    assert_eq!(t.scheduler.pending(), 0);
}

#[test]
fn selections_after_the_win_are_ignored() {
    let t = table();
    play_round(&t, 0, 5);
    assert_eq!(t.game.select(0), Selection::Ignored(Ignored::Inactive));
    assert_eq!(t.game.move_count(), 8);
}

#[test]
fn double_select_counts_no_move() {
    let t = table();
    t.game.start_round();
    t.game.select(3);
    assert_eq!(t.game.select(3), Selection::Ignored(Ignored::AlreadyPending));
    let round = t.game.round();
    assert_eq!(round.move_count(), 0);
    assert_eq!(round.face_up_count(), 1);
    assert_eq!(round.card(3).unwrap().state, CardState::FaceUp);
}

#[test]
fn mismatch_flips_back_and_unlocks() {
    let t = table();
    t.game.start_round();
    let (a, b) = mismatched_pair(&t.game);
    t.game.select(a);
    assert_eq!(t.game.select(b), Selection::Mismatched { first: a, second: b });

    let third = face_down_positions(&t.game)[0];
    assert_eq!(t.game.select(third), Selection::Ignored(Ignored::Locked));

    t.scheduler.advance(Duration::from_millis(800));
    let round = t.game.round();
    assert_eq!(round.card(a).unwrap().state, CardState::FaceDown);
    assert_eq!(round.card(b).unwrap().state, CardState::FaceDown);
    assert!(!round.is_locked());
    assert_eq!(round.move_count(), 1);
    assert_eq!(round.matched_pairs(), 0);
    assert!(t.game.select(third).is_accepted());
}

#[test]
fn restart_mid_mismatch_does_not_touch_new_board() {
    let t = table();
    t.game.start_round();
    let (a, b) = mismatched_pair(&t.game);
    t.game.select(a);
    t.game.select(b);
    t.scheduler.advance(Duration::from_millis(400));

    t.game.start_round();
    let pair_first = face_down_positions(&t.game)[0];
    let partner = t.game.round().partner_of(pair_first).unwrap();
    t.game.select(pair_first);
    t.scheduler.advance(Duration::from_millis(400));

    let round = t.game.round();
    assert_eq!(round.card(pair_first).unwrap().state, CardState::FaceUp);
    assert!(!round.is_locked());
    assert!(!t
        .sink
        .events()
        .iter()
        .any(|event| matches!(event, GameEvent::CardsHidden { .. })));
    assert!(matches!(t.game.select(partner), Selection::Matched { .. }));
}

#[test]
fn display_receives_formatted_counters() {
    let t = table();
    t.game.start_round();
    t.sink.take();
    t.scheduler.advance(Duration::from_secs(65));
    match_next_pair(&t.game);

    let texts: Vec<String> = t
        .sink
        .events()
        .iter()
        .filter_map(GameEvent::display_text)
        .collect();
    assert!(texts.contains(&"01:05".to_string()));
    assert!(texts.contains(&"1".to_string()));
    assert!(texts.contains(&"1 / 8".to_string()));
}

#[test]
fn unavailable_storage_does_not_disturb_play() {
    let t = table_with(Rc::new(MemoryStore::unavailable()), 9);
    play_round(&t, 3, 40);
    let summary = t.game.last_summary().unwrap();
    assert_eq!(summary.moves, 11);
    assert!(!summary.new_record);
    assert_eq!(
        summary.message(),
        "You matched all 8 pairs in 00:40 with 11 moves!"
    );
    assert_eq!(summary.previous_best, None);
    assert_eq!(t.game.best_score(), None);
    assert!(!t.game.is_active());
}

#[test]
fn blocked_writes_keep_the_old_record_and_say_so() {
    let store = Rc::new(MemoryStore::new());
    store.insert_raw("memoryCardBestScore", r#"{"moves":20,"time":99}"#);
    store.block_writes(true);
    let t = table_with(store.clone(), 4);
    play_round(&t, 1, 15);

    let summary = t.game.last_summary().unwrap();
    assert_eq!(summary.moves, 9);
    assert!(!summary.new_record);
    assert_eq!(
        t.game.best_score(),
        Some(BestScore {
            moves: 20,
            time_seconds: 99
        })
    );
    assert_eq!(
        store.raw("memoryCardBestScore").as_deref(),
        Some(r#"{"moves":20,"time":99}"#)
    );
}

#[test]
fn corrupt_record_reads_as_no_best() {
    let store = Rc::new(MemoryStore::new());
    store.insert_raw("memoryCardBestScore", "{\"moves\":");
    let t = table_with(store.clone(), 1);
    t.game.start_round();
    assert_eq!(t.game.best_score(), None);
    assert!(t.sink.events().contains(&GameEvent::BestScoreChanged(None)));
}

#[test]
fn file_store_carries_best_score_across_games() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory-cards").join("storage.json");

    let first = table_with(Rc::new(FileStore::new(&path)), 5);
    play_round(&first, 2, 33);
    drop(first);

    let second = table_with(Rc::new(FileStore::new(&path)), 6);
    assert_eq!(
        second.game.best_score(),
        Some(BestScore {
            moves: 10,
            time_seconds: 33
        })
    );
}

#[test]
fn custom_timings_are_honoured() {
    let config = GameConfig::from_json(r#"{ "mismatch_delay_ms": 300, "tick_interval_ms": 500 }"#)
        .unwrap();
    let scheduler = Rc::new(ManualScheduler::new());
    let game = Game::new(
        config,
        scheduler.clone(),
        Rc::new(MemoryStore::new()),
        Rc::new(RecordingSink::new()),
    )
    .unwrap();
    game.start_round();
    let (a, b) = mismatched_pair(&game);
    game.select(a);
    game.select(b);
    scheduler.advance(Duration::from_millis(300));
    assert!(!game.is_locked());
    scheduler.advance(Duration::from_millis(1200));
    assert_eq!(game.elapsed_seconds(), 1);
    scheduler.advance(Duration::from_millis(500));
    assert_eq!(game.elapsed_seconds(), 2);
}
