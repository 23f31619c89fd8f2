//! End-to-end tests for the headless runner.

use hk_core::map_generation::MapConfig;
use hk_headless::{
    run_batch, verify_determinism, BatchConfig, BatchResults, BotKind, MatchConfig, MatchRunner,
};
use hk_test_utils::determinism::{fingerprint, verify_parallel_determinism};

fn quick_config() -> MatchConfig {
    MatchConfig {
        map: MapConfig::small().with_round_limit(25),
        ..MatchConfig::default()
    }
}

#[test]
fn batch_results_are_in_seed_order_and_independent_of_threads() {
    let config = BatchConfig::new(quick_config(), 6).with_seed(100);
    let parallel = run_batch(config.clone());
    let serial = run_batch(config.with_parallelism(1));

    assert!(parallel.errors.is_empty());
    assert_eq!(parallel.games.len(), 6);
    let seeds: Vec<u64> = parallel.games.iter().map(|game| game.seed).collect();
    assert_eq!(seeds, (100..106).collect::<Vec<_>>());
    assert_eq!(parallel.games, serial.games);
    assert_eq!(parallel.summary, serial.summary);
}

#[test]
fn batch_summary_accounts_for_every_game() {
    let results = run_batch(BatchConfig::new(quick_config(), 4).with_seed(7));
    let summary = &results.summary;

    let wins: u32 = summary.wins_by_bot.values().sum();
    assert_eq!(wins + summary.draws, summary.total_games);
    assert_eq!(summary.wins_by_seat.iter().sum::<u32>(), wins);
    assert!(summary.min_rounds <= summary.max_rounds);
    assert!(summary.max_rounds <= 25);
}

#[test]
fn batch_results_survive_a_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let results = run_batch(
        BatchConfig::new(quick_config(), 2).with_output(dir.path().to_path_buf()),
    );
    let path = dir.path().join("nested").join("batch.json");

    results.save(&path).unwrap();
    let loaded = BatchResults::load(&path).unwrap();
    assert_eq!(loaded.games, results.games);
    assert_eq!(loaded.summary.total_games, 2);
}

#[test]
fn verify_reports_identical_hashes() {
    let report = verify_determinism(&quick_config().with_seed(31), 3).unwrap();
    assert!(report.is_deterministic);
    assert_eq!(report.hashes.len(), 3);
    assert!(report.hashes.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn matches_on_threads_do_not_share_state() {
    let config = quick_config().with_seed(5);
    let result = verify_parallel_determinism(
        4,
        20,
        || MatchRunner::new(&config).unwrap(),
        |runner| {
            if !runner.is_finished() {
                runner.play_turn().unwrap();
            }
        },
        |runner| fingerprint(runner.state()),
    );
    result.assert_deterministic();
}

#[test]
fn four_seat_match_finishes() {
    let config = MatchConfig {
        map: MapConfig::medium().with_round_limit(30),
        ..MatchConfig::default()
    }
    .with_seats(vec![
        BotKind::Rules,
        BotKind::Rules,
        BotKind::SlightlyRandom,
        BotKind::Random,
    ]);

    let result = MatchRunner::new(&config).unwrap().run().unwrap();
    assert_eq!(result.seats.len(), 4);
    assert!(result.rounds <= 30);
    for seat in &result.seats[..2] {
        assert_eq!(seat.bot, "RulesBot");
        assert_eq!(seat.orders_rejected, 0);
    }
}

#[test]
fn bundled_match_files_load() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("matches");
    let duel = MatchConfig::load(dir.join("duel.ron")).unwrap();
    assert_eq!(duel.seats, vec![BotKind::Rules, BotKind::SlightlyRandom]);

    let ffa = MatchConfig::load(dir.join("free_for_all.ron")).unwrap();
    assert_eq!(ffa.seats.len(), 4);
    assert_eq!(ffa.map.players, 4);
}
