//! Integration tests for the stage arena
//! Exercises registration, pairing, retention and purge behavior through the
//! public API with a hand-driven clock.

use proptest::prelude::*;
use stage_timing::{
    ArenaBuilder, ArenaConfig, ArenaError, Clock, ControlCommand, Cycle, ManualClock, StageArena,
    StageHistory, StageSpec,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Purged = Arc<Mutex<Vec<(String, StageHistory)>>>;

/// Route trace output through the test harness (RUST_LOG=stage_timing=trace)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Steady-state arena whose purge sink collects into a shared vector
fn steady_arena(stages: &[StageSpec]) -> (StageArena, ManualClock, Purged) {
    init_tracing();
    let clock = ManualClock::new(0.0);
    let purged: Purged = Arc::default();
    let sink = Arc::clone(&purged);

    let arena = StageArena::builder()
        .stages(stages.iter().cloned())
        .clock(clock.clone())
        .on_purge(move |name, snapshot| {
            sink.lock().unwrap().push((name.to_string(), snapshot));
        })
        .build()
        .unwrap();

    (arena, clock, purged)
}

fn live_arena(stages: &[StageSpec], capacity: usize) -> (StageArena, ManualClock) {
    init_tracing();
    let clock = ManualClock::new(0.0);
    let arena = StageArena::builder()
        .stages(stages.iter().cloned())
        .live_inspection(capacity)
        .clock(clock.clone())
        .build()
        .unwrap();
    (arena, clock)
}

#[test]
fn test_duplicate_registration_and_forced_reinit() {
    let (mut arena, clock) = live_arena(&[StageSpec::new("render")], 8);

    arena.start_stage("render");
    clock.set(2.0);
    arena.end_stage("render");

    let err = arena.initialize(["render"], false).unwrap_err();
    assert!(matches!(err, ArenaError::DuplicateStage(_)));
    assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 1);

    arena.initialize(["render"], true).unwrap();
    assert_eq!(arena.stage_data("render").unwrap(), &StageHistory::default());
}

#[test]
fn test_sync_single_cycle() {
    let (mut arena, clock) = live_arena(&[StageSpec::new("render")], 8);

    arena.start_stage("render");
    clock.set(5.0);
    arena.end_stage("render");

    let history = arena.stage_data("render").unwrap();
    assert_eq!(history.lifetime_count, 1);
    assert_eq!(history.recent_cycles, vec![Cycle::new(0.0, 5.0)]);
}

#[test]
fn test_async_fifo_pairing() {
    let (mut arena, clock) = live_arena(&[StageSpec::asynchronous("fetch")], 8);

    clock.set(1.0);
    arena.start_stage("fetch");
    clock.set(2.0);
    arena.start_stage("fetch");
    clock.set(10.0);
    arena.end_stage("fetch");
    clock.set(12.0);
    arena.end_stage("fetch");

    let cycles: Vec<Cycle> = arena.stage_data("fetch").unwrap().iter().copied().collect();
    assert_eq!(cycles, vec![Cycle::new(1.0, 9.0), Cycle::new(2.0, 10.0)]);
}

#[test]
fn test_end_without_start_changes_nothing() {
    let (mut arena, _clock, purged) = steady_arena(&[StageSpec::new("render")]);

    arena.end_stage("render");
    arena.end_stage_at("render", 42.0);

    let history = arena.stage_data("render").unwrap();
    assert_eq!(history.lifetime_count, 0);
    assert!(history.is_empty());
    assert!(purged.lock().unwrap().is_empty());
}

#[test]
fn test_live_mode_keeps_most_recent() {
    let (mut arena, clock) = live_arena(&[StageSpec::new("render")], 3);

    for i in 0..10 {
        clock.set(i as f64 * 10.0);
        arena.start_stage("render");
        clock.advance(1.0);
        arena.end_stage("render");
    }

    let history = arena.stage_data("render").unwrap();
    assert_eq!(history.lifetime_count, 10);
    let refs: Vec<f64> = history.iter().map(|c| c.ref_time).collect();
    assert_eq!(refs, vec![70.0, 80.0, 90.0]);
}

#[test]
fn test_steady_state_purges_each_cycle() {
    let (mut arena, clock, purged) = steady_arena(&[StageSpec::new("render")]);

    for i in 1..=3 {
        arena.start_stage("render");
        clock.advance(i as f64);
        arena.end_stage("render");
        assert!(arena.stage_data("render").unwrap().is_empty());
    }

    let purged = purged.lock().unwrap();
    assert_eq!(purged.len(), 3);
    let counts: Vec<u64> = purged.iter().map(|(_, s)| s.lifetime_count).collect();
    assert_eq!(counts, vec![1, 2, 3]);
    assert!(purged.iter().all(|(_, s)| s.len() == 1));
    assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 3);
    assert_eq!(arena.purged_count(), 3);
}

#[test]
fn test_purge_snapshot_is_independent() {
    let (mut arena, clock, purged) = steady_arena(&[StageSpec::new("render")]);

    arena.start_stage("render");
    clock.set(5.0);
    arena.end_stage("render");

    {
        let mut purged = purged.lock().unwrap();
        let snapshot = &mut purged[0].1;
        snapshot.lifetime_count = 1000;
        snapshot.recent_cycles.push_back(Cycle::new(0.0, 0.0));
    }

    let live = arena.stage_data("render").unwrap();
    assert_eq!(live.lifetime_count, 1);
    assert!(live.is_empty());
}

#[test]
fn test_reset_zeroes_lifetime_count() {
    let (mut arena, clock) = live_arena(&[StageSpec::new("render")], 4);

    arena.start_stage("render");
    clock.set(1.0);
    arena.end_stage("render");
    assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 1);

    arena.reset();
    assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 0);
}

#[test]
fn test_skip_recording_blocks_purge() {
    let (mut arena, clock, purged) = steady_arena(&[StageSpec::new("render")]);

    arena.set_skip_recording(true);
    arena.start_stage("render");
    clock.set(5.0);
    arena.end_stage("render");

    assert_eq!(arena.pending_depth("render"), 0);
    assert_eq!(arena.stage_data("render").unwrap().lifetime_count, 0);
    assert!(purged.lock().unwrap().is_empty());
}

#[test]
fn test_render_end_to_end() {
    let (mut arena, clock, purged) = steady_arena(&[StageSpec::sync("render")]);
    assert_eq!(arena.retention_mode().capacity(), 1);

    arena.start_stage("render");
    clock.set(5.0);
    arena.end_stage("render");

    let mut expected = StageHistory::default();
    expected.lifetime_count = 1;
    expected.recent_cycles.push_back(Cycle::new(0.0, 5.0));

    let purged = purged.lock().unwrap();
    assert_eq!(purged.len(), 1);
    assert_eq!(purged[0], ("render".to_string(), expected));

    let live = arena.stage_data("render").unwrap();
    assert!(live.recent_cycles.is_empty());
    assert_eq!(live.lifetime_count, 1);
}

#[test]
fn test_build_from_json_config() {
    let config = ArenaConfig::from_json(
        r#"{
            "stages": [{ "name": "render" }, { "name": "fetch", "kind": "async" }],
            "liveInspection": true,
            "retentionCapacity": 2,
            "skipRecording": true
        }"#,
    )
    .unwrap();

    let clock = ManualClock::new(0.0);
    let mut arena = ArenaBuilder::from_config(config)
        .clock(clock.clone())
        .build()
        .unwrap();

    arena.start_stage("fetch");
    assert_eq!(arena.pending_depth("fetch"), 0);

    arena.apply(ControlCommand::SetSkipRecording(false));
    arena.start_stage("fetch");
    arena.start_stage("fetch");
    clock.set(3.0);
    arena.end_stage("fetch");
    assert_eq!(arena.pending_depth("fetch"), 1);

    let snapshot = arena.inspector().unwrap().snapshot();
    assert_eq!(snapshot.capacity, 2);
    assert_eq!(snapshot.get("fetch").unwrap().pending, 1);
}

#[test]
fn test_live_mode_needs_room_for_two_cycles() {
    let result = StageArena::builder()
        .stage("render")
        .live_inspection(1)
        .clock(ManualClock::new(0.0))
        .build();
    assert!(matches!(result, Err(ArenaError::InvalidCapacity(1))));
}

#[test]
fn test_async_interleaved_pairing() {
    let (mut arena, clock) = live_arena(&[StageSpec::asynchronous("fetch")], 8);

    let script = [
        (1.0, true),
        (2.0, true),
        (3.0, false),
        (4.0, true),
        (5.0, false),
        (9.0, false),
    ];
    for (at, start) in script {
        clock.set(at);
        if start {
            arena.start_stage("fetch");
        } else {
            arena.end_stage("fetch");
        }
    }

    let cycles: Vec<Cycle> = arena.stage_data("fetch").unwrap().iter().copied().collect();
    assert_eq!(
        cycles,
        vec![Cycle::new(1.0, 2.0), Cycle::new(2.0, 3.0), Cycle::new(4.0, 5.0)]
    );
    assert_eq!(arena.pending_depth("fetch"), 0);
}

#[test]
fn test_unregistered_stage_never_surfaces() {
    let (mut arena, _clock) = live_arena(&[StageSpec::new("render")], 4);

    arena.start_stage("ghost");
    arena.end_stage("ghost");

    assert!(arena.stage_data("ghost").is_none());
    assert_eq!(arena.pending_depth("ghost"), 0);
    assert_eq!(arena.stages().len(), 1);
}

/// One step of a random stage workload
#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    End,
    Tick(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::End),
        (1u8..20).prop_map(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn prop_live_history_bounded_and_recent(
        capacity in 2usize..16,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let (mut arena, clock) = live_arena(&[StageSpec::new("render")], capacity);
        let mut all_cycles = Vec::new();
        let mut open: Option<f64> = None;

        for op in ops {
            match op {
                Op::Start => {
                    open = Some(clock.now());
                    arena.start_stage("render");
                }
                Op::End => {
                    arena.end_stage("render");
                    if let Some(start) = open.take() {
                        all_cycles.push(Cycle::new(start, clock.now() - start));
                    }
                }
                Op::Tick(delta) => clock.advance(f64::from(delta)),
            }

            let history = arena.stage_data("render").unwrap();
            prop_assert!(history.len() <= capacity);
            prop_assert_eq!(history.lifetime_count, all_cycles.len() as u64);
        }

        let history = arena.stage_data("render").unwrap();
        let expected: Vec<Cycle> = all_cycles
            .iter()
            .copied()
            .skip(all_cycles.len().saturating_sub(capacity))
            .collect();
        let actual: Vec<Cycle> = history.iter().copied().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_async_interleaving_pairs_fifo(
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let (mut arena, clock) = live_arena(&[StageSpec::asynchronous("fetch")], 256);
        let mut open: VecDeque<f64> = VecDeque::new();
        let mut expected = Vec::new();

        for op in ops {
            match op {
                Op::Start => {
                    open.push_back(clock.now());
                    arena.start_stage("fetch");
                }
                Op::End => {
                    arena.end_stage("fetch");
                    if let Some(start) = open.pop_front() {
                        expected.push(Cycle::new(start, clock.now() - start));
                    }
                }
                Op::Tick(delta) => clock.advance(f64::from(delta)),
            }
            prop_assert_eq!(arena.pending_depth("fetch"), open.len());
        }

        let actual: Vec<Cycle> = arena.stage_data("fetch").unwrap().iter().copied().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_async_pairs_in_start_order(
        starts in prop::collection::vec(0u16..1000, 1..32),
        close_at in 1000u16..2000,
    ) {
        let (mut arena, clock) = live_arena(&[StageSpec::asynchronous("fetch")], 64);
        let mut start_times: Vec<f64> = starts.iter().map(|&t| f64::from(t)).collect();
        start_times.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for &t in &start_times {
            clock.set(t);
            arena.start_stage("fetch");
        }
        for &t in &start_times {
            arena.end_stage_at("fetch", f64::from(close_at));
            let last = *arena.stage_data("fetch").unwrap().last_cycle().unwrap();
            prop_assert_eq!(last, Cycle::new(t, f64::from(close_at) - t));
        }
        prop_assert_eq!(arena.pending_depth("fetch"), 0);
    }
}
