//! End-to-end progression scenarios (v0.4.0).

use ascend_common::graduation::standard_criteria;
use ascend_common::{
    synthesize, Capstone, Command, ContentCatalog, EngineError, EventKind, GraduationReport,
    LearnerIdentity, LearnerState, LearnerStore, Level, Reducer, SimulationView, StaticCatalog,
};

fn store() -> LearnerStore {
    LearnerStore::new(LearnerIdentity::new("learner-1", "Grace"))
}

const CATALOG: &str = r#"
    [[tasks]]
    id = "orientation"
    xp_reward = 50
    required = true

    [[tasks]]
    id = "shadowing"
    xp_reward = 750
    required = true

    [[tasks]]
    id = "final_review"
    xp_reward = 1500
    required = true

    [[lessons]]
    id = "safety"
    xp_reward = 200

    [[scenarios]]
    id = "customer_call"
    xp_cap = 300

    [[scenarios.steps]]
    prompt = "An angry customer calls."
    [[scenarios.steps.options]]
    id = "listen"
    score_impact = 25
    [[scenarios.steps.options]]
    id = "argue"
    score_impact = -40

    [[scenarios.steps]]
    prompt = "They ask for a refund."
    [[scenarios.steps.options]]
    id = "escalate"
    score_impact = 25
    [[scenarios.steps.options]]
    id = "refuse"
    score_impact = -30

    [capstone]
    kind = "simulation"
    id = "customer_call"
"#;

#[test]
fn test_first_tasks_reach_journeyman() {
    let mut store = store();

    store.apply(&Command::submit_task("orientation", 50)).unwrap();
    assert_eq!(store.state().xp(), 50);
    assert_eq!(store.state().level(), Level::Apprentice);

    store.apply(&Command::submit_task("shadowing", 750)).unwrap();
    assert_eq!(store.state().xp(), 800);
    assert_eq!(store.state().level(), Level::Journeyman);

    let newest = synthesize(store.state().events()).next().unwrap();
    assert_eq!(newest.title, "Level up!");
}

#[test]
fn test_streak_over_four_days() {
    let mut store = store();
    let mut seen = Vec::new();
    for active in [true, true, false, true] {
        store.apply(&Command::advance_streak(active, true)).unwrap();
        seen.push(store.state().streak());
    }
    assert_eq!(seen, vec![1, 2, 0, 1]);
    assert_eq!(store.state().best_streak(), 2);

    let resets: Vec<_> = store
        .state()
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::StreakReset { previous: 2 }))
        .collect();
    assert_eq!(resets.len(), 1);
}

#[test]
fn test_same_day_activity_does_not_double_count() {
    let mut store = store();
    store.apply(&Command::advance_streak(true, true)).unwrap();
    store.apply(&Command::advance_streak(true, false)).unwrap();
    store.apply(&Command::advance_streak(false, false)).unwrap();
    assert_eq!(store.state().streak(), 1);
}

#[test]
fn test_three_day_milestone() {
    let mut store = store();
    let mut milestone_events = Vec::new();
    for _ in 0..3 {
        let events = store.apply(&Command::advance_streak(true, true)).unwrap();
        milestone_events.extend(
            events
                .into_iter()
                .filter(|e| matches!(e.kind, EventKind::StreakMilestone { .. })),
        );
    }
    assert_eq!(milestone_events.len(), 1);
    assert_eq!(milestone_events[0].kind, EventKind::StreakMilestone { days: 3 });
}

fn run_scenario(choices: &[i32], cap: i64) -> u64 {
    let mut store = store();
    store
        .apply(&Command::start_simulation("drill", choices.len()))
        .unwrap();
    for (index, impact) in choices.iter().enumerate() {
        store
            .apply(&Command::record_choice(&format!("o{}", index), *impact))
            .unwrap();
        store.apply(&Command::AdvanceSimulationStep).unwrap();
    }
    store.apply(&Command::complete_simulation(cap)).unwrap();
    assert!(store.state().active_run().is_none());
    store.state().xp()
}

#[test]
fn test_simulation_payouts() {
    assert_eq!(run_scenario(&[30, 30], 300), 300);
    assert_eq!(run_scenario(&[-80], 300), 0);
    assert_eq!(run_scenario(&[10, -10], 300), 150);
    // 125 * 0.5 = 62.5 rounds up
    assert_eq!(run_scenario(&[0], 125), 63);
}

#[test]
fn test_completing_before_final_step_is_rejected() {
    let mut store = store();
    store.apply(&Command::start_simulation("drill", 3)).unwrap();
    let before = store.snapshot();
    let err = store.apply(&Command::complete_simulation(300)).unwrap_err();
    assert!(matches!(err, EngineError::NotAtFinalStep { step: 1, total_steps: 3, .. }));
    assert_eq!(store.state(), &before);
}

#[test]
fn test_restarting_other_scenario_abandons_run() {
    let mut store = store();
    store.apply(&Command::start_simulation("a", 2)).unwrap();
    store.apply(&Command::record_choice("x", 10)).unwrap();

    store.apply(&Command::start_simulation("a", 2)).unwrap();
    assert_eq!(store.state().active_run().unwrap().score(), 60);

    let events = store.apply(&Command::start_simulation("b", 4)).unwrap();
    assert_eq!(events[0].kind.name(), "simulation_abandoned");
    assert_eq!(events[1].kind.name(), "simulation_started");
    let run = store.state().active_run().unwrap();
    assert_eq!(run.scenario_id(), "b");
    assert_eq!(run.score(), 50);
}

#[test]
fn test_graduation_flips_with_catalog_flow() {
    let catalog = StaticCatalog::from_toml_str(CATALOG).unwrap();
    assert_eq!(
        catalog.capstone(),
        Some(&Capstone::Simulation("customer_call".to_string()))
    );
    let criteria = standard_criteria(&catalog);
    let mut store = store();

    for task in ["orientation", "shadowing", "final_review"] {
        store.apply(&catalog.resolve_submit_task(task).unwrap()).unwrap();
    }
    store.apply(&catalog.resolve_complete_lesson("safety").unwrap()).unwrap();
    assert_eq!(store.state().xp(), 2_500);

    let report = GraduationReport::evaluate(store.state(), &criteria);
    assert!(!report.eligible);
    let open: Vec<_> = report.remaining().map(|c| c.id.as_str()).collect();
    assert_eq!(open, vec!["reach_graduate", "capstone"]);

    store
        .apply(&catalog.resolve_start_simulation("customer_call").unwrap())
        .unwrap();
    for option in ["listen", "escalate"] {
        let view = SimulationView::of(&catalog, store.state()).unwrap().unwrap();
        let (command, _) = view.choose(option).unwrap();
        store.apply(&command).unwrap();
        store.apply(&Command::AdvanceSimulationStep).unwrap();
    }
    let view = SimulationView::of(&catalog, store.state()).unwrap().unwrap();
    assert_eq!(view.score, 100);
    store.apply(&view.complete()).unwrap();
    assert_eq!(store.state().xp(), 2_800);

    // Still short of 4000 XP
    assert!(!GraduationReport::evaluate(store.state(), &criteria).eligible);

    store.apply(&Command::submit_task("extra", 1_200)).unwrap();
    assert_eq!(store.state().level(), Level::Graduate);
    let report = GraduationReport::evaluate(store.state(), &criteria);
    assert!(report.eligible);
    assert_eq!(report.completed, criteria.len());
}

#[test]
fn test_checkpoint_jump_keeps_identity_and_streak() {
    let mut store = store();
    store.apply(&Command::advance_streak(true, true)).unwrap();
    store.apply(&Command::start_simulation("a", 2)).unwrap();

    let events = store.apply(&Command::jump_to_checkpoint("master")).unwrap();
    let names: Vec<_> = events.iter().map(|e| e.kind.name()).collect();
    assert_eq!(names, vec!["simulation_abandoned", "checkpoint_jumped", "level_changed"]);

    let state = store.state();
    assert_eq!(state.xp(), 2_000);
    assert_eq!(state.level(), Level::Master);
    assert_eq!(state.streak(), 1);
    assert_eq!(state.identity().display_name, "Grace");
    assert!(state.active_run().is_none());

    assert_eq!(
        store.apply(&Command::jump_to_checkpoint("nowhere")).unwrap_err(),
        EngineError::UnknownCheckpoint("nowhere".to_string())
    );
}

#[test]
fn test_catalog_checkpoints_extend_builtin() {
    let catalog = StaticCatalog::from_toml_str(
        r#"
        [[tasks]]
        id = "t1"
        xp_reward = 10

        [[checkpoints]]
        id = "demo"
        label = "Demo learner"
        xp = 1_500
        completed_tasks = ["t1"]
        "#,
    )
    .unwrap();

    let mut book = Reducer::new().checkpoints().clone();
    book.extend(catalog.checkpoints());
    let reducer = Reducer::new().with_checkpoints(book);

    let state = LearnerState::new(LearnerIdentity::new("x", "X"));
    let jumped = reducer.reduce(&state, &Command::jump_to_checkpoint("demo")).unwrap().state;
    assert_eq!(jumped.level(), Level::Journeyman);
    assert!(jumped.has_completed_task("t1"));

    // Already-completed tasks are not credited again after a jump
    let again = reducer.reduce(&jumped, &Command::submit_task("t1", 10)).unwrap();
    assert!(again.events.is_empty());
}

#[test]
fn test_feed_is_newest_first_and_restartable() {
    let mut store = store();
    store.apply(&Command::submit_task("t1", 10)).unwrap();
    store.apply(&Command::complete_lesson("l1", 10)).unwrap();

    let events = store.state().events();
    let seqs: Vec<u64> = synthesize(events).map(|i| i.seq).collect();
    let mut sorted = seqs.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(seqs, sorted);
    assert_eq!(synthesize(events).collect::<Vec<_>>(), synthesize(events).collect::<Vec<_>>());
    assert_eq!(synthesize(events).take(1).count(), 1);
}
