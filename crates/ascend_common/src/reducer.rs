//! Command processor (v0.4.0).
//!
//! `(state, command) -> state`, one arm per command kind. The reducer works on
//! a private copy of the input and only hands it back when every step of the
//! transition succeeded, so a failed command leaves the caller's state exactly
//! as it was. No clocks, no I/O: the same inputs always give the same output,
//! which makes journals replayable.

use crate::checkpoints::CheckpointBook;
use crate::command::Command;
use crate::error::EngineError;
use crate::events::{EventKind, ProgressionEvent, XpSource};
use crate::learner::LearnerState;
use crate::progression::{advance_streak, milestone_reached, normalize_reward, StreakChange, DEFAULT_MILESTONES};
use crate::simulation::{decide_start, SimulationRun, SimulationSlot, StartDecision};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Result of applying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The new snapshot
    pub state: LearnerState,
    /// Events appended to the log by this command, oldest first
    pub events: Vec<ProgressionEvent>,
}

/// Reducer configured with streak milestones and the checkpoint registry
#[derive(Debug, Clone)]
pub struct Reducer {
    milestones: Vec<u32>,
    checkpoints: CheckpointBook,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer {
    pub fn new() -> Self {
        Self {
            milestones: DEFAULT_MILESTONES.to_vec(),
            checkpoints: CheckpointBook::builtin(),
        }
    }

    pub fn with_milestones(mut self, milestones: Vec<u32>) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: CheckpointBook) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn milestones(&self) -> &[u32] {
        &self.milestones
    }

    pub fn checkpoints(&self) -> &CheckpointBook {
        &self.checkpoints
    }

    /// Apply `command` to `state`.
    ///
    /// Duplicate completions and advancing past the last step are accepted as
    /// no-ops; impossible transitions are errors.
    pub fn reduce(&self, state: &LearnerState, command: &Command) -> Result<Transition, EngineError> {
        debug!("Applying {} for learner {}", command, state.identity().id);

        let mut draft = Draft::new(state);
        match command {
            Command::SubmitTask { task_id, xp_reward } => submit_task(&mut draft, task_id, *xp_reward),
            Command::CompleteLesson { lesson_id, xp_reward } => {
                complete_lesson(&mut draft, lesson_id, *xp_reward)
            }
            Command::StartSimulation {
                scenario_id,
                total_steps,
            } => start_simulation(&mut draft, scenario_id, *total_steps),
            Command::RecordSimulationChoice {
                option_id,
                score_impact,
            } => record_choice(&mut draft, option_id, *score_impact)?,
            Command::AdvanceSimulationStep => advance_step(&mut draft)?,
            Command::CompleteSimulation { xp_cap } => complete_simulation(&mut draft, *xp_cap)?,
            Command::AdvanceStreak {
                is_active_today,
                day_boundary_crossed,
            } => self.streak(&mut draft, *is_active_today, *day_boundary_crossed),
            Command::JumpToCheckpoint { checkpoint_id } => self.jump(&mut draft, checkpoint_id)?,
        }

        Ok(draft.finish())
    }

    fn streak(&self, draft: &mut Draft, is_active_today: bool, day_boundary_crossed: bool) {
        match advance_streak(draft.state.streak(), is_active_today, day_boundary_crossed) {
            StreakChange::Unchanged => {
                debug!("No day boundary; streak stays at {}", draft.state.streak());
            }
            StreakChange::Extended { from, to } => {
                draft.state.set_streak(to);
                if let Some(days) = milestone_reached(&self.milestones, from, to) {
                    info!("Streak milestone reached: {} days", days);
                    draft.emit(EventKind::StreakMilestone { days });
                }
            }
            StreakChange::Reset { from } => {
                draft.state.set_streak(0);
                if from > 0 {
                    draft.emit(EventKind::StreakReset { previous: from });
                }
            }
        }
    }

    fn jump(&self, draft: &mut Draft, checkpoint_id: &str) -> Result<(), EngineError> {
        let checkpoint = self
            .checkpoints
            .get(checkpoint_id)
            .ok_or_else(|| EngineError::UnknownCheckpoint(checkpoint_id.to_string()))?;

        draft.abandon_active_run();

        let (before, after) = draft.state.restore_progress(
            checkpoint.xp,
            checkpoint.task_set(),
            checkpoint.lesson_set(),
            checkpoint.completed_simulations.clone(),
        );
        info!(
            "Jumped to checkpoint '{}' ({} XP, {})",
            checkpoint.id, checkpoint.xp, after
        );
        draft.emit(EventKind::CheckpointJumped {
            checkpoint_id: checkpoint.id.clone(),
            xp: checkpoint.xp,
            level: after,
        });
        if before != after {
            draft.emit(EventKind::LevelChanged { from: before, to: after });
        }
        Ok(())
    }
}

/// Apply `command` with the default reducer (built-in checkpoints, 3/7/30 day
/// milestones).
pub fn reduce(state: &LearnerState, command: &Command) -> Result<Transition, EngineError> {
    static DEFAULT: OnceLock<Reducer> = OnceLock::new();
    DEFAULT.get_or_init(Reducer::new).reduce(state, command)
}

/// Working copy of the state plus the events emitted so far
struct Draft {
    state: LearnerState,
    events: Vec<ProgressionEvent>,
}

impl Draft {
    fn new(state: &LearnerState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }

    fn emit(&mut self, kind: EventKind) {
        let event = ProgressionEvent::new(self.state.next_seq(), kind);
        self.state.push_event(event.clone());
        self.events.push(event);
    }

    /// Add XP, re-derive the level and log both
    fn credit(&mut self, amount: u64, source: XpSource) {
        if amount == 0 {
            return;
        }

        let (before, after) = self.state.credit_xp(amount);
        self.emit(EventKind::XpGained {
            amount,
            source,
            total: self.state.xp(),
        });
        if before != after {
            info!("Level up: {} -> {} at {} XP", before, after, self.state.xp());
            self.emit(EventKind::LevelChanged { from: before, to: after });
        }
    }

    fn abandon_active_run(&mut self) {
        let Some(run) = self.state.active_run().cloned() else {
            return;
        };
        warn!(
            "Discarding simulation '{}' at step {} (score {})",
            run.scenario_id(),
            run.current_step_index() + 1,
            run.score()
        );
        self.state.set_simulation(SimulationSlot::Idle);
        self.emit(EventKind::SimulationAbandoned {
            scenario_id: run.scenario_id().to_string(),
            step: run.current_step_index(),
            score: run.score(),
        });
    }

    fn active_run(&self) -> Result<&SimulationRun, EngineError> {
        self.state.active_run().ok_or(EngineError::NoActiveSimulation)
    }

    fn finish(self) -> Transition {
        Transition {
            state: self.state,
            events: self.events,
        }
    }
}

fn clamp_reward(kind: &str, id: &str, reward: i64) -> u64 {
    if reward < 0 {
        warn!("Negative XP reward {} for {} '{}' clamped to 0", reward, kind, id);
    }
    normalize_reward(reward)
}

fn submit_task(draft: &mut Draft, task_id: &str, xp_reward: i64) {
    if draft.state.has_completed_task(task_id) {
        debug!("Task '{}' already completed; not crediting again", task_id);
        return;
    }

    let xp = clamp_reward("task", task_id, xp_reward);
    draft.state.completed_tasks_mut().insert(task_id);
    draft.emit(EventKind::TaskApproved {
        task_id: task_id.to_string(),
        xp,
    });
    draft.credit(xp, XpSource::Task(task_id.to_string()));
}

fn complete_lesson(draft: &mut Draft, lesson_id: &str, xp_reward: i64) {
    if draft.state.has_completed_lesson(lesson_id) {
        debug!("Lesson '{}' already completed; not crediting again", lesson_id);
        return;
    }

    let xp = clamp_reward("lesson", lesson_id, xp_reward);
    draft.state.completed_lessons_mut().insert(lesson_id);
    draft.emit(EventKind::LessonCompleted {
        lesson_id: lesson_id.to_string(),
        xp,
    });
    draft.credit(xp, XpSource::Lesson(lesson_id.to_string()));
}

fn start_simulation(draft: &mut Draft, scenario_id: &str, total_steps: usize) {
    match decide_start(draft.state.simulation(), scenario_id) {
        StartDecision::Resume => {
            debug!("Simulation '{}' already in progress", scenario_id);
        }
        StartDecision::Fresh { .. } => {
            draft.abandon_active_run();
            let run = SimulationRun::start(scenario_id, total_steps);
            let total_steps = run.total_steps();
            draft.state.set_simulation(SimulationSlot::Active(run));
            draft.emit(EventKind::SimulationStarted {
                scenario_id: scenario_id.to_string(),
                total_steps,
            });
        }
    }
}

fn record_choice(draft: &mut Draft, option_id: &str, score_impact: i32) -> Result<(), EngineError> {
    let next = draft.active_run()?.record_choice(option_id, score_impact)?;
    debug!(
        "Choice '{}' ({:+}) on '{}' -> score {}",
        option_id,
        score_impact,
        next.scenario_id(),
        next.score()
    );
    draft.state.set_simulation(SimulationSlot::Active(next));
    Ok(())
}

fn advance_step(draft: &mut Draft) -> Result<(), EngineError> {
    let next = draft.active_run()?.advance()?;
    match next {
        Some(next) => draft.state.set_simulation(SimulationSlot::Active(next)),
        None => debug!("Simulation already at its final step"),
    }
    Ok(())
}

fn complete_simulation(draft: &mut Draft, xp_cap: i64) -> Result<(), EngineError> {
    let outcome = {
        let run = draft.active_run()?;
        let cap = clamp_reward("simulation", run.scenario_id(), xp_cap);
        run.complete(cap)?
    };
    let record = outcome.record();

    info!(
        "Simulation '{}' completed with score {} for {} XP",
        record.scenario_id, record.score, outcome.payout
    );

    // The finished run is cleared as soon as its payout is folded in.
    draft.state.push_simulation_record(record.clone());
    draft.state.set_simulation(SimulationSlot::Idle);
    draft.emit(EventKind::SimulationCompleted {
        scenario_id: record.scenario_id.clone(),
        score: record.score,
        payout: outcome.payout,
    });
    draft.credit(outcome.payout, XpSource::Simulation(record.scenario_id));
    Ok(())
}
