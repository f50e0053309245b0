//! Learner state (v0.4.0).
//!
//! The complete progression snapshot for one learner. Fields are private so
//! the only way to move a learner forward is through the reducer; `level` in
//! particular is always `level_for(xp)` and is re-checked when a snapshot is
//! deserialized.

use crate::events::ProgressionEvent;
use crate::progression::{level_for, Level};
use crate::simulation::{SimulationRecord, SimulationRun, SimulationSlot, SimulationStatus};
use serde::{Deserialize, Serialize};

/// Stable learner reference, fixed at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerIdentity {
    pub id: String,
    pub display_name: String,
}

impl LearnerIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Set of ids that keeps insertion order for chronological displays
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CompletionSet {
    ids: Vec<String>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Insert `id`; returns false if it was already present
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in completion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }
}

impl From<Vec<String>> for CompletionSet {
    fn from(ids: Vec<String>) -> Self {
        let mut set = CompletionSet::new();
        for id in &ids {
            set.insert(id);
        }
        set
    }
}

impl From<CompletionSet> for Vec<String> {
    fn from(set: CompletionSet) -> Self {
        set.ids
    }
}

impl<'a> FromIterator<&'a str> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = CompletionSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// Progression snapshot for a single learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LearnerStateRepr")]
pub struct LearnerState {
    identity: LearnerIdentity,
    level: Level,
    xp: u64,
    streak: u32,
    best_streak: u32,
    completed_tasks: CompletionSet,
    completed_lessons: CompletionSet,
    completed_simulations: Vec<SimulationRecord>,
    simulation: SimulationSlot,
    notifications_seed: Vec<ProgressionEvent>,
}

/// Wire form, validated into `LearnerState`
#[derive(Deserialize)]
struct LearnerStateRepr {
    identity: LearnerIdentity,
    level: Level,
    xp: u64,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    best_streak: u32,
    #[serde(default)]
    completed_tasks: CompletionSet,
    #[serde(default)]
    completed_lessons: CompletionSet,
    #[serde(default)]
    completed_simulations: Vec<SimulationRecord>,
    #[serde(default)]
    simulation: SimulationSlot,
    #[serde(default)]
    notifications_seed: Vec<ProgressionEvent>,
}

impl TryFrom<LearnerStateRepr> for LearnerState {
    type Error = String;

    fn try_from(repr: LearnerStateRepr) -> Result<Self, Self::Error> {
        let derived = level_for(repr.xp);
        if repr.level != derived {
            return Err(format!(
                "level '{}' does not match {} XP (expected '{}')",
                repr.level.as_str(),
                repr.xp,
                derived.as_str()
            ));
        }

        if let Some(pair) = repr
            .notifications_seed
            .windows(2)
            .find(|pair| pair[1].seq <= pair[0].seq)
        {
            return Err(format!(
                "event log out of order at seq {} -> {}",
                pair[0].seq, pair[1].seq
            ));
        }

        if let Some(run) = repr.simulation.active() {
            if run.status() != SimulationStatus::InProgress {
                return Err(format!(
                    "active simulation '{}' is not in progress",
                    run.scenario_id()
                ));
            }
        }

        Ok(Self {
            identity: repr.identity,
            level: repr.level,
            xp: repr.xp,
            streak: repr.streak,
            best_streak: repr.best_streak.max(repr.streak),
            completed_tasks: repr.completed_tasks,
            completed_lessons: repr.completed_lessons,
            completed_simulations: repr.completed_simulations,
            simulation: repr.simulation,
            notifications_seed: repr.notifications_seed,
        })
    }
}

impl LearnerState {
    /// A brand new learner: no XP, apprentice, nothing completed
    pub fn new(identity: LearnerIdentity) -> Self {
        Self {
            identity,
            level: level_for(0),
            xp: 0,
            streak: 0,
            best_streak: 0,
            completed_tasks: CompletionSet::new(),
            completed_lessons: CompletionSet::new(),
            completed_simulations: Vec::new(),
            simulation: SimulationSlot::Idle,
            notifications_seed: Vec::new(),
        }
    }

    pub fn identity(&self) -> &LearnerIdentity {
        &self.identity
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn completed_tasks(&self) -> &CompletionSet {
        &self.completed_tasks
    }

    pub fn completed_lessons(&self) -> &CompletionSet {
        &self.completed_lessons
    }

    /// Finished simulations, oldest first; replays add new entries
    pub fn completed_simulations(&self) -> &[SimulationRecord] {
        &self.completed_simulations
    }

    pub fn simulation(&self) -> &SimulationSlot {
        &self.simulation
    }

    pub fn active_run(&self) -> Option<&SimulationRun> {
        self.simulation.active()
    }

    /// The raw progression event log, oldest first
    pub fn events(&self) -> &[ProgressionEvent] {
        &self.notifications_seed
    }

    pub fn has_completed_task(&self, task_id: &str) -> bool {
        self.completed_tasks.contains(task_id)
    }

    pub fn has_completed_lesson(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    pub fn has_completed_simulation(&self, scenario_id: &str) -> bool {
        self.completed_simulations
            .iter()
            .any(|record| record.scenario_id == scenario_id)
    }

    /// Best score across all completed runs of a scenario
    pub fn best_simulation_score(&self, scenario_id: &str) -> Option<u8> {
        self.completed_simulations
            .iter()
            .filter(|record| record.scenario_id == scenario_id)
            .map(|record| record.score)
            .max()
    }

    /// Sequence number the next event will get
    pub fn next_seq(&self) -> u64 {
        self.notifications_seed.last().map(|e| e.seq + 1).unwrap_or(1)
    }

    // Mutators below are reducer-only.

    /// Add XP and re-derive the level; returns (before, after)
    pub(crate) fn credit_xp(&mut self, amount: u64) -> (Level, Level) {
        let before = self.level;
        self.xp = self.xp.saturating_add(amount);
        self.level = level_for(self.xp);
        (before, self.level)
    }

    pub(crate) fn completed_tasks_mut(&mut self) -> &mut CompletionSet {
        &mut self.completed_tasks
    }

    pub(crate) fn completed_lessons_mut(&mut self) -> &mut CompletionSet {
        &mut self.completed_lessons
    }

    pub(crate) fn push_simulation_record(&mut self, record: SimulationRecord) {
        self.completed_simulations.push(record);
    }

    pub(crate) fn set_simulation(&mut self, slot: SimulationSlot) {
        self.simulation = slot;
    }

    pub(crate) fn set_streak(&mut self, streak: u32) {
        self.streak = streak;
        self.best_streak = self.best_streak.max(streak);
    }

    /// Replace XP and completion sets wholesale; level is derived from `xp`
    pub(crate) fn restore_progress(
        &mut self,
        xp: u64,
        tasks: CompletionSet,
        lessons: CompletionSet,
        simulations: Vec<SimulationRecord>,
    ) -> (Level, Level) {
        let before = self.level;
        self.xp = xp;
        self.level = level_for(xp);
        self.completed_tasks = tasks;
        self.completed_lessons = lessons;
        self.completed_simulations = simulations;
        (before, self.level)
    }

    pub(crate) fn push_event(&mut self, event: ProgressionEvent) {
        self.notifications_seed.push(event);
    }
}
