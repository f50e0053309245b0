//! Graduation eligibility (v0.4.0).
//!
//! Checklist of criteria evaluated against a learner snapshot. Nothing here is
//! cached: the checklist is rebuilt on every call because the learner may have
//! moved since the last one.

use crate::catalog::{Capstone, ContentCatalog};
use crate::learner::LearnerState;
use crate::progression::Level;
use serde::{Deserialize, Serialize};

/// Condition a criterion checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CriterionRule {
    ReachedLevel { level: Level },
    CompletedAllTasks { task_ids: Vec<String> },
    CompletedTask { task_id: String },
    CompletedLesson { lesson_id: String },
    MinimumTasks { count: usize },
    MinimumLessons { count: usize },
    CompletedSimulation { scenario_id: String },
    MinimumSimulationScore { scenario_id: String, score: u8 },
    MinimumStreak { days: u32 },
}

impl CriterionRule {
    pub fn is_met(&self, state: &LearnerState) -> bool {
        match self {
            CriterionRule::ReachedLevel { level } => state.level() >= *level,
            CriterionRule::CompletedAllTasks { task_ids } => {
                task_ids.iter().all(|id| state.has_completed_task(id))
            }
            CriterionRule::CompletedTask { task_id } => state.has_completed_task(task_id),
            CriterionRule::CompletedLesson { lesson_id } => state.has_completed_lesson(lesson_id),
            CriterionRule::MinimumTasks { count } => state.completed_tasks().len() >= *count,
            CriterionRule::MinimumLessons { count } => state.completed_lessons().len() >= *count,
            CriterionRule::CompletedSimulation { scenario_id } => {
                state.has_completed_simulation(scenario_id)
            }
            CriterionRule::MinimumSimulationScore { scenario_id, score } => state
                .best_simulation_score(scenario_id)
                .map(|best| best >= *score)
                .unwrap_or(false),
            CriterionRule::MinimumStreak { days } => state.best_streak() >= *days,
        }
    }
}

/// A required criterion as configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub label: String,
    #[serde(flatten)]
    pub rule: CriterionRule,
}

impl Criterion {
    pub fn new(id: &str, label: &str, rule: CriterionRule) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            rule,
        }
    }
}

/// Evaluated checklist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationCriterion {
    pub id: String,
    pub label: String,
    pub is_complete: bool,
}

/// Evaluate criteria in the order given
pub fn evaluate(state: &LearnerState, required: &[Criterion]) -> Vec<GraduationCriterion> {
    required
        .iter()
        .map(|criterion| GraduationCriterion {
            id: criterion.id.clone(),
            label: criterion.label.clone(),
            is_complete: criterion.rule.is_met(state),
        })
        .collect()
}

/// Eligible iff every row is complete (an empty checklist is eligible)
pub fn is_eligible(checklist: &[GraduationCriterion]) -> bool {
    checklist.iter().all(|c| c.is_complete)
}

/// Default checklist for a catalog: reach graduate, finish every required
/// task, finish the capstone if one is declared.
pub fn standard_criteria(catalog: &impl ContentCatalog) -> Vec<Criterion> {
    let mut criteria = vec![Criterion::new(
        "reach_graduate",
        "Reach the Graduate level",
        CriterionRule::ReachedLevel {
            level: Level::Graduate,
        },
    )];

    let required = catalog.required_task_ids();
    if !required.is_empty() {
        criteria.push(Criterion::new(
            "required_tasks",
            &format!("Complete all {} required tasks", required.len()),
            CriterionRule::CompletedAllTasks { task_ids: required },
        ));
    }

    match catalog.capstone() {
        Some(Capstone::Task(task_id)) => criteria.push(Criterion::new(
            "capstone",
            "Complete the capstone task",
            CriterionRule::CompletedTask {
                task_id: task_id.clone(),
            },
        )),
        Some(Capstone::Simulation(scenario_id)) => criteria.push(Criterion::new(
            "capstone",
            "Complete the capstone simulation",
            CriterionRule::CompletedSimulation {
                scenario_id: scenario_id.clone(),
            },
        )),
        None => {}
    }

    criteria
}

/// Checklist plus its aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationReport {
    pub criteria: Vec<GraduationCriterion>,
    pub eligible: bool,
    pub completed: usize,
}

impl GraduationReport {
    pub fn evaluate(state: &LearnerState, required: &[Criterion]) -> Self {
        let criteria = evaluate(state, required);
        let completed = criteria.iter().filter(|c| c.is_complete).count();
        let eligible = is_eligible(&criteria);
        Self {
            criteria,
            eligible,
            completed,
        }
    }

    /// Rows still open, in checklist order
    pub fn remaining(&self) -> impl Iterator<Item = &GraduationCriterion> {
        self.criteria.iter().filter(|c| !c.is_complete)
    }
}
