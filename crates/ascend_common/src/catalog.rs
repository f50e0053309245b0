//! Content catalog contract (v0.4.0).
//!
//! The engine never reads content text; callers look definitions up here and
//! turn them into commands carrying only ids and numbers. `StaticCatalog` is
//! an in-memory implementation loaded from TOML.
//!
//! ## File layout
//!
//! ```toml
//! [[tasks]]
//! id = "orientation"
//! title = "Orientation checklist"
//! xp_reward = 50
//! required = true
//!
//! [[scenarios]]
//! id = "triage"
//! title = "Incident triage"
//! xp_cap = 300
//!
//! [[scenarios.steps]]
//! prompt = "The pager goes off at 3am."
//!
//! [[scenarios.steps.options]]
//! id = "ack"
//! label = "Acknowledge and assess"
//! score_impact = 20
//! feedback = "Good: you bought time to think."
//!
//! [capstone]
//! kind = "task"
//! id = "final_project"
//! ```

use crate::checkpoints::Checkpoint;
use crate::command::Command;
use crate::error::CatalogError;
use crate::graduation::{standard_criteria, Criterion};
use crate::learner::LearnerState;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub xp_reward: i64,
    /// Counts towards graduation
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub xp_reward: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDef {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub score_impact: i32,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDef {
    #[serde(default)]
    pub prompt: String,
    pub options: Vec<OptionDef>,
}

impl StepDef {
    pub fn option(&self, option_id: &str) -> Option<&OptionDef> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDef {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub xp_cap: i64,
    pub steps: Vec<StepDef>,
}

impl ScenarioDef {
    pub fn step(&self, index: usize) -> Option<&StepDef> {
        self.steps.get(index)
    }
}

/// Final piece of work a graduate must finish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Capstone {
    Task(String),
    Simulation(String),
}

/// Read-only registry of content definitions
pub trait ContentCatalog {
    fn task(&self, id: &str) -> Option<&TaskDef>;
    fn lesson(&self, id: &str) -> Option<&LessonDef>;
    fn scenario(&self, id: &str) -> Option<&ScenarioDef>;

    /// Ids of tasks that count towards graduation, in catalog order
    fn required_task_ids(&self) -> Vec<String>;

    fn capstone(&self) -> Option<&Capstone>;

    /// Catalog-defined checkpoints, layered over the built-in ones
    fn checkpoints(&self) -> Vec<Checkpoint> {
        Vec::new()
    }

    fn resolve_submit_task(&self, task_id: &str) -> Result<Command, CatalogError> {
        let task = self
            .task(task_id)
            .ok_or_else(|| CatalogError::UnknownTask(task_id.to_string()))?;
        Ok(Command::submit_task(&task.id, task.xp_reward))
    }

    fn resolve_complete_lesson(&self, lesson_id: &str) -> Result<Command, CatalogError> {
        let lesson = self
            .lesson(lesson_id)
            .ok_or_else(|| CatalogError::UnknownLesson(lesson_id.to_string()))?;
        Ok(Command::complete_lesson(&lesson.id, lesson.xp_reward))
    }

    fn resolve_start_simulation(&self, scenario_id: &str) -> Result<Command, CatalogError> {
        let scenario = self
            .scenario(scenario_id)
            .ok_or_else(|| CatalogError::UnknownScenario(scenario_id.to_string()))?;
        Ok(Command::start_simulation(&scenario.id, scenario.steps.len()))
    }

    fn option(&self, scenario_id: &str, step: usize, option_id: &str) -> Result<&OptionDef, CatalogError> {
        let scenario = self
            .scenario(scenario_id)
            .ok_or_else(|| CatalogError::UnknownScenario(scenario_id.to_string()))?;
        let step_def = scenario.step(step).ok_or_else(|| CatalogError::StepOutOfRange {
            scenario_id: scenario_id.to_string(),
            step,
        })?;
        step_def.option(option_id).ok_or_else(|| CatalogError::UnknownOption {
            scenario_id: scenario_id.to_string(),
            step,
            option_id: option_id.to_string(),
        })
    }

    fn resolve_choice(&self, scenario_id: &str, step: usize, option_id: &str) -> Result<Command, CatalogError> {
        let option = self.option(scenario_id, step, option_id)?;
        Ok(Command::record_choice(&option.id, option.score_impact))
    }

    fn resolve_complete_simulation(&self, scenario_id: &str) -> Result<Command, CatalogError> {
        let scenario = self
            .scenario(scenario_id)
            .ok_or_else(|| CatalogError::UnknownScenario(scenario_id.to_string()))?;
        Ok(Command::complete_simulation(scenario.xp_cap))
    }
}

/// In-memory catalog, usually loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    pub tasks: Vec<TaskDef>,
    #[serde(default)]
    pub lessons: Vec<LessonDef>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
    #[serde(default)]
    pub capstone: Option<Capstone>,
    #[serde(default, rename = "checkpoints")]
    pub checkpoint_defs: Vec<Checkpoint>,
    /// Custom graduation checklist; the standard one is used when empty
    #[serde(default)]
    pub graduation: Vec<Criterion>,
}

impl StaticCatalog {
    /// Parse and validate a catalog from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: StaticCatalog = toml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Graduation checklist for this catalog
    pub fn criteria(&self) -> Vec<Criterion> {
        if self.graduation.is_empty() {
            standard_criteria(self)
        } else {
            self.graduation.clone()
        }
    }

    /// Check ids are unique and every reference resolves
    pub fn validate(&self) -> Result<(), CatalogError> {
        ensure_unique("task", self.tasks.iter().map(|t| t.id.as_str()))?;
        ensure_unique("lesson", self.lessons.iter().map(|l| l.id.as_str()))?;
        ensure_unique("scenario", self.scenarios.iter().map(|s| s.id.as_str()))?;
        ensure_unique("checkpoint", self.checkpoint_defs.iter().map(|c| c.id.as_str()))?;

        for scenario in &self.scenarios {
            if scenario.steps.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "scenario '{}' has no steps",
                    scenario.id
                )));
            }
            for (index, step) in scenario.steps.iter().enumerate() {
                if step.options.is_empty() {
                    return Err(CatalogError::Invalid(format!(
                        "scenario '{}' step {} has no options",
                        scenario.id,
                        index + 1
                    )));
                }
                ensure_unique(
                    &format!("option in scenario '{}' step {}", scenario.id, index + 1),
                    step.options.iter().map(|o| o.id.as_str()),
                )?;
            }
        }

        match &self.capstone {
            Some(Capstone::Task(id)) if self.task(id).is_none() => {
                return Err(CatalogError::Invalid(format!("capstone task '{}' is not defined", id)));
            }
            Some(Capstone::Simulation(id)) if self.scenario(id).is_none() => {
                return Err(CatalogError::Invalid(format!(
                    "capstone scenario '{}' is not defined",
                    id
                )));
            }
            _ => {}
        }

        for checkpoint in &self.checkpoint_defs {
            if let Some(missing) = checkpoint.completed_tasks.iter().find(|id| self.task(id).is_none()) {
                return Err(CatalogError::Invalid(format!(
                    "checkpoint '{}' references unknown task '{}'",
                    checkpoint.id, missing
                )));
            }
            if let Some(missing) = checkpoint
                .completed_lessons
                .iter()
                .find(|id| self.lesson(id).is_none())
            {
                return Err(CatalogError::Invalid(format!(
                    "checkpoint '{}' references unknown lesson '{}'",
                    checkpoint.id, missing
                )));
            }
            if let Some(missing) = checkpoint
                .completed_simulations
                .iter()
                .find(|record| self.scenario(&record.scenario_id).is_none())
            {
                return Err(CatalogError::Invalid(format!(
                    "checkpoint '{}' references unknown scenario '{}'",
                    checkpoint.id, missing.scenario_id
                )));
            }
        }

        Ok(())
    }
}

fn ensure_unique<'a>(what: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(CatalogError::Invalid(format!("{} with an empty id", what)));
        }
        if !seen.insert(id) {
            return Err(CatalogError::Invalid(format!("duplicate {} id '{}'", what, id)));
        }
    }
    Ok(())
}

impl ContentCatalog for StaticCatalog {
    fn task(&self, id: &str) -> Option<&TaskDef> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn lesson(&self, id: &str) -> Option<&LessonDef> {
        self.lessons.iter().find(|l| l.id == id)
    }

    fn scenario(&self, id: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    fn required_task_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.required)
            .map(|t| t.id.clone())
            .collect()
    }

    fn capstone(&self) -> Option<&Capstone> {
        self.capstone.as_ref()
    }

    fn checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoint_defs.clone()
    }
}

/// The active run joined with its scenario definition
#[derive(Debug, Clone)]
pub struct SimulationView<'a> {
    pub scenario: &'a ScenarioDef,
    pub step_index: usize,
    pub step: &'a StepDef,
    pub score: u8,
    pub choice_recorded: bool,
    pub is_final_step: bool,
}

impl<'a> SimulationView<'a> {
    /// Active run for `state`, or `None` when no simulation is running
    pub fn of<C: ContentCatalog + ?Sized>(
        catalog: &'a C,
        state: &LearnerState,
    ) -> Result<Option<Self>, CatalogError> {
        let Some(run) = state.active_run() else {
            return Ok(None);
        };

        let scenario = catalog
            .scenario(run.scenario_id())
            .ok_or_else(|| CatalogError::UnknownScenario(run.scenario_id().to_string()))?;
        let step = scenario
            .step(run.current_step_index())
            .ok_or_else(|| CatalogError::StepOutOfRange {
                scenario_id: scenario.id.clone(),
                step: run.current_step_index(),
            })?;

        Ok(Some(Self {
            scenario,
            step_index: run.current_step_index(),
            step,
            score: run.score(),
            choice_recorded: run.choice_recorded(),
            is_final_step: run.is_final_step(),
        }))
    }

    /// Command for picking `option_id` on the current step, with its feedback
    pub fn choose(&self, option_id: &str) -> Result<(Command, &'a OptionDef), CatalogError> {
        let option = self.step.option(option_id).ok_or_else(|| CatalogError::UnknownOption {
            scenario_id: self.scenario.id.clone(),
            step: self.step_index,
            option_id: option_id.to_string(),
        })?;
        Ok((Command::record_choice(&option.id, option.score_impact), option))
    }

    /// Command for finishing this scenario
    pub fn complete(&self) -> Command {
        Command::complete_simulation(self.scenario.xp_cap)
    }
}
