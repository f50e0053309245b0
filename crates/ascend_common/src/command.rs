//! Commands accepted by the reducer.
//!
//! The set is closed: every kind is a variant here and the reducer matches on
//! all of them. Commands carry ids and numbers only; the caller resolves
//! rewards and impacts against the content catalog first.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Command names, matching the serialized `kind` tag
pub const COMMAND_KINDS: &[&str] = &[
    "submit_task",
    "complete_lesson",
    "start_simulation",
    "record_simulation_choice",
    "advance_simulation_step",
    "complete_simulation",
    "advance_streak",
    "jump_to_checkpoint",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    SubmitTask {
        task_id: String,
        xp_reward: i64,
    },
    CompleteLesson {
        lesson_id: String,
        xp_reward: i64,
    },
    StartSimulation {
        scenario_id: String,
        total_steps: usize,
    },
    RecordSimulationChoice {
        option_id: String,
        score_impact: i32,
    },
    AdvanceSimulationStep,
    CompleteSimulation {
        xp_cap: i64,
    },
    AdvanceStreak {
        is_active_today: bool,
        day_boundary_crossed: bool,
    },
    JumpToCheckpoint {
        checkpoint_id: String,
    },
}

impl Command {
    pub fn submit_task(task_id: &str, xp_reward: i64) -> Self {
        Command::SubmitTask {
            task_id: task_id.to_string(),
            xp_reward,
        }
    }

    pub fn complete_lesson(lesson_id: &str, xp_reward: i64) -> Self {
        Command::CompleteLesson {
            lesson_id: lesson_id.to_string(),
            xp_reward,
        }
    }

    pub fn start_simulation(scenario_id: &str, total_steps: usize) -> Self {
        Command::StartSimulation {
            scenario_id: scenario_id.to_string(),
            total_steps,
        }
    }

    pub fn record_choice(option_id: &str, score_impact: i32) -> Self {
        Command::RecordSimulationChoice {
            option_id: option_id.to_string(),
            score_impact,
        }
    }

    pub fn complete_simulation(xp_cap: i64) -> Self {
        Command::CompleteSimulation { xp_cap }
    }

    pub fn advance_streak(is_active_today: bool, day_boundary_crossed: bool) -> Self {
        Command::AdvanceStreak {
            is_active_today,
            day_boundary_crossed,
        }
    }

    pub fn jump_to_checkpoint(checkpoint_id: &str) -> Self {
        Command::JumpToCheckpoint {
            checkpoint_id: checkpoint_id.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::SubmitTask { .. } => "submit_task",
            Command::CompleteLesson { .. } => "complete_lesson",
            Command::StartSimulation { .. } => "start_simulation",
            Command::RecordSimulationChoice { .. } => "record_simulation_choice",
            Command::AdvanceSimulationStep => "advance_simulation_step",
            Command::CompleteSimulation { .. } => "complete_simulation",
            Command::AdvanceStreak { .. } => "advance_streak",
            Command::JumpToCheckpoint { .. } => "jump_to_checkpoint",
        }
    }

    /// Parse a JSON command record.
    ///
    /// A missing or unrecognized `kind` is an `UnknownCommand`; a recognized
    /// kind with bad fields reports the serde message.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| EngineError::UnknownCommand(format!("malformed command: {}", e)))?;

        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .map(str::to_string)
            .ok_or_else(|| EngineError::UnknownCommand("missing 'kind'".to_string()))?;

        if !COMMAND_KINDS.contains(&kind.as_str()) {
            return Err(EngineError::UnknownCommand(kind));
        }

        serde_json::from_value(value)
            .map_err(|e| EngineError::UnknownCommand(format!("invalid '{}' command: {}", kind, e)))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::SubmitTask { task_id, xp_reward } => {
                write!(f, "submit_task({}, {} XP)", task_id, xp_reward)
            }
            Command::CompleteLesson { lesson_id, xp_reward } => {
                write!(f, "complete_lesson({}, {} XP)", lesson_id, xp_reward)
            }
            Command::StartSimulation { scenario_id, total_steps } => {
                write!(f, "start_simulation({}, {} steps)", scenario_id, total_steps)
            }
            Command::RecordSimulationChoice { option_id, score_impact } => {
                write!(f, "record_simulation_choice({}, {:+})", option_id, score_impact)
            }
            Command::AdvanceSimulationStep => write!(f, "advance_simulation_step"),
            Command::CompleteSimulation { xp_cap } => write!(f, "complete_simulation(cap {})", xp_cap),
            Command::AdvanceStreak {
                is_active_today,
                day_boundary_crossed,
            } => write!(
                f,
                "advance_streak(active={}, boundary={})",
                is_active_today, day_boundary_crossed
            ),
            Command::JumpToCheckpoint { checkpoint_id } => {
                write!(f, "jump_to_checkpoint({})", checkpoint_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serialized_tag() {
        let commands = vec![
            Command::submit_task("t1", 50),
            Command::complete_lesson("l1", 20),
            Command::start_simulation("s1", 3),
            Command::record_choice("o1", -5),
            Command::AdvanceSimulationStep,
            Command::complete_simulation(300),
            Command::advance_streak(true, true),
            Command::jump_to_checkpoint("master"),
        ];
        assert_eq!(commands.len(), COMMAND_KINDS.len());
        for command in commands {
            let json = serde_json::to_value(&command).unwrap();
            assert_eq!(json["kind"], command.kind());
            assert!(COMMAND_KINDS.contains(&command.kind()));
        }
    }

    #[test]
    fn test_from_json() {
        let command = Command::from_json(r#"{"kind":"submit_task","task_id":"t1","xp_reward":50}"#).unwrap();
        assert_eq!(command, Command::submit_task("t1", 50));

        let unit = Command::from_json(r#"{"kind":"advance_simulation_step"}"#).unwrap();
        assert_eq!(unit, Command::AdvanceSimulationStep);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = Command::from_json(r#"{"kind":"reset_everything"}"#).unwrap_err();
        assert_eq!(err, EngineError::UnknownCommand("reset_everything".to_string()));

        assert!(matches!(
            Command::from_json(r#"{"task_id":"t1"}"#),
            Err(EngineError::UnknownCommand(_))
        ));
        assert!(Command::from_json("not json").is_err());
    }

    #[test]
    fn test_known_kind_with_bad_fields() {
        let err = Command::from_json(r#"{"kind":"submit_task","task_id":"t1"}"#).unwrap_err();
        assert!(err.to_string().contains("submit_task"));
    }

    #[test]
    fn test_bad_fields_error_names_the_kind() {
        let err = Command::from_json(r#"{"kind":"complete_simulation","xp_cap":"lots"}"#).unwrap_err();
        match err {
            EngineError::UnknownCommand(message) => {
                assert!(message.starts_with("invalid 'complete_simulation' command"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::record_choice("o1", 5).to_string(), "record_simulation_choice(o1, +5)");
        assert_eq!(Command::AdvanceSimulationStep.to_string(), "advance_simulation_step");
    }
}
