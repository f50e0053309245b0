//! Error types for Ascend.

use thiserror::Error;

/// A command that cannot be applied to the current learner state.
///
/// These are caller/integration errors: they are surfaced immediately, never
/// retried, and the state they were issued against is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("No simulation is in progress")]
    NoActiveSimulation,

    #[error("Simulation '{scenario_id}' is not in progress")]
    SimulationNotInProgress { scenario_id: String },

    #[error(
        "Simulation '{scenario_id}' is at step {step} of {total_steps}; it can only be completed at the final step"
    )]
    NotAtFinalStep {
        scenario_id: String,
        step: usize,
        total_steps: usize,
    },

    #[error("A choice was already recorded for step {step} of simulation '{scenario_id}'")]
    ChoiceAlreadyRecorded { scenario_id: String, step: usize },

    #[error("Unknown checkpoint: {0}")]
    UnknownCheckpoint(String),
}

impl EngineError {
    pub fn code(&self) -> i32 {
        match self {
            EngineError::UnknownCommand(_) => -33000,
            EngineError::NoActiveSimulation => -33001,
            EngineError::SimulationNotInProgress { .. } => -33002,
            EngineError::NotAtFinalStep { .. } => -33003,
            EngineError::ChoiceAlreadyRecorded { .. } => -33004,
            EngineError::UnknownCheckpoint(_) => -33005,
        }
    }
}

/// Content catalog lookup and validation failures
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown lesson: {0}")]
    UnknownLesson(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Scenario '{scenario_id}' has no step {step}")]
    StepOutOfRange { scenario_id: String, step: usize },

    #[error("Scenario '{scenario_id}' step {step} has no option '{option_id}'")]
    UnknownOption {
        scenario_id: String,
        step: usize,
        option_id: String,
    },

    #[error("Invalid catalog: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CatalogError {
    pub fn code(&self) -> i32 {
        match self {
            CatalogError::UnknownTask(_) => -33100,
            CatalogError::UnknownLesson(_) => -33101,
            CatalogError::UnknownScenario(_) => -33102,
            CatalogError::StepOutOfRange { .. } => -33103,
            CatalogError::UnknownOption { .. } => -33104,
            CatalogError::Invalid(_) => -33105,
            CatalogError::Io(_) => -33106,
            CatalogError::Toml(_) => -33107,
        }
    }
}

/// Snapshot and journal persistence failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt journal line {line}: {reason}")]
    CorruptJournal { line: usize, reason: String },

    #[error("Replay failed: {0}")]
    Replay(#[from] EngineError),
}

impl StoreError {
    pub fn code(&self) -> i32 {
        match self {
            StoreError::Io(_) => -33200,
            StoreError::Json(_) => -32700,
            StoreError::CorruptJournal { .. } => -33201,
            StoreError::Replay(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_messages() {
        let err = EngineError::NotAtFinalStep {
            scenario_id: "triage".to_string(),
            step: 1,
            total_steps: 3,
        };
        assert!(err.to_string().contains("final step"));
        assert!(err.to_string().contains("triage"));
        assert_eq!(err.code(), -33003);
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            EngineError::UnknownCommand("x".into()),
            EngineError::NoActiveSimulation,
            EngineError::SimulationNotInProgress { scenario_id: "s".into() },
            EngineError::NotAtFinalStep { scenario_id: "s".into(), step: 0, total_steps: 2 },
            EngineError::ChoiceAlreadyRecorded { scenario_id: "s".into(), step: 0 },
            EngineError::UnknownCheckpoint("c".into()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_replay_error_keeps_engine_code() {
        let err = StoreError::from(EngineError::NoActiveSimulation);
        assert_eq!(err.code(), EngineError::NoActiveSimulation.code());
    }
}
