//! Ascend Common - Learner progression engine v0.4.0
//!
//! Levels, XP, streaks, workplace simulations, graduation and the
//! notification feed. All progression goes through one pure reducer;
//! persistence and content lookup sit around it.

pub mod catalog;
pub mod checkpoints;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod graduation;
pub mod learner;
pub mod persistence;
pub mod progression;
pub mod reducer;
pub mod simulation;
pub mod store;

pub use catalog::{Capstone, ContentCatalog, SimulationView, StaticCatalog};
pub use checkpoints::{Checkpoint, CheckpointBook};
pub use command::Command;
pub use config::AscendConfig;
pub use error::{CatalogError, EngineError, StoreError};
pub use events::{EventKind, ProgressionEvent, XpSource};
pub use feed::{synthesize, Feed, FeedItem};
pub use graduation::{evaluate, is_eligible, Criterion, CriterionRule, GraduationCriterion, GraduationReport};
pub use learner::{CompletionSet, LearnerIdentity, LearnerState};
pub use persistence::{CommandJournal, JournalEntry, SnapshotFile};
pub use progression::{level_for, Level};
pub use reducer::{reduce, Reducer, Transition};
pub use simulation::{SimulationRecord, SimulationRun, SimulationSlot, SimulationStatus};
pub use store::LearnerStore;
