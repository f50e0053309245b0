//! Learner store (v0.4.0).
//!
//! Holds the current snapshot for one learner and swaps it only when the
//! reducer accepts a command. Readers always see a complete state: either the
//! one before a command or the one after it.

use crate::command::Command;
use crate::error::{EngineError, StoreError};
use crate::events::ProgressionEvent;
use crate::learner::{LearnerIdentity, LearnerState};
use crate::persistence::JournalEntry;
use crate::reducer::Reducer;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct LearnerStore {
    reducer: Reducer,
    state: LearnerState,
    journal: Vec<Command>,
}

impl LearnerStore {
    /// Fresh learner with the default reducer
    pub fn new(identity: LearnerIdentity) -> Self {
        Self::with_reducer(identity, Reducer::new())
    }

    pub fn with_reducer(identity: LearnerIdentity, reducer: Reducer) -> Self {
        Self::from_snapshot(LearnerState::new(identity), reducer)
    }

    /// Resume from a previously saved snapshot
    pub fn from_snapshot(state: LearnerState, reducer: Reducer) -> Self {
        Self {
            reducer,
            state,
            journal: Vec::new(),
        }
    }

    /// Rebuild a learner by applying `commands` to a fresh state
    pub fn replay<'c>(
        identity: LearnerIdentity,
        reducer: Reducer,
        commands: impl IntoIterator<Item = &'c Command>,
    ) -> Result<Self, EngineError> {
        let mut store = Self::with_reducer(identity, reducer);
        for (index, command) in commands.into_iter().enumerate() {
            store.apply(command).map_err(|e| {
                warn!("Replay stopped at command {}: {}", index + 1, e);
                e
            })?;
        }
        info!(
            "Replayed {} commands for learner {}",
            store.journal.len(),
            store.state.identity().id
        );
        Ok(store)
    }

    /// Rebuild a learner from journal entries read off disk
    pub fn replay_entries(
        identity: LearnerIdentity,
        reducer: Reducer,
        entries: &[JournalEntry],
    ) -> Result<Self, StoreError> {
        Ok(Self::replay(identity, reducer, entries.iter().map(|e| &e.command))?)
    }

    pub fn state(&self) -> &LearnerState {
        &self.state
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> LearnerState {
        self.state.clone()
    }

    pub fn into_state(self) -> LearnerState {
        self.state
    }

    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    /// Commands accepted since this store was opened
    pub fn journal(&self) -> &[Command] {
        &self.journal
    }

    /// Apply one command; on error the stored state is unchanged
    pub fn apply(&mut self, command: &Command) -> Result<Vec<ProgressionEvent>, EngineError> {
        let transition = self.reducer.reduce(&self.state, command)?;
        debug!(
            "{} accepted, {} new events",
            command.kind(),
            transition.events.len()
        );
        self.state = transition.state;
        self.journal.push(command.clone());
        Ok(transition.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Level;

    fn identity() -> LearnerIdentity {
        LearnerIdentity::new("l-1", "Ada")
    }

    #[test]
    fn test_apply_swaps_state() {
        let mut store = LearnerStore::new(identity());
        let events = store.apply(&Command::submit_task("t1", 800)).unwrap();
        assert_eq!(store.state().level(), Level::Journeyman);
        assert_eq!(events.len(), 3);
        assert_eq!(store.journal().len(), 1);
    }

    #[test]
    fn test_failed_command_keeps_state() {
        let mut store = LearnerStore::new(identity());
        store.apply(&Command::submit_task("t1", 50)).unwrap();
        let before = store.snapshot();

        let err = store.apply(&Command::complete_simulation(100)).unwrap_err();
        assert_eq!(err, EngineError::NoActiveSimulation);
        assert_eq!(store.state(), &before);
        assert_eq!(store.journal().len(), 1);
    }

    #[test]
    fn test_replay_matches_live_run() {
        let commands = vec![
            Command::submit_task("t1", 50),
            Command::start_simulation("s1", 2),
            Command::record_choice("a", 30),
            Command::AdvanceSimulationStep,
            Command::complete_simulation(300),
            Command::advance_streak(true, true),
        ];

        let mut live = LearnerStore::new(identity());
        for command in &commands {
            live.apply(command).unwrap();
        }

        let replayed = LearnerStore::replay(identity(), Reducer::new(), &commands).unwrap();
        assert_eq!(replayed.state(), live.state());
        assert_eq!(replayed.journal(), commands.as_slice());
    }

    #[test]
    fn test_replay_surfaces_first_error() {
        let commands = vec![Command::submit_task("t1", 50), Command::AdvanceSimulationStep];
        let err = LearnerStore::replay(identity(), Reducer::new(), &commands).unwrap_err();
        assert_eq!(err, EngineError::NoActiveSimulation);
    }

    #[test]
    fn test_replay_entries_reports_store_error() {
        let entries = vec![
            JournalEntry::now(Command::submit_task("t1", 50)),
            JournalEntry::now(Command::AdvanceSimulationStep),
        ];
        let err = LearnerStore::replay_entries(identity(), Reducer::new(), &entries).unwrap_err();
        assert!(matches!(err, StoreError::Replay(EngineError::NoActiveSimulation)));
        assert_eq!(err.code(), EngineError::NoActiveSimulation.code());

        let store = LearnerStore::replay_entries(identity(), Reducer::new(), &entries[..1]).unwrap();
        assert_eq!(store.state().xp(), 50);
    }
}
