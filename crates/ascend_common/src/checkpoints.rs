//! Checkpoint snapshots for demo and administrative jumps.
//!
//! A checkpoint only stores XP and completion sets. The level is always
//! derived from the XP, so a jump can never produce a state whose level
//! disagrees with its XP.

use crate::learner::CompletionSet;
use crate::progression::{level_for, Level};
use crate::simulation::SimulationRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub xp: u64,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    #[serde(default)]
    pub completed_simulations: Vec<SimulationRecord>,
}

impl Checkpoint {
    pub fn new(id: &str, label: &str, xp: u64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            xp,
            completed_tasks: Vec::new(),
            completed_lessons: Vec::new(),
            completed_simulations: Vec::new(),
        }
    }

    pub fn with_tasks(mut self, tasks: &[&str]) -> Self {
        self.completed_tasks = tasks.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_lessons(mut self, lessons: &[&str]) -> Self {
        self.completed_lessons = lessons.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Level the learner lands on after jumping here
    pub fn level(&self) -> Level {
        level_for(self.xp)
    }

    pub fn task_set(&self) -> CompletionSet {
        CompletionSet::from(self.completed_tasks.clone())
    }

    pub fn lesson_set(&self) -> CompletionSet {
        CompletionSet::from(self.completed_lessons.clone())
    }
}

/// Ordered registry of checkpoints, looked up by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointBook {
    entries: Vec<Checkpoint>,
}

impl CheckpointBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// One checkpoint per tier floor
    pub fn builtin() -> Self {
        let mut book = Self::new();
        book.insert(Checkpoint::new("fresh", "Fresh start", 0));
        for level in [Level::Journeyman, Level::Master, Level::Graduate] {
            book.insert(Checkpoint::new(
                level.as_str(),
                &format!("Start of {}", level.title()),
                level.min_xp(),
            ));
        }
        book
    }

    /// Add a checkpoint, replacing any existing one with the same id
    pub fn insert(&mut self, checkpoint: Checkpoint) {
        match self.entries.iter_mut().find(|c| c.id == checkpoint.id) {
            Some(existing) => *existing = checkpoint,
            None => self.entries.push(checkpoint),
        }
    }

    pub fn extend(&mut self, checkpoints: impl IntoIterator<Item = Checkpoint>) {
        for checkpoint in checkpoints {
            self.insert(checkpoint);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Checkpoint> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_book() {
        let book = CheckpointBook::builtin();
        assert_eq!(book.len(), 4);
        assert_eq!(book.get("fresh").unwrap().level(), Level::Apprentice);
        assert_eq!(book.get("journeyman").unwrap().xp, 800);
        assert_eq!(book.get("master").unwrap().level(), Level::Master);
        assert_eq!(book.get("graduate").unwrap().level(), Level::Graduate);
        assert!(book.get("nope").is_none());
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut book = CheckpointBook::builtin();
        book.insert(Checkpoint::new("master", "Custom master", 2_500).with_tasks(&["t1"]));
        assert_eq!(book.len(), 4);
        let master = book.get("master").unwrap();
        assert_eq!(master.xp, 2_500);
        assert_eq!(master.task_set().len(), 1);
    }

    #[test]
    fn test_checkpoint_level_is_derived() {
        let checkpoint = Checkpoint::new("odd", "", 1_999);
        assert_eq!(checkpoint.level(), Level::Journeyman);
    }

    #[test]
    fn test_duplicate_ids_in_snapshot_collapse() {
        let checkpoint = Checkpoint::new("c", "", 0).with_lessons(&["l1", "l1", "l2"]);
        assert_eq!(checkpoint.lesson_set().len(), 2);
    }
}
