//! Progression event log (v0.4.0).
//!
//! Append-only record of what each transition did. The reducer assigns every
//! event a sequence number; the log is never rewritten, and "read" status is
//! kept by whoever renders the feed.

use crate::progression::Level;
use serde::{Deserialize, Serialize};

/// Where a block of XP came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    Task(String),
    Lesson(String),
    Simulation(String),
}

impl XpSource {
    pub fn id(&self) -> &str {
        match self {
            XpSource::Task(id) | XpSource::Lesson(id) | XpSource::Simulation(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            XpSource::Task(_) => "task",
            XpSource::Lesson(_) => "lesson",
            XpSource::Simulation(_) => "simulation",
        }
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    TaskApproved {
        task_id: String,
        xp: u64,
    },
    LessonCompleted {
        lesson_id: String,
        xp: u64,
    },
    XpGained {
        amount: u64,
        source: XpSource,
        total: u64,
    },
    LevelChanged {
        from: Level,
        to: Level,
    },
    StreakMilestone {
        days: u32,
    },
    StreakReset {
        previous: u32,
    },
    SimulationStarted {
        scenario_id: String,
        total_steps: usize,
    },
    SimulationAbandoned {
        scenario_id: String,
        step: usize,
        score: u8,
    },
    SimulationCompleted {
        scenario_id: String,
        score: u8,
        payout: u64,
    },
    CheckpointJumped {
        checkpoint_id: String,
        xp: u64,
        level: Level,
    },
}

impl EventKind {
    /// Machine name, matches the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TaskApproved { .. } => "task_approved",
            EventKind::LessonCompleted { .. } => "lesson_completed",
            EventKind::XpGained { .. } => "xp_gained",
            EventKind::LevelChanged { .. } => "level_changed",
            EventKind::StreakMilestone { .. } => "streak_milestone",
            EventKind::StreakReset { .. } => "streak_reset",
            EventKind::SimulationStarted { .. } => "simulation_started",
            EventKind::SimulationAbandoned { .. } => "simulation_abandoned",
            EventKind::SimulationCompleted { .. } => "simulation_completed",
            EventKind::CheckpointJumped { .. } => "checkpoint_jumped",
        }
    }

    /// Level-ups only; a checkpoint jump downwards is not one
    pub fn is_level_up(&self) -> bool {
        matches!(self, EventKind::LevelChanged { from, to } if to > from)
    }
}

/// One entry in the learner's event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionEvent {
    /// Position in the log, starting at 1
    pub seq: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl ProgressionEvent {
    pub fn new(seq: u64, kind: EventKind) -> Self {
        Self { seq, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ProgressionEvent::new(
            3,
            EventKind::TaskApproved {
                task_id: "t1".to_string(),
                xp: 50,
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["seq"], 3);
        assert_eq!(json["event"], "task_approved");
        assert_eq!(json["task_id"], "t1");
    }

    #[test]
    fn test_event_roundtrip_with_source() {
        let event = ProgressionEvent::new(
            7,
            EventKind::XpGained {
                amount: 150,
                source: XpSource::Simulation("triage".to_string()),
                total: 950,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ProgressionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_level_up_detection() {
        let up = EventKind::LevelChanged {
            from: Level::Apprentice,
            to: Level::Journeyman,
        };
        let down = EventKind::LevelChanged {
            from: Level::Master,
            to: Level::Apprentice,
        };
        assert!(up.is_level_up());
        assert!(!down.is_level_up());
        assert_eq!(up.name(), "level_changed");
    }

    #[test]
    fn test_xp_source_accessors() {
        let source = XpSource::Lesson("intro".to_string());
        assert_eq!(source.id(), "intro");
        assert_eq!(source.kind(), "lesson");
    }
}
