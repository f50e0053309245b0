//! Notification feed (v0.4.0).
//!
//! Turns the raw progression log into human-readable items. The feed is a
//! lazy iterator over a borrowed slice: it never copies or touches the log,
//! and calling `synthesize` again on the same log gives the same sequence.

use crate::events::{EventKind, ProgressionEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One rendered feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Sequence number of the source event; stable key for read tracking
    pub seq: u64,
    pub kind: String,
    pub title: String,
    pub message: String,
}

/// Render a single event
pub fn render_event(event: &ProgressionEvent) -> FeedItem {
    let (title, message) = match &event.kind {
        EventKind::TaskApproved { task_id, xp } => (
            "Task approved".to_string(),
            format!("Your submission for '{}' was approved (+{} XP).", task_id, xp),
        ),
        EventKind::LessonCompleted { lesson_id, xp } => (
            "Lesson completed".to_string(),
            format!("You finished the lesson '{}' (+{} XP).", lesson_id, xp),
        ),
        EventKind::XpGained { amount, source, total } => (
            format!("+{} XP", amount),
            format!("Earned from {} '{}'. Total: {} XP.", source.kind(), source.id(), total),
        ),
        EventKind::LevelChanged { from, to } if to > from => (
            "Level up!".to_string(),
            format!("You advanced from {} to {}.", from, to),
        ),
        EventKind::LevelChanged { from, to } => (
            "Level changed".to_string(),
            format!("Your level moved from {} to {}.", from, to),
        ),
        EventKind::StreakMilestone { days } => (
            format!("{}-day streak!", days),
            format!("You have been active {} days in a row.", days),
        ),
        EventKind::StreakReset { previous } => (
            "Streak ended".to_string(),
            format!("Your {}-day streak was reset. Start a new one today.", previous),
        ),
        EventKind::SimulationStarted {
            scenario_id,
            total_steps,
        } => (
            "Simulation started".to_string(),
            format!("'{}' has {} decision points.", scenario_id, total_steps),
        ),
        EventKind::SimulationAbandoned {
            scenario_id,
            step,
            score,
        } => (
            "Simulation abandoned".to_string(),
            format!(
                "'{}' was left at step {} with a score of {}.",
                scenario_id,
                step + 1,
                score
            ),
        ),
        EventKind::SimulationCompleted {
            scenario_id,
            score,
            payout,
        } => (
            "Simulation completed".to_string(),
            format!("'{}' finished with a score of {}/100 (+{} XP).", scenario_id, score, payout),
        ),
        EventKind::CheckpointJumped {
            checkpoint_id,
            xp,
            level,
        } => (
            "Checkpoint loaded".to_string(),
            format!("Progress set to '{}': {} XP, {}.", checkpoint_id, xp, level),
        ),
    };

    FeedItem {
        seq: event.seq,
        kind: event.kind.name().to_string(),
        title,
        message,
    }
}

/// Lazy feed over an event log
#[derive(Debug, Clone)]
pub struct Feed<'a> {
    events: &'a [ProgressionEvent],
    front: usize,
    back: usize,
    newest_first: bool,
}

/// Feed for `events`, newest first
pub fn synthesize(events: &[ProgressionEvent]) -> Feed<'_> {
    Feed {
        events,
        front: 0,
        back: events.len(),
        newest_first: true,
    }
}

impl<'a> Feed<'a> {
    /// Switch to oldest-first order
    pub fn chronological(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Drop items whose sequence numbers the caller has already marked read
    pub fn unread(self, read: &'a HashSet<u64>) -> impl Iterator<Item = FeedItem> + 'a {
        self.filter(move |item| !read.contains(&item.seq))
    }

    fn take_oldest(&mut self) -> Option<&'a ProgressionEvent> {
        if self.front >= self.back {
            return None;
        }
        self.front += 1;
        Some(&self.events[self.front - 1])
    }

    fn take_newest(&mut self) -> Option<&'a ProgressionEvent> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.events[self.back])
    }
}

impl<'a> Iterator for Feed<'a> {
    type Item = FeedItem;

    fn next(&mut self) -> Option<FeedItem> {
        let event = if self.newest_first {
            self.take_newest()
        } else {
            self.take_oldest()
        };
        event.map(render_event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a> DoubleEndedIterator for Feed<'a> {
    fn next_back(&mut self) -> Option<FeedItem> {
        let event = if self.newest_first {
            self.take_oldest()
        } else {
            self.take_newest()
        };
        event.map(render_event)
    }
}

impl<'a> ExactSizeIterator for Feed<'a> {}
