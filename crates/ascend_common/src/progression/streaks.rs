//! Streak calculation (v0.4.0).
//!
//! Day boundaries are decided by the caller's calendar; this module only folds
//! `(active, boundary)` observations into a streak count.

/// Streak lengths that produce a milestone event
pub const DEFAULT_MILESTONES: &[u32] = &[3, 7, 30];

/// What a single day-boundary observation did to the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// No boundary crossed, nothing to do
    Unchanged,
    /// Active on the new day
    Extended { from: u32, to: u32 },
    /// Missed the day
    Reset { from: u32 },
}

impl StreakChange {
    /// Streak value after the change, given the value before
    pub fn apply(self, current: u32) -> u32 {
        match self {
            StreakChange::Unchanged => current,
            StreakChange::Extended { to, .. } => to,
            StreakChange::Reset { .. } => 0,
        }
    }
}

/// Decide how a streak moves for one observation.
///
/// Without a day boundary the streak never moves, which is what stops double
/// increments within a single day.
pub fn advance_streak(current: u32, is_active_today: bool, day_boundary_crossed: bool) -> StreakChange {
    if !day_boundary_crossed {
        return StreakChange::Unchanged;
    }

    if is_active_today {
        StreakChange::Extended {
            from: current,
            to: current.saturating_add(1),
        }
    } else {
        StreakChange::Reset { from: current }
    }
}

/// Milestone hit by moving from `from` to `to`, if any
pub fn milestone_reached(milestones: &[u32], from: u32, to: u32) -> Option<u32> {
    if to <= from {
        return None;
    }
    milestones.iter().copied().find(|m| *m == to)
}

/// Streak value after each day, for a run of day-boundary observations
pub fn streak_sequence(days: &[bool]) -> Vec<u32> {
    let mut current = 0u32;
    days.iter()
        .map(|active| {
            current = advance_streak(current, *active, true).apply(current);
            current
        })
        .collect()
}

/// Longest streak in a run of day-boundary observations
pub fn best_streak(days: &[bool]) -> u32 {
    streak_sequence(days).into_iter().max().unwrap_or(0)
}
