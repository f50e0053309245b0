//! Progression Module v0.4.0
//!
//! Leveling arithmetic for the learner curriculum.
//!
//! ## Level System
//!
//! - Four tiers: apprentice, journeyman, master, graduate
//! - Fixed ascending thresholds, inclusive, saturating at the top
//!
//! ## XP
//!
//! - Rewards are clamped to be non-negative
//! - Simulation payouts scale the scenario cap by the final score
//!
//! ## Streaks
//!
//! - Consecutive active days, advanced only on a caller-supplied day boundary

pub mod levels;
pub mod streaks;
pub mod xp;

pub use levels::{level_for, progress_percent, xp_to_next_level, Level, LEVEL_THRESHOLDS};
pub use streaks::{advance_streak, best_streak, milestone_reached, streak_sequence, StreakChange, DEFAULT_MILESTONES};
pub use xp::{apply_impact, normalize_reward, simulation_payout, MAX_SCORE, MIN_SCORE, NEUTRAL_SCORE};
