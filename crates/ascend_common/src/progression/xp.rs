//! XP arithmetic shared by the reducer and the simulation state machine.
//!
//! Content is trusted but loosely authored, so out-of-range numbers are
//! normalized here instead of being rejected.

/// Neutral prior every simulation run starts from
pub const NEUTRAL_SCORE: u8 = 50;
/// Lowest simulation score
pub const MIN_SCORE: u8 = 0;
/// Highest simulation score
pub const MAX_SCORE: u8 = 100;

/// Clamp a signed reward to a non-negative XP amount
pub fn normalize_reward(reward: i64) -> u64 {
    reward.max(0) as u64
}

/// Apply a signed impact to a score and clamp into [0, 100]
pub fn apply_impact(score: u8, impact: i32) -> u8 {
    let raw = score as i64 + impact as i64;
    raw.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8
}

/// Payout for a finished simulation: `xp_cap * score / 100`, rounded half-up.
///
/// Computed in integers so the result is exact for every input.
pub fn simulation_payout(xp_cap: u64, score: u8) -> u64 {
    let score = score.min(MAX_SCORE) as u128;
    let scaled = xp_cap as u128 * score + 50;
    (scaled / 100).min(u64::MAX as u128) as u64
}
