//! Level System v0.4.0
//!
//! Four curriculum tiers with fixed ascending XP thresholds.
//!
//! ## Thresholds
//!
//! | Tier       | From XP |
//! |------------|---------|
//! | Apprentice |       0 |
//! | Journeyman |     800 |
//! | Master     |   2,000 |
//! | Graduate   |   4,000 |
//!
//! Boundaries are inclusive and anything above the last threshold saturates
//! at Graduate.

use serde::{Deserialize, Serialize};

/// Tier thresholds, ascending. The first entry must start at 0.
pub const LEVEL_THRESHOLDS: &[(Level, u64)] = &[
    (Level::Apprentice, 0),
    (Level::Journeyman, 800),
    (Level::Master, 2_000),
    (Level::Graduate, 4_000),
];

/// Curriculum tier, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Apprentice,
    Journeyman,
    Master,
    Graduate,
}

impl Level {
    pub const ALL: [Level; 4] = [
        Level::Apprentice,
        Level::Journeyman,
        Level::Master,
        Level::Graduate,
    ];

    /// Level for a cumulative XP total
    pub fn from_xp(xp: u64) -> Self {
        level_for(xp)
    }

    /// Minimum XP at which this tier starts
    pub fn min_xp(self) -> u64 {
        LEVEL_THRESHOLDS
            .iter()
            .find(|(level, _)| *level == self)
            .map(|(_, min)| *min)
            .unwrap_or(0)
    }

    /// The tier after this one, if any
    pub fn next(self) -> Option<Level> {
        match self {
            Level::Apprentice => Some(Level::Journeyman),
            Level::Journeyman => Some(Level::Master),
            Level::Master => Some(Level::Graduate),
            Level::Graduate => None,
        }
    }

    /// Machine name, matches the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Apprentice => "apprentice",
            Level::Journeyman => "journeyman",
            Level::Master => "master",
            Level::Graduate => "graduate",
        }
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            Level::Apprentice => "Apprentice",
            Level::Journeyman => "Journeyman",
            Level::Master => "Master",
            Level::Graduate => "Graduate",
        }
    }

    /// Progress from this tier's floor to the next tier (0.0 - 1.0)
    pub fn progress_to_next(self, xp: u64) -> f64 {
        let Some(next) = self.next() else {
            return 1.0; // Top tier
        };

        let floor = self.min_xp();
        let range = next.min_xp().saturating_sub(floor);
        if range == 0 {
            return 1.0;
        }

        let progress = xp.saturating_sub(floor) as f64 / range as f64;
        progress.clamp(0.0, 1.0)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Apprentice
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown level: '{}'", s))
    }
}

/// Map cumulative XP to a tier.
///
/// Total over `u64`: every value lands in exactly one tier.
pub fn level_for(xp: u64) -> Level {
    LEVEL_THRESHOLDS
        .iter()
        .rev()
        .find(|(_, min)| xp >= *min)
        .map(|(level, _)| *level)
        .unwrap_or(Level::Apprentice)
}

/// XP still needed to reach the next tier (0 at the top)
pub fn xp_to_next_level(xp: u64) -> u64 {
    match level_for(xp).next() {
        Some(next) => next.min_xp().saturating_sub(xp),
        None => 0,
    }
}

/// Progress percentage towards the next tier (0-100)
pub fn progress_percent(xp: u64) -> u8 {
    (level_for(xp).progress_to_next(xp) * 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ascending() {
        assert_eq!(LEVEL_THRESHOLDS[0].1, 0);
        for pair in LEVEL_THRESHOLDS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
        }
    }

    #[test]
    fn test_level_for_boundaries() {
        assert_eq!(level_for(0), Level::Apprentice);
        assert_eq!(level_for(799), Level::Apprentice);
        assert_eq!(level_for(800), Level::Journeyman);
        assert_eq!(level_for(1_999), Level::Journeyman);
        assert_eq!(level_for(2_000), Level::Master);
        assert_eq!(level_for(3_999), Level::Master);
        assert_eq!(level_for(4_000), Level::Graduate);
    }

    #[test]
    fn test_level_for_saturates() {
        assert_eq!(level_for(1_000_000), Level::Graduate);
        assert_eq!(level_for(u64::MAX), Level::Graduate);
    }

    #[test]
    fn test_min_xp_matches_table() {
        for (level, min) in LEVEL_THRESHOLDS {
            assert_eq!(level.min_xp(), *min);
            assert_eq!(level_for(*min), *level);
        }
    }

    #[test]
    fn test_next_chain() {
        assert_eq!(Level::Apprentice.next(), Some(Level::Journeyman));
        assert_eq!(Level::Master.next(), Some(Level::Graduate));
        assert_eq!(Level::Graduate.next(), None);
    }

    #[test]
    fn test_xp_to_next_level() {
        assert_eq!(xp_to_next_level(0), 800);
        assert_eq!(xp_to_next_level(750), 50);
        assert_eq!(xp_to_next_level(800), 1_200);
        assert_eq!(xp_to_next_level(4_000), 0);
        assert_eq!(xp_to_next_level(9_999), 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0), 0);
        assert_eq!(progress_percent(400), 50);
        assert_eq!(progress_percent(1_400), 50);
        assert_eq!(progress_percent(5_000), 100);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Journeyman".parse::<Level>(), Ok(Level::Journeyman));
        assert_eq!(" master ".parse::<Level>(), Ok(Level::Master));
        assert!("wizard".parse::<Level>().is_err());
        assert_eq!(Level::Graduate.to_string(), "Graduate");
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Level::Journeyman).unwrap();
        assert_eq!(json, "\"journeyman\"");
        let parsed: Level = serde_json::from_str("\"graduate\"").unwrap();
        assert_eq!(parsed, Level::Graduate);
    }
}
