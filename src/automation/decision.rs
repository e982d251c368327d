use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ocr::LootReading;

/// Minimum loot a base needs before the session stops on it. Inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub gold_min: u64,
    pub elixir_min: u64,
    pub dark_min: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            gold_min: 800_000,
            elixir_min: 800_000,
            dark_min: 10_000,
        }
    }
}

/// What to do with the base currently on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Every counter meets its threshold
    Match,
    /// All counters read zero: no base loaded yet
    Empty,
    /// Anything else
    Skip,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Match => write!(f, "MATCH"),
            Verdict::Empty => write!(f, "EMPTY"),
            Verdict::Skip => write!(f, "SKIP"),
        }
    }
}

/// Classifies a reading.
///
/// The zero check comes first so an all-zero reading is EMPTY even when the
/// thresholds are zero.
pub fn decide(reading: &LootReading, thresholds: &Thresholds) -> Verdict {
    if reading.is_zero() {
        Verdict::Empty
    } else if reading.gold >= thresholds.gold_min
        && reading.elixir >= thresholds.elixir_min
        && reading.dark >= thresholds.dark_min
    {
        Verdict::Match
    } else {
        Verdict::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds {
            gold_min: 800_000,
            elixir_min: 800_000,
            dark_min: 10_000,
        }
    }

    #[test]
    fn test_decide_match() {
        let reading = LootReading::new(900_000, 900_000, 20_000);
        assert_eq!(decide(&reading, &thresholds()), Verdict::Match);
    }

    #[test]
    fn test_decide_empty() {
        assert_eq!(decide(&LootReading::default(), &thresholds()), Verdict::Empty);
    }

    #[test]
    fn test_decide_skip() {
        let reading = LootReading::new(500_000, 900_000, 20_000);
        assert_eq!(decide(&reading, &thresholds()), Verdict::Skip);
    }

    #[test]
    fn test_decide_thresholds_are_inclusive() {
        let reading = LootReading::new(800_000, 800_000, 10_000);
        assert_eq!(decide(&reading, &thresholds()), Verdict::Match);

        let reading = LootReading::new(800_000, 800_000, 9_999);
        assert_eq!(decide(&reading, &thresholds()), Verdict::Skip);
    }

    #[test]
    fn test_decide_zero_reading_with_zero_thresholds_is_empty() {
        let zero = Thresholds {
            gold_min: 0,
            elixir_min: 0,
            dark_min: 0,
        };
        assert_eq!(decide(&LootReading::default(), &zero), Verdict::Empty);
        assert_eq!(decide(&LootReading::new(0, 0, 1), &zero), Verdict::Match);
    }

    #[test]
    fn test_decide_partial_zero_is_skip() {
        let reading = LootReading::new(0, 900_000, 20_000);
        assert_eq!(decide(&reading, &thresholds()), Verdict::Skip);
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Match.to_string(), "MATCH");
        assert_eq!(Verdict::Empty.to_string(), "EMPTY");
        assert_eq!(Verdict::Skip.to_string(), "SKIP");
    }
}
