use serde::{Deserialize, Serialize};

/// Scarcity of one slot. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Classifies remaining capacity. First matching tier wins:
///
/// - critical: `available <= 2` or at most 10% left
/// - high: `available <= 5` or at most 25% left
/// - medium: at most 50% left
/// - low: otherwise
///
/// A non-positive `total` disables the percentage checks.
pub fn urgency_level(available: i32, total: i32) -> UrgencyLevel {
    let available = i64::from(available);
    let total = i64::from(total);
    // available / total <= pct / 100, kept in integers
    let at_most_pct = |pct: i64| total > 0 && available * 100 <= total * pct;

    if available <= 2 || at_most_pct(10) {
        UrgencyLevel::Critical
    } else if available <= 5 || at_most_pct(25) {
        UrgencyLevel::High
    } else if at_most_pct(50) {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

/// Calendar bucket for how many slots a date still has
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityThresholds {
    /// Up to this many slots is `low`
    pub low_max: u32,
    /// Up to this many slots is `medium`
    pub medium_max: u32,
}

impl Default for AvailabilityThresholds {
    fn default() -> Self {
        Self {
            low_max: 1,
            medium_max: 3,
        }
    }
}

impl AvailabilityThresholds {
    pub fn level_for(&self, slots_available: u32) -> AvailabilityLevel {
        if slots_available == 0 {
            AvailabilityLevel::None
        } else if slots_available <= self.low_max {
            AvailabilityLevel::Low
        } else if slots_available <= self.medium_max.max(self.low_max) {
            AvailabilityLevel::Medium
        } else {
            AvailabilityLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_urgency_tiers() {
        assert_eq!(urgency_level(1, 10), UrgencyLevel::Critical);
        assert_eq!(urgency_level(2, 100), UrgencyLevel::Critical);
        assert_eq!(urgency_level(10, 100), UrgencyLevel::Critical);
        assert_eq!(urgency_level(5, 10), UrgencyLevel::High);
        assert_eq!(urgency_level(25, 100), UrgencyLevel::High);
        assert_eq!(urgency_level(50, 100), UrgencyLevel::Medium);
        assert_eq!(urgency_level(8, 10), UrgencyLevel::Low);
    }

    #[test]
    fn test_absolute_floor_beats_large_capacity() {
        assert_eq!(urgency_level(2, 500), UrgencyLevel::Critical);
        assert_eq!(urgency_level(4, 500), UrgencyLevel::High);
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(urgency_level(0, 0), UrgencyLevel::Critical);
    }

    #[test]
    fn test_date_levels() {
        let thresholds = AvailabilityThresholds::default();
        assert_eq!(thresholds.level_for(0), AvailabilityLevel::None);
        assert_eq!(thresholds.level_for(1), AvailabilityLevel::Low);
        assert_eq!(thresholds.level_for(3), AvailabilityLevel::Medium);
        assert_eq!(thresholds.level_for(4), AvailabilityLevel::High);
    }

    proptest! {
        #[test]
        fn prop_urgency_never_rises_with_more_seats(total in 1i32..2000, a in 0i32..2000, b in 0i32..2000) {
            let (fewer, more) = if a <= b { (a, b) } else { (b, a) };
            prop_assume!(more <= total);
            prop_assert!(urgency_level(more, total) <= urgency_level(fewer, total));
        }

        #[test]
        fn prop_date_level_is_monotone(low in 0u32..10, medium in 0u32..20, a in 0u32..50, b in 0u32..50) {
            let thresholds = AvailabilityThresholds { low_max: low, medium_max: medium };
            let (fewer, more) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(thresholds.level_for(fewer) <= thresholds.level_for(more));
        }
    }
}
