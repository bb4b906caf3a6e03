use serde::{Deserialize, Serialize};

use super::state::RoundStats;

/// 结算界面的评级，按尝试次数划分。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceTier {
    Completed,
    Good,
    Excellent,
    Perfect,
}

impl PerformanceTier {
    pub fn from_attempts(attempts: u32) -> Self {
        match attempts {
            0..=12 => PerformanceTier::Perfect,
            13..=16 => PerformanceTier::Excellent,
            17..=24 => PerformanceTier::Good,
            _ => PerformanceTier::Completed,
        }
    }

    pub fn stars(self) -> u8 {
        match self {
            PerformanceTier::Perfect => 3,
            PerformanceTier::Excellent => 2,
            PerformanceTier::Good => 1,
            PerformanceTier::Completed => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Perfect => "PERFECT",
            PerformanceTier::Excellent => "EXCELLENT",
            PerformanceTier::Good => "GOOD",
            PerformanceTier::Completed => "COMPLETED",
        }
    }
}

/// `MM:SS`，分钟不封顶。
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierInfo {
    pub tier: PerformanceTier,
    pub label: String,
    pub stars: u8,
}

impl From<PerformanceTier> for TierInfo {
    fn from(tier: PerformanceTier) -> Self {
        Self {
            tier,
            label: tier.label().to_string(),
            stars: tier.stars(),
        }
    }
}

/// 胜利界面展示的完整结算。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub stats: RoundStats,
    pub tier: PerformanceTier,
    pub label: String,
    pub stars: u8,
    pub time_label: String,
    pub pairs_total: usize,
}

impl RoundSummary {
    pub fn new(stats: RoundStats, pairs_total: usize) -> Self {
        let tier = PerformanceTier::from_attempts(stats.attempts);
        Self {
            stats,
            tier,
            label: tier.label().to_string(),
            stars: tier.stars(),
            time_label: format_time(stats.time_elapsed),
            pairs_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive() {
        let cases = [
            (0, PerformanceTier::Perfect, 3),
            (8, PerformanceTier::Perfect, 3),
            (12, PerformanceTier::Perfect, 3),
            (13, PerformanceTier::Excellent, 2),
            (16, PerformanceTier::Excellent, 2),
            (17, PerformanceTier::Good, 1),
            (24, PerformanceTier::Good, 1),
            (25, PerformanceTier::Completed, 0),
            (400, PerformanceTier::Completed, 0),
        ];
        for (attempts, tier, stars) in cases {
            let actual = PerformanceTier::from_attempts(attempts);
            assert_eq!(actual, tier, "attempts = {attempts}");
            assert_eq!(actual.stars(), stars, "attempts = {attempts}");
        }
    }

    #[test]
    fn tiers_order_by_quality() {
        assert!(PerformanceTier::Perfect > PerformanceTier::Excellent);
        assert!(PerformanceTier::Good > PerformanceTier::Completed);
    }

    #[test]
    fn time_is_formatted_as_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(6000), "100:00");
    }

    #[test]
    fn summary_bundles_tier_and_time() {
        let stats = RoundStats {
            time_elapsed: 74,
            attempts: 14,
            matches: 8,
        };
        let summary = RoundSummary::new(stats, 8);
        assert_eq!(summary.tier, PerformanceTier::Excellent);
        assert_eq!(summary.stars, 2);
        assert_eq!(summary.label, "EXCELLENT");
        assert_eq!(summary.time_label, "01:14");

        let json = serde_json::to_value(&summary).expect("summary should serialize");
        assert_eq!(json["tier"], "EXCELLENT");
        assert_eq!(json["timeLabel"], "01:14");
    }
}
