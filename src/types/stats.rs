//! Visit and usage statistics

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const HOUR_SECS: u64 = 3600;
const DAY_SECS: u64 = 24 * HOUR_SECS;

/// Time bucket granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Hourly,
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hourly => "hourly",
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// How long a bucket of this granularity is kept
    pub fn expiry(&self) -> Duration {
        let secs = match self {
            Period::Hourly => 48 * HOUR_SECS,
            Period::Daily => 30 * DAY_SECS,
            Period::Weekly => 90 * DAY_SECS,
            Period::Monthly => 365 * DAY_SECS,
            Period::Yearly => 2 * 365 * DAY_SECS,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page views and unique visitors for one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStats {
    pub pv: u64,
    pub uv: u64,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub hourly: TimeStats,
    pub daily: TimeStats,
    pub weekly: TimeStats,
    pub monthly: TimeStats,
    pub yearly: TimeStats,
    pub tarot_calls: u64,
    pub iching_calls: u64,
}

impl StatsSnapshot {
    pub fn period(&self, period: Period) -> TimeStats {
        match period {
            Period::Hourly => self.hourly,
            Period::Daily => self.daily,
            Period::Weekly => self.weekly,
            Period::Monthly => self.monthly,
            Period::Yearly => self.yearly,
        }
    }

    pub fn period_mut(&mut self, period: Period) -> &mut TimeStats {
        match period {
            Period::Hourly => &mut self.hourly,
            Period::Daily => &mut self.daily,
            Period::Weekly => &mut self.weekly,
            Period::Monthly => &mut self.monthly,
            Period::Yearly => &mut self.yearly,
        }
    }
}

/// `POST /api/stats/increment`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageViewRequest {
    #[serde(default)]
    pub page: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageViewResponse {
    pub success: bool,
    /// False when the page is not a tracked route
    pub counted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_buckets_live_two_days() {
        assert_eq!(Period::Hourly.expiry(), Duration::from_secs(48 * 3600));
    }

    #[test]
    fn test_snapshot_uses_camel_case_counters() {
        let snapshot = StatsSnapshot { tarot_calls: 3, iching_calls: 5, ..Default::default() };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tarotCalls"], 3);
        assert_eq!(json["ichingCalls"], 5);
        assert_eq!(json["hourly"]["pv"], 0);
    }
}
