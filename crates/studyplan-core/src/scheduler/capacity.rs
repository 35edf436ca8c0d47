//! Per-day capacity: weekly pattern, dated overrides, and the working set
//! of remaining minutes threaded through the allocation passes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::weekday_index;
use crate::error::ValidationError;

/// Minutes available on a day with neither an override nor a weekly entry.
pub const DEFAULT_CAPACITY_MINUTES: u32 = 150;

/// A date-specific capacity that supersedes the weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityOverride {
    pub minutes: u32,
    /// e.g. "Half Term", "Exam Leave"
    #[serde(default)]
    pub label: Option<String>,
}

/// User capacity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Weekday index (0 = Sunday) to minutes.
    #[serde(default)]
    pub weekly: BTreeMap<u8, u32>,
    #[serde(default)]
    pub overrides: BTreeMap<NaiveDate, CapacityOverride>,
    #[serde(default = "default_capacity_minutes")]
    pub default_minutes: u32,
}

fn default_capacity_minutes() -> u32 {
    DEFAULT_CAPACITY_MINUTES
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            weekly: BTreeMap::new(),
            overrides: BTreeMap::new(),
            default_minutes: DEFAULT_CAPACITY_MINUTES,
        }
    }
}

/// Resolved capacity for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCapacity {
    pub minutes: u32,
    pub label: Option<String>,
}

impl CapacityConfig {
    pub fn with_weekday(mut self, weekday: u8, minutes: u32) -> Self {
        self.weekly.insert(weekday, minutes);
        self
    }

    pub fn with_override(mut self, date: NaiveDate, minutes: u32, label: Option<&str>) -> Self {
        self.overrides.insert(
            date,
            CapacityOverride {
                minutes,
                label: label.map(str::to_string),
            },
        );
        self
    }

    /// Reject weekday keys outside 0..=6.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.weekly.keys().find(|&&w| w > 6) {
            Some(&weekday) => Err(ValidationError::InvalidWeekday {
                id: "capacity.weekly".into(),
                weekday,
            }),
            None => Ok(()),
        }
    }

    /// Override > weekly pattern > default.
    pub fn resolve(&self, date: NaiveDate) -> DayCapacity {
        if let Some(o) = self.overrides.get(&date) {
            return DayCapacity {
                minutes: o.minutes,
                label: o.label.clone(),
            };
        }
        let minutes = self
            .weekly
            .get(&weekday_index(date))
            .copied()
            .unwrap_or(self.default_minutes);
        DayCapacity {
            minutes,
            label: None,
        }
    }
}

pub type CapacityMap = BTreeMap<NaiveDate, DayCapacity>;

/// Resolve capacity for each date of a range.
pub fn build_capacity_map(config: &CapacityConfig, dates: &[NaiveDate]) -> CapacityMap {
    dates.iter().map(|&d| (d, config.resolve(d))).collect()
}

/// Minutes still free per horizon date while the allocation passes run.
///
/// Values may go negative when a pass force-places work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingCapacity {
    by_date: BTreeMap<NaiveDate, i64>,
}

impl RemainingCapacity {
    pub fn from_map(map: &CapacityMap) -> Self {
        Self {
            by_date: map.iter().map(|(d, c)| (*d, c.minutes as i64)).collect(),
        }
    }

    /// Remaining minutes on `date`, or `None` outside the horizon.
    pub fn get(&self, date: NaiveDate) -> Option<i64> {
        self.by_date.get(&date).copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    /// Deduct minutes; dates outside the horizon are ignored.
    pub fn consume(&mut self, date: NaiveDate, minutes: u32) {
        if let Some(rem) = self.by_date.get_mut(&date) {
            *rem -= minutes as i64;
        }
    }

    /// Horizon dates in chronological order.
    pub fn dates(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{horizon, parse_date_key};

    fn d(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    #[test]
    fn empty_config_falls_through_to_default() {
        let cfg = CapacityConfig::default();
        assert_eq!(cfg.resolve(d("2026-10-19")).minutes, 150);
    }

    #[test]
    fn override_beats_weekly_pattern() {
        // 2026-10-24 is a Saturday
        let cfg = CapacityConfig::default()
            .with_weekday(6, 240)
            .with_override(d("2026-10-24"), 0, Some("Exam Leave"));
        let sat = cfg.resolve(d("2026-10-24"));
        assert_eq!(sat.minutes, 0);
        assert_eq!(sat.label.as_deref(), Some("Exam Leave"));
        assert_eq!(cfg.resolve(d("2026-10-31")).minutes, 240);
        assert_eq!(cfg.resolve(d("2026-10-30")).minutes, 150);
    }

    #[test]
    fn validate_rejects_weekday_seven() {
        let cfg = CapacityConfig::default().with_weekday(7, 60);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn remaining_capacity_tracks_overload() {
        let dates = horizon(d("2026-10-19"), 2);
        let cfg = CapacityConfig::default();
        let mut rem = RemainingCapacity::from_map(&build_capacity_map(&cfg, &dates));
        rem.consume(d("2026-10-19"), 200);
        rem.consume(d("2030-01-01"), 10);
        assert_eq!(rem.get(d("2026-10-19")), Some(-50));
        assert_eq!(rem.get(d("2026-10-20")), Some(150));
        assert_eq!(rem.get(d("2030-01-01")), None);
    }

    #[test]
    fn config_deserializes_date_keys() {
        let json = r#"{"weekly":{"6":240},"overrides":{"2026-10-24":{"minutes":0,"label":"Exam Leave"}}}"#;
        let cfg: CapacityConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.default_minutes, 150);
        assert_eq!(cfg.weekly.get(&6), Some(&240));
        assert_eq!(cfg.resolve(d("2026-10-24")).minutes, 0);
    }
}
