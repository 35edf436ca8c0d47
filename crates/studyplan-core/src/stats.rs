//! Progress against a day's plan.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scheduler::{DayPlan, PlanItem};
use crate::sync::TodayUsage;

/// Plan item keys marked done, by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLedger {
    done: BTreeMap<NaiveDate, BTreeSet<String>>,
}

impl CompletionLedger {
    pub fn mark(&mut self, date: NaiveDate, key: impl Into<String>) {
        self.done.entry(date).or_default().insert(key.into());
    }

    pub fn unmark(&mut self, date: NaiveDate, key: &str) -> bool {
        let Some(keys) = self.done.get_mut(&date) else {
            return false;
        };
        let removed = keys.remove(key);
        if keys.is_empty() {
            self.done.remove(&date);
        }
        removed
    }

    pub fn is_done(&self, date: NaiveDate, key: &str) -> bool {
        self.done.get(&date).is_some_and(|keys| keys.contains(key))
    }

    pub fn keys_on(&self, date: NaiveDate) -> impl Iterator<Item = &str> {
        self.done.get(&date).into_iter().flatten().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketProgress {
    pub planned_minutes: u32,
    pub done_minutes: u32,
}

impl BucketProgress {
    fn add(&mut self, minutes: u32, done: bool) {
        self.planned_minutes += minutes;
        if done {
            self.done_minutes += minutes;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub base_capacity: u32,
    pub weekly: BucketProgress,
    pub homework: BucketProgress,
    pub revision: BucketProgress,
    pub projects: BucketProgress,
    pub planned_minutes: u32,
    pub done_minutes: u32,
    /// Whole percent of planned minutes done; 0 for an empty day.
    pub percent: u8,
}

impl DayProgress {
    /// Homework the plan already shows as completed counts as done even
    /// without a ledger entry.
    pub fn from_day(day: &DayPlan, ledger: &CompletionLedger) -> Self {
        let mut weekly = BucketProgress::default();
        let mut homework = BucketProgress::default();
        let mut revision = BucketProgress::default();
        let mut projects = BucketProgress::default();

        for item in day.items() {
            let done = ledger.is_done(day.date, &item.key());
            match item {
                PlanItem::Weekly(w) => weekly.add(w.minutes, done),
                PlanItem::Homework(h) => homework.add(h.minutes, done || h.completed),
                PlanItem::Revision(r) => revision.add(r.minutes, done),
                PlanItem::Project(p) => projects.add(p.minutes, done),
            }
        }

        let buckets = [weekly, homework, revision, projects];
        let planned_minutes: u32 = buckets.iter().map(|b| b.planned_minutes).sum();
        let done_minutes: u32 = buckets.iter().map(|b| b.done_minutes).sum();
        let percent = if planned_minutes == 0 {
            0
        } else {
            (u64::from(done_minutes) * 100 / u64::from(planned_minutes)) as u8
        };

        Self {
            date: day.date,
            base_capacity: day.base_capacity,
            weekly,
            homework,
            revision,
            projects,
            planned_minutes,
            done_minutes,
            percent,
        }
    }

    /// Input for choosing where a re-sync may start.
    pub fn usage(&self) -> TodayUsage {
        TodayUsage {
            base_capacity: self.base_capacity,
            consumed_minutes: self.done_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_key;
    use crate::scheduler::{Bucket, HomeworkItem, WeeklyItem};

    fn date() -> NaiveDate {
        parse_date_key("2026-10-19").unwrap()
    }

    fn day() -> DayPlan {
        let mut weekly = Bucket::default();
        weekly.push(WeeklyItem {
            task_id: "r1".into(),
            name: "Violin".into(),
            subject: None,
            color: None,
            minutes: 60,
        });
        let mut homework = Bucket::default();
        homework.push(HomeworkItem {
            task_id: "h1".into(),
            name: "Reading".into(),
            subject: None,
            due_date: date(),
            minutes: 30,
            completed: false,
            pinned: false,
        });
        homework.push(HomeworkItem {
            task_id: "h2".into(),
            name: "Quiz prep".into(),
            subject: None,
            due_date: date(),
            minutes: 10,
            completed: true,
            pinned: false,
        });
        DayPlan::assemble(
            date(),
            150,
            None,
            weekly,
            homework,
            Bucket::default(),
            Bucket::default(),
        )
    }

    #[test]
    fn ledger_mark_and_unmark() {
        let mut ledger = CompletionLedger::default();
        ledger.mark(date(), "weekly:r1");
        assert!(ledger.is_done(date(), "weekly:r1"));
        assert_eq!(ledger.keys_on(date()).collect::<Vec<_>>(), vec!["weekly:r1"]);
        assert!(ledger.unmark(date(), "weekly:r1"));
        assert!(!ledger.unmark(date(), "weekly:r1"));
        assert_eq!(ledger, CompletionLedger::default());
    }

    #[test]
    fn progress_counts_ledger_and_completed_homework() {
        let mut ledger = CompletionLedger::default();
        ledger.mark(date(), "weekly:r1");
        let progress = DayProgress::from_day(&day(), &ledger);

        assert_eq!(progress.planned_minutes, 100);
        assert_eq!(progress.done_minutes, 70);
        assert_eq!(progress.weekly.done_minutes, 60);
        assert_eq!(progress.homework, BucketProgress { planned_minutes: 40, done_minutes: 10 });
        assert_eq!(progress.percent, 70);
        assert_eq!(progress.usage().consumed_minutes, 70);
        assert_eq!(progress.usage().base_capacity, 150);
    }

    #[test]
    fn empty_day_is_zero_percent() {
        let empty = DayPlan::assemble(
            date(),
            150,
            None,
            Bucket::default(),
            Bucket::default(),
            Bucket::default(),
            Bucket::default(),
        );
        let progress = DayProgress::from_day(&empty, &CompletionLedger::default());
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.planned_minutes, 0);
    }
}
