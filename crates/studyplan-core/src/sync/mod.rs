//! Write a freshly computed plan back to durable storage.
//!
//! Re-syncing replaces the not-yet-completed revision slots from a
//! "sync-from" date onward and moves non-fixed homework to its newly
//! allocated day. Today is protected when it is already in motion: sync
//! starts tomorrow if today has committed slots, is partly consumed, or has
//! too little capacity left.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::add_days;
use crate::error::Result;
use crate::schedule::DeadlineTask;
use crate::scheduler::{PlannedRevisionSlot, WeekPlan};

/// Thresholds that keep sync away from a day already in motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPolicy {
    pub min_remaining_minutes: u32,
    pub max_consumed_ratio: f64,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            min_remaining_minutes: 90,
            max_consumed_ratio: 0.25,
        }
    }
}

/// How much of today has been used so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TodayUsage {
    pub base_capacity: u32,
    pub consumed_minutes: u32,
}

impl TodayUsage {
    pub fn remaining_minutes(&self) -> u32 {
        self.base_capacity.saturating_sub(self.consumed_minutes)
    }

    /// Share of today's capacity already consumed. A zero-capacity day
    /// counts as fully consumed.
    pub fn consumed_ratio(&self) -> f64 {
        if self.base_capacity == 0 {
            return 1.0;
        }
        f64::from(self.consumed_minutes) / f64::from(self.base_capacity)
    }
}

/// First date sync may overwrite.
pub fn choose_sync_from(
    today: NaiveDate,
    has_committed_today: bool,
    usage: &TodayUsage,
    policy: &SyncPolicy,
) -> NaiveDate {
    let in_motion = has_committed_today
        || usage.consumed_ratio() > policy.max_consumed_ratio
        || usage.remaining_minutes() < policy.min_remaining_minutes;
    if in_motion {
        add_days(today, 1)
    } else {
        today
    }
}

/// A committed revision slot as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSlotRow {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub label: String,
    pub completed: bool,
    pub subject: String,
}

impl RevisionSlotRow {
    pub fn from_planned(user_id: &str, slot: &PlannedRevisionSlot) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exam_id: slot.exam_id.clone(),
            date: slot.date,
            duration_minutes: slot.minutes,
            label: slot.label.clone(),
            completed: false,
            subject: slot.subject.clone(),
        }
    }
}

/// Durable storage the sync writes through.
pub trait PlanStore {
    /// Whether `user_id` has any committed slot on `date`.
    fn has_slots_on(&self, user_id: &str, date: NaiveDate) -> Result<bool>;

    /// Atomically delete the user's open slots dated `from` or later and
    /// insert `rows`. Returns the number of rows deleted.
    fn replace_open_slots_from(&mut self, user_id: &str, from: NaiveDate, rows: &[RevisionSlotRow]) -> Result<usize>;

    fn set_scheduled_date(&mut self, task_id: &str, date: Option<NaiveDate>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sync_from: NaiveDate,
    pub removed_slots: usize,
    pub inserted_slots: usize,
    pub rescheduled_tasks: usize,
}

/// Commit `plan` to `store` for `user_id`.
///
/// `deadlines` are the tasks the plan was built from; only tasks whose
/// allocated day differs from their stored `scheduled_date` are rewritten.
///
/// # Errors
/// Storage failures are logged and returned. The slot replacement is one
/// transaction, so a failed insert leaves the previous schedule in place.
pub fn sync_plan<S: PlanStore + ?Sized>(
    store: &mut S,
    plan: &WeekPlan,
    deadlines: &[DeadlineTask],
    usage: &TodayUsage,
    policy: &SyncPolicy,
    user_id: &str,
) -> Result<SyncReport> {
    let today = plan.today;
    let has_committed_today = store.has_slots_on(user_id, today)?;
    let sync_from = choose_sync_from(today, has_committed_today, usage, policy);

    let rows: Vec<RevisionSlotRow> = plan
        .revision_slots()
        .filter(|slot| slot.date >= sync_from)
        .map(|slot| RevisionSlotRow::from_planned(user_id, slot))
        .collect();

    let removed_slots = store
        .replace_open_slots_from(user_id, sync_from, &rows)
        .inspect_err(|e| tracing::error!(error = %e, %sync_from, "failed to replace revision slots"))?;

    let mut rescheduled_tasks = 0;
    for (date, item) in plan.homework_items() {
        if item.completed || item.pinned || date < sync_from {
            continue;
        }
        let source = deadlines.iter().find(|t| t.id == item.task_id);
        // pins are owned by the user, never by sync
        if source.is_some_and(|t| t.is_fixed) {
            continue;
        }
        if source.and_then(|t| t.scheduled_date) == Some(date) {
            continue;
        }
        store
            .set_scheduled_date(&item.task_id, Some(date))
            .inspect_err(|e| tracing::error!(error = %e, task_id = %item.task_id, "failed to move homework"))?;
        rescheduled_tasks += 1;
    }

    tracing::info!(
        %sync_from,
        removed_slots,
        inserted_slots = rows.len(),
        rescheduled_tasks,
        "plan synced"
    );

    Ok(SyncReport {
        sync_from,
        removed_slots,
        inserted_slots: rows.len(),
        rescheduled_tasks,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::calendar::parse_date_key;
    use crate::error::CoreError;
    use crate::schedule::{DeadlineStatus, Exam, ExamType};
    use crate::scheduler::{build_week_plan, PlanInputs};

    fn today() -> NaiveDate {
        parse_date_key("2026-10-19").unwrap()
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Vec<RevisionSlotRow>,
        scheduled: BTreeMap<String, Option<NaiveDate>>,
        fail_replace: bool,
    }

    impl PlanStore for MemoryStore {
        fn has_slots_on(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
            Ok(self.rows.iter().any(|r| r.user_id == user_id && r.date == date))
        }

        fn replace_open_slots_from(
            &mut self,
            user_id: &str,
            from: NaiveDate,
            rows: &[RevisionSlotRow],
        ) -> Result<usize> {
            if self.fail_replace {
                return Err(CoreError::Custom("disk full".into()));
            }
            let before = self.rows.len();
            self.rows
                .retain(|r| r.user_id != user_id || r.date < from || r.completed);
            let removed = before - self.rows.len();
            self.rows.extend_from_slice(rows);
            Ok(removed)
        }

        fn set_scheduled_date(&mut self, task_id: &str, date: Option<NaiveDate>) -> Result<()> {
            self.scheduled.insert(task_id.to_string(), date);
            Ok(())
        }
    }

    fn row(date: NaiveDate, completed: bool) -> RevisionSlotRow {
        RevisionSlotRow {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "local".into(),
            exam_id: "old".into(),
            date,
            duration_minutes: 30,
            label: "Old Revision".into(),
            completed,
            subject: "Old".into(),
        }
    }

    fn inputs() -> PlanInputs {
        PlanInputs {
            deadlines: vec![DeadlineTask {
                id: "h".into(),
                name: "Essay".into(),
                subject: None,
                due_date: add_days(today(), 3),
                estimated_minutes: 60,
                completed_minutes: 0,
                status: DeadlineStatus::Active,
                scheduled_date: None,
                is_fixed: false,
                completed_on: None,
            }],
            exams: vec![Exam {
                id: "e".into(),
                subject: Some("Biology".into()),
                exam_type: ExamType::Internal,
                board: None,
                competitive_name: None,
                date: add_days(today(), 4),
                color: None,
                preparedness: Some(50),
                topics: Vec::new(),
            }],
            ..PlanInputs::default()
        }
    }

    #[test]
    fn fresh_day_syncs_from_today() {
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };
        assert_eq!(choose_sync_from(today(), false, &usage, &SyncPolicy::default()), today());
    }

    #[test]
    fn day_in_motion_syncs_from_tomorrow() {
        let policy = SyncPolicy::default();
        let tomorrow = add_days(today(), 1);
        let fresh = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };
        assert_eq!(choose_sync_from(today(), true, &fresh, &policy), tomorrow);

        // 40 of 150 is over a quarter
        let busy = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 40,
        };
        assert_eq!(choose_sync_from(today(), false, &busy, &policy), tomorrow);

        let short = TodayUsage {
            base_capacity: 80,
            consumed_minutes: 0,
        };
        assert_eq!(choose_sync_from(today(), false, &short, &policy), tomorrow);

        let rest_day = TodayUsage::default();
        assert_eq!(choose_sync_from(today(), false, &rest_day, &policy), tomorrow);
    }

    #[test]
    fn sync_replaces_open_slots_and_keeps_completed() {
        let plan = build_week_plan(&inputs(), today(), 7).unwrap();
        let mut store = MemoryStore {
            rows: vec![row(add_days(today(), 1), false), row(add_days(today(), 2), true)],
            ..MemoryStore::default()
        };
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };

        let report = sync_plan(&mut store, &plan, &inputs().deadlines, &usage, &SyncPolicy::default(), "local").unwrap();

        assert_eq!(report.sync_from, today());
        assert_eq!(report.removed_slots, 1);
        assert_eq!(report.inserted_slots, plan.revision_slots().count());
        assert!(store.rows.iter().any(|r| r.completed && r.exam_id == "old"));
        assert!(!store.rows.iter().any(|r| !r.completed && r.exam_id == "old"));
        assert_eq!(store.scheduled.get("h"), Some(&Some(today())));
        assert_eq!(report.rescheduled_tasks, 1);
    }

    #[test]
    fn protected_today_keeps_todays_rows() {
        let plan = build_week_plan(&inputs(), today(), 7).unwrap();
        let mut store = MemoryStore {
            rows: vec![row(today(), false)],
            ..MemoryStore::default()
        };
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };

        let report = sync_plan(&mut store, &plan, &inputs().deadlines, &usage, &SyncPolicy::default(), "local").unwrap();

        assert_eq!(report.sync_from, add_days(today(), 1));
        assert_eq!(report.removed_slots, 0);
        assert!(store.rows.iter().any(|r| r.exam_id == "old" && r.date == today()));
        assert!(store.rows.iter().filter(|r| r.exam_id == "e").all(|r| r.date > today()));
        // homework planned today is not moved
        assert!(store.scheduled.is_empty());
    }

    #[test]
    fn unchanged_homework_is_not_rewritten() {
        let mut inputs = inputs();
        inputs.deadlines[0].scheduled_date = Some(today());
        let plan = build_week_plan(&inputs, today(), 7).unwrap();
        let mut store = MemoryStore::default();
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };
        let report = sync_plan(&mut store, &plan, &inputs.deadlines, &usage, &SyncPolicy::default(), "local").unwrap();
        assert_eq!(report.rescheduled_tasks, 0);
    }

    #[test]
    fn storage_failure_is_returned() {
        let plan = build_week_plan(&inputs(), today(), 7).unwrap();
        let mut store = MemoryStore {
            fail_replace: true,
            rows: vec![row(add_days(today(), 1), false)],
            ..MemoryStore::default()
        };
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };
        let err = sync_plan(&mut store, &plan, &inputs().deadlines, &usage, &SyncPolicy::default(), "local");
        assert!(matches!(err, Err(CoreError::Custom(_))));
        assert_eq!(store.rows.len(), 1);
        assert!(store.scheduled.is_empty());
    }

    #[test]
    fn fixed_homework_dates_are_never_rewritten() {
        let mut inputs = inputs();
        let pinned = |id: &str, pin_in: i64, due_in: i64| DeadlineTask {
            id: id.into(),
            name: format!("Pinned {id}"),
            due_date: add_days(today(), due_in),
            scheduled_date: Some(add_days(today(), pin_in)),
            is_fixed: true,
            ..inputs.deadlines[0].clone()
        };
        // valid in horizon, valid past horizon, and a pin on the due date
        let fixed = vec![pinned("inside", 2, 3), pinned("beyond", 12, 20), pinned("stale", 3, 3)];
        inputs.deadlines.extend(fixed);
        let plan = build_week_plan(&inputs, today(), 7).unwrap();
        assert!(plan.homework_items().all(|(_, h)| h.task_id != "beyond"));

        let mut store = MemoryStore::default();
        let usage = TodayUsage {
            base_capacity: 150,
            consumed_minutes: 0,
        };
        let report = sync_plan(&mut store, &plan, &inputs.deadlines, &usage, &SyncPolicy::default(), "local").unwrap();

        assert_eq!(report.rescheduled_tasks, 1);
        assert_eq!(store.scheduled.keys().collect::<Vec<_>>(), vec!["h"]);
    }
}
