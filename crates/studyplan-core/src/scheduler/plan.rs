//! Assembled plan: one [`DayPlan`] per horizon date with four load buckets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::ExamType;

/// Anything placed into a bucket carries a duration.
pub trait Timed {
    fn minutes(&self) -> u32;
}

/// One load bucket of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket<T> {
    pub minutes: u32,
    pub items: Vec<T>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            minutes: 0,
            items: Vec::new(),
        }
    }
}

impl<T: Timed> Bucket<T> {
    pub fn push(&mut self, item: T) {
        self.minutes += item.minutes();
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyItem {
    pub task_id: String,
    pub name: String,
    pub subject: Option<String>,
    pub color: Option<String>,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkItem {
    pub task_id: String,
    pub name: String,
    pub subject: Option<String>,
    pub due_date: NaiveDate,
    pub minutes: u32,
    /// Completed work still occupying its completion day.
    pub completed: bool,
    /// Placed on a user-pinned date.
    pub pinned: bool,
}

/// Which revision pass produced a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTier {
    /// Reserved block on the day before the exam
    Final,
    /// Regular capacity fill
    Revision,
    /// Forced overflow close to the exam
    ExtraPrep,
}

impl SlotTier {
    pub fn label(&self, subject: &str) -> String {
        match self {
            SlotTier::Final => format!("FINAL: {subject}"),
            SlotTier::Revision => format!("{subject} Revision"),
            SlotTier::ExtraPrep => format!("{subject} Extra Prep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedRevisionSlot {
    pub date: NaiveDate,
    pub exam_id: String,
    pub subject: String,
    pub exam_type: ExamType,
    pub minutes: u32,
    pub label: String,
    pub tier: SlotTier,
    /// Position among this exam's slots on the same date.
    pub seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub project_id: String,
    pub name: String,
    pub subject: Option<String>,
    pub due_date: NaiveDate,
    pub minutes: u32,
}

macro_rules! impl_timed {
    ($($ty:ty),+) => {
        $(impl Timed for $ty {
            fn minutes(&self) -> u32 {
                self.minutes
            }
        })+
    };
}

impl_timed!(WeeklyItem, HomeworkItem, PlannedRevisionSlot, ProjectItem);

/// Borrowed view over any bucket item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanItem<'a> {
    Weekly(&'a WeeklyItem),
    Homework(&'a HomeworkItem),
    Revision(&'a PlannedRevisionSlot),
    Project(&'a ProjectItem),
}

impl PlanItem<'_> {
    /// Identifier used by the completion ledger, unique within a day.
    pub fn key(&self) -> String {
        match self {
            PlanItem::Weekly(w) => format!("weekly:{}", w.task_id),
            PlanItem::Homework(h) => format!("homework:{}", h.task_id),
            PlanItem::Revision(r) => format!("revision:{}:{}", r.exam_id, r.seq),
            PlanItem::Project(p) => format!("project:{}", p.project_id),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PlanItem::Weekly(w) => &w.name,
            PlanItem::Homework(h) => &h.name,
            PlanItem::Revision(r) => &r.label,
            PlanItem::Project(p) => &p.name,
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            PlanItem::Weekly(w) => w.minutes,
            PlanItem::Homework(h) => h.minutes,
            PlanItem::Revision(r) => r.minutes,
            PlanItem::Project(p) => p.minutes,
        }
    }
}

/// Everything planned for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub base_capacity: u32,
    pub label: Option<String>,
    pub weekly: Bucket<WeeklyItem>,
    pub homework: Bucket<HomeworkItem>,
    pub revision: Bucket<PlannedRevisionSlot>,
    pub projects: Bucket<ProjectItem>,
    pub total_used: u32,
    /// Never negative; see [`DayPlan::overload_minutes`] for the overage.
    pub spare: u32,
}

impl DayPlan {
    /// Merge the four buckets and derive totals. No other logic belongs here.
    pub fn assemble(
        date: NaiveDate,
        base_capacity: u32,
        label: Option<String>,
        weekly: Bucket<WeeklyItem>,
        homework: Bucket<HomeworkItem>,
        revision: Bucket<PlannedRevisionSlot>,
        projects: Bucket<ProjectItem>,
    ) -> Self {
        let total_used = weekly.minutes + homework.minutes + revision.minutes + projects.minutes;
        Self {
            date,
            base_capacity,
            label,
            weekly,
            homework,
            revision,
            projects,
            total_used,
            spare: base_capacity.saturating_sub(total_used),
        }
    }

    /// Minutes planned beyond the day's capacity.
    pub fn overload_minutes(&self) -> u32 {
        self.total_used.saturating_sub(self.base_capacity)
    }

    pub fn is_overloaded(&self) -> bool {
        self.total_used > self.base_capacity
    }

    pub fn items(&self) -> Vec<PlanItem<'_>> {
        let mut items = Vec::new();
        items.extend(self.weekly.items.iter().map(PlanItem::Weekly));
        items.extend(self.homework.items.iter().map(PlanItem::Homework));
        items.extend(self.revision.items.iter().map(PlanItem::Revision));
        items.extend(self.projects.items.iter().map(PlanItem::Project));
        items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// Homework due today or earlier: no day strictly before the due date.
    PastDue,
    /// Exam dated today or earlier: no revision can be placed.
    ExamPassed,
}

/// Work the planner saw but could not place anywhere in the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unscheduled {
    pub id: String,
    pub name: String,
    pub minutes: u32,
    pub reason: UnscheduledReason,
}

/// Revision demand versus what was actually placed, per exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
    pub exam_id: String,
    pub subject: String,
    pub exam_type: ExamType,
    pub total_minutes: u32,
    pub placed_minutes: u32,
    pub slot_count: u32,
}

/// The assembled plan for a contiguous horizon starting today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub today: NaiveDate,
    pub days: Vec<DayPlan>,
    pub revision: Vec<RevisionSummary>,
    pub unscheduled: Vec<Unscheduled>,
}

impl WeekPlan {
    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn revision_slots(&self) -> impl Iterator<Item = &PlannedRevisionSlot> {
        self.days.iter().flat_map(|d| d.revision.items.iter())
    }

    pub fn homework_items(&self) -> impl Iterator<Item = (NaiveDate, &HomeworkItem)> {
        self.days
            .iter()
            .flat_map(|d| d.homework.items.iter().map(move |h| (d.date, h)))
    }

    pub fn total_used(&self) -> u32 {
        self.days.iter().map(|d| d.total_used).sum()
    }
}
