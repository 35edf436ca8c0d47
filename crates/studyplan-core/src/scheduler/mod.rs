//! Daily capacity allocation and revision scheduling.
//!
//! The planner turns a student's obligations into a day-by-day plan:
//! - Resolves each day's capacity from the weekly pattern and overrides
//! - Places recurring commitments in full
//! - Places homework on the earliest day that fits it before its due date
//! - Lays out exam revision (final lock, greedy fill, cramming)
//! - Spreads project work over the leftover capacity
//!
//! Planning is pure and deterministic: the same inputs and `today` always
//! produce the same [`WeekPlan`].

pub mod capacity;
pub mod deadline;
pub mod plan;
pub mod project;
pub mod revision;
pub mod weekly;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use capacity::{build_capacity_map, CapacityConfig, CapacityMap, CapacityOverride, DayCapacity, RemainingCapacity};
pub use plan::{
    Bucket, DayPlan, HomeworkItem, PlanItem, PlannedRevisionSlot, ProjectItem, RevisionSummary, SlotTier, Unscheduled,
    UnscheduledReason, WeekPlan, WeeklyItem,
};
pub use revision::{preparedness_multiplier, revision_demands, RevisionDemand, SlotProfile};

use crate::calendar::horizon;
use crate::error::ValidationError;
use crate::schedule::{DeadlineTask, Exam, Project, RecurringTask};

/// Longest horizon the planner accepts.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Days in the horizon, starting today
    pub horizon_days: u32,
    /// Ceiling on project minutes per week
    pub project_weekly_cap_minutes: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            project_weekly_cap_minutes: project::DEFAULT_WEEKLY_CAP_MINUTES,
        }
    }
}

/// Everything the planner reads, fully materialized before planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInputs {
    #[serde(default)]
    pub recurring: Vec<RecurringTask>,
    #[serde(default)]
    pub deadlines: Vec<DeadlineTask>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub capacity: CapacityConfig,
}

impl PlanInputs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.capacity.validate()?;
        if let Some(task) = self.recurring.iter().find(|t| t.weekday > 6) {
            return Err(ValidationError::InvalidWeekday {
                id: task.id.clone(),
                weekday: task.weekday,
            });
        }
        Ok(())
    }
}

/// Builds [`WeekPlan`]s.
#[derive(Debug, Clone, Default)]
pub struct WeekPlanner {
    config: PlannerConfig,
}

impl WeekPlanner {
    /// Create a planner with the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan the configured horizon starting at `today`.
    pub fn plan(&self, inputs: &PlanInputs, today: NaiveDate) -> Result<WeekPlan, ValidationError> {
        self.plan_days(inputs, today, self.config.horizon_days)
    }

    /// Plan `num_days` days starting at `today`.
    ///
    /// # Errors
    /// Returns a validation error for a horizon of zero or more than
    /// [`MAX_HORIZON_DAYS`] days, or a weekday index outside 0..=6. Unsatisfiable workloads never fail; they overload days.
    pub fn plan_days(&self, inputs: &PlanInputs, today: NaiveDate, num_days: u32) -> Result<WeekPlan, ValidationError> {
        if num_days == 0 {
            return Err(ValidationError::EmptyHorizon);
        }
        if num_days > MAX_HORIZON_DAYS {
            return Err(ValidationError::HorizonTooLong {
                days: num_days,
                max: MAX_HORIZON_DAYS,
            });
        }
        inputs.validate()?;

        let dates = horizon(today, num_days);
        let capacity = build_capacity_map(&inputs.capacity, &dates);
        let mut remaining = RemainingCapacity::from_map(&capacity);

        // order matters: each pass only sees what the previous ones left
        let mut weekly = weekly::allocate_weekly(&inputs.recurring, &mut remaining);
        let mut homework = deadline::allocate_deadlines(&inputs.deadlines, &mut remaining);
        let mut revision = revision::allocate_revision(&inputs.exams, today, &mut remaining);
        let mut projects = project::allocate_projects(
            &inputs.projects,
            today,
            self.config.project_weekly_cap_minutes,
            &mut remaining,
        );

        let days = capacity
            .into_iter()
            .map(|(date, cap)| {
                DayPlan::assemble(
                    date,
                    cap.minutes,
                    cap.label,
                    weekly.remove(&date).unwrap_or_default(),
                    homework.buckets.remove(&date).unwrap_or_default(),
                    revision.buckets.remove(&date).unwrap_or_default(),
                    projects.remove(&date).unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>();

        let mut unscheduled = homework.unscheduled;
        unscheduled.append(&mut revision.unscheduled);

        let overloaded = days.iter().filter(|d| d.is_overloaded()).count();
        tracing::debug!(%today, num_days, overloaded, unscheduled = unscheduled.len(), "plan built");

        Ok(WeekPlan {
            today,
            days,
            revision: revision.summaries,
            unscheduled,
        })
    }
}

/// Plan `num_days` days from `today` with default settings.
pub fn build_week_plan(inputs: &PlanInputs, today: NaiveDate, num_days: u32) -> Result<WeekPlan, ValidationError> {
    WeekPlanner::new().plan_days(inputs, today, num_days)
}
