//! # Studyplan Core Library
//!
//! This library provides the planning engine behind Studyplan: it turns a
//! student's weekly commitments, homework, exams and projects into a
//! day-by-day plan that respects how much time each day actually has.
//! All operations are exposed through the standalone `studyplan` CLI.
//!
//! ## Architecture
//!
//! - **Scheduler**: Pure, deterministic allocation passes over a shared
//!   remaining-capacity working set (rocks, homework, revision, projects)
//! - **Storage**: SQLite-based entity storage and TOML-based configuration
//! - **Sync**: Commits revision slots and homework dates back to storage
//!   while protecting a day already in progress
//! - **Stats**: Progress of a day against its plan
//!
//! ## Key Components
//!
//! - [`WeekPlanner`]: Builds a [`WeekPlan`] for a horizon
//! - [`ScheduleDb`]: Entity, slot and ledger persistence
//! - [`Config`]: Application configuration management
//! - [`PlanStore`]: Storage seam used by [`sync_plan`]

pub mod calendar;
pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod stats;
pub mod storage;
pub mod sync;

pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use schedule::{DeadlineStatus, DeadlineTask, Difficulty, Exam, ExamType, Project, ProjectStatus, RecurringTask, Topic};
pub use scheduler::{build_week_plan, CapacityConfig, DayPlan, PlanInputs, PlannerConfig, WeekPlan, WeekPlanner};
pub use stats::{CompletionLedger, DayProgress};
pub use storage::{Config, ScheduleDb};
pub use sync::{choose_sync_from, sync_plan, PlanStore, RevisionSlotRow, SyncPolicy, SyncReport, TodayUsage};
