//! Planner entities: recurring commitments, homework, exams and projects.
//!
//! These are the inputs to the planning engine. They are plain data; all
//! allocation behaviour lives in [`crate::scheduler`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A fixed weekly commitment ("rock"), e.g. a football practice.
///
/// Always placed in full on every instance of its weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTask {
    pub id: String,
    pub name: String,
    /// 0 = Sunday ... 6 = Saturday
    pub weekday: u8,
    pub duration_minutes: u32,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    #[default]
    Active,
    Completed,
}

/// Homework or any other piece of work with a due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub due_date: NaiveDate,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub completed_minutes: u32,
    #[serde(default)]
    pub status: DeadlineStatus,
    /// Day the task is (or was last) scheduled on.
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    /// Pins the task to `scheduled_date`.
    #[serde(default)]
    pub is_fixed: bool,
    /// Day the task was marked completed.
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

impl DeadlineTask {
    /// Minutes still to be done. Logging more than the estimate saturates at 0.
    pub fn remaining_minutes(&self) -> u32 {
        self.estimated_minutes.saturating_sub(self.completed_minutes)
    }

    /// Minutes a completed task keeps occupying on its completion day.
    pub fn consumed_minutes(&self) -> u32 {
        if self.completed_minutes > 0 {
            self.completed_minutes
        } else {
            self.estimated_minutes
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DeadlineStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExamType {
    Internal,
    Board,
    Competitive,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Internal => "Internal",
            ExamType::Board => "Board",
            ExamType::Competitive => "Competitive",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "internal" => Ok(ExamType::Internal),
            "board" => Ok(ExamType::Board),
            "competitive" => Ok(ExamType::Competitive),
            _ => Err(ValidationError::UnknownVariant {
                kind: "exam type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    /// Absent for competitive exams, which are named instead.
    #[serde(default)]
    pub subject: Option<String>,
    pub exam_type: ExamType,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub competitive_name: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub color: Option<String>,
    /// Self-assessed readiness, 0..=100.
    #[serde(default)]
    pub preparedness: Option<u8>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

impl Exam {
    /// Name shown on revision slots.
    pub fn display_subject(&self) -> &str {
        self.subject
            .as_deref()
            .or(self.competitive_name.as_deref())
            .unwrap_or("Exam")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

/// Long-running coursework spread over the weeks until its due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub due_date: NaiveDate,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub completed_minutes: u32,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl Project {
    pub fn remaining_minutes(&self) -> u32 {
        self.estimated_minutes.saturating_sub(self.completed_minutes)
    }
}

macro_rules! snake_case_labels {
    ($ty:ty, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

snake_case_labels!(DeadlineStatus, "task status", { Active => "active", Completed => "completed" });
snake_case_labels!(ProjectStatus, "project status", {
    Active => "active",
    Completed => "completed",
    Paused => "paused",
});
snake_case_labels!(Difficulty, "difficulty", { Easy => "easy", Medium => "medium", Hard => "hard" });
