//! Deadline (homework) allocation.
//!
//! Policy: earliest full fit, else latest forced.
//!
//! Tasks are taken in ascending due-date order (stable, so ties keep input
//! order). Each task is placed whole on the first day strictly before its
//! due date that still has room for it. When no such day exists the task is
//! forced onto the latest eligible day, overloading it. Tasks are never
//! split across days and never land on or after their due date.
//!
//! Fixed tasks stay on their pinned date. A pin beyond the horizon is left
//! for a later plan; a pin in the past or on/after the due date is treated
//! as floating.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::capacity::RemainingCapacity;
use super::plan::{Bucket, HomeworkItem, Unscheduled, UnscheduledReason};
use crate::schedule::{DeadlineStatus, DeadlineTask};

#[derive(Debug, Default)]
pub struct DeadlineAllocation {
    pub buckets: BTreeMap<NaiveDate, Bucket<HomeworkItem>>,
    pub unscheduled: Vec<Unscheduled>,
}

fn homework_item(task: &DeadlineTask, minutes: u32, completed: bool, pinned: bool) -> HomeworkItem {
    HomeworkItem {
        task_id: task.id.clone(),
        name: task.name.clone(),
        subject: task.subject.clone(),
        due_date: task.due_date,
        minutes,
        completed,
        pinned,
    }
}

pub fn allocate_deadlines(tasks: &[DeadlineTask], remaining: &mut RemainingCapacity) -> DeadlineAllocation {
    let dates: Vec<NaiveDate> = remaining.dates().collect();
    let mut alloc = DeadlineAllocation {
        buckets: dates.iter().map(|&d| (d, Bucket::default())).collect(),
        unscheduled: Vec::new(),
    };

    // Finished work keeps its day occupied so capacity is not freed retroactively.
    for task in tasks.iter().filter(|t| t.status == DeadlineStatus::Completed) {
        let Some(day) = task.completed_on.filter(|d| remaining.contains(*d)) else {
            continue;
        };
        let minutes = task.consumed_minutes();
        remaining.consume(day, minutes);
        if let Some(bucket) = alloc.buckets.get_mut(&day) {
            bucket.push(homework_item(task, minutes, true, false));
        }
    }

    let mut active: Vec<&DeadlineTask> = tasks.iter().filter(|t| t.is_active()).collect();
    active.sort_by_key(|t| t.due_date);

    let horizon_end = dates.last().copied();
    let mut floating = Vec::with_capacity(active.len());
    for task in active {
        match task.scheduled_date {
            Some(pinned) if task.is_fixed && remaining.contains(pinned) && pinned < task.due_date => {
                let minutes = task.remaining_minutes();
                if minutes > 0 {
                    remaining.consume(pinned, minutes);
                    if let Some(bucket) = alloc.buckets.get_mut(&pinned) {
                        bucket.push(homework_item(task, minutes, false, true));
                    }
                }
            }
            // a valid pin past the horizon belongs to a later plan
            Some(pinned)
                if task.is_fixed && pinned < task.due_date && horizon_end.is_some_and(|end| pinned > end) =>
            {
                tracing::debug!(task_id = %task.id, %pinned, "pinned beyond horizon; left out of this plan");
            }
            Some(pinned) if task.is_fixed => {
                tracing::warn!(
                    task_id = %task.id,
                    %pinned,
                    due = %task.due_date,
                    "pinned date in the past or not before due date; reallocating"
                );
                floating.push(task);
            }
            _ => floating.push(task),
        }
    }

    for task in floating {
        let minutes = task.remaining_minutes();
        if minutes == 0 {
            continue;
        }

        let candidates: Vec<NaiveDate> = dates.iter().copied().filter(|d| *d < task.due_date).collect();
        let Some(&latest) = candidates.last() else {
            tracing::debug!(task_id = %task.id, due = %task.due_date, "no eligible day before due date");
            alloc.unscheduled.push(Unscheduled {
                id: task.id.clone(),
                name: task.name.clone(),
                minutes,
                reason: UnscheduledReason::PastDue,
            });
            continue;
        };

        let fit = candidates
            .iter()
            .copied()
            .find(|d| remaining.get(*d).unwrap_or(0) >= minutes as i64);
        let day = match fit {
            Some(day) => day,
            None => {
                tracing::debug!(task_id = %task.id, %latest, minutes, "no day fits whole task; forcing latest");
                latest
            }
        };

        remaining.consume(day, minutes);
        if let Some(bucket) = alloc.buckets.get_mut(&day) {
            bucket.push(homework_item(task, minutes, false, false));
        }
    }

    alloc
}
