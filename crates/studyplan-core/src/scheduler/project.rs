//! Project time allocation.
//!
//! Projects are the most elastic load: they only take what is left after
//! rocks, homework and revision, and never overload a day. Remaining work is
//! spread evenly over the weeks until the due date; anything that does not
//! fit this week is simply recomputed into next week's share.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::capacity::RemainingCapacity;
use super::plan::{Bucket, ProjectItem};
use crate::calendar::days_between;
use crate::schedule::{Project, ProjectStatus};

/// Default ceiling on project minutes per week.
pub const DEFAULT_WEEKLY_CAP_MINUTES: u32 = 300;

/// Minutes a project should get in a week starting `days_to_due` days
/// before its due date.
///
/// Overdue projects (negative `days_to_due`) ask for as much as the cap
/// allows.
pub fn weekly_demand(remaining_minutes: u32, days_to_due: i64, weekly_cap: u32) -> u32 {
    if days_to_due < 0 {
        return remaining_minutes.min(weekly_cap);
    }
    let weeks = (days_to_due as u64).div_ceil(7).max(1);
    let share = (remaining_minutes as u64).div_ceil(weeks) as u32;
    share.min(weekly_cap)
}

pub fn allocate_projects(
    projects: &[Project],
    today: NaiveDate,
    weekly_cap: u32,
    remaining: &mut RemainingCapacity,
) -> BTreeMap<NaiveDate, Bucket<ProjectItem>> {
    let dates: Vec<NaiveDate> = remaining.dates().collect();
    let mut buckets: BTreeMap<NaiveDate, Bucket<ProjectItem>> =
        dates.iter().map(|&d| (d, Bucket::default())).collect();

    let mut active: Vec<&Project> = projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Active)
        .collect();
    active.sort_by_key(|p| p.due_date);

    for project in active {
        let mut left = project.remaining_minutes();
        let overdue = project.due_date < today;

        'weeks: for week in dates.chunks(7) {
            if left == 0 {
                break;
            }
            let days_to_due = days_between(week[0], project.due_date);
            if !overdue && days_to_due < 0 {
                break;
            }
            let mut week_left = weekly_demand(left, days_to_due, weekly_cap);

            for &day in week {
                if !overdue && day > project.due_date {
                    break 'weeks;
                }
                if week_left == 0 || left == 0 {
                    break;
                }
                let free = remaining.get(day).unwrap_or(0).max(0) as u32;
                let take = free.min(week_left).min(left);
                if take == 0 {
                    continue;
                }
                remaining.consume(day, take);
                week_left -= take;
                left -= take;
                if let Some(bucket) = buckets.get_mut(&day) {
                    bucket.push(ProjectItem {
                        project_id: project.id.clone(),
                        name: project.name.clone(),
                        subject: project.subject.clone(),
                        due_date: project.due_date,
                        minutes: take,
                    });
                }
            }
        }

        if left > 0 {
            tracing::debug!(project_id = %project.id, left, "project carries minutes beyond horizon");
        }
    }

    buckets
}
