//! Fixed-load allocation: recurring weekly commitments.
//!
//! Rocks are placed first and always in full; whatever they consume is
//! gone before homework, revision or projects get a look at the day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::capacity::RemainingCapacity;
use super::plan::{Bucket, WeeklyItem};
use crate::calendar::weekday_index;
use crate::schedule::RecurringTask;

pub fn allocate_weekly(
    tasks: &[RecurringTask],
    remaining: &mut RemainingCapacity,
) -> BTreeMap<NaiveDate, Bucket<WeeklyItem>> {
    let dates: Vec<NaiveDate> = remaining.dates().collect();
    let mut buckets = BTreeMap::new();

    for date in dates {
        let weekday = weekday_index(date);
        let mut bucket = Bucket::default();
        for task in tasks.iter().filter(|t| t.weekday == weekday) {
            bucket.push(WeeklyItem {
                task_id: task.id.clone(),
                name: task.name.clone(),
                subject: task.subject.clone(),
                color: task.color.clone(),
                minutes: task.duration_minutes,
            });
        }
        remaining.consume(date, bucket.minutes);
        buckets.insert(date, bucket);
    }

    buckets
}
