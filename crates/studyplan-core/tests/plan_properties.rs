//! Property tests over randomly generated planner inputs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use studyplan_core::calendar::{add_days, horizon, parse_date_key, weekday_index};
use studyplan_core::scheduler::{preparedness_multiplier, RevisionDemand};
use studyplan_core::{
    build_week_plan, CapacityConfig, DeadlineStatus, DeadlineTask, Exam, ExamType, PlanInputs, Project, ProjectStatus,
    RecurringTask,
};

fn today() -> NaiveDate {
    parse_date_key("2026-10-19").unwrap()
}

fn exam_type() -> impl Strategy<Value = ExamType> {
    prop_oneof![
        Just(ExamType::Internal),
        Just(ExamType::Board),
        Just(ExamType::Competitive),
    ]
}

fn recurring() -> impl Strategy<Value = Vec<RecurringTask>> {
    prop::collection::vec((0u8..=6, 10u32..=120), 0..4).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (weekday, minutes))| RecurringTask {
                id: format!("r{i}"),
                name: format!("Rock {i}"),
                weekday,
                duration_minutes: minutes,
                subject: None,
                color: None,
            })
            .collect()
    })
}

fn deadlines() -> impl Strategy<Value = Vec<DeadlineTask>> {
    prop::collection::vec((-2i64..20, 10u32..=240, 0u32..=60, any::<bool>()), 0..6).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (due_in, estimated, completed, fixed))| DeadlineTask {
                id: format!("h{i}"),
                name: format!("Homework {i}"),
                subject: None,
                due_date: add_days(today(), due_in),
                estimated_minutes: estimated,
                completed_minutes: completed,
                status: DeadlineStatus::Active,
                scheduled_date: fixed.then(|| add_days(today(), due_in.max(1) - 1)),
                is_fixed: fixed,
                completed_on: None,
            })
            .collect()
    })
}

fn exams() -> impl Strategy<Value = Vec<Exam>> {
    prop::collection::vec((exam_type(), -1i64..25, prop::option::of(0u8..=100)), 0..4).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (exam_type, in_days, preparedness))| Exam {
                id: format!("e{i}"),
                subject: Some(format!("Subject {i}")),
                exam_type,
                board: None,
                competitive_name: None,
                date: add_days(today(), in_days),
                color: None,
                preparedness,
                topics: Vec::new(),
            })
            .collect()
    })
}

fn projects() -> impl Strategy<Value = Vec<Project>> {
    prop::collection::vec((-3i64..40, 30u32..=1200), 0..3).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (due_in, estimated))| Project {
                id: format!("p{i}"),
                name: format!("Project {i}"),
                subject: None,
                due_date: add_days(today(), due_in),
                estimated_minutes: estimated,
                completed_minutes: 0,
                status: ProjectStatus::Active,
            })
            .collect()
    })
}

fn capacity() -> impl Strategy<Value = CapacityConfig> {
    (0u32..=300, prop::collection::btree_map(0u8..=6, 0u32..=300, 0..4)).prop_map(|(default_minutes, weekly)| {
        CapacityConfig {
            weekly,
            overrides: BTreeMap::new(),
            default_minutes,
        }
    })
}

fn inputs() -> impl Strategy<Value = PlanInputs> {
    (recurring(), deadlines(), exams(), projects(), capacity()).prop_map(
        |(recurring, deadlines, exams, projects, capacity)| PlanInputs {
            recurring,
            deadlines,
            exams,
            projects,
            capacity,
        },
    )
}

proptest! {
    #[test]
    fn homework_never_lands_on_or_after_due(inputs in inputs(), days in 1u32..30) {
        let plan = build_week_plan(&inputs, today(), days).unwrap();
        for (date, item) in plan.homework_items() {
            prop_assert!(date < item.due_date, "{} placed on {date}, due {}", item.task_id, item.due_date);
        }
    }

    #[test]
    fn revision_is_strictly_before_exam(inputs in inputs(), days in 1u32..30) {
        let plan = build_week_plan(&inputs, today(), days).unwrap();
        let exam_dates: BTreeMap<&str, NaiveDate> =
            inputs.exams.iter().map(|e| (e.id.as_str(), e.date)).collect();
        for slot in plan.revision_slots() {
            prop_assert!(slot.date < exam_dates[slot.exam_id.as_str()]);
        }
    }

    #[test]
    fn day_totals_are_conserved(inputs in inputs(), days in 1u32..30) {
        let plan = build_week_plan(&inputs, today(), days).unwrap();
        for day in &plan.days {
            let sum = day.weekly.minutes + day.homework.minutes + day.revision.minutes + day.projects.minutes;
            prop_assert_eq!(day.total_used, sum);
            prop_assert_eq!(day.spare, day.base_capacity.saturating_sub(day.total_used));
        }
    }

    #[test]
    fn recurring_tasks_are_placed_in_full_once(inputs in inputs(), days in 1u32..30) {
        let plan = build_week_plan(&inputs, today(), days).unwrap();
        for date in horizon(today(), days) {
            let day = plan.day(date).unwrap();
            for task in &inputs.recurring {
                let placed: Vec<_> = day.weekly.items.iter().filter(|w| w.task_id == task.id).collect();
                if task.weekday == weekday_index(date) {
                    prop_assert_eq!(placed.len(), 1);
                    prop_assert_eq!(placed[0].minutes, task.duration_minutes);
                } else {
                    prop_assert!(placed.is_empty());
                }
            }
        }
    }

    #[test]
    fn upcoming_exams_get_at_least_their_total(inputs in inputs(), days in 1u32..30) {
        let plan = build_week_plan(&inputs, today(), days).unwrap();
        for summary in &plan.revision {
            prop_assert!(summary.placed_minutes >= summary.total_minutes);
            let placed: u32 = plan
                .revision_slots()
                .filter(|s| s.exam_id == summary.exam_id)
                .map(|s| s.minutes)
                .sum();
            prop_assert_eq!(placed, summary.placed_minutes);
        }
    }

    #[test]
    fn planning_is_idempotent(inputs in inputs(), days in 1u32..30) {
        let first = serde_json::to_string(&build_week_plan(&inputs, today(), days).unwrap()).unwrap();
        let second = serde_json::to_string(&build_week_plan(&inputs, today(), days).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn lower_preparedness_never_needs_less(exam_type in exam_type(), a in 0u8..=100, b in 0u8..=100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let exam = |preparedness| Exam {
            id: "e".into(),
            subject: None,
            exam_type,
            board: None,
            competitive_name: None,
            date: add_days(today(), 10),
            color: None,
            preparedness: Some(preparedness),
            topics: Vec::new(),
        };
        prop_assert!(preparedness_multiplier(Some(low)) >= preparedness_multiplier(Some(high)));
        prop_assert!(
            RevisionDemand::for_exam(&exam(low)).total_minutes >= RevisionDemand::for_exam(&exam(high)).total_minutes
        );
    }
}
