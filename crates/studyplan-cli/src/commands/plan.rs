//! Plan commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::calendar::weekday_index;
use studyplan_core::scheduler::{PlanItem, WeekPlanner};
use studyplan_core::{Config, DayPlan, DayProgress, ScheduleDb, WeekPlan};

use super::{emit, parse_date, weekday_name, CmdResult};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Show the plan for the coming days
    Show {
        /// Days to plan, starting today (defaults to planner.horizon_days)
        #[arg(long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Progress against one day's plan
    Progress {
        /// Day to report (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PlanAction, today: NaiveDate) -> CmdResult {
    let config = Config::load()?;
    let db = ScheduleDb::open()?;
    let inputs = db.load_inputs()?;
    let planner = WeekPlanner::with_config(config.planner_config());

    match action {
        PlanAction::Show { days, json } => {
            let num_days = days.unwrap_or(planner.config().horizon_days);
            let plan = planner.plan_days(&inputs, today, num_days)?;
            emit(json, &plan, print_plan)?;
        }
        PlanAction::Progress { date, json } => {
            let date = date.unwrap_or(today);
            if date < today {
                return Err(format!("{date} is before today; the plan starts at {today}").into());
            }
            // same horizon as `plan show`, stretched to reach `date`
            let span = u32::try_from((date - today).num_days() + 1).map_err(|_| format!("{date} is too far ahead"))?;
            let days = span.max(planner.config().horizon_days);
            let plan = planner.plan_days(&inputs, today, days)?;
            let day = plan.day(date).ok_or("day outside plan")?;
            let ledger = db.load_ledger(date, date)?;
            let progress = DayProgress::from_day(day, &ledger);
            emit(json, &progress, |p| {
                println!(
                    "{}  done {}/{} min ({}%)",
                    p.date, p.done_minutes, p.planned_minutes, p.percent
                );
                for (name, bucket) in [
                    ("weekly", p.weekly),
                    ("homework", p.homework),
                    ("revision", p.revision),
                    ("projects", p.projects),
                ] {
                    if bucket.planned_minutes > 0 {
                        println!("  {name:<9} {}/{} min", bucket.done_minutes, bucket.planned_minutes);
                    }
                }
            })?;
        }
    }
    Ok(())
}

fn print_plan(plan: &WeekPlan) {
    for day in &plan.days {
        print_day(day);
    }
    if !plan.revision.is_empty() {
        println!();
        println!("Revision:");
        for summary in &plan.revision {
            println!(
                "  {} ({}): {} of {} min in {} slots",
                summary.subject, summary.exam_type, summary.placed_minutes, summary.total_minutes, summary.slot_count
            );
        }
    }
    if !plan.unscheduled.is_empty() {
        println!();
        println!("Not scheduled:");
        for item in &plan.unscheduled {
            println!("  {} ({} min): {:?}", item.name, item.minutes, item.reason);
        }
    }
}

fn print_day(day: &DayPlan) {
    let mut header = format!(
        "{} {}  used {}/{}  spare {}",
        day.date,
        weekday_name(weekday_index(day.date)),
        day.total_used,
        day.base_capacity,
        day.spare
    );
    if let Some(label) = &day.label {
        header.push_str(&format!("  [{label}]"));
    }
    if day.is_overloaded() {
        header.push_str(&format!("  OVERLOAD +{}", day.overload_minutes()));
    }
    println!("{header}");

    for item in day.items() {
        let kind = match item {
            PlanItem::Weekly(_) => "weekly",
            PlanItem::Homework(h) if h.completed => "done",
            PlanItem::Homework(_) => "homework",
            PlanItem::Revision(_) => "revision",
            PlanItem::Project(_) => "project",
        };
        println!("  {kind:<9} {} ({} min)  {}", item.title(), item.minutes(), item.key());
    }
}
