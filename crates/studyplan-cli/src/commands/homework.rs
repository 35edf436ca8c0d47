//! Homework commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::{DeadlineStatus, DeadlineTask, ScheduleDb};

use super::{emit, new_id, not_found, parse_date, CmdResult};

#[derive(Subcommand)]
pub enum HomeworkAction {
    /// Add homework
    Add {
        name: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: NaiveDate,
        /// Estimated minutes
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        subject: Option<String>,
        /// Pin to this day instead of letting the planner choose
        #[arg(long, value_parser = parse_date)]
        pin: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// List homework
    List {
        /// Include completed homework
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Log minutes worked
    Log { id: String, minutes: u32 },
    /// Mark homework completed today
    Complete { id: String },
    /// Remove homework
    Remove { id: String },
}

pub fn run(action: HomeworkAction, today: NaiveDate) -> CmdResult {
    let db = ScheduleDb::open()?;

    match action {
        HomeworkAction::Add {
            name,
            due,
            minutes,
            subject,
            pin,
            json,
        } => {
            let task = DeadlineTask {
                id: new_id(),
                name,
                subject,
                due_date: due,
                estimated_minutes: minutes,
                completed_minutes: 0,
                status: DeadlineStatus::Active,
                scheduled_date: pin,
                is_fixed: pin.is_some(),
                completed_on: None,
            };
            db.upsert_deadline(&task)?;
            emit(json, &task, |t| println!("Homework added: {}", t.id))?;
        }
        HomeworkAction::List { all, json } => {
            let tasks: Vec<DeadlineTask> = db
                .list_deadlines()?
                .into_iter()
                .filter(|t| all || t.is_active())
                .collect();
            emit(json, &tasks, |tasks| {
                for t in tasks {
                    let day = t
                        .scheduled_date
                        .map(|d| format!("  on {d}{}", if t.is_fixed { " (pinned)" } else { "" }))
                        .unwrap_or_default();
                    println!(
                        "{}  {} due {}  {}/{} min  {}{}",
                        t.id,
                        t.name,
                        t.due_date,
                        t.completed_minutes,
                        t.estimated_minutes,
                        t.status.as_str(),
                        day
                    );
                }
            })?;
        }
        HomeworkAction::Log { id, minutes } => {
            if !db.log_deadline_minutes(&id, minutes)? {
                return Err(not_found("homework", &id));
            }
            println!("Logged {minutes} min on {id}");
        }
        HomeworkAction::Complete { id } => {
            if !db.complete_deadline(&id, today)? {
                return Err(not_found("homework", &id));
            }
            println!("Homework completed: {id}");
        }
        HomeworkAction::Remove { id } => {
            if !db.delete_deadline(&id)? {
                return Err(not_found("homework", &id));
            }
            println!("Homework removed: {id}");
        }
    }
    Ok(())
}
