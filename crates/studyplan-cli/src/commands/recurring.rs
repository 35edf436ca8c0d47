use clap::Subcommand;
use studyplan_core::{RecurringTask, ScheduleDb};

use super::{emit, new_id, not_found, parse_weekday, weekday_name, CmdResult};

#[derive(Subcommand)]
pub enum RecurringAction {
    /// Add a weekly commitment
    Add {
        name: String,
        /// Weekday: 0-6 (Sunday first) or a name like "mon"
        #[arg(long, value_parser = parse_weekday)]
        weekday: u8,
        /// Duration in minutes
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List weekly commitments
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove a weekly commitment
    Remove { id: String },
}

pub fn run(action: RecurringAction) -> CmdResult {
    let db = ScheduleDb::open()?;

    match action {
        RecurringAction::Add {
            name,
            weekday,
            minutes,
            subject,
            color,
            json,
        } => {
            let task = RecurringTask {
                id: new_id(),
                name,
                weekday,
                duration_minutes: minutes,
                subject,
                color,
            };
            db.upsert_recurring(&task)?;
            emit(json, &task, |t| println!("Recurring task added: {}", t.id))?;
        }
        RecurringAction::List { json } => {
            let tasks = db.list_recurring()?;
            emit(json, &tasks, |tasks| {
                for t in tasks {
                    println!(
                        "{}  {} {} ({} min)",
                        t.id,
                        weekday_name(t.weekday),
                        t.name,
                        t.duration_minutes
                    );
                }
            })?;
        }
        RecurringAction::Remove { id } => {
            if !db.delete_recurring(&id)? {
                return Err(not_found("recurring task", &id));
            }
            println!("Recurring task removed: {id}");
        }
    }
    Ok(())
}
