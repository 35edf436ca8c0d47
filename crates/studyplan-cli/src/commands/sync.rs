//! Commit the current plan to storage.

use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::scheduler::WeekPlanner;
use studyplan_core::{sync_plan, Config, DayProgress, ScheduleDb};

use super::{emit, not_found, CmdResult};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Rebuild the plan and replace open revision slots
    Run {
        #[arg(long)]
        json: bool,
    },
    /// List committed revision slots
    Slots {
        #[arg(long)]
        json: bool,
    },
    /// Mark a committed slot completed so re-syncs keep it
    Complete { id: String },
}

pub fn run(action: SyncAction, today: NaiveDate) -> CmdResult {
    let config = Config::load()?;
    let mut db = ScheduleDb::open()?;

    match action {
        SyncAction::Run { json } => {
            let inputs = db.load_inputs()?;
            let plan = WeekPlanner::with_config(config.planner_config()).plan(&inputs, today)?;
            let ledger = db.load_ledger(today, today)?;
            let usage = plan
                .day(today)
                .map(|day| DayProgress::from_day(day, &ledger).usage())
                .unwrap_or_default();

            let report = sync_plan(
                &mut db,
                &plan,
                &inputs.deadlines,
                &usage,
                &config.sync_policy(),
                &config.sync.user_id,
            )?;
            emit(json, &report, |r| {
                println!(
                    "Synced from {}: {} slots removed, {} inserted, {} homework moved",
                    r.sync_from, r.removed_slots, r.inserted_slots, r.rescheduled_tasks
                );
            })?;
        }
        SyncAction::Slots { json } => {
            let slots = db.list_slots(&config.sync.user_id)?;
            emit(json, &slots, |slots| {
                for s in slots {
                    let mark = if s.completed { "x" } else { " " };
                    println!("[{mark}] {}  {} ({} min)  {}", s.date, s.label, s.duration_minutes, s.id);
                }
            })?;
        }
        SyncAction::Complete { id } => {
            if !db.complete_slot(&id)? {
                return Err(not_found("revision slot", &id));
            }
            println!("Revision slot completed: {id}");
        }
    }
    Ok(())
}
