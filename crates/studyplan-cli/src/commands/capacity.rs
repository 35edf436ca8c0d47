use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::ScheduleDb;

use super::{emit, parse_date, parse_weekday, weekday_name, CmdResult};

#[derive(Subcommand)]
pub enum CapacityAction {
    /// Show capacity settings
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Minutes for days without a weekday or date setting
    Default { minutes: u32 },
    /// Minutes for every occurrence of a weekday
    Weekday {
        #[arg(value_parser = parse_weekday)]
        weekday: u8,
        minutes: u32,
    },
    /// Minutes for one specific date
    Override {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        minutes: u32,
        /// Shown next to the day, e.g. "Exam Leave"
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove a date override
    Clear {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
}

pub fn run(action: CapacityAction) -> CmdResult {
    let db = ScheduleDb::open()?;
    let mut capacity = db.load_capacity()?;

    match action {
        CapacityAction::Show { json } => {
            emit(json, &capacity, |c| {
                println!("default  {} min", c.default_minutes);
                for (weekday, minutes) in &c.weekly {
                    println!("{:<8} {minutes} min", weekday_name(*weekday));
                }
                for (date, o) in &c.overrides {
                    let label = o.label.as_deref().map(|l| format!("  [{l}]")).unwrap_or_default();
                    println!("{date}  {} min{label}", o.minutes);
                }
            })?;
            return Ok(());
        }
        CapacityAction::Default { minutes } => {
            capacity.default_minutes = minutes;
        }
        CapacityAction::Weekday { weekday, minutes } => {
            capacity = capacity.with_weekday(weekday, minutes);
        }
        CapacityAction::Override { date, minutes, label } => {
            capacity = capacity.with_override(date, minutes, label.as_deref());
        }
        CapacityAction::Clear { date } => {
            if capacity.overrides.remove(&date).is_none() {
                return Err(format!("no override on {date}").into());
            }
        }
    }

    db.save_capacity(&capacity)?;
    println!("ok");
    Ok(())
}
