use chrono::NaiveDate;
use clap::Args;
use studyplan_core::ScheduleDb;

use super::{parse_date, CmdResult};

#[derive(Args)]
pub struct DoneArgs {
    /// Item key as shown by `plan show`, e.g. "weekly:<id>"
    key: String,
    /// Day the item was planned on (defaults to today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Remove the mark instead
    #[arg(long)]
    undo: bool,
}

pub fn run(args: DoneArgs, today: NaiveDate) -> CmdResult {
    let db = ScheduleDb::open()?;
    let date = args.date.unwrap_or(today);

    if args.undo {
        if !db.unmark_done(date, &args.key)? {
            return Err(format!("{} was not marked done on {date}", args.key).into());
        }
        println!("Unmarked {} on {date}", args.key);
    } else {
        db.mark_done(date, &args.key)?;
        println!("Marked {} done on {date}", args.key);
    }
    Ok(())
}
