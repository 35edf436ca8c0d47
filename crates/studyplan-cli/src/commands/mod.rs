pub mod capacity;
pub mod completions;
pub mod config;
pub mod done;
pub mod exam;
pub mod homework;
pub mod plan;
pub mod project;
pub mod recurring;
pub mod sync;

use chrono::NaiveDate;
use serde::Serialize;
use studyplan_core::calendar::parse_date_key;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

const WEEKDAYS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// clap value parser for `YYYY-MM-DD` dates.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_date_key(s).map_err(|e| e.to_string())
}

/// Accepts `0`-`6` (Sunday first) or a day name such as `mon`/`Monday`.
pub fn parse_weekday(s: &str) -> Result<u8, String> {
    if let Ok(n) = s.parse::<u8>() {
        return if n <= 6 {
            Ok(n)
        } else {
            Err(format!("weekday {n} out of range 0-6"))
        };
    }
    let lower = s.to_ascii_lowercase();
    WEEKDAYS
        .iter()
        .position(|d| lower.len() >= 3 && lower.starts_with(d))
        .map(|i| i as u8)
        .ok_or_else(|| format!("unknown weekday '{s}'"))
}

pub fn weekday_name(index: u8) -> &'static str {
    WEEKDAYS.get(index as usize).copied().unwrap_or("?")
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` as JSON or run the text printer.
pub fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> CmdResult {
    if json {
        print_json(value)
    } else {
        text(value);
        Ok(())
    }
}

pub fn not_found(kind: &str, id: &str) -> Box<dyn std::error::Error> {
    format!("{kind} not found: {id}").into()
}
