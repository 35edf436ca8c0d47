use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::scheduler::RevisionDemand;
use studyplan_core::{Exam, ExamType, ScheduleDb, Topic};

use super::{emit, new_id, not_found, parse_date, CmdResult};

#[derive(Subcommand)]
pub enum ExamAction {
    /// Add an exam
    Add {
        /// Internal, Board or Competitive
        #[arg(long = "type")]
        exam_type: ExamType,
        /// Exam date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        board: Option<String>,
        /// Name of a competitive exam, used when there is no subject
        #[arg(long)]
        competitive_name: Option<String>,
        /// Self-rated preparedness, 0-100
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        preparedness: Option<u8>,
        /// Topic to cover; repeatable
        #[arg(long = "topic")]
        topics: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// List exams with their revision demand
    List {
        #[arg(long)]
        json: bool,
    },
    /// Update self-rated preparedness
    Prepared {
        id: String,
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        preparedness: u8,
    },
    /// Remove an exam and its open revision slots
    Remove { id: String },
}

pub fn run(action: ExamAction) -> CmdResult {
    let db = ScheduleDb::open()?;

    match action {
        ExamAction::Add {
            exam_type,
            date,
            subject,
            board,
            competitive_name,
            preparedness,
            topics,
            json,
        } => {
            let exam = Exam {
                id: new_id(),
                subject,
                exam_type,
                board,
                competitive_name,
                date,
                color: None,
                preparedness,
                topics: topics
                    .into_iter()
                    .map(|name| Topic {
                        name,
                        difficulty: Default::default(),
                    })
                    .collect(),
            };
            db.upsert_exam(&exam)?;
            emit(json, &exam, |e| println!("Exam added: {}", e.id))?;
        }
        ExamAction::List { json } => {
            let exams = db.list_exams()?;
            emit(json, &exams, |exams| {
                for exam in exams {
                    let demand = RevisionDemand::for_exam(exam);
                    println!(
                        "{}  {} ({}) on {}  needs {} min",
                        exam.id,
                        exam.display_subject(),
                        exam.exam_type,
                        exam.date,
                        demand.total_minutes
                    );
                }
            })?;
        }
        ExamAction::Prepared { id, preparedness } => {
            if !db.set_preparedness(&id, preparedness)? {
                return Err(not_found("exam", &id));
            }
            println!("Preparedness for {id} set to {preparedness}");
        }
        ExamAction::Remove { id } => {
            if !db.delete_exam(&id)? {
                return Err(not_found("exam", &id));
            }
            println!("Exam removed: {id}");
        }
    }
    Ok(())
}
