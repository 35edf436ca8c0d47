//! Project management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use studyplan_core::{Project, ProjectStatus, ScheduleDb};

use super::{emit, new_id, not_found, parse_date, CmdResult};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Add {
        name: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        due: NaiveDate,
        /// Estimated total minutes
        #[arg(long)]
        minutes: u32,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List all projects
    List {
        #[arg(long)]
        json: bool,
    },
    /// Log minutes worked
    Log { id: String, minutes: u32 },
    /// Change status: active, paused or completed
    Status { id: String, status: ProjectStatus },
    /// Remove a project
    Remove { id: String },
}

pub fn run(action: ProjectAction) -> CmdResult {
    let db = ScheduleDb::open()?;

    match action {
        ProjectAction::Add {
            name,
            due,
            minutes,
            subject,
            json,
        } => {
            let project = Project {
                id: new_id(),
                name,
                subject,
                due_date: due,
                estimated_minutes: minutes,
                completed_minutes: 0,
                status: ProjectStatus::Active,
            };
            db.upsert_project(&project)?;
            emit(json, &project, |p| println!("Project created: {}", p.id))?;
        }
        ProjectAction::List { json } => {
            let projects = db.list_projects()?;
            emit(json, &projects, |projects| {
                for p in projects {
                    println!(
                        "{}  {} due {}  {}/{} min  {}",
                        p.id,
                        p.name,
                        p.due_date,
                        p.completed_minutes,
                        p.estimated_minutes,
                        p.status.as_str()
                    );
                }
            })?;
        }
        ProjectAction::Log { id, minutes } => {
            if !db.log_project_minutes(&id, minutes)? {
                return Err(not_found("project", &id));
            }
            println!("Logged {minutes} min on {id}");
        }
        ProjectAction::Status { id, status } => {
            if !db.set_project_status(&id, status)? {
                return Err(not_found("project", &id));
            }
            println!("Project {id} is now {}", status.as_str());
        }
        ProjectAction::Remove { id } => {
            if !db.delete_project(&id)? {
                return Err(not_found("project", &id));
            }
            println!("Project removed: {id}");
        }
    }
    Ok(())
}
