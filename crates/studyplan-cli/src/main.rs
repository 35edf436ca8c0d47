use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studyplan", version, about = "Studyplan CLI")]
pub(crate) struct Cli {
    /// Plan as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = commands::parse_date)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and inspect the plan
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Weekly commitments that repeat on a fixed weekday
    Recurring {
        #[command(subcommand)]
        action: commands::recurring::RecurringAction,
    },
    /// Homework with a due date
    Homework {
        #[command(subcommand)]
        action: commands::homework::HomeworkAction,
    },
    /// Exams that need revision
    Exam {
        #[command(subcommand)]
        action: commands::exam::ExamAction,
    },
    /// Long-running projects
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Daily study capacity
    Capacity {
        #[command(subcommand)]
        action: commands::capacity::CapacityAction,
    },
    /// Mark a plan item done
    Done(commands::done::DoneArgs),
    /// Commit revision slots and homework dates
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let today = cli.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::debug!(%today, "planning date");
    let result = match cli.command {
        Commands::Plan { action } => commands::plan::run(action, today),
        Commands::Recurring { action } => commands::recurring::run(action),
        Commands::Homework { action } => commands::homework::run(action, today),
        Commands::Exam { action } => commands::exam::run(action),
        Commands::Project { action } => commands::project::run(action),
        Commands::Capacity { action } => commands::capacity::run(action),
        Commands::Done(args) => commands::done::run(args, today),
        Commands::Sync { action } => commands::sync::run(action, today),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
