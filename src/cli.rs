// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use fittrack_lib::Category;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log workouts against a FitTrack server", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Bearer token of the signed-in user
    #[arg(long, global = true, env = "FITTRACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryCli {
    Legs,
    Chest,
    Back,
    Shoulders,
    Arms,
    Core,
    Cardio,
    FullBody,
    Other,
}

impl From<CategoryCli> for Category {
    fn from(value: CategoryCli) -> Self {
        match value {
            CategoryCli::Legs => Category::Legs,
            CategoryCli::Chest => Category::Chest,
            CategoryCli::Back => Category::Back,
            CategoryCli::Shoulders => Category::Shoulders,
            CategoryCli::Arms => Category::Arms,
            CategoryCli::Core => Category::Core,
            CategoryCli::Cardio => Category::Cardio,
            CategoryCli::FullBody => Category::FullBody,
            CategoryCli::Other => Category::Other,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the workouts logged on a day
    List {
        /// Day to show (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Print CSV instead of a table
        #[arg(long)]
        export_csv: bool,
    },
    /// Add a workout for today, either as raw text or from individual fields
    Add {
        /// Workout text: "#Category\n-Name\n-3 sets 10 reps\n-50 kg\n-20 min"
        #[arg(long, conflicts_with_all = &["category", "name", "sets", "reps", "weight", "duration"])]
        text: Option<String>,
        #[arg(short, long, value_enum, required_unless_present = "text")]
        category: Option<CategoryCli>,
        /// Name of the exercise (e.g., "Back Squat")
        #[arg(short, long, required_unless_present = "text")]
        name: Option<String>,
        #[arg(short, long, required_unless_present = "text")]
        sets: Option<u32>,
        #[arg(short, long, required_unless_present = "text")]
        reps: Option<u32>,
        /// Weight in kg
        #[arg(short, long, required_unless_present = "text")]
        weight: Option<f64>,
        /// Duration in minutes
        #[arg(short, long, required_unless_present = "text")]
        duration: Option<f64>,
    },
    /// Edit a workout; omitted fields keep their value
    Edit {
        id: String,
        #[arg(short, long, value_enum)]
        category: Option<CategoryCli>,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        sets: Option<u32>,
        #[arg(short, long)]
        reps: Option<u32>,
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        duration: Option<f64>,
        /// Day the workout belongs to, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a workout
    Delete {
        id: String,
        /// Day the workout belongs to, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check workout text locally: format, then duplicates on the given day
    Check {
        text: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List the workout categories
    Categories,
    /// Show the path to the config file
    ConfigPath,
    /// Set the server base URL (e.g. http://localhost:8080/api)
    SetServer { url: String },
    /// Set the request timeout in seconds
    SetTimeout { seconds: u64 },
    /// Generate shell completion scripts
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
