//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use fittrack_lib::{
    codec, get_config_path_util, load_config_util, AppService, Category, EditWorkoutParams,
    MutationOutcome, Session, WorkoutFields, WorkoutId, WorkoutRecord,
};

const LOG_ENV_VAR: &str = "FITTRACK_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli_args = cli::parse_args();

    // --- Commands that never talk to the server ---
    match &cli_args.command {
        cli::Commands::GenerateCompletion { shell } => {
            let mut cmd = cli::build_cli_command();
            let bin_name = cmd.get_name().to_string();
            eprintln!("Generating completion script for {}...", shell);
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut stdout());
            return Ok(());
        }
        cli::Commands::Categories => {
            for label in Category::labels() {
                println!("{label}");
            }
            return Ok(());
        }
        cli::Commands::ConfigPath => {
            let path = get_config_path_util().context("Failed to determine config path")?;
            println!("{}", path.display());
            return Ok(());
        }
        cli::Commands::SetServer { url } => {
            let path = get_config_path_util().context("Failed to determine config path")?;
            let mut config = load_config_util(&path)
                .with_context(|| format!("Failed to load config from {path:?}"))?;
            config.set_server_url(url)?;
            fittrack_lib::save_config_util(&path, &config)?;
            println!("Server URL set to {}", config.server_url);
            return Ok(());
        }
        cli::Commands::SetTimeout { seconds } => {
            let path = get_config_path_util().context("Failed to determine config path")?;
            let mut config = load_config_util(&path)
                .with_context(|| format!("Failed to load config from {path:?}"))?;
            config.set_request_timeout(*seconds)?;
            fittrack_lib::save_config_util(&path, &config)?;
            println!("Request timeout set to {} seconds", config.request_timeout_secs);
            return Ok(());
        }
        _ => {}
    }

    let token = cli_args
        .token
        .context("No session token. Pass --token or set FITTRACK_TOKEN.")?;
    let mut service = AppService::initialize(Session::new(token))
        .context("Failed to initialize application service")?;
    let header_color = service.config.header_color();

    match cli_args.command {
        cli::Commands::List { date, export_csv } => {
            let day = date.unwrap_or_else(today);
            let workouts = service.load_day(day).await?.to_vec();
            if export_csv {
                print_workout_csv(&workouts)?;
            } else if workouts.is_empty() {
                println!("No workouts found for {}", day.format("%B %-d, %Y"));
            } else {
                println!("{} Workouts", day.format("%B %-d, %Y"));
                print_workout_table(&workouts, header_color);
            }
        }
        cli::Commands::Add {
            text, category, name, sets, reps, weight, duration,
        } => {
            let result = match text {
                Some(text) => service.add_workout(&text).await,
                None => {
                    // clap guarantees these when --text is absent
                    let fields = WorkoutFields {
                        category: category.context("Missing --category")?.into(),
                        workout_name: name.context("Missing --name")?.trim().to_string(),
                        sets: sets.context("Missing --sets")?,
                        reps: reps.context("Missing --reps")?,
                        weight: weight.context("Missing --weight")?,
                        duration: duration.context("Missing --duration")?,
                    };
                    service.add_workout_fields(&fields).await
                }
            };
            match result {
                Ok(record) => println!(
                    "Successfully added '{}' ({}) ID: {}",
                    record.workout_name(),
                    record.category(),
                    record.id
                ),
                Err(e) => bail!("Error adding workout: {}", e),
            }
        }
        cli::Commands::Edit {
            id, category, name, sets, reps, weight, duration, date,
        } => {
            service.load_day(date.unwrap_or_else(today)).await?;
            let params = EditWorkoutParams {
                id: WorkoutId::new(id.trim()),
                new_category: category.map(Into::into),
                new_workout_name: name,
                new_sets: sets,
                new_reps: reps,
                new_weight: weight,
                new_duration: duration,
            };
            match service.edit_workout(&params).await {
                Ok(MutationOutcome::Committed) => {
                    println!("Workout updated successfully! (ID {})", params.id)
                }
                Ok(MutationOutcome::RolledBack(e)) => {
                    bail!("Failed to update workout {}: {}", params.id, e)
                }
                Err(e) => bail!("Error editing workout {}: {}", params.id, e),
            }
        }
        cli::Commands::Delete { id, date } => {
            service.load_day(date.unwrap_or_else(today)).await?;
            let id = WorkoutId::new(id.trim());
            match service.delete_workout(&id).await {
                Ok(MutationOutcome::Committed) => {
                    println!("Workout deleted successfully! (ID {})", id)
                }
                Ok(MutationOutcome::RolledBack(e)) => {
                    bail!("Failed to delete workout {}: {}", id, e)
                }
                Err(e) => bail!("Error deleting workout {}: {}", id, e),
            }
        }
        cli::Commands::Check { text, date } => {
            let parsed = codec::decode(&text)
                .map_err(|e| anyhow::anyhow!("Invalid workout text: {e}"))?;
            service.load_day(date.unwrap_or_else(today)).await?;
            if service.is_duplicate(&text) {
                bail!(
                    "'{}' ({}) is already logged for this day.",
                    parsed.workout_name,
                    parsed.category
                );
            }
            println!(
                "OK: '{}' ({}) can be added.",
                parsed.workout_name, parsed.category
            );
        }
        cli::Commands::GenerateCompletion { .. }
        | cli::Commands::Categories
        | cli::Commands::ConfigPath
        | cli::Commands::SetServer { .. }
        | cli::Commands::SetTimeout { .. } => {
            unreachable!("Handled before the service is initialized");
        }
    }

    Ok(())
}

fn print_workout_table(workouts: &[WorkoutRecord], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Weight (kg)").fg(header_color),
            Cell::new("Duration (min)").fg(header_color),
            Cell::new("Calories").fg(header_color),
        ]);

    for workout in workouts {
        let fields = &workout.fields;
        table.add_row(vec![
            Cell::new(workout.id.to_string()),
            Cell::new(fields.category.to_string()),
            Cell::new(&fields.workout_name),
            Cell::new(fields.sets.to_string()),
            Cell::new(fields.reps.to_string()),
            Cell::new(format!("{:.2}", fields.weight)),
            Cell::new(fields.duration.to_string()),
            Cell::new(workout.calories_burned.map_or("-".to_string(), |c| format!("{c:.0}"))),
        ]);
    }
    println!("{table}");
}

fn print_workout_csv(workouts: &[WorkoutRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Date",
        "Category",
        "Workout",
        "Sets",
        "Reps",
        "Weight_kg",
        "Duration_min",
        "Calories",
    ])?;

    for workout in workouts {
        let fields = &workout.fields;
        writer.write_record(&[
            workout.id.to_string(),
            workout.date.format("%Y-%m-%d").to_string(),
            fields.category.to_string(),
            fields.workout_name.clone(),
            fields.sets.to_string(),
            fields.reps.to_string(),
            fields.weight.to_string(),
            fields.duration.to_string(),
            workout.calories_burned.map_or(String::new(), |c| c.to_string()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
