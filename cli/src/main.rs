mod classify;
mod commands;
mod config;
mod openfoodfacts;
mod sync_http;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_barcode, cmd_dedupe, cmd_export, cmd_frequent, cmd_goal_set, cmd_goal_show,
    cmd_goal_toggle, cmd_import, cmd_log, cmd_max, cmd_photo, cmd_remove, cmd_search, cmd_summary,
    cmd_sync_pull, cmd_sync_push, cmd_track_add, cmd_track_define, cmd_track_rm, cmd_track_show,
    cmd_week, cmd_weight_history, cmd_weight_log, cmd_workout_best, cmd_workout_log,
    cmd_workout_show,
};
use crate::config::Config;
use crate::openfoodfacts::OpenFoodFactsClient;
use tally_core::service::TallyService;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "A local-first fitness & nutrition tracker CLI",
    long_about = "\n\n  ████████╗ █████╗ ██╗     ██╗  ██╗   ██╗
  ╚══██╔══╝██╔══██╗██║     ██║  ╚██╗ ██╔╝
     ██║   ███████║██║     ██║   ╚████╔╝
     ██║   ██╔══██║██║     ██║    ╚██╔╝
     ██║   ██║  ██║███████╗███████╗██║
     ╚═╝   ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝
        every bite and every rep, counted.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food entry
    Log {
        /// Food name
        name: String,
        /// Calories for this entry
        #[arg(long)]
        calories: f64,
        /// Protein in grams
        #[arg(long, default_value_t = 0.0)]
        protein: f64,
        /// Carbs in grams
        #[arg(long, default_value_t = 0.0)]
        carbs: f64,
        /// Fat in grams
        #[arg(long, default_value_t = 0.0)]
        fat: f64,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search `OpenFoodFacts` and log the chosen result
    Search {
        /// Search query
        query: String,
        /// Serving size in grams
        #[arg(short, long, default_value_t = 100.0)]
        serving: f64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output candidates as JSON without logging
        #[arg(long)]
        json: bool,
    },
    /// Look up a barcode and log the product after confirmation
    Barcode {
        /// Barcode number
        code: String,
        /// Serving size in grams
        #[arg(short, long, default_value_t = 100.0)]
        serving: f64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output the candidate as JSON without logging
        #[arg(long)]
        json: bool,
    },
    /// Estimate a meal from a photo and log it after confirmation
    Photo {
        /// Path to the image file
        file: PathBuf,
        /// Classifier endpoint (default: $TALLY_VISION_URL)
        #[arg(long)]
        endpoint: Option<String>,
        /// Serving size in grams
        #[arg(short, long, default_value_t = 100.0)]
        serving: f64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output the estimate as JSON without logging
        #[arg(long)]
        json: bool,
    },
    /// Remove a food entry by its position in the day's list
    Remove {
        /// Entry position as shown by `tally summary` (starting at 1)
        position: usize,
        /// Date to remove from (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove duplicate food entries for a day
    Dedupe {
        /// Date to deduplicate (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Match on name + calories only instead of all fields
        #[arg(long)]
        fuzzy: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show totals for the last N days
    Week {
        /// Last day of the range (default: today)
        #[arg(long)]
        end: Option<String>,
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Most frequently logged foods (quick-add shortcuts)
    Frequent {
        /// How many foods to show
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage calorie/macro goals and the training-day switch
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Log and review workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },
    /// Estimate a one-rep max from a submaximal set
    Max {
        /// Weight lifted
        weight: f64,
        /// Reps performed
        reps: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Custom daily trackers (water, steps, ...)
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Export all data as JSON (or CSV with --csv)
    Export {
        /// Export as CSV instead of a JSON snapshot
        #[arg(long)]
        csv: bool,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Import a snapshot, replacing matching data after confirmation
    Import {
        /// Path to the snapshot (JSON) or CSV file
        file: PathBuf,
        /// Treat the file as CSV
        #[arg(long)]
        csv: bool,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sync the full snapshot with a cloud account
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set a goal: rest, train, protein, carbs, or fat
    Set {
        /// Which goal to set
        kind: String,
        /// New target value (must be positive)
        value: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show all goals and the active calorie target
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle between rest and training day
    Toggle {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Log a workout entry
    Log {
        /// Exercise name
        exercise: String,
        /// Number of sets
        sets: u32,
        /// Reps per set
        reps: u32,
        /// Weight lifted (kg)
        weight: f64,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's workout (default: today)
    Show {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the heaviest logged weight for an exercise
    Best {
        /// Exercise name
        exercise: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Define a tracker tile
    Define {
        /// Tracker name
        name: String,
        /// Display unit
        #[arg(long, default_value = "count")]
        unit: String,
        /// Amount added per `track add`
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Bump a tracker by its step
    Add {
        /// Tracker name
        name: String,
        /// Date to log for (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's tracker readings (default: today)
    Show {
        /// Date to show (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a tracker and its history
    Rm {
        /// Tracker name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a body-weight reading
    Log {
        /// Weight in kg
        kg: f64,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Number of most recent entries to show (default: all)
        #[arg(short, long)]
        days: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Upload the current snapshot
    Push {
        /// Sync server base URL
        #[arg(long)]
        url: String,
        /// Account identity
        #[arg(long)]
        account: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download and merge the remote snapshot
    Pull {
        /// Sync server base URL
        #[arg(long)]
        url: String,
        /// Account identity
        #[arg(long)]
        account: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let mut svc = TallyService::open_at(&config.db_path)?;
    let off = OpenFoodFactsClient::new();

    match cli.command {
        Commands::Log {
            name,
            calories,
            protein,
            carbs,
            fat,
            date,
            json,
        } => cmd_log(&mut svc, &name, calories, protein, carbs, fat, date, json),
        Commands::Search {
            query,
            serving,
            date,
            json,
        } => cmd_search(&mut svc, &off, &query, serving, date, json).await,
        Commands::Barcode {
            code,
            serving,
            date,
            json,
        } => cmd_barcode(&mut svc, &off, &code, serving, date, json).await,
        Commands::Photo {
            file,
            endpoint,
            serving,
            date,
            json,
        } => {
            let endpoint = config.vision_endpoint(endpoint)?;
            cmd_photo(&mut svc, &endpoint, &file, serving, date, json).await
        }
        Commands::Remove {
            position,
            date,
            json,
        } => cmd_remove(&mut svc, position, date, json),
        Commands::Dedupe { date, fuzzy, json } => cmd_dedupe(&mut svc, date, fuzzy, json),
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::Week { end, days, json } => cmd_week(&svc, end, days, json),
        Commands::Frequent { count, json } => cmd_frequent(&svc, count, json),
        Commands::Goal { command } => match command {
            GoalCommands::Set { kind, value, json } => cmd_goal_set(&mut svc, &kind, value, json),
            GoalCommands::Show { json } => cmd_goal_show(&svc, json),
            GoalCommands::Toggle { json } => cmd_goal_toggle(&mut svc, json),
        },
        Commands::Workout { command } => match command {
            WorkoutCommands::Log {
                exercise,
                sets,
                reps,
                weight,
                date,
                json,
            } => cmd_workout_log(&mut svc, &exercise, sets, reps, weight, date, json),
            WorkoutCommands::Show { date, json } => cmd_workout_show(&svc, date, json),
            WorkoutCommands::Best { exercise, json } => cmd_workout_best(&svc, &exercise, json),
        },
        Commands::Max { weight, reps, json } => cmd_max(weight, reps, json),
        Commands::Track { command } => match command {
            TrackCommands::Define {
                name,
                unit,
                step,
                json,
            } => cmd_track_define(&mut svc, &name, &unit, step, json),
            TrackCommands::Add { name, date, json } => cmd_track_add(&mut svc, &name, date, json),
            TrackCommands::Show { date, json } => cmd_track_show(&svc, date, json),
            TrackCommands::Rm { name, json } => cmd_track_rm(&mut svc, &name, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log { kg, date, json } => cmd_weight_log(&mut svc, kg, date, json),
            WeightCommands::History { days, json } => cmd_weight_history(&svc, days, json),
        },
        Commands::Export { csv, out } => cmd_export(&svc, csv, out.as_deref()),
        Commands::Import {
            file,
            csv,
            yes,
            json,
        } => cmd_import(&mut svc, &file, csv, yes, json),
        Commands::Sync { command } => match command {
            SyncCommands::Push { url, account, json } => {
                cmd_sync_push(&svc, &url, &account, json).await
            }
            SyncCommands::Pull { url, account, json } => {
                cmd_sync_pull(&mut svc, &url, &account, json).await
            }
        },
    }
}
