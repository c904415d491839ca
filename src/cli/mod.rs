pub mod calendar;
pub mod stats;
pub mod timeline;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use calendar::{process_calendar_command, CalendarCommand};
use chrono::{Local, NaiveDate, Weekday};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use stats::{process_stats_command, process_streak_command};
use timeline::{process_timeline_command, TimelineCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    engine::{aggregate::Category, commands::ReviewSection, Dashboard},
    store::{
        entities::HighlightKind,
        record_store::{JsonFileStore, StoreKey},
    },
    utils::{clock::DefaultClock, dir::create_application_default_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Daykeeper", version, long_about = None)]
#[command(about = "Command line productivity dashboard", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state",
        global = true
    )]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Display a month calendar with activity markers")]
    Calendar {
        #[command(flatten)]
        command: CalendarCommand,
    },
    #[command(about = "Display every task, schedule entry and highlight for a day")]
    Timeline {
        #[command(flatten)]
        command: TimelineCommand,
    },
    #[command(about = "Display completion, focus time and history statistics")]
    Stats {},
    #[command(about = "Record today's activity and display streak counters")]
    Streak {},
    #[command(about = "Manage the recurring weekday task template")]
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    #[command(about = "Manage daily highlights")]
    Highlight {
        #[command(subcommand)]
        command: HighlightCommands,
    },
    #[command(about = "Manage date-bound schedule entries")]
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    #[command(about = "Manage the weekly plan")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    #[command(about = "Manage the weekly review")]
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    #[command(about = "Complete the daily shutdown ritual")]
    Shutdown {
        #[arg(help = "Optional closing note for the day")]
        note: Option<String>,
    },
    #[command(about = "Inspect or clear the saved ritual records")]
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommands {
    #[command(about = "Add a task to a weekday's template")]
    Add {
        description: String,
        #[arg(long, value_parser = parse_weekday, help = "Weekday the task recurs on. Defaults to today's")]
        day: Option<Weekday>,
        #[arg(long, default_value = "", help = "Time of day, e.g. \"9:00 AM\"")]
        time: String,
        #[arg(long, default_value = "", help = "Expected duration, e.g. \"1 hour\"")]
        duration: String,
        #[arg(long, default_value = "", help = "Project the task belongs to")]
        project: String,
    },
    #[command(about = "Mark a task completed")]
    Complete {
        id: i64,
        #[arg(long, value_parser = parse_weekday, help = "Weekday bucket to look in. Defaults to today's")]
        day: Option<Weekday>,
        #[arg(long, help = "Mark the task as not completed instead")]
        undo: bool,
    },
    #[command(about = "Remove a task from a weekday's template")]
    Remove {
        id: i64,
        #[arg(long, value_parser = parse_weekday, help = "Weekday bucket to look in. Defaults to today's")]
        day: Option<Weekday>,
    },
    #[command(about = "List the template for one weekday or the whole week")]
    List {
        #[arg(long, value_parser = parse_weekday, help = "Only list this weekday")]
        day: Option<Weekday>,
    },
    #[command(about = "Load the starter template. Refuses to overwrite existing tasks")]
    Seed {},
}

#[derive(Subcommand, Debug)]
enum HighlightCommands {
    #[command(about = "Record a highlight for today")]
    Add {
        text: String,
        #[arg(long, value_parser = parse_highlight_kind, default_value = "note", help = "One of win, insight, note, gratitude")]
        kind: HighlightKind,
    },
    #[command(about = "Remove a highlight by id")]
    Remove { id: i64 },
    #[command(about = "List highlights for a day")]
    List {
        #[arg(long, help = "Day to list. Examples are \"yesterday\", \"15/03/2025\". Defaults to today")]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
}

#[derive(Subcommand, Debug)]
enum ScheduleCommands {
    #[command(about = "Add a schedule entry on a calendar date")]
    Add {
        description: String,
        #[arg(long, default_value = "", help = "Time of day, e.g. \"1:00 PM\"")]
        time: String,
        #[arg(long, help = "Date of the entry. Examples are \"tomorrow\", \"15/03/2025\". Defaults to today")]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Remove a schedule entry by id")]
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
enum PlanCommands {
    #[command(about = "Add a goal or task to the weekly plan")]
    Add {
        text: String,
        #[arg(long, help = "Add as a goal instead of a task")]
        goal: bool,
    },
    #[command(about = "Mark a plan item completed")]
    Complete {
        id: i64,
        #[arg(long, help = "Mark the item as not completed instead")]
        undo: bool,
    },
    #[command(about = "Show the weekly plan")]
    Show {},
}

#[derive(Subcommand, Debug)]
enum ReviewCommands {
    #[command(about = "Record an achievement of the week")]
    Achievement { text: String },
    #[command(about = "Record a lesson learned")]
    Lesson { text: String },
    #[command(about = "Record something to improve")]
    Improve { text: String },
    #[command(about = "Rate the week from 1 to 5")]
    Rate {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
    },
    #[command(about = "Show the weekly review")]
    Show {},
}

#[derive(Subcommand, Debug)]
enum DataCommands {
    #[command(about = "Dump the saved ritual records as raw JSON")]
    Show {},
    #[command(about = "Clear highlights, plan, review, shutdown and focus time. Tasks and streaks are kept")]
    Clear {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let data_path = match &args.dir {
        Some(dir) => dir.clone(),
        None => create_application_default_path()?,
    };
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&data_path, logging_level, args.log)?;

    let store = JsonFileStore::new(data_path.join("records"))?;
    let dashboard = Dashboard::new(store, DefaultClock);

    match args.commands {
        Commands::Calendar { command } => process_calendar_command(&dashboard, command).await,
        Commands::Timeline { command } => process_timeline_command(&dashboard, command).await,
        Commands::Stats {} => process_stats_command(&dashboard).await,
        Commands::Streak {} => process_streak_command(&dashboard).await,
        Commands::Task { command } => process_task_command(&dashboard, command).await,
        Commands::Highlight { command } => process_highlight_command(&dashboard, command).await,
        Commands::Schedule { command } => process_schedule_command(&dashboard, command).await,
        Commands::Plan { command } => process_plan_command(&dashboard, command).await,
        Commands::Review { command } => process_review_command(&dashboard, command).await,
        Commands::Shutdown { note } => {
            dashboard.complete_shutdown(note).await?;
            println!("Daily shutdown complete. See you tomorrow.");
            Ok(())
        }
        Commands::Data { command } => process_data_command(&dashboard, command).await,
    }
}

pub type CliDashboard = Dashboard<JsonFileStore, DefaultClock>;

async fn process_task_command(dashboard: &CliDashboard, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::Add {
            description,
            day,
            time,
            duration,
            project,
        } => {
            let task = dashboard
                .add_task(day, time, description, duration, project)
                .await?;
            println!("Added task {}", task.id);
        }
        TaskCommands::Complete { id, day, undo } => {
            let day = day.unwrap_or_else(|| chrono::Datelike::weekday(&Local::now().date_naive()));
            if dashboard.set_task_completed(day, id, !undo).await? {
                println!("Task {id} {}", if undo { "reopened" } else { "completed" });
            } else {
                println!("No task {id} under {day}");
            }
        }
        TaskCommands::Remove { id, day } => {
            let date = match day {
                Some(day) => date_of_weekday(day),
                None => Local::now().date_naive(),
            };
            if dashboard.remove_item(Category::Tasks, date, id).await? {
                println!("Removed task {id}");
            } else {
                println!("No task {id} on that weekday");
            }
        }
        TaskCommands::List { day } => {
            let days: Vec<Weekday> = match day {
                Some(day) => vec![day],
                None => vec![
                    Weekday::Sun,
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                    Weekday::Fri,
                    Weekday::Sat,
                ],
            };
            let date = Local::now().date_naive();
            for day in days {
                let items = dashboard.items_for_date(date_of_weekday_from(date, day)).await?;
                let tasks: Vec<_> = items
                    .iter()
                    .filter(|item| item.category == Category::Tasks)
                    .collect();
                if tasks.is_empty() {
                    continue;
                }
                println!("{day}");
                for task in tasks {
                    println!(
                        "  [{}]\t{}\t{}\t{}",
                        if task.completed { "x" } else { " " },
                        task.id,
                        task.time.as_deref().unwrap_or("-"),
                        task.text
                    );
                }
            }
        }
        TaskCommands::Seed {} => {
            if dashboard.seed_sample_tasks().await? {
                println!("Loaded the starter template");
            } else {
                println!("Tasks already exist, nothing was changed");
            }
        }
    }
    Ok(())
}

async fn process_highlight_command(
    dashboard: &CliDashboard,
    command: HighlightCommands,
) -> Result<()> {
    match command {
        HighlightCommands::Add { text, kind } => {
            let highlight = dashboard.add_highlight(kind, text).await?;
            println!("{} Recorded highlight {}", highlight.kind.icon(), highlight.id);
        }
        HighlightCommands::Remove { id } => {
            let today = Local::now().date_naive();
            if dashboard.remove_item(Category::Highlights, today, id).await? {
                println!("Removed highlight {id}");
            } else {
                println!("No highlight {id}");
            }
        }
        HighlightCommands::List { date, date_style } => {
            let date = parse_cli_date(date.as_deref(), date_style)?;
            let items = dashboard.items_for_date(date).await?;
            let highlights: Vec<_> = items
                .iter()
                .filter(|item| item.category == Category::Highlights)
                .collect();
            if highlights.is_empty() {
                println!("No highlights on {}", date.format("%x"));
            }
            for highlight in highlights {
                println!("{}\t{}", highlight.id, highlight.text);
            }
        }
    }
    Ok(())
}

async fn process_schedule_command(
    dashboard: &CliDashboard,
    command: ScheduleCommands,
) -> Result<()> {
    match command {
        ScheduleCommands::Add {
            description,
            time,
            date,
            date_style,
        } => {
            let date = parse_cli_date(date.as_deref(), date_style)?;
            let entry = dashboard.add_schedule_entry(date, time, description).await?;
            println!("Scheduled {} on {}", entry.id, date.format("%x"));
        }
        ScheduleCommands::Remove { id } => {
            let today = Local::now().date_naive();
            if dashboard.remove_item(Category::Schedule, today, id).await? {
                println!("Removed schedule entry {id}");
            } else {
                println!("No schedule entry {id}");
            }
        }
    }
    Ok(())
}

async fn process_plan_command(dashboard: &CliDashboard, command: PlanCommands) -> Result<()> {
    match command {
        PlanCommands::Add { text, goal } => {
            let item = dashboard.plan_add(text, goal).await?;
            println!(
                "Added {} {}",
                if goal { "goal" } else { "task" },
                item.id
            );
        }
        PlanCommands::Complete { id, undo } => {
            if dashboard.plan_set_completed(id, !undo).await? {
                println!("Plan item {id} {}", if undo { "reopened" } else { "completed" });
            } else {
                println!("No plan item {id}");
            }
        }
        PlanCommands::Show {} => {
            let plan = dashboard.weekly_plan().await?;
            println!("Goals");
            for item in &plan.goals {
                println!("  [{}]\t{}\t{}", if item.completed { "x" } else { " " }, item.id, item.text);
            }
            println!("Tasks");
            for item in &plan.tasks {
                println!("  [{}]\t{}\t{}", if item.completed { "x" } else { " " }, item.id, item.text);
            }
            println!("{} of {} done", plan.completed(), plan.total());
        }
    }
    Ok(())
}

async fn process_review_command(dashboard: &CliDashboard, command: ReviewCommands) -> Result<()> {
    match command {
        ReviewCommands::Achievement { text } => {
            dashboard.review_add(ReviewSection::Achievement, text).await?;
            println!("Achievement recorded");
        }
        ReviewCommands::Lesson { text } => {
            dashboard.review_add(ReviewSection::Lesson, text).await?;
            println!("Lesson recorded");
        }
        ReviewCommands::Improve { text } => {
            dashboard.review_add(ReviewSection::Improvement, text).await?;
            println!("Improvement recorded");
        }
        ReviewCommands::Rate { rating } => {
            dashboard.review_rate(rating).await?;
            println!("Week rated {rating}/5");
        }
        ReviewCommands::Show {} => {
            let review = dashboard.weekly_review().await?;
            print_review_section("Achievements", &review.achievements);
            print_review_section("Lessons", &review.lessons);
            print_review_section("Improvements", &review.improvements);
            match review.rating {
                Some(rating) => println!("Rating: {rating}/5"),
                None => println!("Rating: not set"),
            }
        }
    }
    Ok(())
}

fn print_review_section(title: &str, entries: &[String]) {
    println!("{title}");
    if entries.is_empty() {
        println!("  (none)");
    }
    for entry in entries {
        println!("  - {entry}");
    }
}

async fn process_data_command(dashboard: &CliDashboard, command: DataCommands) -> Result<()> {
    match command {
        DataCommands::Show {} => {
            for (key, value) in dashboard.saved_data().await? {
                println!("{key}: {}", value.as_deref().unwrap_or("(empty)"));
            }
        }
        DataCommands::Clear {} => {
            dashboard.clear_all().await?;
            let kept = [StoreKey::Tasks, StoreKey::Streaks];
            println!(
                "Cleared saved data. {} and {} were kept.",
                kept[0].as_str(),
                kept[1].as_str()
            );
        }
    }
    Ok(())
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    value
        .parse()
        .map_err(|_| format!("Unknown weekday \"{value}\""))
}

fn parse_highlight_kind(value: &str) -> Result<HighlightKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "win" => Ok(HighlightKind::Win),
        "insight" => Ok(HighlightKind::Insight),
        "note" => Ok(HighlightKind::Note),
        "gratitude" => Ok(HighlightKind::Gratitude),
        other => Err(format!("Unknown highlight kind \"{other}\"")),
    }
}

/// Parses a human date like "yesterday" or "15/03/2025", defaulting to today.
/// Errors surface as clap validation errors so the usage text is printed.
pub(crate) fn parse_cli_date(value: Option<&str>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    let dialect: chrono_english::Dialect = date_style.into();
    match value.map(|s| parse_date_string(s, now, dialect)) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local).date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

/// Next occurrence of the weekday, counting today as a candidate.
fn date_of_weekday(weekday: Weekday) -> NaiveDate {
    date_of_weekday_from(Local::now().date_naive(), weekday)
}

fn date_of_weekday_from(start: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut date = start;
    while chrono::Datelike::weekday(&date) != weekday {
        date = date.succ_opt().expect("dates this far from the maximum always have a successor");
    }
    date
}
