use anyhow::Result;
use clap::Parser;

use crate::engine::aggregate::ActivityItem;

use super::{parse_cli_date, CliDashboard, DateStyle};

#[derive(Debug, Parser)]
pub struct TimelineCommand {
    #[arg(
        long,
        short,
        help = "Day to display. Examples are \"yesterday\", \"15/03/2025\", \"last friday\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Only show items that are not completed yet")]
    pending: bool,
}

/// Prints every activity for one day, ordered by time of day where one is set.
pub async fn process_timeline_command(
    dashboard: &CliDashboard,
    TimelineCommand {
        date,
        date_style,
        pending,
    }: TimelineCommand,
) -> Result<()> {
    let date = parse_cli_date(date.as_deref(), date_style)?;
    let items = dashboard.items_for_date(date).await?;

    println!("{}", date.format("%A %x"));
    let mut shown = 0;
    for item in &items {
        if pending && item.completed {
            continue;
        }
        print_item(item);
        shown += 1;
    }
    if shown == 0 {
        println!("Nothing here.");
    }
    Ok(())
}

fn print_item(item: &ActivityItem) {
    println!(
        "{}\t[{}]\t{}\t{}\t{}",
        item.category.icon(),
        if item.completed { "x" } else { " " },
        item.time.as_deref().unwrap_or("     "),
        item.id,
        item.text
    );
}
