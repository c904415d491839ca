use ansi_term::{Colour, Style};
use anyhow::Result;
use chrono::Datelike;
use clap::Parser;

use crate::engine::calendar::{DayState, MonthGrid};

use super::{parse_cli_date, CliDashboard, DateStyle};

#[derive(Debug, Parser)]
pub struct CalendarCommand {
    #[arg(
        long,
        help = "Day to focus. Examples are \"today\", \"15/03/2025\", \"next friday\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(
        long,
        default_value_t = 0,
        help = "Months to shift from the focused date, e.g. -1 for the previous month"
    )]
    offset: i32,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Disable colors, mark days with symbols instead")]
    plain: bool,
}

pub async fn process_calendar_command(
    dashboard: &CliDashboard,
    CalendarCommand {
        date,
        offset,
        date_style,
        plain,
    }: CalendarCommand,
) -> Result<()> {
    let focused = parse_cli_date(date.as_deref(), date_style)?;
    let month0 = focused.month0() as i32 + offset;
    // the focused day only shows as selected inside its own month
    let selected = (offset == 0).then_some(focused);

    let grid = dashboard.project_month(focused.year(), month0, selected).await?;
    print_grid(&grid, plain);
    Ok(())
}

fn print_grid(grid: &MonthGrid, plain: bool) {
    println!("{} {}", grid.month_name(), grid.year);
    println!("Su Mo Tu We Th Fr Sa");

    let mut column = grid.leading_blanks;
    print!("{}", "   ".repeat(column as usize));
    for cell in &grid.days {
        print!("{} ", render_day(cell.day, cell.state, plain));
        column += 1;
        if column % 7 == 0 {
            println!();
        }
    }
    if column % 7 != 0 {
        println!();
    }

    if plain {
        println!("\n[n] focused  *n* today  .n. has activity");
    } else {
        println!(
            "\n{} focused  {} today  {} has activity",
            selected_style().paint("dd"),
            today_style().paint("dd"),
            active_style().paint("dd")
        );
    }
}

fn render_day(day: u32, state: DayState, plain: bool) -> String {
    if plain {
        return match state {
            DayState::Selected => format!("[{day}]"),
            DayState::Today => format!("*{day}*"),
            DayState::Active => format!(".{day}."),
            DayState::Plain => format!("{day:2}"),
        };
    }
    let text = format!("{day:2}");
    match state {
        DayState::Selected => selected_style().paint(text).to_string(),
        DayState::Today => today_style().paint(text).to_string(),
        DayState::Active => active_style().paint(text).to_string(),
        DayState::Plain => text,
    }
}

fn selected_style() -> Style {
    Colour::White.on(Colour::Blue).bold()
}

fn today_style() -> Style {
    Colour::Yellow.bold()
}

fn active_style() -> Style {
    Colour::Green.normal()
}
