use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Local};
use now::DateTimeNow;

use crate::engine::streak::StreakAdvance;

use super::CliDashboard;

/// Midnight of the most recent sunday. The weekly stats window starts on
/// sunday, unlike the monday-start convention of calendar weeks.
fn sunday_week_start(now: DateTime<Local>) -> DateTime<Local> {
    let days_into_week = now.date_naive().weekday().num_days_from_sunday();
    (now - Duration::days(days_into_week as i64)).beginning_of_day()
}

pub async fn process_stats_command(dashboard: &CliDashboard) -> Result<()> {
    let today = dashboard.today_progress().await?;
    let week = dashboard.weekly_overview().await?;
    let focus = dashboard.focus_time_estimate().await?;
    let history = dashboard.history_stats().await?;

    println!("Today");
    println!(
        "  {} of {} done ({}%)",
        today.completed, today.total, today.completion_rate
    );

    let week_start = sunday_week_start(Local::now());
    println!("Week of {}", week_start.format("%x"));
    if week.placeholder {
        println!(
            "  no plan yet, showing the baseline: {} of {} ({}%)",
            week.completed, week.total, week.completion_rate
        );
    } else {
        println!(
            "  {} of {} done ({}%)",
            week.completed, week.total, week.completion_rate
        );
    }

    println!("Focus time");
    println!("  today\t{:.1}h of 8h ({}%)", focus.today, focus.today_progress);
    println!("  week\t{:.1}h of 40h ({}%)", focus.week, focus.week_progress);
    println!("  goal\t{}%", focus.goal_progress);

    println!("All time");
    println!(
        "  {} of {} items done ({}%)",
        history.completed, history.total, history.completion_rate
    );
    println!("  {} scheduled this week", history.this_week);
    println!("  {} scheduled this month", history.this_month);
    Ok(())
}

/// Records today's activity into the streak log, then prints the counters.
pub async fn process_streak_command(dashboard: &CliDashboard) -> Result<()> {
    match dashboard.update_daily_streak().await? {
        StreakAdvance::Recorded => println!("Today counted towards your streak."),
        StreakAdvance::Refreshed => println!("Today was already counted."),
        StreakAdvance::NoActivity => {
            println!("No activity yet today. Complete a task or record a highlight.")
        }
    }

    println!("current\t{} days", dashboard.current_streak().await?);
    println!("best\t{} days", dashboard.best_streak().await?);
    println!("active\t{} days total", dashboard.total_active_days().await?);
    println!("consistency\t{}%", dashboard.streak_percentage().await?);
    println!("longest break\t{} days", dashboard.longest_break().await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Local, TimeZone, Timelike, Weekday};

    use super::sunday_week_start;

    #[test]
    fn week_header_starts_on_sunday() {
        // 2024-01-03 is a wednesday
        let wednesday = Local.with_ymd_and_hms(2024, 1, 3, 15, 30, 0).unwrap();
        let start = sunday_week_start(wednesday);
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start.date_naive().day(), 31);
        assert_eq!(start.date_naive().month(), 12);
        assert_eq!((start.hour(), start.minute()), (0, 0));

        // a sunday is already the start of its window
        let sunday = Local.with_ymd_and_hms(2024, 1, 7, 8, 0, 0).unwrap();
        assert_eq!(sunday_week_start(sunday).date_naive(), sunday.date_naive());
    }
}

