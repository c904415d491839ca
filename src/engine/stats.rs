use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};

use crate::{
    store::{
        entities::{
            FocusTimeData, Highlight, ScheduleEntry, TaskCollection, WeeklyPlan,
        },
        record_store::{read_or_default, RecordStore, StoreKey},
    },
    utils::{
        clock::Clock,
        percentage::{goal_percent, ratio_percent},
        time::weekday_name,
    },
};

use super::Dashboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodayProgress {
    pub completed: u32,
    pub in_progress: u32,
    pub total: u32,
    pub completion_rate: u8,
    pub in_progress_rate: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyOverview {
    pub total: u32,
    pub completed: u32,
    pub completion_rate: u8,
    /// True when no plan items and no highlights existed and the synthetic
    /// baseline was substituted. Callers should label the numbers accordingly.
    pub placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTime {
    pub today: f64,
    pub week: f64,
    pub today_progress: u8,
    pub week_progress: u8,
    pub goal_progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: u32,
    pub completed: u32,
    pub completion_rate: u8,
    pub this_week: u32,
    pub this_month: u32,
}

/// Baseline shown when no weekly data exists at all: 24 items at 75%.
const PLACEHOLDER_WEEKLY_TOTAL: u32 = 24;
const PLACEHOLDER_WEEKLY_COMPLETED: u32 = 18;

const DAILY_FOCUS_GOAL_HOURS: f64 = 8.;
const WEEKLY_FOCUS_GOAL_HOURS: f64 = 40.;
/// Estimated focus time credited per completed task when no real data exists.
const TODAY_HOURS_PER_COMPLETED: f64 = 0.5;
const WEEK_HOURS_PER_COMPLETED: f64 = 0.75;

/// Completion counters for one day's weekday-template bucket. With no tasks
/// anywhere, the highlight list substitutes as the population. The stored task
/// shape has no in-progress state, so that counter is structurally zero; it is
/// kept for interface parity with the dashboard views.
pub fn today_progress(
    weekday: Weekday,
    tasks: &TaskCollection,
    highlights: &[Highlight],
) -> TodayProgress {
    let bucket = tasks.for_weekday(weekday);
    let mut total = bucket.len() as u32;
    let mut completed = bucket.iter().filter(|task| task.completed).count() as u32;
    let in_progress = 0;

    if total == 0 {
        total = highlights.len() as u32;
        completed = highlights.iter().filter(|h| h.completed).count() as u32;
    }

    TodayProgress {
        completed,
        in_progress,
        total,
        completion_rate: ratio_percent(completed as u64, total as u64),
        in_progress_rate: ratio_percent(in_progress as u64, total as u64),
    }
}

/// Weekly plan items plus highlights. An empty week reports the synthetic
/// baseline with the placeholder flag raised rather than a bare zero.
pub fn weekly_overview(plan: &WeeklyPlan, highlights: &[Highlight]) -> WeeklyOverview {
    let mut total = (plan.total() + highlights.len()) as u32;
    let mut completed = (plan.completed()
        + highlights.iter().filter(|h| h.completed).count()) as u32;

    let placeholder = total == 0;
    if placeholder {
        total = PLACEHOLDER_WEEKLY_TOTAL;
        completed = PLACEHOLDER_WEEKLY_COMPLETED;
    }

    WeeklyOverview {
        total,
        completed,
        completion_rate: ratio_percent(completed as u64, total as u64),
        placeholder,
    }
}

/// Focus hours with progress against the fixed 8h/40h goals. Hours of zero are
/// backfilled from completion counts, rounded to a tenth of an hour.
pub fn focus_time(
    data: &FocusTimeData,
    completed_today: u32,
    completed_week: u32,
) -> FocusTime {
    let mut today = data.today;
    if today == 0. {
        today = (completed_today as f64 * TODAY_HOURS_PER_COMPLETED * 10.).round() / 10.;
    }
    let mut week = data.week;
    if week == 0. {
        week = (completed_week as f64 * WEEK_HOURS_PER_COMPLETED * 10.).round() / 10.;
    }

    let today_progress = goal_percent(today, DAILY_FOCUS_GOAL_HOURS);
    let week_progress = goal_percent(week, WEEKLY_FOCUS_GOAL_HOURS);
    let goal_progress = ((today_progress as f64 + week_progress as f64) / 2.).round() as u8;

    FocusTime {
        today,
        week,
        today_progress,
        week_progress,
        goal_progress,
    }
}

/// Rollups across every stored category: lifetime totals, the weekday buckets
/// already passed this week (sunday..today), and this month's items. Template
/// tasks carry no date and count towards the current month wholesale.
pub fn history_stats(
    today: NaiveDate,
    tasks: &TaskCollection,
    schedule: &[ScheduleEntry],
    highlights: &[Highlight],
) -> HistoryStats {
    let task_count = tasks.iter_all().count();
    let total = (task_count + schedule.len() + highlights.len()) as u32;
    let completed = (tasks.iter_all().filter(|t| t.completed).count()
        + schedule.iter().filter(|s| s.completed).count()
        + highlights.iter().filter(|h| h.completed).count()) as u32;

    let passed_weekdays = weekdays_until(today.weekday());
    let this_week = passed_weekdays
        .iter()
        .filter_map(|name| tasks.0.get(*name))
        .map(|bucket| bucket.len() as u32)
        .sum();

    let month_start = today.with_day(1).expect("every month has a first day");
    let dated_this_month = schedule
        .iter()
        .filter_map(ScheduleEntry::day)
        .chain(highlights.iter().filter_map(Highlight::day))
        .filter(|date| *date >= month_start)
        .count();
    let this_month = (task_count + dated_this_month) as u32;

    HistoryStats {
        total,
        completed,
        completion_rate: ratio_percent(completed as u64, total as u64),
        this_week,
        this_month,
    }
}

/// Weekday names from sunday up to and including the given weekday, the
/// "so far this week" window of a sunday-start week.
fn weekdays_until(weekday: Weekday) -> Vec<&'static str> {
    let order = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];
    order
        .iter()
        .take(weekday.num_days_from_sunday() as usize + 1)
        .map(|day| weekday_name(*day))
        .collect()
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    pub async fn today_progress(&self) -> Result<TodayProgress> {
        let tasks = read_or_default(&self.store, StoreKey::Tasks).await?;
        let highlights: Vec<Highlight> =
            read_or_default(&self.store, StoreKey::Highlights).await?;
        Ok(today_progress(
            self.clock.today().weekday(),
            &tasks,
            &highlights,
        ))
    }

    pub async fn weekly_overview(&self) -> Result<WeeklyOverview> {
        let plan = read_or_default(&self.store, StoreKey::WeeklyPlan).await?;
        let highlights: Vec<Highlight> =
            read_or_default(&self.store, StoreKey::Highlights).await?;
        Ok(weekly_overview(&plan, &highlights))
    }

    /// Estimate derived from persisted focus hours, backfilled from today's and
    /// this week's completion counts when nothing was recorded.
    pub async fn focus_time_estimate(&self) -> Result<FocusTime> {
        let data = read_or_default(&self.store, StoreKey::FocusTime).await?;
        let today = self.today_progress().await?;
        let week = self.weekly_overview().await?;
        Ok(focus_time(&data, today.completed, week.completed))
    }

    pub async fn history_stats(&self) -> Result<HistoryStats> {
        let tasks = read_or_default(&self.store, StoreKey::Tasks).await?;
        let schedule: Vec<ScheduleEntry> =
            read_or_default(&self.store, StoreKey::Schedule).await?;
        let highlights: Vec<Highlight> =
            read_or_default(&self.store, StoreKey::Highlights).await?;
        Ok(history_stats(
            self.clock.today(),
            &tasks,
            &schedule,
            &highlights,
        ))
    }
}
