use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

use crate::{
    store::{
        entities::{Highlight, ScheduleEntry, Task, TaskCollection},
        record_store::{read_or_default, RecordStore, StoreKey},
    },
    utils::{clock::Clock, time::clock_minutes},
};

use super::Dashboard;

/// Source category of an aggregated item. Order matters: buckets list
/// categories in this order, with time-of-day ordering applied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Tasks,
    Schedule,
    Highlights,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Tasks => "Tasks",
            Category::Schedule => "Schedule",
            Category::Highlights => "Highlights",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Category::Tasks => "📋",
            Category::Schedule => "📅",
            Category::Highlights => "🌟",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tasks" | "task" => Ok(Category::Tasks),
            "schedule" => Ok(Category::Schedule),
            "highlights" | "highlight" => Ok(Category::Highlights),
            other => Err(anyhow!("Unknown category {other}")),
        }
    }
}

/// One activity attributed to a calendar date, whatever collection it came
/// from. Weekday-template tasks get the concrete date attached during
/// expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub category: Category,
    pub id: i64,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub text: String,
    pub completed: bool,
}

fn task_item(task: &Task, date: NaiveDate) -> ActivityItem {
    ActivityItem {
        category: Category::Tasks,
        id: task.id,
        date,
        time: (!task.time.is_empty()).then(|| task.time.clone()),
        text: task.description.clone(),
        completed: task.completed,
    }
}

fn schedule_item(entry: &ScheduleEntry, date: NaiveDate) -> ActivityItem {
    ActivityItem {
        category: Category::Schedule,
        id: entry.id,
        date,
        time: (!entry.time.is_empty()).then(|| entry.time.clone()),
        text: entry.description.clone(),
        completed: entry.completed,
    }
}

fn highlight_item(highlight: &Highlight, date: NaiveDate) -> ActivityItem {
    ActivityItem {
        category: Category::Highlights,
        id: highlight.id,
        date,
        time: None,
        text: highlight.text.clone(),
        completed: highlight.completed,
    }
}

/// Normalizes a zero-based month index into `[0, 11]` with year rollover, so
/// month navigation can keep adding ±1 without bounds checks.
pub fn normalize_month(year: i32, month0: i32) -> (i32, u32) {
    (year + month0.div_euclid(12), month0.rem_euclid(12) as u32)
}

pub fn days_in_month(year: i32, month0: u32) -> u32 {
    let (next_year, next_month0) = normalize_month(year, month0 as i32 + 1);
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month0 + 1, 1)
        .expect("normalized month is always valid");
    first_of_next
        .pred_opt()
        .expect("month start has a predecessor")
        .day()
}

/// Buckets every activity source by calendar date for one month. The result
/// holds one key per day of the month (possibly with an empty list), so the
/// calendar projector can iterate it directly. Weekday tasks are template
/// expansions: the same task appears on every matching weekday. Date-stamped
/// records are filtered by exact calendar date; anything outside the month is
/// dropped.
pub fn expand_month(
    year: i32,
    month0: i32,
    tasks: &TaskCollection,
    schedule: &[ScheduleEntry],
    highlights: &[Highlight],
) -> BTreeMap<NaiveDate, Vec<ActivityItem>> {
    let (year, month0) = normalize_month(year, month0);
    let mut buckets = BTreeMap::new();

    for day in 1..=days_in_month(year, month0) {
        let date = NaiveDate::from_ymd_opt(year, month0 + 1, day)
            .expect("day is within the month");
        let items: Vec<ActivityItem> = tasks
            .for_weekday(date.weekday())
            .iter()
            .map(|task| task_item(task, date))
            .collect();
        buckets.insert(date, items);
    }

    for entry in schedule {
        if let Some(date) = entry.day() {
            if let Some(bucket) = buckets.get_mut(&date) {
                bucket.push(schedule_item(entry, date));
            }
        }
    }

    for highlight in highlights {
        if let Some(date) = highlight.day() {
            if let Some(bucket) = buckets.get_mut(&date) {
                bucket.push(highlight_item(highlight, date));
            }
        }
    }

    buckets
}

/// Resolves every category for a single date, ordered by time-of-day where a
/// time is present.
pub fn collect_for_date(
    date: NaiveDate,
    tasks: &TaskCollection,
    schedule: &[ScheduleEntry],
    highlights: &[Highlight],
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = tasks
        .for_weekday(date.weekday())
        .iter()
        .map(|task| task_item(task, date))
        .collect();
    items.extend(
        schedule
            .iter()
            .filter(|entry| entry.day() == Some(date))
            .map(|entry| schedule_item(entry, date)),
    );
    items.extend(
        highlights
            .iter()
            .filter(|highlight| highlight.day() == Some(date))
            .map(|highlight| highlight_item(highlight, date)),
    );
    sort_by_time(&mut items);
    items
}

/// Orders timed items by parsed minute-of-day while every untimed item keeps
/// its insertion position: only the timed subsequence is sorted (stably), then
/// written back into the slots it came from.
fn sort_by_time(items: &mut [ActivityItem]) {
    let positions: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item_minutes(item).is_some())
        .map(|(position, _)| position)
        .collect();
    let mut timed: Vec<ActivityItem> = positions
        .iter()
        .map(|&position| items[position].clone())
        .collect();
    timed.sort_by_key(item_minutes);
    for (position, item) in positions.into_iter().zip(timed) {
        items[position] = item;
    }
}

fn item_minutes(item: &ActivityItem) -> Option<u32> {
    item.time.as_deref().and_then(clock_minutes)
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    async fn load_sources(&self) -> Result<(TaskCollection, Vec<ScheduleEntry>, Vec<Highlight>)> {
        let tasks = read_or_default(&self.store, StoreKey::Tasks).await?;
        let schedule = read_or_default(&self.store, StoreKey::Schedule).await?;
        let highlights = read_or_default(&self.store, StoreKey::Highlights).await?;
        Ok((tasks, schedule, highlights))
    }

    /// All activity for one month, keyed by ISO calendar date. `month0` is
    /// zero-based and may lie outside `[0, 11]`; the year rolls over.
    pub async fn bucket_by_month(
        &self,
        year: i32,
        month0: i32,
    ) -> Result<BTreeMap<NaiveDate, Vec<ActivityItem>>> {
        let (tasks, schedule, highlights) = self.load_sources().await?;
        Ok(expand_month(year, month0, &tasks, &schedule, &highlights))
    }

    /// The ordered timeline for a single date.
    pub async fn items_for_date(&self, date: NaiveDate) -> Result<Vec<ActivityItem>> {
        let (tasks, schedule, highlights) = self.load_sources().await?;
        Ok(collect_for_date(date, &tasks, &schedule, &highlights))
    }
}
