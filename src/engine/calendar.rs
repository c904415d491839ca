use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::{
    store::{
        entities::{Highlight, ScheduleEntry, TaskCollection},
        record_store::{read_or_default, write_json, RecordStore, StoreKey},
    },
    utils::clock::Clock,
};

use super::{
    aggregate::{normalize_month, ActivityItem, Category},
    Dashboard,
};

/// The one visual state a day cell renders with. When several apply, the
/// highest-priority wins: selected > today > active > plain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Selected,
    Today,
    Active,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    pub has_activity: bool,
    pub state: DayState,
}

/// A month laid out for a sunday-start grid: blank cells up to the first
/// weekday, then one cell per day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month0: u32,
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
}

impl MonthGrid {
    pub fn month_name(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        NAMES[self.month0 as usize]
    }
}

/// Projects one month's buckets into a renderable grid. `month0` may lie
/// outside `[0, 11]`; the buckets passed in are expected to come from
/// [super::aggregate::expand_month] for the same month.
pub fn project_month(
    year: i32,
    month0: i32,
    buckets: &BTreeMap<NaiveDate, Vec<ActivityItem>>,
    today: NaiveDate,
    selected: Option<NaiveDate>,
) -> MonthGrid {
    let (year, month0) = normalize_month(year, month0);
    let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .expect("normalized month is always valid");
    let leading_blanks = first.weekday().num_days_from_sunday();

    let days = buckets
        .iter()
        .map(|(date, items)| {
            let has_activity = !items.is_empty();
            let state = if selected == Some(*date) {
                DayState::Selected
            } else if *date == today {
                DayState::Today
            } else if has_activity {
                DayState::Active
            } else {
                DayState::Plain
            };
            DayCell {
                day: date.day(),
                date: *date,
                has_activity,
                state,
            }
        })
        .collect();

    MonthGrid {
        year,
        month0,
        leading_blanks,
        days,
    }
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    /// Month grid for presentation; `selected` usually mirrors the timeline's
    /// focused date.
    pub async fn project_month(
        &self,
        year: i32,
        month0: i32,
        selected: Option<NaiveDate>,
    ) -> Result<MonthGrid> {
        let buckets = self.bucket_by_month(year, month0).await?;
        Ok(project_month(
            year,
            month0,
            &buckets,
            self.clock.today(),
            selected,
        ))
    }

    /// Removes one aggregated item from its source collection. Identity is the
    /// stable item id, scoped by the weekday for template tasks. An unknown id
    /// is a silent no-op returning false.
    pub async fn remove_item(
        &self,
        category: Category,
        date: NaiveDate,
        id: i64,
    ) -> Result<bool> {
        debug!("Removing {category:?} item {id} for {date}");
        match category {
            Category::Tasks => {
                let mut tasks: TaskCollection =
                    read_or_default(&self.store, StoreKey::Tasks).await?;
                if tasks.remove(date.weekday(), id).is_none() {
                    return Ok(false);
                }
                write_json(&self.store, StoreKey::Tasks, &tasks).await?;
                Ok(true)
            }
            Category::Schedule => {
                let mut schedule: Vec<ScheduleEntry> =
                    read_or_default(&self.store, StoreKey::Schedule).await?;
                let Some(position) = schedule.iter().position(|entry| entry.id == id) else {
                    return Ok(false);
                };
                schedule.remove(position);
                write_json(&self.store, StoreKey::Schedule, &schedule).await?;
                Ok(true)
            }
            Category::Highlights => {
                let mut highlights: Vec<Highlight> =
                    read_or_default(&self.store, StoreKey::Highlights).await?;
                let Some(position) = highlights.iter().position(|h| h.id == id) else {
                    return Ok(false);
                };
                highlights.remove(position);
                write_json(&self.store, StoreKey::Highlights, &highlights).await?;
                Ok(true)
            }
        }
    }
}
