use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::info;

use crate::{
    store::{
        entities::{
            sample_tasks, Highlight, HighlightKind, PlanItem, ScheduleEntry, ShutdownLog,
            Task, TaskCollection, WeeklyPlan, WeeklyReview,
        },
        record_store::{read_or_default, write_json, RecordStore, StoreKey},
    },
    utils::{clock::Clock, time::day_key},
};

use super::Dashboard;

/// Section of the weekly review an entry goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSection {
    Achievement,
    Lesson,
    Improvement,
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    /// Stable id for newly created items: the creation timestamp in
    /// milliseconds. Unique enough within one bucket, which is the only scope
    /// ids are resolved in.
    fn next_id(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Adds a task to the recurring template, defaulting to today's weekday.
    pub async fn add_task(
        &self,
        weekday: Option<Weekday>,
        time: String,
        description: String,
        duration: String,
        project: String,
    ) -> Result<Task> {
        let weekday = weekday.unwrap_or_else(|| self.clock.today().weekday());
        let task = Task {
            id: self.next_id(),
            time,
            description,
            duration,
            project,
            completed: false,
            date: None,
        };

        let mut tasks: TaskCollection = read_or_default(&self.store, StoreKey::Tasks).await?;
        tasks.push(weekday, task.clone());
        write_json(&self.store, StoreKey::Tasks, &tasks).await?;
        info!("Added task {} under {weekday}", task.id);
        Ok(task)
    }

    /// Flips a task's completed flag. Returns false when the id is not in the
    /// weekday's bucket.
    pub async fn set_task_completed(
        &self,
        weekday: Weekday,
        id: i64,
        completed: bool,
    ) -> Result<bool> {
        let mut tasks: TaskCollection = read_or_default(&self.store, StoreKey::Tasks).await?;
        let Some(task) = tasks.find_mut(weekday, id) else {
            return Ok(false);
        };
        task.completed = completed;
        write_json(&self.store, StoreKey::Tasks, &tasks).await?;
        Ok(true)
    }

    /// Writes the starter template, but only over an empty collection.
    pub async fn seed_sample_tasks(&self) -> Result<bool> {
        let existing: TaskCollection = read_or_default(&self.store, StoreKey::Tasks).await?;
        if !existing.is_empty() {
            return Ok(false);
        }
        write_json(&self.store, StoreKey::Tasks, &sample_tasks()).await?;
        Ok(true)
    }

    /// Appends a highlight stamped with the current datetime.
    pub async fn add_highlight(&self, kind: HighlightKind, text: String) -> Result<Highlight> {
        let highlight = Highlight {
            id: self.next_id(),
            kind,
            text,
            date: self.clock.now().to_rfc3339(),
            completed: false,
        };
        let mut highlights: Vec<Highlight> =
            read_or_default(&self.store, StoreKey::Highlights).await?;
        highlights.push(highlight.clone());
        write_json(&self.store, StoreKey::Highlights, &highlights).await?;
        Ok(highlight)
    }

    pub async fn add_schedule_entry(
        &self,
        date: NaiveDate,
        time: String,
        description: String,
    ) -> Result<ScheduleEntry> {
        let entry = ScheduleEntry {
            id: self.next_id(),
            time,
            description,
            date: day_key(date),
            completed: false,
        };
        let mut schedule: Vec<ScheduleEntry> =
            read_or_default(&self.store, StoreKey::Schedule).await?;
        schedule.push(entry.clone());
        write_json(&self.store, StoreKey::Schedule, &schedule).await?;
        Ok(entry)
    }

    pub async fn plan_add(&self, text: String, goal: bool) -> Result<PlanItem> {
        let item = PlanItem {
            id: self.next_id(),
            text,
            completed: false,
        };
        let mut plan: WeeklyPlan = read_or_default(&self.store, StoreKey::WeeklyPlan).await?;
        if goal {
            plan.goals.push(item.clone());
        } else {
            plan.tasks.push(item.clone());
        }
        write_json(&self.store, StoreKey::WeeklyPlan, &plan).await?;
        Ok(item)
    }

    pub async fn plan_set_completed(&self, id: i64, completed: bool) -> Result<bool> {
        let mut plan: WeeklyPlan = read_or_default(&self.store, StoreKey::WeeklyPlan).await?;
        let Some(item) = plan
            .goals
            .iter_mut()
            .chain(plan.tasks.iter_mut())
            .find(|item| item.id == id)
        else {
            return Ok(false);
        };
        item.completed = completed;
        write_json(&self.store, StoreKey::WeeklyPlan, &plan).await?;
        Ok(true)
    }

    pub async fn weekly_plan(&self) -> Result<WeeklyPlan> {
        read_or_default(&self.store, StoreKey::WeeklyPlan).await
    }

    pub async fn review_add(&self, section: ReviewSection, text: String) -> Result<()> {
        let mut review: WeeklyReview =
            read_or_default(&self.store, StoreKey::WeeklyReview).await?;
        match section {
            ReviewSection::Achievement => review.achievements.push(text),
            ReviewSection::Lesson => review.lessons.push(text),
            ReviewSection::Improvement => review.improvements.push(text),
        }
        write_json(&self.store, StoreKey::WeeklyReview, &review).await
    }

    pub async fn review_rate(&self, rating: u8) -> Result<()> {
        let mut review: WeeklyReview =
            read_or_default(&self.store, StoreKey::WeeklyReview).await?;
        review.rating = Some(rating);
        write_json(&self.store, StoreKey::WeeklyReview, &review).await
    }

    pub async fn weekly_review(&self) -> Result<WeeklyReview> {
        read_or_default(&self.store, StoreKey::WeeklyReview).await
    }

    /// Marks the daily shutdown ritual done; its presence counts towards the
    /// day's qualifying activity.
    pub async fn complete_shutdown(&self, note: Option<String>) -> Result<ShutdownLog> {
        let log = ShutdownLog {
            date: self.clock.now().to_rfc3339(),
            note,
            completed: true,
        };
        write_json(&self.store, StoreKey::Shutdown, &log).await?;
        info!("Daily shutdown recorded");
        Ok(log)
    }

    /// Records real focus hours, replacing the completion-based estimate.
    pub async fn record_focus_hours(&self, today: f64, week: f64) -> Result<()> {
        write_json(
            &self.store,
            StoreKey::FocusTime,
            &crate::store::entities::FocusTimeData { today, week },
        )
        .await
    }

    /// Raw JSON for the reviewable ritual records, in the order the data view
    /// lists them.
    pub async fn saved_data(&self) -> Result<Vec<(&'static str, Option<String>)>> {
        let mut out = Vec::new();
        for key in [
            StoreKey::Highlights,
            StoreKey::WeeklyPlan,
            StoreKey::WeeklyReview,
            StoreKey::Shutdown,
        ] {
            out.push((key.as_str(), self.store.get_raw(key).await?));
        }
        Ok(out)
    }

    /// Bulk clear of the ritual records. Tasks, activity history and streak
    /// counters are deliberately left in place.
    pub async fn clear_all(&self) -> Result<()> {
        for key in [
            StoreKey::Highlights,
            StoreKey::WeeklyPlan,
            StoreKey::WeeklyReview,
            StoreKey::Shutdown,
            StoreKey::FocusTime,
        ] {
            self.store.remove(key).await?;
        }
        info!("Cleared saved ritual data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Local, NaiveDate, TimeZone, Weekday};
    use tempfile::tempdir;

    use crate::{
        engine::{aggregate::Category, streak::StreakAdvance, Dashboard},
        store::{
            entities::HighlightKind,
            record_store::{JsonFileStore, RecordStore, StoreKey},
        },
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    use super::ReviewSection;

    fn fixed_clock(year: i32, month: u32, day: u32) -> MockClock {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let moment = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .unwrap();
        let mut clock = MockClock::new();
        clock.expect_today().return_const(date);
        clock.expect_now().return_const(moment);
        clock
    }

    fn dashboard(dir: &std::path::Path, clock: MockClock) -> Dashboard<JsonFileStore, MockClock> {
        Dashboard::new(JsonFileStore::new(dir.to_owned()).unwrap(), clock)
    }

    #[tokio::test]
    async fn add_complete_and_remove_a_task() -> Result<()> {
        let dir = tempdir()?;
        // 2024-01-01 is a monday
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 1));

        let task = dash
            .add_task(None, "9:00 AM".into(), "write report".into(), "1h".into(), "Work".into())
            .await?;

        assert!(dash.set_task_completed(Weekday::Mon, task.id, true).await?);
        let progress = dash.today_progress().await?;
        assert_eq!(progress.total, 1);
        assert_eq!(progress.completed, 1);

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(dash.remove_item(Category::Tasks, date, task.id).await?);
        // second removal is a silent no-op
        assert!(!dash.remove_item(Category::Tasks, date, task.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn highlights_feed_timeline_and_removal_by_id() -> Result<()> {
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 5));

        let highlight = dash
            .add_highlight(HighlightKind::Win, "closed the deal".into())
            .await?;
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        let items = dash.items_for_date(date).await?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, highlight.id);
        assert_eq!(items[0].category, Category::Highlights);

        assert!(dash.remove_item(Category::Highlights, date, highlight.id).await?);
        assert!(dash.items_for_date(date).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn schedule_entries_land_in_month_buckets() -> Result<()> {
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 5));
        let date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();

        dash.add_schedule_entry(date, "1:00 PM".into(), "dentist".into())
            .await?;

        let buckets = dash.bucket_by_month(2024, 0).await?;
        assert!(buckets[&date].iter().any(|item| item.category == Category::Schedule));
        Ok(())
    }

    #[tokio::test]
    async fn streak_updates_once_per_day_through_the_store() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 1));

        dash.add_highlight(HighlightKind::Note, "first note".into())
            .await?;

        assert_eq!(dash.update_daily_streak().await?, StreakAdvance::Recorded);
        assert_eq!(dash.update_daily_streak().await?, StreakAdvance::Refreshed);
        assert_eq!(dash.current_streak().await?, 1);
        assert_eq!(dash.best_streak().await?, 1);
        assert_eq!(dash.total_active_days().await?, 1);
        // started today: consistency is defined as zero
        assert_eq!(dash.streak_percentage().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn stale_streak_is_displayed_as_zero_later() -> Result<()> {
        let dir = tempdir()?;

        {
            let dash = dashboard(dir.path(), fixed_clock(2024, 1, 1));
            dash.add_highlight(HighlightKind::Note, "note".into()).await?;
            dash.update_daily_streak().await?;
            assert_eq!(dash.current_streak().await?, 1);
        }

        // a week later, same store: the persisted counter is masked
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 8));
        assert_eq!(dash.current_streak().await?, 0);
        assert_eq!(dash.best_streak().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn plan_review_and_shutdown_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 3));

        let goal = dash.plan_add("ship the feature".into(), true).await?;
        dash.plan_add("tidy backlog".into(), false).await?;
        assert!(dash.plan_set_completed(goal.id, true).await?);
        assert!(!dash.plan_set_completed(123, true).await?);

        let plan = dash.weekly_plan().await?;
        assert_eq!(plan.total(), 2);
        assert_eq!(plan.completed(), 1);

        dash.review_add(ReviewSection::Achievement, "launched".into())
            .await?;
        dash.review_rate(4).await?;
        let review = dash.weekly_review().await?;
        assert_eq!(review.achievements, vec!["launched".to_string()]);
        assert_eq!(review.rating, Some(4));

        let shutdown = dash.complete_shutdown(Some("good day".into())).await?;
        assert!(shutdown.completed);
        Ok(())
    }

    #[tokio::test]
    async fn clear_all_spares_tasks_and_streaks() -> Result<()> {
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 1));

        dash.seed_sample_tasks().await?;
        dash.add_highlight(HighlightKind::Win, "win".into()).await?;
        dash.update_daily_streak().await?;
        dash.clear_all().await?;

        assert!(dash.store().get_raw(StoreKey::Highlights).await?.is_none());
        assert!(dash.store().get_raw(StoreKey::Tasks).await?.is_some());
        assert!(dash.store().get_raw(StoreKey::Streaks).await?.is_some());

        let saved = dash.saved_data().await?;
        assert!(saved.iter().all(|(_, value)| value.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn seeding_never_overwrites_user_tasks() -> Result<()> {
        let dir = tempdir()?;
        let dash = dashboard(dir.path(), fixed_clock(2024, 1, 1));

        assert!(dash.seed_sample_tasks().await?);
        assert!(!dash.seed_sample_tasks().await?);

        dash.add_task(Some(Weekday::Fri), "".into(), "custom".into(), "".into(), "".into())
            .await?;
        assert!(!dash.seed_sample_tasks().await?);
        Ok(())
    }
}
