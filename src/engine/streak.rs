use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate};
use tracing::{debug, info};

use crate::{
    store::{
        entities::{
            ActivityLog, DailyActivityRecord, Highlight, ShutdownLog, StreakState,
            TaskCollection,
        },
        record_store::{read_or_default, write_json, RecordStore, StoreKey},
    },
    utils::{
        clock::Clock,
        time::{day_key, parse_day_key, parse_legacy_day_key},
    },
};

use super::Dashboard;

/// Outcome of one daily streak evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakAdvance {
    /// Today qualified for the first time; counters moved.
    Recorded,
    /// Today was already on record; only the activity counts were refreshed.
    Refreshed,
    /// Nothing qualified today; no state was touched.
    NoActivity,
}

/// Rewrites any legacy locale-format keys ("Mon Jan 01 2024") into the ISO
/// form everything else uses. Unparseable keys are dropped.
pub fn normalize_log(log: ActivityLog) -> ActivityLog {
    log.into_iter()
        .filter_map(|(key, mut record)| {
            let date = parse_day_key(&key).or_else(|| parse_legacy_day_key(&key))?;
            let key = day_key(date);
            record.date = key.clone();
            Some((key, record))
        })
        .collect()
}

/// Today's qualifying-activity summary: today's weekday task bucket, the
/// highlight list, and the shutdown presence flag.
pub fn qualifying_activity(
    today: NaiveDate,
    tasks: &TaskCollection,
    highlights: &[Highlight],
    shutdown: &ShutdownLog,
) -> DailyActivityRecord {
    let task_count = tasks.for_weekday(today.weekday()).len() as u32;
    let highlight_count = highlights.len() as u32;
    let shutdown_flag = u8::from(shutdown.completed || !shutdown.date.is_empty());

    DailyActivityRecord {
        date: day_key(today),
        count: task_count + highlight_count + u32::from(shutdown_flag),
        tasks: task_count,
        highlights: highlight_count,
        shutdown: shutdown_flag,
    }
}

fn has_activity(log: &ActivityLog, date: NaiveDate) -> bool {
    log.get(&day_key(date)).is_some_and(|record| record.count > 0)
}

/// The streak transition rule. A day with no qualifying activity mutates
/// nothing — its absence is only noticed when a later day checks "yesterday".
/// A day already on record only refreshes its counts, which is what makes
/// repeated evaluation within one day idempotent.
pub fn advance_streak(
    log: &mut ActivityLog,
    streaks: &mut StreakState,
    today: NaiveDate,
    activity: DailyActivityRecord,
) -> StreakAdvance {
    if activity.count == 0 {
        return StreakAdvance::NoActivity;
    }

    let key = day_key(today);
    if log.get(&key).is_some_and(|record| record.count > 0) {
        log.insert(key, activity);
        return StreakAdvance::Refreshed;
    }

    let continued = today
        .pred_opt()
        .is_some_and(|yesterday| has_activity(log, yesterday));
    log.insert(key, activity);

    streaks.current_streak = if continued {
        streaks.current_streak + 1
    } else {
        1
    };
    streaks.best_streak = streaks.best_streak.max(streaks.current_streak);

    StreakAdvance::Recorded
}

/// Display-time correction over the persisted counter: a streak only shows if
/// today or yesterday qualifies, whatever stale value is stored.
pub fn displayed_streak(streaks: &StreakState, log: &ActivityLog, today: NaiveDate) -> u32 {
    let qualifies = has_activity(log, today)
        || today
            .pred_opt()
            .is_some_and(|yesterday| has_activity(log, yesterday));
    if qualifies {
        streaks.current_streak
    } else {
        0
    }
}

/// Longest run of inactive days between two recorded dates: gap minus one over
/// consecutive sorted pairs. Fewer than two dated entries means no break.
pub fn longest_break(log: &ActivityLog) -> i64 {
    let dates: Vec<NaiveDate> = log.keys().filter_map(|key| parse_day_key(key)).collect();
    dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days() - 1)
        .max()
        .unwrap_or(0)
        .max(0)
}

/// Share of days since the streak started that had activity, rounded.
pub fn streak_percentage(active_days: usize, days_since_start: i64) -> u32 {
    if days_since_start <= 0 {
        return 0;
    }
    (active_days as f64 / days_since_start as f64 * 100.).round() as u32
}

impl<S: RecordStore, C: Clock> Dashboard<S, C> {
    /// Evaluates the streak transition rule once for today and persists the
    /// result. Safe to call any number of times per day.
    pub async fn update_daily_streak(&self) -> Result<StreakAdvance> {
        let today = self.clock.today();
        let tasks = read_or_default(&self.store, StoreKey::Tasks).await?;
        let highlights: Vec<Highlight> =
            read_or_default(&self.store, StoreKey::Highlights).await?;
        let shutdown = read_or_default(&self.store, StoreKey::Shutdown).await?;

        let activity = qualifying_activity(today, &tasks, &highlights, &shutdown);
        debug!("Today's qualifying activity: {activity:?}");

        let mut log = normalize_log(read_or_default(&self.store, StoreKey::Activities).await?);
        let mut streaks: StreakState = read_or_default(&self.store, StoreKey::Streaks).await?;

        let advance = advance_streak(&mut log, &mut streaks, today, activity);

        if advance == StreakAdvance::Recorded {
            info!(
                "Streak advanced to {} (best {})",
                streaks.current_streak, streaks.best_streak
            );
            let start: String = read_or_default(&self.store, StoreKey::StreakStart).await?;
            if start.is_empty() {
                write_json(&self.store, StoreKey::StreakStart, &self.clock.now().to_rfc3339())
                    .await?;
            }
        }

        write_json(&self.store, StoreKey::Activities, &log).await?;
        write_json(&self.store, StoreKey::Streaks, &streaks).await?;
        Ok(advance)
    }

    pub async fn current_streak(&self) -> Result<u32> {
        let streaks: StreakState = read_or_default(&self.store, StoreKey::Streaks).await?;
        let log = normalize_log(read_or_default(&self.store, StoreKey::Activities).await?);
        Ok(displayed_streak(&streaks, &log, self.clock.today()))
    }

    pub async fn best_streak(&self) -> Result<u32> {
        let streaks: StreakState = read_or_default(&self.store, StoreKey::Streaks).await?;
        Ok(streaks.best_streak)
    }

    pub async fn total_active_days(&self) -> Result<usize> {
        let log: ActivityLog = read_or_default(&self.store, StoreKey::Activities).await?;
        Ok(normalize_log(log).len())
    }

    /// Active days over days since the persisted streak start; 0 when the
    /// streak started today or was never started.
    pub async fn streak_percentage(&self) -> Result<u32> {
        let active = self.total_active_days().await?;
        let start: String = read_or_default(&self.store, StoreKey::StreakStart).await?;
        let Ok(start) = DateTime::parse_from_rfc3339(&start) else {
            return Ok(0);
        };
        let days = (self.clock.now().to_utc() - start.to_utc()).num_days();
        Ok(streak_percentage(active, days))
    }

    pub async fn longest_break(&self) -> Result<i64> {
        let log = normalize_log(read_or_default(&self.store, StoreKey::Activities).await?);
        Ok(longest_break(&log))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::store::entities::{
        ActivityLog, DailyActivityRecord, ShutdownLog, StreakState, TaskCollection,
    };
    use crate::utils::time::day_key;

    use super::{
        advance_streak, displayed_streak, longest_break, normalize_log, qualifying_activity,
        streak_percentage, StreakAdvance,
    };

    fn record(date: NaiveDate, count: u32) -> DailyActivityRecord {
        DailyActivityRecord {
            date: day_key(date),
            count,
            tasks: count,
            highlights: 0,
            shutdown: 0,
        }
    }

    fn log_with(days: &[(NaiveDate, u32)]) -> ActivityLog {
        days.iter()
            .map(|(date, count)| (day_key(*date), record(*date, *count)))
            .collect()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn first_active_day_starts_a_streak() {
        let mut log = ActivityLog::new();
        let mut streaks = StreakState::default();
        let today = date(2024, 1, 10);

        let advance = advance_streak(&mut log, &mut streaks, today, record(today, 3));
        assert_eq!(advance, StreakAdvance::Recorded);
        assert_eq!(streaks.current_streak, 1);
        assert_eq!(streaks.best_streak, 1);
    }

    #[test]
    fn consecutive_days_extend_and_gaps_restart() {
        let today = date(2024, 1, 10);
        let mut log = log_with(&[(date(2024, 1, 9), 2)]);
        let mut streaks = StreakState { current_streak: 4, best_streak: 6 };

        advance_streak(&mut log, &mut streaks, today, record(today, 1));
        assert_eq!(streaks.current_streak, 5);
        assert_eq!(streaks.best_streak, 6);

        // two days later: yesterday is missing, streak restarts at 1
        let later = date(2024, 1, 12);
        advance_streak(&mut log, &mut streaks, later, record(later, 1));
        assert_eq!(streaks.current_streak, 1);
        assert_eq!(streaks.best_streak, 6);
    }

    #[test]
    fn best_streak_never_decreases() {
        let today = date(2024, 1, 10);
        let mut log = log_with(&[(date(2024, 1, 9), 2)]);
        let mut streaks = StreakState { current_streak: 6, best_streak: 6 };

        advance_streak(&mut log, &mut streaks, today, record(today, 1));
        assert_eq!(streaks.best_streak, 7);
    }

    #[test]
    fn second_update_on_one_day_is_idempotent() {
        let today = date(2024, 1, 10);
        let mut log = log_with(&[(date(2024, 1, 9), 2)]);
        let mut streaks = StreakState { current_streak: 1, best_streak: 1 };

        assert_eq!(
            advance_streak(&mut log, &mut streaks, today, record(today, 3)),
            StreakAdvance::Recorded
        );
        assert_eq!(streaks.current_streak, 2);

        // counts refresh, counters hold
        assert_eq!(
            advance_streak(&mut log, &mut streaks, today, record(today, 5)),
            StreakAdvance::Refreshed
        );
        assert_eq!(streaks.current_streak, 2);
        assert_eq!(log[&day_key(today)].count, 5);
    }

    #[test]
    fn empty_day_mutates_nothing() {
        let mut log = ActivityLog::new();
        let mut streaks = StreakState { current_streak: 3, best_streak: 3 };
        let advance = advance_streak(
            &mut log,
            &mut streaks,
            date(2024, 1, 10),
            record(date(2024, 1, 10), 0),
        );
        assert_eq!(advance, StreakAdvance::NoActivity);
        assert!(log.is_empty());
        assert_eq!(streaks.current_streak, 3);
    }

    #[test]
    fn stale_counter_is_masked_without_recent_activity() {
        let streaks = StreakState { current_streak: 9, best_streak: 9 };
        let log = log_with(&[(date(2024, 1, 1), 4)]);

        // no record for today or yesterday: masked to zero
        assert_eq!(displayed_streak(&streaks, &log, date(2024, 1, 10)), 0);
        // yesterday qualifies: stored value shows
        assert_eq!(displayed_streak(&streaks, &log, date(2024, 1, 2)), 9);
        // today qualifies
        assert_eq!(displayed_streak(&streaks, &log, date(2024, 1, 1)), 9);
    }

    #[test]
    fn zero_count_records_do_not_qualify_for_display() {
        let streaks = StreakState { current_streak: 9, best_streak: 9 };
        let log = log_with(&[(date(2024, 1, 9), 0), (date(2024, 1, 10), 0)]);
        assert_eq!(displayed_streak(&streaks, &log, date(2024, 1, 10)), 0);
    }

    #[test]
    fn longest_break_is_gap_minus_one() {
        let log = log_with(&[
            (date(2024, 1, 1), 1),
            (date(2024, 1, 2), 1),
            (date(2024, 1, 10), 1),
        ]);
        assert_eq!(longest_break(&log), 7);

        assert_eq!(longest_break(&log_with(&[(date(2024, 1, 1), 1)])), 0);
        assert_eq!(longest_break(&ActivityLog::new()), 0);
    }

    #[test]
    fn adjacent_days_have_no_break() {
        let log = log_with(&[(date(2024, 1, 1), 1), (date(2024, 1, 2), 1)]);
        assert_eq!(longest_break(&log), 0);
    }

    #[test]
    fn legacy_locale_keys_migrate_to_iso() {
        let mut log = ActivityLog::new();
        log.insert(
            "Mon Jan 01 2024".into(),
            DailyActivityRecord {
                date: "Mon Jan 01 2024".into(),
                count: 2,
                tasks: 2,
                highlights: 0,
                shutdown: 0,
            },
        );
        log.insert("garbage".into(), DailyActivityRecord::default());

        let normalized = normalize_log(log);
        assert_eq!(normalized.len(), 1);
        let migrated = &normalized["2024-01-01"];
        assert_eq!(migrated.date, "2024-01-01");
        assert_eq!(migrated.count, 2);
    }

    #[test]
    fn streak_percentage_handles_day_zero() {
        assert_eq!(streak_percentage(5, 0), 0);
        assert_eq!(streak_percentage(5, 10), 50);
        assert_eq!(streak_percentage(2, 3), 67);
    }

    #[test]
    fn shutdown_presence_counts_as_activity() {
        let shutdown = ShutdownLog {
            date: "2024-01-10T22:00:00+00:00".into(),
            note: None,
            completed: true,
        };
        let activity = qualifying_activity(
            date(2024, 1, 10),
            &TaskCollection::default(),
            &[],
            &shutdown,
        );
        assert_eq!(activity.count, 1);
        assert_eq!(activity.shutdown, 1);

        let none = qualifying_activity(
            date(2024, 1, 10),
            &TaskCollection::default(),
            &[],
            &ShutdownLog::default(),
        );
        assert_eq!(none.count, 0);
    }
}
