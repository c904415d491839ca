use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::utils::time::{parse_day_key, weekday_name};

/// A single entry of the recurring task template. Tasks live under a weekday
/// name, not a calendar date: the same task resurfaces every week until it is
/// completed or removed. `date` is only filled in when a task gets pinned to a
/// concrete day during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Weekday name → ordered task list. Task ids are only unique within one
/// weekday bucket, so lookups always go through a weekday first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection(pub BTreeMap<String, Vec<Task>>);

impl TaskCollection {
    pub fn for_weekday(&self, weekday: Weekday) -> &[Task] {
        self.0
            .get(weekday_name(weekday))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn push(&mut self, weekday: Weekday, task: Task) {
        self.0
            .entry(weekday_name(weekday).to_string())
            .or_default()
            .push(task);
    }

    /// Removes a task by its id within one weekday bucket. Returns the removed
    /// task, or None when the id is unknown there.
    pub fn remove(&mut self, weekday: Weekday, id: i64) -> Option<Task> {
        let bucket = self.0.get_mut(weekday_name(weekday))?;
        let position = bucket.iter().position(|task| task.id == id)?;
        Some(bucket.remove(position))
    }

    pub fn find_mut(&mut self, weekday: Weekday, id: i64) -> Option<&mut Task> {
        self.0
            .get_mut(weekday_name(weekday))?
            .iter_mut()
            .find(|task| task.id == id)
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &Task> {
        self.0.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Win,
    Insight,
    #[default]
    Note,
    Gratitude,
}

impl HighlightKind {
    pub fn icon(&self) -> &'static str {
        match self {
            HighlightKind::Win => "🏆",
            HighlightKind::Insight => "💡",
            HighlightKind::Note => "📝",
            HighlightKind::Gratitude => "🙏",
        }
    }
}

/// Append-only daily highlight. Entries written by older versions carry no
/// id; they deserialize with `id = 0` and are simply never matched by id-based
/// removal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: HighlightKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub completed: bool,
}

impl Highlight {
    pub fn day(&self) -> Option<NaiveDate> {
        calendar_day(&self.date)
    }
}

/// Date-stamped schedule item, one concrete occurrence rather than a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub completed: bool,
}

impl ScheduleEntry {
    pub fn day(&self) -> Option<NaiveDate> {
        calendar_day(&self.date)
    }
}

/// Normalizes a stored date stamp (ISO datetime or bare calendar date) to the
/// calendar date, dropping time-of-day.
pub fn calendar_day(stamp: &str) -> Option<NaiveDate> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(stamp) {
        return Some(datetime.date_naive());
    }
    parse_day_key(stamp.get(..10)?)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub goals: Vec<PlanItem>,
    #[serde(default)]
    pub tasks: Vec<PlanItem>,
}

impl WeeklyPlan {
    pub fn total(&self) -> usize {
        self.goals.len() + self.tasks.len()
    }

    pub fn completed(&self) -> usize {
        self.goals.iter().filter(|item| item.completed).count()
            + self.tasks.iter().filter(|item| item.completed).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReview {
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShutdownLog {
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// One day's qualifying-activity summary, keyed in [ActivityLog] by the ISO
/// calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub tasks: u32,
    #[serde(default)]
    pub highlights: u32,
    #[serde(default)]
    pub shutdown: u8,
}

pub type ActivityLog = BTreeMap<String, DailyActivityRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    #[serde(rename = "currentStreak", default)]
    pub current_streak: u32,
    #[serde(rename = "bestStreak", default)]
    pub best_streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusTimeData {
    #[serde(default)]
    pub today: f64,
    #[serde(default)]
    pub week: f64,
}

/// The starter template shipped for a first run. Only written when the user
/// asks for a seed and no collection exists yet.
pub fn sample_tasks() -> TaskCollection {
    fn task(id: i64, time: &str, description: &str, duration: &str, project: &str) -> Task {
        Task {
            id,
            time: time.into(),
            description: description.into(),
            duration: duration.into(),
            project: project.into(),
            completed: false,
            date: None,
        }
    }

    let mut collection = TaskCollection::default();
    for entry in [
        task(1, "9:00 AM", "Review Q1 goals and set OKRs for Q2 #planning", "1h", "Product"),
        task(2, "10:00 AM", "Team standup and project sync #product", "30m", "Product"),
        task(3, "2:00 PM", "User research analysis and insights documentation #product", "2h", "Product"),
    ] {
        collection.push(Weekday::Mon, entry);
    }
    for entry in [
        task(4, "9:00 AM", "Competitive analysis and market research #growth", "2h", "Growth"),
        task(5, "11:00 AM", "Growth strategy brainstorming session #growth", "1.5h", "Growth"),
        task(6, "3:00 PM", "Review and optimize conversion funnel #growth", "1h", "Growth"),
    ] {
        collection.push(Weekday::Tue, entry);
    }
    for entry in [
        task(7, "9:00 AM", "Product roadmap planning and prioritization #product", "2h", "Product"),
        task(8, "11:00 AM", "Stakeholder meeting for feature approvals #product", "1h", "Product"),
        task(9, "2:00 PM", "Design system review and updates #product", "1.5h", "Product"),
        task(10, "4:00 PM", "Weekly team retrospective and planning #planning", "1h", "Planning"),
    ] {
        collection.push(Weekday::Wed, entry);
    }
    collection
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::{
        calendar_day, sample_tasks, Highlight, HighlightKind, StreakState, TaskCollection,
    };

    #[test]
    fn task_collection_round_trip_is_lossless() {
        let collection = sample_tasks();
        let encoded = serde_json::to_string(&collection).unwrap();
        let decoded: TaskCollection = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, collection);
        // field order within a bucket survives
        let monday = decoded.for_weekday(Weekday::Mon);
        assert_eq!(monday.len(), 3);
        assert_eq!(monday[0].id, 1);
        assert_eq!(monday[2].time, "2:00 PM");
    }

    #[test]
    fn legacy_highlight_without_id_gets_zero() {
        let raw = r#"{"type":"win","text":"shipped it","date":"2024-03-05T10:30:00Z","completed":true}"#;
        let highlight: Highlight = serde_json::from_str(raw).unwrap();
        assert_eq!(highlight.id, 0);
        assert_eq!(highlight.kind, HighlightKind::Win);
        assert_eq!(highlight.day(), NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn streak_state_uses_camel_case_keys() {
        let state = StreakState {
            current_streak: 3,
            best_streak: 9,
        };
        let encoded = serde_json::to_string(&state).unwrap();
        assert_eq!(encoded, r#"{"currentStreak":3,"bestStreak":9}"#);
    }

    #[test]
    fn calendar_day_drops_time_of_day() {
        assert_eq!(
            calendar_day("2024-03-05T23:59:00+00:00"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(
            calendar_day("2024-03-05"),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(calendar_day("not a date"), None);
    }

    #[test]
    fn weekday_lookup_misses_return_empty() {
        let collection = sample_tasks();
        assert!(collection.for_weekday(Weekday::Sun).is_empty());
        assert!(!collection.is_empty());
    }
}
