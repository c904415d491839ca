use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::PathBuf,
};

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// Every key the dashboard persists under. Keeping them in one enum means no
/// call site ever spells a storage key by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Tasks,
    Highlights,
    Schedule,
    WeeklyPlan,
    WeeklyReview,
    Shutdown,
    Activities,
    Streaks,
    StreakStart,
    FocusTime,
}

impl StoreKey {
    pub const ALL: [StoreKey; 10] = [
        StoreKey::Tasks,
        StoreKey::Highlights,
        StoreKey::Schedule,
        StoreKey::WeeklyPlan,
        StoreKey::WeeklyReview,
        StoreKey::Shutdown,
        StoreKey::Activities,
        StoreKey::Streaks,
        StoreKey::StreakStart,
        StoreKey::FocusTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Tasks => "productivityTasks",
            StoreKey::Highlights => "daily-highlights",
            StoreKey::Schedule => "daily-schedule",
            StoreKey::WeeklyPlan => "weekly-plan",
            StoreKey::WeeklyReview => "weekly-review",
            StoreKey::Shutdown => "daily-shutdown",
            StoreKey::Activities => "daily-activities",
            StoreKey::Streaks => "streaks",
            StoreKey::StreakStart => "streak-start-date",
            StoreKey::FocusTime => "focus-time-data",
        }
    }
}

/// Interface for abstracting the persisted key-value record store. Values are
/// JSON-encoded strings; interpretation belongs to [read_or_default] and
/// [write_json] so parse-failure handling lives in exactly one place.
pub trait RecordStore {
    /// Returns the raw JSON string for a key, or None when nothing was ever
    /// written under it.
    fn get_raw(&self, key: StoreKey) -> impl Future<Output = Result<Option<String>>> + Send;

    fn put_raw(&self, key: StoreKey, value: String) -> impl Future<Output = Result<()>> + Send;

    fn remove(&self, key: StoreKey) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref + Sync> RecordStore for T
where
    T::Target: RecordStore + Sync,
{
    fn get_raw(&self, key: StoreKey) -> impl Future<Output = Result<Option<String>>> + Send {
        self.deref().get_raw(key)
    }

    fn put_raw(&self, key: StoreKey, value: String) -> impl Future<Output = Result<()>> + Send {
        self.deref().put_raw(key, value)
    }

    fn remove(&self, key: StoreKey) -> impl Future<Output = Result<()>> + Send {
        self.deref().remove(key)
    }
}

/// Reads and decodes a record, falling back to the type's default when the key
/// is absent or its value no longer parses. A malformed value only costs its
/// own category: it is logged and skipped, never propagated.
pub async fn read_or_default<T, S>(store: &S, key: StoreKey) -> Result<T>
where
    T: DeserializeOwned + Default,
    S: RecordStore,
{
    let Some(raw) = store.get_raw(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Malformed record under {:?}: {e}", key.as_str());
            Ok(T::default())
        }
    }
}

pub async fn write_json<T, S>(store: &S, key: StoreKey, value: &T) -> Result<()>
where
    T: Serialize + Sync,
    S: RecordStore,
{
    store.put_raw(key, serde_json::to_string(value)?).await
}

/// The main realization of [RecordStore]: one `<key>.json` file per key inside
/// the record directory, fs4-locked so overlapping CLI invocations never see a
/// half-written value.
pub struct JsonFileStore {
    record_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn path_for(&self, key: StoreKey) -> PathBuf {
        self.record_dir.join(format!("{}.json", key.as_str()))
    }
}

impl RecordStore for JsonFileStore {
    async fn get_raw(&self, key: StoreKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        debug!("Reading {path:?}");
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        file.lock_shared()?;
        let mut file = file;
        let mut raw = String::new();
        let result = file.read_to_string(&mut raw).await;
        file.unlock_async().await?;
        result?;
        Ok(Some(raw))
    }

    async fn put_raw(&self, key: StoreKey, value: String) -> Result<()> {
        let path = self.path_for(key);
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;
        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.write_all(value.as_bytes()).await?;
            file.flush().await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;
        file.unlock_async().await?;
        result
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        store::entities::{sample_tasks, TaskCollection},
        utils::logging::TEST_LOGGING,
    };

    use super::{read_or_default, write_json, JsonFileStore, RecordStore, StoreKey};

    #[test]
    fn every_key_maps_to_a_distinct_record_name() {
        let names: std::collections::BTreeSet<_> =
            StoreKey::ALL.iter().map(StoreKey::as_str).collect();
        assert_eq!(names.len(), StoreKey::ALL.len());
    }

    #[tokio::test]
    async fn absent_key_reads_as_default() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;

        let collection: TaskCollection = read_or_default(&store, StoreKey::Tasks).await?;
        assert!(collection.is_empty());
        assert_eq!(store.get_raw(StoreKey::Tasks).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn write_then_read_round_trips() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;

        let collection = sample_tasks();
        write_json(&store, StoreKey::Tasks, &collection).await?;

        let restored: TaskCollection = read_or_default(&store, StoreKey::Tasks).await?;
        assert_eq!(restored, collection);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_value_degrades_to_default() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;

        store
            .put_raw(StoreKey::Tasks, "{not json at all".into())
            .await?;

        let collection: TaskCollection = read_or_default(&store, StoreKey::Tasks).await?;
        assert!(collection.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn remove_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;

        write_json(&store, StoreKey::FocusTime, &serde_json::json!({"today": 2.5})).await?;
        store.remove(StoreKey::FocusTime).await?;
        store.remove(StoreKey::FocusTime).await?;
        assert_eq!(store.get_raw(StoreKey::FocusTime).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_value() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;

        store.put_raw(StoreKey::Streaks, "a-long-first-value".into()).await?;
        store.put_raw(StoreKey::Streaks, "short".into()).await?;
        assert_eq!(
            store.get_raw(StoreKey::Streaks).await?.as_deref(),
            Some("short")
        );
        Ok(())
    }
}
