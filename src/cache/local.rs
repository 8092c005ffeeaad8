// src/cache/local.rs

//! Local filesystem cache store.
//!
//! One file per key under the root directory, written atomically
//! (temp file + rename). Values carry their store time and optional expiry
//! so TTLs survive process restarts.
//!
//! ```text
//! {root}/
//! ├── kv/        # scrape:/delivery: values
//! ├── sets/      # failure memo and friends
//! ├── lists/     # bounded bookkeeping lists
//! └── counters/  # monotonic counters
//! ```

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::cache::{CacheStore, pattern_matches, resolve_list_range};
use crate::error::{AppError, Result};

/// Stored value envelope.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    value: String,
    stored_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= Utc::now())
    }
}

/// File-per-key store backend.
pub struct LocalStore {
    root_dir: PathBuf,
    // Serializes read-modify-write of sets/lists/counters within the process
    write_lock: Mutex<()>,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    // Key names contain ':'; encode to keep file names portable.
    fn encode(name: &str) -> String {
        format!("{}.json", name.replace(':', "@"))
    }

    fn decode(file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(".json")
            .map(|stem| stem.replace('@', ":"))
    }

    fn path(&self, kind: &str, name: &str) -> PathBuf {
        self.root_dir.join(kind).join(Self::encode(name))
    }

    async fn write_json<T: Serialize>(&self, path: &PathBuf, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec(value)?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &PathBuf) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn kv_keys(&self, pattern: &str) -> Result<Vec<String>> {
        let dir = self.root_dir.join("kv");
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(AppError::Io(e)),
        };
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(Self::decode) else {
                continue;
            };
            if pattern_matches(pattern, &name) {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path("kv", key);
        match self.read_json::<Entry>(&path).await? {
            Some(entry) if !entry.expired() => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            stored_at: Utc::now(),
            expires_at: ttl.and_then(|d| {
                chrono::TimeDelta::from_std(d)
                    .ok()
                    .map(|delta| Utc::now() + delta)
            }),
        };
        self.write_json(&self.path("kv", key), &entry).await
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;
        for key in keys {
            match tokio::fs::remove_file(self.path("kv", key)).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::Io(e)),
            }
        }
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.kv_keys(pattern).await
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let all = self.kv_keys(pattern).await?;
        let start = cursor as usize;
        if start >= all.len() {
            return Ok((0, Vec::new()));
        }
        let end = (start + count.max(1)).min(all.len());
        let next = if end >= all.len() { 0 } else { end as u64 };
        Ok((next, all[start..end].to_vec()))
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path("sets", set);
        let mut members: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        if !members.iter().any(|m| m == member) {
            members.push(member.to_string());
            self.write_json(&path, &members).await?;
        }
        Ok(())
    }

    async fn set_is_member(&self, set: &str, member: &str) -> Result<bool> {
        let path = self.path("sets", set);
        let members: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        Ok(members.iter().any(|m| m == member))
    }

    async fn set_remove(&self, set: &str, members: &[String]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let path = self.path("sets", set);
        let mut stored: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        let before = stored.len();
        stored.retain(|m| !members.contains(m));
        let removed = before - stored.len();
        if removed > 0 {
            self.write_json(&path, &stored).await?;
        }
        Ok(removed)
    }

    async fn list_append(&self, list: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path("lists", list);
        let mut values: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        values.push(value.to_string());
        self.write_json(&path, &values).await
    }

    async fn list_trim(&self, list: &str, start: i64, stop: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path("lists", list);
        let values: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        let trimmed = match resolve_list_range(values.len(), start, stop) {
            Some((from, to)) => values[from..=to].to_vec(),
            None => Vec::new(),
        };
        self.write_json(&path, &trimmed).await
    }

    async fn list_range(&self, list: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let path = self.path("lists", list);
        let values: Vec<String> = self.read_json(&path).await?.unwrap_or_default();
        Ok(match resolve_list_range(values.len(), start, stop) {
            Some((from, to)) => values[from..=to].to_vec(),
            None => Vec::new(),
        })
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let _guard = self.write_lock.lock().await;
        let path = self.path("counters", key);
        let current: i64 = self.read_json(&path).await?.unwrap_or(0);
        let next = current + 1;
        self.write_json(&path, &next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn get_set_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store
            .set("scrape:uq:CSSE1001", "{\"x\":1}", None)
            .await
            .unwrap();
        assert_eq!(
            store.get("scrape:uq:CSSE1001").await.unwrap(),
            Some("{\"x\":1}".to_string())
        );
        assert_eq!(store.get("scrape:uq:OTHER").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopening_the_store() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LocalStore::new(tmp.path());
            store.set("scrape:uq:A", "v", None).await.unwrap();
        }
        let reopened = LocalStore::new(tmp.path());
        assert_eq!(
            reopened.get("scrape:uq:A").await.unwrap(),
            Some("v".to_string())
        );
    }

    #[tokio::test]
    async fn keys_filter_by_pattern() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.set("scrape:uq:A", "1", None).await.unwrap();
        store.set("scrape:uq:B", "2", None).await.unwrap();
        store.set("delivery:uq:A:2025:Semester_1", "3", None).await.unwrap();

        let keys = store.keys("scrape:*").await.unwrap();
        assert_eq!(keys, vec!["scrape:uq:A", "scrape:uq:B"]);
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store
            .set("k", "v", Some(Duration::from_nanos(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_membership_persists() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        store.set_add("failed_scrapes", "scrape:uq:A").await.unwrap();
        store.set_add("failed_scrapes", "scrape:uq:A").await.unwrap();
        assert!(
            store
                .set_is_member("failed_scrapes", "scrape:uq:A")
                .await
                .unwrap()
        );
        let removed = store
            .set_remove("failed_scrapes", &["scrape:uq:A".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn list_and_counter_primitives() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());
        for i in 0..4 {
            store.list_append("recent", &i.to_string()).await.unwrap();
        }
        store.list_trim("recent", -2, -1).await.unwrap();
        assert_eq!(
            store.list_range("recent", 0, -1).await.unwrap(),
            vec!["2", "3"]
        );
        assert_eq!(store.increment("hits").await.unwrap(), 1);
        assert_eq!(store.increment("hits").await.unwrap(), 2);
    }
}
