// src/cache/memory.rs

//! In-memory cache store.
//!
//! Used in tests and as the backend when no persistent store is wanted.
//! All primitives lock one mutex, so each call is atomic.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::{CacheStore, pattern_matches, resolve_list_range};
use crate::error::Result;

#[derive(Default)]
struct Inner {
    values: HashMap<String, (String, Option<Instant>)>,
    sets: HashMap<String, HashSet<String>>,
    lists: HashMap<String, Vec<String>>,
    counters: HashMap<String, i64>,
}

impl Inner {
    fn live_value(&self, key: &str) -> Option<&String> {
        let (value, expiry) = self.values.get(key)?;
        match expiry {
            Some(deadline) if *deadline <= Instant::now() => None,
            _ => Some(value),
        }
    }

    fn live_keys(&self, pattern: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .keys()
            .filter(|k| pattern_matches(pattern, k))
            .filter(|k| self.live_value(k).is_some())
            .cloned()
            .collect();
        // Deterministic order makes cursor scans stable
        keys.sort();
        keys
    }
}

/// In-memory store backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().await;
        Ok(inner.live_value(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let expiry = ttl.map(|d| Instant::now() + d);
        inner
            .values
            .insert(key.to_string(), (value.to_string(), expiry));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        Ok(keys
            .iter()
            .filter(|k| inner.values.remove(*k).is_some())
            .count())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(inner.live_keys(pattern))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let inner = self.inner.lock().await;
        let all = inner.live_keys(pattern);
        let start = cursor as usize;
        if start >= all.len() {
            return Ok((0, Vec::new()));
        }
        let end = (start + count.max(1)).min(all.len());
        let next = if end >= all.len() { 0 } else { end as u64 };
        Ok((next, all[start..end].to_vec()))
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_is_member(&self, set: &str, member: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sets
            .get(set)
            .is_some_and(|members| members.contains(member)))
    }

    async fn set_remove(&self, set: &str, members: &[String]) -> Result<usize> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.sets.get_mut(set) else {
            return Ok(0);
        };
        Ok(members.iter().filter(|m| stored.remove(*m)).count())
    }

    async fn list_append(&self, list: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .lists
            .entry(list.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn list_trim(&self, list: &str, start: i64, stop: i64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.lists.get_mut(list) else {
            return Ok(());
        };
        match resolve_list_range(stored.len(), start, stop) {
            Some((from, to)) => {
                *stored = stored[from..=to].to_vec();
            }
            None => stored.clear(),
        }
        Ok(())
    }

    async fn list_range(&self, list: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        let Some(stored) = inner.lists.get(list) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_list_range(stored.len(), start, stop) {
            Some((from, to)) => stored[from..=to].to_vec(),
            None => Vec::new(),
        })
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut inner = self.inner.lock().await;
        let counter = inner.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}
