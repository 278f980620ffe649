//! Small key/TTL cache used by the visit service to avoid re-reading the
//! same day or month from the store.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Day(NaiveDate),
    Month { year: i32, month: u32 },
}

impl CacheKey {
    pub fn day(date: NaiveDate) -> Self {
        CacheKey::Day(date)
    }

    pub fn month(year: i32, month: u32) -> Self {
        CacheKey::Month { year, month }
    }

    /// Month key containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        CacheKey::Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Day(d) => write!(f, "day:{}", d.format("%Y-%m-%d")),
            CacheKey::Month { year, month } => write!(f, "month:{:04}-{:02}", year, month),
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V> {
    entries: HashMap<CacheKey, Entry<V>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: CacheKey, value: V, ttl: Duration) {
        self.insert_at(key, value, ttl, Instant::now());
    }

    pub fn insert_at(&mut self, key: CacheKey, value: V, ttl: Duration, now: Instant) {
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Return the value only while `now` is before its expiry. Expired
    /// entries are dropped on access.
    pub fn get_at(&mut self, key: &CacheKey, now: Instant) -> Option<V> {
        match self.entries.get(key) {
            Some(e) if now < e.expires_at => Some(e.value.clone()),
            Some(_) => {
                log::debug!("cache entry {} expired", key);
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
