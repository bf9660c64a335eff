//! Counter store: atomic counters and sets with expiry
//!
//! The analytics layer only talks to `CounterStore`, so a networked store can
//! replace the in-memory one without touching it. Each operation is atomic on
//! its own; nothing spans keys.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CounterError;

/// Atomic key-value counter service
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment a counter, creating it at 0 first; returns the new value
    async fn incr(&self, key: &str) -> Result<i64, CounterError>;

    /// Current counter value, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<i64>, CounterError>;

    /// Overwrite a counter, clearing any expiry
    async fn set(&self, key: &str, value: i64) -> Result<(), CounterError>;

    async fn exists(&self, key: &str) -> Result<bool, CounterError>;

    /// Add to a set; `true` when the member was not there before
    async fn add_member(&self, key: &str, member: &str) -> Result<bool, CounterError>;

    async fn is_member(&self, key: &str, member: &str) -> Result<bool, CounterError>;

    /// Set a time to live; `false` when the key does not exist
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterError>;
}

#[derive(Debug)]
enum Value {
    Counter(i64),
    Set(HashSet<String>),
}

#[derive(Debug)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self { value, expires_at: None }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Interval between full sweeps of expired keys
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// In-process `CounterStore`.
///
/// An expired key is dropped when next touched. Buckets that are never
/// touched again are dropped by a full sweep, run from the write path at
/// most once per sweep interval.
#[derive(Debug)]
pub struct MemoryCounterStore {
    slots: DashMap<String, Slot>,
    started: Instant,
    /// Milliseconds after `started` of the last sweep
    last_sweep: AtomicU64,
    sweep_interval: Duration,
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            started: Instant::now(),
            last_sweep: AtomicU64::new(0),
            sweep_interval,
        }
    }

    /// Drop every expired key; returns how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| !slot.is_expired(now));
        let removed = before.saturating_sub(self.slots.len());
        if removed > 0 {
            debug!(removed, "swept expired counter keys");
        }
        removed
    }

    /// Sweep when the interval has passed since the last one
    fn maybe_cleanup(&self) {
        let elapsed = self.started.elapsed().as_millis() as u64;
        let last = self.last_sweep.load(Ordering::Relaxed);
        if elapsed.saturating_sub(last) < self.sweep_interval.as_millis() as u64 {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, elapsed, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            self.cleanup();
        }
    }

    /// Live keys, expired ones excluded
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots.iter().filter(|slot| !slot.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, key: &str) {
        let now = Instant::now();
        self.slots.remove_if(key, |_, slot| slot.is_expired(now));
    }

    fn wrong_type(key: &str) -> CounterError {
        CounterError::WrongType { key: key.to_string() }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<i64, CounterError> {
        self.maybe_cleanup();
        self.purge_expired(key);
        let mut slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Value::Counter(0)));
        match &mut slot.value {
            Value::Counter(count) => {
                *count += 1;
                Ok(*count)
            }
            Value::Set(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, CounterError> {
        self.purge_expired(key);
        match self.slots.get(key).as_deref() {
            None => Ok(None),
            Some(Slot { value: Value::Counter(count), .. }) => Ok(Some(*count)),
            Some(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: i64) -> Result<(), CounterError> {
        self.maybe_cleanup();
        self.slots.insert(key.to_string(), Slot::new(Value::Counter(value)));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CounterError> {
        self.purge_expired(key);
        Ok(self.slots.contains_key(key))
    }

    async fn add_member(&self, key: &str, member: &str) -> Result<bool, CounterError> {
        self.maybe_cleanup();
        self.purge_expired(key);
        let mut slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(Value::Set(HashSet::new())));
        match &mut slot.value {
            Value::Set(members) => Ok(members.insert(member.to_string())),
            Value::Counter(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn is_member(&self, key: &str, member: &str) -> Result<bool, CounterError> {
        self.purge_expired(key);
        match self.slots.get(key).as_deref() {
            None => Ok(false),
            Some(Slot { value: Value::Set(members), .. }) => Ok(members.contains(member)),
            Some(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CounterError> {
        self.purge_expired(key);
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            Entry::Vacant(_) => Ok(false),
        }
    }
}
