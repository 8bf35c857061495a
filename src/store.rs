//! In-memory store for watch-link records
//!
//! Each token maps to one [`TemporaryRecord`] with its own deadline. Instead
//! of a timer per key, deadlines sit in a min-heap and are reaped lazily on
//! every access (and periodically by [`spawn_sweeper`]). Every insert gets a
//! fresh generation number, so a stale heap entry left behind by a replaced
//! record can never evict its successor.
//!
//! Nothing is persisted: a restart forgets every link.

use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::models::TemporaryRecord;

struct Entry {
    record: TemporaryRecord,
    expires_at: Instant,
    generation: u64,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    at: Instant,
    generation: u64,
    token: String,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    deadlines: BinaryHeap<Reverse<Deadline>>,
    next_generation: u64,
}

impl Inner {
    /// Drop every entry whose deadline is at or before `now`
    fn reap(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(Reverse(top)) = self.deadlines.peek() {
            if top.at > now {
                break;
            }
            let Some(Reverse(deadline)) = self.deadlines.pop() else {
                break;
            };
            let current = self
                .entries
                .get(&deadline.token)
                .is_some_and(|e| e.generation == deadline.generation);
            if current {
                self.entries.remove(&deadline.token);
                tracing::debug!(token = %deadline.token, "Record expired");
                removed += 1;
            }
        }
        removed
    }
}

/// Thread-safe token → record map with per-record expiry.
///
/// All operations take a single lock, so an insert that replaces a record can
/// never interleave with the expiry of the record it replaces.
#[derive(Default)]
pub struct TemporaryRecordStore {
    inner: Mutex<Inner>,
}

impl TemporaryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `token`, restarting its clock.
    ///
    /// A zero `ttl` means instant expiry: any existing record for the token
    /// is dropped and nothing is stored.
    pub fn put(&self, token: impl Into<String>, record: TemporaryRecord, ttl: Duration) {
        let token = token.into();
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.reap(now);

        if ttl.is_zero() {
            inner.entries.remove(&token);
            tracing::debug!(token = %token, "Zero TTL, record expired on insert");
            return;
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        let expires_at = now + ttl;

        inner.deadlines.push(Reverse(Deadline {
            at: expires_at,
            generation,
            token: token.clone(),
        }));
        let replaced = inner
            .entries
            .insert(
                token.clone(),
                Entry {
                    record,
                    expires_at,
                    generation,
                },
            )
            .is_some();

        tracing::debug!(
            token = %token,
            ttl_secs = ttl.as_secs(),
            replaced,
            "Stored record"
        );
    }

    /// Look up a live record. Reading never extends its lifetime.
    pub fn get(&self, token: &str) -> Option<TemporaryRecord> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        inner.reap(now);
        inner
            .entries
            .get(token)
            .filter(|e| e.expires_at > now)
            .map(|e| e.record.clone())
    }

    /// Delete a record. Unknown tokens are ignored.
    pub fn remove(&self, token: &str) {
        let mut inner = self.inner.lock();
        if inner.entries.remove(token).is_some() {
            tracing::debug!(token = %token, "Removed record");
        }
    }

    /// Reap expired records now, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().reap(Instant::now())
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.reap(Instant::now());
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Start a background task that periodically reaps expired records.
///
/// Reads already ignore expired records; this only bounds memory when links
/// are issued but never opened.
pub fn spawn_sweeper(
    store: Arc<TemporaryRecordStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Swept expired records");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;

    const THREE_HOURS: Duration = Duration::from_millis(10_800_000);

    fn record(id: &str) -> TemporaryRecord {
        TemporaryRecord::new(MediaType::Movie, id, "Test Movie")
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_unknown_token() {
        let store = TemporaryRecordStore::new();
        assert!(store.get("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get_returns_record() {
        let store = TemporaryRecordStore::new();
        let rec = record("42");
        store.put("abc123", rec.clone(), THREE_HOURS);
        assert_eq!(store.get("abc123"), Some(rec));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_expires_after_ttl() {
        let store = TemporaryRecordStore::new();
        store.put("abc123", record("42"), THREE_HOURS);

        tokio::time::advance(THREE_HOURS - Duration::from_millis(1)).await;
        assert!(store.get("abc123").is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(store.get("abc123").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_does_not_renew() {
        let store = TemporaryRecordStore::new();
        store.put("t", record("1"), Duration::from_secs(10));

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(store.get("t").is_some());
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get("t").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinsert_resets_clock() {
        let store = TemporaryRecordStore::new();
        store.put("t", record("old"), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(8)).await;
        store.put("t", record("new"), Duration::from_secs(10));

        // The first deadline passes; it must not take the new record with it
        tokio::time::advance(Duration::from_secs(5)).await;
        let got = store.get("t").unwrap();
        assert_eq!(got.external_id, "new");

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(store.get("t").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_then_get() {
        let store = TemporaryRecordStore::new();
        store.put("t", record("1"), THREE_HOURS);
        store.remove("t");
        assert!(store.get("t").is_none());

        // idempotent
        store.remove("t");
        store.remove("never-existed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_instant_expiry() {
        let store = TemporaryRecordStore::new();
        store.put("t", record("1"), THREE_HOURS);
        store.put("t", record("2"), Duration::ZERO);
        assert!(store.get("t").is_none());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_then_reinsert_survives_old_deadline() {
        let store = TemporaryRecordStore::new();
        store.put("t", record("first"), Duration::from_secs(5));
        store.remove("t");
        store.put("t", record("second"), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.get("t").map(|r| r.external_id), Some("second".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_counts() {
        let store = TemporaryRecordStore::new();
        store.put("a", record("1"), Duration::from_secs(1));
        store.put("b", record("2"), Duration::from_secs(2));
        store.put("c", record("3"), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reaps_in_background() {
        let store = Arc::new(TemporaryRecordStore::new());
        store.put("a", record("1"), Duration::from_secs(1));
        let handle = spawn_sweeper(store.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.purge_expired(), 0);
        assert!(store.is_empty());
        handle.abort();
    }
}
