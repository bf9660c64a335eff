//! Visit and usage analytics over a `CounterStore`
//!
//! Keys per period and bucket:
//! - `pv:<period>:<bucket>` page views
//! - `uv:<period>:<bucket>` unique visitors
//! - `visitors:<period>:<bucket>` set of hashed visitor ids
//!
//! Recording never fails the caller: store errors are logged and dropped.
//! Buckets are updated one by one, so a failure can leave some periods
//! counted and others not; the next visit carries on from there.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::counter::CounterStore;
use crate::error::CounterError;
use crate::types::{Period, ReadingKind, StatsSnapshot};
use crate::{ICHING_CALLS_KEY, TAROT_CALLS_KEY, TRACKED_ROUTES};

/// Bucket name for a period at a moment (UTC)
pub fn bucket_key(period: Period, now: DateTime<Utc>) -> String {
    let format = match period {
        Period::Hourly => "%Y-%m-%d:%H",
        Period::Daily => "%Y-%m-%d",
        Period::Weekly => "%G-W%V",
        Period::Monthly => "%Y-%m",
        Period::Yearly => "%Y",
    };
    now.format(format).to_string()
}

fn page_views_key(period: Period, bucket: &str) -> String {
    format!("pv:{}:{}", period, bucket)
}

fn unique_visitors_key(period: Period, bucket: &str) -> String {
    format!("uv:{}:{}", period, bucket)
}

fn visitors_set_key(period: Period, bucket: &str) -> String {
    format!("visitors:{}:{}", period, bucket)
}

/// Whether a route counts as a page view: one of the frontend pages,
/// never a static asset
pub fn is_tracked_route(route: &str) -> bool {
    !route.contains('.') && TRACKED_ROUTES.contains(&route)
}

/// Visitor identifiers are stored hashed
fn visitor_id(client_id: &str) -> String {
    let digest = Sha256::digest(client_id.as_bytes());
    digest.iter().take(16).map(|b| format!("{:02x}", b)).collect()
}

/// Analytics service shared by all requests
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn CounterStore>,
}

impl Analytics {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Seed zero counters for the current buckets when absent
    pub async fn initialize(&self) {
        self.initialize_at(Utc::now()).await
    }

    pub async fn initialize_at(&self, now: DateTime<Utc>) {
        if let Err(e) = self.seed_counters(now).await {
            warn!(error = %e, "failed to initialize stats counters");
        }
    }

    async fn seed_counters(&self, now: DateTime<Utc>) -> Result<(), CounterError> {
        let mut keys = vec![TAROT_CALLS_KEY.to_string(), ICHING_CALLS_KEY.to_string()];
        for period in Period::ALL {
            let bucket = bucket_key(period, now);
            keys.push(page_views_key(period, &bucket));
            keys.push(unique_visitors_key(period, &bucket));
        }
        for key in keys {
            if !self.store.exists(&key).await? {
                self.store.set(&key, 0).await?;
            }
        }
        Ok(())
    }

    /// Count a page view; returns whether the route was counted
    pub async fn record_visit(&self, client_id: &str, route: &str) -> bool {
        self.record_visit_at(client_id, route, Utc::now()).await
    }

    pub async fn record_visit_at(&self, client_id: &str, route: &str, now: DateTime<Utc>) -> bool {
        if !is_tracked_route(route) {
            debug!(route, "route not tracked");
            return false;
        }
        if let Err(e) = self.count_visit(client_id, now).await {
            warn!(error = %e, route, "failed to record visit");
        }
        true
    }

    async fn count_visit(&self, client_id: &str, now: DateTime<Utc>) -> Result<(), CounterError> {
        let visitor = visitor_id(client_id);
        for period in Period::ALL {
            let bucket = bucket_key(period, now);
            let ttl = period.expiry();

            let pv = page_views_key(period, &bucket);
            self.store.incr(&pv).await?;
            self.store.expire(&pv, ttl).await?;

            let visitors = visitors_set_key(period, &bucket);
            let uv = unique_visitors_key(period, &bucket);
            if self.store.add_member(&visitors, &visitor).await? {
                self.store.incr(&uv).await?;
            }
            self.store.expire(&visitors, ttl).await?;
            self.store.expire(&uv, ttl).await?;
        }
        Ok(())
    }

    /// Bump the usage counter for a reading kind
    pub async fn record_call(&self, kind: ReadingKind) {
        if let Err(e) = self.store.incr(kind.counter_key()).await {
            warn!(error = %e, %kind, "failed to count reading");
        }
    }

    /// Read every bucket for the current moment
    pub async fn snapshot(&self) -> Result<StatsSnapshot, CounterError> {
        self.snapshot_at(Utc::now()).await
    }

    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Result<StatsSnapshot, CounterError> {
        let mut snapshot = StatsSnapshot {
            tarot_calls: self.read(TAROT_CALLS_KEY).await?,
            iching_calls: self.read(ICHING_CALLS_KEY).await?,
            ..Default::default()
        };
        for period in Period::ALL {
            let bucket = bucket_key(period, now);
            let stats = snapshot.period_mut(period);
            stats.pv = self.read(&page_views_key(period, &bucket)).await?;
            stats.uv = self.read(&unique_visitors_key(period, &bucket)).await?;
        }
        Ok(snapshot)
    }

    async fn read(&self, key: &str) -> Result<u64, CounterError> {
        Ok(self.store.get(key).await?.unwrap_or(0).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counter::MemoryCounterStore;
    use crate::types::TimeStats;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 30, 0).unwrap()
    }

    fn analytics() -> Analytics {
        Analytics::new(Arc::new(MemoryCounterStore::new()))
    }

    #[test]
    fn test_bucket_keys() {
        let now = at(2026, 3, 9, 7);
        assert_eq!(bucket_key(Period::Hourly, now), "2026-03-09:07");
        assert_eq!(bucket_key(Period::Daily, now), "2026-03-09");
        assert_eq!(bucket_key(Period::Weekly, now), "2026-W11");
        assert_eq!(bucket_key(Period::Monthly, now), "2026-03");
        assert_eq!(bucket_key(Period::Yearly, now), "2026");
    }

    #[test]
    fn test_iso_week_crosses_year_boundary() {
        // 2027-01-01 is a Friday, still in ISO week 53 of 2026
        assert_eq!(bucket_key(Period::Weekly, at(2027, 1, 1, 0)), "2026-W53");
    }

    #[test]
    fn test_tracked_routes() {
        assert!(is_tracked_route("/"));
        assert!(is_tracked_route("/iching"));
        assert!(!is_tracked_route("/api/stats"));
        assert!(!is_tracked_route("/favicon.ico"));
    }

    #[test]
    fn test_visitor_ids_are_hashed() {
        let id = visitor_id("203.0.113.7");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, visitor_id("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_unique_visitors_counted_once() {
        let analytics = analytics();
        let now = at(2026, 3, 9, 7);
        assert!(analytics.record_visit_at("a", "/", now).await);
        assert!(analytics.record_visit_at("a", "/tarot", now).await);
        assert!(analytics.record_visit_at("b", "/iching", now).await);

        let snapshot = analytics.snapshot_at(now).await.unwrap();
        for period in Period::ALL {
            assert_eq!(snapshot.period(period), TimeStats { pv: 3, uv: 2 }, "{}", period);
        }
    }

    #[tokio::test]
    async fn test_new_hour_starts_fresh_hourly_bucket() {
        let analytics = analytics();
        analytics.record_visit_at("a", "/", at(2026, 3, 9, 7)).await;
        analytics.record_visit_at("a", "/", at(2026, 3, 9, 8)).await;

        let snapshot = analytics.snapshot_at(at(2026, 3, 9, 8)).await.unwrap();
        assert_eq!(snapshot.hourly, TimeStats { pv: 1, uv: 1 });
        assert_eq!(snapshot.daily, TimeStats { pv: 2, uv: 1 });
    }

    #[tokio::test]
    async fn test_untracked_route_not_counted() {
        let analytics = analytics();
        let now = at(2026, 3, 9, 7);
        assert!(!analytics.record_visit_at("a", "/api/stats", now).await);
        assert_eq!(analytics.snapshot_at(now).await.unwrap(), StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_call_counters() {
        let analytics = analytics();
        analytics.record_call(ReadingKind::Tarot).await;
        analytics.record_call(ReadingKind::IChing).await;
        analytics.record_call(ReadingKind::IChing).await;
        let snapshot = analytics.snapshot().await.unwrap();
        assert_eq!(snapshot.tarot_calls, 1);
        assert_eq!(snapshot.iching_calls, 2);
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_counts() {
        let store = Arc::new(MemoryCounterStore::new());
        let analytics = Analytics::new(store.clone());
        analytics.record_call(ReadingKind::Tarot).await;
        analytics.initialize().await;
        assert_eq!(store.get(TAROT_CALLS_KEY).await.unwrap(), Some(1));
        assert_eq!(store.get(ICHING_CALLS_KEY).await.unwrap(), Some(0));
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn incr(&self, _: &str) -> Result<i64, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn get(&self, _: &str) -> Result<Option<i64>, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn set(&self, _: &str, _: i64) -> Result<(), CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn exists(&self, _: &str) -> Result<bool, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn add_member(&self, _: &str, _: &str) -> Result<bool, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn is_member(&self, _: &str, _: &str) -> Result<bool, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
        async fn expire(&self, _: &str, _: Duration) -> Result<bool, CounterError> {
            Err(CounterError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed_on_record() {
        let analytics = Analytics::new(Arc::new(BrokenStore));
        analytics.initialize().await;
        analytics.record_call(ReadingKind::Tarot).await;
        assert!(analytics.record_visit("a", "/").await);
        assert!(analytics.snapshot().await.is_err());
    }
}
