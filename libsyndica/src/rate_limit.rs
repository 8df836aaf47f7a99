//! Sliding-window rate limiting per (platform, account)
//!
//! Admission checks run against a shared counter store so concurrent
//! publishers across service instances observe one consistent window. The
//! store keeps raw request timestamps; every check prunes entries older than
//! the trailing window, counts survivors and conditionally records the new
//! request as a single atomic unit.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

use crate::error::{DbError, PlatformError, Result};
use crate::types::PlatformKind;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Admissions left in the current window after this one.
    pub remaining: u32,
    /// Unix millis at which the oldest counted request leaves the window.
    pub reset_at: i64,
    /// How long a denied caller should wait before trying again.
    pub retry_after: Option<Duration>,
}

/// What the store observed and did, inside one atomic unit.
#[derive(Debug, Clone, Copy)]
pub struct StoreDecision {
    pub admitted: bool,
    /// Entries inside the window before any insert.
    pub count: u32,
    /// Oldest surviving entry, if any.
    pub oldest_ms: Option<i64>,
}

/// The shared counter store behind the limiter.
///
/// `check_and_record` must prune, count and conditionally insert atomically;
/// two concurrent callers observing `count < max` and both being admitted
/// past the limit is a contract violation.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn check_and_record(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        max_requests: u32,
    ) -> Result<StoreDecision>;

    /// Drop entries older than `cutoff_ms` across all keys (maintenance).
    async fn prune(&self, cutoff_ms: i64) -> Result<()>;
}

/// Window key for one (platform, account) pair.
pub fn window_key(platform: PlatformKind, account_id: &str) -> String {
    format!("{}:{}", platform, account_id)
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    fail_open: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, fail_open: bool) -> Self {
        Self { store, fail_open }
    }

    /// Check admission for one request and record it when allowed.
    ///
    /// When the store is unreachable the configured outage policy applies:
    /// fail-open admits and logs (the remote API still enforces its own
    /// limit), fail-closed surfaces the store error.
    pub async fn check(
        &self,
        platform: PlatformKind,
        account_id: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision> {
        let key = window_key(platform, account_id);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = config.window.as_millis() as i64;

        let decision = match self
            .store
            .check_and_record(&key, now_ms, window_ms, config.max_requests)
            .await
        {
            Ok(d) => d,
            Err(e) if self.fail_open => {
                warn!("Rate limit store unavailable for {}, failing open: {}", key, e);
                return Ok(RateLimitDecision {
                    allowed: true,
                    remaining: 0,
                    reset_at: now_ms + window_ms,
                    retry_after: None,
                });
            }
            Err(e) => return Err(e),
        };

        if decision.admitted {
            let remaining = config.max_requests.saturating_sub(decision.count + 1);
            Ok(RateLimitDecision {
                allowed: true,
                remaining,
                reset_at: decision.oldest_ms.unwrap_or(now_ms) + window_ms,
                retry_after: None,
            })
        } else {
            // The oldest surviving entry decides when a slot frees up.
            let retry_ms = decision
                .oldest_ms
                .map(|oldest| (oldest + window_ms - now_ms).max(1))
                .unwrap_or(window_ms);
            Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: decision.oldest_ms.unwrap_or(now_ms) + window_ms,
                retry_after: Some(Duration::from_millis(retry_ms as u64)),
            })
        }
    }

    /// Like [`check`](Self::check) but maps denial to a
    /// [`PlatformError::RateLimited`] so adapters can propagate it directly.
    pub async fn admit(
        &self,
        platform: PlatformKind,
        account_id: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitDecision> {
        let decision = self.check(platform, account_id, config).await?;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(PlatformError::RateLimited {
                message: window_key(platform, account_id),
                retry_after: decision.retry_after,
            }
            .into())
        }
    }
}

/// In-process store: a mutex-held timestamp map. Suitable for single-instance
/// deployments and tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<i64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn check_and_record(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        max_requests: u32,
    ) -> Result<StoreDecision> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = entries.entry(key.to_string()).or_default();
        timestamps.retain(|ts| *ts > now_ms - window_ms);

        let count = timestamps.len() as u32;
        let oldest_ms = timestamps.iter().min().copied();
        let admitted = count < max_requests;
        if admitted {
            timestamps.push(now_ms);
        }

        Ok(StoreDecision {
            admitted,
            count,
            oldest_ms,
        })
    }

    async fn prune(&self, cutoff_ms: i64) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for timestamps in entries.values_mut() {
            timestamps.retain(|ts| *ts >= cutoff_ms);
        }
        entries.retain(|_, v| !v.is_empty());
        Ok(())
    }
}

/// Shared store over the `rate_limit_entries` table. All three sub-steps run
/// inside one transaction; SQLite serializes writers, so concurrent checks
/// across processes cannot both be admitted past the limit.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for SqliteStore {
    async fn check_and_record(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        max_requests: u32,
    ) -> Result<StoreDecision> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;
        let cutoff = now_ms - window_ms;

        sqlx::query("DELETE FROM rate_limit_entries WHERE key = ? AND ts_ms <= ?")
            .bind(key)
            .bind(cutoff)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        let (count, oldest_ms): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), MIN(ts_ms) FROM rate_limit_entries WHERE key = ?",
        )
        .bind(key)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        let admitted = (count as u32) < max_requests;
        if admitted {
            sqlx::query("INSERT INTO rate_limit_entries (key, ts_ms) VALUES (?, ?)")
                .bind(key)
                .bind(now_ms)
                .execute(&mut *tx)
                .await
                .map_err(DbError::SqlxError)?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;

        Ok(StoreDecision {
            admitted,
            count: count as u32,
            oldest_ms,
        })
    }

    async fn prune(&self, cutoff_ms: i64) -> Result<()> {
        sqlx::query("DELETE FROM rate_limit_entries WHERE ts_ms < ?")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;
        Ok(())
    }
}
