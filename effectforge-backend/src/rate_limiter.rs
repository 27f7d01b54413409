use dashmap::DashMap;
use effectforge_config::RateLimitConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Key shared by every client when limiting is not per IP.
const GLOBAL_KEY: &str = "global";

/// Full buckets are swept out after this many acquisitions.
const SWEEP_EVERY: u64 = 1024;

/// A simple token-bucket instance.
#[derive(Clone)]
pub struct TokenBucket {
    inner: Arc<Mutex<TokenBucketInner>>,
}

struct TokenBucketInner {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_check: Instant,
}

impl TokenBucket {
    pub fn new(capacity: usize, refill_per_sec: f64) -> Self {
        let inner = TokenBucketInner {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec,
            last_check: Instant::now(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(inner.last_check).as_secs_f64();
        if elapsed > 0.0 {
            inner.tokens = (inner.tokens + elapsed * inner.refill_per_sec).min(inner.capacity);
            inner.last_check = now;
        }
        if inner.tokens >= 1.0 {
            inner.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// True when the bucket has refilled completely, i.e. it is
    /// indistinguishable from a new one. A bucket in use counts as not full.
    fn is_full(&self, now: Instant) -> bool {
        match self.inner.try_lock() {
            Ok(inner) => {
                let elapsed = now.saturating_duration_since(inner.last_check).as_secs_f64();
                inner.tokens + elapsed * inner.refill_per_sec >= inner.capacity
            }
            Err(_) => false,
        }
    }
}

/// Per-client token buckets plus the paths that bypass them.
///
/// Paths are matched after the `/api` prefix has been stripped by nesting.
#[derive(Clone)]
pub struct RateLimiterManager {
    buckets: Arc<DashMap<String, TokenBucket>>,
    acquisitions: Arc<AtomicU64>,
    pub enabled: bool,
    pub per_ip: bool,
    pub rate_per_sec: f64,
    pub burst: usize,
    pub exempt_paths: Arc<Vec<String>>,
}

impl RateLimiterManager {
    pub fn new(
        enabled: bool,
        per_ip: bool,
        rate_per_sec: f64,
        burst: usize,
        exempt_paths: Vec<String>,
    ) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            acquisitions: Arc::new(AtomicU64::new(0)),
            enabled,
            per_ip,
            rate_per_sec,
            burst,
            exempt_paths: Arc::new(exempt_paths),
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(
            cfg.enabled,
            cfg.per_ip,
            cfg.rate_per_sec,
            cfg.burst,
            cfg.exempt_paths.clone(),
        )
    }

    /// A limiter that lets everything through.
    pub fn disabled() -> Self {
        Self::new(
            false,
            true,
            20.0,
            40,
            vec!["/health".to_string(), "/ready".to_string()],
        )
    }

    /// Exact match, or prefix match for entries ending in `/*`.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| match p.strip_suffix("/*") {
            Some(prefix) => path == prefix || path.starts_with(&format!("{prefix}/")),
            None => p == path,
        })
    }

    /// Bucket key for a client address.
    pub fn key_for<'a>(&self, client: &'a str) -> &'a str {
        if self.per_ip {
            client
        } else {
            GLOBAL_KEY
        }
    }

    /// Acquire a token for a key (e.g., client IP). If limiter is disabled, always allow.
    pub async fn try_acquire_for(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        if self.acquisitions.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.evict_full_buckets();
        }
        let bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst, self.rate_per_sec))
            .clone();
        bucket.try_acquire().await
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Forget clients whose bucket has refilled; they get a fresh one on their
    /// next request. Returns how many were dropped.
    pub fn evict_full_buckets(&self) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_full(now));
        let evicted = before.saturating_sub(self.buckets.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.buckets.len(), "evicted idle rate-limit buckets");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn token_bucket_refill_and_capacity() {
        let tb = TokenBucket::new(2, 1.0);
        assert!(tb.try_acquire().await);
        assert!(tb.try_acquire().await);
        assert!(!tb.try_acquire().await);
        // one token back after a second
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(tb.try_acquire().await);
    }

    #[tokio::test]
    async fn buckets_are_per_key() {
        let manager = RateLimiterManager::new(true, true, 10.0, 1, vec![]);
        assert!(manager.try_acquire_for("a").await);
        assert!(!manager.try_acquire_for("a").await);
        assert!(manager.try_acquire_for("b").await);
        assert_eq!(manager.tracked_clients(), 2);
    }

    #[tokio::test]
    async fn refilled_buckets_are_evicted() {
        let manager = RateLimiterManager::new(true, true, 1000.0, 2, vec![]);
        assert!(manager.try_acquire_for("idle").await);
        let busy = RateLimiterManager::new(true, true, 0.001, 2, vec![]);
        assert!(busy.try_acquire_for("busy").await);

        // 1000 tokens/s refills the idle bucket well within this pause
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(manager.evict_full_buckets(), 1);
        assert_eq!(manager.tracked_clients(), 0);
        assert_eq!(busy.evict_full_buckets(), 0);
        assert_eq!(busy.tracked_clients(), 1);

        // an evicted client starts again with a full burst
        assert!(manager.try_acquire_for("idle").await);
        assert!(manager.try_acquire_for("idle").await);
        assert!(busy.try_acquire_for("busy").await);
        assert!(!busy.try_acquire_for("busy").await);
    }

    #[tokio::test]
    async fn disabled_limiter_always_allows() {
        let manager = RateLimiterManager::disabled();
        for _ in 0..100 {
            assert!(manager.try_acquire_for("a").await);
        }
        assert_eq!(manager.tracked_clients(), 0);
    }

    #[test]
    fn shared_key_when_not_per_ip() {
        let manager = RateLimiterManager::new(true, false, 1.0, 1, vec![]);
        assert_eq!(manager.key_for("10.0.0.1"), "global");
        let manager = RateLimiterManager::new(true, true, 1.0, 1, vec![]);
        assert_eq!(manager.key_for("10.0.0.1"), "10.0.0.1");
    }

    #[test]
    fn exempt_paths_support_prefixes() {
        let manager = RateLimiterManager::new(
            true,
            true,
            1.0,
            1,
            vec!["/health".into(), "/jobs/*".into()],
        );
        assert!(manager.is_exempt("/health"));
        assert!(!manager.is_exempt("/healthz"));
        assert!(manager.is_exempt("/jobs"));
        assert!(manager.is_exempt("/jobs/abc"));
        assert!(!manager.is_exempt("/jobsx"));
    }
}
