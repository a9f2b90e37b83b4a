//! Tiered cache: fast in-process TTL map, mirrored to redis when a shared
//! tier is configured and healthy. Cache failures never surface to callers;
//! a redis error downgrades the service to memory-only until a later health
//! check succeeds.

pub mod cached;
pub mod keys;

pub use cached::CachedGenerator;
pub use keys::{cache_key, normalize_keywords};

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::RedisConfig;

/// Open a shared redis connection, or None when disabled/unreachable.
/// Startup never fails on a missing redis; the caches degrade instead.
pub async fn connect_redis(config: &RedisConfig) -> Option<ConnectionManager> {
    if !config.enabled {
        info!("redis disabled, running with in-process caches only");
        return None;
    }

    let client = match redis::Client::open(config.url.as_str()) {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "invalid redis URL, running with in-process caches only");
            return None;
        }
    };

    match client.get_connection_manager().await {
        Ok(manager) => {
            info!(url = %config.url, "redis connected");
            Some(manager)
        }
        Err(err) => {
            warn!(error = %err, "redis unavailable, running with in-process caches only");
            None
        }
    }
}

struct MemoryEntry {
    value: Value,
    expires_at: Instant,
}

pub struct CacheService {
    memory: Mutex<HashMap<String, MemoryEntry>>,
    redis: Option<ConnectionManager>,
    redis_healthy: AtomicBool,
    max_entries: usize,
}

impl CacheService {
    pub fn new(redis: Option<ConnectionManager>, max_entries: usize) -> Self {
        let healthy = redis.is_some();
        Self {
            memory: Mutex::new(HashMap::new()),
            redis,
            redis_healthy: AtomicBool::new(healthy),
            max_entries: max_entries.max(1),
        }
    }

    /// In-process tier only; used when redis is disabled and in tests.
    pub fn memory_only(max_entries: usize) -> Self {
        Self::new(None, max_entries)
    }

    pub fn redis_healthy(&self) -> bool {
        self.redis.is_some() && self.redis_healthy.load(Ordering::Relaxed)
    }

    fn mark_unhealthy(&self, context: &str, err: &redis::RedisError) {
        if self.redis_healthy.swap(false, Ordering::Relaxed) {
            warn!(context, error = %err, "redis error, downgrading cache to in-process tier");
        }
    }

    /// Fast tier first, shared tier second. A shared-tier hit is mirrored
    /// into the fast tier with its remaining TTL. Expired entries behave as
    /// absent.
    pub async fn get(&self, key: &str) -> Option<Value> {
        {
            let mut memory = self.memory.lock().await;
            if let Some(entry) = memory.get(key) {
                if entry.expires_at > Instant::now() {
                    return Some(entry.value.clone());
                }
                memory.remove(key);
            }
        }

        if !self.redis_healthy() {
            return None;
        }
        let mut conn = self.redis.clone()?;

        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(err) => {
                self.mark_unhealthy("get", &err);
                return None;
            }
        };
        let raw = raw?;

        let value: Value = serde_json::from_str(&raw).ok()?;

        // Mirror with the remaining TTL so the local copy cannot outlive
        // the shared one.
        let remaining: i64 = conn.ttl(key).await.unwrap_or(-1);
        if remaining > 0 {
            self.store_in_memory(key, value.clone(), Duration::from_secs(remaining as u64))
                .await;
        }

        Some(value)
    }

    /// Writes the shared tier when healthy and always the in-process tier.
    /// Never raises: a failed write degrades to "treat as uncached".
    pub async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        if self.redis_healthy() {
            if let Some(mut conn) = self.redis.clone() {
                let payload = value.to_string();
                let result: redis::RedisResult<()> =
                    conn.set_ex(key, payload, ttl.as_secs().max(1)).await;
                if let Err(err) = result {
                    self.mark_unhealthy("set", &err);
                }
            }
        }

        self.store_in_memory(key, value.clone(), ttl).await;
    }

    pub async fn delete(&self, key: &str) {
        self.memory.lock().await.remove(key);

        if self.redis_healthy() {
            if let Some(mut conn) = self.redis.clone() {
                let result: redis::RedisResult<()> = conn.del(key).await;
                if let Err(err) = result {
                    self.mark_unhealthy("delete", &err);
                }
            }
        }
    }

    /// Best-effort removal from both tiers. Exposed as an admin operation.
    pub async fn clear_all(&self) {
        self.memory.lock().await.clear();

        if self.redis_healthy() {
            if let Some(mut conn) = self.redis.clone() {
                let result: redis::RedisResult<()> =
                    redis::cmd("FLUSHDB").query_async(&mut conn).await;
                if let Err(err) = result {
                    self.mark_unhealthy("clear_all", &err);
                }
            }
        }
        info!("cache cleared");
    }

    /// Ping the shared tier; a success re-enables it after a downgrade.
    pub async fn health_check(&self) -> bool {
        let Some(conn) = self.redis.clone() else {
            return false;
        };
        let mut conn = conn;
        let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match result {
            Ok(_) => {
                if !self.redis_healthy.swap(true, Ordering::Relaxed) {
                    info!("redis health check succeeded, shared cache tier re-enabled");
                }
                true
            }
            Err(err) => {
                self.mark_unhealthy("health_check", &err);
                false
            }
        }
    }

    async fn store_in_memory(&self, key: &str, value: Value, ttl: Duration) {
        let mut memory = self.memory.lock().await;

        if memory.len() >= self.max_entries && !memory.contains_key(key) {
            let now = Instant::now();
            memory.retain(|_, entry| entry.expires_at > now);
            // Coarse eviction when still full after purging expired entries.
            while memory.len() >= self.max_entries {
                let victim = match memory.keys().next() {
                    Some(k) => k.clone(),
                    None => break,
                };
                memory.remove(&victim);
            }
        }

        memory.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let cache = CacheService::memory_only(16);
        let value = json!({"titles": ["T1"]});
        cache.set("k", &value, Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(value));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_absent_after_ttl_elapses() {
        let cache = CacheService::memory_only(16);
        cache.set("k", &json!("v"), Duration::from_secs(10)).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_delete_and_clear_all() {
        let cache = CacheService::memory_only(16);
        cache.set("a", &json!(1), Duration::from_secs(60)).await;
        cache.set("b", &json!(2), Duration::from_secs(60)).await;

        cache.delete("a").await;
        assert_eq!(cache.get("a").await, None);
        assert!(cache.get("b").await.is_some());

        cache.clear_all().await;
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_no_redis_never_raises_and_memory_tier_works() {
        // No external store configured: every operation degrades silently.
        let cache = CacheService::memory_only(16);
        assert!(!cache.redis_healthy());
        assert!(!cache.health_check().await);

        cache.set("k", &json!("local"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(json!("local")));
    }

    #[tokio::test]
    async fn test_eviction_keeps_bounded_size() {
        let cache = CacheService::memory_only(4);
        for i in 0..20 {
            let key = format!("k{}", i);
            cache.set(&key, &json!(i), Duration::from_secs(60)).await;
        }
        let memory = cache.memory.lock().await;
        assert!(memory.len() <= 4);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = CacheService::memory_only(16);
        cache.set("k", &json!("old"), Duration::from_secs(60)).await;
        cache.set("k", &json!("new"), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(json!("new")));
    }
}
