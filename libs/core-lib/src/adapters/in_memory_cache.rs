use crate::{Cache, CoreError};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::time::Duration;

/// In-memory implementation of the Cache port using Moka.
/// Backs the session store; entries expire after the TTL given at build time.
#[derive(Clone, Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, Vec<u8>>,
}

impl InMemoryCache {
    pub fn new(max_capacity: u64, ttl_seconds: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();
        Self { cache }
    }
}

impl Default for InMemoryCache {
    /// 10,000 entries, one hour TTL.
    fn default() -> Self {
        Self::new(10_000, 3600)
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CoreError> {
        self.cache.insert(key.to_string(), value.to_vec()).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::default();
        cache.set("session:1", b"{\"identity_id\":1}").await.unwrap();

        let retrieved = cache.get("session:1").await.unwrap();
        assert_eq!(retrieved, Some(b"{\"identity_id\":1}".to_vec()));
    }

    #[tokio::test]
    async fn test_get_non_existent() {
        let cache = InMemoryCache::default();
        assert_eq!(cache.get("session:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::default();
        cache.set("session:2", b"value").await.unwrap();
        cache.delete("session:2").await.unwrap();

        assert_eq!(cache.get("session:2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryCache::new(100, 1);
        cache.set("session:ttl", b"value").await.unwrap();
        assert!(
            cache.get("session:ttl").await.unwrap().is_some(),
            "Value should be present immediately after set"
        );

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            cache.get("session:ttl").await.unwrap(),
            None,
            "Session entry should have expired"
        );
    }
}
