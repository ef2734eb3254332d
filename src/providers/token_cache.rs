use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Explicit TTL cache for the wallet provider's OAuth access token. Owned by
/// the provider instance, not module state.
#[derive(Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<String> {
        let read = self.inner.read().await;
        match &*read {
            Some(token) if token.expires_at > Instant::now() => Some(token.value.clone()),
            _ => None,
        }
    }

    pub async fn put(&self, value: String, ttl: Duration) {
        let mut write = self.inner.write().await;
        *write = Some(CachedToken {
            value,
            expires_at: Instant::now() + ttl,
        });
    }

    pub async fn clear(&self) {
        let mut write = self.inner.write().await;
        *write = None;
    }
}
