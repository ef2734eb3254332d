use crate::circuit::state::{BreakerConfig, BreakerSnapshot, BreakerState};
use crate::circuit::store::CircuitStore;
use crate::circuit::transitions::{on_failure, on_success};
use crate::domain::intent::PaymentProvider;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local store used in tests and single-node deployments. Every
/// mutation happens under a single write-lock acquisition, so concurrent
/// failures increment the same counter.
#[derive(Clone, Default)]
pub struct MemoryCircuitStore {
    inner: Arc<RwLock<HashMap<PaymentProvider, BreakerSnapshot>>>,
}

impl MemoryCircuitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CircuitStore for MemoryCircuitStore {
    async fn load(&self, provider: PaymentProvider) -> Result<BreakerSnapshot> {
        let read = self.inner.read().await;
        Ok(read
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| BreakerSnapshot::new(provider)))
    }

    async fn begin_probe(&self, provider: PaymentProvider) -> Result<()> {
        let mut write = self.inner.write().await;
        let entry = write
            .entry(provider)
            .or_insert_with(|| BreakerSnapshot::new(provider));
        entry.state = BreakerState::HalfOpen;
        entry.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn record_success(&self, provider: PaymentProvider) -> Result<()> {
        let mut write = self.inner.write().await;
        let entry = write
            .entry(provider)
            .or_insert_with(|| BreakerSnapshot::new(provider));
        *entry = on_success(entry.clone(), chrono::Utc::now());
        Ok(())
    }

    async fn record_failure(
        &self,
        provider: PaymentProvider,
        config: &BreakerConfig,
    ) -> Result<BreakerSnapshot> {
        let mut write = self.inner.write().await;
        let entry = write
            .entry(provider)
            .or_insert_with(|| BreakerSnapshot::new(provider));
        *entry = on_failure(entry.clone(), config, chrono::Utc::now());
        Ok(entry.clone())
    }
}
