use crate::circuit::state::{BreakerConfig, BreakerSnapshot};
use crate::domain::intent::PaymentProvider;
use anyhow::Result;

/// Shared home of the breaker snapshots. All concurrent gateway calls for a
/// provider hit the same snapshot through this store, so the mutating
/// operations must be atomic: two callers recording a failure at the same
/// time both count.
#[async_trait::async_trait]
pub trait CircuitStore: Send + Sync {
    async fn load(&self, provider: PaymentProvider) -> Result<BreakerSnapshot>;

    /// Flips the breaker to half-open before a probe call goes out.
    async fn begin_probe(&self, provider: PaymentProvider) -> Result<()>;

    /// Closes the breaker and resets the failure counter.
    async fn record_success(&self, provider: PaymentProvider) -> Result<()>;

    /// Atomically bumps the failure counter, opening the breaker once the
    /// threshold is crossed or a probe fails. Returns the updated snapshot.
    async fn record_failure(
        &self,
        provider: PaymentProvider,
        config: &BreakerConfig,
    ) -> Result<BreakerSnapshot>;
}
