use crate::circuit::state::{BreakerConfig, BreakerDecision};
use crate::circuit::store::CircuitStore;
use crate::circuit::transitions::pre_call_decision;
use crate::domain::error::PaymentError;
use crate::domain::intent::PaymentProvider;
use crate::providers::UpstreamError;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Uniform wrapper for every upstream provider interaction: circuit-breaker
/// gate, then the call, then linear-backoff retries of transient failures.
/// Backoff sleeps hold no lock; a tripped breaker fails fast with no attempt.
#[derive(Clone)]
pub struct GatewayExecutor {
    pub store: Arc<dyn CircuitStore>,
    pub breaker: BreakerConfig,
    pub retry: RetryPolicy,
}

impl GatewayExecutor {
    pub async fn execute<T, F, Fut>(
        &self,
        provider: PaymentProvider,
        operation: &str,
        call: F,
    ) -> Result<T, PaymentError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            let snapshot = self.store.load(provider).await?;
            match pre_call_decision(&snapshot, chrono::Utc::now()) {
                BreakerDecision::Reject => {
                    return Err(PaymentError::CircuitOpen { provider });
                }
                BreakerDecision::Probe => {
                    self.store.begin_probe(provider).await?;
                }
                BreakerDecision::Allow => {}
            }

            match call().await {
                Ok(value) => {
                    self.store.record_success(provider).await?;
                    return Ok(value);
                }
                Err(err) => {
                    self.store.record_failure(provider, &self.breaker).await?;

                    if !err.retryable() || attempt >= max_attempts {
                        tracing::warn!(
                            provider = %provider,
                            operation,
                            attempt,
                            status = ?err.status,
                            "upstream call failed: {}",
                            err.message
                        );
                        return Err(PaymentError::Upstream {
                            provider,
                            operation: operation.to_string(),
                            status: err.status,
                            message: err.message,
                        });
                    }

                    tokio::time::sleep(std::time::Duration::from_millis(
                        self.retry.base_delay_ms * attempt as u64,
                    ))
                    .await;
                    attempt += 1;
                }
            }
        }
    }
}
