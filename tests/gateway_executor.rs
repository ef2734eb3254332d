use learnpay::circuit::state::{BreakerConfig, BreakerState};
use learnpay::circuit::store::CircuitStore;
use learnpay::circuit::store_memory::MemoryCircuitStore;
use learnpay::domain::error::PaymentError;
use learnpay::domain::intent::PaymentProvider;
use learnpay::providers::executor::{GatewayExecutor, RetryPolicy};
use learnpay::providers::UpstreamError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn executor(store: MemoryCircuitStore, max_attempts: u32) -> GatewayExecutor {
    GatewayExecutor {
        store: Arc::new(store),
        breaker: BreakerConfig {
            failure_threshold: 5,
            cooldown_ms: 30_000,
        },
        retry: RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
        },
    }
}

fn transient() -> UpstreamError {
    UpstreamError {
        status: Some(503),
        transport: false,
        message: "service unavailable".to_string(),
    }
}

fn terminal() -> UpstreamError {
    UpstreamError {
        status: Some(402),
        transport: false,
        message: "card declined".to_string(),
    }
}

#[tokio::test]
async fn retries_transient_failures_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let exec = executor(MemoryCircuitStore::new(), 3);

    let calls_in = calls.clone();
    let out = exec
        .execute(PaymentProvider::Card, "create_payment", || {
            let calls = calls_in.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("charged")
                }
            }
        })
        .await;

    assert_eq!(out.unwrap(), "charged");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn terminal_errors_are_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let exec = executor(MemoryCircuitStore::new(), 3);

    let calls_in = calls.clone();
    let out: Result<&str, PaymentError> = exec
        .execute(PaymentProvider::Card, "create_payment", || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(terminal())
            }
        })
        .await;

    assert!(matches!(
        out,
        Err(PaymentError::Upstream {
            status: Some(402),
            ..
        })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_the_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let exec = executor(MemoryCircuitStore::new(), 2);

    let calls_in = calls.clone();
    let out: Result<&str, PaymentError> = exec
        .execute(PaymentProvider::Wallet, "refund_payment", || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient())
            }
        })
        .await;

    assert!(matches!(out, Err(PaymentError::Upstream { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn open_breaker_fails_fast_without_calling() {
    let store = MemoryCircuitStore::new();
    let tripped = BreakerConfig {
        failure_threshold: 1,
        cooldown_ms: 300_000,
    };
    store
        .record_failure(PaymentProvider::Escrow, &tripped)
        .await
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let exec = executor(store, 3);

    let calls_in = calls.clone();
    let out: Result<&str, PaymentError> = exec
        .execute(PaymentProvider::Escrow, "create_payment", || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("never")
            }
        })
        .await;

    assert!(matches!(
        out,
        Err(PaymentError::CircuitOpen {
            provider: PaymentProvider::Escrow
        })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn breaker_opens_after_threshold_and_rejects() {
    let store = MemoryCircuitStore::new();
    let exec = GatewayExecutor {
        store: Arc::new(store.clone()),
        breaker: BreakerConfig {
            failure_threshold: 2,
            cooldown_ms: 60_000,
        },
        retry: RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 1,
        },
    };

    for _ in 0..2 {
        let _ = exec
            .execute(PaymentProvider::Card, "create_payment", || async {
                Err::<&str, _>(transient())
            })
            .await;
    }

    let snapshot = store.load(PaymentProvider::Card).await.unwrap();
    assert_eq!(snapshot.state, BreakerState::Open);

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = calls.clone();
    let out: Result<&str, PaymentError> = exec
        .execute(PaymentProvider::Card, "create_payment", || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("never")
            }
        })
        .await;

    assert!(matches!(out, Err(PaymentError::CircuitOpen { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_failures_all_count_toward_the_threshold() {
    let store = MemoryCircuitStore::new();
    let exec = GatewayExecutor {
        store: Arc::new(store.clone()),
        breaker: BreakerConfig {
            failure_threshold: 2,
            cooldown_ms: 60_000,
        },
        retry: RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 1,
        },
    };

    // Both calls are in flight before either records its failure.
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let run = |barrier: Arc<tokio::sync::Barrier>| {
        let exec = exec.clone();
        async move {
            exec.execute(PaymentProvider::Card, "create_payment", move || {
                let barrier = barrier.clone();
                async move {
                    barrier.wait().await;
                    Err::<&str, _>(terminal())
                }
            })
            .await
        }
    };
    let (a, b) = tokio::join!(run(barrier.clone()), run(barrier));
    assert!(a.is_err());
    assert!(b.is_err());

    let snapshot = store.load(PaymentProvider::Card).await.unwrap();
    assert_eq!(snapshot.consecutive_failures, 2);
    assert_eq!(snapshot.state, BreakerState::Open);
}
