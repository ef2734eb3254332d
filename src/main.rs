use axum::routing::{get, post};
use axum::Router;
use learnpay::circuit::state::BreakerConfig;
use learnpay::circuit::store_redis::RedisCircuitStore;
use learnpay::config::AppConfig;
use learnpay::crypto::SecretCipher;
use learnpay::providers::card::CardProvider;
use learnpay::providers::escrow::EscrowProvider;
use learnpay::providers::executor::{GatewayExecutor, RetryPolicy};
use learnpay::providers::token_cache::TokenCache;
use learnpay::providers::wallet::WalletProvider;
use learnpay::providers::ProviderSet;
use learnpay::repo::coupons_repo::CouponsRepo;
use learnpay::repo::intents_repo::IntentsRepo;
use learnpay::repo::ledger_repo::LedgerRepo;
use learnpay::repo::outbox_repo::OutboxRepo;
use learnpay::repo::refunds_repo::RefundsRepo;
use learnpay::repo::webhook_receipts_repo::WebhookReceiptsRepo;
use learnpay::service::collaborators::{
    FixedMonetizationSettings, LoggingHooks, StaticTaxResolver,
};
use learnpay::service::coupon_guard::CouponRedemptionGuard;
use learnpay::service::event_relay::EventRelay;
use learnpay::service::intent_ledger::PaymentIntentLedger;
use learnpay::service::payment_service::PaymentService;
use learnpay::service::refund_engine::RefundEngine;
use learnpay::service::webhook_processor::WebhookProcessor;
use learnpay::totals::types::TaxRate;
use learnpay::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = redis::Client::open(cfg.redis_url.clone())?;
    let cipher = SecretCipher::from_base64(&cfg.master_key_b64)?;

    let intents_repo = IntentsRepo { pool: pool.clone() };
    let coupons_repo = CouponsRepo { pool: pool.clone() };
    let outbox_repo = OutboxRepo { pool: pool.clone() };
    let receipts_repo = WebhookReceiptsRepo { pool: pool.clone() };
    let ledger_repo = LedgerRepo { pool: pool.clone() };
    let refunds_repo = RefundsRepo { pool: pool.clone() };

    let providers = ProviderSet {
        card: Arc::new(CardProvider {
            base_url: cfg.card_base_url.clone(),
            secret_key: cfg.card_secret_key.clone(),
            webhook_secret: cfg.card_webhook_secret.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
        }),
        wallet: Arc::new(WalletProvider {
            base_url: cfg.wallet_base_url.clone(),
            client_id: cfg.wallet_client_id.clone(),
            client_secret: cfg.wallet_client_secret.clone(),
            webhook_secret: cfg.wallet_webhook_secret.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
            token_cache: TokenCache::new(),
        }),
        escrow: Arc::new(EscrowProvider {
            base_url: cfg.escrow_base_url.clone(),
            api_key: cfg.escrow_api_key.clone(),
            webhook_secret: cfg.escrow_webhook_secret.clone(),
            timeout_ms: cfg.gateway_timeout_ms,
            client: reqwest::Client::new(),
        }),
    };

    let executor = GatewayExecutor {
        store: Arc::new(RedisCircuitStore::new(redis::Client::open(
            cfg.redis_url.clone(),
        )?)),
        breaker: BreakerConfig {
            failure_threshold: cfg.breaker_failure_threshold,
            cooldown_ms: cfg.breaker_cooldown_ms,
        },
        retry: RetryPolicy {
            max_attempts: cfg.gateway_max_attempts,
            base_delay_ms: cfg.gateway_base_delay_ms,
        },
    };

    let coupon_guard = CouponRedemptionGuard {
        coupons_repo: coupons_repo.clone(),
    };
    let hooks = Arc::new(LoggingHooks);
    let ledger = PaymentIntentLedger {
        pool: pool.clone(),
        coupon_guard: coupon_guard.clone(),
        hooks: hooks.clone(),
    };

    // TODO: replace with the catalog service's tax tables once its API ships.
    let tax_resolver = Arc::new(StaticTaxResolver {
        entries: vec![(
            "US".to_string(),
            None,
            TaxRate {
                rate: 0.08,
                jurisdiction: "US".to_string(),
                inclusive: false,
            },
        )],
    });
    let monetization = Arc::new(FixedMonetizationSettings {
        commission_bps: 1_000,
        minimum_fee: 50,
    });

    let payment_service = PaymentService {
        intents_repo: intents_repo.clone(),
        coupon_guard: coupon_guard.clone(),
        tax_resolver,
        monetization,
        providers: providers.clone(),
        executor: executor.clone(),
        ledger: ledger.clone(),
    };
    let refund_engine = RefundEngine {
        pool: pool.clone(),
        providers: providers.clone(),
        executor: executor.clone(),
        cipher,
        hooks,
    };
    let webhook_processor = WebhookProcessor {
        receipts: receipts_repo,
        providers,
        ledger,
    };

    let relay = EventRelay {
        outbox_repo,
        redis_client,
        stream_key: cfg.events_stream_key.clone(),
    };
    tokio::spawn(relay.run());

    let state = AppState {
        payment_service,
        refund_engine,
        webhook_processor,
        intents_repo,
        ledger_repo,
        refunds_repo,
    };

    let app = Router::new()
        .route("/health", get(learnpay::http::handlers::payments::health))
        .route("/payments", post(learnpay::http::handlers::payments::create_payment))
        .route(
            "/payments/:payment_id",
            get(learnpay::http::handlers::payments::get_payment),
        )
        .route(
            "/payments/:payment_id/capture",
            post(learnpay::http::handlers::payments::capture_payment),
        )
        .route(
            "/payments/:payment_id/ledger",
            get(learnpay::http::handlers::payments::get_ledger),
        )
        .route(
            "/payments/:payment_id/refunds",
            post(learnpay::http::handlers::refunds::issue_refund)
                .get(learnpay::http::handlers::refunds::list_refunds),
        )
        .route(
            "/webhooks/:provider",
            post(learnpay::http::handlers::webhooks::receive_webhook),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
