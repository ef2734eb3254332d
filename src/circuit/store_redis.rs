use crate::circuit::state::{BreakerConfig, BreakerSnapshot, BreakerState};
use crate::circuit::store::CircuitStore;
use crate::domain::intent::PaymentProvider;
use anyhow::Result;
use redis::AsyncCommands;
use std::collections::HashMap;

/// Snapshot kept as a redis hash so the failure counter can be bumped with
/// HINCRBY instead of a lossy read-modify-write of the whole value.
#[derive(Clone)]
pub struct RedisCircuitStore {
    pub client: redis::Client,
}

impl RedisCircuitStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn state_key(provider: PaymentProvider) -> String {
        format!("breaker:state:{}", provider)
    }
}

#[async_trait::async_trait]
impl CircuitStore for RedisCircuitStore {
    async fn load(&self, provider: PaymentProvider) -> Result<BreakerSnapshot> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(Self::state_key(provider)).await?;
        if fields.is_empty() {
            return Ok(BreakerSnapshot::new(provider));
        }

        let state = fields
            .get("state")
            .and_then(|s| BreakerState::parse(s))
            .unwrap_or(BreakerState::Closed);
        let consecutive_failures = fields
            .get("consecutive_failures")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Ok(BreakerSnapshot {
            provider,
            state,
            consecutive_failures,
            opened_at: millis_field(&fields, "opened_at_ms"),
            cooldown_until: millis_field(&fields, "cooldown_until_ms"),
            updated_at: millis_field(&fields, "updated_at_ms").unwrap_or_else(chrono::Utc::now),
        })
    }

    async fn begin_probe(&self, provider: PaymentProvider) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .hset_multiple(
                Self::state_key(provider),
                &[
                    ("state", BreakerState::HalfOpen.as_str().to_string()),
                    ("updated_at_ms", chrono::Utc::now().timestamp_millis().to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn record_success(&self, provider: PaymentProvider) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::state_key(provider);
        let _: () = redis::pipe()
            .hset_multiple(
                &key,
                &[
                    ("state", BreakerState::Closed.as_str().to_string()),
                    ("consecutive_failures", "0".to_string()),
                    ("updated_at_ms", chrono::Utc::now().timestamp_millis().to_string()),
                ],
            )
            .ignore()
            .hdel(&key, &["opened_at_ms", "cooldown_until_ms"])
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn record_failure(
        &self,
        provider: PaymentProvider,
        config: &BreakerConfig,
    ) -> Result<BreakerSnapshot> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::state_key(provider);
        let now = chrono::Utc::now();

        // The counter increment is the contended write; HINCRBY keeps every
        // concurrent failure. The state flip to open is idempotent.
        let failures: u32 = conn.hincr(&key, "consecutive_failures", 1).await?;
        let state: Option<String> = conn.hget(&key, "state").await?;
        let state = state
            .as_deref()
            .and_then(BreakerState::parse)
            .unwrap_or(BreakerState::Closed);

        let reopen = match state {
            BreakerState::Open | BreakerState::HalfOpen => true,
            BreakerState::Closed => failures >= config.failure_threshold,
        };

        if reopen {
            let cooldown_until = now + chrono::Duration::milliseconds(config.cooldown_ms as i64);
            let _: () = conn
                .hset_multiple(
                    &key,
                    &[
                        ("state", BreakerState::Open.as_str().to_string()),
                        ("opened_at_ms", now.timestamp_millis().to_string()),
                        ("cooldown_until_ms", cooldown_until.timestamp_millis().to_string()),
                        ("updated_at_ms", now.timestamp_millis().to_string()),
                    ],
                )
                .await?;
        } else {
            let _: () = conn
                .hset(&key, "updated_at_ms", now.timestamp_millis().to_string())
                .await?;
        }

        self.load(provider).await
    }
}

fn millis_field(
    fields: &HashMap<String, String>,
    name: &str,
) -> Option<chrono::DateTime<chrono::Utc>> {
    fields
        .get(name)
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(chrono::DateTime::from_timestamp_millis)
}
