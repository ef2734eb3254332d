use crate::domain::intent::PaymentProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "closed" => Some(BreakerState::Closed),
            "open" => Some(BreakerState::Open),
            "half_open" => Some(BreakerState::HalfOpen),
            _ => None,
        }
    }
}

/// Per-provider breaker snapshot, shared across all concurrent callers
/// through a CircuitStore.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    pub provider: PaymentProvider,
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub opened_at: Option<chrono::DateTime<chrono::Utc>>,
    pub cooldown_until: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl BreakerSnapshot {
    pub fn new(provider: PaymentProvider) -> Self {
        Self {
            provider,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            cooldown_until: None,
            updated_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerDecision {
    Allow,
    Probe,
    Reject,
}
