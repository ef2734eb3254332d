use crate::circuit::state::{BreakerConfig, BreakerDecision, BreakerSnapshot, BreakerState};

pub fn pre_call_decision(
    snapshot: &BreakerSnapshot,
    now: chrono::DateTime<chrono::Utc>,
) -> BreakerDecision {
    match snapshot.state {
        BreakerState::Closed => BreakerDecision::Allow,
        BreakerState::HalfOpen => BreakerDecision::Probe,
        BreakerState::Open => {
            if snapshot.cooldown_until.is_some_and(|t| now >= t) {
                BreakerDecision::Probe
            } else {
                BreakerDecision::Reject
            }
        }
    }
}

pub fn on_success(
    mut snapshot: BreakerSnapshot,
    now: chrono::DateTime<chrono::Utc>,
) -> BreakerSnapshot {
    snapshot.state = BreakerState::Closed;
    snapshot.consecutive_failures = 0;
    snapshot.opened_at = None;
    snapshot.cooldown_until = None;
    snapshot.updated_at = now;
    snapshot
}

pub fn on_failure(
    mut snapshot: BreakerSnapshot,
    config: &BreakerConfig,
    now: chrono::DateTime<chrono::Utc>,
) -> BreakerSnapshot {
    snapshot.consecutive_failures += 1;

    let reopen = match snapshot.state {
        // A failed probe re-opens immediately with a fresh cooldown.
        BreakerState::Open | BreakerState::HalfOpen => true,
        BreakerState::Closed => snapshot.consecutive_failures >= config.failure_threshold,
    };

    if reopen {
        snapshot.state = BreakerState::Open;
        snapshot.opened_at = Some(now);
        snapshot.cooldown_until =
            Some(now + chrono::Duration::milliseconds(config.cooldown_ms as i64));
    }

    snapshot.updated_at = now;
    snapshot
}
