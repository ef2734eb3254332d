use learnpay::circuit::state::{BreakerConfig, BreakerDecision, BreakerSnapshot, BreakerState};
use learnpay::circuit::transitions::{on_failure, on_success, pre_call_decision};
use learnpay::domain::intent::PaymentProvider;

fn config() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 3,
        cooldown_ms: 30_000,
    }
}

#[test]
fn opens_after_consecutive_failures() {
    let now = chrono::Utc::now();
    let mut snapshot = BreakerSnapshot::new(PaymentProvider::Card);

    snapshot = on_failure(snapshot, &config(), now);
    snapshot = on_failure(snapshot, &config(), now);
    assert_eq!(snapshot.state, BreakerState::Closed);

    snapshot = on_failure(snapshot, &config(), now);
    assert_eq!(snapshot.state, BreakerState::Open);
    assert_eq!(snapshot.consecutive_failures, 3);
    assert!(snapshot.cooldown_until.is_some());
}

#[test]
fn rejects_while_cooling_down_then_probes() {
    let now = chrono::Utc::now();
    let mut snapshot = BreakerSnapshot::new(PaymentProvider::Card);
    for _ in 0..3 {
        snapshot = on_failure(snapshot, &config(), now);
    }

    assert_eq!(pre_call_decision(&snapshot, now), BreakerDecision::Reject);
    assert_eq!(
        pre_call_decision(&snapshot, now + chrono::Duration::milliseconds(29_999)),
        BreakerDecision::Reject
    );
    assert_eq!(
        pre_call_decision(&snapshot, now + chrono::Duration::milliseconds(30_000)),
        BreakerDecision::Probe
    );
}

#[test]
fn failed_probe_reopens_with_fresh_cooldown() {
    let now = chrono::Utc::now();
    let mut snapshot = BreakerSnapshot::new(PaymentProvider::Wallet);
    snapshot.state = BreakerState::HalfOpen;
    snapshot.consecutive_failures = 3;

    let later = now + chrono::Duration::seconds(60);
    let snapshot = on_failure(snapshot, &config(), later);
    assert_eq!(snapshot.state, BreakerState::Open);
    assert_eq!(snapshot.opened_at, Some(later));
    assert_eq!(
        snapshot.cooldown_until,
        Some(later + chrono::Duration::milliseconds(30_000))
    );
}

#[test]
fn success_closes_and_resets_counters() {
    let now = chrono::Utc::now();
    let mut snapshot = BreakerSnapshot::new(PaymentProvider::Escrow);
    for _ in 0..3 {
        snapshot = on_failure(snapshot, &config(), now);
    }
    snapshot.state = BreakerState::HalfOpen;

    let snapshot = on_success(snapshot, now);
    assert_eq!(snapshot.state, BreakerState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert!(snapshot.cooldown_until.is_none());
    assert_eq!(pre_call_decision(&snapshot, now), BreakerDecision::Allow);
}

#[test]
fn half_open_probes_without_waiting() {
    let mut snapshot = BreakerSnapshot::new(PaymentProvider::Card);
    snapshot.state = BreakerState::HalfOpen;
    assert_eq!(
        pre_call_decision(&snapshot, chrono::Utc::now()),
        BreakerDecision::Probe
    );
}
