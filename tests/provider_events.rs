use hmac::{Hmac, Mac};
use learnpay::domain::intent::IntentStatus;
use learnpay::providers::card::CardProvider;
use learnpay::providers::escrow::EscrowProvider;
use learnpay::providers::token_cache::TokenCache;
use learnpay::providers::wallet::WalletProvider;
use learnpay::providers::{card, escrow, wallet, ProviderEventKind, ProviderGateway};
use sha2::Sha256;

const SECRET: &str = "whsec_test";

fn sign(payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(b"1724400000");
    mac.update(b".");
    mac.update(payload);
    format!("t=1724400000,v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn card_provider() -> CardProvider {
    CardProvider {
        base_url: "http://localhost:0".to_string(),
        secret_key: "sk_test".to_string(),
        webhook_secret: SECRET.to_string(),
        timeout_ms: 100,
        client: reqwest::Client::new(),
    }
}

fn wallet_provider() -> WalletProvider {
    WalletProvider {
        base_url: "http://localhost:0".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        webhook_secret: SECRET.to_string(),
        timeout_ms: 100,
        client: reqwest::Client::new(),
        token_cache: TokenCache::new(),
    }
}

fn escrow_provider() -> EscrowProvider {
    EscrowProvider {
        base_url: "http://localhost:0".to_string(),
        api_key: "key".to_string(),
        webhook_secret: SECRET.to_string(),
        timeout_ms: 100,
        client: reqwest::Client::new(),
    }
}

#[test]
fn card_status_vocabulary_maps_to_canonical_states() {
    assert_eq!(card::normalize_status("requires_action"), IntentStatus::RequiresAction);
    assert_eq!(card::normalize_status("requires_capture"), IntentStatus::RequiresAction);
    assert_eq!(card::normalize_status("processing"), IntentStatus::Processing);
    assert_eq!(card::normalize_status("succeeded"), IntentStatus::Succeeded);
    assert_eq!(card::normalize_status("canceled"), IntentStatus::Canceled);
    assert_eq!(card::normalize_status("something_new"), IntentStatus::Failed);
}

#[test]
fn wallet_status_vocabulary_maps_to_canonical_states() {
    assert_eq!(wallet::normalize_status("CREATED"), IntentStatus::RequiresAction);
    assert_eq!(wallet::normalize_status("APPROVED"), IntentStatus::Processing);
    assert_eq!(wallet::normalize_status("COMPLETED"), IntentStatus::Succeeded);
    assert_eq!(wallet::normalize_status("VOIDED"), IntentStatus::Canceled);
}

#[test]
fn escrow_status_vocabulary_maps_to_canonical_states() {
    assert_eq!(escrow::normalize_status("created"), IntentStatus::RequiresAction);
    assert_eq!(escrow::normalize_status("funded"), IntentStatus::Processing);
    assert_eq!(escrow::normalize_status("released"), IntentStatus::Succeeded);
    assert_eq!(escrow::normalize_status("refunded"), IntentStatus::Refunded);
}

#[test]
fn card_refund_event_carries_the_intent_ref_and_amount() {
    let payload = br#"{
        "id": "evt_42",
        "type": "charge.refunded",
        "data": {"object": {"id": "ch_1", "payment_intent": "pi_9", "amount": 2500}}
    }"#;
    let event = card_provider()
        .verify_webhook(payload, &sign(payload))
        .unwrap();

    assert_eq!(event.event_id, "evt_42");
    assert_eq!(event.kind, ProviderEventKind::Refunded);
    assert_eq!(event.provider_ref.as_deref(), Some("pi_9"));
    assert_eq!(event.amount_minor, Some(2500));
}

#[test]
fn card_failure_event_carries_the_error_details() {
    let payload = br#"{
        "id": "evt_7",
        "type": "payment_intent.payment_failed",
        "data": {"object": {"id": "pi_1", "last_payment_error": {"code": "card_declined", "message": "Your card was declined."}}}
    }"#;
    let event = card_provider()
        .verify_webhook(payload, &sign(payload))
        .unwrap();

    assert_eq!(event.kind, ProviderEventKind::PaymentFailed);
    assert_eq!(event.failure_code.as_deref(), Some("card_declined"));
}

#[test]
fn unknown_event_types_are_ignored() {
    let payload = br#"{"id": "evt_x", "type": "customer.created", "data": {"object": {"id": "cus_1"}}}"#;
    let event = card_provider()
        .verify_webhook(payload, &sign(payload))
        .unwrap();
    assert_eq!(event.kind, ProviderEventKind::Ignored);
}

#[test]
fn wallet_refund_event_parses_the_decimal_amount() {
    let payload = br#"{
        "id": "WH-1",
        "event_type": "PAYMENT.CAPTURE.REFUNDED",
        "resource": {"id": "CAP-1", "amount": {"value": "58.32", "currency_code": "USD"}}
    }"#;
    let event = wallet_provider()
        .verify_webhook(payload, &sign(payload))
        .unwrap();

    assert_eq!(event.kind, ProviderEventKind::Refunded);
    assert_eq!(event.provider_ref.as_deref(), Some("CAP-1"));
    assert_eq!(event.amount_minor, Some(5832));
}

#[test]
fn escrow_release_event_maps_to_success() {
    let payload = br#"{"event_id": "esc_evt_1", "event_type": "escrow.released", "escrow_id": "esc_5"}"#;
    let event = escrow_provider()
        .verify_webhook(payload, &sign(payload))
        .unwrap();

    assert_eq!(event.kind, ProviderEventKind::PaymentSucceeded);
    assert_eq!(event.provider_ref.as_deref(), Some("esc_5"));
}

#[tokio::test]
async fn cleared_token_cache_forces_reauthentication() {
    // A 401 from the orders API clears the cache; the next call must see a
    // miss and fetch a fresh token.
    let cache = TokenCache::new();
    cache
        .put("tok_1".to_string(), std::time::Duration::from_secs(60))
        .await;
    assert_eq!(cache.get().await.as_deref(), Some("tok_1"));

    cache.clear().await;
    assert!(cache.get().await.is_none());
}

#[tokio::test]
async fn expired_tokens_are_not_served() {
    let cache = TokenCache::new();
    cache
        .put("tok_2".to_string(), std::time::Duration::ZERO)
        .await;
    assert!(cache.get().await.is_none());
}

#[test]
fn webhook_with_bad_signature_is_rejected() {
    let payload = br#"{"id": "evt_1", "type": "payment_intent.succeeded", "data": {"object": {"id": "pi_1"}}}"#;
    let err = card_provider()
        .verify_webhook(payload, "t=1,v1=00")
        .unwrap_err();
    assert!(matches!(err, learnpay::domain::error::PaymentError::SignatureInvalid));
}
