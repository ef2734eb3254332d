use learnpay::domain::error::PaymentError;
use learnpay::domain::intent::{IntentStatus, PaymentIntent, PaymentProvider};
use learnpay::service::refund_engine::{refund_available, resolve_amount};

fn intent(status: IntentStatus, total: i64, refunded: i64) -> PaymentIntent {
    PaymentIntent {
        id: 1,
        public_id: "pay_test".to_string(),
        provider: PaymentProvider::Card,
        provider_intent_ref: Some("pi_1".to_string()),
        provider_capture_ref: None,
        provider_charge_ref: None,
        status,
        currency: "USD".to_string(),
        amount_subtotal: total,
        amount_discount: 0,
        amount_tax: 0,
        amount_total: total,
        amount_refunded: refunded,
        tax: None,
        metadata: serde_json::json!({}),
        coupon_id: None,
        user_id: 7,
        entity_type: "course".to_string(),
        entity_id: 42,
        receipt_email: None,
        captured_at: None,
        canceled_at: None,
        failure_code: None,
        failure_message: None,
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn only_settled_payments_are_refundable() {
    assert_eq!(
        refund_available(&intent(IntentStatus::Succeeded, 5000, 0)).unwrap(),
        5000
    );
    assert_eq!(
        refund_available(&intent(IntentStatus::PartiallyRefunded, 5000, 2000)).unwrap(),
        3000
    );

    for status in [
        IntentStatus::RequiresPaymentMethod,
        IntentStatus::Processing,
        IntentStatus::Failed,
        IntentStatus::Canceled,
        IntentStatus::Refunded,
    ] {
        assert!(matches!(
            refund_available(&intent(status, 5000, 0)),
            Err(PaymentError::Conflict(_))
        ));
    }
}

#[test]
fn drained_balance_is_a_conflict() {
    let err = refund_available(&intent(IntentStatus::PartiallyRefunded, 5000, 5000)).unwrap_err();
    assert!(matches!(err, PaymentError::Conflict(_)));
}

#[test]
fn default_refund_is_the_full_available_balance() {
    assert_eq!(resolve_amount(None, 5832).unwrap(), 5832);
}

#[test]
fn requested_amount_is_bounded_by_available() {
    assert_eq!(resolve_amount(Some(3000), 5832).unwrap(), 3000);
    assert_eq!(resolve_amount(Some(5832), 5832).unwrap(), 5832);
    assert!(matches!(
        resolve_amount(Some(5833), 5832),
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        resolve_amount(Some(0), 5832),
        Err(PaymentError::Validation(_))
    ));
    assert!(matches!(
        resolve_amount(Some(-100), 5832),
        Err(PaymentError::Validation(_))
    ));
}

#[test]
fn partial_refunds_never_exceed_the_total() {
    // Any sequence of valid partial refunds stays within amount_total.
    let total = 5832;
    let mut refunded = 0;
    for step in [3000, 2000, 832] {
        let available = total - refunded;
        let amount = resolve_amount(Some(step), available).unwrap();
        refunded += amount;
        assert!(refunded <= total);
    }
    assert_eq!(refunded, total);
    assert!(resolve_amount(Some(1), total - refunded).is_err());
}
