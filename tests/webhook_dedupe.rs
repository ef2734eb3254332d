use learnpay::service::webhook_processor::{
    claim_decision, ClaimDecision, RECEIPT_DUPLICATE, RECEIPT_FAILED, RECEIPT_PROCESSED,
    RECEIPT_PROCESSING,
};

#[test]
fn fresh_claim_is_processed() {
    assert_eq!(claim_decision(None), ClaimDecision::Process);
}

#[test]
fn failed_receipt_is_reprocessed_on_redelivery() {
    assert_eq!(claim_decision(Some(RECEIPT_FAILED)), ClaimDecision::Reprocess);
}

#[test]
fn processed_receipt_short_circuits() {
    assert_eq!(
        claim_decision(Some(RECEIPT_PROCESSED)),
        ClaimDecision::Duplicate
    );
    assert_eq!(
        claim_decision(Some(RECEIPT_DUPLICATE)),
        ClaimDecision::Duplicate
    );
}

#[test]
fn in_flight_receipt_is_not_reprocessed() {
    // Another delivery holds the claim; redelivering concurrently must not
    // apply the event a second time.
    assert_eq!(
        claim_decision(Some(RECEIPT_PROCESSING)),
        ClaimDecision::Duplicate
    );
}

#[test]
fn unknown_receipt_statuses_are_treated_as_duplicates() {
    assert_eq!(claim_decision(Some("archived")), ClaimDecision::Duplicate);
}
