use crate::domain::intent::IntentStatus;

/// Canonical state machine. Forward chain requires_payment_method ->
/// requires_action -> processing -> succeeded is monotonic; any non-terminal
/// state may fail or cancel; only succeeded enters the refund states;
/// failed, canceled and refunded are terminal.
pub fn can_transition(from: IntentStatus, to: IntentStatus) -> bool {
    use IntentStatus::*;

    if from == to {
        return false;
    }

    match (from, to) {
        (Failed | Canceled | Refunded, _) => false,
        (_, Failed | Canceled) => !matches!(from, Succeeded | PartiallyRefunded),
        (RequiresPaymentMethod, RequiresAction | Processing | Succeeded) => true,
        (RequiresAction, Processing | Succeeded) => true,
        (Processing, Succeeded) => true,
        (Succeeded, PartiallyRefunded | Refunded) => true,
        (PartiallyRefunded, Refunded) => true,
        _ => false,
    }
}

/// Status after applying a refund that brings the running total to
/// `amount_refunded`.
pub fn refund_status(amount_total: i64, amount_refunded: i64) -> IntentStatus {
    if amount_refunded >= amount_total {
        IntentStatus::Refunded
    } else {
        IntentStatus::PartiallyRefunded
    }
}
