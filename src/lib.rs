pub mod config;
pub mod crypto;
pub mod domain {
    pub mod coupon;
    pub mod error;
    pub mod events;
    pub mod intent;
    pub mod ledger;
    pub mod refund;
    pub mod transitions;
}
pub mod totals;
pub mod circuit;
pub mod providers;
pub mod repo {
    pub mod coupons_repo;
    pub mod intents_repo;
    pub mod ledger_repo;
    pub mod outbox_repo;
    pub mod refunds_repo;
    pub mod webhook_receipts_repo;
}
pub mod service {
    pub mod collaborators;
    pub mod coupon_guard;
    pub mod event_relay;
    pub mod intent_ledger;
    pub mod payment_service;
    pub mod refund_engine;
    pub mod webhook_processor;
}
pub mod http {
    pub mod handlers {
        pub mod payments;
        pub mod refunds;
        pub mod webhooks;
    }
    pub mod responses;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub refund_engine: service::refund_engine::RefundEngine,
    pub webhook_processor: service::webhook_processor::WebhookProcessor,
    pub intents_repo: repo::intents_repo::IntentsRepo,
    pub ledger_repo: repo::ledger_repo::LedgerRepo,
    pub refunds_repo: repo::refunds_repo::RefundsRepo,
}
