pub mod config;
pub mod domain {
    pub mod event;
    pub mod ledger;
    pub mod order;
    pub mod payment;
}
pub mod gateways;
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod identity;
    }
}
pub mod reconcile {
    pub mod reconciler;
    pub mod transitions;
}
pub mod repo {
    pub mod orders_repo;
    pub mod payments_repo;
    pub mod transactions_repo;
}
pub mod service {
    pub mod payment_service;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub reconciler: reconcile::reconciler::Reconciler,
    pub gateways: gateways::GatewayRegistry,
    pub pool: sqlx::PgPool,
}
