use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_payments::config::AppConfig;
use storefront_payments::gateways::card::CardGateway;
use storefront_payments::gateways::hash::HashGateway;
use storefront_payments::gateways::wallet::WalletGateway;
use storefront_payments::gateways::GatewayRegistry;
use storefront_payments::http::handlers::{ops, payments, webhooks};
use storefront_payments::http::middleware::identity::require_identity;
use storefront_payments::reconcile::reconciler::Reconciler;
use storefront_payments::repo::orders_repo::OrdersRepo;
use storefront_payments::repo::payments_repo::PaymentsRepo;
use storefront_payments::repo::transactions_repo::TransactionsRepo;
use storefront_payments::service::payment_service::PaymentService;
use storefront_payments::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let payments_repo = PaymentsRepo { pool: pool.clone() };
    let transactions_repo = TransactionsRepo { pool: pool.clone() };
    let orders: Arc<dyn storefront_payments::domain::order::OrderStore> =
        Arc::new(OrdersRepo { pool: pool.clone() });

    let gateways = GatewayRegistry {
        card: Arc::new(CardGateway {
            base_url: cfg.card.base_url.clone(),
            secret_key: cfg.card.secret_key.clone(),
            webhook_secret: cfg.card.webhook_secret.clone(),
            timeout_ms: cfg.card.timeout_ms,
            client: reqwest::Client::new(),
        }),
        wallet: Arc::new(WalletGateway {
            base_url: cfg.wallet.base_url.clone(),
            client_id: cfg.wallet.client_id.clone(),
            client_secret: cfg.wallet.client_secret.clone(),
            webhook_id: cfg.wallet.webhook_id.clone(),
            return_url: cfg.wallet.return_url.clone(),
            cancel_url: cfg.wallet.cancel_url.clone(),
            timeout_ms: cfg.wallet.timeout_ms,
            client: reqwest::Client::new(),
        }),
        hash: Arc::new(HashGateway {
            base_url: cfg.hash.base_url.clone(),
            merchant_id: cfg.hash.merchant_id.clone(),
            secret: cfg.hash.secret.clone(),
            return_url: cfg.hash.return_url.clone(),
            cancel_url: cfg.hash.cancel_url.clone(),
            notify_url: cfg.hash.notify_url.clone(),
            timeout_ms: cfg.hash.timeout_ms,
            client: reqwest::Client::new(),
        }),
    };

    let reconciler = Reconciler {
        payments_repo: payments_repo.clone(),
        transactions_repo: transactions_repo.clone(),
        orders: orders.clone(),
    };

    let payment_service = PaymentService {
        payments_repo,
        transactions_repo,
        orders,
        gateways: gateways.clone(),
        reconciler: reconciler.clone(),
    };

    let state = AppState {
        payment_service,
        reconciler,
        gateways,
        pool,
    };

    let payment_routes = Router::new()
        .route("/payment/initiate", post(payments::initiate))
        .route("/payment/confirm", post(payments::confirm))
        .route("/payment/status/:id", get(payments::status))
        .route("/payment/history", get(payments::history))
        .route("/payment/refund", post(payments::refund))
        .layer(from_fn(require_identity));

    let app = Router::new()
        .merge(payment_routes)
        .route("/webhooks/card", post(webhooks::card))
        .route("/webhooks/wallet", post(webhooks::wallet))
        .route("/webhooks/hash", post(webhooks::hash))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
