use crate::domain::event::GatewayEvent;
use crate::domain::payment::{NextAction, PaymentMethod};
use anyhow::Result;
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod card;
pub mod hash;
pub mod mock;
pub mod wallet;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Unknown,
}

#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    Created {
        transaction_id: String,
        next_action: NextAction,
        raw: serde_json::Value,
    },
    Declined {
        error_code: String,
        error_message: String,
        raw: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Captured {
        status: CanonicalStatus,
        amount: Option<Decimal>,
    },
    NotRequired {
        status: CanonicalStatus,
    },
    Declined {
        error_code: String,
        error_message: String,
    },
}

#[derive(Debug, Clone)]
pub enum RefundOutcome {
    Refunded {
        refund_id: String,
        status: CanonicalStatus,
    },
    ManualActionRequired {
        detail: String,
    },
    Declined {
        error_code: String,
        error_message: String,
    },
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports_currency(&self, currency: &str) -> bool;

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ChargeOutcome>;

    async fn capture_payment(&self, transaction_id: &str) -> Result<CaptureOutcome>;

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<RefundOutcome>;

    async fn verify_webhook(&self, raw: &[u8], headers: &HeaderMap) -> Result<bool>;

    fn parse_webhook(&self, raw: &[u8]) -> Result<Option<GatewayEvent>>;

    async fn payment_status(&self, transaction_id: &str) -> Result<CanonicalStatus>;
}

#[derive(Clone)]
pub struct GatewayRegistry {
    pub card: Arc<dyn PaymentGateway>,
    pub wallet: Arc<dyn PaymentGateway>,
    pub hash: Arc<dyn PaymentGateway>,
}

impl GatewayRegistry {
    pub fn for_method(&self, method: PaymentMethod) -> Arc<dyn PaymentGateway> {
        match method {
            PaymentMethod::CardProcessor => self.card.clone(),
            PaymentMethod::WalletProcessor => self.wallet.clone(),
            PaymentMethod::HashProcessor => self.hash.clone(),
        }
    }
}
