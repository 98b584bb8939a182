use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CardProcessor,
    WalletProcessor,
    HashProcessor,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CardProcessor => "card-processor",
            PaymentMethod::WalletProcessor => "wallet-processor",
            PaymentMethod::HashProcessor => "hash-processor",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentMethod> {
        match s {
            "card-processor" => Some(PaymentMethod::CardProcessor),
            "wallet-processor" => Some(PaymentMethod::WalletProcessor),
            "hash-processor" => Some(PaymentMethod::HashProcessor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PROCESSING" => Some(PaymentStatus::Processing),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub gateway_transaction_id: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextAction {
    ClientSecret {
        client_secret: String,
    },
    ApprovalUrl {
        approval_url: String,
    },
    RedirectForm {
        action_url: String,
        payment_data: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiatePaymentResponse {
    pub payment_id: Uuid,
    pub transaction_id: String,
    pub status: PaymentStatus,
    #[serde(flatten)]
    pub next_action: NextAction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_id: Uuid,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPaymentResponse {
    pub payment_id: Uuid,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundPaymentRequest {
    pub payment_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundPaymentResponse {
    pub payment_id: Uuid,
    pub payment_status: PaymentStatus,
    pub refund_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentDetailResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub transactions: Vec<crate::domain::ledger::LedgerEntry>,
}

#[derive(Debug, Serialize)]
pub struct PaymentHistoryResponse {
    pub payments: Vec<Payment>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}
