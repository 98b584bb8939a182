use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Authorize,
    Capture,
    Refund,
    Void,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Authorize => "AUTHORIZE",
            TransactionType::Capture => "CAPTURE",
            TransactionType::Refund => "REFUND",
            TransactionType::Void => "VOID",
        }
    }

    pub fn parse(s: &str) -> Option<TransactionType> {
        match s {
            "AUTHORIZE" => Some(TransactionType::Authorize),
            "CAPTURE" => Some(TransactionType::Capture),
            "REFUND" => Some(TransactionType::Refund),
            "VOID" => Some(TransactionType::Void),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Pending => "PENDING",
        }
    }

    pub fn parse(s: &str) -> Option<TransactionStatus> {
        match s {
            "SUCCESS" => Some(TransactionStatus::Success),
            "FAILED" => Some(TransactionStatus::Failed),
            "PENDING" => Some(TransactionStatus::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub payment_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub is_duplicate: bool,
    pub gateway_transaction_id: Option<String>,
    pub gateway_response: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub payment_id: Uuid,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransactionStatus,
    pub is_duplicate: bool,
    pub gateway_transaction_id: Option<String>,
    pub gateway_response: serde_json::Value,
    pub error_message: Option<String>,
}
