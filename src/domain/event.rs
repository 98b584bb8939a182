use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEventType {
    PaymentSucceeded,
    PaymentFailed,
    Refunded,
}

#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub event_type: GatewayEventType,
    pub gateway_transaction_id: String,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub raw: serde_json::Value,
}
