use anyhow::Result;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    PaymentFailed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::PaymentFailed => "PAYMENT_FAILED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: Decimal,
    pub currency: String,
    pub status: String,
}

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn fetch(&self, order_id: Uuid) -> Result<Option<OrderRecord>>;
    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<()>;
}
