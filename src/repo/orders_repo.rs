use crate::domain::order::{OrderRecord, OrderStatus, OrderStore};
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct OrdersRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl OrderStore for OrdersRepo {
    async fn fetch(&self, order_id: Uuid) -> Result<Option<OrderRecord>> {
        let row = sqlx::query("SELECT id, user_id, total, currency, status FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| OrderRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            total: row.get("total"),
            currency: row.get("currency"),
            status: row.get("status"),
        }))
    }

    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(order_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
