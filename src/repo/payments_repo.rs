use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
}

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, amount, currency, method, status, \
     gateway_transaction_id, gateway_response, paid_at, created_at, updated_at";

fn map_payment(row: PgRow) -> Result<Payment> {
    let method: String = row.get("method");
    let status: String = row.get("status");
    Ok(Payment {
        id: row.get("id"),
        order_id: row.get("order_id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        method: PaymentMethod::parse(&method)
            .ok_or_else(|| anyhow!("unknown payment method in store: {method}"))?,
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| anyhow!("unknown payment status in store: {status}"))?,
        gateway_transaction_id: row.get("gateway_transaction_id"),
        gateway_response: row.get("gateway_response"),
        paid_at: row.get("paid_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl PaymentsRepo {
    pub async fn insert_pending(&self, payment: &NewPayment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, user_id, amount, currency, method, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING')
            "#,
        )
        .bind(payment.id)
        .bind(payment.order_id)
        .bind(payment.user_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.method.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(map_payment).transpose()
    }

    pub async fn find_by_gateway_transaction_id(
        &self,
        method: PaymentMethod,
        gateway_transaction_id: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE method = $1 AND gateway_transaction_id = $2"
        ))
        .bind(method.as_str())
        .bind(gateway_transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_payment).transpose()
    }

    pub async fn has_completed_for_order(&self, order_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE order_id = $1 AND status = 'COMPLETED') AS found",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("found"))
    }

    pub async fn mark_processing(
        &self,
        id: Uuid,
        gateway_transaction_id: &str,
        gateway_response: serde_json::Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'PROCESSING', gateway_transaction_id = $2, gateway_response = $3, updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(gateway_transaction_id)
        .bind(gateway_response)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_failed_initiation(
        &self,
        id: Uuid,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'FAILED', gateway_response = COALESCE($2, gateway_response), updated_at = now()
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(gateway_response)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn transition(
        &self,
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
        set_paid_at: bool,
        gateway_response: Option<serde_json::Value>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $3,
                gateway_response = COALESCE($4, gateway_response),
                paid_at = CASE WHEN $5 AND paid_at IS NULL THEN now() ELSE paid_at END,
                updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(gateway_response)
        .bind(set_paid_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_payment).collect()
    }

    pub async fn count_for_user(&self, user_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM payments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }
}
