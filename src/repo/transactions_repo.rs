use crate::domain::ledger::{LedgerEntry, NewLedgerEntry, TransactionStatus, TransactionType};
use anyhow::{anyhow, Result};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct TransactionsRepo {
    pub pool: PgPool,
}

impl TransactionsRepo {
    pub async fn insert(&self, entry: &NewLedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                payment_id, transaction_type, amount, currency, status,
                is_duplicate, gateway_transaction_id, gateway_response, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.payment_id)
        .bind(entry.transaction_type.as_str())
        .bind(entry.amount)
        .bind(&entry.currency)
        .bind(entry.status.as_str())
        .bind(entry.is_duplicate)
        .bind(&entry.gateway_transaction_id)
        .bind(&entry.gateway_response)
        .bind(&entry.error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_payment(&self, payment_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payment_id, transaction_type, amount, currency, status,
                   is_duplicate, gateway_transaction_id, gateway_response, error_message, created_at
            FROM payment_transactions
            WHERE payment_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let transaction_type: String = row.get("transaction_type");
                let status: String = row.get("status");
                Ok(LedgerEntry {
                    id: row.get("id"),
                    payment_id: row.get("payment_id"),
                    transaction_type: TransactionType::parse(&transaction_type)
                        .ok_or_else(|| anyhow!("unknown transaction type: {transaction_type}"))?,
                    amount: row.get("amount"),
                    currency: row.get("currency"),
                    status: TransactionStatus::parse(&status)
                        .ok_or_else(|| anyhow!("unknown transaction status: {status}"))?,
                    is_duplicate: row.get("is_duplicate"),
                    gateway_transaction_id: row.get("gateway_transaction_id"),
                    gateway_response: row.get("gateway_response"),
                    error_message: row.get("error_message"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
