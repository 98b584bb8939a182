use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::payment::NextAction;
use crate::gateways::{
    CanonicalStatus, CaptureOutcome, ChargeOutcome, ChargeRequest, PaymentGateway, RefundOutcome,
};
use anyhow::Result;
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use serde_json::json;

pub struct MockGateway {
    pub behavior: String,
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_currency(&self, _currency: &str) -> bool {
        true
    }

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let outcome = match self.behavior.as_str() {
            "ALWAYS_DECLINE" => ChargeOutcome::Declined {
                error_code: "MOCK_DECLINED".to_string(),
                error_message: "mock decline".to_string(),
                raw: None,
            },
            "ALWAYS_TIMEOUT" => ChargeOutcome::Declined {
                error_code: "GATEWAY_TIMEOUT".to_string(),
                error_message: "mock timeout".to_string(),
                raw: None,
            },
            _ => {
                let transaction_id = format!("mock_txn_{}", uuid::Uuid::new_v4());
                let raw = json!({
                    "id": transaction_id.clone(),
                    "amount": request.amount.to_string(),
                    "currency": request.currency,
                });
                ChargeOutcome::Created {
                    next_action: NextAction::ClientSecret {
                        client_secret: format!("{transaction_id}_secret"),
                    },
                    raw,
                    transaction_id,
                }
            }
        };

        Ok(outcome)
    }

    async fn capture_payment(&self, _transaction_id: &str) -> Result<CaptureOutcome> {
        Ok(CaptureOutcome::Captured {
            status: CanonicalStatus::Completed,
            amount: None,
        })
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        _amount: Decimal,
        _currency: &str,
    ) -> Result<RefundOutcome> {
        Ok(RefundOutcome::Refunded {
            refund_id: format!("mock_refund_{transaction_id}"),
            status: CanonicalStatus::Completed,
        })
    }

    async fn verify_webhook(&self, _raw: &[u8], _headers: &HeaderMap) -> Result<bool> {
        Ok(true)
    }

    fn parse_webhook(&self, raw: &[u8]) -> Result<Option<GatewayEvent>> {
        let v: serde_json::Value = serde_json::from_slice(raw)?;
        let event_type = match v.get("type").and_then(|t| t.as_str()) {
            Some("payment_succeeded") => GatewayEventType::PaymentSucceeded,
            Some("payment_failed") => GatewayEventType::PaymentFailed,
            Some("refunded") => GatewayEventType::Refunded,
            _ => return Ok(None),
        };
        let gateway_transaction_id = v
            .get("transaction_id")
            .and_then(|id| id.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| anyhow::anyhow!("mock webhook missing transaction_id"))?;
        let amount = v
            .get("amount")
            .and_then(|a| a.as_str())
            .and_then(|a| a.parse::<Decimal>().ok());
        let currency = v
            .get("currency")
            .and_then(|c| c.as_str())
            .map(ToString::to_string);

        Ok(Some(GatewayEvent {
            event_type,
            gateway_transaction_id,
            amount,
            currency,
            raw: v,
        }))
    }

    async fn payment_status(&self, _transaction_id: &str) -> Result<CanonicalStatus> {
        let status = match self.behavior.as_str() {
            "ALWAYS_DECLINE" => CanonicalStatus::Failed,
            _ => CanonicalStatus::Completed,
        };
        Ok(status)
    }
}
