use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::payment::NextAction;
use crate::gateways::{
    CanonicalStatus, CaptureOutcome, ChargeOutcome, ChargeRequest, PaymentGateway, RefundOutcome,
};
use anyhow::Result;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "Card-Signature";
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
    "XAF", "XOF", "XPF",
];

pub struct CardGateway {
    pub base_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

pub fn currency_exponent(currency: &str) -> u32 {
    if ZERO_DECIMAL_CURRENCIES.contains(&currency) {
        0
    } else {
        2
    }
}

pub fn to_minor_units(amount: Decimal, currency: &str) -> Option<i64> {
    let scaled = amount * Decimal::from(10i64.pow(currency_exponent(currency)));
    if scaled != scaled.trunc() {
        return None;
    }
    scaled.to_i64()
}

pub fn from_minor_units(minor: i64, currency: &str) -> Decimal {
    Decimal::new(minor, currency_exponent(currency))
}

pub fn parse_signature_header(header: &str) -> Option<(i64, String)> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => signature = Some(v.to_string()),
            _ => {}
        }
    }
    Some((timestamp?, signature?))
}

pub fn verify_signed_payload(secret: &str, raw: &[u8], header: &str, now: DateTime<Utc>) -> bool {
    let Some((timestamp, signature)) = parse_signature_header(header) else {
        return false;
    };
    if (now.timestamp() - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(raw);
    mac.verify_slice(&expected).is_ok()
}

pub fn map_intent_status(status: &str) -> CanonicalStatus {
    match status {
        "succeeded" => CanonicalStatus::Completed,
        "processing" => CanonicalStatus::Processing,
        "requires_payment_method" | "requires_confirmation" | "requires_action" => {
            CanonicalStatus::Pending
        }
        "canceled" => CanonicalStatus::Failed,
        _ => CanonicalStatus::Unknown,
    }
}

impl CardGateway {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for CardGateway {
    fn name(&self) -> &'static str {
        "card-processor"
    }

    fn supports_currency(&self, currency: &str) -> bool {
        currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase())
    }

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let Some(amount_minor) = to_minor_units(request.amount, &request.currency) else {
            return Ok(ChargeOutcome::Declined {
                error_code: "INVALID_AMOUNT".to_string(),
                error_message: format!(
                    "amount {} is not representable in {} minor units",
                    request.amount, request.currency
                ),
                raw: None,
            });
        };

        let body = json!({
            "amount": amount_minor,
            "currency": request.currency.to_lowercase(),
            "automatic_payment_methods": { "enabled": true },
            "metadata": {
                "order_id": request.order_id,
                "user_id": request.user_id,
            }
        });

        let resp = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await;

        let outcome = match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r.json().await.unwrap_or_default();
                let intent_id = v.get("id").and_then(|id| id.as_str()).map(ToString::to_string);
                let client_secret = v
                    .get("client_secret")
                    .and_then(|s| s.as_str())
                    .map(ToString::to_string);
                match (intent_id, client_secret) {
                    (Some(transaction_id), Some(client_secret)) => ChargeOutcome::Created {
                        transaction_id,
                        next_action: NextAction::ClientSecret { client_secret },
                        raw: v,
                    },
                    _ => ChargeOutcome::Declined {
                        error_code: "INVALID_RESPONSE".to_string(),
                        error_message: "payment intent response missing id or client_secret"
                            .to_string(),
                        raw: Some(v),
                    },
                }
            }
            Ok(r) => {
                let status = r.status();
                let body = r.text().await.unwrap_or_default();
                ChargeOutcome::Declined {
                    error_code: format!("HTTP_{}", status.as_u16()),
                    error_message: body.chars().take(200).collect(),
                    raw: None,
                }
            }
            Err(e) if e.is_timeout() => ChargeOutcome::Declined {
                error_code: "GATEWAY_TIMEOUT".to_string(),
                error_message: "card processor timed out".to_string(),
                raw: None,
            },
            Err(e) => ChargeOutcome::Declined {
                error_code: "NETWORK_ERROR".to_string(),
                error_message: e.to_string(),
                raw: None,
            },
        };

        Ok(outcome)
    }

    async fn capture_payment(&self, transaction_id: &str) -> Result<CaptureOutcome> {
        let status = self.payment_status(transaction_id).await?;
        Ok(CaptureOutcome::NotRequired { status })
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<RefundOutcome> {
        let Some(amount_minor) = to_minor_units(amount, currency) else {
            return Ok(RefundOutcome::Declined {
                error_code: "INVALID_AMOUNT".to_string(),
                error_message: format!("amount {amount} is not representable in {currency}"),
            });
        };

        let body = json!({
            "payment_intent": transaction_id,
            "amount": amount_minor,
        });

        let r = self
            .client
            .post(format!("{}/v1/refunds", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            let status = r.status();
            let body = r.text().await.unwrap_or_default();
            return Ok(RefundOutcome::Declined {
                error_code: format!("HTTP_{}", status.as_u16()),
                error_message: body.chars().take(200).collect(),
            });
        }

        let v: serde_json::Value = r.json().await?;
        let refund_id = v
            .get("id")
            .and_then(|id| id.as_str())
            .map(ToString::to_string)
            .unwrap_or_default();
        let status = match v.get("status").and_then(|s| s.as_str()) {
            Some("succeeded") => CanonicalStatus::Completed,
            Some("pending") => CanonicalStatus::Processing,
            _ => CanonicalStatus::Unknown,
        };

        Ok(RefundOutcome::Refunded { refund_id, status })
    }

    async fn verify_webhook(&self, raw: &[u8], headers: &HeaderMap) -> Result<bool> {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");
        Ok(verify_signed_payload(&self.webhook_secret, raw, header, Utc::now()))
    }

    fn parse_webhook(&self, raw: &[u8]) -> Result<Option<GatewayEvent>> {
        let v: serde_json::Value = serde_json::from_slice(raw)?;
        let event_type = match v.get("type").and_then(|t| t.as_str()) {
            Some("payment_intent.succeeded") => GatewayEventType::PaymentSucceeded,
            Some("payment_intent.payment_failed") => GatewayEventType::PaymentFailed,
            Some("charge.refunded") => GatewayEventType::Refunded,
            _ => return Ok(None),
        };

        let object = v
            .get("data")
            .and_then(|d| d.get("object"))
            .cloned()
            .unwrap_or_default();

        let gateway_transaction_id = match event_type {
            GatewayEventType::Refunded => object
                .get("payment_intent")
                .and_then(|id| id.as_str())
                .map(ToString::to_string),
            _ => object.get("id").and_then(|id| id.as_str()).map(ToString::to_string),
        }
        .ok_or_else(|| anyhow::anyhow!("card webhook payload missing transaction id"))?;

        let currency = object
            .get("currency")
            .and_then(|c| c.as_str())
            .map(str::to_uppercase);
        let amount = object.get("amount").and_then(|a| a.as_i64()).map(|minor| {
            from_minor_units(minor, currency.as_deref().unwrap_or("USD"))
        });

        Ok(Some(GatewayEvent {
            event_type,
            gateway_transaction_id,
            amount,
            currency,
            raw: v,
        }))
    }

    async fn payment_status(&self, transaction_id: &str) -> Result<CanonicalStatus> {
        let r = self
            .client
            .get(format!("{}/v1/payment_intents/{}", self.base_url, transaction_id))
            .bearer_auth(&self.secret_key)
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            return Ok(CanonicalStatus::Unknown);
        }

        let v: serde_json::Value = r.json().await?;
        Ok(v.get("status")
            .and_then(|s| s.as_str())
            .map(map_intent_status)
            .unwrap_or(CanonicalStatus::Unknown))
    }
}
