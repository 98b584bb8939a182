use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::payment::NextAction;
use crate::gateways::{
    CanonicalStatus, CaptureOutcome, ChargeOutcome, ChargeRequest, PaymentGateway, RefundOutcome,
};
use anyhow::{anyhow, Result};
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const SIGNATURE_FIELD: &str = "signature";

const SUPPORTED_CURRENCIES: &[&str] = &["USD", "AED", "SAR", "EGP", "JOD"];

pub struct HashGateway {
    pub base_url: String,
    pub merchant_id: String,
    pub secret: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

pub fn compute_signature(fields: &BTreeMap<String, String>, secret: &str) -> String {
    let mut canonical = fields
        .iter()
        .filter(|(k, _)| k.as_str() != SIGNATURE_FIELD)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    canonical.push_str("&secret=");
    canonical.push_str(secret);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn verify_fields(fields: &BTreeMap<String, String>, secret: &str) -> bool {
    let Some(provided) = fields.get(SIGNATURE_FIELD) else {
        return false;
    };
    let expected = compute_signature(fields, secret);
    constant_time_eq(expected.as_bytes(), provided.to_lowercase().as_bytes())
}

pub fn parse_form(raw: &[u8]) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(raw)
        .into_owned()
        .collect::<BTreeMap<String, String>>()
}

impl HashGateway {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for HashGateway {
    fn name(&self) -> &'static str {
        "hash-processor"
    }

    fn supports_currency(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCIES.contains(&currency)
    }

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let transaction_id = format!("HP-{}", Uuid::new_v4().simple());

        let mut fields = BTreeMap::new();
        fields.insert("merchant_id".to_string(), self.merchant_id.clone());
        fields.insert("tran_id".to_string(), transaction_id.clone());
        fields.insert(
            "amount".to_string(),
            request.amount.round_dp(2).to_string(),
        );
        fields.insert("currency".to_string(), request.currency.clone());
        fields.insert("success_url".to_string(), self.return_url.clone());
        fields.insert("fail_url".to_string(), self.cancel_url.clone());
        fields.insert("ipn_url".to_string(), self.notify_url.clone());
        let signature = compute_signature(&fields, &self.secret);
        fields.insert(SIGNATURE_FIELD.to_string(), signature);

        let resp = self
            .client
            .post(format!("{}/v1/session", self.base_url))
            .form(&fields)
            .timeout(self.timeout())
            .send()
            .await;

        let outcome = match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r.json().await.unwrap_or_default();
                let action_url = v
                    .get("payment_url")
                    .and_then(|u| u.as_str())
                    .map(ToString::to_string);
                match action_url {
                    Some(action_url) => {
                        if let Some(session_key) =
                            v.get("session_key").and_then(|k| k.as_str())
                        {
                            fields.insert("session_key".to_string(), session_key.to_string());
                        }
                        ChargeOutcome::Created {
                            transaction_id,
                            next_action: NextAction::RedirectForm {
                                action_url,
                                payment_data: fields,
                            },
                            raw: v,
                        }
                    }
                    None => ChargeOutcome::Declined {
                        error_code: "INVALID_RESPONSE".to_string(),
                        error_message: "session response missing payment_url".to_string(),
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
                error_message: "hash processor timed out".to_string(),
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

    async fn capture_payment(&self, _transaction_id: &str) -> Result<CaptureOutcome> {
        Ok(CaptureOutcome::NotRequired {
            status: CanonicalStatus::Unknown,
        })
    }

    async fn refund_payment(
        &self,
        _transaction_id: &str,
        _amount: Decimal,
        _currency: &str,
    ) -> Result<RefundOutcome> {
        Ok(RefundOutcome::ManualActionRequired {
            detail: "hash processor refunds must be raised through the merchant portal"
                .to_string(),
        })
    }

    async fn verify_webhook(&self, raw: &[u8], _headers: &HeaderMap) -> Result<bool> {
        let fields = parse_form(raw);
        if fields.is_empty() {
            return Ok(false);
        }
        Ok(verify_fields(&fields, &self.secret))
    }

    fn parse_webhook(&self, raw: &[u8]) -> Result<Option<GatewayEvent>> {
        let fields = parse_form(raw);
        let event_type = match fields.get("status").map(String::as_str) {
            Some("VALID") | Some("PAID") => GatewayEventType::PaymentSucceeded,
            Some("FAILED") | Some("CANCELLED") => GatewayEventType::PaymentFailed,
            Some("REFUNDED") => GatewayEventType::Refunded,
            _ => return Ok(None),
        };

        let gateway_transaction_id = fields
            .get("tran_id")
            .cloned()
            .ok_or_else(|| anyhow!("hash notification missing tran_id"))?;
        let amount = fields.get("amount").and_then(|a| a.parse::<Decimal>().ok());
        let currency = fields.get("currency").cloned();

        Ok(Some(GatewayEvent {
            event_type,
            gateway_transaction_id,
            amount,
            currency,
            raw: serde_json::to_value(&fields)?,
        }))
    }

    async fn payment_status(&self, _transaction_id: &str) -> Result<CanonicalStatus> {
        Ok(CanonicalStatus::Unknown)
    }
}
