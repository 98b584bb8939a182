use crate::domain::event::{GatewayEvent, GatewayEventType};
use crate::domain::payment::NextAction;
use crate::gateways::{
    CanonicalStatus, CaptureOutcome, ChargeOutcome, ChargeRequest, PaymentGateway, RefundOutcome,
};
use anyhow::{anyhow, Result};
use axum::http::HeaderMap;
use rust_decimal::Decimal;
use serde_json::json;

pub const TRANSMISSION_ID_HEADER: &str = "Wallet-Transmission-Id";
pub const TRANSMISSION_TIME_HEADER: &str = "Wallet-Transmission-Time";
pub const TRANSMISSION_SIG_HEADER: &str = "Wallet-Transmission-Sig";
pub const CERT_URL_HEADER: &str = "Wallet-Cert-Url";
pub const AUTH_ALGO_HEADER: &str = "Wallet-Auth-Algo";

const SUPPORTED_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "AUD", "CAD", "JPY"];

pub struct WalletGateway {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub webhook_id: String,
    pub return_url: String,
    pub cancel_url: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

pub fn map_order_status(status: &str) -> CanonicalStatus {
    match status {
        "CREATED" | "SAVED" | "PAYER_ACTION_REQUIRED" => CanonicalStatus::Pending,
        "APPROVED" => CanonicalStatus::Processing,
        "COMPLETED" => CanonicalStatus::Completed,
        "VOIDED" => CanonicalStatus::Failed,
        _ => CanonicalStatus::Unknown,
    }
}

pub fn map_event_type(event_type: &str) -> Option<GatewayEventType> {
    match event_type {
        "PAYMENT.CAPTURE.COMPLETED" => Some(GatewayEventType::PaymentSucceeded),
        "PAYMENT.CAPTURE.DENIED" | "PAYMENT.CAPTURE.DECLINED" => {
            Some(GatewayEventType::PaymentFailed)
        }
        "PAYMENT.CAPTURE.REFUNDED" => Some(GatewayEventType::Refunded),
        _ => None,
    }
}

pub fn amount_string(amount: Decimal, currency: &str) -> String {
    if currency == "JPY" {
        amount.round_dp(0).to_string()
    } else {
        amount.round_dp(2).to_string()
    }
}

impl WalletGateway {
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    async fn access_token(&self) -> Result<String> {
        let r = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            return Err(anyhow!("wallet processor token request failed: {}", r.status()));
        }

        let v: serde_json::Value = r.json().await?;
        v.get("access_token")
            .and_then(|t| t.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("wallet processor token response missing access_token"))
    }

    async fn fetch_order(&self, token: &str, transaction_id: &str) -> Result<serde_json::Value> {
        let r = self
            .client
            .get(format!("{}/v2/checkout/orders/{}", self.base_url, transaction_id))
            .bearer_auth(token)
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            return Err(anyhow!("wallet order lookup failed: {}", r.status()));
        }

        Ok(r.json().await?)
    }
}

#[async_trait::async_trait]
impl PaymentGateway for WalletGateway {
    fn name(&self) -> &'static str {
        "wallet-processor"
    }

    fn supports_currency(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCIES.contains(&currency)
    }

    async fn create_payment(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                return Ok(ChargeOutcome::Declined {
                    error_code: "AUTH_ERROR".to_string(),
                    error_message: e.to_string(),
                    raw: None,
                })
            }
        };

        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": request.order_id,
                "amount": {
                    "currency_code": request.currency,
                    "value": amount_string(request.amount, &request.currency),
                }
            }],
            "application_context": {
                "return_url": self.return_url,
                "cancel_url": self.cancel_url,
            }
        });

        let resp = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await;

        let outcome = match resp {
            Ok(r) if r.status().is_success() => {
                let v: serde_json::Value = r.json().await.unwrap_or_default();
                let order_id = v.get("id").and_then(|id| id.as_str()).map(ToString::to_string);
                let approval_url = v
                    .get("links")
                    .and_then(|links| links.as_array())
                    .and_then(|links| {
                        links.iter().find(|l| {
                            matches!(
                                l.get("rel").and_then(|r| r.as_str()),
                                Some("approve") | Some("payer-action")
                            )
                        })
                    })
                    .and_then(|l| l.get("href"))
                    .and_then(|h| h.as_str())
                    .map(ToString::to_string);
                match (order_id, approval_url) {
                    (Some(transaction_id), Some(approval_url)) => ChargeOutcome::Created {
                        transaction_id,
                        next_action: NextAction::ApprovalUrl { approval_url },
                        raw: v,
                    },
                    _ => ChargeOutcome::Declined {
                        error_code: "INVALID_RESPONSE".to_string(),
                        error_message: "wallet order response missing id or approval link"
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
                error_message: "wallet processor timed out".to_string(),
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
        let token = self.access_token().await?;
        let r = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, transaction_id
            ))
            .bearer_auth(&token)
            .json(&json!({}))
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            let status = r.status();
            let body = r.text().await.unwrap_or_default();
            return Ok(CaptureOutcome::Declined {
                error_code: format!("HTTP_{}", status.as_u16()),
                error_message: body.chars().take(200).collect(),
            });
        }

        let v: serde_json::Value = r.json().await?;
        let status = v
            .get("status")
            .and_then(|s| s.as_str())
            .map(map_order_status)
            .unwrap_or(CanonicalStatus::Unknown);
        let amount = v
            .get("purchase_units")
            .and_then(|u| u.get(0))
            .and_then(|u| u.get("payments"))
            .and_then(|p| p.get("captures"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("amount"))
            .and_then(|a| a.get("value"))
            .and_then(|value| value.as_str())
            .and_then(|value| value.parse::<Decimal>().ok());

        Ok(CaptureOutcome::Captured { status, amount })
    }

    async fn refund_payment(
        &self,
        transaction_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<RefundOutcome> {
        let token = self.access_token().await?;
        let order = self.fetch_order(&token, transaction_id).await?;
        let capture_id = order
            .get("purchase_units")
            .and_then(|u| u.get(0))
            .and_then(|u| u.get("payments"))
            .and_then(|p| p.get("captures"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("id"))
            .and_then(|id| id.as_str());

        let Some(capture_id) = capture_id else {
            return Ok(RefundOutcome::Declined {
                error_code: "NO_CAPTURE".to_string(),
                error_message: "wallet order has no capture to refund".to_string(),
            });
        };

        let body = json!({
            "amount": {
                "currency_code": currency,
                "value": amount_string(amount, currency),
            }
        });

        let r = self
            .client
            .post(format!("{}/v2/payments/captures/{}/refund", self.base_url, capture_id))
            .bearer_auth(&token)
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
            Some("COMPLETED") => CanonicalStatus::Completed,
            Some("PENDING") => CanonicalStatus::Processing,
            _ => CanonicalStatus::Unknown,
        };

        Ok(RefundOutcome::Refunded { refund_id, status })
    }

    async fn verify_webhook(&self, raw: &[u8], headers: &HeaderMap) -> Result<bool> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .map(ToString::to_string)
        };

        let (Some(transmission_id), Some(transmission_time), Some(transmission_sig), Some(cert_url)) = (
            header(TRANSMISSION_ID_HEADER),
            header(TRANSMISSION_TIME_HEADER),
            header(TRANSMISSION_SIG_HEADER),
            header(CERT_URL_HEADER),
        ) else {
            return Ok(false);
        };
        let auth_algo = header(AUTH_ALGO_HEADER).unwrap_or_else(|| "SHA256withRSA".to_string());

        let Ok(event) = serde_json::from_slice::<serde_json::Value>(raw) else {
            return Ok(false);
        };

        let token = self.access_token().await?;
        let body = json!({
            "transmission_id": transmission_id,
            "transmission_time": transmission_time,
            "transmission_sig": transmission_sig,
            "cert_url": cert_url,
            "auth_algo": auth_algo,
            "webhook_id": self.webhook_id,
            "webhook_event": event,
        });

        let r = self
            .client
            .post(format!(
                "{}/v1/notifications/verify-webhook-signature",
                self.base_url
            ))
            .bearer_auth(&token)
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await?;

        if !r.status().is_success() {
            return Err(anyhow!("wallet signature verification call failed: {}", r.status()));
        }

        let v: serde_json::Value = r.json().await?;
        Ok(v.get("verification_status").and_then(|s| s.as_str()) == Some("SUCCESS"))
    }

    fn parse_webhook(&self, raw: &[u8]) -> Result<Option<GatewayEvent>> {
        let v: serde_json::Value = serde_json::from_slice(raw)?;
        let Some(event_type) = v
            .get("event_type")
            .and_then(|t| t.as_str())
            .and_then(map_event_type)
        else {
            return Ok(None);
        };

        let resource = v.get("resource").cloned().unwrap_or_default();
        let gateway_transaction_id = resource
            .get("supplementary_data")
            .and_then(|s| s.get("related_ids"))
            .and_then(|r| r.get("order_id"))
            .and_then(|id| id.as_str())
            .or_else(|| resource.get("id").and_then(|id| id.as_str()))
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("wallet webhook payload missing resource id"))?;

        let amount = resource
            .get("amount")
            .and_then(|a| a.get("value"))
            .and_then(|value| value.as_str())
            .and_then(|value| value.parse::<Decimal>().ok());
        let currency = resource
            .get("amount")
            .and_then(|a| a.get("currency_code"))
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

    async fn payment_status(&self, transaction_id: &str) -> Result<CanonicalStatus> {
        let token = self.access_token().await?;
        let order = self.fetch_order(&token, transaction_id).await?;
        Ok(order
            .get("status")
            .and_then(|s| s.as_str())
            .map(map_order_status)
            .unwrap_or(CanonicalStatus::Unknown))
    }
}
