use rust_decimal::Decimal;
use serde_json::json;
use storefront_payments::domain::event::GatewayEventType;
use storefront_payments::gateways::card::{
    from_minor_units, map_intent_status, to_minor_units, CardGateway,
};
use storefront_payments::gateways::hash::HashGateway;
use storefront_payments::gateways::mock::MockGateway;
use storefront_payments::gateways::wallet::{amount_string, map_order_status, WalletGateway};
use storefront_payments::gateways::{
    CanonicalStatus, ChargeOutcome, ChargeRequest, PaymentGateway,
};
use storefront_payments::service::payment_service::validate_currency;
use uuid::Uuid;

fn card() -> CardGateway {
    CardGateway {
        base_url: "http://localhost:9".to_string(),
        secret_key: "sk_test".to_string(),
        webhook_secret: "whsec_test".to_string(),
        timeout_ms: 1000,
        client: reqwest::Client::new(),
    }
}

fn wallet() -> WalletGateway {
    WalletGateway {
        base_url: "http://localhost:9".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        webhook_id: "wh-1".to_string(),
        return_url: "http://localhost:3000/payment/return".to_string(),
        cancel_url: "http://localhost:3000/payment/cancel".to_string(),
        timeout_ms: 1000,
        client: reqwest::Client::new(),
    }
}

fn hash() -> HashGateway {
    HashGateway {
        base_url: "http://localhost:9".to_string(),
        merchant_id: "M-42".to_string(),
        secret: "hash-secret".to_string(),
        return_url: "http://localhost:3000/payment/return".to_string(),
        cancel_url: "http://localhost:3000/payment/cancel".to_string(),
        notify_url: "http://localhost:3000/webhooks/hash".to_string(),
        timeout_ms: 1000,
        client: reqwest::Client::new(),
    }
}

#[test]
fn card_success_event_normalizes_to_canonical_form() {
    let payload = json!({
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_123", "amount": 4999, "currency": "usd" } }
    });

    let event = card()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentSucceeded);
    assert_eq!(event.gateway_transaction_id, "pi_123");
    assert_eq!(event.amount, Some(Decimal::new(4999, 2)));
    assert_eq!(event.currency.as_deref(), Some("USD"));
}

#[test]
fn card_failure_event_normalizes_to_canonical_form() {
    let payload = json!({
        "type": "payment_intent.payment_failed",
        "data": { "object": { "id": "pi_456", "amount": 1200, "currency": "eur" } }
    });

    let event = card()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentFailed);
    assert_eq!(event.gateway_transaction_id, "pi_456");
}

#[test]
fn card_refund_event_links_back_to_the_payment_intent() {
    let payload = json!({
        "type": "charge.refunded",
        "data": { "object": { "id": "ch_1", "payment_intent": "pi_789", "amount": 4999, "currency": "usd" } }
    });

    let event = card()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::Refunded);
    assert_eq!(event.gateway_transaction_id, "pi_789");
}

#[test]
fn card_skips_event_types_it_does_not_handle() {
    let payload = json!({ "type": "customer.created", "data": { "object": { "id": "cus_1" } } });

    assert!(card()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .is_none());
}

#[test]
fn card_rejects_undecodable_payloads() {
    assert!(card().parse_webhook(b"not json").is_err());
}

#[test]
fn minor_unit_conversion_respects_currency_exponents() {
    assert_eq!(to_minor_units(Decimal::new(4999, 2), "USD"), Some(4999));
    assert_eq!(to_minor_units(Decimal::from(500), "JPY"), Some(500));
    assert_eq!(to_minor_units("49.999".parse().unwrap(), "USD"), None);
    assert_eq!(to_minor_units("500.5".parse().unwrap(), "JPY"), None);

    assert_eq!(from_minor_units(4999, "USD"), Decimal::new(4999, 2));
    assert_eq!(from_minor_units(500, "JPY"), Decimal::from(500));
}

#[test]
fn card_status_vocabulary_maps_to_canonical_statuses() {
    assert_eq!(map_intent_status("succeeded"), CanonicalStatus::Completed);
    assert_eq!(map_intent_status("processing"), CanonicalStatus::Processing);
    assert_eq!(map_intent_status("requires_payment_method"), CanonicalStatus::Pending);
    assert_eq!(map_intent_status("requires_action"), CanonicalStatus::Pending);
    assert_eq!(map_intent_status("canceled"), CanonicalStatus::Failed);
    assert_eq!(map_intent_status("anything_else"), CanonicalStatus::Unknown);
}

#[test]
fn wallet_capture_event_prefers_the_order_level_reference() {
    let payload = json!({
        "event_type": "PAYMENT.CAPTURE.COMPLETED",
        "resource": {
            "id": "capture-1",
            "amount": { "value": "49.99", "currency_code": "USD" },
            "supplementary_data": { "related_ids": { "order_id": "order-9" } }
        }
    });

    let event = wallet()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentSucceeded);
    assert_eq!(event.gateway_transaction_id, "order-9");
    assert_eq!(event.amount, Some(Decimal::new(4999, 2)));
    assert_eq!(event.currency.as_deref(), Some("USD"));
}

#[test]
fn wallet_capture_event_falls_back_to_the_resource_id() {
    let payload = json!({
        "event_type": "PAYMENT.CAPTURE.DENIED",
        "resource": { "id": "capture-2", "amount": { "value": "10.00", "currency_code": "EUR" } }
    });

    let event = wallet()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentFailed);
    assert_eq!(event.gateway_transaction_id, "capture-2");
}

#[test]
fn wallet_skips_event_types_it_does_not_handle() {
    let payload = json!({ "event_type": "CHECKOUT.ORDER.APPROVED", "resource": { "id": "o-1" } });

    assert!(wallet()
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .is_none());
}

#[test]
fn wallet_status_vocabulary_maps_to_canonical_statuses() {
    assert_eq!(map_order_status("CREATED"), CanonicalStatus::Pending);
    assert_eq!(map_order_status("PAYER_ACTION_REQUIRED"), CanonicalStatus::Pending);
    assert_eq!(map_order_status("APPROVED"), CanonicalStatus::Processing);
    assert_eq!(map_order_status("COMPLETED"), CanonicalStatus::Completed);
    assert_eq!(map_order_status("VOIDED"), CanonicalStatus::Failed);
    assert_eq!(map_order_status("WHO_KNOWS"), CanonicalStatus::Unknown);
}

#[test]
fn wallet_amount_strings_respect_currency_precision() {
    assert_eq!(amount_string(Decimal::new(4999, 2), "USD"), "49.99");
    assert_eq!(amount_string(Decimal::from(500), "JPY"), "500");
}

#[test]
fn hash_valid_notification_normalizes_to_canonical_form() {
    let body = b"amount=49.99&currency=USD&status=VALID&tran_id=HP-abc";

    let event = hash()
        .parse_webhook(body)
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentSucceeded);
    assert_eq!(event.gateway_transaction_id, "HP-abc");
    assert_eq!(event.amount, Some(Decimal::new(4999, 2)));
    assert_eq!(event.currency.as_deref(), Some("USD"));
}

#[test]
fn hash_failed_and_refunded_notifications_map_to_events() {
    let failed = hash()
        .parse_webhook(b"status=FAILED&tran_id=HP-1")
        .unwrap()
        .expect("recognized event");
    assert_eq!(failed.event_type, GatewayEventType::PaymentFailed);

    let refunded = hash()
        .parse_webhook(b"status=REFUNDED&tran_id=HP-1")
        .unwrap()
        .expect("recognized event");
    assert_eq!(refunded.event_type, GatewayEventType::Refunded);
}

#[test]
fn hash_skips_unknown_statuses_and_rejects_missing_references() {
    assert!(hash().parse_webhook(b"status=IN_REVIEW&tran_id=HP-1").unwrap().is_none());
    assert!(hash().parse_webhook(b"status=VALID&amount=1.00").is_err());
}

#[test]
fn regional_processor_restricts_currencies() {
    let hash = hash();
    assert!(hash.supports_currency("USD"));
    assert!(hash.supports_currency("SAR"));
    assert!(!hash.supports_currency("GBP"));

    let wallet = wallet();
    assert!(wallet.supports_currency("EUR"));
    assert!(!wallet.supports_currency("SAR"));

    let card = card();
    assert!(card.supports_currency("USD"));
    assert!(card.supports_currency("BDT"));
    assert!(!card.supports_currency("usd"));
}

#[test]
fn currency_codes_are_validated_before_any_gateway_work() {
    assert!(validate_currency("USD").is_ok());
    assert!(validate_currency("usd").is_err());
    assert!(validate_currency("USDT").is_err());
    assert!(validate_currency("").is_err());
}

#[tokio::test]
async fn mock_gateway_issues_a_client_secret_on_success() {
    let gateway = MockGateway {
        behavior: "ALWAYS_SUCCESS".to_string(),
    };
    let outcome = gateway
        .create_payment(&ChargeRequest {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Decimal::new(4999, 2),
            currency: "USD".to_string(),
        })
        .await
        .unwrap();

    match outcome {
        ChargeOutcome::Created { transaction_id, .. } => {
            assert!(transaction_id.starts_with("mock_txn_"));
        }
        other => panic!("expected created outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn mock_gateway_declines_when_told_to() {
    let gateway = MockGateway {
        behavior: "ALWAYS_DECLINE".to_string(),
    };
    let outcome = gateway
        .create_payment(&ChargeRequest {
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Decimal::new(4999, 2),
            currency: "USD".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(outcome, ChargeOutcome::Declined { .. }));
}

#[test]
fn mock_gateway_speaks_the_canonical_event_vocabulary() {
    let gateway = MockGateway {
        behavior: "ALWAYS_SUCCESS".to_string(),
    };
    let payload = json!({
        "type": "payment_succeeded",
        "transaction_id": "mock_txn_1",
        "amount": "49.99",
        "currency": "USD"
    });

    let event = gateway
        .parse_webhook(payload.to_string().as_bytes())
        .unwrap()
        .expect("recognized event");

    assert_eq!(event.event_type, GatewayEventType::PaymentSucceeded);
    assert_eq!(event.gateway_transaction_id, "mock_txn_1");
    assert_eq!(event.amount, Some(Decimal::new(4999, 2)));
}
