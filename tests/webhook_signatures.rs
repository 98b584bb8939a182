use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use storefront_payments::gateways::card::{
    parse_signature_header, verify_signed_payload, SIGNATURE_TOLERANCE_SECS,
};
use storefront_payments::gateways::hash::{
    compute_signature, constant_time_eq, verify_fields, SIGNATURE_FIELD,
};

const SECRET: &str = "whsec_test123secret456";

fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    format!("t={},v1={}", timestamp, sign(payload, secret, timestamp))
}

#[test]
fn card_accepts_a_valid_signature() {
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let now = Utc::now();
    let header = header(payload, SECRET, now.timestamp());

    assert!(verify_signed_payload(SECRET, payload, &header, now));
}

#[test]
fn card_rejects_a_signature_from_the_wrong_secret() {
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let now = Utc::now();
    let header = header(payload, "wrong_secret", now.timestamp());

    assert!(!verify_signed_payload(SECRET, payload, &header, now));
}

#[test]
fn card_rejects_a_tampered_payload() {
    let signed = br#"{"type":"payment_intent.succeeded"}"#;
    let tampered = br#"{"type":"payment_intent.succeeded","amount":1}"#;
    let now = Utc::now();
    let header = header(signed, SECRET, now.timestamp());

    assert!(!verify_signed_payload(SECRET, tampered, &header, now));
}

#[test]
fn card_rejects_a_stale_timestamp() {
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let now = Utc::now();
    let stale = now.timestamp() - SIGNATURE_TOLERANCE_SECS - 1;
    let header = header(payload, SECRET, stale);

    assert!(!verify_signed_payload(SECRET, payload, &header, now));
}

#[test]
fn card_rejects_a_timestamp_from_the_future() {
    let payload = br#"{"type":"payment_intent.succeeded"}"#;
    let now = Utc::now();
    let future = now.timestamp() + SIGNATURE_TOLERANCE_SECS + 60;
    let header = header(payload, SECRET, future);

    assert!(!verify_signed_payload(SECRET, payload, &header, now));
}

#[test]
fn card_rejects_malformed_headers() {
    let payload = br#"{}"#;
    let now = Utc::now();

    for header in ["", "garbage", "t=123", "v1=abcd", "t=notanumber,v1=abcd"] {
        assert!(
            !verify_signed_payload(SECRET, payload, header, now),
            "header {header:?} should be rejected"
        );
    }
}

#[test]
fn card_rejects_non_hex_signatures() {
    let payload = br#"{}"#;
    let now = Utc::now();
    let header = format!("t={},v1=zzzz", now.timestamp());

    assert!(!verify_signed_payload(SECRET, payload, &header, now));
}

#[test]
fn card_signature_header_parses_timestamp_and_signature() {
    assert_eq!(
        parse_signature_header("t=1700000000,v1=abc123"),
        Some((1_700_000_000, "abc123".to_string()))
    );
    assert_eq!(
        parse_signature_header("t=1700000000, v1=abc123"),
        Some((1_700_000_000, "abc123".to_string()))
    );
    assert_eq!(parse_signature_header("v1=abc123"), None);
    assert_eq!(parse_signature_header("t=1700000000"), None);
}

fn sample_fields() -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("merchant_id".to_string(), "M-42".to_string());
    fields.insert("tran_id".to_string(), "HP-abc".to_string());
    fields.insert("amount".to_string(), "49.99".to_string());
    fields.insert("currency".to_string(), "USD".to_string());
    fields.insert("status".to_string(), "VALID".to_string());
    fields
}

#[test]
fn hash_accepts_a_valid_keyed_hash() {
    let mut fields = sample_fields();
    let signature = compute_signature(&fields, "hash-secret");
    fields.insert(SIGNATURE_FIELD.to_string(), signature);

    assert!(verify_fields(&fields, "hash-secret"));
}

#[test]
fn hash_accepts_uppercase_hex() {
    let mut fields = sample_fields();
    let signature = compute_signature(&fields, "hash-secret").to_uppercase();
    fields.insert(SIGNATURE_FIELD.to_string(), signature);

    assert!(verify_fields(&fields, "hash-secret"));
}

#[test]
fn hash_rejects_the_wrong_secret() {
    let mut fields = sample_fields();
    let signature = compute_signature(&fields, "other-secret");
    fields.insert(SIGNATURE_FIELD.to_string(), signature);

    assert!(!verify_fields(&fields, "hash-secret"));
}

#[test]
fn hash_rejects_a_tampered_field() {
    let mut fields = sample_fields();
    let signature = compute_signature(&fields, "hash-secret");
    fields.insert(SIGNATURE_FIELD.to_string(), signature);
    fields.insert("amount".to_string(), "0.01".to_string());

    assert!(!verify_fields(&fields, "hash-secret"));
}

#[test]
fn hash_rejects_a_missing_signature_field() {
    assert!(!verify_fields(&sample_fields(), "hash-secret"));
}

#[test]
fn hash_signature_ignores_field_insertion_order() {
    let forward = sample_fields();
    let mut reversed = BTreeMap::new();
    for (k, v) in forward.iter().rev() {
        reversed.insert(k.clone(), v.clone());
    }

    assert_eq!(
        compute_signature(&forward, "s"),
        compute_signature(&reversed, "s")
    );
}

#[test]
fn constant_time_eq_compares_by_content_and_length() {
    assert!(constant_time_eq(b"abcd", b"abcd"));
    assert!(!constant_time_eq(b"abcd", b"abce"));
    assert!(!constant_time_eq(b"abcd", b"abc"));
    assert!(constant_time_eq(b"", b""));
}
