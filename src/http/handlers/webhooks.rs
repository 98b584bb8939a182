use crate::domain::payment::{ErrorEnvelope, ErrorPayload, PaymentMethod};
use crate::reconcile::reconciler::ReconcileOutcome;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};

pub async fn card(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    ingest(state, PaymentMethod::CardProcessor, headers, body).await
}

pub async fn wallet(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    ingest(state, PaymentMethod::WalletProcessor, headers, body).await
}

pub async fn hash(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    ingest(state, PaymentMethod::HashProcessor, headers, body).await
}

async fn ingest(
    state: AppState,
    method: PaymentMethod,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let adapter = state.gateways.for_method(method);

    let verified = match adapter.verify_webhook(&body, &headers).await {
        Ok(verified) => verified,
        Err(e) => {
            warn!(gateway = adapter.name(), error = %e, "webhook verification could not be completed");
            false
        }
    };
    if !verified {
        warn!(gateway = adapter.name(), "rejected webhook with invalid signature");
        return (
            StatusCode::UNAUTHORIZED,
            Json(envelope("SIGNATURE_INVALID", "webhook signature verification failed")),
        )
            .into_response();
    }

    let event = match adapter.parse_webhook(&body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            return (StatusCode::OK, Json(json!({ "received": true, "handled": false })))
                .into_response();
        }
        Err(e) => {
            warn!(gateway = adapter.name(), error = %e, "webhook payload could not be decoded");
            return (
                StatusCode::BAD_REQUEST,
                Json(envelope("VALIDATION_ERROR", "webhook payload could not be decoded")),
            )
                .into_response();
        }
    };

    match state.reconciler.apply(method, &event).await {
        Ok(ReconcileOutcome::Applied { status }) => {
            info!(
                gateway = adapter.name(),
                gateway_transaction_id = %event.gateway_transaction_id,
                status = status.as_str(),
                "webhook event applied"
            );
        }
        Ok(ReconcileOutcome::DuplicateNoOp { .. }) => {
            info!(
                gateway = adapter.name(),
                gateway_transaction_id = %event.gateway_transaction_id,
                "duplicate webhook delivery recorded"
            );
        }
        Ok(ReconcileOutcome::IgnoredTerminal { status }) => {
            warn!(
                gateway = adapter.name(),
                gateway_transaction_id = %event.gateway_transaction_id,
                status = status.as_str(),
                "webhook event ignored for terminal payment"
            );
        }
        Ok(ReconcileOutcome::NotFound) => {}
        Err(e) => {
            // The provider must not retry-storm on our bugs; only signature
            // failures earn a non-2xx.
            error!(gateway = adapter.name(), error = %e, "webhook processing failed");
        }
    }

    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

fn envelope(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        },
    }
}
