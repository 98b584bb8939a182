use crate::domain::payment::{
    ConfirmPaymentRequest, InitiatePaymentRequest, RefundPaymentRequest,
};
use crate::http::middleware::identity::Identity;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

pub async fn initiate(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<InitiatePaymentRequest>,
) -> impl IntoResponse {
    match state.payment_service.initiate(identity.user_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> impl IntoResponse {
    match state.payment_service.confirm(identity.user_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(payment_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.payment_service.status(identity.user_id, payment_id).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    match state
        .payment_service
        .history(identity.user_id, page, per_page)
        .await
    {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn refund(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RefundPaymentRequest>,
) -> impl IntoResponse {
    match state.payment_service.refund(identity.user_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)).into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}
