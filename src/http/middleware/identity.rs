use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
}

pub async fn require_identity(mut request: Request<Body>, next: Next) -> Response {
    let user_id = request
        .headers()
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok());

    match user_id {
        Some(user_id) => {
            request.extensions_mut().insert(Identity { user_id });
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": {
                    "code": "UNAUTHORIZED",
                    "message": "missing or invalid caller identity",
                    "details": null,
                }
            })),
        )
            .into_response(),
    }
}
