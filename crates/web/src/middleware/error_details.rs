use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{DATABASE_ERRNO, ErrorDetail};

/// Rewrites storage failures to include their cause when `debug` is on.
pub async fn expose_error_details(
    State(debug): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let Some(ErrorDetail(detail)) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };
    if !debug {
        return response;
    }

    let body = json!({
        "errno": DATABASE_ERRNO,
        "error": "Database error",
        "details": detail
    });
    (response.status(), Json(body)).into_response()
}
