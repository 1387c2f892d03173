use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use changereq_slack::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::routes::ErrorResponse;
use crate::state::AppState;

/// Slack never sends bodies anywhere near this size.
const MAX_BODY_BYTES: usize = 1024 * 1024;

async fn buffer_body(request: Request) -> Result<(axum::http::request::Parts, Bytes), Response> {
    let (parts, body) = request.into_parts();
    match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => Ok((parts, bytes)),
        Err(error) => {
            warn!(
                event_name = "http.request.body_rejected",
                error = %error,
                "request body could not be buffered"
            );
            Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse { error: "request body too large".to_string() }),
            )
                .into_response())
        }
    }
}

/// Logs method, URI, headers and body of every inbound request inside a
/// span carrying a fresh correlation id.
pub async fn log_request(request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4();
    let span = info_span!("request", correlation_id = %correlation_id);

    async move {
        let (parts, body) = match buffer_body(request).await {
            Ok(buffered) => buffered,
            Err(response) => return response,
        };

        info!(
            event_name = "http.request.received",
            method = %parts.method,
            uri = %parts.uri,
            headers = ?parts.headers,
            body = %String::from_utf8_lossy(&body),
            "inbound request"
        );

        let response = next.run(Request::from_parts(parts, Body::from(body))).await;
        info!(
            event_name = "http.request.completed",
            status = response.status().as_u16(),
            "request handled"
        );
        response
    }
    .instrument(span)
    .await
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Rejects requests whose Slack signature does not check out. A no-op when
/// no signing secret is configured.
pub async fn verify_signature(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(verifier) = state.verifier.clone() else {
        return next.run(request).await;
    };

    let (parts, body) = match buffer_body(request).await {
        Ok(buffered) => buffered,
        Err(response) => return response,
    };

    let verdict = verifier.verify(
        header_str(&parts.headers, TIMESTAMP_HEADER),
        header_str(&parts.headers, SIGNATURE_HEADER),
        &body,
        Utc::now().timestamp(),
    );
    if let Err(error) = verdict {
        warn!(
            event_name = "http.request.signature_rejected",
            uri = %parts.uri,
            error = %error,
            "rejecting request with invalid Slack signature"
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse { error: "invalid request signature".to_string() }),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(body))).await
}
