// HTTP handlers. `/websub` is the callback the hub talks to: GET is the
// verification handshake, POST is a notification delivery. The remaining
// handlers are operational (metrics).
use crate::metrics::Metrics;
use axum::{
    body,
    extract::{Extension, Query, Request},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};
use std::borrow::Cow;
use std::sync::Arc;

/// Max bytes of a notification body echoed into the log.
pub const SNIPPET_LIMIT: usize = 1024;

/// What the callback handlers need to know. Built once at startup.
#[derive(Clone)]
pub struct CallbackState {
    pub verify_token: Arc<str>,
    pub metrics: Metrics,
}

/// Query string of a hub verification request. A repeated key keeps its
/// first value.
#[derive(Debug, Default)]
pub struct VerifyParams {
    pub mode: Option<String>,
    pub topic: Option<String>,
    pub challenge: Option<String>,
    pub lease_seconds: Option<String>,
    pub verify_token: Option<String>,
}

impl VerifyParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = VerifyParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "hub.mode" => &mut params.mode,
                "hub.topic" => &mut params.topic,
                "hub.challenge" => &mut params.challenge,
                "hub.lease_seconds" => &mut params.lease_seconds,
                "hub.verify_token" => &mut params.verify_token,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Dispatch on method: GET verifies, POST notifies, anything else is 405.
/// HEAD is rejected too; the hub never sends it.
pub async fn websub(Extension(state): Extension<CallbackState>, req: Request) -> Response {
    let method = req.method().clone();

    if method == Method::GET {
        return match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
            Ok(Query(pairs)) => verify(&state, VerifyParams::from_pairs(pairs)),
            Err(e) => (StatusCode::BAD_REQUEST, e.body_text()).into_response(),
        };
    }

    if method == Method::POST {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        // Best effort: a broken body is logged as empty, the hub still gets 204.
        // The read is unbounded on purpose; the hub is trusted to send feed-sized bodies.
        let bytes = body::to_bytes(req.into_body(), usize::MAX).await.unwrap_or_default();
        return notify(&state, &content_type, &bytes);
    }

    let mut res = (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response();
    res.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
    res
}

/// Answer the verification handshake. The body must be the challenge and
/// nothing else.
fn verify(state: &CallbackState, params: VerifyParams) -> Response {
    let supplied = params.verify_token.unwrap_or_default();
    tracing::info!(
        mode = params.mode.as_deref().unwrap_or(""),
        topic = params.topic.as_deref().unwrap_or(""),
        lease_seconds = params.lease_seconds.as_deref().unwrap_or(""),
        verify_token = %supplied,
        "[VERIFY]"
    );

    if token_rejected(&state.verify_token, &supplied) {
        state.metrics.verifications_rejected.inc();
        tracing::warn!(verify_token = %supplied, "[VERIFY] rejected: verify_token mismatch");
        return (StatusCode::FORBIDDEN, "bad verify_token").into_response();
    }

    state.metrics.verifications.inc();
    let challenge = params.challenge.unwrap_or_default();
    ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
}

/// A token only counts against the request when we have one configured and
/// the hub sent a different, non-empty one.
pub fn token_rejected(configured: &str, supplied: &str) -> bool {
    !configured.is_empty() && !supplied.is_empty() && supplied != configured
}

fn notify(state: &CallbackState, content_type: &str, bytes: &[u8]) -> Response {
    state.metrics.notifications.inc();
    state.metrics.notification_bytes.inc_by(bytes.len() as u64);

    tracing::info!(content_type, bytes = bytes.len(), "[NOTIFY]");
    tracing::info!("[NOTIFY] snippet:\n{}", snippet(bytes));

    StatusCode::NO_CONTENT.into_response()
}

/// First `SNIPPET_LIMIT` bytes of a payload, decoded lossily. A multi-byte
/// character cut at the boundary shows up as U+FFFD.
pub fn snippet(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes.len().min(SNIPPET_LIMIT);
    String::from_utf8_lossy(&bytes[..end])
}

/// Expose Prometheus text-format metrics gathered from the registry.
pub async fn metrics_handler(Extension(metrics): Extension<Metrics>) -> (HeaderMap, String) {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
    }
    let mut headers = HeaderMap::new();
    if let Ok(ct) = HeaderValue::from_str(encoder.format_type()) {
        headers.insert(header::CONTENT_TYPE, ct);
    }
    (headers, String::from_utf8_lossy(&buffer).into_owned())
}

pub async fn health() -> &'static str {
    "ok"
}
