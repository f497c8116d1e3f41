//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The JSON fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "new_password", "token"];

const REDACTED: &str = "********";

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// The `Authorization` header and passwords and tokens in JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    let head = format!(
        "{} {} {:?}\n{:#?}",
        parts.method,
        parts.uri,
        parts.version,
        redact_headers(&parts.headers)
    );
    log_body(
        "Received request",
        &head,
        &body_text(&parts.headers, &body_bytes),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    let head = format!(
        "{} {:?}\n{:#?}",
        parts.status,
        parts.version,
        redact_headers(&parts.headers)
    );
    log_body(
        "Sending response",
        &head,
        &body_text(&parts.headers, &body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Result<Bytes, Response> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|error| {
            tracing::error!("Could not read body for logging: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }
    headers
}

fn body_text(headers: &HeaderMap, body: &[u8]) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        redact_json(body)
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

/// Replace the values of password and token fields in a JSON body with asterisks.
///
/// Bodies that are not valid JSON are replaced entirely, since they may
/// still contain a password.
fn redact_json(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    let Ok(mut value) = serde_json::from_slice::<Value>(body) else {
        return "<unparsable JSON body>".to_owned();
    };

    if let Value::Object(map) = &mut value {
        for field in REDACTED_FIELDS {
            if let Some(secret) = map.get_mut(field) {
                *secret = Value::String(REDACTED.to_owned());
            }
        }
    }

    value.to_string()
}

fn log_body(message: &str, headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        let mut end = LOG_BODY_LENGTH_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }

        tracing::info!("{message}: {headers}\nbody: {}...", &body[..end]);
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}: {headers}\nbody: {body:?}");
    }
}
