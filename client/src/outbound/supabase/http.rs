//! Request execution and HTTP error mapping shared by the adapters.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Transport or status failure of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HttpFailure {
    /// The request never produced a response.
    Connection(String),
    /// The backend answered with a non-success status.
    Status { status: StatusCode, message: String },
}

/// How a failed status should surface through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FailureKind {
    Unavailable,
    Rejected,
    RateLimited,
    Query,
}

impl HttpFailure {
    pub(super) fn kind(&self) -> FailureKind {
        match self {
            Self::Connection(_) => FailureKind::Unavailable,
            Self::Status { status, .. } => classify(*status),
        }
    }

    pub(super) fn into_message(self) -> String {
        match self {
            Self::Connection(message) | Self::Status { message, .. } => message,
        }
    }
}

fn classify(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Unavailable,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::CONFLICT => {
            FailureKind::Rejected
        }
        _ if status.is_client_error() => FailureKind::Query,
        _ => FailureKind::Unavailable,
    }
}

/// Send `builder` and return the body of a successful response.
pub(super) async fn execute(builder: RequestBuilder) -> Result<Vec<u8>, HttpFailure> {
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(HttpFailure::Status {
            status,
            message: status_message(status, body.as_ref()),
        });
    }
    Ok(body.to_vec())
}

/// Decode a JSON body, naming `what` in the error.
pub(super) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|err| format!("invalid {what} payload: {err}"))
}

fn transport_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Connection(format!("request timed out: {error}"))
    } else {
        HttpFailure::Connection(error.to_string())
    }
}

/// Human-readable message for a failed status.
///
/// Auth and REST errors carry their text under different keys; fall back to
/// a compact preview of the body, then to the bare status.
fn status_message(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|json| error_text(&json))
        .unwrap_or_else(|| body_preview(body));
    if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    }
}

fn error_text(json: &Value) -> Option<String> {
    ["msg", "error_description", "message", "error"]
        .into_iter()
        .filter_map(|key| json.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_owned)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, FailureKind::RateLimited)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, FailureKind::Unavailable)]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, FailureKind::Rejected)]
    #[case::conflict(StatusCode::CONFLICT, FailureKind::Rejected)]
    #[case::bad_request(StatusCode::BAD_REQUEST, FailureKind::Query)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, FailureKind::Unavailable)]
    fn classifies_statuses(#[case] status: StatusCode, #[case] expected: FailureKind) {
        let failure = HttpFailure::Status {
            status,
            message: "x".to_owned(),
        };
        assert_eq!(failure.kind(), expected);
    }

    #[rstest]
    #[case::gotrue(r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#, "status 400: Invalid login credentials")]
    #[case::oauth(r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#, "status 400: Email not confirmed")]
    #[case::postgrest(r#"{"code":"23505","message":"duplicate key value"}"#, "status 400: duplicate key value")]
    #[case::plain("upstream   gone", "status 400: upstream gone")]
    #[case::empty("", "status 400")]
    fn extracts_error_messages(#[case] body: &str, #[case] expected: &str) {
        assert_eq!(status_message(StatusCode::BAD_REQUEST, body.as_bytes()), expected);
    }

    #[rstest]
    fn truncates_long_bodies() {
        let body = "x".repeat(200);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }
}
