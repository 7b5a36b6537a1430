//! HTTP plumbing shared by the hosted providers.

use parley_core::error::ParleyError;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::Deserialize;
use std::time::Duration;

/// Builds a client with a per-request timeout.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ParleyError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| ParleyError::internal(format!("Failed to build HTTP client: {err}")))
}

/// Maps a transport failure (connect, timeout, body) to a generation error.
pub(crate) fn map_send_error(provider: &str, err: reqwest::Error) -> ParleyError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        format!("request failed: {err}")
    };
    ParleyError::Generation {
        provider: provider.to_string(),
        message,
        status_code: err.status().map(|s| s.as_u16()),
        is_retryable: err.is_connect() || err.is_timeout(),
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success response to a generation error.
///
/// Both providers wrap failures as `{"error": {"message": ...}}`; anything
/// else is reported verbatim.
pub(crate) fn map_http_error(
    provider: &str,
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> ParleyError {
    let mut message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    if let Some(delay) = retry_after {
        message = format!("{message} (retry after {}s)", delay.as_secs());
    }

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    ParleyError::Generation {
        provider: provider.to_string(),
        message,
        status_code: Some(status.as_u16()),
        is_retryable,
    }
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Reads the body of a failed response and maps it.
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> ParleyError {
    let status = response.status();
    let retry_after = parse_retry_after(response.headers().get("retry-after"));
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| format!("Failed to read {provider} error body"));
    map_http_error(provider, status, body, retry_after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_body_is_unwrapped() {
        let err = map_http_error(
            "openai",
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#.to_string(),
            Some(Duration::from_secs(7)),
        );

        match err {
            ParleyError::Generation {
                provider,
                message,
                status_code,
                is_retryable,
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(message, "Rate limit reached (retry after 7s)");
                assert_eq!(status_code, Some(429));
                assert!(is_retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let err = map_http_error("gemini", StatusCode::BAD_REQUEST, "bad".to_string(), None);
        assert!(err.is_generation());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn retry_after_accepts_seconds_only() {
        let seconds = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&seconds)), Some(Duration::from_secs(12)));

        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }
}
