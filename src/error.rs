use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::transport::{HttpResponse, TransportError};

pub type Result<T, E = ReportingError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ReportingError {
    /// The query is incomplete or a parameter is invalid. Nothing was sent.
    #[error("invalid report configuration: {0}")]
    Config(String),

    /// The server rejected the request with a 4xx response.
    #[error("Report server error: {message} (code: {code})")]
    Api {
        message: String,
        code: String,
        response: Box<HttpResponse>,
    },

    /// Any other non-success status.
    #[error("report server returned HTTP {status}")]
    Status {
        status: StatusCode,
        response: Box<HttpResponse>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode report response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Decoded JSON does not have the report shape.
    #[error("malformed report response: {0}")]
    Malformed(String),

    #[error("report contains no rows")]
    EmptyReport,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ReportingError {
    /// The server response that caused this error, if there was one.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ReportingError::Api { response, .. } | ReportingError::Status { response, .. } => {
                Some(&**response)
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(HttpResponse::status)
    }
}

// Some endpoints respond with {"code":...,"message":...},
// others wrap it as {"error": {"code":...,"message":...}}.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<Box<ApiErrorBody>>,
}

const MESSAGE_FALLBACK: &str = "for error detail see response";
const CODE_FALLBACK: &str = "-";

/// Builds [`ReportingError::Api`] from a 4xx response. The response is kept
/// intact so the caller can still read its body.
pub(crate) fn api_error(response: HttpResponse) -> ReportingError {
    let body = serde_json::from_slice::<ApiErrorBody>(response.body()).unwrap_or_default();
    let detail = match body.error {
        Some(inner) => *inner,
        None => body,
    };

    let message = detail
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| MESSAGE_FALLBACK.to_string());
    let code = match detail.code {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => CODE_FALLBACK.to_string(),
    };

    ReportingError::Api {
        message,
        code,
        response: Box::new(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

    fn response(status: u16, body: &str) -> HttpResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        HttpResponse::new(StatusCode::from_u16(status).unwrap(), headers, body)
    }

    #[test]
    fn nested_error_body() {
        let body = r#"{"error":{"code":"oauth_invalid","message":"Invalid token"}}"#;
        let err = api_error(response(400, body));
        let text = err.to_string();
        assert!(text.contains("oauth_invalid"), "{}", text);
        assert!(text.contains("Invalid token"), "{}", text);

        let resp = err.response().unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.text(), body);
        // reading twice yields the same bytes
        assert_eq!(resp.body(), body.as_bytes());
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn top_level_error_body_with_numeric_code() {
        let err = api_error(response(403, r#"{"code":403,"message":"Access denied"}"#));
        match err {
            ReportingError::Api { message, code, .. } => {
                assert_eq!(message, "Access denied");
                assert_eq!(code, "403");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_uses_fallbacks() {
        let err = api_error(response(404, "<html>not found</html>"));
        assert_eq!(
            err.to_string(),
            "Report server error: for error detail see response (code: -)"
        );
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
