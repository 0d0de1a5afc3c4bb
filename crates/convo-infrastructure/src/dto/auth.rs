//! Auth and error-body DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// The JSON shape the backend uses for failures.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Picks the most specific message from a failed response body:
    /// `error`, then `detail`, then `message`, else `HTTP <status>: <reason>`.
    pub fn message_for(status: u16, reason: &str, body: &str) -> String {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        parsed
            .error
            .or(parsed.detail)
            .or(parsed.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins() {
        let body = r#"{"error": "Session not found", "detail": "ignored"}"#;
        assert_eq!(ErrorBody::message_for(404, "Not Found", body), "Session not found");
    }

    #[test]
    fn detail_is_second_choice() {
        let body = r#"{"detail": "Validation failed"}"#;
        assert_eq!(ErrorBody::message_for(422, "Unprocessable", body), "Validation failed");
    }

    #[test]
    fn non_json_body_falls_back_to_status_line() {
        assert_eq!(
            ErrorBody::message_for(502, "Bad Gateway", "<html>oops</html>"),
            "HTTP 502: Bad Gateway"
        );
    }
}
