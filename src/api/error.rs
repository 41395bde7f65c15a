use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a backend call.
///
/// Kept `Clone` so it can ride inside UI messages, which is why transport
/// errors are flattened to strings.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response at all (DNS, refused connection, TLS...)
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// A success response whose body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Reading or writing a local file around a request
    #[error("file error: {0}")]
    Io(String),
    /// An endpoint URL could not be built from the configured base
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if one was received
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Response body parsed as JSON.
    ///
    /// A body that is not JSON is returned as a JSON string so callers can
    /// treat "plain text error" and "JSON string error" the same way.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        let body = self.body()?;
        if body.is_empty() {
            return None;
        }
        let value = serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
        Some(value)
    }

    /// `"{status} - {body}"` as shown in upload/delete alerts
    pub fn status_summary(&self) -> Option<String> {
        match self {
            ApiError::Status { status, body } => Some(format!("{} - {}", status, body)),
            _ => None,
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        ApiError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_has_no_status() {
        let err = ApiError::Network("connection refused".into());
        assert_eq!(err.status(), None);
        assert_eq!(err.body_json(), None);
        assert_eq!(err.status_summary(), None);
    }

    #[test]
    fn test_json_body_is_parsed() {
        let err = ApiError::Status {
            status: 400,
            body: r#"{"detail": "nope"}"#.into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.body_json().unwrap()["detail"], "nope");
    }

    #[test]
    fn test_plain_text_body_becomes_string() {
        let err = ApiError::Status {
            status: 500,
            body: "Internal Server Error".into(),
        };
        assert_eq!(
            err.body_json(),
            Some(serde_json::Value::String("Internal Server Error".into()))
        );
        assert_eq!(err.status_summary().unwrap(), "500 - Internal Server Error");
    }
}
