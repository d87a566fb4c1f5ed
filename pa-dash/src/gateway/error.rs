//! Gateway client errors

use thiserror::Error;

/// Errors from the remote mutation/aggregation gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP 503: the only status eligible for automatic retry
    #[error("Service temporarily unavailable (HTTP 503)")]
    Unavailable,

    /// Any other non-success HTTP status
    #[error("HTTP {status}")]
    Http { status: u16, body: String },

    /// Well-formed `ok: false` envelope; carries the gateway's `detail` verbatim
    #[error("{0}")]
    Rejected(String),

    /// Connection, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// `ok: true` without the `data` the endpoint must return
    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),

    /// Direct upload to the signed URL was refused
    #[error("Upload failed: HTTP {0}")]
    UploadStatus(u16),
}

impl GatewayError {
    /// Whether the retry combinator may try again
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable)
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Parse(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// Result type for gateway calls
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(GatewayError::Unavailable.is_transient());
        assert!(!GatewayError::Http {
            status: 500,
            body: String::new()
        }
        .is_transient());
        assert!(!GatewayError::Rejected("nope".into()).is_transient());
        assert!(!GatewayError::Network("reset".into()).is_transient());
    }

    #[test]
    fn test_rejected_displays_detail_verbatim() {
        let err = GatewayError::Rejected("Foto no encontrada".to_string());
        assert_eq!(err.to_string(), "Foto no encontrada");
        assert_eq!(
            GatewayError::Http {
                status: 502,
                body: "bad gateway".into()
            }
            .to_string(),
            "HTTP 502"
        );
    }
}
