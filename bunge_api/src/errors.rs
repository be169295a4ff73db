//! Error types for the page fetcher.

/// Errors that can occur while fetching a page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },
    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    /// The TCP/TLS connection could not be established or was reset.
    #[error("connection to {url} failed")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Any other transport failure (body read, decoding, redirect loop).
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The URL could not be parsed or joined against the site base.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A transient failure persisted through every attempt.
    #[error("giving up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Request { url, source }
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Timeouts, connection failures, 429 and 5xx responses are transient.
    /// Any other 4xx is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Request { source, .. } => source.is_request() || source.is_body(),
            Self::InvalidUrl(_) | Self::Exhausted { .. } => false,
        }
    }

    /// The URL the failure relates to, when known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url }
            | Self::HttpStatus { url, .. }
            | Self::Connect { url, .. }
            | Self::Request { url, .. }
            | Self::Exhausted { url, .. } => Some(url),
            Self::InvalidUrl(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = FetchError::HttpStatus {
            status: 503,
            url: "https://example.test".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn too_many_requests_is_retryable() {
        let err = FetchError::HttpStatus {
            status: 429,
            url: "https://example.test".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_final() {
        for status in [400, 403, 404, 410] {
            let err = FetchError::HttpStatus {
                status,
                url: "https://example.test".into(),
            };
            assert!(!err.is_retryable(), "status {status} should not retry");
        }
    }

    #[test]
    fn timeout_is_retryable() {
        let err = FetchError::Timeout {
            url: "https://example.test".into(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.url(), Some("https://example.test"));
    }

    #[test]
    fn exhausted_is_final_and_keeps_last_error() {
        let err = FetchError::Exhausted {
            url: "https://example.test/a".into(),
            attempts: 3,
            last: Box::new(FetchError::Timeout {
                url: "https://example.test/a".into(),
            }),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("after 3 attempts"));
        assert!(err.to_string().contains("timed out"));
    }
}
