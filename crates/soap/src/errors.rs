//! Error types for the request/response cycle.
//!
//! [`HttpError`] is the single error surfaced by [`crate::SoapHttpClient`]. It
//! covers both build-time failures (raised before any network activity) and
//! transport failures reported by an [`crate::HttpTransport`].
//!
//! Envelope extraction has no error type: a body without a recognisable
//! envelope is returned untouched.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Request/response errors
// ---------------------------------------------------------------------------

/// Errors that end a single request/response cycle.
///
/// No variant is retried at this layer; every one is reported to the immediate
/// caller.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request descriptor cannot be dispatched (unparseable URL, missing
    /// host, unsupported scheme).
    ///
    /// Produced before the transport is invoked; no network call is made.
    #[error("Invalid request target '{url}': {reason}")]
    InvalidRequest {
        /// The target URL as it appears on the descriptor.
        url: String,
        /// Why the descriptor was rejected.
        reason: String,
    },

    /// The connection could not be established or broke mid-request.
    #[error("Connection to {url} failed: {message}")]
    Connection {
        /// URL the transport was talking to when it failed.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// URL the transport was talking to when it timed out.
        url: String,
    },

    /// The server redirected more times than the descriptor allows.
    #[error("Too many redirects from {url} (limit {limit})")]
    TooManyRedirects {
        /// URL of the response that would have exceeded the limit.
        url: String,
        /// The descriptor's `max_redirects`.
        limit: u32,
    },

    /// The server answered with a non-2xx status and the transport is
    /// configured to treat that as a failure.
    ///
    /// The body is kept so callers can still read a SOAP fault.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// URL of the failing response.
        url: String,
        /// Numeric status code.
        status: u16,
        /// Response body decoded lossily as UTF-8.
        body: String,
    },

    /// The response body could not be read.
    #[error("Failed to read response body from {url}: {message}")]
    Body {
        /// URL of the response.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// The transport could not be constructed from its configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl HttpError {
    /// Returns `true` for failures raised by the transport once the request
    /// was dispatched, as opposed to build-time or configuration failures.
    pub fn is_transport(&self) -> bool {
        !matches!(
            self,
            HttpError::InvalidRequest { .. } | HttpError::Configuration { .. }
        )
    }

    /// Returns the HTTP status for [`HttpError::Status`].
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn invalid_request(url: &str, reason: impl Into<String>) -> Self {
        HttpError::InvalidRequest {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// A method token other than `GET` or `POST`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown HTTP method '{0}' (expected GET or POST)")]
pub struct UnknownMethod(pub String);
