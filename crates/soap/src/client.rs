//! Transport adapter.
//!
//! [`SoapHttpClient`] runs the single linear pipeline of one call:
//!
//! ```text
//! build_request -> RequestDescriptor::target -> HttpTransport::execute -> extract_envelope
//! ```
//!
//! Every failure along the way, synchronous or asynchronous, comes back as the
//! `Err` of the returned future. Nothing is retried and nothing is kept between
//! calls.

use tracing::Instrument;

use crate::envelope::extract_envelope;
use crate::errors::HttpError;
use crate::request::{build_request, RequestDescriptor, RequestOptions};
use crate::transport::HttpTransport;
use crate::types::{HeaderSet, Payload, SoapResponse};

/// SOAP-oriented HTTP client over an injected [`HttpTransport`].
///
/// The transport is constructed once by the caller and reused for every
/// request; pooling and TLS are entirely its concern.
#[derive(Debug, Clone)]
pub struct SoapHttpClient<T> {
    transport: T,
}

impl<T: HttpTransport> SoapHttpClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the injected transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends one request and returns the raw response together with its body
    /// reduced to the SOAP envelope.
    ///
    /// `data` selects the method (`POST` when present). `extra_headers` and
    /// `extra_options` override the built defaults.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidRequest`] when the target cannot be dispatched; the
    ///   transport is not called.
    /// - Whatever the transport reports once the request is in flight.
    pub async fn request(
        &self,
        target_url: &str,
        data: Option<Payload>,
        extra_headers: Option<&HeaderSet>,
        extra_options: Option<&RequestOptions>,
    ) -> Result<SoapResponse, HttpError> {
        let descriptor = build_request(target_url, data, extra_headers, extra_options);
        let span = tracing::info_span!(
            "soap_http_request",
            request_id = %descriptor.id,
            url = %descriptor.url,
            method = %descriptor.method,
        );
        self.dispatch(descriptor).instrument(span).await
    }

    /// Error-first callback form of [`SoapHttpClient::request`].
    ///
    /// `callback` runs exactly once, after the request has settled, with either
    /// the response or the error.
    pub async fn request_with<F>(
        &self,
        target_url: &str,
        data: Option<Payload>,
        callback: F,
        extra_headers: Option<&HeaderSet>,
        extra_options: Option<&RequestOptions>,
    ) where
        F: FnOnce(Result<SoapResponse, HttpError>),
    {
        let outcome = self
            .request(target_url, data, extra_headers, extra_options)
            .await;
        callback(outcome);
    }

    async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<SoapResponse, HttpError> {
        if let Err(err) = descriptor.target() {
            tracing::warn!(error = %err, "Rejected HTTP request before dispatch");
            return Err(err);
        }

        let raw = match self.transport.execute(&descriptor).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    transport = err.is_transport(),
                    "HTTP request failed"
                );
                return Err(err);
            }
        };
        tracing::info!(
            status = raw.status,
            final_url = %raw.url,
            received_at = %raw.received_at,
            "HTTP request completed"
        );

        let body = extract_envelope(raw.body.clone());
        Ok(SoapResponse { raw, body })
    }
}
