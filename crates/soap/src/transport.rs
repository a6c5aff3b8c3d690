//! The HTTP client capability port.
//!
//! [`HttpTransport`] is the seam between the pure request/response logic in
//! this crate and whatever actually performs network I/O. The `transport`
//! crate implements it over `reqwest`; tests implement it in memory.
//!
//! ## Contract
//!
//! - `execute` is called with a descriptor whose [`RequestDescriptor::target`]
//!   has already succeeded.
//! - Implementations own TLS, redirects (bounded by
//!   [`RequestDescriptor::max_redirects`]), connection pooling, and timeouts.
//! - The returned [`HttpResponse::body`] must be the body as received; the
//!   caller does its own normalisation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::HttpError;
use crate::request::RequestDescriptor;
use crate::types::HttpResponse;

/// Performs one HTTP exchange for a built [`RequestDescriptor`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and waits for the complete response.
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, HttpError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, HttpError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Box<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, HttpError> {
        (**self).execute(request).await
    }
}
