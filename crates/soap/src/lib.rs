//! HTTP transport helper for the REGON SOAP client.
//!
//! This crate turns a target URL and a payload into a fully specified HTTP
//! request, hands it to an injected transport, and cuts the SOAP envelope out
//! of whatever body comes back. Infrastructure crates implement
//! [`HttpTransport`]; they never add request-building rules.
//!
//! ## Architectural Layer
//!
//! **Request logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a request looks like; the `transport` crate defines *how*
//! it is sent.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`request`] | Request builder, [`RequestDescriptor`], [`RequestOptions`] |
//! | [`envelope`] | SOAP envelope extraction from response bodies |
//! | [`client`] | [`SoapHttpClient`], the build → send → normalise pipeline |
//! | [`transport`] | The [`HttpTransport`] port |
//! | [`identifiers`] | [`RequestId`] |
//! | [`types`] | Shared value types (`HeaderSet`, `Payload`, `HttpResponse`, etc.) |
//! | [`errors`] | [`HttpError`] |

pub mod client;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod request;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::SoapHttpClient;
pub use envelope::{extract_envelope, find_envelope};
pub use errors::{HttpError, UnknownMethod};
pub use identifiers::RequestId;
pub use request::{
    build_request, host_header, RequestDescriptor, RequestOptions, DEFAULT_MAX_REDIRECTS,
    USER_AGENT,
};
pub use transport::HttpTransport;
pub use types::{HeaderSet, HttpResponse, Method, Payload, ResponseBody, SoapResponse, Timestamp};
