//! REGON HTTP transport adapter.
//!
//! Implements the [`soap::HttpTransport`] trait over `reqwest`. A single
//! [`ReqwestTransport`] is built at startup from a [`ClientConfig`] and shared
//! by every request; connection pooling is left to reqwest.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** TLS, redirect following, timeouts, status handling, and
//! body decoding all live here. The [`soap`] crate sees only
//! [`soap::HttpTransport`].
//!
//! ## Redirects
//!
//! Followed manually, up to the descriptor's `max_redirects`:
//!
//! | Status | Method after redirect | Body |
//! |--------|-----------------------|------|
//! | 301, 302, 303 after `POST` | `GET` | dropped, with its content headers |
//! | 307, 308 | unchanged | resent |
//!
//! The `Host` header is recomputed from the redirect target for every hop. A
//! `Host` set by the caller applies to the first request only and is replaced
//! on the first redirect.

pub mod client;
pub mod config;

pub use client::ReqwestTransport;
pub use config::ClientConfig;
