//! Shared value types for requests and responses.
//!
//! These are the transport-agnostic shapes passed between the request builder,
//! the [`crate::HttpTransport`] port, and the envelope normaliser. None of them
//! carry I/O handles; the concrete client in the `transport` crate converts
//! them to and from its own types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::UnknownMethod;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP method of an outgoing request.
///
/// The builder only ever selects `GET` (no payload) or `POST` (payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the method token as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("GET") {
            Ok(Method::Get)
        } else if s.eq_ignore_ascii_case("POST") {
            Ok(Method::Post)
        } else {
            Err(UnknownMethod(s.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Ordered collection of HTTP header `(name, value)` pairs.
///
/// Names compare case-insensitively. [`HeaderSet::insert`] is last-write-wins:
/// an existing entry keeps its position but takes the new spelling and value.
/// [`HeaderSet::append`] keeps duplicates, which is what response headers such
/// as `Set-Cookie` need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(Vec<(String, String)>);

impl HeaderSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts a header, replacing every existing entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                self.0[index] = (name.clone(), value);
                let mut seen = 0usize;
                self.0.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.0.push((name, value)),
        }
    }

    /// Appends a header without touching existing entries of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Returns the first value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.0[i].1.as_str())
    }

    /// Returns `true` if a header named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Removes every entry named `name`, returning the first removed value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.position(name).map(|i| self.0[i].1.clone());
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        first
    }

    /// Returns a new set holding `self` with `overrides` applied on top.
    ///
    /// Neither input is modified.
    pub fn merged(&self, overrides: &HeaderSet) -> HeaderSet {
        let mut out = self.clone();
        for (name, value) in overrides.iter() {
            out.insert(name, value);
        }
        out
    }

    /// Iterates the headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// Outgoing request payload.
///
/// `Text` is sent verbatim (typically a SOAP XML envelope). `Structured` is
/// handed to the transport, which decides how to encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Structured(serde_json::Value),
}

impl Payload {
    /// Returns `true` for an empty text payload, which selects `GET` just like
    /// an absent one.
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Text(text) if text.is_empty())
    }

    /// Returns the payload text when it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Structured(_) => None,
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Structured(value)
    }
}

/// Body of a received response.
///
/// Only `Text` is ever inspected for a SOAP envelope; the other variants pass
/// through [`crate::extract_envelope`] untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
    Binary(Vec<u8>),
}

impl std::fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Text(text) => f.write_str(text),
            ResponseBody::Json(value) => write!(f, "{value}"),
            ResponseBody::Binary(bytes) => write!(f, "<{} bytes of binary data>", bytes.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A settled HTTP response as returned by an [`crate::HttpTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Numeric status code of the final response (after redirects).
    pub status: u16,

    /// Response headers in the order received.
    pub headers: HeaderSet,

    /// Response body, exactly as received.
    pub body: ResponseBody,

    /// URL of the final response; differs from the request URL after redirects.
    pub url: String,

    /// When the response headers were received.
    pub received_at: Timestamp,
}

impl HttpResponse {
    /// Returns `true` for a `2xx` status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outcome of a successful [`crate::SoapHttpClient::request`] call.
///
/// `raw.body` is the body as received; `body` is the same body reduced to its
/// SOAP envelope where one was found.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapResponse {
    pub raw: HttpResponse,
    pub body: ResponseBody,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
