//! Request builder.
//!
//! [`build_request`] turns a target URL, an optional payload, and caller
//! overrides into a [`RequestDescriptor`]: a complete, transport-agnostic
//! description of the outgoing HTTP request.
//!
//! Building never fails. A URL that cannot be parsed still produces a
//! descriptor (without a `Host` header); [`RequestDescriptor::target`] is where
//! such a descriptor is rejected, before any transport is involved.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::HttpError;
use crate::identifiers::RequestId;
use crate::types::{HeaderSet, Method, Payload};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Client identifier sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("regon/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml,text/xml;q=0.9,*/*;q=0.8";
pub const DEFAULT_ACCEPT_ENCODING: &str = "none";
pub const DEFAULT_ACCEPT_CHARSET: &str = "utf-8";
pub const DEFAULT_CONNECTION: &str = "close";

/// Content type announced for textual payloads.
pub const TEXT_PAYLOAD_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Redirects followed before the transport gives up.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Caller overrides applied on top of the built descriptor.
///
/// Every field is optional; a `Some` replaces the descriptor's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestOptions {
    /// Replaces the target URL. Headers derived from the original URL (`Host`)
    /// are left as built; override them through the extra headers if needed.
    pub url: Option<String>,

    /// Replaces the method chosen from the payload.
    pub method: Option<Method>,

    /// Replaces [`DEFAULT_MAX_REDIRECTS`].
    pub max_redirects: Option<u32>,

    /// Per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// A fully specified outgoing HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Correlates every tracing event of this call.
    pub id: RequestId,

    /// Target URL: the normalised form when it parsed, otherwise the raw input.
    pub url: String,

    pub method: Method,

    /// Defaults merged with the caller's extra headers.
    pub headers: HeaderSet,

    /// Payload, sent without further encoding when textual.
    pub body: Option<Payload>,

    pub max_redirects: u32,

    /// Per-request timeout; `None` defers to the transport's own setting.
    pub timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Parses and validates the target URL.
    ///
    /// Only absolute `http`/`https` URLs with a host can be dispatched.
    pub fn target(&self) -> Result<Url, HttpError> {
        let url = Url::parse(&self.url)
            .map_err(|e| HttpError::invalid_request(&self.url, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::invalid_request(
                &self.url,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(HttpError::invalid_request(&self.url, "missing host"));
        }
        Ok(url)
    }
}

/// Builds the descriptor for one request.
///
/// - method is `POST` when `data` is present and not an empty string, `GET`
///   otherwise;
/// - textual data, the empty string included, adds `Content-Length` (UTF-8
///   byte length) and a form content type;
/// - `extra_headers` and `extra_options` win over the defaults on conflict.
pub fn build_request(
    target_url: &str,
    data: Option<Payload>,
    extra_headers: Option<&HeaderSet>,
    extra_options: Option<&RequestOptions>,
) -> RequestDescriptor {
    let parsed = Url::parse(target_url).ok();

    let mut headers = default_headers(target_url, parsed.as_ref());
    if let Some(text) = data.as_ref().and_then(Payload::as_text) {
        headers.insert("Content-Length", text.len().to_string());
        headers.insert("Content-Type", TEXT_PAYLOAD_CONTENT_TYPE);
    }

    // An empty string keeps its content headers but selects GET and sends no body.
    let data = data.filter(|payload| !payload.is_empty());
    let method = if data.is_some() {
        Method::Post
    } else {
        Method::Get
    };

    if let Some(extra) = extra_headers {
        headers = headers.merged(extra);
    }

    let options = extra_options.cloned().unwrap_or_default();
    let descriptor = RequestDescriptor {
        id: RequestId::new_random(),
        url: options.url.unwrap_or_else(|| {
            parsed
                .as_ref()
                .map_or_else(|| target_url.to_string(), |u| u.as_str().to_string())
        }),
        method: options.method.unwrap_or(method),
        headers,
        body: data,
        max_redirects: options.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
        timeout: options.timeout_ms.map(Duration::from_millis),
    };

    tracing::debug!(
        request_id = %descriptor.id,
        url = %descriptor.url,
        method = %descriptor.method,
        headers = ?descriptor.headers,
        max_redirects = descriptor.max_redirects,
        "Built HTTP request"
    );
    descriptor
}

fn default_headers(raw: &str, parsed: Option<&Url>) -> HeaderSet {
    let mut headers = HeaderSet::new();
    headers.insert("User-Agent", USER_AGENT);
    headers.insert("Accept", DEFAULT_ACCEPT);
    headers.insert("Accept-Encoding", DEFAULT_ACCEPT_ENCODING);
    headers.insert("Accept-Charset", DEFAULT_ACCEPT_CHARSET);
    headers.insert("Connection", DEFAULT_CONNECTION);
    if let Some(host) = parsed.and_then(|url| host_header(raw, url)) {
        headers.insert("Host", host);
    }
    headers
}

/// Returns `hostname` or `hostname:port` for the `Host` header.
///
/// The port is included whenever `raw` spells one out, even if it equals the
/// scheme's default (which [`Url`] normalises away).
pub fn host_header(raw: &str, url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match explicit_port(raw, url) {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn explicit_port(raw: &str, url: &Url) -> Option<u16> {
    if let Some(port) = url.port() {
        return Some(port);
    }
    let default = url.port_or_known_default()?;
    let (_, rest) = raw.trim_start().split_once("//")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let port = match host_port.rfind(']') {
        Some(end) => host_port[end + 1..].strip_prefix(':')?,
        None => host_port.rsplit_once(':')?.1,
    };
    port.parse::<u16>().ok().filter(|p| *p == default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_of(url: &str) -> HeaderSet {
        build_request(url, None, None, None).headers
    }

    #[test]
    fn host_includes_explicit_port() {
        assert_eq!(
            headers_of("http://example.com:8080/ws?wsdl").get("Host"),
            Some("example.com:8080")
        );
    }

    #[test]
    fn host_omits_port_when_absent() {
        assert_eq!(
            headers_of("https://wyszukiwarkaregon.stat.gov.pl/wsBIR/UslugaBIRzewnPubl.svc")
                .get("Host"),
            Some("wyszukiwarkaregon.stat.gov.pl")
        );
    }

    #[test]
    fn host_keeps_explicit_default_port() {
        assert_eq!(headers_of("https://example.com:443/").get("Host"), Some("example.com:443"));
        assert_eq!(headers_of("http://user:pw@example.com:80/x").get("Host"), Some("example.com:80"));
    }

    #[test]
    fn host_for_ipv6_literal() {
        assert_eq!(headers_of("http://[::1]:8080/").get("Host"), Some("[::1]:8080"));
        assert_eq!(headers_of("http://[::1]/").get("Host"), Some("[::1]"));
    }

    #[test]
    fn absent_data_selects_get_without_body() {
        let descriptor = build_request("http://example.com/", None, None, None);
        assert_eq!(descriptor.method, Method::Get);
        assert!(descriptor.body.is_none());
        assert!(!descriptor.headers.contains("Content-Length"));
        assert!(!descriptor.headers.contains("Content-Type"));
    }

    #[test]
    fn empty_text_selects_get() {
        let descriptor = build_request("http://example.com/", Some("".into()), None, None);
        assert_eq!(descriptor.method, Method::Get);
        assert!(descriptor.body.is_none());
        assert_eq!(descriptor.headers.get("Content-Length"), Some("0"));
    }

    #[test]
    fn empty_text_keeps_form_content_type() {
        let descriptor = build_request("http://example.com/", Some("".into()), None, None);
        assert_eq!(
            descriptor.headers.get("Content-Type"),
            Some(TEXT_PAYLOAD_CONTENT_TYPE)
        );
    }

    #[test]
    fn text_data_selects_post_with_content_headers() {
        let envelope = "<soap:Envelope><soap:Body/></soap:Envelope>";
        let descriptor = build_request("http://example.com/", Some(envelope.into()), None, None);

        assert_eq!(descriptor.method, Method::Post);
        assert_eq!(descriptor.body, Some(Payload::Text(envelope.to_string())));
        assert_eq!(
            descriptor.headers.get("Content-Length"),
            Some(envelope.len().to_string().as_str())
        );
        assert_eq!(
            descriptor.headers.get("Content-Type"),
            Some(TEXT_PAYLOAD_CONTENT_TYPE)
        );
    }

    #[test]
    fn content_length_counts_utf8_bytes() {
        let data = "café";
        assert_eq!(data.chars().count(), 4);

        let descriptor = build_request("http://example.com/", Some(data.into()), None, None);
        assert_eq!(descriptor.headers.get("Content-Length"), Some("5"));
    }

    #[test]
    fn structured_data_posts_without_content_headers() {
        let descriptor = build_request(
            "http://example.com/",
            Some(serde_json::json!({ "nip": "5261040828" }).into()),
            None,
            None,
        );
        assert_eq!(descriptor.method, Method::Post);
        assert!(!descriptor.headers.contains("Content-Length"));
        assert!(!descriptor.headers.contains("Content-Type"));
    }

    #[test]
    fn default_headers_are_present() {
        let headers = headers_of("http://example.com/");
        assert_eq!(headers.get("User-Agent"), Some(USER_AGENT));
        assert!(USER_AGENT.starts_with("regon/"));
        assert_eq!(headers.get("Accept"), Some(DEFAULT_ACCEPT));
        assert_eq!(headers.get("Accept-Encoding"), Some("none"));
        assert_eq!(headers.get("Accept-Charset"), Some("utf-8"));
        assert_eq!(headers.get("Connection"), Some("close"));
        assert_eq!(headers.get("Host"), Some("example.com"));
    }

    #[test]
    fn extra_headers_override_only_their_names() {
        let extra: HeaderSet = [
            ("connection", "keep-alive"),
            ("Content-Type", "application/soap+xml; charset=utf-8"),
            ("sid", "abc123"),
        ]
        .into_iter()
        .collect();

        let descriptor =
            build_request("http://example.com/", Some("<x/>".into()), Some(&extra), None);
        let headers = &descriptor.headers;

        assert_eq!(headers.get("Connection"), Some("keep-alive"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("application/soap+xml; charset=utf-8")
        );
        assert_eq!(headers.get("sid"), Some("abc123"));
        assert_eq!(headers.get("Accept-Charset"), Some("utf-8"));
        assert_eq!(headers.get("Content-Length"), Some("4"));
        assert_eq!(headers.get("User-Agent"), Some(USER_AGENT));
    }

    #[test]
    fn extra_options_override_descriptor_fields() {
        let options = RequestOptions {
            url: Some("http://other.example.com/svc".to_string()),
            method: Some(Method::Post),
            max_redirects: Some(0),
            timeout_ms: Some(1500),
        };

        let descriptor = build_request("http://example.com/", None, None, Some(&options));

        assert_eq!(descriptor.url, "http://other.example.com/svc");
        assert_eq!(descriptor.method, Method::Post);
        assert_eq!(descriptor.max_redirects, 0);
        assert_eq!(descriptor.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(descriptor.headers.get("Host"), Some("example.com"));
    }

    #[test]
    fn unset_options_keep_defaults() {
        let options = RequestOptions {
            timeout_ms: Some(10),
            ..RequestOptions::default()
        };
        let descriptor = build_request("http://example.com", None, None, Some(&options));

        assert_eq!(descriptor.url, "http://example.com/");
        assert_eq!(descriptor.method, Method::Get);
        assert_eq!(descriptor.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn options_deserialise_from_json() {
        let options: RequestOptions =
            serde_json::from_str(r#"{ "method": "GET", "max_redirects": 3 }"#).unwrap();
        assert_eq!(options.method, Some(Method::Get));
        assert_eq!(options.max_redirects, Some(3));
        assert!(serde_json::from_str::<RequestOptions>(r#"{ "retries": 3 }"#).is_err());
    }

    #[test]
    fn malformed_url_builds_without_host() {
        let descriptor = build_request("not a url", Some("<x/>".into()), None, None);

        assert_eq!(descriptor.url, "not a url");
        assert_eq!(descriptor.method, Method::Post);
        assert!(!descriptor.headers.contains("Host"));
        assert!(matches!(
            descriptor.target(),
            Err(HttpError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn target_rejects_non_http_schemes() {
        let descriptor = build_request("ftp://example.com/file", None, None, None);
        let err = descriptor.target().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn target_accepts_http_urls() {
        let descriptor = build_request("https://example.com:8443/a?b=c#d", None, None, None);
        let url = descriptor.target().unwrap();
        assert_eq!(url.port(), Some(8443));
        assert_eq!(url.path(), "/a");
        assert_eq!(url.query(), Some("b=c"));
        assert_eq!(url.fragment(), Some("d"));
    }

    #[test]
    fn each_build_gets_a_fresh_id() {
        let a = build_request("http://example.com/", None, None, None);
        let b = build_request("http://example.com/", None, None, None);
        assert_ne!(a.id, b.id);
    }
}
