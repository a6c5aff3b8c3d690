//! Response normaliser.
//!
//! SOAP services behind proxies or MTOM framing often return the envelope
//! wrapped in extra bytes: multipart boundaries, stray whitespace, trailing
//! garbage. [`extract_envelope`] cuts a textual body down to:
//!
//! ```text
//! [<?...?> whitespace*] <PREFIX:Envelope ... </PREFIX:Envelope>
//! ```
//!
//! The match is case-insensitive (Unicode), starts at the leftmost `<` that
//! can open a match, and extends to the *last* closing tag carrying the same
//! prefix. A body without such a span is returned unchanged.
//!
//! The closing tag refers back to the opening prefix, so the pattern is
//! compiled with `fancy-regex`.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::types::ResponseBody;

const ENVELOPE_PATTERN: &str = r"(?is)(?:<\?[^?]*\?>\s*)?<([^:]*):Envelope.*</\1:Envelope>";

static ENVELOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(ENVELOPE_PATTERN).expect("envelope pattern must compile"));

/// Reduces a textual body to its SOAP envelope.
///
/// Non-textual bodies, and textual ones without an envelope, come back as
/// they went in.
pub fn extract_envelope(body: ResponseBody) -> ResponseBody {
    match body {
        ResponseBody::Text(text) => {
            tracing::debug!(body = %text, "HTTP response body");
            match find_envelope(&text) {
                Some(envelope) => ResponseBody::Text(envelope.to_string()),
                None => ResponseBody::Text(text),
            }
        }
        other => other,
    }
}

/// Returns the envelope span of `text`, XML declaration included.
///
/// A body too large for the matcher's backtracking budget is treated as
/// having no envelope.
pub fn find_envelope(text: &str) -> Option<&str> {
    match ENVELOPE.find(text) {
        Ok(found) => found.map(|m| m.as_str()),
        Err(e) => {
            tracing::warn!(
                error = %e,
                body_len = text.len(),
                "Envelope matching aborted; body left untouched"
            );
            None
        }
    }
}
