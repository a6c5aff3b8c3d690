//! [`HttpTransport`] implementation over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::StatusCode;
use soap::{
    host_header, HeaderSet, HttpError, HttpResponse, HttpTransport, Method, Payload,
    RequestDescriptor, ResponseBody, Timestamp,
};
use url::Url;

use crate::config::ClientConfig;

/// Sends [`RequestDescriptor`]s with one shared `reqwest::Client`.
///
/// reqwest's own redirect handling is disabled; redirects are followed here so
/// that each descriptor's `max_redirects` is honoured.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    reject_error_status: bool,
}

impl ReqwestTransport {
    /// Builds the underlying client from `config`.
    ///
    /// # Errors
    ///
    /// [`HttpError::Configuration`] for an invalid default header or a client
    /// that reqwest refuses to build.
    pub fn new(config: ClientConfig) -> Result<Self, HttpError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let (name, value) = header_pair(name, value).map_err(|reason| {
                HttpError::Configuration {
                    message: format!("invalid default header: {reason}"),
                }
            })?;
            default_headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }

        let client = builder.build().map_err(|e| HttpError::Configuration {
            message: format!("cannot build HTTP client: {}", error_chain(&e)),
        })?;

        tracing::debug!(
            reject_error_status = config.reject_error_status,
            timeout_ms = ?config.timeout_ms,
            "HTTP transport ready"
        );
        Ok(Self {
            client,
            reject_error_status: config.reject_error_status,
        })
    }

    async fn send_once(
        &self,
        request: &RequestDescriptor,
        url: &Url,
        method: Method,
        headers: &HeaderSet,
        body: Option<&Payload>,
    ) -> Result<reqwest::Response, HttpError> {
        let method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, url.clone())
            .headers(header_map(url, headers)?);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            Some(Payload::Text(text)) => builder.body(text.clone()),
            Some(Payload::Structured(value)) => builder.json(value),
            None => builder,
        };

        builder.send().await.map_err(|e| send_error(url, &e))
    }

    async fn finish(&self, response: reqwest::Response) -> Result<HttpResponse, HttpError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let received_at = Timestamp::now();

        let mut headers = HeaderSet::new();
        for (name, value) in response.headers() {
            headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        let is_json = headers
            .get("Content-Type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout { url: url.clone() }
            } else {
                HttpError::Body {
                    url: url.clone(),
                    message: error_chain(&e),
                }
            }
        })?;

        let settled = HttpResponse {
            status,
            headers,
            body: classify_body(bytes.to_vec(), is_json),
            url,
            received_at,
        };
        if self.reject_error_status && !settled.is_success() {
            return Err(HttpError::Status {
                url: settled.url,
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(settled)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse, HttpError> {
        let mut url = request.target()?;
        let mut method = request.method;
        let mut headers = request.headers.clone();
        let mut body = request.body.clone();
        let mut redirects = 0u32;

        loop {
            let response = self
                .send_once(request, &url, method, &headers, body.as_ref())
                .await?;
            tracing::debug!(
                request_id = %request.id,
                status = response.status().as_u16(),
                url = %url,
                "Received HTTP response"
            );

            let Some(next) = redirect_target(&url, &response) else {
                return self.finish(response).await;
            };
            if redirects >= request.max_redirects {
                return Err(HttpError::TooManyRedirects {
                    url: url.to_string(),
                    limit: request.max_redirects,
                });
            }
            redirects += 1;

            if method == Method::Post
                && matches!(
                    response.status(),
                    StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
                )
            {
                method = Method::Get;
                body = None;
                headers.remove("Content-Length");
                headers.remove("Content-Type");
            }
            if let Some(host) = host_header(next.as_str(), &next) {
                headers.insert("Host", host);
            }

            tracing::debug!(
                request_id = %request.id,
                from = %url,
                to = %next,
                redirect = redirects,
                "Following redirect"
            );
            url = next;
        }
    }
}

/// Resolves the `Location` of a redirect response against the current URL.
fn redirect_target(current: &Url, response: &reqwest::Response) -> Option<Url> {
    if !matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current
        .join(location)
        .ok()
        .filter(|next| matches!(next.scheme(), "http" | "https"))
}

fn classify_body(bytes: Vec<u8>, is_json: bool) -> ResponseBody {
    if is_json {
        if let Ok(value) = serde_json::from_slice(&bytes) {
            return ResponseBody::Json(value);
        }
    }
    match String::from_utf8(bytes) {
        Ok(text) => ResponseBody::Text(text),
        Err(e) => ResponseBody::Binary(e.into_bytes()),
    }
}

fn header_map(url: &Url, headers: &HeaderSet) -> Result<HeaderMap, HttpError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let (name, value) = header_pair(name, value).map_err(|reason| {
            HttpError::InvalidRequest {
                url: url.to_string(),
                reason,
            }
        })?;
        map.append(name, value);
    }
    Ok(map)
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| format!("header name '{name}': {e}"))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| format!("value of header '{name}': {e}"))?;
    Ok((header_name, header_value))
}

fn send_error(url: &Url, err: &reqwest::Error) -> HttpError {
    let url = url.to_string();
    if err.is_timeout() {
        HttpError::Timeout { url }
    } else if err.is_builder() {
        HttpError::InvalidRequest {
            url,
            reason: error_chain(err),
        }
    } else {
        HttpError::Connection {
            url,
            message: error_chain(err),
        }
    }
}

/// Joins an error with its sources; reqwest's own message omits the cause.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_bodies_parse_only_when_announced() {
        assert_eq!(
            classify_body(br#"{"a":1}"#.to_vec(), true),
            ResponseBody::Json(serde_json::json!({ "a": 1 }))
        );
        assert_eq!(
            classify_body(br#"{"a":1}"#.to_vec(), false),
            ResponseBody::Text(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn broken_json_falls_back_to_text() {
        assert_eq!(
            classify_body(b"<s:Envelope/>".to_vec(), true),
            ResponseBody::Text("<s:Envelope/>".to_string())
        );
    }

    #[test]
    fn invalid_utf8_is_binary() {
        let bytes = vec![0xff, 0xfe, 0x00];
        assert_eq!(classify_body(bytes.clone(), false), ResponseBody::Binary(bytes));
    }

    #[test]
    fn header_map_rejects_invalid_names() {
        let url = Url::parse("http://example.com/").unwrap();
        let headers: HeaderSet = [("Bad Header", "x")].into_iter().collect();
        assert!(matches!(
            header_map(&url, &headers),
            Err(HttpError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn invalid_default_header_is_a_configuration_error() {
        let mut config = ClientConfig::default();
        config
            .default_headers
            .insert("X-Client".to_string(), "line\nbreak".to_string());
        assert!(matches!(
            ReqwestTransport::new(config),
            Err(HttpError::Configuration { .. })
        ));
    }
}
