//! REGON HTTP CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — command-line arguments plus an optional JSON
//!    [`transport::ClientConfig`] file.
//! 2. **Wire observability** — see [`observability`].
//! 3. **Construct infrastructure** — one [`transport::ReqwestTransport`]
//!    injected into a [`soap::SoapHttpClient`].
//! 4. **Run one request** — print the extracted envelope (or the raw body with
//!    `--raw`) to stdout and exit non-zero on failure.

mod observability;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use soap::{HeaderSet, Method, Payload, RequestOptions, SoapHttpClient};
use transport::{ClientConfig, ReqwestTransport};

use crate::observability::LogFormat;

/// Send one SOAP-over-HTTP request and print the response envelope.
#[derive(Debug, Parser)]
#[command(name = "regon-http", version, about)]
struct Cli {
    /// Target URL of the service endpoint.
    url: String,

    /// Request payload, sent as-is. Selects POST.
    #[arg(short, long, conflicts_with = "data_file")]
    data: Option<String>,

    /// Read the request payload from a file.
    #[arg(long, value_name = "PATH")]
    data_file: Option<PathBuf>,

    /// Extra request header; may be repeated.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Override the method chosen from the payload.
    #[arg(long)]
    method: Option<Method>,

    /// Maximum number of redirects to follow.
    #[arg(long)]
    max_redirects: Option<u32>,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Client configuration file (JSON).
    #[arg(long, env = "REGON_HTTP_CONFIG")]
    config: Option<PathBuf>,

    /// Log format on stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "REGON_LOG_FORMAT")]
    log_format: LogFormat,

    /// Print the body as received instead of the extracted envelope.
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let tracer_provider = observability::init(cli.log_format)?;

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(
            error = %format!("{e:#}"),
            status = failure_status(e),
            "regon-http failed"
        );
    }

    observability::shutdown(tracer_provider);
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path).await?,
        None => ClientConfig::default(),
    };
    let client = SoapHttpClient::new(ReqwestTransport::new(config)?);

    let data = match (cli.data, &cli.data_file) {
        (Some(text), _) => Some(Payload::Text(text)),
        (None, Some(path)) => Some(Payload::Text(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("cannot read payload from {}", path.display()))?,
        )),
        (None, None) => None,
    };
    let headers: HeaderSet = cli.headers.into_iter().collect();
    let options = RequestOptions {
        method: cli.method,
        max_redirects: cli.max_redirects,
        timeout_ms: cli.timeout_ms,
        ..RequestOptions::default()
    };

    let response = client
        .request(&cli.url, data, Some(&headers), Some(&options))
        .await
        .with_context(|| format!("request to {} failed", cli.url))?;

    let body = if cli.raw {
        &response.raw.body
    } else {
        &response.body
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{body}").context("failed to write response body")?;
    Ok(())
}

/// HTTP status of a failed call, when the service answered with one.
fn failure_status(error: &anyhow::Error) -> Option<u16> {
    error
        .downcast_ref::<soap::HttpError>()
        .and_then(soap::HttpError::status)
}

/// Parses `Name: value` into a header pair.
fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'NAME: VALUE', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_header_pairs() {
        assert_eq!(
            parse_header("sid: 0123456789abcdef").unwrap(),
            ("sid".to_string(), "0123456789abcdef".to_string())
        );
        assert_eq!(
            parse_header("SOAPAction:http://CIS/BIR/PUBL/2014/07/IUslugaBIRzewnPubl/Zaloguj").unwrap().1,
            "http://CIS/BIR/PUBL/2014/07/IUslugaBIRzewnPubl/Zaloguj"
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "regon-http",
            "https://wyszukiwarkaregon.stat.gov.pl/wsBIR/UslugaBIRzewnPubl.svc",
            "--data",
            "<soap:Envelope/>",
            "-H",
            "Content-Type: application/soap+xml; charset=utf-8",
            "-H",
            "sid: abc",
            "--method",
            "post",
            "--max-redirects",
            "3",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.data.as_deref(), Some("<soap:Envelope/>"));
        assert_eq!(cli.headers.len(), 2);
        assert_eq!(cli.method, Some(Method::Post));
        assert_eq!(cli.max_redirects, Some(3));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(!cli.raw);
    }

    #[test]
    fn failure_status_survives_context() {
        let err = anyhow::Error::new(soap::HttpError::Status {
            url: "http://example.com/".into(),
            status: 503,
            body: String::new(),
        })
        .context("request to http://example.com/ failed");
        assert_eq!(failure_status(&err), Some(503));

        let err = anyhow::anyhow!("cannot read payload");
        assert_eq!(failure_status(&err), None);
    }

    #[test]
    fn data_and_data_file_conflict() {
        let result = Cli::try_parse_from([
            "regon-http",
            "http://example.com/",
            "--data",
            "x",
            "--data-file",
            "payload.xml",
        ]);
        assert!(result.is_err());
    }
}
