use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::extract::extract_preview;
use crate::models::{PreviewOptions, PreviewResult, HTML_CONTENT_TYPE};

// ── Constants ────────────────────────────────────────────────────────────────

pub const USER_AGENT: &str = "link-preview-api/1.0";
/// Applied to every request, whatever the caller asked for.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECTS: usize = 10;

// ── Error type ───────────────────────────────────────────────────────────────

/// Why a link could not be loaded. Never leaves this module: every variant
/// becomes a `load_failed` record.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("{0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream returned an empty body")]
    EmptyBody,
    #[error("could not read body: {0}")]
    Body(String),
}

/// Outcome of a fetch that produced something usable.
#[derive(Debug)]
enum Fetched {
    /// Classified from headers alone; the body was never read.
    Media { resolved: String, content_type: String },
    Html(String),
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetches `options.url` and builds its preview.
///
/// Transport problems are reported through `load_failed`, never as an error.
pub async fn get_preview(options: impl Into<PreviewOptions>) -> PreviewResult {
    let options = with_fixed_timeout(options.into());

    match fetch(&options).await {
        Ok(Fetched::Media {
            resolved,
            content_type,
        }) => {
            debug!(url = %options.url, content_type = %content_type, "classified as media");
            PreviewResult::media(options.url, &resolved, &content_type)
        }
        Ok(Fetched::Html(body)) => extract_preview(&body, &options.url),
        Err(e) => {
            warn!(url = %options.url, error = %e, "preview load failed");
            PreviewResult::failed(options.url)
        }
    }
}

fn with_fixed_timeout(mut options: PreviewOptions) -> PreviewOptions {
    if let Some(requested) = options.timeout.filter(|t| *t != REQUEST_TIMEOUT) {
        debug!(?requested, "ignoring caller timeout");
    }
    options.timeout = Some(REQUEST_TIMEOUT);
    options
}

/// `true` when the body should be streamed and parsed. Any other declared
/// type is media; a missing or empty header counts as HTML.
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None | Some("") => true,
        Some(ct) => ct.starts_with(HTML_CONTENT_TYPE),
    }
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

async fn fetch(options: &PreviewOptions) -> Result<Fetched, FetchError> {
    let target =
        Url::parse(options.url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let client = build_client(options)?;

    let mut request = client.get(target.clone());
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    // Resolves as soon as the headers are in; the body is still on the wire.
    let response = request.send().await.map_err(describe_request_error)?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    if !is_html_content_type(content_type.as_deref()) {
        // Dropping the response aborts the transfer and frees the connection.
        drop(response);
        return Ok(Fetched::Media {
            resolved: target.to_string(),
            content_type: content_type.unwrap_or_default(),
        });
    }

    if response.status() != StatusCode::OK {
        return Err(FetchError::Status(response.status().as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?;
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(Fetched::Html(body))
}

fn build_client(options: &PreviewOptions) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(options.timeout.unwrap_or(REQUEST_TIMEOUT))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(options.user_agent.as_deref().unwrap_or(USER_AGENT))
        .default_headers(headers);

    if options.accept_invalid_certs {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

fn describe_request_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Request(format!("TimeoutError: {}", e))
    } else if e.is_connect() {
        FetchError::Request(format!("ConnectError: {}", e))
    } else {
        FetchError::Request(format!("RequestError: {}", e))
    }
}
