//! Minimal page fetcher with safe logging.
//!
//! - One plain `GET` per call, URL handed to `reqwest` unchanged
//! - Blocking ([`BlockingHttpClient`]) and async ([`HttpClient`]) flavours
//! - Body decoded with the client's default charset resolution
//! - Status codes are recorded on [`FetchedPage`], never turned into errors
//! - Optional *raw* response logging via `PAGETEXT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! use pagetext_http::{BlockingHttpClient, FetchOpts, HttpError};
//!
//! let client = BlockingHttpClient::new(FetchOpts::default())?;
//! let page = client.get_page("https://example.com")?;
//! println!("{} -> {} bytes", page.status, page.body.len());
//! # Ok::<(), HttpError>(())
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response status, non-success statuses and (optionally) raw response
//! headers and body (target `http.raw`) when `PAGETEXT_HTTP_RAW=1`.

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::StatusCode;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "PAGETEXT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("set-cookie")
            {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    /// Anything the HTTP client reports: DNS, refused connections, TLS,
    /// timeouts, malformed URLs. Display and source are the client's own.
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("client build failed: {0}")]
    Build(String),
}

// ==============================
// Options & results
// ==============================

/// Client knobs. The default sets nothing, leaving every choice to `reqwest`.
///
/// ```
/// use pagetext_http::FetchOpts;
/// use std::time::Duration;
///
/// let opts = FetchOpts {
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// assert!(opts.user_agent.is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOpts {
    /// Total request timeout. `None` means the call is not time-bounded.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

/// A fetched response, body already decoded to text.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Final URL after the client's default redirect handling.
    pub url: String,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// Truncated body for log lines.
    pub fn snippet(&self) -> String {
        snip_body(&self.body)
    }
}

// ==============================
// Clients
// ==============================

/// Blocking client. Must not be driven from inside an async runtime; use
/// [`HttpClient`] there or move the call onto a blocking thread.
#[derive(Clone, Debug)]
pub struct BlockingHttpClient {
    inner: reqwest::blocking::Client,
}

impl BlockingHttpClient {
    pub fn new(opts: FetchOpts) -> Result<Self, HttpError> {
        // reqwest's blocking builder defaults to a 30s timeout; `None` clears it.
        let mut builder = reqwest::blocking::Client::builder().timeout(opts.timeout);
        if let Some(ua) = &opts.user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner })
    }

    /// GET `url` and decode the body, whatever the status.
    pub fn get_page(&self, url: &str) -> Result<FetchedPage, HttpError> {
        let req_id = request_id();
        tracing::debug!(req_id = %req_id, url = %url, "http.request.start");

        let t0 = std::time::Instant::now();
        let resp = self.inner.get(url).send().map_err(|e| {
            log_network_error(&req_id, &e, "http.network_error.send");
            HttpError::from(e)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().to_string();
        let body = resp.text().map_err(|e| {
            log_network_error(&req_id, &e, "http.network_error.body");
            HttpError::from(e)
        })?;

        let page = page_from_parts(final_url, status, &headers, body);
        log_response(&req_id, &page, &headers, t0.elapsed());
        Ok(page)
    }
}

/// Async client with the same contract as [`BlockingHttpClient`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(opts: FetchOpts) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ua) = &opts.user_agent {
            builder = builder.user_agent(ua.as_str());
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner })
    }

    /// GET `url` and decode the body, whatever the status.
    pub async fn get_page(&self, url: &str) -> Result<FetchedPage, HttpError> {
        let req_id = request_id();
        tracing::debug!(req_id = %req_id, url = %url, "http.request.start");

        let t0 = std::time::Instant::now();
        let resp = self.inner.get(url).send().await.map_err(|e| {
            log_network_error(&req_id, &e, "http.network_error.send");
            HttpError::from(e)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let final_url = resp.url().to_string();
        let body = resp.text().await.map_err(|e| {
            log_network_error(&req_id, &e, "http.network_error.body");
            HttpError::from(e)
        })?;

        let page = page_from_parts(final_url, status, &headers, body);
        log_response(&req_id, &page, &headers, t0.elapsed());
        Ok(page)
    }
}

// ==============================
// Helpers
// ==============================

fn page_from_parts(
    url: String,
    status: StatusCode,
    headers: &HeaderMap,
    body: String,
) -> FetchedPage {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    FetchedPage {
        url,
        status,
        content_type,
        body,
    }
}

// Lightweight request id without extra deps
fn request_id() -> String {
    format!(
        "r{:x}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    )
}

fn log_network_error(req_id: &str, err: &reqwest::Error, event: &'static str) {
    tracing::warn!(
        req_id = %req_id,
        timeout = err.is_timeout(),
        connect = err.is_connect(),
        message = %err,
        "{}",
        event
    );
}

fn log_response(req_id: &str, page: &FetchedPage, headers: &HeaderMap, elapsed: Duration) {
    let dur_ms = elapsed.as_millis() as u64;
    tracing::debug!(
        req_id = %req_id,
        status = %page.status,
        duration_ms = dur_ms,
        body_len = page.body.len(),
        content_type = ?page.content_type,
        "http.response"
    );

    if !page.status.is_success() {
        tracing::warn!(
            req_id = %req_id,
            status = %page.status,
            url = %page.url,
            body_snippet = %page.snippet(),
            "http.response.non_success"
        );
    }

    if raw_enabled() {
        let hdrs = redact_headers(headers);
        let truncated = page.body.len() > RAW_MAX_BODY;
        let text = if truncated {
            snip_to(&page.body, RAW_MAX_BODY)
        } else {
            page.body.as_str()
        };
        tracing::info!(
            target: "http.raw",
            %req_id,
            status = %page.status,
            duration_ms = dur_ms,
            headers = ?hdrs,
            body = %text,
            truncated
        );
    }
}

fn snip_body(body: &str) -> String {
    if body.len() > SNIPPET_MAX {
        format!("{}...", snip_to(body, SNIPPET_MAX))
    } else {
        body.to_string()
    }
}

/// Longest prefix of `s` no longer than `max` bytes that ends on a char boundary.
fn snip_to(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, HeaderValue, SET_COOKIE};

    #[test]
    fn redacts_sensitive_headers() {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        h.insert(SET_COOKIE, HeaderValue::from_static("sid=1"));
        h.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let out = redact_headers(&h);
        let get = |k: &str| out.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("authorization"), Some("<redacted>"));
        assert_eq!(get("set-cookie"), Some("<redacted>"));
        assert_eq!(get("content-type"), Some("text/html"));
    }

    #[test]
    fn snip_body_truncates_long_bodies() {
        let long = "x".repeat(SNIPPET_MAX + 10);
        let snip = snip_body(&long);
        assert_eq!(snip.len(), SNIPPET_MAX + 3);
        assert!(snip.ends_with("..."));

        assert_eq!(snip_body("short"), "short");
    }

    #[test]
    fn snippet_cuts_multibyte_bodies_on_char_boundaries() {
        // 'é' is two bytes, so the byte cap falls mid-char and must back off.
        let page = FetchedPage {
            url: "http://x/".into(),
            status: StatusCode::OK,
            content_type: None,
            body: format!("a{}", "é".repeat(SNIPPET_MAX)),
        };
        let snip = page.snippet();
        assert!(snip.ends_with("..."));
        assert_eq!(snip.len(), 1 + 2 * ((SNIPPET_MAX - 1) / 2) + 3);
    }

    #[test]
    fn snip_to_respects_char_boundaries() {
        // 'é' is two bytes; cutting at 1 must back off to 0.
        assert_eq!(snip_to("é", 1), "");
        assert_eq!(snip_to("aé", 2), "a");
        assert_eq!(snip_to("abc", 10), "abc");
    }

    #[test]
    fn raw_toggle_reads_env() {
        temp_env::with_var(RAW_ENV, Some("yes"), || assert!(raw_enabled()));
        temp_env::with_var(RAW_ENV, Some("0"), || assert!(!raw_enabled()));
        temp_env::with_var(RAW_ENV, None::<&str>, || assert!(!raw_enabled()));
    }

    #[test]
    fn content_type_is_captured() {
        let mut h = HeaderMap::new();
        h.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        let page = page_from_parts(
            "http://x/".into(),
            StatusCode::NOT_FOUND,
            &h,
            "<p>x</p>".into(),
        );
        assert_eq!(
            page.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(page.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_user_agent_is_a_build_error() {
        let opts = FetchOpts {
            user_agent: Some("bad\nagent".into()),
            ..Default::default()
        };
        assert!(matches!(
            BlockingHttpClient::new(opts.clone()),
            Err(HttpError::Build(_))
        ));
        assert!(matches!(HttpClient::new(opts), Err(HttpError::Build(_))));
    }
}
