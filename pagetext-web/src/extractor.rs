use pagetext_http::{BlockingHttpClient, FetchOpts, FetchedPage, HttpClient, HttpError};

use crate::extract::{paragraph_text, paragraphs};

/// Fetches a page and returns the concatenated text of its paragraphs.
///
/// The response status is not inspected: a 404 page with paragraphs yields
/// their text like any other page.
#[derive(Clone, Debug)]
pub struct TextExtractor {
    http: BlockingHttpClient,
}

impl TextExtractor {
    /// Extractor on a client with library defaults (no timeout, no custom headers).
    pub fn new() -> Result<Self, HttpError> {
        Self::with_opts(FetchOpts::default())
    }

    pub fn with_opts(opts: FetchOpts) -> Result<Self, HttpError> {
        Ok(Self {
            http: BlockingHttpClient::new(opts)?,
        })
    }

    /// Blocking fetch + extract. Errors are the HTTP client's, unchanged.
    pub fn extract_text(&self, url: &str) -> Result<String, HttpError> {
        let page = self.http.get_page(url)?;
        let text = paragraph_text(&page.body);
        log_extraction(&page, text.len());
        Ok(text)
    }

    /// Per-paragraph variant of [`extract_text`](Self::extract_text).
    pub fn extract_paragraphs(&self, url: &str) -> Result<Vec<String>, HttpError> {
        let page = self.http.get_page(url)?;
        let paras = paragraphs(&page.body);
        log_extraction(&page, paras.iter().map(String::len).sum());
        Ok(paras)
    }
}

/// [`TextExtractor`] for callers that already run inside a `tokio` runtime.
#[derive(Clone, Debug)]
pub struct AsyncTextExtractor {
    http: HttpClient,
}

impl AsyncTextExtractor {
    pub fn new() -> Result<Self, HttpError> {
        Self::with_opts(FetchOpts::default())
    }

    pub fn with_opts(opts: FetchOpts) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::new(opts)?,
        })
    }

    pub async fn extract_text(&self, url: &str) -> Result<String, HttpError> {
        let page = self.http.get_page(url).await?;
        let text = paragraph_text(&page.body);
        log_extraction(&page, text.len());
        Ok(text)
    }
}

/// Fetch `url` and return the trimmed text of every `<p>`, concatenated.
///
/// Blocking. Each call builds its own client, so calls from different
/// threads share nothing.
///
/// ```no_run
/// let text = pagetext_web::get_text("https://example.com")?;
/// println!("{text}");
/// # Ok::<(), pagetext_web::HttpError>(())
/// ```
pub fn get_text(url: &str) -> Result<String, HttpError> {
    TextExtractor::new()?.extract_text(url)
}

fn log_extraction(page: &FetchedPage, text_len: usize) {
    tracing::debug!(
        url = %page.url,
        status = %page.status,
        text_len,
        "web.extract_text"
    );
}
