//! Paragraph text extraction for web pages.
//!
//! - Pure extraction from markup (`extract`)
//! - Fetch-then-extract, blocking and async (`extractor`), with
//!   [`get_text`] as the one-call entry point
//!
//! Errors from the network layer are [`HttpError`] values passed through
//! untouched; parsing itself cannot fail.

pub mod extract;
pub mod extractor;

pub use extractor::{AsyncTextExtractor, TextExtractor, get_text};
pub use pagetext_http::{FetchOpts, HttpError};
