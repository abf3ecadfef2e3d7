//! Utilities shared across the pagetext crates.
//!
//! Today this is only [`observability`], the central `tracing` setup used by
//! the `pagetext` binary and by integration tests. It stays dependency-light
//! so that every crate can depend on it.
//!
//! ```no_run
//! use pagetext_common::observability::{LogConfig, init_logging};
//!
//! let path = init_logging(LogConfig::default())?;
//! tracing::info!(log_file = %path.display(), "logging ready");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod observability;
