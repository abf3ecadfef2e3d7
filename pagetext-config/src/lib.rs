//! Loader for `pagetext` configuration with file + environment overlays.
//!
//! Sources merge in insertion order, later ones winning, and environment
//! variables always win last: `PAGETEXT_HTTP__TIMEOUT_SECS=30` overrides
//! `http.timeout_secs`. String values may carry `${VAR}` placeholders that are
//! expanded from the process environment after merging.
//!
//! Environment values are kept as written and parsed per field, so
//! `PAGETEXT_HTTP__USER_AGENT=007` stays `"007"` while the timeout still reads
//! as a number. Text fields also take bare YAML scalars (`version: 1`).
//!
//! ```yaml
//! version: "1"
//! http:
//!   timeout_secs: 30
//!   user_agent: "pagetext/0.1"
//! logging:
//!   level: info
//!   format: json
//!   stderr: true
//!   dir: ~/.local/share/pagetext
//! ```
use config::{Config, ConfigError, Environment, File};
use pagetext_common::observability::{LogConfig, LogFormat};
use pagetext_http::FetchOpts;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PAGETEXT";

#[derive(Debug, Default, Deserialize)]
pub struct PagetextConfig {
    #[serde(default, deserialize_with = "text_scalar")]
    pub version: Option<String>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Client knobs; anything left out keeps the HTTP library's default.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct HttpSettings {
    #[serde(default, deserialize_with = "parsed_scalar_opt")]
    pub timeout_secs: Option<u64>,
    #[serde(default, deserialize_with = "text_scalar")]
    pub user_agent: Option<String>,
}

impl HttpSettings {
    pub fn fetch_opts(&self) -> FetchOpts {
        FetchOpts {
            timeout: self.timeout_secs.map(Duration::from_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default, deserialize_with = "parsed_scalar")]
    pub stderr: bool,
    #[serde(default, deserialize_with = "text_scalar")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            stderr: false,
            dir: None,
        }
    }
}

impl LoggingSettings {
    pub fn log_config(&self, app_name: &str) -> LogConfig {
        LogConfig {
            app_name: app_name.to_string(),
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.level.clone(),
        }
    }
}

fn default_level() -> String {
    "info".into()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar<T> {
    Native(T),
    Text(String),
}

/// Text field that also accepts numbers and booleans in their display form.
fn text_scalar<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let text = match Value::deserialize(d)? {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(D::Error::custom(format!("expected text, found {other}"))),
    };
    Ok(Some(T::from(text)))
}

/// Typed field that also accepts its string form, as environment values arrive.
fn parsed_scalar<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Scalar::<T>::deserialize(d)? {
        Scalar::Native(v) => Ok(v),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid value {s:?}: {e}"))),
    }
}

fn parsed_scalar_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    parsed_scalar(d).map(Some)
}

/// Expand `${VAR}` and `$VAR` until the text stops changing. Self-referencing
/// variables stop after a fixed number of rounds with placeholders still in place.
fn expand_placeholders(raw: String) -> String {
    let mut cur = raw;
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let Ok(next) = shellexpand::env(&cur) else {
            break;
        };
        if next == cur {
            break;
        }
        cur = next.into_owned();
    }
    cur
}

/// Apply [`expand_placeholders`] to every string in the merged tree.
fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            *s = expand_placeholders(std::mem::take(s));
        }
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct PagetextConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PagetextConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PagetextConfigLoader {
    /// Empty loader; with no sources added, [`load`](Self::load) yields defaults.
    ///
    /// ```
    /// use pagetext_config::PagetextConfigLoader;
    ///
    /// let config = PagetextConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nhttp:\n  timeout_secs: 5")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.http.timeout_secs, Some(5));
    /// assert_eq!(config.logging.level, "info");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// `PAGETEXT_`-prefixed environment variables are layered on top, then
    /// `${VAR}` placeholders are expanded.
    ///
    /// ```
    /// use pagetext_config::PagetextConfigLoader;
    ///
    /// temp_env::with_var("PAGETEXT_UA", Some("reader/2"), || {
    ///     let config = PagetextConfigLoader::new()
    ///         .with_yaml_str("http:\n  user_agent: \"${PAGETEXT_UA}\"")
    ///         .load()
    ///         .expect("valid configuration");
    ///     assert_eq!(config.http.user_agent.as_deref(), Some("reader/2"));
    /// });
    /// ```
    pub fn load(self) -> Result<PagetextConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
