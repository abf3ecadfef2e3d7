use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pagetext_common::observability::init_logging;
use pagetext_config::{PagetextConfig, PagetextConfigLoader};
use pagetext_web::TextExtractor;
use pagetext_web::extract::{paragraph_text, paragraphs};
use serde::Serialize;

const DEFAULT_CONFIG: &str = "pagetext.yaml";

/// Print the text of every <p> element of a web page or local HTML file.
#[derive(Debug, Parser)]
#[command(name = "pagetext", version)]
struct Cli {
    /// Page to fetch.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    url: Option<String>,

    /// Read HTML from a local file instead of fetching.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Configuration file. Defaults to ./pagetext.yaml when it exists.
    #[arg(long, value_name = "PATH", env = "PAGETEXT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit {"source": ..., "text": ...} instead of raw text.
    #[arg(long)]
    json: bool,

    /// One line per paragraph instead of the concatenation.
    #[arg(long)]
    paragraphs: bool,
}

#[derive(Debug, PartialEq)]
enum Extracted {
    Text(String),
    Paragraphs(Vec<String>),
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    source: &'a str,
    #[serde(flatten)]
    content: &'a JsonContent<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum JsonContent<'a> {
    Text(&'a str),
    Paragraphs(&'a [String]),
}

fn load_config(cli: &Cli) -> Result<PagetextConfig> {
    let loader = match &cli.config {
        Some(path) => PagetextConfigLoader::new().with_file(path),
        None => PagetextConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    loader.load().context("failed to load configuration")
}

fn extract(cli: &Cli, cfg: &PagetextConfig) -> Result<(String, Extracted)> {
    if let Some(path) = &cli.file {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let extracted = if cli.paragraphs {
            Extracted::Paragraphs(paragraphs(&html))
        } else {
            Extracted::Text(paragraph_text(&html))
        };
        return Ok((path.display().to_string(), extracted));
    }

    let url = cli.url.as_deref().context("no URL given")?;
    let extractor = TextExtractor::with_opts(cfg.http.fetch_opts())?;
    let extracted = if cli.paragraphs {
        Extracted::Paragraphs(
            extractor
                .extract_paragraphs(url)
                .with_context(|| format!("failed to fetch {url}"))?,
        )
    } else {
        Extracted::Text(
            extractor
                .extract_text(url)
                .with_context(|| format!("failed to fetch {url}"))?,
        )
    };
    Ok((url.to_string(), extracted))
}

fn render(source: &str, extracted: &Extracted, json: bool) -> Result<String> {
    if !json {
        return Ok(match extracted {
            Extracted::Text(text) => text.clone(),
            Extracted::Paragraphs(paras) => paras.join("\n"),
        });
    }
    let content = match extracted {
        Extracted::Text(text) => JsonContent::Text(text),
        Extracted::Paragraphs(paras) => JsonContent::Paragraphs(paras),
    };
    Ok(serde_json::to_string(&JsonOutput {
        source,
        content: &content,
    })?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(&cli)?;

    let log_path = init_logging(cfg.logging.log_config("pagetext"))?;
    tracing::debug!(log_file = %log_path.display(), "pagetext.start");

    let (source, extracted) = extract(&cli, &cfg)?;
    println!("{}", render(&source, &extracted, cli.json)?);
    Ok(())
}
