//! litmerge command-line entry point.
//!
//! Queries all configured sources for one topic, consolidates the results
//! and prints a Markdown report, optionally saving it under `--out-dir`.

use anyhow::Result;
use clap::Parser;
use litmerge::similarity::SimilarityConfig;
use litmerge::sources::{
    ArxivSearch, CrossrefSearch, OpenAlexSearch, PubmedSearch, ScholarSearch, SourceAdapter,
    WebSearch,
};
use litmerge::{orchestrator, report, sources};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "litmerge")]
#[command(about = "Search scholarly sources and consolidate the results into one report")]
#[command(version)]
struct Cli {
    /// Research topic to investigate
    query: String,

    /// Maximum results to request from each source
    #[arg(long, default_value_t = 5)]
    max: usize,

    /// Directory where reports are written
    #[arg(long, default_value = "reports")]
    out_dir: PathBuf,

    /// Print the report without writing it to disk
    #[arg(long)]
    no_save: bool,

    /// Minimum title similarity for two results to merge
    #[arg(long, default_value_t = 0.8)]
    match_threshold: f64,

    /// Minimum token overlap before string similarity is consulted
    #[arg(long, default_value_t = 0.6)]
    token_overlap: f64,

    /// Titles with fewer tokens than this never merge
    #[arg(long, default_value_t = 2)]
    min_title_tokens: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Ollama API key enabling the general web search source
    #[arg(long, env = "OLLAMA_API_KEY", hide_env_values = true)]
    ollama_api_key: Option<String>,

    /// Base URL of the Ollama API
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = "https://ollama.com")]
    ollama_base_url: String,

    /// SerpAPI key enabling the Google Scholar source
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    serpapi_api_key: Option<String>,

    /// Contact e-mail forwarded to the NCBI E-utilities
    #[arg(long, env = "PUBMED_EMAIL")]
    pubmed_email: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("litmerge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("litmerge=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();
}

/// Assembles the adapter collection in report order.
///
/// Sources that need an API key are skipped with a warning when the key
/// is absent, so a bare environment still produces a useful run.
fn build_adapters(cli: &Cli, client: &reqwest::Client) -> Vec<Box<dyn SourceAdapter>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

    match &cli.ollama_api_key {
        Some(key) => adapters.push(Box::new(
            WebSearch::new(client.clone(), key.clone()).with_base_url(cli.ollama_base_url.clone()),
        )),
        None => warn!("OLLAMA_API_KEY not set, skipping the web search source"),
    }

    adapters.push(Box::new(ArxivSearch::new(client.clone())));
    adapters.push(Box::new(CrossrefSearch::new(client.clone())));
    adapters.push(Box::new(OpenAlexSearch::new(client.clone())));

    let mut pubmed = PubmedSearch::new(client.clone());
    if let Some(email) = &cli.pubmed_email {
        pubmed = pubmed.with_email(email.clone());
    }
    adapters.push(Box::new(pubmed));

    match &cli.serpapi_api_key {
        Some(key) => adapters.push(Box::new(ScholarSearch::new(client.clone(), key.clone()))),
        None => warn!("SERPAPI_API_KEY not set, skipping the Google Scholar source"),
    }

    adapters
}

fn save_report(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    info!(version = env!("CARGO_PKG_VERSION"), query = %cli.query, "starting research run");

    let config = SimilarityConfig {
        match_threshold: cli.match_threshold,
        token_overlap_threshold: cli.token_overlap,
        min_title_tokens: cli.min_title_tokens,
    };
    let client = sources::http_client(Duration::from_secs(cli.timeout))?;
    let adapters = build_adapters(&cli, &client);

    let summary = orchestrator::run_research(&adapters, &cli.query, cli.max, config).await;

    let now = chrono::Local::now();
    let rendered = report::render_markdown(&summary, &now.format("%Y-%m-%d %H:%M:%S").to_string());
    println!("{rendered}");

    if !cli.no_save {
        let filename = report::report_filename(&cli.query, &now.format("%Y%m%d-%H%M%S").to_string());
        let path = cli.out_dir.join(filename);
        match save_report(&path, &rendered) {
            Ok(()) => info!(path = %path.display(), "report saved"),
            Err(error) => warn!(error = %error, "could not write the report file"),
        }
    }

    Ok(())
}
