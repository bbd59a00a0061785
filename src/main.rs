//! Ripple-Parse main entry point
//!
//! This is the command-line interface for the Ripple-Parse content extractor.

use anyhow::{bail, Context};
use clap::Parser;
use ripple_parse::config::{load_config_with_hash, Config};
use ripple_parse::render::{
    on_worker_start, on_worker_stop, Locator, WaitStrategy, WebDriverSessionFactory, WorkerId,
};
use ripple_parse::{
    ContentParser, DynamicContentParser, Page, ParseResult, RenderSessionRegistry,
    StaticContentParser,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple-Parse: content extraction for crawled pages
///
/// Parses a saved page into title, text, meta tags and outgoing links.
/// With --dynamic the page URL is loaded in a WebDriver-driven browser and
/// the rendered source is parsed instead.
#[derive(Parser, Debug)]
#[command(name = "ripple-parse")]
#[command(version = "1.0.0")]
#[command(about = "Content extraction for crawled pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Saved page body to parse
    #[arg(value_name = "FILE", required_unless_present = "dry_run")]
    file: Option<PathBuf>,

    /// URL the page was fetched from (link context)
    #[arg(long, default_value = "http://localhost/")]
    url: String,

    /// Content-Type the page was served with
    #[arg(long)]
    content_type: Option<String>,

    /// Charset the page declared
    #[arg(long)]
    charset: Option<String>,

    /// Render the page URL in a browser before parsing
    #[arg(long)]
    dynamic: bool,

    /// CSS selector to wait for when rendering (default: body)
    #[arg(long, requires = "dynamic")]
    wait_for: Option<String>,

    /// Print the parse result as JSON
    #[arg(long)]
    json: bool,

    /// Validate config and print the effective settings
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        print_settings(&config);
        return Ok(());
    }

    let Some(file) = cli.file.as_ref() else {
        bail!("no page file given");
    };
    let content =
        std::fs::read(file).with_context(|| format!("Failed to read page {}", file.display()))?;

    let mut page = Page::new(cli.url.clone(), content);
    page.content_type = cli.content_type.clone();
    page.charset = cli.charset.clone();

    let result = if cli.dynamic {
        parse_dynamic(config, &cli, &mut page)?
    } else {
        StaticContentParser::new(&config.parser).parse_page(&mut page)?
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&page, &result);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_parse=info,warn"),
            1 => EnvFilter::new("ripple_parse=debug,info"),
            2 => EnvFilter::new("ripple_parse=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Binds a session for this thread, parses, and always releases the session
fn parse_dynamic(config: Config, cli: &Cli, page: &mut Page) -> anyhow::Result<ParseResult> {
    let config = Arc::new(config);
    let registry = Arc::new(RenderSessionRegistry::new());
    let factory = WebDriverSessionFactory::new(&config.dynamic);
    let worker = WorkerId::current();

    let selector = cli.wait_for.clone().unwrap_or_else(|| "body".to_string());
    let parser = DynamicContentParser::new(
        Arc::clone(&config),
        Arc::clone(&registry),
        WaitStrategy::locator(Locator::Css(selector)),
    );

    on_worker_start(&registry, &factory, worker.clone())
        .with_context(|| format!("Failed to start {} session", config.dynamic.render_engine))?;

    let result = parser.parse_as(&worker, page, &cli.url);

    if let Err(e) = on_worker_stop(&registry, &worker) {
        tracing::warn!("Failed to close render session: {}", e);
    }

    Ok(result?)
}

fn print_settings(config: &Config) {
    println!("=== Ripple-Parse Settings ===\n");

    println!("Parser:");
    println!(
        "  Max outgoing links: {}",
        config.parser.max_outgoing_links_to_follow
    );
    println!("  Default charset: {}", config.parser.default_charset);

    println!("\nDynamic rendering:");
    println!("  Engine: {}", config.dynamic.render_engine);
    println!("  WebDriver: {}", config.dynamic.webdriver_url);
    println!(
        "  Max wait: {}s",
        config.dynamic.max_wait_for_dynamic_content_seconds
    );
    println!("  Max download size: {} bytes", config.dynamic.max_download_size);
    println!("  Launch flags:");
    for flag in ripple_parse::render::launch_flags(&config.dynamic) {
        println!("    {}", flag);
    }

    println!("\n✓ Configuration is valid");
}

fn print_result(page: &Page, result: &ParseResult) {
    println!("URL: {}", page.url);
    println!("Title: {}", result.title.as_deref().unwrap_or("(none)"));
    println!("Charset: {}", result.content_charset);
    println!("Text: {} chars", result.text.chars().count());

    println!("\nMeta tags ({}):", result.meta_tags.len());
    for (name, content) in &result.meta_tags {
        println!("  {}: {}", name, content);
    }

    println!("\nOutgoing links ({}):", result.outgoing_links.len());
    for link in &result.outgoing_links {
        if link.anchor.is_empty() {
            println!("  [{}] {}", link.tag, link.url);
        } else {
            println!("  [{}] {} ({})", link.tag, link.url, link.anchor);
        }
    }
}
