//! gemcat-browse - Terminal catalog browser
//!
//! Pulls pages from a running gemcat-api, then prints the searched, filtered
//! and sorted collection. With `--watch` it keeps the collection fresh in the
//! background and reads commands from stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gemcat_browse::filter::ALL;
use gemcat_browse::view::{self, MediaState};
use gemcat_browse::{
    BrowseCommand, BrowseSession, CatalogState, FilterState, HttpPageSource, LoadPhase, SortOrder,
};
use gemcat_common::api::{DEFAULT_LIMIT, MAX_LIMIT};
use gemcat_common::config::TomlConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for gemcat-browse
#[derive(Parser, Debug)]
#[command(name = "gemcat-browse")]
#[command(about = "Browse the GemCat diamond catalog from the terminal")]
#[command(version)]
struct Args {
    /// Catalog API base URL
    #[arg(long, env = "GEMCAT_API_URL", default_value = "http://127.0.0.1:5780")]
    api_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, env = "GEMCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Items per page
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,

    /// Search stock, report, shape, color and clarity
    #[arg(short, long, default_value = "")]
    query: String,

    #[arg(long, default_value = ALL)]
    shape: String,

    #[arg(long, default_value = ALL)]
    color: String,

    #[arg(long, default_value = ALL)]
    clarity: String,

    #[arg(long, default_value = ALL)]
    cut: String,

    /// none, price-asc, price-desc, weight-asc or weight-desc
    #[arg(long, default_value = "none")]
    sort: SortOrder,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, conflicts_with = "all")]
    pages: u32,

    /// Load every page
    #[arg(long)]
    all: bool,

    /// Show full details for the Nth visible item (1-based)
    #[arg(long)]
    detail: Option<usize>,

    /// Check image links and fall back to the placeholder for broken ones
    #[arg(long)]
    check_images: bool,

    /// Keep running: revalidate periodically and read commands from stdin
    #[arg(short, long)]
    watch: bool,
}

impl Args {
    fn filter(&self) -> FilterState {
        FilterState {
            query: self.query.clone(),
            shape: self.shape.clone(),
            color: self.color.clone(),
            clarity: self.clarity.clone(),
            cut: self.cut.clone(),
            sort: self.sort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Output goes to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gemcat_browse={}", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    config_source.log();

    let limit = args.limit.clamp(1, MAX_LIMIT);
    let source = Arc::new(
        HttpPageSource::new(&args.api_url, config.request_timeout())
            .context("Failed to create API client")?,
    );
    info!("Catalog API: {}", args.api_url);

    let mut session = BrowseSession::new(source.clone(), limit, config.sheet.refresh_interval());
    session.set_filter(args.filter());

    if args.watch {
        return watch(session, args.filter()).await;
    }

    if args.all {
        session.load_all().await;
    } else {
        session.load_pages(args.pages.max(1)).await;
    }
    let state = session.into_state();

    let mut media = MediaState::default();
    if args.check_images {
        for item in state.visible() {
            if let Err(e) = source.check_image(item).await {
                media.record_failure(&e);
            }
        }
    }

    print_state(&state, &media, args.detail);

    if let LoadPhase::Error { message, .. } = state.phase() {
        if state.item_count() == 0 {
            bail!("{}", message);
        }
        warn!("Showing partial results: {}", message);
    }

    Ok(())
}

/// Interactive mode: stdin lines become session commands
async fn watch(session: BrowseSession<Arc<HttpPageSource>>, filter: FilterState) -> Result<()> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut filter = filter;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line, &mut filter) {
                Input::Command(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Input::Quit => break,
                Input::Ignored => {}
                Input::Invalid(message) => eprintln!("{}", message),
            }
        }
        // Dropping the sender ends the session
    });

    println!("Commands: more, refresh, focus, search <text>, shape|color|clarity|cut <value>, sort <order>, clear, quit");
    let media = MediaState::default();
    let state = session.run(rx, |state| print_state(state, &media, None)).await;
    info!("Browse session ended with {} items loaded", state.item_count());
    Ok(())
}

fn print_state(state: &CatalogState, media: &MediaState, detail: Option<usize>) {
    let visible = state.visible();

    println!("{}", view::status_line(state, visible.len()));
    if let Some(message) = view::empty_state(state, visible.len()) {
        println!("{}", message);
    }

    match detail {
        Some(n) => match n.checked_sub(1).and_then(|i| visible.get(i)) {
            Some(item) => print!("{}", view::render_detail(item, media)),
            None => println!("No item #{} ({} visible)", n, visible.len()),
        },
        None => {
            for item in &visible {
                println!("{}", view::render_card(item, media));
            }
        }
    }

    let options = state.filter_options();
    println!("Shapes: {}", options.shapes.join(", "));
}

#[derive(Debug, PartialEq)]
enum Input {
    Command(BrowseCommand),
    Quit,
    Ignored,
    Invalid(String),
}

/// Parse one stdin line; filter edits are applied to `filter` and sent whole
fn parse_command(line: &str, filter: &mut FilterState) -> Input {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let category = || {
        if rest.is_empty() {
            ALL.to_string()
        } else {
            rest.to_string()
        }
    };

    match verb {
        "" => return Input::Ignored,
        "more" | "m" => return Input::Command(BrowseCommand::LoadMore),
        "refresh" | "r" => return Input::Command(BrowseCommand::Refresh),
        "focus" => return Input::Command(BrowseCommand::FocusRegained),
        "quit" | "q" | "exit" => return Input::Quit,
        "search" | "s" => filter.query = rest.to_string(),
        "shape" => filter.shape = category(),
        "color" => filter.color = category(),
        "clarity" => filter.clarity = category(),
        "cut" => filter.cut = category(),
        "sort" => match rest.parse::<SortOrder>() {
            Ok(order) => filter.sort = order,
            Err(e) => return Input::Invalid(e.to_string()),
        },
        "clear" => *filter = FilterState::default(),
        other => return Input::Invalid(format!("Unknown command: {}", other)),
    }

    Input::Command(BrowseCommand::SetFilter(filter.clone()))
}
