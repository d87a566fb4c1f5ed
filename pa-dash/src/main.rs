//! pa-dash - Photo Analyzer dashboard CLI
//!
//! Browses and triages the photo gallery from the terminal: follow the live
//! feed, list and filter photos, run analyses, discard or delete batches,
//! read analytics and coaching, and upload new files.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pa_common::config::{
    resolve_config, write_toml_config, ConfigOverrides, DashConfig, LoggingConfig,
};
use pa_common::events::EventBus;
use pa_common::models::{Category, PhotoStatus};
use pa_dash::cache::LocalCache;
use pa_dash::feed::{fetch_snapshot, FeedAdapter, FeedUpdate, PollingFeed};
use pa_dash::filters::{ReviewedQuery, SortOrder};
use pa_dash::notices::drain_raised;
use pa_dash::gateway::{Gateway, HttpGateway};
use pa_dash::render;
use pa_dash::sync::SelectOutcome;
use pa_dash::upload::{UploadQueue, Uploader};
use pa_dash::Dashboard;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for pa-dash
#[derive(Parser, Debug)]
#[command(name = "pa-dash")]
#[command(about = "Photo Analyzer dashboard")]
#[command(version)]
struct Args {
    /// Configuration file (default: ~/.config/photo-analyzer/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gateway base URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Shared API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Do not read or write the local cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the live gallery and print changes until Ctrl+C
    Watch,

    /// Print one tab of the gallery
    List {
        /// pending or reviewed
        #[arg(default_value = "pending")]
        tab: PhotoStatus,

        /// Search filename, tags, category and summary (reviewed tab)
        #[arg(long, default_value = "")]
        search: String,

        /// Category label, e.g. paisajes (reviewed tab)
        #[arg(long)]
        category: Option<String>,

        /// newest, oldest, best or worst (reviewed tab)
        #[arg(long, default_value = "newest")]
        sort: SortOrder,
    },

    /// Analyze pending photos
    Analyze {
        files: Vec<String>,

        /// Every pending photo
        #[arg(long, conflicts_with = "files")]
        all: bool,
    },

    /// Move pending photos to the discarded area
    Discard {
        #[arg(required = true)]
        files: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Permanently delete reviewed photos and their files
    Delete {
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(short, long)]
        yes: bool,
    },

    /// Show the full review of one photo
    Detail { file: String },

    /// Aggregate statistics over reviewed photos
    Analytics,

    /// AI coaching report
    Coaching {
        /// Generate a new report instead of showing the cached one
        #[arg(long)]
        refresh: bool,
    },

    /// Upload JPG/JPEG/ARW files
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(&ConfigOverrides {
        config_path: args.config.clone(),
        backend_url: args.backend_url.clone(),
        api_key: args.api_key.clone(),
    })
    .context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    info!(
        "pa-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(backend = %config.gateway.base_url, "Gateway");
    if config.gateway.api_key.is_empty() {
        warn!("No API key configured; the gateway will reject requests");
    }

    if let Command::Config { write } = &args.command {
        return show_config(&config, write.as_deref());
    }

    let http_gateway =
        HttpGateway::new(&config.gateway).context("Failed to create gateway client")?;
    let http_client = http_gateway.http_client().clone();
    let gateway: Arc<dyn Gateway> = Arc::new(http_gateway);
    let bus = EventBus::default();

    let mut dashboard = Dashboard::new(gateway.clone(), bus.clone(), config.sync.clone());
    if !args.no_cache {
        let path = config.cache.resolved_path();
        match LocalCache::open(&path).await {
            Ok(cache) => dashboard = dashboard.with_cache(cache, config.cache.gallery_ttl()),
            Err(e) => warn!(path = %path.display(), error = %e, "Cache unavailable, continuing without it"),
        }
    }

    match args.command {
        Command::Watch => watch(&dashboard, gateway, &config).await?,

        Command::List {
            tab,
            search,
            category,
            sort,
        } => {
            load_gallery(&dashboard, gateway.as_ref(), &config).await?;
            let rows = match tab {
                PhotoStatus::Pending => dashboard.rows(tab).await,
                PhotoStatus::Reviewed => {
                    let query = ReviewedQuery {
                        search,
                        category: category.as_deref().map(Category::from_label),
                        sort,
                    };
                    dashboard.reviewed_rows(&query).await
                }
            };
            print!("{}", render::render_stats(&dashboard.stats().await));
            print!("{}", render::render_rows(&rows));
        }

        Command::Analyze { files, all } => {
            load_gallery(&dashboard, gateway.as_ref(), &config).await?;
            if all {
                dashboard.select_all(PhotoStatus::Pending, None).await;
            } else {
                select_files(&dashboard, &files, PhotoStatus::Pending).await?;
            }
            // Per-photo notices can expire before a long run ends
            let mut events = bus.subscribe();
            if let Some(handle) = dashboard.analyze_selected().await {
                let summary = handle.await.context("Analyze task panicked")?;
                for notice in drain_raised(&mut events) {
                    println!("{}", notice.message);
                }
                if summary.ok.is_empty() && !summary.failed.is_empty() {
                    bail!("every analysis failed");
                }
            } else {
                println!("Nothing to analyze");
            }
        }

        Command::Discard { files, yes } => {
            load_gallery(&dashboard, gateway.as_ref(), &config).await?;
            select_files(&dashboard, &files, PhotoStatus::Pending).await?;
            let count = dashboard.selection().await.len();
            if !yes && !confirm(&format!("Discard {} photo(s)?", count))? {
                return Ok(());
            }
            let outcome = dashboard.discard_selected().await;
            print_notices(&dashboard);
            outcome?;
        }

        Command::Delete { files, yes } => {
            load_gallery(&dashboard, gateway.as_ref(), &config).await?;
            select_files(&dashboard, &files, PhotoStatus::Reviewed).await?;
            let count = dashboard.selection().await.len();
            if !yes
                && !confirm(&format!(
                    "Permanently delete {} photo(s) and their files?",
                    count
                ))?
            {
                return Ok(());
            }
            let outcome = dashboard.delete_selected().await;
            print_notices(&dashboard);
            outcome?;
        }

        Command::Detail { file } => match dashboard.open_detail(&file).await {
            Some(detail) => println!("{}", render::render_detail(&detail)),
            None => bail!("Detail not available for {}", file),
        },

        Command::Analytics => {
            let view = dashboard.refresh_analytics().await;
            print!("{}", render::render_analytics(&view));
        }

        Command::Coaching { refresh } => {
            let view = if refresh {
                dashboard.refresh_coaching().await
            } else {
                dashboard.coaching().await
            };
            print!("{}", render::render_coaching(&view));
        }

        Command::Upload { paths } => {
            let mut queue = UploadQueue::new();
            let report = queue.add_paths(&paths);
            for name in &report.unsupported {
                warn!(file = %name, "Skipping unsupported file (JPG, JPEG or ARW only)");
            }
            for name in &report.duplicates {
                warn!(file = %name, "Skipping duplicate file name");
            }
            if report.added == 0 {
                bail!("No files to upload");
            }

            let printer = spawn_printer(&bus);
            let summary = Uploader::new(gateway.as_ref(), http_client, bus.clone())
                .upload_all(&mut queue)
                .await;
            printer.abort();

            if let Some(message) = summary.message() {
                println!("{}", message);
            }
            if summary.ok == 0 {
                bail!("Upload failed");
            }
        }

        // Handled before the gateway is built
        Command::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

/// Follow the feed until Ctrl+C
async fn watch(
    dashboard: &Dashboard,
    gateway: Arc<dyn Gateway>,
    config: &DashConfig,
) -> Result<()> {
    if dashboard.restore_from_cache().await {
        print!("{}", render::render_stats(&dashboard.stats().await));
    }

    let printer = spawn_printer(dashboard.bus());
    let feed = PollingFeed::new(gateway, &config.feed);
    let adapter = FeedAdapter::connect(&feed, config.feed.first_snapshot_timeout());

    dashboard.run_feed(adapter, shutdown_signal()).await;
    printer.abort();

    print!("{}", render::render_stats(&dashboard.stats().await));
    Ok(())
}

/// One-shot load of both partitions
async fn load_gallery(
    dashboard: &Dashboard,
    gateway: &dyn Gateway,
    config: &DashConfig,
) -> Result<()> {
    for status in PhotoStatus::ALL {
        let records = fetch_snapshot(gateway, status, config.feed.page_size)
            .await
            .with_context(|| format!("Failed to load {} photos", status))?;
        dashboard.on_snapshot(FeedUpdate { status, records }).await;
    }
    Ok(())
}

/// Select the named files, refusing names not on `tab`
async fn select_files(dashboard: &Dashboard, files: &[String], tab: PhotoStatus) -> Result<()> {
    let on_tab: Vec<String> = dashboard
        .rows(tab)
        .await
        .into_iter()
        .map(|row| row.photo.filename)
        .collect();

    for file in files {
        if !on_tab.contains(file) {
            warn!(file = %file, tab = %tab, "Not in this list, skipping");
            continue;
        }
        if dashboard.toggle_select(file).await == SelectOutcome::Rejected {
            warn!(file = %file, "Busy, skipping");
        }
    }

    if dashboard.selection().await.is_empty() {
        bail!("None of the given files can be selected");
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_notices(dashboard: &Dashboard) {
    for notice in dashboard.notices() {
        println!("{}", notice.message);
    }
}

/// Print bus events to stdout until aborted
fn spawn_printer(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = render::render_event(&event) {
                        println!("{}", line);
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn show_config(config: &DashConfig, write: Option<&std::path::Path>) -> Result<()> {
    let mut shown = config.clone();
    if !shown.gateway.api_key.is_empty() {
        shown.gateway.api_key = "********".to_string();
    }
    print!("{}", toml::to_string_pretty(&shown).context("Failed to render configuration")?);

    if let Some(path) = write {
        write_toml_config(config, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Configuration written to {}", path.display());
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
