//! Office hours service entry point.
//!
//! Opens the rule database, starts the open-state watcher and serves the
//! HTTP API until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use officehours_core::{CachingHolidayOracle, HolidayOracle, HttpHolidayOracle, NoHolidays};
use officehours_server::{AppState, Server, ServerConfig};
use officehours_storage::Database;
use officehours_watcher::{EventSink, HttpEventSink, LogEventSink, Watcher, WatcherConfig};

/// Office hours resolution service.
#[derive(Parser, Debug)]
#[command(name = "office-hours")]
#[command(version, about = "Resolves office hours and reports open/closed changes")]
struct Args {
    /// Address to listen on (`host:port` or `:port`)
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:8081")]
    listen: String,

    /// SQLite database file (defaults to the platform data directory)
    #[arg(long = "database", env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Base URL of the holiday calendar service
    #[arg(long, env = "CALENDAR_SERVICE")]
    holiday_service: Option<String>,

    /// URL that receives open/closed change events
    #[arg(long, env = "EVENT_SERVICE")]
    event_service: Option<String>,

    /// CORS allowed origins, comma separated
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "*", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// How long holiday lookups are cached
    #[arg(long, default_value_t = 3600)]
    holiday_cache_secs: u64,

    /// Re-check interval when no open/close edge is predicted
    #[arg(long, default_value_t = 60)]
    fallback_interval_secs: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write daily rotated log files to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Parses a listen address. A bare `:port` binds all interfaces.
fn parse_listen(listen: &str) -> anyhow::Result<SocketAddr> {
    let listen = listen.trim();
    let full = if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    };

    full.parse()
        .with_context(|| format!("invalid listen address: {}", listen))
}

fn log_filter(args: &Args) -> String {
    let log_level = if args.debug { "debug" } else { &args.log_level };
    format!("office_hours={0},officehours={0},warn", log_level)
}

/// Initialize logging, with file rotation when a log directory is given.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(args)));

    if let Some(log_dir) = &args.log_dir {
        if std::fs::create_dir_all(log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("office-hours")
                .filename_suffix("log")
                .build(log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stdout))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }

        tracing_subscriber::fmt().with_env_filter(env_filter).init();
        tracing::warn!("File logging unavailable in {:?}, using console only", log_dir);
        return None;
    }

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    None
}

fn open_database(args: &Args) -> anyhow::Result<Database> {
    let db = match &args.database {
        Some(path) => Database::with_path(path)?,
        None => Database::new()?,
    };
    Ok(db)
}

fn holiday_oracle(args: &Args) -> anyhow::Result<Arc<dyn HolidayOracle>> {
    match &args.holiday_service {
        Some(url) => {
            let client = HttpHolidayOracle::new(url.as_str())
                .map_err(|e| anyhow::anyhow!("Holiday client error: {}", e))?;
            tracing::info!(url = %url, "Using holiday service");
            Ok(Arc::new(CachingHolidayOracle::with_ttl(
                client,
                Duration::from_secs(args.holiday_cache_secs),
            )))
        }
        None => {
            tracing::warn!("No holiday service configured, no day will count as a holiday");
            Ok(Arc::new(NoHolidays))
        }
    }
}

fn event_sink(args: &Args) -> anyhow::Result<Arc<dyn EventSink>> {
    match &args.event_service {
        Some(url) => {
            let sink = HttpEventSink::new(url.as_str())
                .map_err(|e| anyhow::anyhow!("Event sink error: {}", e))?;
            tracing::info!(url = %url, "Publishing open state changes");
            Ok(Arc::new(sink))
        }
        None => {
            tracing::info!("No event service configured, open state changes are only logged");
            Ok(Arc::new(LogEventSink))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive for the duration of the program
    let _log_guard = init_logging(&args);

    tracing::info!("Starting office hours service...");
    tracing::debug!("Args: {:?}", args);

    let addr = parse_listen(&args.listen)?;

    let db = open_database(&args).map_err(|e| anyhow::anyhow!("Database error: {}", e))?;
    match &args.database {
        Some(path) => tracing::info!("Database opened at {:?}", path),
        None => tracing::info!("Database opened at {:?}", Database::default_db_path()?),
    }

    let state = AppState::new(Arc::new(db), holiday_oracle(&args)?);

    let watcher = Watcher::new(state.resolver.clone(), event_sink(&args)?)
        .with_config(
            WatcherConfig::default()
                .with_fallback_interval(Duration::from_secs(args.fallback_interval_secs)),
        )
        .start();
    let state = state.with_trigger(watcher.trigger());

    let config = ServerConfig::default()
        .with_addr(addr)
        .with_allowed_origins(args.allowed_origins.clone());
    let server = Server::with_state(config, state)?;

    let served = server.run_until(shutdown_signal()).await;

    watcher.stop().await;
    tracing::info!("Office hours service stopped");

    served.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
