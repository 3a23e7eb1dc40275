use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use wqt::client::{HttpConnector, QueryExecutor};
use wqt::config::Config;
use wqt::session::Session;
use wqt::ui::App;
use wqt::utils::logging;

#[derive(Parser, Debug)]
#[command(
    name = "wqt",
    version,
    about = "Interactive terminal client for a warehouse query service"
)]
struct Args {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Format to display query results in (table, csv, json)
    #[arg(short, long)]
    format: Option<String>,

    /// Connection target to run queries against
    #[arg(long)]
    target: Option<String>,

    /// Base URL of the query service
    #[arg(long)]
    endpoint: Option<String>,

    /// Filepath of the credentials file holding a bearer token
    #[arg(long)]
    credentials_file: Option<PathBuf>,

    /// Run queries with batch priority
    #[arg(long)]
    batch_priority: Option<bool>,

    /// Timeout for queries, in seconds. If 0, queries run for the
    /// backend's maximum allowed time
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Verbosity level of logs (error, warn, info, debug, trace)
    #[arg(short, long)]
    verbosity: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // startup and top-level failures are fatal; the terminal is
        // restored by this point, so stderr is safe again
        eprintln!("wqt: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    // flags override the file
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(target) = args.target {
        config.target = target;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(credentials_file) = args.credentials_file {
        config.credentials_file = Some(credentials_file);
    }
    if let Some(batch_priority) = args.batch_priority {
        config.batch_priority = batch_priority;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(verbosity) = args.verbosity {
        config.log_level = verbosity;
    }
    config.validate()?;

    logging::init(&config.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting wqt");

    let bearer = match &config.credentials_file {
        Some(path) => {
            let token = fs::read_to_string(path)
                .with_context(|| format!("reading credentials file {}", path.display()))?;
            Some(token.trim().to_string())
        }
        None => None,
    };

    let connector = HttpConnector::new(
        config.endpoint.clone(),
        bearer,
        config.batch_priority,
        config.timeout(),
    );
    let executor = Arc::new(QueryExecutor::new(Box::new(connector), config.timeout()));

    let session = Session::new(
        config.format_kind()?,
        config.target.clone(),
        config.delimiter_byte(),
    );
    let app = App::new(session, Arc::clone(&executor), config.max_rows);
    let run_result = app.run().await;

    if let Err(e) = executor.close().await {
        warn!(error = %e, "shutdown left connections unclosed");
    }

    info!("wqt finished");
    run_result
}
