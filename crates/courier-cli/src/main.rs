//! Courier CLI - send requests through the orchestration pipeline.
//!
//! Notices go to stderr through the terminal notifier and the loading
//! overlay is drawn as a spinner; the resolved payload is printed to stdout.

mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courier_core::endpoints::weather_request;
use courier_core::{
    ApiRequest, FileTokenStore, HttpOrchestrator, NoticeMode, ReqwestTransport,
};
use reqwest::Method;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use terminal::{SpinnerOverlay, TerminalNotifier};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Send HTTP requests with dedup, loading and retry handling")]
struct Args {
    /// Base URL for relative request paths (falls back to COURIER_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Token storage file (defaults to the platform data directory)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an arbitrary request
    Request(RequestArgs),
    /// Look up the weather; parameters are KEY=VALUE query pairs
    Weather { params: Vec<String> },
    /// Store the auth token sent with every request
    Login { token: String },
    /// Remove the stored auth token
    Logout,
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// HTTP method
    method: String,

    /// Request path or absolute URL
    url: String,

    /// Query parameter as KEY=VALUE (repeatable)
    #[arg(short, long = "query", value_name = "KEY=VALUE")]
    query: Vec<String>,

    /// JSON request body
    #[arg(long)]
    body: Option<String>,

    /// Retry budget after the first failure
    #[arg(long)]
    retry: Option<u32>,

    /// Delay between retries in milliseconds
    #[arg(long, value_name = "MS")]
    retry_delay: Option<u64>,

    /// Do not show the loading spinner
    #[arg(long)]
    no_loading: bool,

    /// Allow concurrent identical requests
    #[arg(long)]
    repeat: bool,

    /// Print the raw response body without business-code handling
    #[arg(long)]
    raw: bool,

    /// Success notice mode: msg, msgbox, hidden or null
    #[arg(long)]
    success_mode: Option<NoticeMode>,

    /// Error notice mode: msg, msgbox, hidden or null
    #[arg(long)]
    error_mode: Option<NoticeMode>,
}

impl RequestArgs {
    fn into_api_request(self) -> Result<ApiRequest> {
        let method = Method::from_bytes(self.method.to_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method: {}", self.method))?;

        let mut request = ApiRequest::new(method, self.url)
            .query_pairs(parse_pairs(&self.query)?);
        if self.repeat {
            request = request.repeat_request(true);
        }
        if let Some(body) = &self.body {
            let body = serde_json::from_str(body).context("--body is not valid JSON")?;
            request = request.json(body);
        }
        if let Some(retry) = self.retry {
            request = request.retry(retry);
        }
        if let Some(ms) = self.retry_delay {
            request = request.retry_delay(Duration::from_millis(ms));
        }
        if self.no_loading {
            request = request.loading(false);
        }
        if self.raw {
            request = request.native_data();
        }
        if let Some(mode) = self.success_mode {
            request = request.success_mode(mode);
        }
        if let Some(mode) = self.error_mode {
            request = request.error_mode(mode);
        }
        Ok(request)
    }
}

/// Split `KEY=VALUE` arguments.
fn parse_pairs(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("expected KEY=VALUE, got {}", pair))
        })
        .collect()
}

fn build_orchestrator(base_url: Option<&str>, store: FileTokenStore) -> Result<HttpOrchestrator> {
    let transport = match base_url {
        Some(base) => ReqwestTransport::new()?.with_base_url(base)?,
        None => ReqwestTransport::from_env()?,
    };
    if let Some(base) = transport.base_url() {
        debug!("Base URL: {}", base);
    }

    let spinner = Arc::new(SpinnerOverlay::new());
    Ok(HttpOrchestrator::builder(Arc::new(transport))
        .notifier(Arc::new(TerminalNotifier::with_spinner(spinner.clone())))
        .overlay(spinner)
        .token_store(Arc::new(store))
        .build())
}

async fn run(orchestrator: &HttpOrchestrator, request: ApiRequest) -> Result<ExitCode> {
    let result = orchestrator.send(request).await;
    // The debounced close would outlive the process; close the spinner now.
    orchestrator.loading().flush();

    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            // The notifier has already shown the user-facing message.
            debug!("Request failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let Args {
        base_url,
        storage,
        debug,
        command,
    } = Args::parse();

    // Set up logging
    let log_level = if debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let store = match storage {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::default_location()?,
    };

    match command {
        Command::Login { token } => {
            store.set_token(&token)?;
            info!("Token saved to {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            store.clear_token()?;
            info!("Token removed from {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Request(args) => {
            let orchestrator = build_orchestrator(base_url.as_deref(), store)?;
            run(&orchestrator, args.into_api_request()?).await
        }
        Command::Weather { params } => {
            let orchestrator = build_orchestrator(base_url.as_deref(), store)?;
            run(&orchestrator, weather_request(parse_pairs(&params)?)).await
        }
    }
}
