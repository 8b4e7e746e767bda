//! Educational center site server
//!
//! Main entry point: loads configuration, mirrors the remote content and
//! serves the public site and admin console API.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use edu_content::{
    create_router, AdminGate, AppState, Config, ContentStore, GeminiOutlineClient, LoadSummary,
    PreferenceStore,
};
use edu_remote::{MemoryStore, RemoteStore, RestClient};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Educational center site server
///
/// Serves the trilingual public site content and the admin console API,
/// backed by a hosted table service.
#[derive(Parser, Debug)]
#[command(name = "edu-site")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: edu-site.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Port for the HTTP API server (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Keep all content in memory instead of using the remote table service
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Edu site starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs the server until Ctrl+C.
///
/// 1. Load config and apply environment secrets
/// 2. Build the remote store, outline client, admin gate and preferences
/// 3. Start the startup load in the background
/// 4. Serve the API with graceful shutdown
async fn run_server(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    config.apply_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;

    let offline = args.offline || config.remote.is_offline();
    print_config(&config, offline);

    let remote = build_remote(&config, offline)?;
    let content = Arc::new(ContentStore::new(remote));
    let outline = GeminiOutlineClient::new(config.ai.gemini_config())?;
    let admin = AdminGate::new(
        config.admin.username.clone(),
        config.admin.password.clone(),
        config.admin.login_delay(),
    );
    let preferences = PreferenceStore::load(&config.preferences_file);

    if config.admin.password.is_empty() {
        tracing::warn!("No admin password configured; the admin console is disabled");
    }
    if config.ai.api_key.is_empty() {
        tracing::warn!("No AI API key configured; outline drafts will fail");
    }

    // The API answers 503 until every startup read has settled.
    let loader = Arc::clone(&content);
    tokio::spawn(async move {
        let summary = loader.load().await;
        print_load_summary(&summary);
    });

    let state = AppState {
        content,
        outline: Arc::new(outline),
        admin: Arc::new(admin),
        preferences: Arc::new(Mutex::new(preferences)),
    };
    let router = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Use --port to choose a different port"
        )
    })?;
    println!("HTTP API server running on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("Server stopped");
    Ok(())
}

/// Loads configuration from the specified path or the default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn build_remote(config: &Config, offline: bool) -> anyhow::Result<Arc<dyn RemoteStore>> {
    if offline {
        tracing::info!("Running offline; content lives in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let client = RestClient::new(config.remote.rest_config())?;
    tracing::info!(url = %client.base_url(), "Using remote table service");
    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    println!();
    println!("Received Ctrl+C, shutting down...");
}

fn print_config(config: &Config, offline: bool) {
    println!("Configuration loaded:");
    if offline {
        println!("  Remote store: in-memory (offline)");
    } else {
        println!("  Remote store: {}", config.remote.url);
    }
    println!("  AI model: {}", config.ai.model);
    println!("  Admin user: {}", config.admin.username);
    println!("  Preferences file: {}", config.preferences_file);
    println!("  Port: {}", config.port);
}

fn print_load_summary(summary: &LoadSummary) {
    if summary.fallbacks.is_empty() {
        println!("Site content loaded from the remote store");
        return;
    }
    let tables: Vec<String> = summary.fallbacks.iter().map(ToString::to_string).collect();
    println!(
        "Site content loaded; using built-in content for: {}",
        tables.join(", ")
    );
}
