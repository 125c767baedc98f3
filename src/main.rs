//! Compilation coordination server.
//!
//! A long-running server that registers build configs at startup and
//! serves compiled artifacts over HTTP, caching per-config compilation
//! byproducts between requests.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │            COMPILATION SERVER                 │
//!                    │                                               │
//!   Client Request   │  ┌──────────┐   ┌─────────┐   ┌───────────┐  │
//!   ─────────────────┼─▶│ listener │──▶│  router │──▶│ handlers  │  │
//!                    │  │ (tcp/tls)│   │ (axum)  │   └─────┬─────┘  │
//!                    │  └──────────┘   └─────────┘         │        │
//!                    │                            ┌────────▼──────┐ │
//!                    │   ┌─────────────────┐      │ config lookup │ │
//!                    │   │ compile pool    │◀─────│ + overrides   │ │
//!                    │   │ (bounded slots) │      └───────────────┘ │
//!                    │   └────────┬────────┘                        │
//!                    │            ▼                                 │
//!                    │   ┌─────────────────┐   ┌─────────────────┐  │
//!   Client Response  │   │ external        │──▶│ result cache    │  │
//!   ◀────────────────┼───│ compiler        │   │ (maps, externs) │  │
//!                    │   └─────────────────┘   └─────────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! Startup registers one config per CLI argument; a duplicate id or an
//! unparseable config file aborts before the listener binds.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compile_server::cache::ResultCache;
use compile_server::compiler::CommandCompiler;
use compile_server::config::loader;
use compile_server::config::schema::{ServerSettings, TlsSettings};
use compile_server::config::validation;
use compile_server::http::HttpServer;
use compile_server::lifecycle::Shutdown;
use compile_server::net::tls;
use compile_server::observability::metrics;
use compile_server::registry::ConfigRegistry;

#[derive(Parser)]
#[command(name = "compile-server")]
#[command(about = "Serve compiled artifacts for a set of build configs", long_about = None)]
struct Cli {
    /// Address to listen on (overrides the settings file).
    #[arg(long)]
    listen: Option<String>,

    /// Port to listen on (overrides the settings file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve HTTPS; requires --cert and --key.
    #[arg(long)]
    https: bool,

    /// Certificate file (PEM) for --https.
    #[arg(long, requires = "https")]
    cert: Option<PathBuf>,

    /// Private key file (PEM) for --https.
    #[arg(long, requires = "https")]
    key: Option<PathBuf>,

    /// Server settings file (TOML). Defaults apply when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Config files to serve, one compilation unit each (JSON).
    #[arg(required = true)]
    configs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match serve(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("compile-server: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = resolve_settings(&cli)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "compile_server={},tower_http=info",
                    settings.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        bind_address = %settings.listener.bind_address(),
        tls = settings.listener.tls.is_some(),
        compile_slots = settings.compile.max_concurrent,
        "Configuration loaded"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Register all of the configs before anything listens.
    let registry = ConfigRegistry::new();
    for path in &cli.configs {
        let config = loader::load_config_file(path)
            .map_err(|e| format!("{}: {e}", path.display()))?;
        registry
            .register(config)
            .map_err(|e| format!("{}: {e}", path.display()))?;
    }
    tracing::info!(configs = registry.len(), ids = ?registry.ids(), "Configs registered");

    let compiler = Arc::new(CommandCompiler::new(
        settings.compile.command.clone(),
        settings.compile.args.clone(),
        Duration::from_secs(settings.compile.timeout_secs),
    ));
    let server = HttpServer::new(
        settings.clone(),
        registry,
        ResultCache::new(),
        compiler,
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    match &settings.listener.tls {
        Some(tls_settings) => {
            let addr: SocketAddr = settings
                .listener
                .bind_address()
                .parse()
                .map_err(|_| "listener address must be ip:port when TLS is enabled")?;
            let tls_config =
                tls::load_tls_config(&tls_settings.cert_path, &tls_settings.key_path).await?;
            server.run_tls(addr, tls_config, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(settings.listener.bind_address()).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<ServerSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => loader::load_settings(path)
            .map_err(|e| format!("{}: {e}", path.display()))?,
        None => ServerSettings::default(),
    };

    if let Some(listen) = &cli.listen {
        settings.listener.listen = listen.clone();
    }
    if let Some(port) = cli.port {
        settings.listener.port = port;
    }
    if cli.https {
        let (cert, key) = match (&cli.cert, &cli.key) {
            (Some(cert), Some(key)) => (cert.clone(), key.clone()),
            _ => return Err("--https requires both --cert and --key".into()),
        };
        settings.listener.tls = Some(TlsSettings {
            cert_path: cert,
            key_path: key,
        });
    }

    validation::validate_settings(&settings).map_err(|errors| {
        format!(
            "invalid settings: {}",
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    Ok(settings)
}
