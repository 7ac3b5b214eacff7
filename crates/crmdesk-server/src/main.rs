//! CRMDesk Server
//!
//! This server provides:
//! - A server-rendered page shell themed per tenant (resolved from `Host`)
//! - `/theme.css` with the tenant's CSS custom properties
//! - `/api/*` forwarding to the CRM backend with duplicate-call blocking
//! - Health, readiness and Prometheus metrics endpoints
//!
//! Usage:
//! ```bash
//! # With config file
//! crmdesk-server --config config.yaml
//!
//! # Or with environment variables
//! CRMDESK_BACKEND_URL=https://crm.internal crmdesk-server
//!
//! # Print the theme a host would get
//! crmdesk-server theme --host acme.example.com
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use crmdesk_egress::{HttpTransport, Transport};
use crmdesk_observability::Metrics;
use crmdesk_server::{AppState, ServerConfig, build_router};
use crmdesk_theme::{ResolvedTheme, TenantVerifier, ThemeResolver, resolve_tenant_with_default};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// CRMDesk Server - multi-tenant CRM front end
#[derive(Parser)]
#[command(name = "crmdesk-server")]
#[command(about = "CRMDesk server with per-tenant theming", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "CRMDESK_CONFIG", global = true)]
    config: Option<String>,

    /// Port to listen on (overrides config and environment)
    #[arg(short, long, value_name = "PORT", global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the CRMDesk server (default if no command specified)
    Serve,
    /// Resolve and print the theme for a host
    Theme {
        /// Host header value, e.g. acme.example.com
        #[arg(long)]
        host: String,

        /// Skip tenant verification and print the default palette
        #[arg(long, default_value = "false")]
        offline: bool,

        /// Print the resolved theme as JSON instead of CSS
        #[arg(long, default_value = "false")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => ServerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path))?,
        None => ServerConfig::default(),
    };

    // Environment overrides the file, CLI overrides both
    config.merge_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    match cli.command {
        Some(Commands::Theme {
            host,
            offline,
            json,
        }) => {
            init_tracing(&config.logging.level, true)?;
            print_theme(&config, &host, offline, json).await
        }
        Some(Commands::Serve) | None => {
            init_tracing(&config.logging.level, false)?;
            if let Some(path) = &cli.config {
                info!("📁 Loaded configuration from: {}", path);
            }
            serve(config).await
        }
    }
}

fn init_tracing(level: &str, to_stderr: bool) -> anyhow::Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!("{}", log_level));

    // `theme` prints to stdout, so its logs go to stderr
    if to_stderr {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

async fn print_theme(
    config: &ServerConfig,
    host: &str,
    offline: bool,
    json: bool,
) -> anyhow::Result<()> {
    let theme = if offline {
        let tenant = resolve_tenant_with_default(host, &config.theme.default_tenant);
        ResolvedTheme::fallback(tenant, "offline")
    } else {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.backend.client)?);
        let verifier = TenantVerifier::new(transport, config.theme.verify_url.clone());
        ThemeResolver::new(verifier, config.theme.resolver_config())
            .resolve(Some(host))
            .await
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&theme)?);
    } else {
        print!("{}", theme.css());
    }

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("🚀 Initializing CRMDesk server");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid listen address")?;

    info!("   Backend:             {}", config.backend.base_url);
    info!("   Tenant verification: {}", config.theme.verify_url);

    let metrics = Arc::new(Metrics::new()?);
    let state = AppState::from_config(config, metrics)?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;

    info!("");
    info!("✅ CRMDesk listening on http://{}", addr);
    info!("   - App shell:          http://{}/", addr);
    info!("   - Tenant theme:       http://{}/theme.css", addr);
    info!("   - Active calls:       http://{}/internal/calls", addr);
    info!("   Observability:");
    info!("   - Health check:       http://{}/healthz", addr);
    info!("   - Readiness check:    http://{}/readyz", addr);
    info!("   - Prometheus metrics: http://{}/metrics", addr);
    info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
