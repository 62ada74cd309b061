//! config-admin
//!
//! Serves a configuration file through the admin API, reloading it when it
//! changes on disk.
//!
//! ```text
//!   operator ──HTTP──▶ admin router ──▶ Store ◀── watcher ◀── file edits
//!                                         │
//!                                         └──save──▶ config file
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use config_admin::admin::{self, auth::Authenticator, AllowAll, BearerToken};
use config_admin::config::{Format, Store, StoreOptions};
use config_admin::observability::logging;
use config_admin::{record, scalar};

#[derive(Parser, Debug)]
#[command(name = "config-admin", version, about = "Admin API for a configuration file")]
struct Args {
    /// Configuration file (.json, .toml, .yaml). Created with defaults if missing.
    #[arg(long, env = "CONFIG_ADMIN_FILE", default_value = "config-admin.toml")]
    config: PathBuf,

    #[arg(long, env = "CONFIG_ADMIN_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Bearer token required on every admin request.
    #[arg(long, env = "CONFIG_ADMIN_API_KEY")]
    api_key: Option<String>,

    /// Write the file after every accepted change.
    #[arg(long, env = "CONFIG_ADMIN_AUTO_SAVE")]
    auto_save: bool,

    /// Preview submissions and require confirmation before applying.
    #[arg(long)]
    no_auto_apply: bool,

    #[arg(long, env = "CONFIG_ADMIN_DEBOUNCE_MS", default_value_t = 500)]
    debounce_ms: u64,

    #[arg(long, env = "CONFIG_ADMIN_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

scalar!(LogLevel);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Listener {
    host: String,
    port: u16,
    tls: bool,
}

record!(Listener {
    host as "Host" { required },
    port as "Port" { min = 1, max = 65535 },
    tls as "TLS" { label = "Enable TLS" },
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Upstream {
    name: String,
    url: String,
    weight: u32,
    #[serde(default)]
    tags: Vec<String>,
}

record!(Upstream {
    name as "Name" { required, max_len = 64 },
    url as "URL" { required, pattern = "https?://.+" },
    weight as "Weight" { min = 0, max = 100 },
    tags as "Tags",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DemoConfig {
    name: String,
    version: String,
    log_level: LogLevel,
    listener: Listener,
    #[serde(default)]
    upstreams: Vec<Upstream>,
    #[serde(default)]
    allowed_origins: Vec<String>,
}

record!(DemoConfig {
    name as "Name" { required, help = "Shown in the admin header" },
    version as "Version" { readonly },
    log_level as "LogLevel" { label = "Log level", options = ["debug", "info", "warn", "error"] },
    listener as "Listener",
    upstreams as "Upstreams",
    allowed_origins as "AllowedOrigins" { label = "Allowed origins" },
});

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            name: "demo".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            log_level: LogLevel::Info,
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 8443,
                tls: true,
            },
            upstreams: vec![Upstream {
                name: "primary".into(),
                url: "http://127.0.0.1:9000".into(),
                weight: 100,
                tags: vec!["default".into()],
            }],
            allowed_origins: Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.json_logs).context("failed to initialise logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "config-admin starting");

    if !args.config.exists() {
        let format = Format::from_path(&args.config)?;
        let bytes = format.encode(&DemoConfig::default())?;
        std::fs::write(&args.config, bytes)
            .with_context(|| format!("failed to create {}", args.config.display()))?;
        tracing::info!(path = %args.config.display(), "Wrote default configuration");
    }

    let options = StoreOptions::new()
        .auto_apply(!args.no_auto_apply)
        .auto_save(args.auto_save)
        .watch(true)
        .debounce(Duration::from_millis(args.debounce_ms))
        .on_error(|e| tracing::warn!(error = %e, "Ignoring invalid configuration on disk"));

    let store = Store::<DemoConfig>::load(&args.config, options)?;
    store.subscribe(|event| {
        tracing::info!(source = %event.source, path = %event.path, "Configuration changed");
    });

    let auth: Arc<dyn Authenticator> = match args.api_key {
        Some(key) => Arc::new(BearerToken::new(key)),
        None => {
            tracing::warn!("No API key configured, admin API is unauthenticated");
            Arc::new(AllowAll)
        }
    };

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, admin::router(store.clone(), auth))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.stop();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
