//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the environment snapshot and server configuration
//! - Resolve every settings domain before anything else runs
//! - Initialize logging, metrics and the session store in order
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)
//! - Shutdown has a deadline: connections still open after
//!   `timeouts.shutdown_grace_secs` are dropped

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::Level;

use crate::config::loader::{load_config, load_environment, load_settings};
use crate::config::{ConfigError, Environment, ServerConfig, Settings, SettingsError};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};
use crate::routing::web::web_routes;
use crate::routing::RouteError;
use crate::security::{MemorySessionStore, SessionStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Routes(#[from] RouteError),

    #[error("settings were already installed for this process")]
    AlreadyInstalled,

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where to read configuration from.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Server configuration TOML. Defaults apply when absent.
    pub config_path: Option<PathBuf>,
    /// Dotenv file supplementing the process environment.
    pub env_file: Option<PathBuf>,
}

/// Load server configuration and resolve all settings domains against
/// the process environment.
pub fn load(options: &StartupOptions) -> Result<(ServerConfig, Settings), StartupError> {
    load_with(options, Environment::from_process())
}

/// Like [`load`], over an explicit base environment.
pub fn load_with(
    options: &StartupOptions,
    base: Environment,
) -> Result<(ServerConfig, Settings), StartupError> {
    let env = load_environment(base, options.env_file.as_deref())?;
    let config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    let settings = load_settings(&config, &env)?;
    Ok((config, settings))
}

/// Assemble the HTTP server over `settings`. The returned store is the
/// one the server's gates consult.
pub fn build_server(
    config: ServerConfig,
    settings: &Settings,
) -> Result<(HttpServer, Arc<MemorySessionStore>), StartupError> {
    let routes = web_routes()?;
    let sessions = Arc::new(MemorySessionStore::from_settings(&settings.session()?));
    let store: Arc<dyn SessionStore> = sessions.clone();
    let state = AppState::new(settings, routes, store, config.auth.clone())?;
    Ok((HttpServer::new(config, state), sessions))
}

/// Run the `serve` command to completion.
pub async fn serve(options: StartupOptions) -> Result<(), StartupError> {
    let (config, settings) = load(&options)?;
    let settings = settings
        .install()
        .map_err(|_| StartupError::AlreadyInstalled)?;

    let level = settings
        .log_level()
        .and_then(logging::parse_level)
        .unwrap_or(Level::DEBUG);
    logging::init(config.observability.log_format, level)?;

    let app = settings.app()?;
    tracing::info!(
        name = %app.name,
        env = %app.env,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let (server, _sessions) = build_server(config, settings)?;

    let shutdown = Shutdown::new();
    let signals = shutdown.listen_for_signals();
    let mut stop = shutdown.subscribe();
    let mut server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let outcome = tokio::select! {
        res = &mut server => res,
        _ = stop.recv() => match tokio::time::timeout(grace, &mut server).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs(), "Shutdown deadline passed, dropping connections");
                server.abort();
                Ok(Ok(()))
            }
        },
    };
    signals.abort();
    outcome??;

    tracing::info!("Shutdown complete");
    Ok(())
}
