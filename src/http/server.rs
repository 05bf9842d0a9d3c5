//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, tracing,
//!   timeouts, body limits, security headers)
//! - Match requests against the route table and enforce gates
//! - Dispatch matched requests to views and components
//! - Serve on a listener until the shutdown channel fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::any, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AuthConfig, ServerConfig, Settings, SettingsError};
use crate::http::handlers::dispatch;
use crate::http::middleware::gate_middleware;
use crate::http::render::{Renderer, ShellRenderer};
use crate::routing::RouteTable;
use crate::security::{self, SessionStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub sessions: Arc<dyn SessionStore>,
    pub renderer: Arc<dyn Renderer>,
    /// Name of the session cookie, from the resolved `session.cookie`.
    pub session_cookie: Arc<str>,
    pub auth: Arc<AuthConfig>,
    pub app_name: Arc<str>,
    pub app_url: Arc<str>,
}

impl AppState {
    /// Build state from resolved settings. Renders with [`ShellRenderer`]
    /// unless replaced through [`AppState::with_renderer`].
    pub fn new(
        settings: &Settings,
        routes: RouteTable,
        sessions: Arc<dyn SessionStore>,
        auth: AuthConfig,
    ) -> Result<Self, SettingsError> {
        let session = settings.session()?;
        let app = settings.app()?;
        Ok(Self {
            routes: Arc::new(routes),
            sessions,
            renderer: Arc::new(ShellRenderer),
            session_cookie: session.cookie.into(),
            auth: Arc::new(auth),
            app_name: app.name.into(),
            app_url: app.url.into(),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// HTTP server for the league site.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.security.enable_headers {
            security::headers::apply(router)
        } else {
            router
        }
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` receives a value or its sender is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
