//! League web backend.
//!
//! Serves the league management site: environment-driven settings,
//! named routes behind authentication gates, and the HTML shell the
//! live components mount into.
//!
//! # Architecture Overview
//!
//! ```text
//!   environment (+ .env)        server.toml
//!          │                         │
//!          ▼                         ▼
//!   ┌──────────────┐          ┌─────────────┐
//!   │   config     │          │   config    │
//!   │  resolver    │          │   loader    │
//!   └──────┬───────┘          └──────┬──────┘
//!          │ Settings                │ ServerConfig
//!          ▼                         ▼
//!   ┌─────────────────────────────────────────┐
//!   │   http server → gates → handlers        │
//!   │        │          │          │          │
//!   │     routing    security    render       │
//!   └─────────────────────────────────────────┘
//!          │
//!   lifecycle (startup, signals, shutdown) · observability
//! ```

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::{ServerConfig, Settings};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
