//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → middleware/gates.rs (match route table, enforce gates)
//!     → handlers.rs (health, views, components)
//!     → render.rs (HTML for views and component mounts)
//!     → response.rs (redirects, 401/403/404/405)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod render;
pub mod request;
pub mod response;
pub mod server;

pub use render::{RenderContext, RenderError, Renderer, ShellRenderer};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
