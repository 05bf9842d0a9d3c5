//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup, in declaration order)
//!     → matcher.rs (evaluate method and path pattern)
//!     → Return: RouteMatch, MethodNotAllowed or NotFound
//!
//! Route Compilation (at startup):
//!     web.rs declarations
//!     → Parse path patterns
//!     → Check name uniqueness
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

use thiserror::Error;

pub mod matcher;
pub mod router;
pub mod web;

pub use router::{Gate, Handler, Route, RouteLookup, RouteMatch, RouteTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route name {0:?} is already registered")]
    DuplicateRouteName(String),

    #[error("route {0:?} has no name")]
    UnnamedRoute(String),

    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("no route named {0:?}")]
    UnknownRoute(String),

    #[error("route {route:?} requires parameter {param:?}")]
    MissingParameter { route: String, param: String },

    #[error("invalid base URL {base:?}: {reason}")]
    InvalidBaseUrl { base: String, reason: String },
}
