//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (+ optional .env)
//!     → env.rs (read-only Environment snapshot)
//!
//! domains.rs (static ConfigDomain definitions)
//!     → resolver.rs (substitute, default, coerce, filter)
//!     → settings.rs (all domains, resolved once, immutable)
//!
//! server TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Resolution takes its environment as an argument; nothing reads
//!   process globals behind the caller's back
//! - Settings are resolved once per process; the environment is not
//!   expected to change at runtime
//! - Any resolution error is fatal at startup

pub mod domains;
pub mod env;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod settings;
pub mod validation;
pub mod value;

pub use env::{Capabilities, Environment};
pub use loader::ConfigError;
pub use resolver::{resolve, ResolveError, ResolvedConfig, Resolver};
pub use schema::{AuthConfig, LogFormat, ServerConfig};
pub use settings::{AppSettings, SessionSettings, Settings, SettingsError};
pub use value::{Coercion, ConfigDomain, ConfigValue, EnvRef, Scalar};
