//! Security subsystem.
//!
//! # Components
//! - session.rs: who a session cookie or bearer token belongs to
//! - headers.rs: default security response headers
//!
//! # Design Decisions
//! - Authentication itself (login, password checks) is external; the
//!   store is the only seam
//! - Gates are evaluated by the HTTP layer (`http::middleware::gates`)

pub mod headers;
pub mod session;

pub use session::{Identity, MemorySessionStore, SessionStore};
