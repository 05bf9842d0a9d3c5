//! Request middleware.

pub mod gates;

pub use gates::{evaluate, gate_middleware, Rejection};
