//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use league_web::config::loader::load_settings;
use league_web::config::{Environment, ServerConfig, Settings};
use league_web::lifecycle::startup::build_server;
use league_web::security::{Identity, MemorySessionStore};

/// Resolve settings against an explicit environment snapshot.
pub fn settings(vars: &[(&str, &str)]) -> Settings {
    let env: Environment = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    load_settings(&ServerConfig::default(), &env).unwrap()
}

/// Fully layered router plus the session store its gates consult.
pub fn app(vars: &[(&str, &str)]) -> (Router, Arc<MemorySessionStore>) {
    let (server, sessions) = build_server(ServerConfig::default(), &settings(vars)).unwrap();
    (server.router(), sessions)
}

pub fn member(verified: bool) -> Identity {
    Identity {
        user_id: 7,
        name: "Coach Rivera".into(),
        email_verified: verified,
    }
}

/// Send one request through `router`.
pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.unwrap()
}

pub fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
