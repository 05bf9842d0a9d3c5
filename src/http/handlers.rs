//! Route handlers.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::render::{RenderContext, RenderError};
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::routing::{Handler, RouteMatch};
use crate::security::Identity;

/// Liveness check. Depends on nothing but the process being up.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Invoke the handler of the route matched by the gate middleware.
pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let Some(matched) = request.extensions().get::<RouteMatch>().cloned() else {
        tracing::error!(
            request_id = %request_id(request.headers()),
            "Dispatch reached without a matched route"
        );
        return response::server_error();
    };

    let identity = request.extensions().get::<Identity>().cloned();
    let ctx = RenderContext {
        app_name: &state.app_name,
        app_url: &state.app_url,
        matched: &matched,
        identity: identity.as_ref(),
        routes: &state.routes,
    };

    let rendered = match &matched.route.handler {
        Handler::Health => return health().await.into_response(),
        Handler::View(name) => state.renderer.view(name, &ctx),
        Handler::Component { name, action } => state.renderer.component(name, action.as_deref(), &ctx),
    };

    match rendered {
        Ok(html) => (
            [(header::CACHE_CONTROL, "no-cache, private")],
            Html(html),
        )
            .into_response(),
        Err(e) => render_failed(&request, &matched, e),
    }
}

fn render_failed(request: &Request<Body>, matched: &RouteMatch, error: RenderError) -> Response {
    tracing::error!(
        request_id = %request_id(request.headers()),
        route = %matched.route.name,
        handler = %matched.route.handler,
        error = %error,
        "Render failed"
    );
    response::server_error()
}
