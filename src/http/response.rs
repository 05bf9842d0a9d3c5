//! Canned responses for rejected and unroutable requests.
//!
//! # Design Decisions
//! - Browsers are redirected (302), JSON clients get a status code and a
//!   `{"message": ...}` body
//! - `405` always carries an `Allow` header

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

pub fn unauthenticated(json: bool, login_path: &str) -> Response {
    if json {
        message(StatusCode::UNAUTHORIZED, "Unauthenticated.")
    } else {
        redirect(login_path)
    }
}

pub fn unverified(json: bool, verification_path: &str) -> Response {
    if json {
        message(StatusCode::FORBIDDEN, "Your email address is not verified.")
    } else {
        redirect(verification_path)
    }
}

pub fn not_found(json: bool) -> Response {
    if json {
        message(StatusCode::NOT_FOUND, "Not Found")
    } else {
        (StatusCode::NOT_FOUND, "Not Found").into_response()
    }
}

pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, allow)],
        "Method Not Allowed",
    )
        .into_response()
}

pub fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
}
