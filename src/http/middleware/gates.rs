//! Gate middleware.
//! Matches the route table and enforces each route's gate chain.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::{bearer_token, cookie, request_id, wants_json};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::{Gate, RouteLookup};
use crate::security::{Identity, SessionStore};

/// Why a gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unauthenticated,
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Credential {
    Session(String),
    Token,
}

/// Lazily authenticates the request the first time a gate needs a user.
struct Guard<'a> {
    req: &'a Request<Body>,
    sessions: &'a dyn SessionStore,
    cookie_name: &'a str,
    user: Option<Option<(Identity, Credential)>>,
}

impl Guard<'_> {
    fn user(&mut self) -> Option<&(Identity, Credential)> {
        if self.user.is_none() {
            self.user = Some(self.authenticate());
        }
        self.user.as_ref().and_then(Option::as_ref)
    }

    fn authenticate(&self) -> Option<(Identity, Credential)> {
        let headers = self.req.headers();
        if let Some(id) = cookie(headers, self.cookie_name) {
            if let Some(identity) = self.sessions.session(id) {
                return Some((identity, Credential::Session(id.to_string())));
            }
        }
        let token = bearer_token(headers)?;
        self.sessions
            .token(token)
            .map(|identity| (identity, Credential::Token))
    }
}

/// Evaluate `gates` in order, stopping at the first failure. Returns the
/// authenticated identity when any gate looked one up.
pub fn evaluate(
    gates: &[Gate],
    req: &Request<Body>,
    sessions: &dyn SessionStore,
    cookie_name: &str,
) -> Result<Option<Identity>, Rejection> {
    let mut guard = Guard {
        req,
        sessions,
        cookie_name,
        user: None,
    };

    for gate in gates {
        match gate {
            Gate::Authenticated => {
                guard.user().ok_or(Rejection::Unauthenticated)?;
            }
            // Only cookie sessions are tracked; token and anonymous
            // requests pass through.
            Gate::AuthSession => {
                if let Some((_, Credential::Session(id))) = guard.user() {
                    if !sessions.touch(id) {
                        return Err(Rejection::Unauthenticated);
                    }
                }
            }
            Gate::Verified => match guard.user() {
                Some((identity, _)) if identity.email_verified => {}
                _ => return Err(Rejection::Unverified),
            },
        }
    }

    Ok(guard.user.flatten().map(|(identity, _)| identity))
}

pub async fn gate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = req.method().to_string();
    let json = wants_json(req.headers());

    let matched = match state.routes.match_request(&req) {
        RouteLookup::Found(matched) => matched,
        RouteLookup::MethodNotAllowed(allowed) => {
            let res = response::method_not_allowed(&allowed);
            metrics::record_request(&method, res.status().as_u16(), "none", start_time);
            return res;
        }
        RouteLookup::NotFound => {
            tracing::debug!(path = %req.uri().path(), "No route matched");
            let res = response::not_found(json);
            metrics::record_request(&method, res.status().as_u16(), "none", start_time);
            return res;
        }
    };

    let route_name = matched.route.name.clone();
    let outcome = evaluate(
        &matched.route.gates,
        &req,
        state.sessions.as_ref(),
        &state.session_cookie,
    );

    let res = match outcome {
        Ok(identity) => {
            if let Some(identity) = identity {
                req.extensions_mut().insert(identity);
            }
            req.extensions_mut().insert(matched);
            next.run(req).await
        }
        Err(rejection) => {
            tracing::debug!(
                request_id = %request_id(req.headers()),
                route = %route_name,
                ?rejection,
                "Request rejected by gate"
            );
            match rejection {
                Rejection::Unauthenticated => response::unauthenticated(json, &state.auth.login_path),
                Rejection::Unverified => response::unverified(json, &state.auth.verification_path),
            }
        }
    };

    metrics::record_request(&method, res.status().as_u16(), &route_name, start_time);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::MemorySessionStore;
    use std::time::Duration;

    const COOKIE: &str = "laravel_session";
    const ALL: &[Gate] = &[Gate::Authenticated, Gate::AuthSession, Gate::Verified];

    fn identity(verified: bool) -> Identity {
        Identity {
            user_id: 3,
            name: "Referee".into(),
            email_verified: verified,
        }
    }

    fn request(header: Option<(&str, String)>) -> Request<Body> {
        let mut builder = Request::builder().uri("/games");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::default()).unwrap()
    }

    #[test]
    fn test_no_gates_no_identity() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert_eq!(evaluate(&[], &request(None), &store, COOKIE), Ok(None));
    }

    #[test]
    fn test_anonymous_rejected_first_gate() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert_eq!(
            evaluate(ALL, &request(None), &store, COOKIE),
            Err(Rejection::Unauthenticated)
        );
    }

    #[test]
    fn test_session_cookie_passes() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.start(identity(true));
        let req = request(Some(("cookie", format!("{}={}", COOKIE, id))));
        assert_eq!(evaluate(ALL, &req, &store, COOKIE), Ok(Some(identity(true))));
    }

    #[test]
    fn test_bearer_token_passes() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let token = store.issue_token(identity(true));
        let req = request(Some(("authorization", format!("Bearer {}", token))));
        assert_eq!(evaluate(ALL, &req, &store, COOKIE), Ok(Some(identity(true))));
    }

    #[test]
    fn test_unverified_rejected() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.start(identity(false));
        let req = request(Some(("cookie", format!("{}={}", COOKIE, id))));
        assert_eq!(evaluate(ALL, &req, &store, COOKIE), Err(Rejection::Unverified));
    }

    #[test]
    fn test_expired_session_rejected() {
        let store = MemorySessionStore::new(Duration::ZERO);
        let id = store.start(identity(true));
        let req = request(Some(("cookie", format!("{}={}", COOKIE, id))));
        assert_eq!(evaluate(ALL, &req, &store, COOKIE), Err(Rejection::Unauthenticated));
    }

    #[test]
    fn test_wrong_cookie_name_ignored() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        let id = store.start(identity(true));
        let req = request(Some(("cookie", format!("other_session={}", id))));
        assert_eq!(evaluate(ALL, &req, &store, COOKIE), Err(Rejection::Unauthenticated));
    }

    #[test]
    fn test_gate_order_matters() {
        let store = MemorySessionStore::new(Duration::from_secs(60));
        assert_eq!(
            evaluate(&[Gate::Verified, Gate::Authenticated], &request(None), &store, COOKIE),
            Err(Rejection::Unverified)
        );
        assert_eq!(evaluate(&[Gate::AuthSession], &request(None), &store, COOKIE), Ok(None));
    }
}
