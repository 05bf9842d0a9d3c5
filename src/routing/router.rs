//! Route table and lookup.
//!
//! # Responsibilities
//! - Store routes in declaration order
//! - Look up the first route matching a request
//! - Distinguish "path known, method not" from "no such path"
//! - Generate URLs for named routes
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in insertion order; first match wins
//! - Explicit NotFound rather than silent default

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use url::Url;

use crate::routing::matcher::{MethodMatcher, PathPattern};
use crate::routing::RouteError;

/// A named precondition evaluated before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// `auth:sanctum`: a bearer token or session cookie identifies a user.
    Authenticated,
    /// `auth.session`: a cookie session is still live; touching it
    /// extends its idle lifetime.
    AuthSession,
    /// `verified`: the user's email address is verified.
    Verified,
}

impl Gate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::Authenticated => "auth:sanctum",
            Gate::AuthSession => "auth.session",
            Gate::Verified => "verified",
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What serves a matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Liveness check; touches no configuration or session state.
    Health,
    /// A server-rendered view.
    View(String),
    /// A live component, optionally entered through a named action.
    Component { name: String, action: Option<String> },
}

impl Handler {
    pub fn view(name: impl Into<String>) -> Self {
        Handler::View(name.into())
    }

    pub fn component(name: impl Into<String>) -> Self {
        Handler::Component {
            name: name.into(),
            action: None,
        }
    }

    pub fn component_action(name: impl Into<String>, action: impl Into<String>) -> Self {
        Handler::Component {
            name: name.into(),
            action: Some(action.into()),
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Health => write!(f, "health"),
            Handler::View(name) => write!(f, "view:{}", name),
            Handler::Component { name, action: None } => write!(f, "component:{}", name),
            Handler::Component { name, action: Some(action) } => write!(f, "component:{}@{}", name, action),
        }
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub method: MethodMatcher,
    pub pattern: PathPattern,
    pub handler: Handler,
    pub gates: Vec<Gate>,
}

/// An uncompiled route declaration.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    method: Method,
    path: String,
    handler: Handler,
    name: Option<String>,
}

impl RouteSpec {
    pub fn new(method: Method, path: impl Into<String>, handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            name: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub fn get(path: impl Into<String>, handler: Handler) -> RouteSpec {
    RouteSpec::new(Method::GET, path, handler)
}

/// A matched route with its captured path parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of looking a request up in the table.
#[derive(Debug, Clone)]
pub enum RouteLookup {
    Found(RouteMatch),
    /// The path exists but not for this method.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Ordered, immutable route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    names: HashSet<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an ungated route.
    pub fn add(&mut self, spec: RouteSpec) -> Result<(), RouteError> {
        self.push(spec, &[])
    }

    /// Declare routes that all share the same ordered gate chain.
    pub fn group<F>(&mut self, gates: &[Gate], declare: F) -> Result<(), RouteError>
    where
        F: FnOnce(&mut RouteGroup<'_>) -> Result<(), RouteError>,
    {
        let mut group = RouteGroup {
            table: self,
            gates: gates.to_vec(),
        };
        declare(&mut group)
    }

    fn push(&mut self, spec: RouteSpec, gates: &[Gate]) -> Result<(), RouteError> {
        let name = spec
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RouteError::UnnamedRoute(spec.path.clone()))?;
        if self.names.contains(&name) {
            return Err(RouteError::DuplicateRouteName(name));
        }
        let pattern = PathPattern::parse(&spec.path)?;

        self.names.insert(name.clone());
        self.routes.push(Arc::new(Route {
            name,
            method: MethodMatcher::new(spec.method),
            pattern,
            handler: spec.handler,
            gates: gates.to_vec(),
        }));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|r| r.as_ref())
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.iter().find(|r| r.name == name)
    }

    /// Find the first route matching the request.
    pub fn match_request(&self, req: &Request<Body>) -> RouteLookup {
        let mut allowed: Vec<Method> = Vec::new();
        for route in &self.routes {
            let Some(params) = route.pattern.captures(req.uri().path()) else {
                continue;
            };
            if route.method.accepts(req.method()) {
                return RouteLookup::Found(RouteMatch {
                    route: Arc::clone(route),
                    params,
                });
            }
            for method in route.method.allowed() {
                if !allowed.contains(&method) {
                    allowed.push(method);
                }
            }
        }

        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            RouteLookup::MethodNotAllowed(allowed)
        }
    }

    /// Path for a named route. Parameters the pattern does not use are
    /// appended as a query string.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let route = self
            .by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        let lookup = |param: &str| params.iter().find(|(k, _)| *k == param).map(|(_, v)| *v);
        let mut path = route
            .pattern
            .render(lookup)
            .map_err(|param| RouteError::MissingParameter {
                route: name.to_string(),
                param,
            })?;

        let used: Vec<&str> = route.pattern.params().collect();
        let extra: Vec<&(&str, &str)> = params.iter().filter(|(k, _)| !used.contains(k)).collect();
        if !extra.is_empty() {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for (k, v) in extra {
                query.append_pair(k, v);
            }
            path.push('?');
            path.push_str(&query.finish());
        }
        Ok(path)
    }

    /// Absolute URL for a named route under `base` (the application URL).
    pub fn absolute_url(&self, base: &str, name: &str, params: &[(&str, &str)]) -> Result<Url, RouteError> {
        let path = self.url_for(name, params)?;
        let joined = format!("{}{}", base.trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| RouteError::InvalidBaseUrl {
            base: base.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Routes declared inside [`RouteTable::group`].
pub struct RouteGroup<'t> {
    table: &'t mut RouteTable,
    gates: Vec<Gate>,
}

impl RouteGroup<'_> {
    pub fn add(&mut self, spec: RouteSpec) -> Result<(), RouteError> {
        self.table.push(spec, &self.gates)
    }
}
