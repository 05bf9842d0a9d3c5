//! View and component rendering seam.
//!
//! Server-side templates and the live component runtime are external.
//! [`ShellRenderer`] produces the HTML document those components mount
//! into; a deployment can swap in its own [`Renderer`].

use std::fmt::Write;

use thiserror::Error;

use crate::routing::{RouteMatch, RouteTable};
use crate::security::Identity;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown view {0:?}")]
    UnknownView(String),

    #[error("unknown component {0:?}")]
    UnknownComponent(String),

    #[error("component {component:?} has no action {action:?}")]
    UnknownAction { component: String, action: String },
}

/// Everything a renderer may use for one request.
pub struct RenderContext<'a> {
    pub app_name: &'a str,
    /// Public base URL (`app.url`) for absolute links.
    pub app_url: &'a str,
    pub matched: &'a RouteMatch,
    pub identity: Option<&'a Identity>,
    pub routes: &'a RouteTable,
}

pub trait Renderer: Send + Sync {
    fn view(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String, RenderError>;

    fn component(
        &self,
        name: &str,
        action: Option<&str>,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError>;
}

/// Navigation entries shown to signed-in members: (route name, label).
const MEMBER_NAV: &[(&str, &str)] = &[
    ("dashboard", "Dashboard"),
    ("games", "Games"),
    ("teams", "Teams"),
    ("fixtures", "Fixtures"),
    ("players", "Players"),
    ("stats", "Stats"),
];

/// (component, title, actions)
const COMPONENTS: &[(&str, &str, &[&str])] = &[
    ("crud-game", "Games", &[]),
    ("crud-team", "Teams", &[]),
    ("crud-fixture", "Fixtures", &[]),
    ("crud-player", "Players", &[]),
    ("stat", "Stats", &["create"]),
];

/// Renders an HTML shell with a mount point for each component.
#[derive(Debug, Default, Clone)]
pub struct ShellRenderer;

impl ShellRenderer {
    fn page(&self, ctx: &RenderContext<'_>, title: &str, main: &str) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{} | {}</title>\n</head>\n<body>\n",
            escape(title),
            escape(ctx.app_name)
        );
        if ctx.identity.is_some() {
            out.push_str("<nav>\n");
            for (route, label) in MEMBER_NAV {
                if let Ok(href) = ctx.routes.url_for(route, &[]) {
                    let _ = writeln!(out, "<a href=\"{}\">{}</a>", escape(&href), label);
                }
            }
            out.push_str("</nav>\n");
        }
        out.push_str(main);
        out.push_str("\n</body>\n</html>\n");
        out
    }
}

impl Renderer for ShellRenderer {
    fn view(&self, name: &str, ctx: &RenderContext<'_>) -> Result<String, RenderError> {
        let main = match name {
            "welcome" => {
                let link = match ctx.routes.absolute_url(ctx.app_url, "dashboard", &[]) {
                    Ok(href) => format!("<a href=\"{}\">Enter the league</a>", escape(href.as_str())),
                    Err(_) => String::new(),
                };
                format!("<main>\n<h1>{}</h1>\n{}\n</main>", escape(ctx.app_name), link)
            }
            "dashboard" => {
                let who = ctx.identity.map(|i| i.name.as_str()).unwrap_or("member");
                format!("<main>\n<h1>Dashboard</h1>\n<p>Welcome back, {}.</p>\n</main>", escape(who))
            }
            other => return Err(RenderError::UnknownView(other.to_string())),
        };
        let title = if name == "welcome" { "Welcome" } else { "Dashboard" };
        Ok(self.page(ctx, title, &main))
    }

    fn component(
        &self,
        name: &str,
        action: Option<&str>,
        ctx: &RenderContext<'_>,
    ) -> Result<String, RenderError> {
        let (_, title, actions) = COMPONENTS
            .iter()
            .find(|(component, _, _)| *component == name)
            .ok_or_else(|| RenderError::UnknownComponent(name.to_string()))?;

        let mut main = format!("<main data-component=\"{}\"", escape(name));
        if let Some(action) = action {
            if !actions.contains(&action) {
                return Err(RenderError::UnknownAction {
                    component: name.to_string(),
                    action: action.to_string(),
                });
            }
            let _ = write!(main, " data-action=\"{}\"", escape(action));
        }
        for (key, value) in &ctx.matched.params {
            let _ = write!(main, " data-param-{}=\"{}\"", escape(key), escape(value));
        }
        let _ = write!(main, ">\n<h1>{}</h1>\n</main>", escape(title));

        Ok(self.page(ctx, title, &main))
    }
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::web::web_routes;
    use crate::routing::RouteLookup;
    use axum::body::Body;
    use axum::http::Request;

    fn matched(routes: &RouteTable, uri: &str) -> RouteMatch {
        let req = Request::builder().uri(uri).body(Body::default()).unwrap();
        match routes.match_request(&req) {
            RouteLookup::Found(m) => m,
            other => panic!("unexpected lookup {:?}", other),
        }
    }

    fn member() -> Identity {
        Identity {
            user_id: 1,
            name: "Ana <Captain>".into(),
            email_verified: true,
        }
    }

    #[test]
    fn test_component_mount_point() {
        let routes = web_routes().unwrap();
        let m = matched(&routes, "/stats-create/4/type");
        let identity = member();
        let ctx = RenderContext {
            app_name: "Sis Champions",
            app_url: "https://league.test",
            matched: &m,
            identity: Some(&identity),
            routes: &routes,
        };

        let html = ShellRenderer.component("stat", Some("create"), &ctx).unwrap();
        assert!(html.contains("data-component=\"stat\""));
        assert!(html.contains("data-action=\"create\""));
        assert!(html.contains("data-param-id=\"4\""));
        assert!(html.contains("<a href=\"/games\">Games</a>"));
    }

    #[test]
    fn test_unknown_component_and_action() {
        let routes = web_routes().unwrap();
        let m = matched(&routes, "/games");
        let ctx = RenderContext {
            app_name: "league",
            app_url: "https://league.test",
            matched: &m,
            identity: None,
            routes: &routes,
        };

        assert!(matches!(
            ShellRenderer.component("crud-referee", None, &ctx),
            Err(RenderError::UnknownComponent(_))
        ));
        assert!(matches!(
            ShellRenderer.component("crud-game", Some("delete"), &ctx),
            Err(RenderError::UnknownAction { .. })
        ));
        assert!(matches!(ShellRenderer.view("standings", &ctx), Err(RenderError::UnknownView(_))));
    }

    #[test]
    fn test_views_escape_user_data() {
        let routes = web_routes().unwrap();
        let m = matched(&routes, "/dashboard");
        let identity = member();
        let ctx = RenderContext {
            app_name: "league",
            app_url: "https://league.test",
            matched: &m,
            identity: Some(&identity),
            routes: &routes,
        };

        let html = ShellRenderer.view("dashboard", &ctx).unwrap();
        assert!(html.contains("Ana &lt;Captain&gt;"));
        assert!(!html.contains("<Captain>"));
    }

    #[test]
    fn test_welcome_has_no_member_nav() {
        let routes = web_routes().unwrap();
        let m = matched(&routes, "/");
        let ctx = RenderContext {
            app_name: "Sis Champions",
            app_url: "https://league.test",
            matched: &m,
            identity: None,
            routes: &routes,
        };

        let html = ShellRenderer.view("welcome", &ctx).unwrap();
        assert!(html.contains("<h1>Sis Champions</h1>"));
        assert!(html.contains("href=\"https://league.test/dashboard\""));
        assert!(!html.contains("<nav>"));
    }
}
