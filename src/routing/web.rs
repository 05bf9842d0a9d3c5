//! Web routes for the league site.

use crate::routing::router::{get, Gate, Handler, RouteTable};
use crate::routing::RouteError;

/// Gate chain protecting every league-management page.
pub const MEMBER_GATES: &[Gate] = &[Gate::Authenticated, Gate::AuthSession, Gate::Verified];

pub fn web_routes() -> Result<RouteTable, RouteError> {
    let mut table = RouteTable::new();

    table.add(get("/", Handler::view("welcome")).name("welcome"))?;

    // Load balancer liveness check.
    table.add(get("/health", Handler::Health).name("health"))?;

    table.group(MEMBER_GATES, |group| {
        group.add(get("/dashboard", Handler::view("dashboard")).name("dashboard"))?;
        group.add(get("/games", Handler::component("crud-game")).name("games"))?;
        group.add(get("/teams", Handler::component("crud-team")).name("teams"))?;
        group.add(get("/fixtures", Handler::component("crud-fixture")).name("fixtures"))?;
        group.add(get("/players", Handler::component("crud-player")).name("players"))?;
        group.add(get("/stats", Handler::component("stat")).name("stats"))?;
        group.add(
            get("/stats-create/{id}/type", Handler::component_action("stat", "create"))
                .name("stats-create"),
        )
    })?;

    Ok(table)
}
