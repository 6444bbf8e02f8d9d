use super::role::Role;
use crate::domain::session::is_auth_page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

const DASHBOARDS: [(&str, Role); 3] = [
    ("/admin", Role::Admin),
    ("/module-leader", Role::ModuleLeader),
    ("/teacher", Role::Teacher),
];

/// Role that owns the dashboard subtree `path` belongs to
fn dashboard_owner(path: &str) -> Option<Role> {
    DASHBOARDS.iter().find_map(|(prefix, role)| {
        let owned = path == *prefix
            || path
                .strip_prefix(prefix)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false);
        owned.then_some(*role)
    })
}

/// Decide whether a signed-in (or anonymous) user may open `path`
pub fn guard_route(path: &str, role: Option<Role>) -> RouteDecision {
    if is_auth_page(path) {
        return match role {
            Some(role) => RouteDecision::Redirect(role.dashboard_path().to_string()),
            None => RouteDecision::Allow,
        };
    }

    if path == "/" {
        return match role {
            Some(role) => RouteDecision::Redirect(role.dashboard_path().to_string()),
            None => RouteDecision::Redirect("/login".to_string()),
        };
    }

    match (dashboard_owner(path), role) {
        (None, _) => RouteDecision::Allow,
        (Some(_), None) => RouteDecision::Redirect("/login".to_string()),
        (Some(owner), Some(role)) if owner == role => RouteDecision::Allow,
        (Some(_), Some(role)) => RouteDecision::Redirect(role.dashboard_path().to_string()),
    }
}
