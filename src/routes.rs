//! Route table for the client: which paths are public, which need a session,
//! and which are gated on a role.

use crate::authz::Role;

/// Access requirement attached to a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Never consults the guard.
    Public,
    /// Needs a session, any role.
    Authenticated,
    /// Needs a session whose role satisfies the route guard policy.
    Role(Role),
}

impl Access {
    /// Requirement handed to the route guard; `None` for public routes.
    #[must_use]
    pub const fn guard_requirement(self) -> Option<Option<Role>> {
        match self {
            Self::Public => None,
            Self::Authenticated => Some(None),
            Self::Role(role) => Some(Some(role)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub access: Access,
}

impl Route {
    pub fn new(path: impl Into<String>, access: Access) -> Self {
        Self {
            path: path.into(),
            access,
        }
    }

    fn matches(&self, path: &str) -> bool {
        if self.path == "/" {
            return path == "/";
        }
        path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub const fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Most specific route for `path`: an exact match, or the longest route
    /// that prefixes it on a segment boundary. Query strings and fragments are
    /// ignored.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Route> {
        let path = normalize(path);
        self.routes
            .iter()
            .filter(|route| route.matches(&path))
            .max_by_key(|route| route.path.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route::new("/", Access::Public),
            Route::new("/login", Access::Public),
            Route::new("/register", Access::Public),
            Route::new("/courses", Access::Public),
            Route::new("/mentors", Access::Public),
            Route::new("/dashboard", Access::Authenticated),
            Route::new("/notifications", Access::Authenticated),
            Route::new("/admin", Access::Role(Role::Admin)),
            Route::new("/mentor", Access::Role(Role::Mentor)),
            Route::new("/student", Access::Role(Role::Student)),
        ])
    }
}

fn normalize(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{AccessPolicy, ExactAllowlistPolicy};

    #[test]
    fn exact_and_nested_lookups() {
        let table = RouteTable::default();
        assert_eq!(
            table.lookup("/admin").map(|route| route.access),
            Some(Access::Role(Role::Admin))
        );
        assert_eq!(
            table.lookup("/admin/users/42").map(|route| route.access),
            Some(Access::Role(Role::Admin))
        );
        assert_eq!(
            table.lookup("/courses/rust-101?tab=syllabus").map(|route| route.access),
            Some(Access::Public)
        );
    }

    #[test]
    fn prefix_must_end_on_segment_boundary() {
        let table = RouteTable::default();
        // `/mentors` is public browsing, `/mentor` is the mentor dashboard.
        assert_eq!(
            table.lookup("/mentors/7").map(|route| route.path.as_str()),
            Some("/mentors")
        );
        assert_eq!(
            table.lookup("/mentor/sessions").map(|route| route.path.as_str()),
            Some("/mentor")
        );
        assert!(table.lookup("/administrator").is_none());
    }

    #[test]
    fn root_only_matches_itself() {
        let table = RouteTable::default();
        assert_eq!(table.lookup("/").map(|route| route.access), Some(Access::Public));
        assert!(table.lookup("/unknown").is_none());
    }

    #[test]
    fn normalizes_input() {
        let table = RouteTable::default();
        assert_eq!(
            table.lookup("student/").map(|route| route.path.as_str()),
            Some("/student")
        );
    }

    #[test]
    fn guard_requirements() {
        assert_eq!(Access::Public.guard_requirement(), None);
        assert_eq!(Access::Authenticated.guard_requirement(), Some(None));
        assert_eq!(
            Access::Role(Role::Mentor).guard_requirement(),
            Some(Some(Role::Mentor))
        );
    }

    #[test]
    fn every_role_is_admitted_to_its_dashboard() {
        let table = RouteTable::default();
        for role in Role::ALL {
            let route = table.lookup(role.dashboard_path()).unwrap();
            let admitted = match route.access {
                Access::Public | Access::Authenticated => true,
                Access::Role(required) => ExactAllowlistPolicy.allows(Some(role), required),
            };
            assert!(admitted, "{role} cannot open {}", route.path);
        }
    }
}
