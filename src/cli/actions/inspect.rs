use crate::{
    authz::Role,
    config::AppConfig,
    guard::{GuardOutcome, RecordingNavigator, RouteGuard},
    routes::RouteTable,
    session::{state::SessionPhase, SessionStore},
};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct WhoAmIArgs {
    pub config: AppConfig,
}

#[derive(Debug)]
pub struct VisitArgs {
    pub config: AppConfig,
    pub path: String,
}

#[derive(Debug)]
pub struct CanArgs {
    pub config: AppConfig,
    pub role: Role,
}

/// Resolve the persisted session and describe it.
/// # Errors
/// Returns an error if the session store cannot be constructed.
pub async fn whoami(args: WhoAmIArgs) -> Result<String> {
    let store = SessionStore::from_config(&args.config)?;
    let state = store.resolve_session().await;

    Ok(match (state.phase(), state.identity) {
        (SessionPhase::Authenticated, Some(identity)) => format!(
            "{} <{}> ({})",
            identity.display_name(),
            identity.email,
            identity.role
        ),
        _ if store.credential_present() => {
            "Not signed in (stored session could not be verified)".to_string()
        }
        _ => "Not signed in".to_string(),
    })
}

/// Run the route guard for a path.
/// # Errors
/// Returns an error for unknown routes.
pub async fn visit(args: VisitArgs) -> Result<String> {
    let table = RouteTable::default();
    let Some(route) = table.lookup(&args.path) else {
        bail!("no route matches {}", args.path);
    };

    let Some(required_role) = route.access.guard_requirement() else {
        return Ok(format!("render {}", args.path));
    };

    let store = SessionStore::from_config(&args.config)?;
    let navigator = Arc::new(RecordingNavigator::new());
    let mut guard = RouteGuard::for_store(&store, required_role)
        .with_routes(&args.config)
        .with_navigator(navigator.clone());

    store.resolve_session().await;
    let decision = guard.settled().await;
    debug!(?decision, path = %args.path, "guard settled");

    Ok(match guard.render(|| args.path.clone()) {
        GuardOutcome::Rendered(path) => format!("render {path}"),
        GuardOutcome::Redirected(target) => format!("redirect {} -> {target}", args.path),
        GuardOutcome::Waiting => "waiting".to_string(),
    })
}

/// Ranked permission check for the current identity.
/// # Errors
/// Returns an error if the session store cannot be constructed.
pub async fn can(args: CanArgs) -> Result<String> {
    let store = SessionStore::from_config(&args.config)?;
    store.resolve_session().await;

    let verdict = if store.has_permission(args.role) {
        "allowed"
    } else {
        "denied"
    };
    Ok(format!("{verdict}: at least {}", args.role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{path::Path, time::Duration};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, storage: &Path) -> AppConfig {
        AppConfig::new(&server.uri())
            .unwrap()
            .with_storage_path(storage)
            .with_timeout(Duration::from_secs(2))
    }

    async fn mount_me(server: &MockServer, role: &str) {
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1",
                "firstName": "Sam",
                "lastName": "Rivera",
                "email": "sam@aula.dev",
                "role": role
            })))
            .mount(server)
            .await;
    }

    fn seeded_storage(dir: &Path) -> std::path::PathBuf {
        let storage = dir.join("session.json");
        std::fs::write(&storage, r#"{"token":"tok"}"#).unwrap();
        storage
    }

    #[tokio::test]
    async fn visit_public_route_skips_session() {
        let server = MockServer::start().await;
        let temp_dir = tempfile::tempdir().unwrap();
        let report = visit(VisitArgs {
            config: config(&server, &temp_dir.path().join("session.json")),
            path: "/courses/rust-101".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(report, "render /courses/rust-101");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn visit_mentor_route_as_admin_redirects_to_landing() {
        let server = MockServer::start().await;
        mount_me(&server, "admin").await;
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = seeded_storage(temp_dir.path());

        let report = visit(VisitArgs {
            config: config(&server, &storage),
            path: "/mentor".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(report, "redirect /mentor -> /dashboard");

        let report = visit(VisitArgs {
            config: config(&server, &storage),
            path: "/admin/users".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(report, "render /admin/users");
    }

    #[tokio::test]
    async fn visit_without_session_redirects_to_login() {
        let server = MockServer::start().await;
        let temp_dir = tempfile::tempdir().unwrap();

        let report = visit(VisitArgs {
            config: config(&server, &temp_dir.path().join("session.json")),
            path: "/dashboard".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(report, "redirect /dashboard -> /login");
    }

    #[tokio::test]
    async fn visit_unknown_route_fails() {
        let server = MockServer::start().await;
        let temp_dir = tempfile::tempdir().unwrap();
        let result = visit(VisitArgs {
            config: config(&server, &temp_dir.path().join("session.json")),
            path: "/nowhere".to_string(),
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn whoami_and_can_use_resolved_identity() {
        let server = MockServer::start().await;
        mount_me(&server, "instructor").await;
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = seeded_storage(temp_dir.path());

        let report = whoami(WhoAmIArgs {
            config: config(&server, &storage),
        })
        .await
        .unwrap();
        assert_eq!(report, "Sam Rivera <sam@aula.dev> (instructor)");

        let report = can(CanArgs {
            config: config(&server, &storage),
            role: Role::Mentor,
        })
        .await
        .unwrap();
        assert_eq!(report, "allowed: at least mentor");

        let report = can(CanArgs {
            config: config(&server, &storage),
            role: Role::Admin,
        })
        .await
        .unwrap();
        assert_eq!(report, "denied: at least admin");
    }

    #[tokio::test]
    async fn whoami_reports_unverified_session_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = seeded_storage(temp_dir.path());

        let report = whoami(WhoAmIArgs {
            config: config(&server, &storage),
        })
        .await
        .unwrap();
        assert_eq!(report, "Not signed in (stored session could not be verified)");
        assert!(storage.exists());
    }
}
