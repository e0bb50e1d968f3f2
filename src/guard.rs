//! Route guard: gates a subtree behind authentication and, optionally, a
//! role. The guard is UX only; the API must enforce access on its own.
//!
//! Role requirements here use [`ExactAllowlistPolicy`], not the ranked check
//! the session store exposes: `admin` admits admin and superadmin, every
//! other requirement admits exactly that role.

use crate::{
    authz::{AccessPolicy, ExactAllowlistPolicy, Role},
    config::{AppConfig, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH},
    session::{state::SessionState, SessionStore},
};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

/// What the guard wants the caller to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Startup resolution is still running; show a neutral indicator.
    Waiting,
    /// Navigate away; render nothing.
    Redirect(String),
    /// Render the children unchanged.
    Render,
}

/// Result of [`RouteGuard::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome<T> {
    Waiting,
    Redirected(String),
    Rendered(T),
}

/// Performs redirects on behalf of the guard.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

/// Remembers every redirect, most recent last.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(path.to_string());
        }
    }
}

/// Pure guard evaluation over one state snapshot.
#[must_use]
pub fn evaluate(
    state: &SessionState,
    required_role: Option<Role>,
    login_path: &str,
    landing_path: &str,
) -> GuardDecision {
    if state.loading {
        return GuardDecision::Waiting;
    }

    let Some(identity) = state.identity.as_ref() else {
        return GuardDecision::Redirect(login_path.to_string());
    };

    match required_role {
        Some(required) if !ExactAllowlistPolicy.allows(Some(identity.role), required) => {
            GuardDecision::Redirect(landing_path.to_string())
        }
        _ => GuardDecision::Render,
    }
}

pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
    required_role: Option<Role>,
    login_path: String,
    landing_path: String,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    /// Guard over a session state receiver with the default redirect routes
    /// and no navigator.
    #[must_use]
    pub fn new(session: watch::Receiver<SessionState>, required_role: Option<Role>) -> Self {
        Self {
            session,
            required_role,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
            navigator: Arc::new(NoopNavigator),
        }
    }

    #[must_use]
    pub fn for_store(store: &SessionStore, required_role: Option<Role>) -> Self {
        Self::new(store.subscribe(), required_role)
    }

    /// Takes the login and landing routes from `config`.
    #[must_use]
    pub fn with_routes(mut self, config: &AppConfig) -> Self {
        self.login_path.clone_from(&config.login_path);
        self.landing_path.clone_from(&config.landing_path);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub const fn required_role(&self) -> Option<Role> {
        self.required_role
    }

    pub fn set_required_role(&mut self, required_role: Option<Role>) {
        self.required_role = required_role;
    }

    /// Decision for the current session state. Never cached.
    #[must_use]
    pub fn decide(&self) -> GuardDecision {
        let state = self.session.borrow();
        evaluate(
            &state,
            self.required_role,
            &self.login_path,
            &self.landing_path,
        )
    }

    /// Runs `children` only when access is granted; on a redirect the
    /// navigator is invoked and nothing is rendered.
    pub fn render<T>(&self, children: impl FnOnce() -> T) -> GuardOutcome<T> {
        match self.decide() {
            GuardDecision::Waiting => GuardOutcome::Waiting,
            GuardDecision::Redirect(path) => {
                debug!(target_path = %path, required = ?self.required_role, "guard redirect");
                self.navigator.navigate(&path);
                GuardOutcome::Redirected(path)
            }
            GuardDecision::Render => GuardOutcome::Rendered(children()),
        }
    }

    /// Waits for the next session transition and re-evaluates. Returns `None`
    /// once the session store has been dropped.
    pub async fn next_decision(&mut self) -> Option<GuardDecision> {
        self.session.changed().await.ok()?;
        Some(self.decide())
    }

    /// Waits until startup resolution has finished and returns the decision.
    pub async fn settled(&mut self) -> Option<GuardDecision> {
        self.session.wait_for(|state| !state.loading).await.ok()?;
        Some(self.decide())
    }
}
