//! Session store: the single source of truth for who is signed in.
//!
//! A store is constructed explicitly around an [`AuthService`] and a
//! [`CredentialStorage`]; there is no process-wide singleton, so tests and
//! embedders can run isolated instances side by side. State transitions are
//! published on a `tokio::sync::watch` channel and observers (route guards,
//! the CLI) re-read the latest snapshot; concurrent writers are
//! last-writer-wins.
//!
//! Flow Overview: `resolve_session` runs once at startup and turns a persisted
//! credential into an identity via `/auth/me`. `login` and `register` replace
//! the identity wholesale and persist the new credential. `logout` is purely
//! local and cannot fail.
//!
//! Only this module reads or writes the persisted credential, and it must
//! never log token material.

pub mod client;
pub mod state;
pub mod storage;
pub mod types;

use crate::{
    api::GENERIC_HTTP_ERROR,
    authz::{AccessPolicy, RankedPolicy, Role},
    config::AppConfig,
    errors::AppError,
};
use client::{AuthService, HttpAuthService, WhoAmI};
use regex::Regex;
use secrecy::ExposeSecret;
use state::{SessionPhase, SessionState};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use storage::{Credential, CredentialStorage, FileCredentialStorage};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use types::{Identity, LoginRequest, RegisterRequest};

/// Fallback shown when a failed login carries no usable message.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Result of a login attempt. Failures are values, not errors: the caller
/// renders the message inline and the session is left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success(Identity),
    Failure { message: String },
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure message, if the login failed.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { message } => Some(message),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    auth: Arc<dyn AuthService>,
    storage: Arc<dyn CredentialStorage>,
    state: watch::Sender<SessionState>,
    resolve_started: AtomicBool,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthService>, storage: Arc<dyn CredentialStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::initial());
        Self {
            inner: Arc::new(Inner {
                auth,
                storage,
                state,
                resolve_started: AtomicBool::new(false),
            }),
        }
    }

    /// Store backed by the HTTP auth service and the file credential storage
    /// described by `config`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the HTTP client cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let auth = HttpAuthService::new(config)?;
        let storage = FileCredentialStorage::new(config.storage_path.clone());
        Ok(Self::new(Arc::new(auth), Arc::new(storage)))
    }

    /// Latest state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every subsequent transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.state.borrow().identity.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase()
    }

    /// Ranked "at least" check for the current identity.
    #[must_use]
    pub fn has_permission(&self, required: Role) -> bool {
        RankedPolicy.allows(self.inner.state.borrow().role(), required)
    }

    /// Whether a credential is currently persisted. Storage read failures
    /// count as absent.
    #[must_use]
    pub fn credential_present(&self) -> bool {
        matches!(self.inner.storage.load(), Ok(Some(_)))
    }

    /// Signs in with email and password.
    ///
    /// On success the credential is persisted and the identity replaced. On
    /// failure the existing session is left exactly as it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return LoginOutcome::failure("Email and password are required.");
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let success = match self.inner.auth.login(&request).await {
            Ok(success) => success,
            Err(err) => {
                debug!(error = %err, "login rejected");
                return LoginOutcome::failure(login_failure_message(&err));
            }
        };

        if let Err(err) = self.inner.storage.store(&success.credential) {
            warn!(error = %err, "failed to persist credential after login");
            return LoginOutcome::failure("Unable to persist session");
        }

        info!(role = %success.identity.role, "signed in");
        self.settle(Some(success.identity.clone()));
        LoginOutcome::Success(success.identity)
    }

    /// Creates an account and signs in with it.
    ///
    /// # Errors
    /// Propagates local validation failures, auth service errors and
    /// credential persistence failures; the caller is responsible for showing
    /// them. The session is untouched on error.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Identity, AppError> {
        let request = validate_registration(request)?;
        let success = self.inner.auth.register(&request).await?;
        self.inner.storage.store(&success.credential)?;

        info!(role = %success.identity.role, "registered and signed in");
        self.settle(Some(success.identity.clone()));
        Ok(success.identity)
    }

    /// Clears the session locally. Never fails; a storage error is logged and
    /// the in-memory identity is cleared regardless.
    pub fn logout(&self) {
        if let Err(err) = self.inner.storage.purge() {
            warn!(error = %err, "failed to purge persisted credential");
        }
        self.settle(None);
        info!("signed out");
    }

    /// Resolves the persisted credential into an identity. Runs at most once
    /// per store; later calls return the current state untouched.
    ///
    /// - no credential: anonymous, no network call;
    /// - accepted: authenticated;
    /// - rejected (401): credential purged, anonymous;
    /// - anything else: credential kept, loading cleared, identity untouched.
    #[instrument(skip(self))]
    pub async fn resolve_session(&self) -> SessionState {
        if self.inner.resolve_started.swap(true, Ordering::SeqCst) {
            debug!("session already resolved");
            return self.state();
        }

        self.inner.state.send_modify(|state| {
            state.resolving = true;
            state.loading = true;
        });

        let credential = match self.inner.storage.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!("no persisted credential");
                return self.finish_loading(|_| {});
            }
            Err(err) => {
                warn!(error = %err, "persisted credential unreadable");
                return self.finish_loading(|_| {});
            }
        };

        match self.inner.auth.who_am_i(&credential).await {
            WhoAmI::Success(identity) => {
                if self.still_persisted(&credential) {
                    info!(role = %identity.role, "session restored");
                    self.finish_loading(|state| state.identity = Some(identity))
                } else {
                    debug!("credential replaced during resolution; keeping newer session");
                    self.finish_loading(|_| {})
                }
            }
            WhoAmI::Rejected => {
                if self.still_persisted(&credential) {
                    if let Err(err) = self.inner.storage.purge() {
                        warn!(error = %err, "failed to purge rejected credential");
                    }
                    info!("stored credential rejected; session cleared");
                    self.finish_loading(|state| state.identity = None)
                } else {
                    debug!("credential replaced during resolution; keeping newer session");
                    self.finish_loading(|_| {})
                }
            }
            WhoAmI::NetworkError(err) => {
                warn!(error = %err, "could not verify stored credential; keeping it");
                self.finish_loading(|_| {})
            }
        }
    }

    /// Replaces the identity after an explicit login, register or logout.
    /// The session is known from here on, so a pending or later startup
    /// resolution must not leave the store loading or overwrite it.
    fn settle(&self, identity: Option<Identity>) {
        self.inner.resolve_started.store(true, Ordering::SeqCst);
        self.inner.state.send_modify(|state| {
            state.identity = identity;
            state.loading = false;
        });
    }

    fn finish_loading(&self, update: impl FnOnce(&mut SessionState)) -> SessionState {
        self.inner.state.send_modify(|state| {
            update(state);
            state.loading = false;
        });
        let state = self.state();
        debug!(phase = ?state.phase(), "session resolution finished");
        state
    }

    fn still_persisted(&self, credential: &Credential) -> bool {
        match self.inner.storage.load() {
            Ok(Some(current)) => {
                current.secret().expose_secret() == credential.secret().expose_secret()
            }
            Ok(None) | Err(_) => true,
        }
    }
}

fn login_failure_message(err: &AppError) -> String {
    match err {
        AppError::Http { message, .. } if message != GENERIC_HTTP_ERROR => message.clone(),
        _ => LOGIN_FAILED_MESSAGE.to_string(),
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

fn validate_registration(mut request: RegisterRequest) -> Result<RegisterRequest, AppError> {
    request.first_name = request.first_name.trim().to_string();
    request.last_name = request.last_name.trim().to_string();
    request.email = request.email.trim().to_string();

    if request.first_name.is_empty() || request.last_name.is_empty() {
        return Err(AppError::Validation(
            "First and last name are required.".to_string(),
        ));
    }
    if !valid_email(&request.email) {
        return Err(AppError::Validation(
            "A valid email address is required.".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }
    Ok(request)
}
