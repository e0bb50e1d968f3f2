use crate::{authz::Role, session::types::Identity};

/// Lifecycle of a session store:
/// `Uninitialized -> Loading -> {Authenticated, Anonymous}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

/// Snapshot published to observers on every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub loading: bool,
    /// Whether startup resolution has begun; distinguishes `Uninitialized`
    /// from `Loading`.
    pub resolving: bool,
}

impl SessionState {
    /// Fresh store state. Consumers see `loading = true` until startup
    /// resolution completes so guards never redirect prematurely.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            identity: None,
            loading: true,
            resolving: false,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.role)
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match (self.loading, self.resolving, self.identity.is_some()) {
            (true, false, _) => SessionPhase::Uninitialized,
            (true, true, _) => SessionPhase::Loading,
            (false, _, true) => SessionPhase::Authenticated,
            (false, _, false) => SessionPhase::Anonymous,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}
