//! # Aula (session and role gate)
//!
//! `aula` is the client-side authorization gate of the Aula e-learning
//! platform. It decides who is signed in and which dashboards they may open;
//! everything visual lives elsewhere and consumes these types.
//!
//! ## Session
//!
//! [`session::SessionStore`] owns the bearer credential and the current
//! identity. It resolves a persisted credential once at startup against
//! `GET /auth/me`, signs in with `POST /auth/login`, creates accounts with
//! `POST /auth/register`, and signs out locally. A credential the service
//! rejects with `401` is purged; any other failure keeps it so a flaky network
//! does not sign anyone out.
//!
//! ## Authorization
//!
//! Two policies coexist and are kept apart on purpose:
//!
//! - [`authz::RankedPolicy`] is the "at least" check over the role rank table
//!   (`user` < `student` < `mentor` < `instructor` < `admin` < `superadmin`),
//!   exposed as [`session::SessionStore::has_permission`].
//! - [`authz::ExactAllowlistPolicy`] gates routes: `admin` admits admin and
//!   superadmin, every other requirement admits exactly that role.
//!
//! ## Route guard
//!
//! [`guard::RouteGuard`] waits while the session resolves, sends anonymous
//! visitors to the login route and visitors without the required role to the
//! landing route, and otherwise renders its children. Guards are UX only; the
//! API must enforce access on its own.

pub mod api;
pub mod authz;
pub mod cli;
pub mod config;
pub mod errors;
pub mod guard;
pub mod routes;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_the_crate() {
        assert!(APP_USER_AGENT.starts_with("aula/"));
    }

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
