//! The two access policies used by the client. They intentionally disagree:
//! `RankedPolicy` answers "is this role at least X", while
//! `ExactAllowlistPolicy` is what route gating uses and only admits the roles
//! listed for each requirement.

use super::role::{rank_of, Role};

/// Decides whether the current role (absent when signed out) meets a
/// required role.
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, current: Option<Role>, required: Role) -> bool;
}

/// Monotonic "at least" check over the role rank table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RankedPolicy;

impl AccessPolicy for RankedPolicy {
    fn allows(&self, current: Option<Role>, required: Role) -> bool {
        current.is_some_and(|role| role.rank() >= required.rank())
    }
}

/// Route gating policy: `admin` admits admin and superadmin, every other
/// requirement admits exactly that role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExactAllowlistPolicy;

impl ExactAllowlistPolicy {
    /// Roles admitted for a requirement.
    #[must_use]
    pub fn admitted(required: Role) -> &'static [Role] {
        match required {
            Role::Admin => &[Role::Admin, Role::Superadmin],
            Role::Superadmin => &[Role::Superadmin],
            Role::Instructor => &[Role::Instructor],
            Role::Mentor => &[Role::Mentor],
            Role::Student => &[Role::Student],
            Role::User => &[Role::User],
        }
    }
}

impl AccessPolicy for ExactAllowlistPolicy {
    fn allows(&self, current: Option<Role>, required: Role) -> bool {
        current.is_some_and(|role| Self::admitted(required).contains(&role))
    }
}

/// String-level ranked check. Absent or unknown current roles are denied, and
/// an unknown requirement can never be met.
#[must_use]
pub fn has_permission(current: Option<&str>, required: &str) -> bool {
    let Some(current) = current else {
        return false;
    };
    let required_rank = rank_of(required);
    if required_rank == 0 {
        return false;
    }
    rank_of(current) >= required_rank
}
