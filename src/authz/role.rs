use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Closed set of platform roles, declared in rank order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Student,
    Mentor,
    Instructor,
    Admin,
    Superadmin,
}

impl Role {
    pub const ALL: [Self; 6] = [
        Self::User,
        Self::Student,
        Self::Mentor,
        Self::Instructor,
        Self::Admin,
        Self::Superadmin,
    ];

    /// Position in the role rank table (`user` = 1 .. `superadmin` = 6).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::User => 1,
            Self::Student => 2,
            Self::Mentor => 3,
            Self::Instructor => 4,
            Self::Admin => 5,
            Self::Superadmin => 6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Student => "student",
            Self::Mentor => "mentor",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }

    /// Dashboard a freshly signed-in user of this role lands on.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Admin | Self::Superadmin => "/admin",
            Self::Mentor => "/mentor",
            Self::Student => "/student",
            // the role-gated dashboards admit exactly one role
            Self::Instructor | Self::User => "/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Parse(format!("unknown role: {value}")))
    }
}

/// String-level rank lookup. Unknown names rank 0 and never satisfy a
/// requirement.
#[must_use]
pub fn rank_of(role: &str) -> u8 {
    role.parse::<Role>().map_or(0, Role::rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_table_is_strictly_increasing() {
        let ranks: Vec<u8> = Role::ALL.iter().map(|role| role.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn parses_wire_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("Admin".parse::<Role>().is_err());
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn unknown_names_rank_zero() {
        assert_eq!(rank_of("superadmin"), 6);
        assert_eq!(rank_of("guest"), 0);
        assert_eq!(rank_of(""), 0);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Role::Superadmin).unwrap();
        assert_eq!(json, "\"superadmin\"");
        let role: Role = serde_json::from_str("\"mentor\"").unwrap();
        assert_eq!(role, Role::Mentor);
        assert!(serde_json::from_str::<Role>("\"teacher\"").is_err());
    }

    #[test]
    fn dashboards_by_role() {
        assert_eq!(Role::Superadmin.dashboard_path(), "/admin");
        assert_eq!(Role::Mentor.dashboard_path(), "/mentor");
        assert_eq!(Role::Instructor.dashboard_path(), "/dashboard");
        assert_eq!(Role::User.dashboard_path(), "/dashboard");
    }
}
