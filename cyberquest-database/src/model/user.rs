use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Learner,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Learner, Role::Instructor, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored or submitted role name. Matching is case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "learner" => Some(Role::Learner),
            "instructor" => Some(Role::Instructor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user row with legacy NULL columns already resolved to their defaults.
#[derive(Clone, Debug, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub total_xp: i64,
    pub role: Role,
    pub current_level: i32,
    pub daily_streak: i32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Login lookup result; the hash never leaves the credential check.
#[derive(Clone, Debug)]
pub struct StoredCredentials {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: i64,
    pub username: String,
    pub total_xp: i64,
    pub current_level: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountConflict {
    Username,
    Email,
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Instructor "), Some(Role::Instructor));
        assert_eq!(Role::parse("LEARNER"), Some(Role::Learner));
        assert_eq!(Role::parse("moderator"), None);
    }

    #[test]
    fn role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
