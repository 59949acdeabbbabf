use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use cyberquest_database::{
    Database,
    impls::users::get_user,
    model::user::{Role, UserAccount},
};

use crate::{Data, error::ApiError};

/// Identity carried by a verified bearer token. Carries no authority on its
/// own; role checks go through [`Access`].
#[derive(Clone, Debug)]
pub struct Caller {
    pub user_id: i64,
    pub username: String,
}

impl FromRequestParts<Data> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Data) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_owned()))?;

        let claims = state
            .credentials
            .verify_token(token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_owned()))?;

        Ok(Caller {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl Caller {
    /// Load the caller's account to make capability decisions on current data.
    pub async fn access(&self, db: &Database) -> Result<Access, ApiError> {
        let account = get_user(db, self.user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

        Ok(Access { account })
    }
}

/// The caller's account plus the capability checks gated operations start with.
#[derive(Clone, Debug)]
pub struct Access {
    account: UserAccount,
}

impl Access {
    pub fn new(account: UserAccount) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &UserAccount {
        &self.account
    }

    pub fn into_account(self) -> UserAccount {
        self.account
    }

    pub fn require_admin(self) -> Result<Self, ApiError> {
        if self.account.is_admin() {
            Ok(self)
        } else {
            Err(ApiError::Forbidden("Admin access required".to_owned()))
        }
    }

    /// Question authoring is open to instructors and admins.
    pub fn require_author(self) -> Result<Self, ApiError> {
        match self.account.role {
            Role::Instructor | Role::Admin => Ok(self),
            Role::Learner => Err(ApiError::Forbidden(
                "Instructor or admin role required".to_owned(),
            )),
        }
    }

    pub fn level_gate(&self) -> LevelGate {
        LevelGate::for_account(&self.account)
    }
}

/// How level requirements apply to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelGate {
    /// Admins reach every level.
    Bypass,
    Enforce { total_xp: i64, current_level: i32 },
}

impl LevelGate {
    pub fn for_account(account: &UserAccount) -> Self {
        if account.is_admin() {
            LevelGate::Bypass
        } else {
            LevelGate::Enforce {
                total_xp: account.total_xp,
                current_level: account.current_level,
            }
        }
    }

    /// Answering or viewing a question needs the stored level to reach the
    /// question's requirement.
    pub fn check_question_level(self, level_required: i32) -> Result<(), ApiError> {
        match self {
            LevelGate::Bypass => Ok(()),
            LevelGate::Enforce { current_level, .. } if current_level >= level_required => Ok(()),
            LevelGate::Enforce { .. } => Err(ApiError::Forbidden(format!(
                "You need to reach level {level_required} to access this question"
            ))),
        }
    }

    /// Starting a level explicitly needs enough XP to have unlocked it.
    pub fn check_level_unlock(self, level_number: i32, xp_required: i64) -> Result<(), ApiError> {
        match self {
            LevelGate::Bypass => Ok(()),
            LevelGate::Enforce { total_xp, .. } if total_xp >= xp_required => Ok(()),
            LevelGate::Enforce { total_xp, .. } => Err(ApiError::Forbidden(format!(
                "Level {level_number} requires {xp_required} XP; \
                 you have {total_xp} XP ({} XP short)",
                xp_required - total_xp
            ))),
        }
    }

    pub fn is_unlocked(self, xp_required: i64) -> bool {
        match self {
            LevelGate::Bypass => true,
            LevelGate::Enforce { total_xp, .. } => total_xp >= xp_required,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};
    use cyberquest_database::model::user::{Role, UserAccount};

    use super::{Access, LevelGate};
    use crate::error::ApiError;

    pub(crate) fn account(role: Role, total_xp: i64, current_level: i32) -> UserAccount {
        UserAccount {
            id: 7,
            username: "mallory".to_owned(),
            email: "mallory@example.com".to_owned(),
            total_xp,
            role,
            current_level,
            daily_streak: 0,
            last_activity_date: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn question_gate_names_required_level() {
        let gate = LevelGate::for_account(&account(Role::Learner, 120, 2));
        let Err(ApiError::Forbidden(message)) = gate.check_question_level(5) else {
            panic!("expected forbidden");
        };
        assert!(message.contains("level 5"));
        assert!(gate.check_question_level(2).is_ok());
    }

    #[test]
    fn unlock_gate_names_shortfall() {
        let gate = LevelGate::for_account(&account(Role::Learner, 95, 1));
        let Err(ApiError::Forbidden(message)) = gate.check_level_unlock(3, 250) else {
            panic!("expected forbidden");
        };
        assert!(message.contains("requires 250 XP"));
        assert!(message.contains("155 XP short"));
    }

    #[test]
    fn admins_bypass_level_gates() {
        let gate = LevelGate::for_account(&account(Role::Admin, 0, 1));
        assert_eq!(gate, LevelGate::Bypass);
        assert!(gate.check_question_level(7).is_ok());
        assert!(gate.check_level_unlock(7, 3500).is_ok());
        assert!(gate.is_unlocked(3500));
    }

    #[test]
    fn instructors_are_authors_but_not_admins() {
        let access = Access::new(account(Role::Instructor, 0, 1));
        assert!(access.clone().require_author().is_ok());
        assert!(access.require_admin().is_err());
        assert!(Access::new(account(Role::Learner, 0, 1)).require_author().is_err());
    }
}
