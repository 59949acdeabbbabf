use cyberquest_database::{
    Database,
    impls::{
        levels::load_ladder,
        users::{
            apply_admin_floor, backfill_legacy_defaults, create_user, find_account_conflict,
            get_credentials_by_username, get_user,
        },
    },
    model::user::{AccountConflict, NewUser, Role, UserAccount},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Data,
    error::{ApiError, ApiResult, FieldError},
    progression::leveling::{ADMIN_XP_FLOOR, admin_level_floor},
};

const INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub total_xp: i64,
    pub role: Role,
    pub current_level: i32,
    pub daily_streak: i32,
}

impl From<UserAccount> for AccountView {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            total_xp: account.total_xp,
            role: account.role,
            current_level: account.current_level,
            daily_streak: account.daily_streak,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AccountView,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterBody {
    pub fn validate(self) -> Result<Registration, Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = self.username.unwrap_or_default().trim().to_owned();
        let username_len = username.chars().count();
        if !(3..=80).contains(&username_len) {
            errors.push(FieldError::new(
                "username",
                "username must be between 3 and 80 characters",
            ));
        }

        let email = self.email.unwrap_or_default().trim().to_owned();
        if email.is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        } else if !email.contains('@') {
            errors.push(FieldError::new("email", "email must be a valid address"));
        }

        let password = self.password.unwrap_or_default();
        if password.chars().count() < 6 {
            errors.push(FieldError::new(
                "password",
                "password must be at least 6 characters",
            ));
        }

        if errors.is_empty() {
            Ok(Registration {
                username,
                email,
                password,
            })
        } else {
            Err(errors)
        }
    }
}

fn conflict_error(conflict: AccountConflict) -> ApiError {
    match conflict {
        AccountConflict::Username => ApiError::Conflict("Username already exists".to_owned()),
        AccountConflict::Email => ApiError::Conflict("Email already exists".to_owned()),
    }
}

pub async fn register(data: &Data, body: RegisterBody) -> ApiResult<AuthResponse> {
    let registration = body.validate().map_err(ApiError::Validation)?;

    if let Some(conflict) =
        find_account_conflict(&data.db, &registration.username, &registration.email).await?
    {
        return Err(conflict_error(conflict));
    }

    let password_hash = data.credentials.hash_password(&registration.password)?;
    let account = create_user(
        &data.db,
        NewUser {
            username: &registration.username,
            email: &registration.email,
            password_hash: &password_hash,
            role: Role::Learner,
        },
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Username or email already exists".to_owned()))?;

    info!(user_id = account.id, username = %account.username, "registered new user");

    let token = data.credentials.issue_token(account.id, &account.username)?;
    Ok(AuthResponse {
        token,
        user: account.into(),
    })
}

pub async fn login(data: &Data, body: LoginBody) -> ApiResult<AuthResponse> {
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();
    if username.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_owned()));
    }

    let Some(credentials) = get_credentials_by_username(&data.db, username.trim()).await? else {
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_owned()));
    };

    if !data
        .credentials
        .verify_password(&password, &credentials.password_hash)
    {
        warn!(user_id = credentials.user_id, "failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_LOGIN.to_owned()));
    }

    if backfill_legacy_defaults(&data.db, credentials.user_id).await? {
        info!(user_id = credentials.user_id, "backfilled legacy account defaults");
    }

    let account = load_account(&data.db, credentials.user_id).await?;
    let token = data.credentials.issue_token(account.id, &account.username)?;

    Ok(AuthResponse {
        token,
        user: account.into(),
    })
}

pub async fn me(db: &Database, user_id: i64) -> ApiResult<AccountView> {
    Ok(load_account(db, user_id).await?.into())
}

/// Load an account with the admin floor applied.
pub async fn load_account(db: &Database, user_id: i64) -> ApiResult<UserAccount> {
    let account = get_user(db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_owned()))?;

    Ok(enforce_admin_floor(db, account).await?)
}

/// Keep admin accounts at the top of the ladder with at least
/// [`ADMIN_XP_FLOOR`] XP.
pub async fn enforce_admin_floor(
    db: &Database,
    account: UserAccount,
) -> anyhow::Result<UserAccount> {
    if !account.is_admin() {
        return Ok(account);
    }

    let ladder = load_ladder(db).await?;
    let min_level = admin_level_floor(&ladder);
    if !apply_admin_floor(db, account.id, ADMIN_XP_FLOOR, min_level).await? {
        return Ok(account);
    }

    info!(user_id = account.id, "raised admin account to xp and level floor");
    Ok(UserAccount {
        total_xp: account.total_xp.max(ADMIN_XP_FLOOR),
        current_level: account.current_level.max(min_level),
        ..account
    })
}

#[cfg(test)]
mod tests {
    use cyberquest_database::model::user::Role;

    use super::{AccountView, RegisterBody};
    use crate::caller::tests::account;

    #[test]
    fn registration_reports_every_bad_field() {
        let body = RegisterBody {
            username: Some("ab".to_owned()),
            email: Some("not-an-email".to_owned()),
            password: Some("12345".to_owned()),
        };
        let fields: Vec<_> = body
            .validate()
            .unwrap_err()
            .into_iter()
            .map(|error| error.field)
            .collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[test]
    fn registration_trims_identity_fields() {
        let registration = RegisterBody {
            username: Some("  alice ".to_owned()),
            email: Some(" alice@example.com ".to_owned()),
            password: Some("correct horse".to_owned()),
        }
        .validate()
        .unwrap();

        assert_eq!(registration.username, "alice");
        assert_eq!(registration.email, "alice@example.com");
        assert_eq!(registration.password, "correct horse");
    }

    #[test]
    fn missing_fields_are_reported() {
        let errors = RegisterBody::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[1].message, "email is required");
    }

    #[test]
    fn account_view_omits_private_fields() {
        let view = AccountView::from(account(Role::Instructor, 40, 1));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["role"], "instructor");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("last_activity_date").is_none());
    }
}
