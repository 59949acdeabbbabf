use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::Context as _;
use cyberquest_utils::parse::{non_blank, parse_flag};
use tracing::{info, warn};

/// Credentials for the account promoted to admin at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub auto_run_migrations: bool,
    pub development: bool,
    pub xp_policy_path: Option<PathBuf>,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let development = env::var("APP_ENV")
            .map(|value| value.trim().eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        Ok(Self {
            port: try_load("PORT", 5000),
            database_url: required("DATABASE_URL")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", 5),
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", 24),
            auto_run_migrations: flag("AUTO_RUN_MIGRATIONS", true),
            development,
            xp_policy_path: optional("XP_POLICY_PATH").map(PathBuf::from),
            admin: admin_bootstrap(),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    let value = env::var(key).ok();
    non_blank(value.as_deref()).map(str::to_owned)
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("missing {key} environment variable"))
}

fn flag(key: &str, default: bool) -> bool {
    optional(key).map_or(default, |value| parse_flag(&value))
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = optional(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.parse().unwrap_or_else(|err| {
        warn!("Invalid {key} value `{raw}`: {err}; using default: {default}");
        default
    })
}

fn admin_bootstrap() -> Option<AdminBootstrap> {
    let username = optional("ADMIN_USERNAME");
    let email = optional("ADMIN_EMAIL");
    let password = optional("ADMIN_PASSWORD");

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) => Some(AdminBootstrap {
            username,
            email,
            password,
        }),
        (None, None, None) => None,
        _ => {
            warn!(
                "ADMIN_USERNAME, ADMIN_EMAIL and ADMIN_PASSWORD must all be set; \
                 skipping admin bootstrap"
            );
            None
        }
    }
}
