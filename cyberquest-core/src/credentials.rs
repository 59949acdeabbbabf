use std::fmt;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use cyberquest_utils::time::now_unix_secs;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

/// Password hashing and bearer token signing.
#[derive(Clone)]
pub struct CredentialService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl_secs: u64,
}

impl fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialService")
            .field("keys", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl CredentialService {
    pub fn new(secret: &str, token_ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs: token_ttl_hours.max(1).saturating_mul(3600),
        }
    }

    /// Argon2id PHC string for `password` with a fresh salt.
    pub fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?;
        Ok(hash.to_string())
    }

    /// False for a wrong password and for a stored hash that does not parse.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            debug!("stored password hash is not a PHC string");
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn issue_token(&self, user_id: i64, username: &str) -> anyhow::Result<String> {
        let iat = now_unix_secs();
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            iat,
            exp: iat.saturating_add(self.token_ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| anyhow!("failed to sign token: {err}"))
    }

    /// Claims of a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                debug!(?err, "rejected bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialService;

    #[test]
    fn password_hash_verifies() {
        let service = CredentialService::new("test-secret", 1);
        let hash = service.hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(service.verify_password("hunter22", &hash));
        assert!(!service.verify_password("hunter23", &hash));
        assert!(!service.verify_password("hunter22", "not-a-hash"));
    }

    #[test]
    fn token_carries_identity() {
        let service = CredentialService::new("test-secret", 24);
        let token = service.issue_token(42, "alice").unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = CredentialService::new("secret-a", 1);
        let verifier = CredentialService::new("secret-b", 1);
        let token = issuer.issue_token(1, "bob").unwrap();
        assert!(verifier.verify_token(&token).is_none());
        assert!(verifier.verify_token("garbage").is_none());
    }

    #[test]
    fn debug_hides_keys() {
        let service = CredentialService::new("super-secret", 1);
        assert!(!format!("{service:?}").contains("super-secret"));
    }
}
