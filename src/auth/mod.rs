use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;

/// Contents of the signed session cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Server-side session id; the token is only honoured while it is stored
    pub jti: String,
    pub user_id: i64,
    pub logged_in: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Session secret not configured")]
    InvalidSecret,
    #[error("Session token generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid session token: {0}")]
    InvalidToken(String),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// A freshly signed session: the cookie token plus what the store must record
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signing material and cookie settings for sessions, built once at startup
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_name: String,
    max_age_hours: u64,
    secure: bool,
}

impl SessionKeys {
    pub fn from_config(config: &SessionConfig) -> Result<Self, AuthError> {
        if config.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            cookie_name: config.cookie_name.clone(),
            max_age_hours: config.max_age_hours,
            secure: config.secure_cookie,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, user_id: i64) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.max_age_hours as i64);
        let claims = SessionClaims {
            jti: Uuid::new_v4().to_string(),
            user_id,
            logged_in: true,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        Ok(IssuedSession {
            id: claims.jti,
            token,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// `Set-Cookie` value carrying a freshly issued token
    pub fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
            self.cookie_name,
            token,
            self.max_age_hours * 3600
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that clears the session on the client
    pub fn expired_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
            self.cookie_name
        )
    }
}

/// Hash a plaintext password into an Argon2id PHC string for storage
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Check a plaintext password against a stored PHC string.
/// Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn keys() -> SessionKeys {
        SessionKeys::from_config(&AppConfig::development().session).unwrap()
    }

    #[test]
    fn session_token_round_trip() {
        let keys = keys();
        let issued = keys.issue(7).unwrap();
        let claims = keys.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.jti, issued.id);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert!(claims.logged_in);
    }

    #[test]
    fn each_session_gets_its_own_id() {
        let keys = keys();
        assert_ne!(keys.issue(7).unwrap().id, keys.issue(7).unwrap().id);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let mut other = AppConfig::development().session;
        other.secret = "another-secret".to_string();
        let issued = SessionKeys::from_config(&other).unwrap().issue(7).unwrap();
        assert!(matches!(keys().verify(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut config = AppConfig::development().session;
        config.secret.clear();
        assert!(matches!(
            SessionKeys::from_config(&config),
            Err(AuthError::InvalidSecret)
        ));
    }

    #[test]
    fn cookie_flags() {
        let cookie = keys().cookie("abc");
        assert!(cookie.starts_with("sid=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
        assert!(keys().expired_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn password_hash_verifies() {
        let stored = hash_password("hunter22").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
        assert_ne!(stored, hash_password("hunter22").unwrap(), "salt must differ per hash");
    }
}
