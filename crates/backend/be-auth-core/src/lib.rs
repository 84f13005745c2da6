//! Admin identity for the release publishing surface.
//!
//! A single admin account is configured from the environment: a username, an
//! argon2 hash of its password and an HMAC key for signing short-lived access
//! tokens. Nothing about the identity is compiled into the binary, so the key
//! can be rotated by restarting with a new `ADMIN_TOKEN_SECRET`.

use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

mod error;

pub use error::AuthError;

pub const ADMIN_ROLE: &str = "admin";
const TOKEN_TYPE: &str = "admin_access";
const MIN_SECRET_LEN: usize = 32;
const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub claims: AdminClaims,
}

#[derive(Debug)]
pub struct AdminAuthConfig {
    pub username: String,
    /// argon2 PHC string, e.g. produced by [`hash_password`].
    pub password_hash: SecretString,
    pub token_secret: SecretString,
    pub token_ttl: Duration,
}

impl AdminAuthConfig {
    pub fn from_env() -> Result<Self> {
        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());

        let password_hash = std::env::var("ADMIN_PASSWORD_HASH")
            .context("ADMIN_PASSWORD_HASH must be set (argon2 hash of the admin password)")?;

        let token_secret = std::env::var("ADMIN_TOKEN_SECRET")
            .context("ADMIN_TOKEN_SECRET must be set (at least 32 bytes)")?;

        let ttl_minutes = match std::env::var("ADMIN_TOKEN_TTL_MINUTES") {
            Ok(value) => value
                .parse::<i64>()
                .with_context(|| format!("Invalid ADMIN_TOKEN_TTL_MINUTES '{value}'"))?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        Ok(Self {
            username,
            password_hash: SecretString::from(password_hash),
            token_secret: SecretString::from(token_secret),
            token_ttl: Duration::minutes(ttl_minutes),
        })
    }
}

pub struct AdminAuth {
    username: String,
    password_hash: SecretString,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl AdminAuth {
    pub fn new(config: AdminAuthConfig) -> Result<Self, AuthError> {
        let secret = config.token_secret.expose_secret().as_bytes();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        PasswordHash::new(config.password_hash.expose_secret()).map_err(|e| {
            AuthError::Configuration(format!("admin password hash is not a PHC string: {e}"))
        })?;
        if config.token_ttl <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token lifetime must be positive".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            username: config.username,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            password_hash: config.password_hash,
            validation,
            token_ttl: config.token_ttl,
        })
    }

    pub fn from_env() -> Result<Self> {
        let config = AdminAuthConfig::from_env()?;
        Self::new(config).context("Invalid admin authentication configuration")
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exchange the admin username and password for a signed access token.
    ///
    /// The password is always verified, even for an unknown username, and
    /// both failures produce the same error.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let password_ok = self.verify_password(password)?;
        if !(password_ok && username == self.username) {
            warn!("Rejected admin login");
            return Err(AuthError::InvalidCredentials);
        }
        debug!("Admin login accepted");
        self.issue_token()
    }

    pub fn issue_token(&self) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let claims = AdminClaims {
            sub: self.username.clone(),
            role: ADMIN_ROLE.to_string(),
            token_type: TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_at,
            claims,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let token_data = decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Admin token rejected: {}", e);
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;
        if claims.token_type != TOKEN_TYPE || claims.role != ADMIN_ROLE {
            return Err(AuthError::InvalidToken);
        }
        if claims.sub != self.username {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    fn verify_password(&self, password: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(self.password_hash.expose_secret())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}
