use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    // 401 - Unauthenticated
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,

    // 500 - Internal
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
    #[error("Invalid auth configuration: {0}")]
    Configuration(String),
}
