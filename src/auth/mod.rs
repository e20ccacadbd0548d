pub mod account;
pub mod gate;
pub mod token;

pub use account::*;
pub use gate::*;
pub use token::*;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Missing,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Token has expired")]
    Expired,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
