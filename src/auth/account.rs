use serde::Serialize;
use tracing::info;

use super::token::TokenKeys;
use super::AuthError;
use crate::db::{DbError, User, UserRepo};
use crate::error::{ApiError, ApiResult};

/// A user as returned by register and login, with a fresh bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub token: String,
}

async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

fn with_token(user: &User, keys: &TokenKeys) -> Result<AuthenticatedUser, AuthError> {
    Ok(AuthenticatedUser {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        token: keys.sign(&user.user_id, &user.name)?,
    })
}

/// Create a user with a hashed password. A second account for the same
/// email fails with [`ApiError::AlreadyExists`].
pub async fn register(
    users: &dyn UserRepo,
    keys: &TokenKeys,
    cost: u32,
    email: &str,
    password: &str,
    name: &str,
) -> ApiResult<AuthenticatedUser> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        password: hash_password(password, cost).await?,
        name: name.to_string(),
        created: Some(chrono::Utc::now().to_rfc3339()),
    };
    users.create_user(&user).await?;

    info!(user_id = %user.user_id, "registered user");
    Ok(with_token(&user, keys)?)
}

/// Check an email and password. Unknown emails and wrong passwords give the
/// same error.
pub async fn login(
    users: &dyn UserRepo,
    keys: &TokenKeys,
    email: &str,
    password: &str,
) -> ApiResult<AuthenticatedUser> {
    let user = match users.get_user_by_email(email.trim()).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(AuthError::InvalidCredentials.into()),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(password, &user.password).await {
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(with_token(&user, keys)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteRepository;

    const COST: u32 = 4;

    #[tokio::test]
    async fn test_register_twice() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let keys = TokenKeys::new("secret");

        let user = register(&repo, &keys, COST, "a@x.com", "pw", "Name").await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "Name");
        assert!(!user.user_id.is_empty());
        assert_eq!(keys.verify(&user.token).unwrap().sub, user.user_id);

        let err = register(&repo, &keys, COST, "a@x.com", "pw", "Name").await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExists(_)), "{err:?}");
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let keys = TokenKeys::new("secret");
        register(&repo, &keys, COST, "a@x.com", "pw", "Name").await.unwrap();

        let stored = repo.get_user_by_email("a@x.com").await.unwrap();
        assert_ne!(stored.password, "pw");
        assert!(bcrypt::verify("pw", &stored.password).unwrap());
    }

    #[tokio::test]
    async fn test_login() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let keys = TokenKeys::new("secret");
        let registered = register(&repo, &keys, COST, "a@x.com", "pw", "Name").await.unwrap();

        let user = login(&repo, &keys, "a@x.com", "pw").await.unwrap();
        assert_eq!(user.user_id, registered.user_id);

        let err = login(&repo, &keys, "a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::InvalidCredentials)));
        let err = login(&repo, &keys, "nobody@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_requires_credentials() {
        let repo = SqliteRepository::in_memory().await.unwrap();
        let keys = TokenKeys::new("secret");
        let err = register(&repo, &keys, COST, " ", "pw", "Name").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
