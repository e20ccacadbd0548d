use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::token::TokenKeys;
use super::AuthError;
use crate::error::ApiError;
use crate::server::AppState;

/// Some front-end builds send this literally when they have no token.
pub const UNDEFINED_TOKEN: &str = "undefined";

/// The acting user of a request. Anonymous callers have an empty id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    user_id: String,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// The user id, empty for anonymous callers.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty()
    }

    /// The user id for endpoints that cannot serve anonymous callers.
    pub fn require(&self) -> Result<&str, AuthError> {
        if self.is_anonymous() {
            return Err(AuthError::Missing);
        }
        Ok(&self.user_id)
    }
}

/// The credential part of an `Authorization: Bearer <token>` header, or ""
/// when there is none. A bare `Bearer` scheme counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> &str {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim_start();
    let credential = match value.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {
            let rest = &value[6..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest
            } else {
                value
            }
        }
        _ => value,
    };
    credential.trim()
}

/// No token means anonymous; a token that is present but does not verify is
/// an error, never a silent downgrade to anonymous.
pub fn resolve(token: &str, keys: &TokenKeys) -> Result<Principal, AuthError> {
    if token.is_empty() || token == UNDEFINED_TOKEN {
        return Ok(Principal::anonymous());
    }
    let claims = keys.verify(token)?;
    Ok(Principal::authenticated(claims.sub))
}

/// Resolve the caller and store the [`Principal`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = resolve(bearer_token(req.headers()), &state.tokens).map_err(|e| {
        debug!("Rejected credential for {}: {}", req.uri(), e);
        e
    })?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&HeaderMap::new()), "");
        assert_eq!(bearer_token(&headers("Bearer abc.def")), "abc.def");
        assert_eq!(bearer_token(&headers("Bearer ")), "");
        assert_eq!(bearer_token(&headers("abc")), "abc");
        assert_eq!(bearer_token(&headers("Bearer")), "");
        assert_eq!(bearer_token(&headers("bearer  xyz ")), "xyz");
        assert_eq!(bearer_token(&headers("BEARER xyz")), "xyz");
        assert_eq!(bearer_token(&headers("Bearerxyz")), "Bearerxyz");
    }

    #[test]
    fn test_bare_scheme_is_anonymous() {
        let keys = TokenKeys::new("secret");
        assert!(resolve(bearer_token(&headers("Bearer ")), &keys)
            .unwrap()
            .is_anonymous());
    }

    #[test]
    fn test_missing_and_undefined_are_anonymous() {
        let keys = TokenKeys::new("secret");
        assert!(resolve("", &keys).unwrap().is_anonymous());
        assert!(resolve(UNDEFINED_TOKEN, &keys).unwrap().is_anonymous());
        assert!(resolve(bearer_token(&headers("Bearer undefined")), &keys)
            .unwrap()
            .is_anonymous());
    }

    #[test]
    fn test_valid_token_is_authenticated() {
        let keys = TokenKeys::new("secret");
        let token = keys.sign("user-1", "A").unwrap();
        let principal = resolve(&token, &keys).unwrap();
        assert_eq!(principal.user_id(), "user-1");
        assert_eq!(principal.require().unwrap(), "user-1");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let keys = TokenKeys::new("secret");
        let token = TokenKeys::new("other").sign("user-1", "A").unwrap();
        assert!(matches!(resolve(&token, &keys), Err(AuthError::InvalidSignature)));
        assert!(matches!(resolve("garbage", &keys), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_anonymous_cannot_require() {
        assert!(matches!(Principal::anonymous().require(), Err(AuthError::Missing)));
    }
}
