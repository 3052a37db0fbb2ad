//! Resolving the requesting user.
//!
//! A token is taken from the `Authorization: Bearer` header, or failing that
//! from the `jwt_token` query parameter. Handlers take [`OptionalIdentity`]
//! when anonymous access is allowed and [`Identity`] when it is not.

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::User;
use crate::AppState;

/// An authenticated requester.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// The requester, if a valid token for an existing user was supplied.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

/// Token passed as `?jwt_token=` by clients that cannot set headers.
#[derive(Debug, Deserialize)]
struct TokenParam {
    jwt_token: Option<String>,
}

/// Extract the raw token from a request, header first.
pub fn request_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string());

    from_header
        .or_else(|| {
            Query::<TokenParam>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(param)| param.jwt_token)
        })
        .filter(|token| !token.is_empty())
}

/// Resolve the identity behind a request. Invalid tokens resolve to `None`;
/// only storage failures are errors.
pub async fn resolve_identity(
    state: &AppState,
    parts: &Parts,
) -> Result<Option<Identity>, AppError> {
    let Some(token) = request_token(parts) else {
        return Ok(None);
    };
    let Some(claims) = state.tokens.validate(&token) else {
        return Ok(None);
    };

    let user = state.repo.get_user(claims.sub).await?;
    if user.is_none() {
        tracing::debug!("Token refers to unknown user {}", claims.sub);
    }
    Ok(user.map(|user| Identity { user }))
}

impl FromRequestParts<AppState> for OptionalIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(state, parts).await.map(OptionalIdentity)
    }
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(state, parts).await?.ok_or_else(|| {
            AppError::Unauthenticated("A valid bearer token is required".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_token_from_header() {
        let p = parts("/api/news", Some("Bearer abc.def.ghi"));
        assert_eq!(request_token(&p).as_deref(), Some("abc.def.ghi"));

        let p = parts("/api/news", Some("bearer abc"));
        assert_eq!(request_token(&p).as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_from_query() {
        let p = parts("/api/news?favorite=true&jwt_token=xyz", None);
        assert_eq!(request_token(&p).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_header_wins_over_query() {
        let p = parts("/api/news?jwt_token=query", Some("Bearer header"));
        assert_eq!(request_token(&p).as_deref(), Some("header"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert!(request_token(&parts("/api/news", None)).is_none());
        assert!(request_token(&parts("/api/news?jwt_token=", None)).is_none());
        assert!(request_token(&parts("/api/news", Some("Basic dXNlcg=="))).is_none());
    }
}
