//! Signed bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{User, UserRole};

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub login: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// A lifetime too large to represent falls back to zero.
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        let ttl = Duration::try_minutes(ttl_minutes).unwrap_or_else(|| {
            tracing::warn!("Token lifetime of {} minutes is out of range", ttl_minutes);
            Duration::zero()
        });

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Token expiry is out of range".to_string()))?;
        let claims = Claims {
            sub: user.id,
            login: user.login.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Decode a token. Expired, forged or malformed tokens yield `None`.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            full_name: "Anna Petrova".to_string(),
            login: "anna@example.org".to_string(),
            role: UserRole::Nko,
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let tokens = TokenService::new("secret", 60);
        let token = tokens.issue(&user()).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.login, "anna@example.org");
        assert_eq!(claims.role, UserRole::Nko);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenService::new("secret", 60).issue(&user()).unwrap();
        assert!(TokenService::new("other", 60).validate(&token).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = TokenService::new("secret", -10);
        let token = tokens.issue(&user()).unwrap();
        assert!(tokens.validate(&token).is_none());
    }

    #[test]
    fn test_oversized_lifetime_does_not_panic() {
        let tokens = TokenService::new("secret", 9_000_000_000_000_000_000);
        let claims = tokens.validate(&tokens.issue(&user()).unwrap()).unwrap();
        assert_eq!(claims.exp, claims.iat);

        let err = TokenService::new("secret", 1_000_000_000_000)
            .issue(&user())
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let tokens = TokenService::new("secret", 60);
        assert!(tokens.validate("not.a.token").is_none());
        assert!(tokens.validate("").is_none());
    }
}
