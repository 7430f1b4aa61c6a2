use std::{convert::Infallible, sync::Arc};

use anyhow::{anyhow, Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{models::User, store::ContentStore};

pub const TOKEN_LIFETIME: time::Duration = time::Duration::hours(24);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub authorized: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token does not carry an authorized session")]
    NotAuthorized,
}

/// Issues and checks HS256 session tokens signed with the process-wide secret.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Authenticator {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue_token(&self, username: &str) -> Result<String> {
        self.issue_token_at(username, OffsetDateTime::now_utc())
    }

    pub fn issue_token_at(&self, username: &str, issued_at: OffsetDateTime) -> Result<String> {
        let claims = SessionClaims {
            username: username.to_owned(),
            authorized: true,
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + TOKEN_LIFETIME).unix_timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate jwt token")
    }

    /// Checks signature, algorithm and expiry.
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let claims =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?
                .claims;
        if !claims.authorized {
            return Err(TokenError::NotAuthorized);
        }
        Ok(claims)
    }
}

/// Pulls the credential out of `Authorization: Bearer <token>`. The
/// `Token <token>` form used by RealWorld clients is accepted too, and the
/// scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") && !scheme.eq_ignore_ascii_case("token") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

pub struct AuthUser {
    pub user: User,
    pub token: String,
}

/// The caller's identity, if the request carries a valid token for a live
/// session. Anything else, including a garbled header, is anonymous.
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_caller(parts)))
    }
}

fn resolve_caller(parts: &Parts) -> Option<AuthUser> {
    let token = bearer_token(&parts.headers)?;
    let (Some(authenticator), Some(store)) = (
        parts.extensions.get::<Arc<Authenticator>>(),
        parts.extensions.get::<Arc<ContentStore>>(),
    ) else {
        tracing::error!("Authenticator or store missing from request extensions");
        return None;
    };
    if let Err(e) = authenticator.validate_token(token) {
        tracing::debug!(error = %e, "Rejected bearer token");
        return None;
    }
    let Some(user) = store.session_user(token) else {
        tracing::debug!("Bearer token has no live session");
        return None;
    };
    Some(AuthUser {
        user,
        token: token.to_owned(),
    })
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand::thread_rng());
    let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
        .map_err(|_| anyhow!("Failed to hash password"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let hash = PasswordHash::new(hash).map_err(|_| anyhow!("Failed to parse password hash"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok())
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn authenticator() -> Authenticator {
        Authenticator::new(b"test-secret")
    }

    #[test]
    fn fresh_token_is_valid() {
        let auth = authenticator();
        let token = auth.issue_token("berke").unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.username, "berke");
        assert!(claims.authorized);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME.whole_seconds());
    }

    #[test]
    fn expired_token_is_invalid() {
        let auth = authenticator();
        let issued_at = OffsetDateTime::now_utc() - TOKEN_LIFETIME - time::Duration::seconds(5);
        let token = auth.issue_token_at("berke", issued_at).unwrap();
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let auth = authenticator();
        let token = auth.issue_token("berke").unwrap();
        let signature_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        let target = signature_start + 5;
        bytes[target] = if bytes[target] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(auth.validate_token(&tampered).is_err());
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let token = Authenticator::new(b"other-secret")
            .issue_token("berke")
            .unwrap();
        assert!(authenticator().validate_token(&token).is_err());
    }

    #[test]
    fn other_hmac_algorithms_are_refused() {
        let claims = SessionClaims {
            username: "berke".into(),
            authorized: true,
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            exp: (OffsetDateTime::now_utc() + TOKEN_LIFETIME).unix_timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(authenticator().validate_token(&token).is_err());
    }

    #[test]
    fn unauthorized_claims_are_refused() {
        let claims = SessionClaims {
            username: "berke".into(),
            authorized: false,
            iat: OffsetDateTime::now_utc().unix_timestamp(),
            exp: (OffsetDateTime::now_utc() + TOKEN_LIFETIME).unix_timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(
            authenticator().validate_token(&token),
            Err(TokenError::NotAuthorized)
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("TOKEN abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc.def"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("654321").unwrap();
        assert_ne!(hash, "654321");
        assert!(verify_password("654321", &hash).unwrap());
        assert!(!verify_password("123456", &hash).unwrap());
    }
}
