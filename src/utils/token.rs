use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: usize,
    pub exp: usize,
}

/// Signs an HS256 access token whose subject is the technician id.
pub fn create_token(
    tecnico_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(tecnico_id, TokenKind::Access, secret, expires_in_minutes)
}

/// Long-lived token only accepted by the refresh endpoint.
pub fn create_refresh_token(
    tecnico_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(tecnico_id, TokenKind::Refresh, secret, expires_in_minutes)
}

fn sign(
    tecnico_id: &str,
    kind: TokenKind,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if tecnico_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in_minutes)).timestamp() as usize;
    let claims = TokenClaims {
        sub: tecnico_id.to_string(),
        kind,
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Subject of a valid access token.
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    verify(token.into(), secret, TokenKind::Access)
}

pub fn decode_refresh_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    verify(token.into(), secret, TokenKind::Refresh)
}

fn verify(token: String, secret: &[u8], expected: TokenKind) -> Result<String, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) if token.claims.kind == expected => Ok(token.claims.sub),
        _ => Err(HttpError::new(
            ErrorMessage::InvalidToken.to_string(),
            StatusCode::UNAUTHORIZED,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"helpdesk-test-secret";

    #[test]
    fn round_trips_the_subject() {
        let token = create_token("7", SECRET, 60).unwrap();
        assert_eq!(decode_token(token, SECRET).unwrap(), "7");

        let refresh = create_refresh_token("7", SECRET, 60).unwrap();
        assert_eq!(decode_refresh_token(refresh, SECRET).unwrap(), "7");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = create_token("7", SECRET, 60).unwrap();
        assert!(decode_token(token, b"other-secret").is_err());

        let expired = create_token("7", SECRET, -10).unwrap();
        let err = decode_token(expired, SECRET).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let refresh = create_refresh_token("7", SECRET, 60).unwrap();
        assert!(decode_token(refresh, SECRET).is_err());

        let access = create_token("7", SECRET, 60).unwrap();
        assert!(decode_refresh_token(access, SECRET).is_err());
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(create_token("", SECRET, 60).is_err());
        assert!(create_refresh_token("", SECRET, 60).is_err());
    }
}
