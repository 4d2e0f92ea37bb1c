//! Session tokens.
//!
//! Sessions are issued by the external sign-in service as HS256 JWTs signed
//! with a shared secret. The portal only verifies them; [`SessionVerifier::issue`]
//! exists for tooling and tests.

use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use portal_core::AdminRole;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        ttl: time::Duration,
    ) -> Self {
        Self {
            sub: user_id.into(),
            email: email.into(),
            role: role.into(),
            exp: (OffsetDateTime::now_utc() + ttl).unix_timestamp(),
        }
    }
}

/// A verified session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// The administrative role held by this session, if any.
    pub fn admin_role(&self) -> Option<AdminRole> {
        AdminRole::from_str(&self.role).ok()
    }
}

/// Verifies (and for tooling, issues) HS256 session tokens.
pub struct SessionVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(AuthError::from)
    }

    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?.claims;

        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|e| AuthError::invalid_token(format!("invalid exp claim: {e}")))?;
        if expires_at <= OffsetDateTime::now_utc() {
            return Err(AuthError::TokenExpired);
        }

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at,
        })
    }
}
