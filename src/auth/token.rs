//! Signed, expiring session tokens (HS256 JWT).

use crate::config::Config;
use crate::models::unix_now;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Token verification and signing failures.
///
/// Handlers never show the variant to clients: every verification failure
/// becomes the same 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing unavailable: {0}")]
    Signing(String),

    #[error("Token signature or algorithm does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed")]
    Malformed,
}

/// The complete claim set. Anything else in the payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionClaims {
    /// Principal id.
    pub sub: String,
    /// Expiry, Unix seconds.
    pub exp: u64,
}

/// Issues and verifies session tokens with the process-wide signing key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    ttl_secs: u64,
}

impl TokenCodec {
    /// Creates a codec. An empty secret is a configuration error.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing key is empty".to_string()));
        }

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked in verify_at against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(validation),
            ttl_secs,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TokenError> {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl_secs)
    }

    /// Lifetime of issued tokens, in seconds.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a token for `subject` expiring `ttl_secs` from now.
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, unix_now())
    }

    /// Issues a token as if the current time were `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: u64) -> Result<String, TokenError> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            exp: issued_at.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, unix_now())
    }

    /// Verifies signature, structure and expiry (`now < exp`).
    pub fn verify_at(&self, token: &str, now: u64) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ if names_foreign_algorithm(token) => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            },
        )?;

        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// True when the token header decodes and names an algorithm other than ours.
///
/// Covers headers jsonwebtoken cannot parse at all, such as `"alg": "none"`.
fn names_foreign_algorithm(token: &str) -> bool {
    #[derive(Deserialize)]
    struct RawHeader {
        alg: String,
    }

    token
        .split('.')
        .next()
        .and_then(|segment| URL_SAFE_NO_PAD.decode(segment).ok())
        .and_then(|bytes| serde_json::from_slice::<RawHeader>(&bytes).ok())
        .is_some_and(|header| header.alg != "HS256")
}
