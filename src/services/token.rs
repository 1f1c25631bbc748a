//! JWT token service
//!
//! Issues and validates the HS256 bearer tokens used by the API. Two token
//! types exist: short-lived access tokens presented on every request, and
//! longer-lived refresh tokens exchanged for fresh access tokens at
//! `/api/auth/refresh/`. The `token_type` claim keeps them from being used
//! interchangeably.

use crate::models::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims carried by every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Username at issue time
    pub username: String,
    /// Role at issue time
    pub role: String,
    /// "access" or "refresh"
    pub token_type: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Issued-at (unix seconds)
    pub iat: i64,
}

/// An access/refresh token pair, as returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Error types for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token expired
    #[error("Token has expired")]
    Expired,

    /// Token malformed, signature mismatch, or otherwise unusable
    #[error("Invalid token")]
    Invalid,

    /// A refresh token was presented where an access token was expected,
    /// or vice versa
    #[error("Invalid token type")]
    WrongType,
}

/// Token service issuing and validating JWTs
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    /// Create a token service from a shared secret and token lifetimes
    pub fn new(secret: &str, access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Issue an access/refresh pair for a user
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user, TOKEN_TYPE_ACCESS, self.access_ttl_seconds)?,
            refresh: self.issue(user, TOKEN_TYPE_REFRESH, self.refresh_ttl_seconds)?,
        })
    }

    /// Issue a fresh access token for a user
    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, TOKEN_TYPE_ACCESS, self.access_ttl_seconds)
    }

    fn issue(&self, user: &User, token_type: &str, ttl_seconds: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.to_string(),
            token_type: token_type.to_string(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| TokenError::Invalid)
    }

    /// Decode and validate an access token
    pub fn decode_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TOKEN_TYPE_ACCESS)
    }

    /// Decode and validate a refresh token
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_typed(token, TOKEN_TYPE_REFRESH)
    }

    fn decode_typed(&self, token: &str, expected_type: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        if data.claims.token_type != expected_type {
            return Err(TokenError::WrongType);
        }

        Ok(data.claims)
    }
}
