//! Encoding and decoding of the JSON Web Tokens used for bearer authentication.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, auth::UserID};

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: i64,
    /// The time the token was issued as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a Unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// The user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

/// The keys for signing and verifying tokens, derived from a shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    /// Signs new tokens.
    pub encoding_key: EncodingKey,
    /// Verifies tokens sent by clients.
    pub decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Create the signing and verification keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Create a token for `user_id` that expires after `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserID,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, was signed with a
/// different key or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}
