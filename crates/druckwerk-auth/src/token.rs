// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bearer token issuance and validation (HS256 JWT).

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use druckwerk_core::error::{DruckwerkError, Result};
use druckwerk_core::types::UserId;

/// Claims carried by a Druckwerk bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id (UUID string).
    pub sub: String,
    pub username: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Parse the subject back into a `UserId`.
    pub fn user_id(&self) -> Result<UserId> {
        Uuid::parse_str(&self.sub)
            .map(UserId)
            .map_err(|_| DruckwerkError::Auth("malformed token subject".into()))
    }
}

/// Issues and validates bearer tokens with a shared HMAC secret.
///
/// Construct once at startup and share; both keys are derived from the same
/// configured secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issue a token for an authenticated user.
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DruckwerkError::Auth(format!("token encoding: {e}")))?;

        debug!(user = %user_id, "issued bearer token");
        Ok(token)
    }

    /// Validate a token and return its claims.
    ///
    /// Rejects bad signatures, malformed tokens, and expired tokens alike
    /// with an `Auth` error — callers map all of them to 401.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| DruckwerkError::Auth(format!("invalid token: {e}")))?;
        Ok(data.claims)
    }
}
