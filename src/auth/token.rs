use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

/// What a token entitles its bearer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// A logged-in session
    Session,
    /// Password checked, TOTP code still outstanding
    PasswordValidNeedsSecondFactorToken,
}

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Unique token id, so two tokens issued in the same second differ
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies HS256 tokens
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer for the given shared secret and token lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// How long an issued token stays valid
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn issue(&self, user: &User, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.get_id(),
            email: user.get_email(),
            role: user.get_role(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to sign token: {}", e))
    }

    /// Issues a session token for a fully authenticated user
    pub fn issue_session(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Session)
    }

    /// Issues the short-lived token that a TOTP login step exchanges for a session
    pub fn issue_second_factor(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::PasswordValidNeedsSecondFactorToken)
    }

    /// Verifies signature and expiry of a token and returns its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow!("Invalid token: {}", e))?;
        Ok(data.claims)
    }
}
