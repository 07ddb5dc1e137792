// Signed-token service
// Decision: HS256 with a symmetric secret; one token kind, no refresh flow
// Decision: expiry is checked manually with no leeway, so a token with
// lifetime T is rejected from the instant iat + T onward

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::TokenConfig;

/// Generate an opaque session token (64 hex characters) for the stored
/// strategy.
pub fn generate_opaque_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Claims carried by a signed token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Username at issuance time
    pub name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Service for issuing and verifying signed tokens
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for a user
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.lifetime)?;

        let claims = TokenClaims {
            sub: user_id.to_string(),
            name: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to encode token")
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// The caller gets one opaque failure for every reason (bad signature,
    /// malformed, expired); the distinction must never reach API clients.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::default();
        // Checked manually below; the library default allows 60s of leeway.
        validation.validate_exp = false;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .context("invalid token")?;

        if token_data.claims.exp <= Utc::now().timestamp() {
            anyhow::bail!("invalid token");
        }

        Ok(token_data.claims)
    }

    /// Token lifetime in seconds
    pub fn lifetime_secs(&self) -> i64 {
        self.config.lifetime.as_secs() as i64
    }
}
