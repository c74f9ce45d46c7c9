//! Token Service
//!
//! Mints, verifies and rotates HS256 access/refresh pairs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::store::RefreshSlotStore;
use crate::types::{AccessClaims, RefreshClaims, TokenPair, TokenSubject};

/// Default access-token lifetime
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Default refresh-token lifetime
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// Secrets and lifetimes for the token service
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Create a configuration with the default lifetimes
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    /// Set the access-token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set the refresh-token lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Issues, verifies and rotates credential pairs
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
    slots: Arc<dyn RefreshSlotStore>,
}

impl TokenService {
    /// Create a token service writing refresh tokens through `slots`
    pub fn new(config: TokenConfig, slots: Arc<dyn RefreshSlotStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            validation,
            slots,
        }
    }

    /// Issue a new pair and make its refresh token the only valid one
    ///
    /// Any previous refresh token for the identity stops working.
    pub async fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair> {
        let pair = self.mint(subject)?;
        self.slots
            .store_refresh_token(subject.id, &pair.refresh_token)
            .await?;

        info!(identity_id = %subject.id, role = %subject.role, "Issued credential pair");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The presented token must verify and must equal the identity's stored
    /// slot value exactly; the slot is then overwritten atomically. A token that
    /// has already been exchanged (or superseded by a login) is rejected as
    /// [`AuthError::Revoked`].
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair> {
        let claims = self.decode_refresh(presented)?;

        let subject = match self.slots.load_subject(claims.id).await? {
            Some(subject) => subject,
            None => {
                warn!(identity_id = %claims.id, "Refresh token for unknown identity");
                return Err(AuthError::Revoked);
            }
        };

        let pair = self.mint(&subject)?;
        let swapped = self
            .slots
            .swap_refresh_token(subject.id, presented, &pair.refresh_token)
            .await?;

        if !swapped {
            warn!(
                identity_id = %subject.id,
                "SECURITY: Rejected superseded or reused refresh token"
            );
            return Err(AuthError::Revoked);
        }

        info!(identity_id = %subject.id, "Rotated refresh token");
        Ok(pair)
    }

    /// Stateless access-token check (signature and expiry only)
    pub fn verify(&self, access_token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(access_token, &self.access_decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Empty the identity's refresh slot
    pub async fn revoke(&self, id: Uuid) -> Result<()> {
        self.slots.clear_refresh_token(id).await?;
        info!(identity_id = %id, "Revoked refresh token");
        Ok(())
    }

    fn decode_refresh(&self, token: &str) -> Result<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match AuthError::from(e) {
                AuthError::Expired => AuthError::Expired,
                other => AuthError::Malformed(other.to_string()),
            })
    }

    fn mint(&self, subject: &TokenSubject) -> Result<TokenPair> {
        let now = Utc::now();
        let iat = now.timestamp();

        let access = AccessClaims {
            id: subject.id,
            email: subject.email.clone(),
            role: subject.role,
            iat,
            exp: expiry(now, self.access_ttl)?,
            jti: Uuid::new_v4().to_string(),
        };
        let refresh = RefreshClaims {
            id: subject.id,
            iat,
            exp: expiry(now, self.refresh_ttl)?,
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let access_token = encode(&header, &access, &self.access_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {}", e)))?;
        let refresh_token = encode(&header, &refresh, &self.refresh_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign refresh token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64> {
    now.checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or_else(|| AuthError::Internal(format!("Token lifetime {} out of range", ttl)))
}
