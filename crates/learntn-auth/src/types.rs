//! Credential claim and pair types

use chrono::{DateTime, TimeZone, Utc};
use learntn_core::{Identity, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Identity id
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

impl AccessClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Identity id
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// An issued access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The identity facts a token is minted from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for TokenSubject {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
        }
    }
}
