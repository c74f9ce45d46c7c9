//! Auth Gate - per-request credential verification and role gating

use learntn_core::{check_role, Operation, Role};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::token::TokenService;
use crate::types::AccessClaims;

/// Verifies bearer credentials and checks role membership
///
/// Ownership checks are not made here; they belong to the handler that knows
/// the resource owner (see `learntn_core::check_owner`).
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Verify the `Authorization` header value and return the typed claims
    ///
    /// Expired credentials are reported as [`AuthError::Expired`] so the
    /// client knows a rotation may help; every other failure is not.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<AccessClaims> {
        let header = authorization.ok_or(AuthError::MissingCredential)?;
        let token = bearer_token(header)?;

        self.tokens
            .verify(token)
            .inspect_err(|e| debug!(error = %e, "Rejected access token"))
    }

    /// Role-set membership check
    pub fn authorize(&self, claims: &AccessClaims, allowed: &[Role]) -> Result<()> {
        check_role(claims.role, allowed).map_err(|e| {
            warn!(identity_id = %claims.id, role = %claims.role, "Role not permitted");
            AuthError::from(e)
        })
    }

    /// Role gate for a named operation
    pub fn authorize_operation(&self, claims: &AccessClaims, operation: Operation) -> Result<()> {
        self.authorize(claims, operation.allowed_roles())
            .inspect_err(|_| warn!(identity_id = %claims.id, operation = %operation, "Operation denied"))
    }
}

/// Extract the credential from a `Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str> {
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Malformed("Invalid token format".into()));
    }
    Ok(token)
}
