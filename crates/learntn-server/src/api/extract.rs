//! Request extractors

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use learntn_auth::AccessClaims;
use learntn_core::Operation;
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;

/// Verified access-token claims of the caller
#[derive(Debug, Clone)]
pub struct Authenticated(pub AccessClaims);

impl Authenticated {
    /// Role gate for `operation`
    pub fn require(&self, state: &AppState, operation: Operation) -> Result<&AccessClaims, ApiError> {
        state.gate.authorize_operation(&self.0, operation)?;
        Ok(&self.0)
    }
}

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        // A non-ASCII header is present but unreadable: report it as malformed
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        Ok(Authenticated(state.gate.authenticate(header)?))
    }
}
