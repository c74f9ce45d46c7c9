//! LearnTn Credentials
//!
//! Issues, rotates, verifies and revokes paired credentials, and gates
//! requests on them.
//!
//! ## Architecture
//!
//! - **TokenService**: mints an access token (short-lived, carries
//!   `{id, email, role}`) and a refresh token (long-lived, carries `{id}`),
//!   each signed with its own secret. The refresh token is written into the
//!   identity's single refresh slot through a [`RefreshSlotStore`].
//! - **Rotation**: a presented refresh token is honored only if it is the exact
//!   value in the slot, and the slot is overwritten by compare-and-swap. A
//!   replayed predecessor therefore fails as revoked, even when two callers race.
//! - **AuthGate**: extracts the bearer credential, verifies it statelessly and
//!   checks role membership for the requested operation.
//!
//! Access-token verification never consults the refresh slot: rotating or
//! revoking leaves issued access tokens valid until their own expiry.
//!
//! ## Usage
//!
//! ```ignore
//! use learntn_auth::{AuthGate, TokenConfig, TokenService};
//!
//! let tokens = Arc::new(TokenService::new(
//!     TokenConfig::new("access-secret", "refresh-secret"),
//!     store.clone(),
//! ));
//! let pair = tokens.issue_pair(&subject).await?;
//! let claims = AuthGate::new(tokens.clone()).authenticate(Some("Bearer ..."))?;
//! ```

pub mod error;
pub mod gate;
pub mod password;
pub mod store;
pub mod token;
pub mod types;

pub use error::{AuthError, Result};
pub use gate::{bearer_token, AuthGate};
pub use password::{hash_password, verify_missing_account, verify_password};
pub use store::RefreshSlotStore;
pub use token::{TokenConfig, TokenService};
pub use types::{AccessClaims, RefreshClaims, TokenPair, TokenSubject};
