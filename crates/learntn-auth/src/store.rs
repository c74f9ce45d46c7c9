//! Refresh-slot backend
//!
//! The token service is the only writer of an identity's refresh slot. It
//! reaches the slot through this trait so that any identity store can back it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::TokenSubject;

/// Backend trait for the per-identity refresh slot
///
/// Implementations must be thread-safe; `swap_refresh_token` must compare and
/// overwrite as one atomic step.
#[async_trait]
pub trait RefreshSlotStore: Send + Sync {
    /// Load the claims source for an identity
    async fn load_subject(&self, id: Uuid) -> Result<Option<TokenSubject>>;

    /// Unconditionally replace the slot (login/registration)
    async fn store_refresh_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Replace the slot only if it currently holds exactly `expected`
    ///
    /// Returns whether the swap happened.
    async fn swap_refresh_token(&self, id: Uuid, expected: &str, replacement: &str) -> Result<bool>;

    /// Empty the slot
    async fn clear_refresh_token(&self, id: Uuid) -> Result<()>;
}
