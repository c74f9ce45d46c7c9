//! Shared application state

use learntn_auth::{AuthGate, TokenConfig, TokenService};
use std::sync::Arc;

use crate::catalog::{Catalog, Summarizer};
use crate::engine::ProgressEngine;
use crate::storage::{IdentitySlots, LearningStore};

/// Application state shared across handlers
pub struct AppState {
    /// Identity, enrollment and progress rows
    pub store: Arc<dyn LearningStore>,
    /// Credential issuing and rotation
    pub tokens: Arc<TokenService>,
    pub gate: AuthGate,
    pub engine: ProgressEngine,
    /// Fills the lesson summary cache on a miss
    pub summarizer: Arc<dyn Summarizer>,
    pub leaderboard_limit: usize,
}

impl AppState {
    /// Wire the token service and engine over one store
    pub fn new(
        store: Arc<dyn LearningStore>,
        catalog: Arc<dyn Catalog>,
        summarizer: Arc<dyn Summarizer>,
        tokens: TokenConfig,
        leaderboard_limit: usize,
    ) -> Self {
        let slots = Arc::new(IdentitySlots::new(store.clone()));
        let tokens = Arc::new(TokenService::new(tokens, slots));

        Self {
            gate: AuthGate::new(tokens.clone()),
            engine: ProgressEngine::new(store.clone(), catalog),
            store,
            tokens,
            summarizer,
            leaderboard_limit,
        }
    }
}
