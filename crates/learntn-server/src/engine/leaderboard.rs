//! Leaderboard projection

use serde::Serialize;
use uuid::Uuid;

use super::{ProgressEngine, Result};

/// One ranked learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub id: Uuid,
    pub name: String,
    pub xp: u64,
    pub level: u64,
    /// Whether this entry is the caller
    pub is_self: bool,
}

impl ProgressEngine {
    /// Top `limit` learners by XP, ties broken by registration time then id
    pub async fn leaderboard(&self, viewer_id: Uuid, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let identities = self.store.leaderboard(limit).await?;
        Ok(identities
            .into_iter()
            .enumerate()
            .map(|(idx, identity)| LeaderboardEntry {
                rank: idx + 1,
                is_self: identity.id == viewer_id,
                id: identity.id,
                name: identity.name,
                xp: identity.xp,
                level: identity.level,
            })
            .collect())
    }
}
