//! Level calculation
//!
//! Level starts at 1 and reaching level `n + 1` requires `100 * (n + 1)`
//! cumulative XP: level 2 needs 200, level 3 needs 300, level `n` needs
//! `100 * n`. The stepwise rule ("raise the level while
//! `xp >= 100 * (level + 1)`") collapses to a closed form, so the calculation
//! is constant time for any XP value.

/// XP multiplier per level
pub const XP_PER_LEVEL: u64 = 100;

/// Map cumulative XP to a level (always >= 1)
pub fn level_for(xp: u64) -> u64 {
    if xp < 2 * XP_PER_LEVEL {
        1
    } else {
        xp / XP_PER_LEVEL
    }
}

/// Minimum cumulative XP needed to hold `level`
pub fn xp_threshold(level: u64) -> u64 {
    if level <= 1 {
        0
    } else {
        level.saturating_mul(XP_PER_LEVEL)
    }
}

/// Result of adding XP to an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    /// XP added by this award
    pub awarded: u64,
    /// Cumulative XP after the award
    pub xp: u64,
    /// Level stored before the award
    pub previous_level: u64,
    /// Level after the award
    pub level: u64,
}

impl XpAward {
    /// Compute the new XP/level from the stored values
    pub fn apply(current_xp: u64, stored_level: u64, awarded: u64) -> Self {
        let xp = current_xp.saturating_add(awarded);
        Self {
            awarded,
            xp,
            previous_level: stored_level,
            level: level_for(xp),
        }
    }

    /// Whether the award crossed at least one level threshold
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}
