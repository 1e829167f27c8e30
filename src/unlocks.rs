//! Derived unlock state.
//!
//! Everything here is a pure function of the XP total. The store calls
//! [`derive_unlocks`] once per mutation and never sets these fields any other
//! way, so the projection can never drift from `xp`.

use serde::{Deserialize, Serialize};

/// Projection of an XP total onto the unlock fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockState {
    /// 0-100 percentage of the understanding target.
    pub system_understanding: u8,
    /// Operator Mode may be toggled.
    pub operator_unlocked: bool,
    /// Executive Brief panel is visible.
    pub executive_brief_unlocked: bool,
}

/// `min(100, round(xp / target * 100))`, with halves rounded up.
///
/// Computed in integers so that values like 175/350 land exactly on 50.
#[must_use]
pub fn understanding_percent(xp: u64, target_xp: u64) -> u8 {
    if target_xp == 0 {
        return 100;
    }
    let scaled = u128::from(xp) * 100;
    let target = u128::from(target_xp);
    let rounded = (scaled * 2 + target) / (target * 2);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

/// Smallest XP total whose understanding rounds to 100%.
#[must_use]
pub fn unlock_threshold_xp(target_xp: u64) -> u64 {
    // round(100 * xp / target) >= 100  <=>  xp >= 199 * target / 200
    let needed = (u128::from(target_xp) * 199 + 199) / 200;
    u64::try_from(needed).unwrap_or(u64::MAX)
}

/// Derive the unlock projection for `xp`.
#[must_use]
pub fn derive_unlocks(xp: u64, target_xp: u64) -> UnlockState {
    let system_understanding = understanding_percent(xp, target_xp);
    let operator_unlocked = system_understanding >= 100;
    UnlockState {
        system_understanding,
        operator_unlocked,
        executive_brief_unlocked: operator_unlocked,
    }
}
