use crate::lives::MAX_LIVES;
use crate::profile::Profile;

/// XP needed to clear one level; `xp` always stays below it.
pub const XP_PER_LEVEL: u32 = 100;

/// Add XP and roll every full threshold over into a level.
///
/// A level-up refills lives, which also stops the regeneration clock.
/// Returns the number of levels gained.
pub fn apply_xp(profile: &mut Profile, amount: u32) -> u32 {
    let mut xp = u64::from(profile.xp) + u64::from(amount);
    let mut levels_gained = 0_u32;

    while xp >= u64::from(XP_PER_LEVEL) {
        xp -= u64::from(XP_PER_LEVEL);
        levels_gained += 1;
        profile.level = profile.level.saturating_add(1);
        profile.lives = MAX_LIVES;
        profile.last_regen_at = None;
    }

    profile.xp = u32::try_from(xp).unwrap_or(XP_PER_LEVEL - 1);
    levels_gained
}

/// Fraction of the current level already earned, in percent.
pub fn level_progress_percent(profile: &Profile) -> u32 {
    profile.xp.min(XP_PER_LEVEL) * 100 / XP_PER_LEVEL
}
