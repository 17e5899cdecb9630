use serde::{Deserialize, Serialize};

use crate::profile::Profile;

pub const MAX_LIVES: u8 = 5;
/// Wall-clock time needed to regenerate one life.
pub const DEFAULT_REGEN_UNIT_SECS: u64 = 3 * 60 * 60;
pub const DEFAULT_REGEN_POLL_SECS: u64 = 60;
/// XP price of a full refill in the shop.
pub const DEFAULT_REFILL_PRICE: u32 = 50;

/// How the regeneration clock moves after lives are granted below the cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegenPolicy {
    /// Advance the stamp by the time spent on granted lives, keeping partial progress.
    #[default]
    CarryOver,
    /// Restart the clock at the time of the check, dropping partial progress.
    ResetToNow,
}

impl RegenPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "carry" | "carry_over" | "carryover" => Some(Self::CarryOver),
            "reset" | "reset_to_now" | "legacy" => Some(Self::ResetToNow),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegenOutcome {
    Unchanged,
    /// Lives were below the cap without a stamp; the clock starts now.
    ClockStarted,
    /// Lives were at the cap with a stale stamp, which is now cleared.
    ClockCleared,
    Regenerated { added: u8 },
}

impl RegenOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefillOutcome {
    Refilled { price: u32 },
    AlreadyFull,
    InsufficientXp { price: u32, balance: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MercyOutcome {
    Granted,
    NotEligible,
}

/// Spend one life. Leaving the cap starts the regeneration clock.
///
/// Returns whether the profile changed.
pub fn lose_life(profile: &mut Profile, now: u64) -> bool {
    if profile.lives == 0 {
        return false;
    }

    if profile.lives >= MAX_LIVES {
        profile.last_regen_at = Some(now);
    }
    profile.lives -= 1;
    true
}

/// Convert elapsed time since the last stamp into regenerated lives.
pub fn check_regeneration(
    profile: &mut Profile,
    now: u64,
    unit_secs: u64,
    policy: RegenPolicy,
) -> RegenOutcome {
    if profile.lives >= MAX_LIVES {
        return if profile.last_regen_at.take().is_some() {
            RegenOutcome::ClockCleared
        } else {
            RegenOutcome::Unchanged
        };
    }

    let Some(stamp) = profile.last_regen_at else {
        profile.last_regen_at = Some(now);
        return RegenOutcome::ClockStarted;
    };

    let unit_secs = unit_secs.max(1);
    let lives_to_add = now.saturating_sub(stamp) / unit_secs;
    if lives_to_add == 0 {
        return RegenOutcome::Unchanged;
    }

    let missing = u64::from(MAX_LIVES - profile.lives);
    let added = lives_to_add.min(missing) as u8;
    profile.lives += added;

    profile.last_regen_at = if profile.lives >= MAX_LIVES {
        None
    } else {
        match policy {
            RegenPolicy::CarryOver => Some(stamp + lives_to_add * unit_secs),
            RegenPolicy::ResetToNow => Some(now),
        }
    };

    RegenOutcome::Regenerated { added }
}

/// Seconds until the next life regenerates, or `None` at the cap.
pub fn seconds_until_next_life(profile: &Profile, now: u64, unit_secs: u64) -> Option<u64> {
    if profile.lives >= MAX_LIVES {
        return None;
    }

    let unit_secs = unit_secs.max(1);
    let elapsed = profile
        .last_regen_at
        .map_or(0, |stamp| now.saturating_sub(stamp));
    Some(unit_secs.saturating_sub(elapsed % unit_secs))
}

/// Spend XP on a full refill.
pub fn buy_refill(profile: &mut Profile, price: u32) -> RefillOutcome {
    if profile.lives >= MAX_LIVES {
        return RefillOutcome::AlreadyFull;
    }
    if profile.xp < price {
        return RefillOutcome::InsufficientXp {
            price,
            balance: profile.xp,
        };
    }

    profile.xp -= price;
    profile.lives = MAX_LIVES;
    profile.last_regen_at = None;
    RefillOutcome::Refilled { price }
}

/// A player with no lives who cannot afford a refill may take one life for free.
pub fn mercy_available(profile: &Profile, refill_price: u32) -> bool {
    profile.lives == 0 && profile.xp < refill_price
}

pub fn claim_mercy_life(profile: &mut Profile, refill_price: u32) -> MercyOutcome {
    if !mercy_available(profile, refill_price) {
        return MercyOutcome::NotEligible;
    }

    profile.lives = 1;
    MercyOutcome::Granted
}
