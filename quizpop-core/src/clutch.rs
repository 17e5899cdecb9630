//! Clutch wins: finishing a quiz while hanging on to the last life.

use crate::profile::Profile;

pub const CLUTCH_LIVES: u8 = 1;

pub fn is_clutch(lives_at_completion: u8) -> bool {
    lives_at_completion == CLUTCH_LIVES
}

/// Set the sticky clutch flag when the quiz ended on one life.
///
/// Returns whether this completion counted as a clutch win. The flag is
/// never cleared here.
pub fn record_completion(profile: &mut Profile) -> bool {
    let clutch = is_clutch(profile.lives);
    if clutch {
        profile.has_clutch_win = true;
    }
    clutch
}
