use serde::{Deserialize, Serialize};

/// The currently promoted quiz category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub category: String,
    pub title: String,
    pub description: String,
    pub bonus_multiplier: u32,
}

/// XP multiplier for a finished quiz. Anything but an exact category match is 1.
pub fn resolve_multiplier(active: Option<&DailyChallenge>, played_category: &str) -> u32 {
    match active {
        Some(challenge) if challenge.category == played_category => {
            challenge.bonus_multiplier.max(1)
        }
        _ => 1,
    }
}

pub fn earned_xp(correct_answers: u32, points_per_answer: u32, multiplier: u32) -> u32 {
    correct_answers
        .saturating_mul(points_per_answer)
        .saturating_mul(multiplier.max(1))
}
