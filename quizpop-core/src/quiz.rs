use crate::challenge::{DailyChallenge, earned_xp, resolve_multiplier};
use crate::clutch;
use crate::profile::Profile;
use crate::xp::apply_xp;

/// Outcome of one quiz as reported by the quiz flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizResult {
    pub category: String,
    pub correct_answers: u32,
    pub total_questions: u32,
}

impl QuizResult {
    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.correct_answers >= self.total_questions
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizSummary {
    pub multiplier: u32,
    pub earned_xp: u32,
    pub levels_gained: u32,
    pub perfect: bool,
    pub clutch: bool,
}

/// Fold a finished quiz into the profile.
///
/// The clutch check reads lives before XP is applied since a level-up
/// refills them.
pub fn complete_quiz(
    profile: &mut Profile,
    result: &QuizResult,
    active_challenge: Option<&DailyChallenge>,
    points_per_answer: u32,
) -> QuizSummary {
    let clutch = clutch::record_completion(profile);

    profile.games_played = profile.games_played.saturating_add(1);
    let perfect = result.is_perfect();
    if perfect {
        profile.perfect_games = profile.perfect_games.saturating_add(1);
    }

    let multiplier = resolve_multiplier(active_challenge, &result.category);
    let correct = result.correct_answers.min(result.total_questions);
    let earned_xp = earned_xp(correct, points_per_answer, multiplier);
    let levels_gained = apply_xp(profile, earned_xp);

    QuizSummary {
        multiplier,
        earned_xp,
        levels_gained,
        perfect,
        clutch,
    }
}
