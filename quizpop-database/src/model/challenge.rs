use sqlx::FromRow;

use quizpop_core::challenge::DailyChallenge;

#[derive(Debug, Clone, FromRow)]
pub struct ChallengeRow {
    pub category: String,
    pub title: String,
    pub description: String,
    pub bonus_multiplier: i32,
}

impl From<ChallengeRow> for DailyChallenge {
    fn from(row: ChallengeRow) -> Self {
        Self {
            category: row.category,
            title: row.title,
            description: row.description,
            // Non-positive multipliers would erase earned XP.
            bonus_multiplier: u32::try_from(row.bonus_multiplier).unwrap_or(1).max(1),
        }
    }
}
