use quizpop_core::challenge::DailyChallenge;

use crate::cache::{CHALLENGE_CACHE_TTL, active_challenge_key};
use crate::database::Database;
use crate::model::challenge::ChallengeRow;

/// The newest challenge flagged active, if any.
pub async fn get_active_challenge(db: &Database) -> anyhow::Result<Option<DailyChallenge>> {
    let cache_key = active_challenge_key(db.cache());
    db.cache()
        .get_or_load_json(&cache_key, CHALLENGE_CACHE_TTL, || async {
            let row = sqlx::query_as::<_, ChallengeRow>(
                "SELECT category, title, description, bonus_multiplier
                 FROM daily_challenges
                 WHERE is_active = TRUE
                 ORDER BY id DESC
                 LIMIT 1",
            )
            .fetch_optional(db.pool())
            .await?;

            Ok(row.map(DailyChallenge::from))
        })
        .await
}
