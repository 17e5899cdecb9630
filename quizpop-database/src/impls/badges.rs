use quizpop_core::badges::Badge;

use crate::cache::{CATALOG_CACHE_TTL, badge_catalog_key};
use crate::database::Database;
use crate::model::badge::BadgeRow;

/// Badge catalog in display order (required level, then id).
pub async fn list_badges(db: &Database) -> anyhow::Result<Vec<Badge>> {
    let cache_key = badge_catalog_key(db.cache());
    db.cache()
        .get_or_load_json(&cache_key, CATALOG_CACHE_TTL, || async {
            let rows: Vec<BadgeRow> = sqlx::query_as(
                "SELECT id, name, description, icon_name, required_level, criteria_type, criteria_value
                 FROM badges
                 ORDER BY required_level ASC, id ASC",
            )
            .fetch_all(db.pool())
            .await?;

            rows.into_iter().map(Badge::try_from).collect()
        })
        .await
}
