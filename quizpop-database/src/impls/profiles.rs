use anyhow::Context as _;
use sqlx::{Postgres, QueryBuilder};

use quizpop_core::{Profile, ProfilePatch, UserId};

use crate::database::Database;
use crate::model::profile::ProfileRow;

/// Load the stored profile for a user, if one exists.
pub async fn get_profile(db: &Database, user_id: &UserId) -> anyhow::Result<Option<Profile>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT xp, level, lives, last_regen_at, games_played, perfect_games, \
         selected_badges, has_clutch_win, name, avatar, selected_rank \
         FROM profiles WHERE user_id = $1",
    )
    .bind(user_id.as_str())
    .fetch_optional(db.pool())
    .await?;

    row.map(Profile::try_from).transpose()
}

/// Write the changed columns of a profile, creating the row when missing.
///
/// Columns absent from the patch keep their stored value (or the table
/// default for a new row).
pub async fn upsert_profile_patch(
    db: &Database,
    user_id: &UserId,
    patch: &ProfilePatch,
) -> anyhow::Result<()> {
    let Some(mut builder) = build_upsert(user_id, patch)? else {
        return Ok(());
    };

    builder.build().execute(db.pool()).await?;

    Ok(())
}

/// Column value converted to its SQL type.
#[derive(Debug)]
enum ColumnValue {
    Int(i32),
    SmallInt(i16),
    NullableBigInt(Option<i64>),
    BigIntArray(Vec<i64>),
    Bool(bool),
    Text(String),
}

/// Changed columns paired with their values, in table order.
fn patch_columns(patch: &ProfilePatch) -> anyhow::Result<Vec<(&'static str, ColumnValue)>> {
    let mut columns = Vec::new();

    if let Some(xp) = patch.xp {
        let xp = i32::try_from(xp).context("xp out of i32 range")?;
        columns.push(("xp", ColumnValue::Int(xp)));
    }
    if let Some(level) = patch.level {
        let level = i32::try_from(level).context("level out of i32 range")?;
        columns.push(("level", ColumnValue::Int(level)));
    }
    if let Some(lives) = patch.lives {
        columns.push(("lives", ColumnValue::SmallInt(i16::from(lives))));
    }
    if let Some(last_regen_at) = patch.last_regen_at {
        let last_regen_at = last_regen_at
            .map(i64::try_from)
            .transpose()
            .context("last_regen_at out of i64 range")?;
        columns.push(("last_regen_at", ColumnValue::NullableBigInt(last_regen_at)));
    }
    if let Some(games_played) = patch.games_played {
        let games_played = i32::try_from(games_played).context("games_played out of i32 range")?;
        columns.push(("games_played", ColumnValue::Int(games_played)));
    }
    if let Some(perfect_games) = patch.perfect_games {
        let perfect_games =
            i32::try_from(perfect_games).context("perfect_games out of i32 range")?;
        columns.push(("perfect_games", ColumnValue::Int(perfect_games)));
    }
    if let Some(selected_badges) = &patch.selected_badges {
        columns.push((
            "selected_badges",
            ColumnValue::BigIntArray(selected_badges.clone()),
        ));
    }
    if let Some(has_clutch_win) = patch.has_clutch_win {
        columns.push(("has_clutch_win", ColumnValue::Bool(has_clutch_win)));
    }
    if let Some(name) = &patch.name {
        columns.push(("name", ColumnValue::Text(name.clone())));
    }
    if let Some(avatar) = &patch.avatar {
        columns.push(("avatar", ColumnValue::Text(avatar.clone())));
    }
    if let Some(selected_rank) = &patch.selected_rank {
        columns.push(("selected_rank", ColumnValue::Text(selected_rank.clone())));
    }

    Ok(columns)
}

/// `INSERT .. ON CONFLICT DO UPDATE` over the patched columns, or `None`
/// for an empty patch.
fn build_upsert(
    user_id: &UserId,
    patch: &ProfilePatch,
) -> anyhow::Result<Option<QueryBuilder<'static, Postgres>>> {
    let columns = patch_columns(patch)?;
    if columns.is_empty() {
        return Ok(None);
    }

    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO profiles (user_id");
    for (column, _) in &columns {
        builder.push(", ").push(*column);
    }

    builder.push(") VALUES (").push_bind(user_id.as_str().to_owned());
    for (_, value) in &columns {
        builder.push(", ");
        match value {
            ColumnValue::Int(value) => builder.push_bind(*value),
            ColumnValue::SmallInt(value) => builder.push_bind(*value),
            ColumnValue::NullableBigInt(value) => builder.push_bind(*value),
            ColumnValue::BigIntArray(value) => builder.push_bind(value.clone()),
            ColumnValue::Bool(value) => builder.push_bind(*value),
            ColumnValue::Text(value) => builder.push_bind(value.clone()),
        };
    }
    builder.push(") ON CONFLICT (user_id) DO UPDATE SET ");

    {
        let mut assignments = builder.separated(", ");
        for (column, _) in &columns {
            assignments.push(format!("{column} = EXCLUDED.{column}"));
        }
        assignments.push("updated_at = now()");
    }

    Ok(Some(builder))
}
