use anyhow::Context as _;
use sqlx::FromRow;

use quizpop_core::badges::{Badge, BadgeCriteria};

#[derive(Debug, Clone, FromRow)]
pub struct BadgeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon_name: String,
    pub required_level: i32,
    pub criteria_type: String,
    pub criteria_value: i32,
}

impl TryFrom<BadgeRow> for Badge {
    type Error = anyhow::Error;

    fn try_from(row: BadgeRow) -> anyhow::Result<Self> {
        let criteria_value =
            u32::try_from(row.criteria_value).context("criteria_value row out of u32 range")?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            icon: row.icon_name,
            required_level: u32::try_from(row.required_level)
                .context("required_level row out of u32 range")?,
            criteria: BadgeCriteria::from_parts(&row.criteria_type, criteria_value),
        })
    }
}
