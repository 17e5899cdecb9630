use anyhow::Context as _;
use sqlx::FromRow;

use quizpop_core::Profile;

/// Row shape of the `profiles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub xp: i32,
    pub level: i32,
    pub lives: i16,
    pub last_regen_at: Option<i64>,
    pub games_played: i32,
    pub perfect_games: i32,
    pub selected_badges: Vec<i64>,
    pub has_clutch_win: bool,
    pub name: String,
    pub avatar: String,
    pub selected_rank: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> anyhow::Result<Self> {
        Ok(Self {
            xp: u32::try_from(row.xp).context("xp row out of u32 range")?,
            level: u32::try_from(row.level).context("level row out of u32 range")?,
            lives: u8::try_from(row.lives).context("lives row out of u8 range")?,
            last_regen_at: row
                .last_regen_at
                .map(u64::try_from)
                .transpose()
                .context("last_regen_at row out of u64 range")?,
            games_played: u32::try_from(row.games_played)
                .context("games_played row out of u32 range")?,
            perfect_games: u32::try_from(row.perfect_games)
                .context("perfect_games row out of u32 range")?,
            selected_badges: row.selected_badges,
            has_clutch_win: row.has_clutch_win,
            name: row.name,
            avatar: row.avatar,
            selected_rank: row.selected_rank,
        })
    }
}
