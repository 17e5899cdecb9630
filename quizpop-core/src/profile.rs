use std::fmt;

use serde::{Deserialize, Serialize};

use crate::badges::BadgeId;
use crate::error::ProfileEditError;
use crate::lives::MAX_LIVES;
use crate::ranks::DEFAULT_RANK_ID;
use crate::xp::XP_PER_LEVEL;

pub const DEFAULT_NAME: &str = "New Player";
pub const DEFAULT_AVATAR: &str = "🦊";
pub const MAX_NAME_CHARS: usize = 15;

/// Avatars offered by the profile editor.
pub const AVATARS: [&str; 10] = ["🦊", "🐼", "🦁", "🐯", "🐸", "🐙", "🦄", "🤖", "👽", "👻"];

/// Stable identity handed out by the auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw identity, rejecting blank values.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable progression state of one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub xp: u32,
    pub level: u32,
    pub lives: u8,
    /// Unix seconds of the moment lives last dropped below the cap.
    pub last_regen_at: Option<u64>,
    pub games_played: u32,
    pub perfect_games: u32,
    pub selected_badges: Vec<BadgeId>,
    pub has_clutch_win: bool,
    pub name: String,
    pub avatar: String,
    pub selected_rank: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            lives: MAX_LIVES,
            last_regen_at: None,
            games_played: 0,
            perfect_games: 0,
            selected_badges: Vec::new(),
            has_clutch_win: false,
            name: DEFAULT_NAME.to_owned(),
            avatar: DEFAULT_AVATAR.to_owned(),
            selected_rank: DEFAULT_RANK_ID.to_owned(),
        }
    }
}

impl Profile {
    /// Bounds every engine operation must preserve.
    pub fn within_bounds(&self) -> bool {
        self.xp < XP_PER_LEVEL && self.lives <= MAX_LIVES && self.level >= 1
    }

    /// Pull rows written by older clients back inside the bounds.
    ///
    /// Surplus XP rolls into levels without the level-up refill. Returns
    /// whether anything was adjusted.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();

        self.level = self.level.max(1);
        self.level = self.level.saturating_add(self.xp / XP_PER_LEVEL);
        self.xp %= XP_PER_LEVEL;
        self.lives = self.lives.min(MAX_LIVES);
        if self.lives >= MAX_LIVES {
            self.last_regen_at = None;
        }

        *self != before
    }

    /// Zero counters and flags; display name and avatar are kept.
    pub fn reset_progress(&mut self) {
        *self = Self {
            name: std::mem::take(&mut self.name),
            avatar: std::mem::take(&mut self.avatar),
            ..Self::default()
        };
    }

    /// Change the display name and avatar.
    ///
    /// Returns whether anything changed.
    pub fn update_identity(&mut self, name: &str, avatar: &str) -> Result<bool, ProfileEditError> {
        let name = name.trim();
        let avatar = avatar.trim();

        if name.is_empty() {
            return Err(ProfileEditError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ProfileEditError::NameTooLong {
                max: MAX_NAME_CHARS,
            });
        }
        if avatar.is_empty() {
            return Err(ProfileEditError::EmptyAvatar);
        }

        let changed = self.name != name || self.avatar != avatar;
        self.name = name.to_owned();
        self.avatar = avatar.to_owned();
        Ok(changed)
    }
}

/// Fields changed by one mutation; `None` means untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub xp: Option<u32>,
    pub level: Option<u32>,
    pub lives: Option<u8>,
    pub last_regen_at: Option<Option<u64>>,
    pub games_played: Option<u32>,
    pub perfect_games: Option<u32>,
    pub selected_badges: Option<Vec<BadgeId>>,
    pub has_clutch_win: Option<bool>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub selected_rank: Option<String>,
}

fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    (before != after).then(|| after.clone())
}

impl ProfilePatch {
    /// Patch carrying only the fields that differ between two states.
    pub fn diff(before: &Profile, after: &Profile) -> Self {
        Self {
            xp: changed(&before.xp, &after.xp),
            level: changed(&before.level, &after.level),
            lives: changed(&before.lives, &after.lives),
            last_regen_at: changed(&before.last_regen_at, &after.last_regen_at),
            games_played: changed(&before.games_played, &after.games_played),
            perfect_games: changed(&before.perfect_games, &after.perfect_games),
            selected_badges: changed(&before.selected_badges, &after.selected_badges),
            has_clutch_win: changed(&before.has_clutch_win, &after.has_clutch_win),
            name: changed(&before.name, &after.name),
            avatar: changed(&before.avatar, &after.avatar),
            selected_rank: changed(&before.selected_rank, &after.selected_rank),
        }
    }

    /// Patch carrying every field, used to create a missing record.
    pub fn full(profile: &Profile) -> Self {
        Self {
            xp: Some(profile.xp),
            level: Some(profile.level),
            lives: Some(profile.lives),
            last_regen_at: Some(profile.last_regen_at),
            games_played: Some(profile.games_played),
            perfect_games: Some(profile.perfect_games),
            selected_badges: Some(profile.selected_badges.clone()),
            has_clutch_win: Some(profile.has_clutch_win),
            name: Some(profile.name.clone()),
            avatar: Some(profile.avatar.clone()),
            selected_rank: Some(profile.selected_rank.clone()),
        }
    }

    /// Layer a newer patch over this one; newer values win.
    pub fn merge(self, newer: ProfilePatch) -> Self {
        Self {
            xp: newer.xp.or(self.xp),
            level: newer.level.or(self.level),
            lives: newer.lives.or(self.lives),
            last_regen_at: newer.last_regen_at.or(self.last_regen_at),
            games_played: newer.games_played.or(self.games_played),
            perfect_games: newer.perfect_games.or(self.perfect_games),
            selected_badges: newer.selected_badges.or(self.selected_badges),
            has_clutch_win: newer.has_clutch_win.or(self.has_clutch_win),
            name: newer.name.or(self.name),
            avatar: newer.avatar.or(self.avatar),
            selected_rank: newer.selected_rank.or(self.selected_rank),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Column names touched by this patch, in schema order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.xp.is_some() {
            fields.push("xp");
        }
        if self.level.is_some() {
            fields.push("level");
        }
        if self.lives.is_some() {
            fields.push("lives");
        }
        if self.last_regen_at.is_some() {
            fields.push("last_regen_at");
        }
        if self.games_played.is_some() {
            fields.push("games_played");
        }
        if self.perfect_games.is_some() {
            fields.push("perfect_games");
        }
        if self.selected_badges.is_some() {
            fields.push("selected_badges");
        }
        if self.has_clutch_win.is_some() {
            fields.push("has_clutch_win");
        }
        if self.name.is_some() {
            fields.push("name");
        }
        if self.avatar.is_some() {
            fields.push("avatar");
        }
        if self.selected_rank.is_some() {
            fields.push("selected_rank");
        }
        fields
    }

    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(xp) = self.xp {
            profile.xp = xp;
        }
        if let Some(level) = self.level {
            profile.level = level;
        }
        if let Some(lives) = self.lives {
            profile.lives = lives;
        }
        if let Some(last_regen_at) = self.last_regen_at {
            profile.last_regen_at = last_regen_at;
        }
        if let Some(games_played) = self.games_played {
            profile.games_played = games_played;
        }
        if let Some(perfect_games) = self.perfect_games {
            profile.perfect_games = perfect_games;
        }
        if let Some(selected_badges) = &self.selected_badges {
            profile.selected_badges = selected_badges.clone();
        }
        if let Some(has_clutch_win) = self.has_clutch_win {
            profile.has_clutch_win = has_clutch_win;
        }
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.clone();
        }
        if let Some(selected_rank) = &self.selected_rank {
            profile.selected_rank = selected_rank.clone();
        }
    }
}
