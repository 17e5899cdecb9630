use thiserror::Error;

use crate::badges::BadgeId;

/// Rejection returned when a badge showcase change is not allowed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("at most {limit} badges can be showcased")]
    LimitReached { limit: usize },
    #[error("badge {badge_id} is still locked")]
    Locked { badge_id: BadgeId },
    #[error("badge {badge_id} is not in the catalog")]
    UnknownBadge { badge_id: BadgeId },
}

/// Rejection returned when a display attribute edit is not allowed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProfileEditError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("avatar must not be empty")]
    EmptyAvatar,
    #[error("rank `{rank_id}` does not exist")]
    UnknownRank { rank_id: String },
    #[error("rank `{rank_id}` unlocks at level {required_level}")]
    RankLocked {
        rank_id: String,
        required_level: u32,
    },
}
