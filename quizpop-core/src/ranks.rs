use crate::error::ProfileEditError;
use crate::profile::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rank {
    pub id: &'static str,
    pub title: &'static str,
    pub unlock_level: u32,
}

pub const DEFAULT_RANK_ID: &str = "novice";

pub const RANKS: [Rank; 6] = [
    Rank {
        id: "novice",
        title: "Novice",
        unlock_level: 1,
    },
    Rank {
        id: "apprentice",
        title: "Apprentice",
        unlock_level: 3,
    },
    Rank {
        id: "scholar",
        title: "Scholar",
        unlock_level: 5,
    },
    Rank {
        id: "expert",
        title: "Expert",
        unlock_level: 10,
    },
    Rank {
        id: "master",
        title: "Quiz Master",
        unlock_level: 20,
    },
    Rank {
        id: "legend",
        title: "Legend",
        unlock_level: 35,
    },
];

pub fn find_rank(rank_id: &str) -> Option<&'static Rank> {
    RANKS.iter().find(|rank| rank.id == rank_id)
}

/// Ranks the player may pick at the given level, lowest first.
pub fn available_ranks(level: u32) -> impl Iterator<Item = &'static Rank> {
    RANKS.iter().filter(move |rank| rank.unlock_level <= level)
}

/// Title to display for a stored rank id.
pub fn rank_title(rank_id: &str) -> &'static str {
    find_rank(rank_id).map_or(RANKS[0].title, |rank| rank.title)
}

pub fn select_rank(profile: &mut Profile, rank_id: &str) -> Result<bool, ProfileEditError> {
    let rank = find_rank(rank_id.trim()).ok_or_else(|| ProfileEditError::UnknownRank {
        rank_id: rank_id.trim().to_owned(),
    })?;

    if rank.unlock_level > profile.level {
        return Err(ProfileEditError::RankLocked {
            rank_id: rank.id.to_owned(),
            required_level: rank.unlock_level,
        });
    }

    let changed = profile.selected_rank != rank.id;
    profile.selected_rank = rank.id.to_owned();
    Ok(changed)
}
