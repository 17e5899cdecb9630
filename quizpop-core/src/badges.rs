use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::profile::Profile;

pub type BadgeId = i64;

/// Number of badges a player can showcase at once.
pub const MAX_SELECTED_BADGES: usize = 3;

/// Counter threshold a badge is gated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BadgeCriteria {
    Level(u32),
    GamesPlayed(u32),
    PerfectGames(u32),
}

impl BadgeCriteria {
    /// Build a criterion from its stored kind name. Unknown kinds gate on level.
    pub fn from_parts(kind: &str, value: u32) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "games" => Self::GamesPlayed(value),
            "perfect" => Self::PerfectGames(value),
            _ => Self::Level(value),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Level(_) => "level",
            Self::GamesPlayed(_) => "games",
            Self::PerfectGames(_) => "perfect",
        }
    }

    pub fn threshold(&self) -> u32 {
        match self {
            Self::Level(value) | Self::GamesPlayed(value) | Self::PerfectGames(value) => *value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Shown next to locked badges; unlocking follows `criteria`.
    pub required_level: u32,
    pub criteria: BadgeCriteria,
}

pub fn is_unlocked(badge: &Badge, profile: &Profile) -> bool {
    match badge.criteria {
        BadgeCriteria::GamesPlayed(value) => profile.games_played >= value,
        BadgeCriteria::PerfectGames(value) => profile.perfect_games >= value,
        BadgeCriteria::Level(value) => profile.level >= value,
    }
}

pub fn unlocked_badges<'a>(catalog: &'a [Badge], profile: &Profile) -> Vec<&'a Badge> {
    catalog
        .iter()
        .filter(|badge| is_unlocked(badge, profile))
        .collect()
}

/// Showcased badges in selection order, skipping ids missing from the catalog.
pub fn showcased_badges<'a>(catalog: &'a [Badge], profile: &Profile) -> Vec<&'a Badge> {
    profile
        .selected_badges
        .iter()
        .filter_map(|id| catalog.iter().find(|badge| badge.id == *id))
        .collect()
}

/// Add a badge to the showcase.
///
/// Selecting an already showcased badge is a no-op. Returns whether the
/// selection changed.
pub fn select_badge(profile: &mut Profile, badge: &Badge) -> Result<bool, SelectionError> {
    if profile.selected_badges.contains(&badge.id) {
        return Ok(false);
    }
    if !is_unlocked(badge, profile) {
        return Err(SelectionError::Locked { badge_id: badge.id });
    }
    if profile.selected_badges.len() >= MAX_SELECTED_BADGES {
        return Err(SelectionError::LimitReached {
            limit: MAX_SELECTED_BADGES,
        });
    }

    profile.selected_badges.push(badge.id);
    Ok(true)
}

pub fn deselect_badge(profile: &mut Profile, badge_id: BadgeId) -> bool {
    let before = profile.selected_badges.len();
    profile.selected_badges.retain(|id| *id != badge_id);
    profile.selected_badges.len() != before
}

pub fn toggle_badge(profile: &mut Profile, badge: &Badge) -> Result<bool, SelectionError> {
    if deselect_badge(profile, badge.id) {
        return Ok(true);
    }
    select_badge(profile, badge)
}

/// Replace the whole showcase at once.
///
/// Duplicates are dropped and only the first three ids are kept. Every id
/// must name an unlocked badge in the catalog.
pub fn save_badge_selection(
    profile: &mut Profile,
    ids: &[BadgeId],
    catalog: &[Badge],
) -> Result<bool, SelectionError> {
    let mut selection: Vec<BadgeId> = Vec::with_capacity(MAX_SELECTED_BADGES);
    for id in ids {
        if !selection.contains(id) {
            selection.push(*id);
        }
    }
    selection.truncate(MAX_SELECTED_BADGES);

    for id in &selection {
        let badge = catalog
            .iter()
            .find(|badge| badge.id == *id)
            .ok_or(SelectionError::UnknownBadge { badge_id: *id })?;
        if !is_unlocked(badge, profile) {
            return Err(SelectionError::Locked { badge_id: *id });
        }
    }

    let changed = profile.selected_badges != selection;
    profile.selected_badges = selection;
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn badge(id: BadgeId, criteria: BadgeCriteria) -> Badge {
        Badge {
            id,
            name: format!("Badge {id}"),
            description: String::new(),
            icon: "star".to_owned(),
            required_level: criteria.threshold(),
            criteria,
        }
    }

    fn catalog() -> Vec<Badge> {
        vec![
            badge(1, BadgeCriteria::Level(1)),
            badge(2, BadgeCriteria::GamesPlayed(1)),
            badge(3, BadgeCriteria::PerfectGames(1)),
            badge(4, BadgeCriteria::Level(2)),
            badge(5, BadgeCriteria::Level(50)),
        ]
    }

    fn veteran() -> Profile {
        Profile {
            level: 3,
            games_played: 10,
            perfect_games: 2,
            ..Profile::default()
        }
    }

    #[test]
    fn criteria_dispatch_on_the_matching_counter() {
        let p = Profile {
            level: 2,
            games_played: 5,
            perfect_games: 0,
            ..Profile::default()
        };

        assert!(is_unlocked(&badge(1, BadgeCriteria::Level(2)), &p));
        assert!(!is_unlocked(&badge(1, BadgeCriteria::Level(3)), &p));
        assert!(is_unlocked(&badge(1, BadgeCriteria::GamesPlayed(5)), &p));
        assert!(!is_unlocked(&badge(1, BadgeCriteria::GamesPlayed(6)), &p));
        assert!(!is_unlocked(&badge(1, BadgeCriteria::PerfectGames(1)), &p));
    }

    #[test]
    fn unknown_kinds_fall_back_to_level() {
        assert_eq!(BadgeCriteria::from_parts("games", 3), BadgeCriteria::GamesPlayed(3));
        assert_eq!(BadgeCriteria::from_parts("Perfect", 1), BadgeCriteria::PerfectGames(1));
        assert_eq!(BadgeCriteria::from_parts("level", 4), BadgeCriteria::Level(4));
        assert_eq!(BadgeCriteria::from_parts("streak", 4), BadgeCriteria::Level(4));
    }

    #[test]
    fn unlock_check_is_pure() {
        let p = veteran();
        let snapshot = p.clone();
        let b = badge(9, BadgeCriteria::GamesPlayed(10));

        let first = is_unlocked(&b, &p);
        let second = is_unlocked(&b, &p);

        assert_eq!(first, second);
        assert_eq!(p, snapshot);
    }

    #[test]
    fn inventory_lists_unlocked_badges_in_catalog_order() {
        let catalog = catalog();
        let ids: Vec<BadgeId> = unlocked_badges(&catalog, &veteran())
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn fourth_badge_is_rejected() {
        let catalog = catalog();
        let mut p = veteran();
        for b in &catalog[..3] {
            assert_eq!(select_badge(&mut p, b), Ok(true));
        }

        assert_eq!(
            select_badge(&mut p, &catalog[3]),
            Err(SelectionError::LimitReached { limit: 3 })
        );
        assert_eq!(p.selected_badges, vec![1, 2, 3]);
    }

    #[test]
    fn locked_badges_cannot_be_selected() {
        let catalog = catalog();
        let mut p = veteran();
        assert_eq!(
            select_badge(&mut p, &catalog[4]),
            Err(SelectionError::Locked { badge_id: 5 })
        );
        assert!(p.selected_badges.is_empty());
    }

    #[test]
    fn reselecting_and_toggling() {
        let catalog = catalog();
        let mut p = veteran();

        assert_eq!(select_badge(&mut p, &catalog[0]), Ok(true));
        assert_eq!(select_badge(&mut p, &catalog[0]), Ok(false));
        assert_eq!(toggle_badge(&mut p, &catalog[0]), Ok(true));
        assert!(p.selected_badges.is_empty());
        assert_eq!(toggle_badge(&mut p, &catalog[1]), Ok(true));
        assert_eq!(p.selected_badges, vec![2]);
        assert!(!deselect_badge(&mut p, 7));
    }

    #[test]
    fn saved_selection_is_deduplicated_and_capped() {
        let catalog = catalog();
        let mut p = veteran();

        assert_eq!(save_badge_selection(&mut p, &[2, 2, 1, 4, 3], &catalog), Ok(true));
        assert_eq!(p.selected_badges, vec![2, 1, 4]);

        assert_eq!(
            save_badge_selection(&mut p, &[5], &catalog),
            Err(SelectionError::Locked { badge_id: 5 })
        );
        assert_eq!(
            save_badge_selection(&mut p, &[42], &catalog),
            Err(SelectionError::UnknownBadge { badge_id: 42 })
        );
        assert_eq!(p.selected_badges, vec![2, 1, 4]);
    }

    #[test]
    fn showcase_follows_selection_order() {
        let catalog = catalog();
        let p = Profile {
            selected_badges: vec![3, 99, 1],
            ..veteran()
        };
        let names: Vec<&str> = showcased_badges(&catalog, &p)
            .into_iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["Badge 3", "Badge 1"]);
    }
}
