use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quizpop_core::badges::{Badge, BadgeCriteria};
use quizpop_core::challenge::DailyChallenge;
use quizpop_core::{Profile, ProfilePatch, UserId};

#[derive(Debug, Default)]
struct MemoryState {
    profiles: HashMap<UserId, Profile>,
    badges: Vec<Badge>,
    challenge: Option<DailyChallenge>,
    fail_reads: bool,
    fail_writes: bool,
    applied_writes: usize,
}

/// Process-local store used for demos and tests.
///
/// Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the default badge catalog and challenge.
    pub fn seeded() -> Self {
        Self::with_catalog(default_badges(), Some(default_challenge()))
    }

    pub fn with_catalog(badges: Vec<Badge>, challenge: Option<DailyChallenge>) -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            state.badges = badges;
            state.challenge = challenge;
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_profile(&self, user_id: UserId, profile: Profile) {
        self.lock().profiles.insert(user_id, profile);
    }

    pub fn profile(&self, user_id: &UserId) -> Option<Profile> {
        self.lock().profiles.get(user_id).cloned()
    }

    pub fn set_active_challenge(&self, challenge: Option<DailyChallenge>) {
        self.lock().challenge = challenge;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of patches that reached the store.
    pub fn applied_writes(&self) -> usize {
        self.lock().applied_writes
    }

    pub async fn read_profile(&self, user_id: &UserId) -> anyhow::Result<Option<Profile>> {
        let state = self.lock();
        if state.fail_reads {
            anyhow::bail!("memory store read failed for `{user_id}`");
        }
        Ok(state.profiles.get(user_id).cloned())
    }

    pub async fn update_profile(
        &self,
        user_id: &UserId,
        patch: &ProfilePatch,
    ) -> anyhow::Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            anyhow::bail!("memory store write failed for `{user_id}`");
        }

        let profile = state.profiles.entry(user_id.clone()).or_default();
        patch.apply_to(profile);
        state.applied_writes += 1;
        Ok(())
    }

    pub async fn list_badges(&self) -> anyhow::Result<Vec<Badge>> {
        let state = self.lock();
        if state.fail_reads {
            anyhow::bail!("memory store badge catalog unavailable");
        }
        Ok(state.badges.clone())
    }

    pub async fn active_challenge(&self) -> anyhow::Result<Option<DailyChallenge>> {
        let state = self.lock();
        if state.fail_reads {
            anyhow::bail!("memory store challenge catalog unavailable");
        }
        Ok(state.challenge.clone())
    }
}

fn badge(
    id: i64,
    name: &str,
    description: &str,
    icon: &str,
    required_level: u32,
    criteria: BadgeCriteria,
) -> Badge {
    Badge {
        id,
        name: name.to_owned(),
        description: description.to_owned(),
        icon: icon.to_owned(),
        required_level,
        criteria,
    }
}

/// Same rows the catalog migration seeds.
pub fn default_badges() -> Vec<Badge> {
    vec![
        badge(1, "Rookie", "Finish your first quiz", "rocket", 1, BadgeCriteria::GamesPlayed(1)),
        badge(
            2,
            "Sharp Mind",
            "Answer every question of a quiz correctly",
            "target",
            2,
            BadgeCriteria::PerfectGames(1),
        ),
        badge(3, "Rising Star", "Reach level 3", "star", 3, BadgeCriteria::Level(3)),
        badge(4, "Regular", "Finish 10 quizzes", "flame", 4, BadgeCriteria::GamesPlayed(10)),
        badge(
            5,
            "Perfectionist",
            "Finish 5 perfect quizzes",
            "crown",
            5,
            BadgeCriteria::PerfectGames(5),
        ),
        badge(6, "Veteran", "Reach level 10", "shield", 10, BadgeCriteria::Level(10)),
    ]
}

pub fn default_challenge() -> DailyChallenge {
    DailyChallenge {
        category: "js".to_owned(),
        title: "JavaScript Day".to_owned(),
        description: "Double XP for every JavaScript quiz".to_owned(),
        bonus_multiplier: 2,
    }
}
