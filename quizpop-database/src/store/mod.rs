mod memory;

use quizpop_core::badges::Badge;
use quizpop_core::challenge::DailyChallenge;
use quizpop_core::{Profile, ProfilePatch, UserId};

use crate::cache::{invalidate_active_challenge, invalidate_badge_catalog};
use crate::database::Database;
use crate::impls::{badges, challenges, profiles};

pub use memory::{MemoryStore, default_badges, default_challenge};

#[derive(Clone, Debug)]
enum StoreBackend {
    Memory(MemoryStore),
    Postgres(Database),
}

/// Store of record for profiles plus the read-only catalogs.
#[derive(Clone, Debug)]
pub struct GameStore {
    backend: StoreBackend,
}

impl GameStore {
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            backend: StoreBackend::Memory(store),
        }
    }

    pub fn postgres(db: Database) -> Self {
        Self {
            backend: StoreBackend::Postgres(db),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            StoreBackend::Memory(_) => "memory",
            StoreBackend::Postgres(_) => "postgres",
        }
    }

    pub async fn read_profile(&self, user_id: &UserId) -> anyhow::Result<Option<Profile>> {
        match &self.backend {
            StoreBackend::Memory(store) => store.read_profile(user_id).await,
            StoreBackend::Postgres(db) => profiles::get_profile(db, user_id).await,
        }
    }

    /// Persist only the fields carried by `patch`; an empty patch is a no-op.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        patch: &ProfilePatch,
    ) -> anyhow::Result<()> {
        if patch.is_empty() {
            return Ok(());
        }

        match &self.backend {
            StoreBackend::Memory(store) => store.update_profile(user_id, patch).await,
            StoreBackend::Postgres(db) => profiles::upsert_profile_patch(db, user_id, patch).await,
        }
    }

    pub async fn list_badges(&self) -> anyhow::Result<Vec<Badge>> {
        match &self.backend {
            StoreBackend::Memory(store) => store.list_badges().await,
            StoreBackend::Postgres(db) => badges::list_badges(db).await,
        }
    }

    pub async fn active_challenge(&self) -> anyhow::Result<Option<DailyChallenge>> {
        match &self.backend {
            StoreBackend::Memory(store) => store.active_challenge().await,
            StoreBackend::Postgres(db) => challenges::get_active_challenge(db).await,
        }
    }

    /// Drop cached catalogs so the next read goes to the database.
    pub async fn refresh_catalogs(&self) -> anyhow::Result<()> {
        match &self.backend {
            StoreBackend::Memory(_) => Ok(()),
            StoreBackend::Postgres(db) => {
                invalidate_badge_catalog(db.cache()).await?;
                invalidate_active_challenge(db.cache()).await
            }
        }
    }
}
