use std::sync::Arc;

use anyhow::Context as _;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quizpop_core::badges::{self, Badge, BadgeId};
use quizpop_core::challenge::DailyChallenge;
use quizpop_core::lives::{self, MercyOutcome, RefillOutcome, RegenOutcome};
use quizpop_core::quiz::{self, QuizResult, QuizSummary};
use quizpop_core::{
    EngineConfig, Profile, ProfileEditError, ProfilePatch, SelectionError, UserId, ranks, xp,
};
use quizpop_database::GameStore;
use quizpop_utils::time::now_unix_secs;

use crate::Clock;
use crate::mirror::Mirror;
use crate::regen;
use crate::writer::ProfileWriter;

struct Session {
    user_id: UserId,
    mirror: Mirror,
    challenge: Option<DailyChallenge>,
    writer: ProfileWriter,
    /// Runtime the session was opened on; background tasks are spawned here.
    runtime: Handle,
    regen: Option<JoinHandle<()>>,
}

impl Session {
    fn ensure_regen(&mut self, config: EngineConfig, clock: &Clock) {
        if self.regen.as_ref().is_some_and(JoinHandle::is_finished) {
            self.regen = None;
        }
        if let Some(handle) = regen::ensure_running(
            &self.runtime,
            &self.mirror,
            &self.user_id,
            config,
            clock,
        ) {
            self.regen = Some(handle);
        }
    }
}

/// Session-scoped owner of a player's progression.
///
/// Mutations apply to the local mirror right away and are persisted in the
/// background. Without a signed-in user every mutation is a no-op that
/// returns `None`.
pub struct ProgressionService {
    store: GameStore,
    config: EngineConfig,
    clock: Clock,
    session: Option<Session>,
}

impl ProgressionService {
    pub fn new(store: GameStore, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(now_unix_secs),
            session: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|session| &session.user_id)
    }

    /// Start a session for `identity`, replacing any current one.
    ///
    /// Returns `Ok(false)` when no identity is given. A failed profile read
    /// is returned as an error and leaves the service idle.
    pub async fn sign_in(&mut self, identity: Option<UserId>) -> anyhow::Result<bool> {
        self.sign_out();

        let Some(user_id) = identity else {
            debug!("no identity supplied; staying idle");
            return Ok(false);
        };

        let stored = self
            .store
            .read_profile(&user_id)
            .await
            .with_context(|| format!("failed to load profile for `{user_id}`"))?;

        let (profile, initial) = match stored {
            Some(mut profile) => {
                let before = profile.clone();
                if profile.normalize() {
                    warn!(user_id = %user_id, "stored profile was out of range; repairing it");
                }
                let patch = ProfilePatch::diff(&before, &profile);
                (profile, patch)
            }
            None => {
                info!(user_id = %user_id, "no stored profile; creating one");
                let profile = Profile::default();
                let patch = ProfilePatch::full(&profile);
                (profile, patch)
            }
        };

        let challenge = match self.store.active_challenge().await {
            Ok(challenge) => challenge,
            Err(err) => {
                warn!(?err, "daily challenge unavailable; playing without a bonus");
                None
            }
        };

        let writer = ProfileWriter::spawn(self.store.clone(), user_id.clone());
        writer.sender().send(initial);

        info!(
            user_id = %user_id,
            level = profile.level,
            lives = profile.lives,
            backend = self.store.backend_name(),
            "signed in"
        );

        let mut session = Session {
            mirror: Mirror::new(profile, writer.sender()),
            user_id,
            challenge,
            writer,
            runtime: Handle::current(),
            regen: None,
        };
        session.ensure_regen(self.config, &self.clock);
        self.session = Some(session);

        Ok(true)
    }

    /// End the session. Queued writes still complete in the background.
    pub fn sign_out(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if let Some(handle) = session.regen {
            handle.abort();
        }
        session.mirror.release_regen();
        session.writer.detach();
        info!(user_id = %session.user_id, "signed out");
    }

    /// End the session and wait for every queued write.
    pub async fn shutdown(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Session {
            user_id,
            mirror,
            writer,
            regen,
            ..
        } = session;

        if let Some(handle) = regen {
            handle.abort();
            let _ = handle.await;
        }
        drop(mirror);
        writer.finish().await;
        info!(user_id = %user_id, "session closed");
    }

    /// Wait until the writes queued so far have been attempted.
    pub async fn flush_writes(&self) {
        if let Some(session) = &self.session {
            session.writer.flush().await;
        }
    }

    pub fn profile(&self) -> Option<Profile> {
        self.session.as_ref().map(|session| session.mirror.snapshot())
    }

    pub fn active_challenge(&self) -> Option<&DailyChallenge> {
        self.session.as_ref()?.challenge.as_ref()
    }

    /// A quiz can only start with at least one life left.
    pub fn can_play(&self) -> bool {
        self.profile().is_some_and(|profile| profile.lives > 0)
    }

    pub fn seconds_until_next_life(&self) -> Option<u64> {
        let profile = self.profile()?;
        lives::seconds_until_next_life(&profile, (self.clock)(), self.config.regen_unit_secs())
    }

    pub fn mercy_available(&self) -> bool {
        self.profile()
            .is_some_and(|profile| lives::mercy_available(&profile, self.config.refill_price))
    }

    /// Current badge catalog; an unreachable catalog reads as empty.
    pub async fn badge_catalog(&self) -> Vec<Badge> {
        match self.store.list_badges().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(?err, "badge catalog unavailable");
                Vec::new()
            }
        }
    }

    /// Drop cached catalogs and reload the active challenge.
    pub async fn refresh_catalogs(&mut self) -> anyhow::Result<()> {
        self.store
            .refresh_catalogs()
            .await
            .context("failed to invalidate cached catalogs")?;

        if let Some(session) = self.session.as_mut() {
            session.challenge = self
                .store
                .active_challenge()
                .await
                .context("failed to reload the daily challenge")?;
        }
        Ok(())
    }

    fn mutate<R>(&mut self, op: &'static str, f: impl FnOnce(&mut Profile) -> R) -> Option<R> {
        let Some(session) = self.session.as_mut() else {
            debug!(op, "no active session; ignoring");
            return None;
        };

        let (result, patch) = session.mirror.mutate(f);
        if !patch.is_empty() {
            debug!(
                user_id = %session.user_id,
                op,
                fields = ?patch.changed_fields(),
                "profile updated"
            );
        }
        session.ensure_regen(self.config, &self.clock);

        Some(result)
    }

    /// Record one answer. A wrong answer costs a life. Returns lives left.
    pub fn answer(&mut self, correct: bool) -> Option<u8> {
        let now = (self.clock)();
        self.mutate("answer", |profile| {
            if !correct {
                lives::lose_life(profile, now);
            }
            profile.lives
        })
    }

    pub fn lose_life(&mut self) -> Option<bool> {
        let now = (self.clock)();
        self.mutate("lose_life", |profile| lives::lose_life(profile, now))
    }

    /// Returns the number of levels gained.
    pub fn add_xp(&mut self, amount: u32) -> Option<u32> {
        self.mutate("add_xp", |profile| xp::apply_xp(profile, amount))
    }

    pub fn finish_quiz(&mut self, result: &QuizResult) -> Option<QuizSummary> {
        let challenge = self.active_challenge().cloned();
        let points = self.config.points_per_answer;
        let summary = self.mutate("finish_quiz", |profile| {
            quiz::complete_quiz(profile, result, challenge.as_ref(), points)
        })?;

        if let Some(user_id) = self.user_id() {
            info!(
                user_id = %user_id,
                category = %result.category,
                earned_xp = summary.earned_xp,
                levels_gained = summary.levels_gained,
                clutch = summary.clutch,
                "quiz finished"
            );
        }
        Some(summary)
    }

    pub fn buy_refill(&mut self) -> Option<RefillOutcome> {
        let price = self.config.refill_price;
        self.mutate("buy_refill", |profile| lives::buy_refill(profile, price))
    }

    pub fn claim_mercy_life(&mut self) -> Option<MercyOutcome> {
        let price = self.config.refill_price;
        self.mutate("claim_mercy_life", |profile| {
            lives::claim_mercy_life(profile, price)
        })
    }

    /// Run a regeneration check now instead of waiting for the next poll.
    pub fn check_regeneration(&mut self) -> Option<RegenOutcome> {
        let now = (self.clock)();
        let unit = self.config.regen_unit_secs();
        let policy = self.config.regen_policy;
        self.mutate("check_regeneration", |profile| {
            lives::check_regeneration(profile, now, unit, policy)
        })
    }

    pub fn select_badge(&mut self, badge: &Badge) -> Option<Result<bool, SelectionError>> {
        self.mutate("select_badge", |profile| badges::select_badge(profile, badge))
    }

    pub fn deselect_badge(&mut self, badge_id: BadgeId) -> Option<bool> {
        self.mutate("deselect_badge", |profile| {
            badges::deselect_badge(profile, badge_id)
        })
    }

    pub fn toggle_badge(&mut self, badge: &Badge) -> Option<Result<bool, SelectionError>> {
        self.mutate("toggle_badge", |profile| badges::toggle_badge(profile, badge))
    }

    pub fn save_badge_selection(
        &mut self,
        ids: &[BadgeId],
        catalog: &[Badge],
    ) -> Option<Result<bool, SelectionError>> {
        self.mutate("save_badge_selection", |profile| {
            badges::save_badge_selection(profile, ids, catalog)
        })
    }

    pub fn update_profile(
        &mut self,
        name: &str,
        avatar: &str,
    ) -> Option<Result<bool, ProfileEditError>> {
        self.mutate("update_profile", |profile| {
            profile.update_identity(name, avatar)
        })
    }

    pub fn select_rank(&mut self, rank_id: &str) -> Option<Result<bool, ProfileEditError>> {
        self.mutate("select_rank", |profile| ranks::select_rank(profile, rank_id))
    }

    pub fn reset_progress(&mut self) -> Option<()> {
        self.mutate("reset_progress", Profile::reset_progress)
    }
}

impl Drop for ProgressionService {
    fn drop(&mut self) {
        self.sign_out();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use quizpop_core::lives::{MercyOutcome, RefillOutcome, RegenPolicy};
    use quizpop_core::quiz::QuizResult;
    use quizpop_core::{EngineConfig, Profile, ProfileEditError, SelectionError, UserId};
    use quizpop_database::{GameStore, MemoryStore};

    use super::ProgressionService;
    use crate::Clock;

    const NOW: u64 = 1_700_000_000;
    const HOUR: u64 = 60 * 60;

    fn user() -> UserId {
        UserId::parse("player-1").unwrap()
    }

    fn fixed_clock() -> Clock {
        Arc::new(|| NOW)
    }

    fn service(memory: &MemoryStore) -> ProgressionService {
        ProgressionService::new(GameStore::memory(memory.clone()), EngineConfig::default())
            .with_clock(fixed_clock())
    }

    fn quiz(category: &str, correct_answers: u32, total_questions: u32) -> QuizResult {
        QuizResult {
            category: category.to_owned(),
            correct_answers,
            total_questions,
        }
    }

    #[tokio::test]
    async fn idle_service_ignores_mutations() {
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);

        assert!(!service.sign_in(None).await.unwrap());
        assert_eq!(service.profile(), None);
        assert_eq!(service.answer(false), None);
        assert_eq!(service.add_xp(50), None);
        assert_eq!(service.finish_quiz(&quiz("js", 5, 5)), None);
        assert_eq!(service.reset_progress(), None);
        assert!(!service.can_play());

        service.shutdown().await;
        assert_eq!(memory.applied_writes(), 0);
    }

    #[tokio::test]
    async fn first_sign_in_persists_a_default_profile() {
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);

        assert!(service.sign_in(Some(user())).await.unwrap());
        service.flush_writes().await;

        assert_eq!(memory.profile(&user()), Some(Profile::default()));
        assert_eq!(service.profile(), Some(Profile::default()));
        assert_eq!(service.active_challenge().map(|c| c.bonus_multiplier), Some(2));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn failed_profile_read_keeps_the_service_idle() {
        let memory = MemoryStore::seeded();
        memory.set_fail_reads(true);
        let mut service = service(&memory);

        assert!(service.sign_in(Some(user())).await.is_err());
        assert_eq!(service.user_id(), None);
        assert_eq!(service.add_xp(10), None);
        assert_eq!(memory.profile(&user()), None);
    }

    #[tokio::test]
    async fn out_of_range_profiles_are_repaired_on_sign_in() {
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                xp: 130,
                lives: 7,
                ..Profile::default()
            },
        );
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();
        service.shutdown().await;

        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.xp, stored.level, stored.lives), (30, 2, 5));
    }

    #[tokio::test]
    async fn challenge_category_doubles_quiz_xp() {
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        let summary = service.finish_quiz(&quiz("js", 3, 5)).unwrap();
        assert_eq!((summary.multiplier, summary.earned_xp), (2, 150));
        assert_eq!(summary.levels_gained, 1);

        let summary = service.finish_quiz(&quiz("css", 1, 5)).unwrap();
        assert_eq!((summary.multiplier, summary.earned_xp), (1, 25));

        service.shutdown().await;
        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.xp, stored.level, stored.games_played), (75, 2, 2));
    }

    #[tokio::test]
    async fn wrong_answers_cost_lives_and_start_the_clock() {
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        assert_eq!(service.answer(true), Some(5));
        assert_eq!(service.answer(false), Some(4));
        assert_eq!(service.answer(false), Some(3));
        assert_eq!(service.seconds_until_next_life(), Some(3 * HOUR));

        service.shutdown().await;
        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.lives, stored.last_regen_at), (3, Some(NOW)));
    }

    #[tokio::test]
    async fn clutch_win_survives_the_level_up_refill() {
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                xp: 90,
                lives: 1,
                last_regen_at: Some(NOW),
                ..Profile::default()
            },
        );
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        let summary = service.finish_quiz(&quiz("css", 1, 1)).unwrap();
        assert!(summary.clutch);

        let profile = service.profile().unwrap();
        assert!(profile.has_clutch_win);
        assert_eq!((profile.level, profile.lives, profile.xp), (2, 5, 15));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn shop_and_mercy_life() {
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                xp: 60,
                lives: 0,
                last_regen_at: Some(NOW),
                ..Profile::default()
            },
        );
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        assert!(!service.can_play());
        assert!(!service.mercy_available());
        assert_eq!(service.claim_mercy_life(), Some(MercyOutcome::NotEligible));
        assert_eq!(
            service.buy_refill(),
            Some(RefillOutcome::Refilled { price: 50 })
        );
        assert_eq!(service.buy_refill(), Some(RefillOutcome::AlreadyFull));

        for _ in 0..5 {
            service.answer(false);
        }
        assert!(service.mercy_available());
        assert_eq!(service.claim_mercy_life(), Some(MercyOutcome::Granted));
        assert!(service.can_play());

        service.shutdown().await;
        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.xp, stored.lives), (10, 1));
    }

    #[tokio::test]
    async fn write_failures_keep_the_mirror_and_converge_later() {
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();
        service.flush_writes().await;

        memory.set_fail_writes(true);
        service.add_xp(30);
        service.flush_writes().await;
        assert_eq!(service.profile().map(|p| p.xp), Some(30));
        assert_eq!(memory.profile(&user()).map(|p| p.xp), Some(0));

        memory.set_fail_writes(false);
        service.update_profile("Kasia", "🐼").unwrap().unwrap();
        service.shutdown().await;

        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.xp, stored.name.as_str()), (30, "Kasia"));
    }

    #[tokio::test]
    async fn badge_selection_is_validated_against_the_catalog() {
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                level: 3,
                games_played: 1,
                ..Profile::default()
            },
        );
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        let catalog = service.badge_catalog().await;
        let rookie = catalog.iter().find(|b| b.id == 1).unwrap();
        let veteran = catalog.iter().find(|b| b.id == 6).unwrap();

        assert_eq!(service.select_badge(rookie), Some(Ok(true)));
        assert_eq!(
            service.select_badge(veteran),
            Some(Err(SelectionError::Locked { badge_id: 6 }))
        );
        assert_eq!(service.toggle_badge(rookie), Some(Ok(true)));
        assert!(service.profile().unwrap().selected_badges.is_empty());
        assert_eq!(
            service.save_badge_selection(&[3, 1, 3], &catalog),
            Some(Ok(true))
        );
        assert_eq!(service.deselect_badge(3), Some(true));

        service.shutdown().await;
        assert_eq!(memory.profile(&user()).unwrap().selected_badges, vec![1]);
    }

    #[tokio::test]
    async fn unreachable_catalog_reads_as_empty() {
        let memory = MemoryStore::seeded();
        let service = service(&memory);
        memory.set_fail_reads(true);
        assert!(service.badge_catalog().await.is_empty());
    }

    #[tokio::test]
    async fn reset_keeps_identity_and_drops_progress() {
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                level: 6,
                xp: 40,
                lives: 2,
                last_regen_at: Some(NOW),
                has_clutch_win: true,
                selected_badges: vec![1],
                name: "Kasia".to_owned(),
                selected_rank: "scholar".to_owned(),
                ..Profile::default()
            },
        );
        let mut service = service(&memory);
        service.sign_in(Some(user())).await.unwrap();

        assert_eq!(
            service.select_rank("legend"),
            Some(Err(ProfileEditError::RankLocked {
                rank_id: "legend".to_owned(),
                required_level: 35
            }))
        );
        service.reset_progress().unwrap();
        service.shutdown().await;

        let stored = memory.profile(&user()).unwrap();
        assert_eq!(
            stored,
            Profile {
                name: "Kasia".to_owned(),
                ..Profile::default()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn lives_regenerate_while_signed_in() {
        let now = Arc::new(AtomicU64::new(NOW));
        let clock: Clock = {
            let now = now.clone();
            Arc::new(move || now.load(Ordering::SeqCst))
        };
        let config = EngineConfig {
            regen_poll: Duration::from_secs(60),
            regen_policy: RegenPolicy::CarryOver,
            ..EngineConfig::default()
        };

        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                lives: 3,
                last_regen_at: Some(NOW - 3 * HOUR - 60),
                ..Profile::default()
            },
        );
        let mut service =
            ProgressionService::new(GameStore::memory(memory.clone()), config).with_clock(clock);
        service.sign_in(Some(user())).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        let profile = service.profile().unwrap();
        assert_eq!(profile.lives, 4);
        assert_eq!(profile.last_regen_at, Some(NOW - 60));

        now.store(NOW + 3 * HOUR, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(61)).await;
        let profile = service.profile().unwrap();
        assert_eq!((profile.lives, profile.last_regen_at), (5, None));

        service.shutdown().await;
        assert_eq!(memory.profile(&user()).unwrap().lives, 5);
    }

    #[test]
    fn mutations_work_outside_the_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let memory = MemoryStore::seeded();
        let mut service = service(&memory);
        runtime.block_on(service.sign_in(Some(user()))).unwrap();

        assert_eq!(service.answer(false), Some(4));
        assert_eq!(service.lose_life(), Some(true));
        assert!(service.buy_refill().is_some());

        runtime.block_on(service.shutdown());
        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.lives, stored.last_regen_at), (3, Some(NOW)));
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_lets_queued_writes_land_and_stops_regeneration() {
        let now = Arc::new(AtomicU64::new(NOW));
        let clock: Clock = {
            let now = now.clone();
            Arc::new(move || now.load(Ordering::SeqCst))
        };
        let memory = MemoryStore::seeded();
        let mut service =
            ProgressionService::new(GameStore::memory(memory.clone()), EngineConfig::default())
                .with_clock(clock);
        service.sign_in(Some(user())).await.unwrap();

        assert_eq!(service.answer(false), Some(4));
        assert_eq!(service.add_xp(30), Some(0));
        service.sign_out();

        assert_eq!(service.user_id(), None);
        assert_eq!(service.profile(), None);
        assert_eq!(service.answer(false), None);
        assert_eq!(service.add_xp(10), None);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let stored = memory.profile(&user()).unwrap();
        assert_eq!((stored.lives, stored.xp), (4, 30));
        let writes = memory.applied_writes();

        now.store(NOW + 4 * HOUR, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(180)).await;
        assert_eq!(memory.profile(&user()).unwrap().lives, 4);
        assert_eq!(memory.applied_writes(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn regeneration_restarts_after_lives_drop_again() {
        let now = Arc::new(AtomicU64::new(NOW));
        let clock: Clock = {
            let now = now.clone();
            Arc::new(move || now.load(Ordering::SeqCst))
        };
        let memory = MemoryStore::seeded();
        memory.insert_profile(
            user(),
            Profile {
                lives: 4,
                last_regen_at: Some(NOW - 3 * HOUR),
                ..Profile::default()
            },
        );
        let mut service =
            ProgressionService::new(GameStore::memory(memory.clone()), EngineConfig::default())
                .with_clock(clock);
        service.sign_in(Some(user())).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.profile().map(|p| p.lives), Some(5));

        assert_eq!(service.answer(false), Some(4));
        now.store(NOW + 3 * HOUR, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(61)).await;
        let profile = service.profile().unwrap();
        assert_eq!((profile.lives, profile.last_regen_at), (5, None));

        service.shutdown().await;
        assert_eq!(memory.profile(&user()).unwrap().lives, 5);
    }
}
