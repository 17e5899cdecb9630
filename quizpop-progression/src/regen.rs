//! Background life regeneration for the signed-in session.
//!
//! The task polls on a fixed interval while lives are below the cap and
//! exits once they are full. Losing a life later spawns a fresh task.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use quizpop_core::lives::{self, RegenOutcome};
use quizpop_core::{EngineConfig, UserId};

use crate::Clock;
use crate::mirror::Mirror;

/// Spawn a regeneration task unless lives are full or one is already running.
///
/// The task goes onto `runtime`, so callers outside a runtime context can
/// still trigger it.
pub fn ensure_running(
    runtime: &Handle,
    mirror: &Mirror,
    user_id: &UserId,
    config: EngineConfig,
    clock: &Clock,
) -> Option<JoinHandle<()>> {
    if !mirror.claim_regen() {
        return None;
    }

    debug!(user_id = %user_id, "starting life regeneration");
    Some(runtime.spawn(run(
        mirror.clone(),
        user_id.clone(),
        config,
        clock.clone(),
    )))
}

async fn run(mirror: Mirror, user_id: UserId, config: EngineConfig, clock: Clock) {
    let mut interval = tokio::time::interval(config.regen_poll.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let now = clock();
        let (outcome, _, keep_running) = mirror.regen_tick(|profile| {
            lives::check_regeneration(
                profile,
                now,
                config.regen_unit_secs(),
                config.regen_policy,
            )
        });

        if let RegenOutcome::Regenerated { added } = outcome {
            info!(user_id = %user_id, added, "lives regenerated");
        }

        if !keep_running {
            debug!(user_id = %user_id, "lives full; regeneration stopped");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use quizpop_core::{EngineConfig, Profile, UserId};
    use quizpop_database::{GameStore, MemoryStore};
    use tokio::runtime::Handle;

    use super::ensure_running;
    use crate::Clock;
    use crate::mirror::Mirror;
    use crate::writer::ProfileWriter;

    const UNIT: u64 = 100;

    fn config() -> EngineConfig {
        EngineConfig {
            regen_unit: Duration::from_secs(UNIT),
            regen_poll: Duration::from_secs(1),
            ..EngineConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn task_tops_up_lives_and_stops_at_the_cap() {
        let now = Arc::new(AtomicU64::new(1_000));
        let clock: Clock = {
            let now = now.clone();
            Arc::new(move || now.load(Ordering::SeqCst))
        };

        let memory = MemoryStore::new();
        let user = UserId::parse("regen-user").unwrap();
        let writer = ProfileWriter::spawn(GameStore::memory(memory.clone()), user.clone());
        let mirror = Mirror::new(
            Profile {
                lives: 3,
                last_regen_at: Some(1_000),
                ..Profile::default()
            },
            writer.sender(),
        );

        let runtime = Handle::current();
        let handle = ensure_running(&runtime, &mirror, &user, config(), &clock).unwrap();
        assert!(ensure_running(&runtime, &mirror, &user, config(), &clock).is_none());

        now.store(1_000 + UNIT + 10, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let profile = mirror.snapshot();
        assert_eq!(profile.lives, 4);
        assert_eq!(profile.last_regen_at, Some(1_000 + UNIT));
        assert!(!handle.is_finished());

        now.store(1_000 + 2 * UNIT, Ordering::SeqCst);
        handle.await.unwrap();

        let profile = mirror.snapshot();
        assert_eq!(profile.lives, 5);
        assert_eq!(profile.last_regen_at, None);

        drop(mirror);
        writer.finish().await;
        let stored = memory.profile(&user).unwrap();
        assert_eq!((stored.lives, stored.last_regen_at), (5, None));
    }

    #[tokio::test]
    async fn nothing_is_spawned_with_full_lives() {
        let clock: Clock = Arc::new(|| 0);
        let user = UserId::parse("regen-user").unwrap();
        let writer = ProfileWriter::spawn(GameStore::memory(MemoryStore::new()), user.clone());
        let mirror = Mirror::new(Profile::default(), writer.sender());

        let runtime = Handle::current();
        assert!(ensure_running(&runtime, &mirror, &user, config(), &clock).is_none());
        drop(mirror);
        writer.finish().await;
    }
}
