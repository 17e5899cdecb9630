use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quizpop_core::lives::MAX_LIVES;
use quizpop_core::{Profile, ProfilePatch};

use crate::writer::PatchSender;

#[derive(Debug)]
struct MirrorState {
    profile: Profile,
    regen_running: bool,
}

/// Session copy of the profile shared by the facade and its regeneration task.
///
/// Every mutation diffs the profile and queues the patch while still holding
/// the lock, so the writer sees patches in mutation order.
#[derive(Clone, Debug)]
pub struct Mirror {
    state: Arc<Mutex<MirrorState>>,
    outbox: PatchSender,
}

impl Mirror {
    pub fn new(profile: Profile, outbox: PatchSender) -> Self {
        Self {
            state: Arc::new(Mutex::new(MirrorState {
                profile,
                regen_running: false,
            })),
            outbox,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Profile {
        self.lock().profile.clone()
    }

    /// Run `f` against the profile and queue whatever it changed.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Profile) -> R) -> (R, ProfilePatch) {
        let mut state = self.lock();
        self.apply(&mut state, f)
    }

    fn apply<R>(
        &self,
        state: &mut MirrorState,
        f: impl FnOnce(&mut Profile) -> R,
    ) -> (R, ProfilePatch) {
        let before = state.profile.clone();
        let result = f(&mut state.profile);
        let patch = ProfilePatch::diff(&before, &state.profile);
        self.outbox.send(patch.clone());
        (result, patch)
    }

    /// Mark the regeneration task as running when lives are below the cap
    /// and no task is running yet. Returns whether the caller should spawn one.
    pub fn claim_regen(&self) -> bool {
        let mut state = self.lock();
        if state.profile.lives >= MAX_LIVES || state.regen_running {
            return false;
        }
        state.regen_running = true;
        true
    }

    /// One regeneration poll. Returns the result of `f`, the queued patch,
    /// and whether the task should keep polling.
    pub fn regen_tick<R>(&self, f: impl FnOnce(&mut Profile) -> R) -> (R, ProfilePatch, bool) {
        let mut state = self.lock();
        let (result, patch) = self.apply(&mut state, f);

        let keep_running = state.profile.lives < MAX_LIVES;
        if !keep_running {
            state.regen_running = false;
        }
        (result, patch, keep_running)
    }

    /// Forget the running task, e.g. after it was aborted.
    pub fn release_regen(&self) {
        self.lock().regen_running = false;
    }
}
