/// Badge catalog entries, the unlock evaluator and showcase selection.
pub mod badges;
/// Daily challenge bonus resolution.
pub mod challenge;
pub mod clutch;
/// Engine tunables shared by the facade and the binary.
pub mod config;
pub mod error;
/// Life counter, refills and time-based regeneration.
pub mod lives;
pub mod profile;
/// Quiz completion: counters, bonus XP and the clutch flag in one step.
pub mod quiz;
/// Cosmetic ranks unlocked by level.
pub mod ranks;
/// XP roll-over into levels.
pub mod xp;

pub use config::EngineConfig;
pub use error::{ProfileEditError, SelectionError};
pub use profile::{Profile, ProfilePatch, UserId};
