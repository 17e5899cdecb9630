use std::time::Duration;

use crate::lives::{
    DEFAULT_REFILL_PRICE, DEFAULT_REGEN_POLL_SECS, DEFAULT_REGEN_UNIT_SECS, RegenPolicy,
};

/// XP per correct answer before any challenge multiplier.
pub const DEFAULT_POINTS_PER_ANSWER: u32 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Time needed to regenerate one life.
    pub regen_unit: Duration,
    /// How often a session checks for regenerated lives.
    pub regen_poll: Duration,
    pub regen_policy: RegenPolicy,
    pub refill_price: u32,
    pub points_per_answer: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            regen_unit: Duration::from_secs(DEFAULT_REGEN_UNIT_SECS),
            regen_poll: Duration::from_secs(DEFAULT_REGEN_POLL_SECS),
            regen_policy: RegenPolicy::default(),
            refill_price: DEFAULT_REFILL_PRICE,
            points_per_answer: DEFAULT_POINTS_PER_ANSWER,
        }
    }
}

impl EngineConfig {
    pub fn regen_unit_secs(&self) -> u64 {
        self.regen_unit.as_secs().max(1)
    }
}
