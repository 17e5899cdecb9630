/// Display helpers for hearts, XP bars and countdowns.
pub mod formatting;
/// Pure parser helpers for configuration values and console input.
pub mod parse;
/// Shared time helpers.
pub mod time;
