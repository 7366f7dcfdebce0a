//! Game rules: state, round scoring and pattern generation.
//!
//! One round lasts [`step_interval`] at the current level. When it ends the
//! scheduler calls [`GameState::conclude_round`]:
//!
//! - any lamp still lit, or any stray key pressed → miss
//! - otherwise → hit, and every [`HITS_PER_LEVEL`] hits raise the level
//!
//! The game stops after [`MISSES_TO_STOP`] misses or on reaching
//! [`LEVEL_TO_STOP`].

mod pattern;
mod state;

pub use pattern::{PatternSource, RandomPattern, ScriptedPattern};
pub use state::{
    slot_for, step_interval, GameOver, GameState, Press, Round, Stats, HITS_PER_LEVEL, KEY_SLOTS,
    LEVEL_TO_STOP, MISSES_TO_STOP,
};
