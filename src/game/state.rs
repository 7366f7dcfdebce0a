//! `GameState`: the one piece of data every context fights over.
//!
//! The type itself is plain data with pure transition methods; the
//! locking lives in [`crate::actor`]. Keeping the rules here lets them be
//! tested without any threads.

use crate::indicator::IndicatorMask;
use std::fmt;
use std::time::Duration;

/// Scancodes of the three playable keys, indexed by lamp slot.
///
/// PC set 1 make codes: `4` is key "3", `2` is key "1", `3` is key "2".
pub const KEY_SLOTS: [u8; 3] = [4, 2, 3];

/// Hits needed to advance one level.
pub const HITS_PER_LEVEL: u32 = 10;
/// The game ends when this many rounds were missed.
pub const MISSES_TO_STOP: u32 = 10;
/// The game ends when this level is reached.
pub const LEVEL_TO_STOP: u32 = 10;

/// Round length at `level`.
///
/// Starts at two base units and shrinks by a tenth of that per level. The
/// level is clamped below [`LEVEL_TO_STOP`] so the interval never reaches zero.
pub fn step_interval(base_unit: Duration, level: u32) -> Duration {
    let level = level.min(LEVEL_TO_STOP - 1);
    base_unit * (20 - 2 * level) / 10
}

/// Slot bound to `scancode`, if any.
pub fn slot_for(scancode: u8) -> Option<usize> {
    KEY_SLOTS.iter().position(|&code| code == scancode)
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOver {
    /// Too many rounds were missed.
    MissLimit,
    /// The final level was reached.
    LevelLimit,
    /// The game had already been stopped before this round.
    Halted,
}

/// Result of closing a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Every lamp was cleared and no stray key was pressed.
    Hit,
    /// A lamp was left lit or a stray key was pressed.
    Miss,
    /// The round ended the game.
    Over(GameOver),
}

/// Effect of one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    /// A lit lamp was cleared; carries the lamps still owed.
    Cleared(IndicatorMask),
    /// The key's lamp was already dark this round.
    AlreadyClear,
    /// The key is not one of the three slots.
    Stray,
}

/// Shared game data.
///
/// The level only moves through [`GameState::conclude_round`]:
///
/// ```compile_fail
/// let mut state = keydance::GameState::new();
/// state.level = 3;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameState {
    /// Lamps still waiting for their key this round.
    pub required: IndicatorMask,
    /// Whether a game is in progress.
    pub running: bool,
    /// A non-slot key was pressed this round.
    pub stray_input: bool,
    /// Rounds cleared.
    pub hits: u32,
    /// Rounds failed.
    pub misses: u32,
    level: u32,
}

impl GameState {
    /// All-zero, stopped state.
    pub const fn new() -> Self {
        Self {
            required: IndicatorMask::empty(),
            running: false,
            stray_input: false,
            hits: 0,
            misses: 0,
            level: 0,
        }
    }

    /// Always `hits / HITS_PER_LEVEL`.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Reset every counter and arm a new game.
    pub fn arm(&mut self) {
        *self = Self {
            running: true,
            ..Self::new()
        };
    }

    /// Close the current round and open the next one with `next` lamps lit.
    ///
    /// A stray key press counts as a miss even when every lamp was cleared.
    /// On [`Round::Over`] `running` is already false.
    pub fn conclude_round(&mut self, next: IndicatorMask) -> Round {
        if !self.running {
            return Round::Over(GameOver::Halted);
        }

        let owed = self.required;
        let stray = self.stray_input;
        self.required = next;

        let round = if !owed.is_empty() || stray {
            self.misses += 1;
            if self.misses >= MISSES_TO_STOP {
                Round::Over(GameOver::MissLimit)
            } else {
                Round::Miss
            }
        } else {
            self.hits += 1;
            self.level = self.hits / HITS_PER_LEVEL;
            if self.level >= LEVEL_TO_STOP {
                Round::Over(GameOver::LevelLimit)
            } else {
                Round::Hit
            }
        };

        if matches!(round, Round::Over(_)) {
            self.running = false;
        } else {
            self.stray_input = false;
        }
        round
    }

    /// Apply a key press for `slot` (`None` for a key outside the slots).
    pub fn press(&mut self, slot: Option<usize>) -> Press {
        let Some(slot) = slot else {
            self.stray_input = true;
            return Press::Stray;
        };

        let lamp = IndicatorMask::slot(slot);
        if self.required.contains(lamp) {
            self.required.remove(lamp);
            Press::Cleared(self.required)
        } else {
            Press::AlreadyClear
        }
    }

    /// Read-only projection for the control surface.
    pub fn stats(&self, base_unit: Duration) -> Stats {
        let interval = step_interval(base_unit, self.level);
        Stats {
            running: self.running,
            level: self.level,
            step_interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Snapshot of the game for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Whether a game is in progress.
    pub running: bool,
    /// Current level.
    pub level: u32,
    /// Round length at this level, in milliseconds.
    pub step_interval_ms: u64,
    /// Rounds cleared.
    pub hits: u32,
    /// Rounds failed.
    pub misses: u32,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.running {
            writeln!(f, ">>>> RUNNING >>>>")?;
        } else {
            writeln!(f, "**** STOPPED ****")?;
            writeln!(f, "To start: send the start command")?;
            writeln!(f, "Game over when misses >= {MISSES_TO_STOP}")?;
        }
        writeln!(f)?;
        writeln!(f, "Game stats:")?;
        writeln!(
            f,
            "Level: {} (step time = {} ms)",
            self.level, self.step_interval_ms
        )?;
        writeln!(f, "Hits: {}, Misses: {}", self.hits, self.misses)
    }
}
