//! # Keydance
//!
//! A reflex game played on the three keyboard lamps.
//!
//! Lamps light up in random patterns; the player clears each lit lamp by
//! pressing its key before the pattern changes. Rounds get shorter every ten
//! hits. The game ends after ten missed rounds or on reaching level ten.
//!
//! ## Core Concepts
//!
//! - **One lock**: the game state and the lamp driver share a single mutex
//! - **Bounded lamp writes**: the driver gives up after a fixed number of polls,
//!   so writing lamps under the lock cannot stall the other contexts
//! - **Split interrupt handling**: a non-blocking top half queues key presses
//!   for a bottom-half thread
//! - **Self-rearming timer**: each round decides whether there is a next one
//!
//! | Key | Lamp        |
//! |-----|-------------|
//! | `1` | Num Lock    |
//! | `2` | Caps Lock   |
//! | `3` | Scroll Lock |
//!
//! ## Example
//!
//! ```rust,no_run
//! use keydance::{GameConfig, Keydance, MemoryController};
//!
//! let game = Keydance::with_controller(GameConfig::default(), MemoryController::new())?;
//! game.start();
//!
//! // Deliver key presses as set-1 scancodes.
//! game.interrupt_line().raise(0x02);
//!
//! println!("{}", game.snapshot());
//! game.unload();
//! # Ok::<(), keydance::KeydanceError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod config;
pub mod control;
pub mod error;
pub mod game;
pub mod indicator;

// Re-exports for convenience
pub use actor::{scancode_for, HostEvent, InterruptLine, IrqReturn, KeyboardActor, Keydance};
pub use config::{DriverConfig, GameConfig, SelfTest};
pub use control::ControlSurface;
pub use error::{KeydanceError, Result};
pub use game::{step_interval, GameOver, GameState, PatternSource, RandomPattern, ScriptedPattern, Stats};
pub use indicator::{Controller, IndicatorDriver, IndicatorMask, Indicators, MemoryController, TerminalController};
