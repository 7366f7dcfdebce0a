//! Actor Model: the concurrent contexts of the game.
//!
//! Three kinds of context touch the game, each on its own thread:
//! - **Timer**: ends each round and lights the next pattern
//! - **Interrupt bottom half**: applies key presses queued by the top half
//! - **Control callers**: start a game, read statistics
//!
//! All of them serialize on the lock inside [`Core`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ raise  ┌──────────┐  IrqWork   ┌─────────────┐
//! │ Key source   │──────▶ │ top half │ ─────────▶ │ bottom half │──┐
//! └──────────────┘        └──────────┘            └─────────────┘  │
//!                                                                  ▼
//! ┌──────────────┐  TimerCommand::Arm   ┌───────┐   tick    ┌──────────────┐
//! │ ControlSurface│ ──────────────────▶ │ timer │ ────────▶ │ Core (mutex) │
//! └──────────────┘                      └───────┘           └──────────────┘
//!        │ start / snapshot                                        ▲
//!        └─────────────────────────────────────────────────────────┘
//! ```

mod shared;
mod engine;
mod input;
mod keyboard;
mod messages;
mod scheduler;

pub(crate) use shared::Core;
pub(crate) use messages::TimerCommand;

pub use engine::Keydance;
pub use input::InterruptLine;
pub use keyboard::{scancode_for, KeyboardActor};
pub use messages::{HostEvent, IrqReturn};
