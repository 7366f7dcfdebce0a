//! Message types for actor communication.

use std::time::Instant;

/// Commands for the pattern timer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerCommand {
    /// Fire the next tick at the given instant, replacing any pending one.
    Arm(Instant),
    /// Stop the timer thread.
    Shutdown,
}

/// Work deferred from the interrupt top half to the bottom-half thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IrqWork {
    /// One key press, as a set-1 scancode.
    Key(u8),
    /// Interrupt line is being deregistered.
    Shutdown,
}

/// What the top half tells the interrupt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// Not ours: no game is running, the event belongs to someone else.
    None,
    /// Taken, but no deferred work was queued.
    Handled,
    /// Taken, the bottom half will process it.
    WakeThread,
}

/// Events for the front-end, outside of the game's own key handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The player asked for a new game.
    Start,
    /// The player asked to leave.
    Quit,
    /// The keyboard source hit an error.
    Error(String),
    /// The keyboard source is shutting down.
    Shutdown,
}
