//! Keyboard-controller backends.
//!
//! - [`MemoryController`]: an in-memory port that records every byte and can
//!   pretend to be busy. Used by tests and headless runs.
//! - [`TerminalController`]: decodes the lamp protocol and draws the three
//!   lamps on a terminal with crossterm.

use super::driver::{Controller, SET_LEDS_COMMAND};
use super::IndicatorMask;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks the two-byte "set LEDs" exchange on the receiving side.
#[derive(Debug, Default, Clone, Copy)]
struct ProtocolDecoder {
    expecting_mask: bool,
}

impl ProtocolDecoder {
    /// Feed one byte, returning the lamp mask once a full exchange completes.
    fn feed(&mut self, byte: u8) -> Option<IndicatorMask> {
        if byte == SET_LEDS_COMMAND {
            self.expecting_mask = true;
            None
        } else if self.expecting_mask {
            self.expecting_mask = false;
            Some(IndicatorMask::from_bits_truncate(byte))
        } else {
            log::trace!("ignoring stray controller byte {byte:02x}");
            None
        }
    }
}

#[derive(Debug, Default)]
struct MemoryPort {
    writes: Vec<u8>,
    history: Vec<IndicatorMask>,
    decoder: ProtocolDecoder,
    busy_polls: u32,
    busy_after_write: Option<u32>,
    stalled: bool,
}

/// In-memory keyboard controller.
///
/// Clones share the same port, so a test can hand one clone to the driver
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryController {
    port: Arc<Mutex<MemoryPort>>,
}

impl MemoryController {
    /// Create an idle controller with no lamps set.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_port<T>(&self, f: impl FnOnce(&mut MemoryPort) -> T) -> T {
        let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut port)
    }

    /// Report the input buffer as full for the next `polls` status reads.
    pub fn hold_busy_for(&self, polls: u32) {
        self.with_port(|port| port.busy_polls = polls);
    }

    /// Become busy for `polls` status reads right after the next byte is written.
    pub fn busy_after_next_write(&self, polls: u32) {
        self.with_port(|port| port.busy_after_write = Some(polls));
    }

    /// Keep the input buffer full until cleared again.
    pub fn set_stalled(&self, stalled: bool) {
        self.with_port(|port| port.stalled = stalled);
    }

    /// Every byte written so far.
    pub fn writes(&self) -> Vec<u8> {
        self.with_port(|port| port.writes.clone())
    }

    /// Every lamp mask applied so far, oldest first.
    pub fn history(&self) -> Vec<IndicatorMask> {
        self.with_port(|port| port.history.clone())
    }

    /// Currently lit lamps, `None` if no mask was ever applied.
    pub fn lamps(&self) -> Option<IndicatorMask> {
        self.with_port(|port| port.history.last().copied())
    }
}

impl Controller for MemoryController {
    fn input_buffer_full(&mut self) -> bool {
        self.with_port(|port| {
            if port.stalled {
                return true;
            }
            if port.busy_polls > 0 {
                port.busy_polls -= 1;
                return true;
            }
            false
        })
    }

    fn write_data(&mut self, byte: u8) {
        self.with_port(|port| {
            port.writes.push(byte);
            if let Some(polls) = port.busy_after_write.take() {
                port.busy_polls = polls;
            }
            if let Some(mask) = port.decoder.feed(byte) {
                port.history.push(mask);
            }
        });
    }
}

/// Lamp colour when lit.
const LIT: Color = Color::Rgb { r: 80, g: 220, b: 100 };
/// Lamp colour when dark.
const DARK: Color = Color::Rgb { r: 60, g: 60, b: 60 };
/// Columns reserved per lamp.
const LAMP_WIDTH: u16 = 12;

/// Lamps in keyboard order with the key that clears each one.
const LAMPS: [(IndicatorMask, &str); 3] = [
    (IndicatorMask::NUM_LOCK, "1:NUM"),
    (IndicatorMask::CAPS_LOCK, "2:CAPS"),
    (IndicatorMask::SCROLL_LOCK, "3:SCROLL"),
];

/// Draws the keyboard lamps on a terminal.
///
/// The controller is always ready, so every write completes in the
/// minimum number of quanta.
pub struct TerminalController<W: Write> {
    writer: W,
    x: u16,
    y: u16,
    decoder: ProtocolDecoder,
}

impl<W: Write> TerminalController<W> {
    /// Draw lamps in the top-left corner of `writer`.
    pub const fn new(writer: W) -> Self {
        Self::with_origin(writer, 0, 0)
    }

    /// Draw lamps starting at column `x`, row `y`.
    pub const fn with_origin(writer: W, x: u16, y: u16) -> Self {
        Self {
            writer,
            x,
            y,
            decoder: ProtocolDecoder {
                expecting_mask: false,
            },
        }
    }

    /// Get a reference to the output.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Render all three lamps and emit them in a single write, so output
    /// from other threads sharing the terminal cannot split the frame.
    fn draw(&mut self, mask: IndicatorMask) -> io::Result<()> {
        let mut frame = Vec::with_capacity(128);
        let mut col = self.x;
        for (lamp, label) in LAMPS {
            let color = if mask.contains(lamp) { LIT } else { DARK };
            queue!(
                frame,
                MoveTo(col, self.y),
                SetForegroundColor(color),
                Print("●"),
                ResetColor,
                Print(format!(" {label}"))
            )?;
            col += LAMP_WIDTH;
        }
        self.writer.write_all(&frame)?;
        self.writer.flush()
    }
}

impl<W: Write + Send> Controller for TerminalController<W> {
    fn input_buffer_full(&mut self) -> bool {
        false
    }

    fn write_data(&mut self, byte: u8) {
        if let Some(mask) = self.decoder.feed(byte) {
            if let Err(e) = self.draw(mask) {
                log::warn!("failed to draw lamps: {e}");
            }
        }
    }
}
