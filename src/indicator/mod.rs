//! Indicator lamps: the three keyboard LEDs the player has to react to.
//!
//! The game only ever talks to the lamps through the [`Indicators`] trait.
//! The concrete implementation is an [`IndicatorDriver`] speaking the
//! keyboard-controller protocol to some [`Controller`] backend:
//!
//! ```text
//! ┌──────────────┐  set_indicators  ┌─────────────────┐  0xED, mask  ┌────────────┐
//! │ Core (locked)│ ───────────────▶ │ IndicatorDriver │ ───────────▶ │ Controller │
//! └──────────────┘   ◀── elapsed    └─────────────────┘  bounded poll└────────────┘
//! ```
//!
//! Every call returns within [`crate::DriverConfig::ceiling`], which is what
//! makes it acceptable to drive the lamps while holding the game lock.

mod controller;
mod driver;

pub use controller::{MemoryController, TerminalController};
pub use driver::{Controller, IndicatorDriver, SET_LEDS_COMMAND};

use bitflags::bitflags;
use std::time::Duration;

bitflags! {
    /// Set of lit indicator lamps, one bit per key slot.
    ///
    /// ```
    /// use keydance::IndicatorMask;
    /// let mask = IndicatorMask::NUM_LOCK | IndicatorMask::CAPS_LOCK;
    /// assert_eq!(mask.bits(), 0b110);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IndicatorMask: u8 {
        /// Scroll Lock lamp (slot 0).
        const SCROLL_LOCK = 0x01;
        /// Num Lock lamp (slot 1).
        const NUM_LOCK = 0x02;
        /// Caps Lock lamp (slot 2).
        const CAPS_LOCK = 0x04;
    }
}

impl IndicatorMask {
    /// Lamp belonging to key slot `slot` (0..3).
    pub const fn slot(slot: usize) -> Self {
        Self::from_bits_truncate(1 << (slot & 0x03))
    }
}

/// Something that can set the indicator lamps.
///
/// Implementations must return within a small fixed bound. A write that
/// could not be completed is not an error; it shows up only as the returned
/// elapsed time reaching that bound.
pub trait Indicators: Send {
    /// Light exactly the lamps in `mask`, returning the time spent waiting.
    fn set_indicators(&mut self, mask: IndicatorMask) -> Duration;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bits() {
        assert_eq!(IndicatorMask::slot(0), IndicatorMask::SCROLL_LOCK);
        assert_eq!(IndicatorMask::slot(1), IndicatorMask::NUM_LOCK);
        assert_eq!(IndicatorMask::slot(2), IndicatorMask::CAPS_LOCK);
    }

    #[test]
    fn test_truncates_to_three_lamps() {
        assert_eq!(IndicatorMask::from_bits_truncate(0xFF), IndicatorMask::all());
        assert_eq!(IndicatorMask::all().bits(), 0x07);
    }
}
