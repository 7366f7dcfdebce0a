//! Bounded-poll keyboard-controller driver.
//!
//! Setting the lamps is a two-byte exchange: the "set LEDs" command byte,
//! then the mask byte. Each byte may only be written once the controller's
//! input buffer has drained, so the driver polls the status with a short
//! sleep in between. Polls and the settle pauses around each write share one
//! budget of `max_polls` quanta; once it is exceeded the write is abandoned.

use super::{IndicatorMask, Indicators};
use crate::config::DriverConfig;
use std::thread;
use std::time::Duration;

/// Command byte that makes the keyboard expect a lamp mask next.
pub const SET_LEDS_COMMAND: u8 = 0xED;

/// Raw access to a keyboard controller's data port.
pub trait Controller: Send {
    /// Whether the controller still holds an unread byte from us.
    fn input_buffer_full(&mut self) -> bool;

    /// Write one byte to the data port.
    fn write_data(&mut self, byte: u8);
}

/// Budget exhausted while talking to the controller.
#[derive(Debug)]
struct Stalled;

/// Accumulates quanta spent in one `set_indicators` call.
struct WaitBudget {
    quantum: Duration,
    max: u32,
    spent: u32,
}

impl WaitBudget {
    const fn new(config: DriverConfig) -> Self {
        Self {
            quantum: config.poll_quantum,
            max: config.max_polls,
            spent: 0,
        }
    }

    /// Sleep one quantum and charge it to the budget.
    fn pause(&mut self) -> Result<(), Stalled> {
        if !self.quantum.is_zero() {
            thread::sleep(self.quantum);
        }
        self.spent += 1;
        if self.spent > self.max {
            return Err(Stalled);
        }
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.quantum * self.spent
    }
}

/// Drives the indicator lamps through a [`Controller`].
pub struct IndicatorDriver<C> {
    controller: C,
    config: DriverConfig,
}

impl<C: Controller> IndicatorDriver<C> {
    /// Create a driver with the given timing.
    pub const fn new(controller: C, config: DriverConfig) -> Self {
        Self { controller, config }
    }

    /// Access the underlying controller.
    pub const fn controller(&self) -> &C {
        &self.controller
    }

    /// Driver timing.
    pub const fn config(&self) -> DriverConfig {
        self.config
    }

    fn wait_ready(&mut self, budget: &mut WaitBudget) -> Result<(), Stalled> {
        while self.controller.input_buffer_full() {
            budget.pause()?;
        }
        Ok(())
    }

    fn write_sequence(&mut self, mask: IndicatorMask, budget: &mut WaitBudget) -> Result<(), Stalled> {
        self.wait_ready(budget)?;
        log::trace!("{SET_LEDS_COMMAND:02x} -> controller (set leds)");
        self.controller.write_data(SET_LEDS_COMMAND);
        budget.pause()?;

        self.wait_ready(budget)?;
        budget.pause()?;
        log::trace!("{:02x} -> controller (led mask)", mask.bits());
        self.controller.write_data(mask.bits());
        budget.pause()
    }
}

impl<C: Controller> Indicators for IndicatorDriver<C> {
    fn set_indicators(&mut self, mask: IndicatorMask) -> Duration {
        let mut budget = WaitBudget::new(self.config);
        if self.write_sequence(mask, &mut budget).is_err() {
            log::warn!(
                "keyboard controller stalled, lamp mask {:03b} may not be applied ({:?})",
                mask.bits(),
                budget.elapsed()
            );
        }
        budget.elapsed()
    }
}
