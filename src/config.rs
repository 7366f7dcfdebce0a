//! Game configuration.
//!
//! Everything here tunes timing only. The rules (three key slots, ten hits
//! per level, ten misses or level ten to stop) are fixed, see [`crate::game`].

use crate::error::{KeydanceError, Result};
use std::time::Duration;

/// Timing of the keyboard-controller handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Sleep between two polls of the controller status.
    pub poll_quantum: Duration,
    /// Number of quanta after which a write is abandoned.
    pub max_polls: u32,
}

impl DriverConfig {
    /// Upper bound on the time a single indicator write can take.
    pub fn ceiling(&self) -> Duration {
        self.poll_quantum * (self.max_polls + 1)
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_quantum: Duration::from_millis(1),
            max_polls: 10,
        }
    }
}

/// Lamp flashing performed once when the game is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTest {
    /// Time each lamp state is held.
    pub period: Duration,
    /// Total time to keep flashing.
    pub total: Duration,
}

impl Default for SelfTest {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(200),
            total: Duration::from_millis(1200),
        }
    }
}

/// Configuration for [`crate::Keydance`].
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Round length at level zero is twice this value.
    pub base_unit: Duration,
    /// Indicator driver timing.
    pub driver: DriverConfig,
    /// Capacity of the deferred interrupt work queue.
    pub irq_queue_depth: usize,
    /// Lamp test run at load time, `None` to skip it.
    pub self_test: Option<SelfTest>,
}

impl GameConfig {
    /// Check that the configuration can drive a game.
    pub fn validate(&self) -> Result<()> {
        if self.base_unit.is_zero() {
            return Err(KeydanceError::InvalidConfig("base unit must be non-zero"));
        }
        if self.driver.max_polls == 0 {
            return Err(KeydanceError::InvalidConfig("driver needs at least one poll"));
        }
        if self.irq_queue_depth == 0 {
            return Err(KeydanceError::InvalidConfig("interrupt queue depth must be non-zero"));
        }
        if let Some(test) = self.self_test {
            if test.period.is_zero() {
                return Err(KeydanceError::InvalidConfig("self test period must be non-zero"));
            }
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_unit: Duration::from_secs(1),
            driver: DriverConfig::default(),
            irq_queue_depth: 64,
            self_test: Some(SelfTest::default()),
        }
    }
}
