//! Core: the game state, the lamps and the lock around both.
//!
//! Every context that mutates the game (timer tick, interrupt bottom half,
//! start command, teardown) takes the one mutex for its whole critical
//! section, lamp writes included. That is only acceptable because
//! [`Indicators::set_indicators`] is bounded.
//!
//! The interrupt top half must not block, so `running` is mirrored into an
//! atomic that is only ever stored while the mutex is held.

use crate::config::SelfTest;
use crate::game::{slot_for, step_interval, GameOver, GameState, PatternSource, Press, Round, Stats};
use crate::indicator::{IndicatorMask, Indicators};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Everything guarded by the core lock.
struct Inner {
    state: GameState,
    /// Set once by teardown, never cleared.
    unloaded: bool,
    indicators: Box<dyn Indicators>,
    patterns: Box<dyn PatternSource>,
}

/// What a timer tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Round scored, next tick due at `next`.
    Rearm {
        /// Hit or miss.
        round: Round,
        /// Deadline for the next tick.
        next: Instant,
    },
    /// The game is over; do not rearm.
    Stopped(GameOver),
}

/// Shared game context, owned by [`crate::Keydance`] and lent to every actor.
pub(crate) struct Core {
    inner: Mutex<Inner>,
    running: AtomicBool,
    base_unit: Duration,
}

impl Core {
    pub(crate) fn new(
        base_unit: Duration,
        indicators: Box<dyn Indicators>,
        patterns: Box<dyn PatternSource>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: GameState::new(),
                unloaded: false,
                indicators,
                patterns,
            }),
            running: AtomicBool::new(false),
            base_unit,
        }
    }

    /// A panic while holding the lock leaves the state consistent enough to
    /// stop the game, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.running.store(inner.state.running, Ordering::Release);
    }

    /// Lock-free view of `running` for the interrupt top half.
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Close the elapsed round and open the next one.
    pub(crate) fn tick(&self) -> Tick {
        let mut inner = self.lock();
        if !inner.state.running {
            inner.indicators.set_indicators(IndicatorMask::empty());
            return Tick::Stopped(GameOver::Halted);
        }

        let next = inner.patterns.next_pattern();
        let round = inner.state.conclude_round(next);

        if let Round::Over(reason) = round {
            inner.indicators.set_indicators(IndicatorMask::empty());
            self.publish(&inner);
            log::info!(
                "game over ({reason:?}): hits {}, misses {}, level {}",
                inner.state.hits,
                inner.state.misses,
                inner.state.level()
            );
            return Tick::Stopped(reason);
        }

        let lamps = inner.state.required;
        let elapsed = inner.indicators.set_indicators(lamps);
        let next = Instant::now() + step_interval(self.base_unit, inner.state.level());
        log::debug!(
            "round {round:?}: lamps {:03b}, hits {}, misses {}, level {} ({elapsed:?} on lamps)",
            lamps.bits(),
            inner.state.hits,
            inner.state.misses,
            inner.state.level()
        );
        Tick::Rearm { round, next }
    }

    /// Bottom-half processing of one key press.
    ///
    /// Returns `None` when no game is running.
    pub(crate) fn handle_key(&self, scancode: u8) -> Option<Press> {
        let mut inner = self.lock();
        if !inner.state.running {
            return None;
        }

        let press = inner.state.press(slot_for(scancode));
        match press {
            Press::Cleared(lamps) => {
                inner.indicators.set_indicators(lamps);
            }
            Press::Stray => log::debug!("stray key {scancode:#04x}"),
            Press::AlreadyClear => {}
        }
        Some(press)
    }

    /// Reset and arm a new game unless one is running or the core is unloaded.
    ///
    /// `arm` receives the first tick deadline and runs under the lock.
    pub(crate) fn start(&self, arm: impl FnOnce(Instant)) -> bool {
        let mut inner = self.lock();
        if inner.unloaded || inner.state.running {
            return false;
        }

        inner.indicators.set_indicators(IndicatorMask::empty());
        inner.state.arm();
        self.publish(&inner);
        arm(Instant::now() + step_interval(self.base_unit, 0));
        log::info!("game started");
        true
    }

    pub(crate) fn snapshot(&self) -> Stats {
        self.lock().state.stats(self.base_unit)
    }

    /// First teardown step: stop the game for good.
    pub(crate) fn halt(&self) {
        let mut inner = self.lock();
        inner.state.running = false;
        inner.unloaded = true;
        self.publish(&inner);
    }

    pub(crate) fn clear_indicators(&self) {
        self.lock().indicators.set_indicators(IndicatorMask::empty());
    }

    /// Flash all lamps for `test.total`, then leave them dark.
    ///
    /// Runs during load, before any handle that could start a game exists.
    pub(crate) fn self_test(&self, test: SelfTest) {
        let mut mask = IndicatorMask::empty();
        let mut total = Duration::ZERO;

        while total < test.total {
            mask ^= IndicatorMask::all();
            total += self.lock().indicators.set_indicators(mask);
            thread::sleep(test.period);
            total += test.period;
        }

        self.clear_indicators();
    }
}
