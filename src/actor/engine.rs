//! Engine: owner of the game and its actors from load to unload.
//!
//! `Keydance` is the entry point for applications. Loading registers the
//! interrupt bottom half and the pattern timer, runs the lamp self test and
//! hands out the control surface and the interrupt line. Unloading (or
//! dropping) tears everything down in an order that leaves no tick, key
//! event or lamp write running afterwards.

use super::shared::Core;
use super::input::{BottomHalf, InterruptLine};
use super::scheduler::PatternScheduler;
use crate::config::GameConfig;
use crate::control::ControlSurface;
use crate::error::{KeydanceError, Result};
use crate::game::{PatternSource, RandomPattern, Stats};
use crate::indicator::{Controller, IndicatorDriver, Indicators};
use std::io;
use std::sync::Arc;

/// A loaded game.
pub struct Keydance {
    /// Shared game context.
    core: Arc<Core>,
    /// Top half handed out to key sources.
    line: InterruptLine,
    /// Start/snapshot entry points.
    control: ControlSurface,
    /// Timer thread, `None` once torn down.
    scheduler: Option<PatternScheduler>,
    /// Bottom-half thread, `None` once torn down.
    bottom_half: Option<BottomHalf>,
}

impl Keydance {
    /// Load the game with random patterns, driving `controller` for the lamps.
    pub fn with_controller<C>(config: GameConfig, controller: C) -> Result<Self>
    where
        C: Controller + 'static,
    {
        let driver = IndicatorDriver::new(controller, config.driver);
        Self::load(config, driver, RandomPattern::from_entropy())
    }

    /// Load the game.
    ///
    /// Registration happens in order interrupt line, then timer. If a step
    /// fails, everything registered before it is released again.
    pub fn load<I, P>(config: GameConfig, indicators: I, patterns: P) -> Result<Self>
    where
        I: Indicators + 'static,
        P: PatternSource + 'static,
    {
        Self::load_with(config, indicators, patterns, PatternScheduler::spawn)
    }

    /// [`Keydance::load`] with the timer registration supplied by the caller.
    pub(crate) fn load_with<I, P, T>(
        config: GameConfig,
        indicators: I,
        patterns: P,
        spawn_timer: T,
    ) -> Result<Self>
    where
        I: Indicators + 'static,
        P: PatternSource + 'static,
        T: FnOnce(Arc<Core>) -> io::Result<PatternScheduler>,
    {
        config.validate()?;

        let core = Arc::new(Core::new(
            config.base_unit,
            Box::new(indicators),
            Box::new(patterns),
        ));

        let (bottom_half, line) = BottomHalf::spawn(Arc::clone(&core), config.irq_queue_depth)
            .map_err(|source| KeydanceError::Registration {
                resource: "interrupt handler",
                source,
            })?;

        let scheduler = match spawn_timer(Arc::clone(&core)) {
            Ok(scheduler) => scheduler,
            Err(source) => {
                bottom_half.deregister();
                return Err(KeydanceError::Registration {
                    resource: "pattern timer",
                    source,
                });
            }
        };

        let control = ControlSurface::new(Arc::clone(&core), scheduler.commands());

        if let Some(test) = config.self_test {
            core.self_test(test);
        }

        log::info!(
            "keydance loaded (base unit {:?}, lamp ceiling {:?})",
            config.base_unit,
            config.driver.ceiling()
        );

        Ok(Self {
            core,
            line,
            control,
            scheduler: Some(scheduler),
            bottom_half: Some(bottom_half),
        })
    }

    /// Handle for starting games and reading statistics.
    pub fn control(&self) -> ControlSurface {
        self.control.clone()
    }

    /// Top half for delivering key presses.
    pub fn interrupt_line(&self) -> InterruptLine {
        self.line.clone()
    }

    /// Shortcut for [`ControlSurface::start`].
    pub fn start(&self) -> bool {
        self.control.start()
    }

    /// Shortcut for [`ControlSurface::snapshot`].
    pub fn snapshot(&self) -> Stats {
        self.control.snapshot()
    }

    /// Tear the game down and wait for every actor to finish.
    pub fn unload(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let (Some(scheduler), Some(bottom_half)) = (self.scheduler.take(), self.bottom_half.take())
        else {
            return;
        };

        // Order matters: stop the game before the timer can rearm, and keep
        // the interrupt line until the lamps are dark.
        self.core.halt();
        scheduler.cancel_sync();
        self.core.clear_indicators();
        bottom_half.deregister();

        log::info!("keydance unloaded");
    }
}

impl Drop for Keydance {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriverConfig, SelfTest};
    use crate::game::{ScriptedPattern, MISSES_TO_STOP};
    use crate::indicator::{IndicatorMask, MemoryController};
    use crate::IrqReturn;
    use std::sync::Weak;
    use std::thread;
    use std::time::{Duration, Instant};

    fn config(base_ms: u64) -> GameConfig {
        GameConfig {
            base_unit: Duration::from_millis(base_ms),
            driver: DriverConfig {
                poll_quantum: Duration::ZERO,
                max_polls: 10,
            },
            irq_queue_depth: 16,
            self_test: None,
        }
    }

    fn load(base_ms: u64, pattern: IndicatorMask) -> (Keydance, MemoryController) {
        let port = MemoryController::new();
        let cfg = config(base_ms);
        let driver = IndicatorDriver::new(port.clone(), cfg.driver);
        let game = Keydance::load(cfg, driver, ScriptedPattern::constant(pattern)).unwrap();
        (game, port)
    }

    fn wait_until(game: &Keydance, mut done: impl FnMut(&Stats) -> bool) -> Stats {
        let give_up = Instant::now() + Duration::from_secs(5);
        loop {
            let stats = game.snapshot();
            if done(&stats) || Instant::now() > give_up {
                return stats;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Keydance::load(
            GameConfig {
                irq_queue_depth: 0,
                ..config(1)
            },
            IndicatorDriver::new(MemoryController::new(), DriverConfig::default()),
            ScriptedPattern::constant(IndicatorMask::all()),
        );
        assert!(matches!(result, Err(KeydanceError::InvalidConfig(_))));
    }

    #[test]
    fn test_unanswered_game_ends_on_misses() {
        let (game, port) = load(2, IndicatorMask::all());
        assert!(game.start());

        let stats = wait_until(&game, |s| !s.running);
        assert!(!stats.running);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, MISSES_TO_STOP);
        assert_eq!(port.lamps(), Some(IndicatorMask::empty()));

        // A finished game can be restarted.
        assert!(game.start());
        assert_eq!(game.snapshot().misses, 0);
        game.unload();
    }

    #[test]
    fn test_keys_feed_the_running_game() {
        let (game, _port) = load(20, IndicatorMask::NUM_LOCK);
        let line = game.interrupt_line();
        game.start();

        let mut presses = 0;
        let stats = wait_until(&game, |s| {
            if s.hits >= 3 {
                return true;
            }
            // Key "1" clears Num Lock; pressing it early is harmless.
            if line.raise(2) == IrqReturn::WakeThread {
                presses += 1;
            }
            false
        });
        assert!(stats.hits >= 3);
        assert!(presses > 0);
        game.unload();
    }

    #[test]
    fn test_unload_silences_everything() {
        let (game, port) = load(5, IndicatorMask::all());
        let control = game.control();
        let line = game.interrupt_line();
        game.start();
        thread::sleep(Duration::from_millis(30));

        game.unload();
        let writes = port.writes().len();
        assert_eq!(port.lamps(), Some(IndicatorMask::empty()));

        assert!(!control.start());
        assert_eq!(line.raise(2), IrqReturn::None);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(port.writes().len(), writes);
        assert!(!control.snapshot().running);
    }

    #[test]
    fn test_drop_tears_down() {
        let (game, port) = load(5, IndicatorMask::all());
        let control = game.control();
        game.start();
        drop(game);

        let writes = port.writes().len();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(port.writes().len(), writes);
        assert!(!control.snapshot().running);
    }

    #[test]
    fn test_self_test_runs_at_load() {
        let port = MemoryController::new();
        let cfg = GameConfig {
            self_test: Some(SelfTest {
                period: Duration::from_millis(1),
                total: Duration::from_millis(6),
            }),
            ..config(5)
        };
        let driver = IndicatorDriver::new(port.clone(), cfg.driver);
        let game = Keydance::load(cfg, driver, ScriptedPattern::constant(IndicatorMask::all())).unwrap();

        let history = port.history();
        assert!(history.len() >= 6);
        assert_eq!(history[0], IndicatorMask::all());
        assert_eq!(port.lamps(), Some(IndicatorMask::empty()));
        game.unload();
    }

    #[test]
    fn test_timer_registration_failure_releases_bottom_half() {
        let port = MemoryController::new();
        let cfg = GameConfig {
            self_test: Some(SelfTest::default()),
            ..config(5)
        };
        let driver = IndicatorDriver::new(port.clone(), cfg.driver);
        let mut shared = Weak::new();

        let result = Keydance::load_with(
            cfg,
            driver,
            ScriptedPattern::constant(IndicatorMask::all()),
            |core| {
                shared = Arc::downgrade(&core);
                Err(io::Error::new(io::ErrorKind::OutOfMemory, "no threads left"))
            },
        );

        assert!(matches!(
            result,
            Err(KeydanceError::Registration {
                resource: "pattern timer",
                ..
            })
        ));
        // The bottom-half thread held the last other reference to the core.
        assert!(shared.upgrade().is_none());
        assert!(port.writes().is_empty());
    }
}
