//! Control surface: the start trigger and the statistics readout.
//!
//! How these reach the player (a key, a file, a socket) is up to the
//! front-end; this is just the two entry points.

use crate::actor::{Core, TimerCommand};
use crate::game::Stats;
use crossbeam_channel::Sender;
use std::sync::Arc;

/// Start/snapshot handle, cheap to clone and safe to use from any thread.
#[derive(Clone)]
pub struct ControlSurface {
    core: Arc<Core>,
    timer: Sender<TimerCommand>,
}

impl ControlSurface {
    pub(crate) const fn new(core: Arc<Core>, timer: Sender<TimerCommand>) -> Self {
        Self { core, timer }
    }

    /// Reset the statistics and start a game.
    ///
    /// Does nothing if a game is already running or the game was unloaded.
    /// Returns whether a new game was started.
    pub fn start(&self) -> bool {
        self.core.start(|first_tick| {
            let _ = self.timer.send(TimerCommand::Arm(first_tick));
        })
    }

    /// Current statistics. Never changes the game.
    pub fn snapshot(&self) -> Stats {
        self.core.snapshot()
    }

    /// Human-readable status report.
    pub fn report(&self) -> String {
        self.snapshot().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriverConfig;
    use crate::game::ScriptedPattern;
    use crate::indicator::{IndicatorDriver, IndicatorMask, MemoryController};
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn surface() -> (ControlSurface, crossbeam_channel::Receiver<TimerCommand>) {
        let driver = IndicatorDriver::new(
            MemoryController::new(),
            DriverConfig {
                poll_quantum: Duration::ZERO,
                max_polls: 10,
            },
        );
        let core = Core::new(
            Duration::from_secs(1),
            Box::new(driver),
            Box::new(ScriptedPattern::constant(IndicatorMask::all())),
        );
        let (tx, rx) = unbounded();
        (ControlSurface::new(Arc::new(core), tx), rx)
    }

    #[test]
    fn test_start_arms_timer_once() {
        let (control, timer) = surface();

        assert!(control.start());
        let first = control.snapshot();
        assert!(!control.start());

        assert!(matches!(timer.try_recv(), Ok(TimerCommand::Arm(_))));
        assert!(timer.try_recv().is_err());
        assert_eq!(control.snapshot(), first);
        assert_eq!(
            first,
            Stats {
                running: true,
                level: 0,
                step_interval_ms: 2000,
                hits: 0,
                misses: 0,
            }
        );
    }

    #[test]
    fn test_snapshot_is_read_only() {
        let (control, _timer) = surface();
        let a = control.snapshot();
        let b = control.snapshot();
        assert_eq!(a, b);
        assert!(!a.running);
    }

    #[test]
    fn test_report_banner() {
        let (control, _timer) = surface();
        assert!(control.report().starts_with("**** STOPPED ****"));
        control.start();
        assert!(control.report().starts_with(">>>> RUNNING >>>>"));
    }
}
